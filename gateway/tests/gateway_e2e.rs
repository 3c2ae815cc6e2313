//! The interceptor driving a real `HttpSession` against a mock node.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use custos_gateway::accounts::{KeySigner, LocalAccounts, LocalKeySigner};
use custos_gateway::aliases::{Alias, AliasResolver, InMemoryAliasStore, Registry};
use custos_gateway::auth::{AllowAll, UserInfo};
use custos_gateway::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use custos_gateway::session::{build_http_client, HttpSession, NodeEndpoint};
use custos_gateway::{InterceptorConfig, NodeInterceptor};

const KEY: &str = "56202652fdffd802b7252a456dbd8f3ecc0352bbde76c23b40afe8aebd714e2e";
const ALICE: &str = "GGilEkXLaQ9yhhtbpBT03Me9iYa7U/mWXxrJhnbl1XY=";
const BOB: &str = "KkOjNLmCI6r+mICrC6l+XuEDjFEzQllaMQMpWLl4y1s=";
const TX_HASH: &str = "0x6052dd2131667ef3e0a0666f2812db2defceaec91c470bb43de92268e8306778";

#[derive(Clone, Default)]
struct NodeLog {
    rpc: Arc<Mutex<Vec<Value>>>,
    stored: Arc<Mutex<Vec<Value>>>,
}

impl NodeLog {
    fn methods(&self) -> Vec<String> {
        self.rpc
            .lock()
            .iter()
            .map(|r| r["method"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

async fn rpc(State(log): State<NodeLog>, Json(request): Json<Value>) -> Json<Value> {
    log.rpc.lock().push(request.clone());
    let result = match request["method"].as_str().unwrap_or_default() {
        "eth_chainId" => json!("0x7ce"),
        "eth_getTransactionCount" => json!("0x0"),
        "eth_estimateGas" => json!("0x5208"),
        "eth_blockNumber" => json!("0x10"),
        _ => json!(TX_HASH),
    };
    Json(json!({"jsonrpc": "2.0", "id": request["id"], "result": result}))
}

async fn store_raw(State(log): State<NodeLog>, Json(body): Json<Value>) -> Json<Value> {
    log.stored.lock().push(body);
    Json(json!({ "key": BASE64.encode([0xab; 64]) }))
}

struct Gateway {
    interceptor: NodeInterceptor,
    session: HttpSession,
    address: Address,
    log: NodeLog,
}

impl Gateway {
    async fn start() -> Self {
        let log = NodeLog::default();
        let app = Router::new()
            .route("/", post(rpc))
            .route("/storeraw", post(store_raw))
            .with_state(log.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let base = format!("http://{}", listener.local_addr().expect("listener addr"));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let accounts = Arc::new(LocalAccounts::new(Arc::new(AllowAll)));
        let signer = LocalKeySigner::from_hex(KEY).unwrap();
        let address = signer.address();
        accounts.insert(Arc::new(signer), vec![]);

        let store = Arc::new(InMemoryAliasStore::new());
        store.put_registry(Registry {
            name: "parties".into(),
            allowed_tenants: vec![],
            aliases: vec![Alias::string("alice", ALICE)],
        });
        let interceptor = NodeInterceptor::new(
            accounts,
            AliasResolver::new(store, Arc::new(AllowAll)),
            InterceptorConfig {
                request_timeout: Some(Duration::from_secs(10)),
            },
        );

        let endpoint = NodeEndpoint {
            rpc_url: base.clone(),
            privacy_manager_url: Some(base),
        };
        let session = HttpSession::new(
            build_http_client(Duration::from_secs(5)).unwrap(),
            Arc::new(endpoint),
        );

        Self {
            interceptor,
            session,
            address,
            log,
        }
    }

    async fn call(&self, body: Value) -> JsonRpcResponse {
        let request = JsonRpcRequest::from_slice(body.to_string().as_bytes()).unwrap();
        let user = UserInfo::new("username", "tenant");
        self.interceptor.serve_rpc(&user, &self.session, request).await
    }
}

#[tokio::test]
async fn legacy_transaction_is_signed_and_submitted() {
    let gateway = Gateway::start().await;
    let response = gateway
        .call(json!({
            "jsonrpc": "2.0",
            "method": "eth_sendTransaction",
            "params": [{
                "from": gateway.address,
                "to": "0x905B88EFf8Bda1543d4d6f4aA05afef143D27E18",
                "gasPrice": "0x1"
            }],
            "id": 42
        }))
        .await;

    assert_eq!(response.result, Some(json!(TX_HASH)));
    assert_eq!(response.id, json!(42));
    assert_eq!(
        gateway.log.methods(),
        vec![
            "eth_getTransactionCount",
            "eth_estimateGas",
            "eth_chainId",
            "eth_sendRawTransaction"
        ]
    );

    let rpc = gateway.log.rpc.lock();
    let raw = rpc[3]["params"][0].as_str().unwrap();
    assert!(raw.starts_with("0xf8"));
    // v = 4031 or 4032 on chain 1998
    assert!(raw.contains("820fbf") || raw.contains("820fc0"));
}

#[tokio::test]
async fn unknown_methods_reach_the_node() {
    let gateway = Gateway::start().await;
    let response = gateway
        .call(json!({"jsonrpc": "2.0", "method": "eth_blockNumber", "params": [], "id": "b"}))
        .await;

    assert_eq!(response.result, Some(json!("0x10")));
    assert_eq!(response.id, json!("b"));
    assert_eq!(gateway.log.methods(), vec!["eth_blockNumber"]);
}

#[tokio::test]
async fn quorum_private_transaction_goes_through_the_privacy_manager() {
    let gateway = Gateway::start().await;
    let response = gateway
        .call(json!({
            "jsonrpc": "2.0",
            "method": "eth_sendTransaction",
            "params": [{
                "from": gateway.address,
                "to": "0x905B88EFf8Bda1543d4d6f4aA05afef143D27E18",
                "gas": "0x5208",
                "gasPrice": "0x0",
                "data": "0xdeadbeef",
                "privateFrom": "{{parties:alice}}",
                "privateFor": [BOB]
            }],
            "id": 1
        }))
        .await;

    assert_eq!(response.result, Some(json!(TX_HASH)));
    assert_eq!(
        gateway.log.stored.lock()[0],
        json!({"payload": "3q2+7w==", "from": ALICE})
    );

    let rpc = gateway.log.rpc.lock();
    let submit = rpc.last().unwrap();
    assert_eq!(submit["method"], "eth_sendRawPrivateTransaction");
    assert_eq!(submit["params"][1], json!({"privateFor": [BOB]}));
    let raw = submit["params"][0].as_str().unwrap();
    assert!(raw.contains(&format!("b840{}", "ab".repeat(64))));
}

#[tokio::test]
async fn personal_methods_never_reach_the_node() {
    let gateway = Gateway::start().await;
    let response = gateway
        .call(json!({"jsonrpc": "2.0", "method": "personal_unlockAccount", "params": [], "id": 1}))
        .await;

    assert_eq!(response.error.unwrap().code, -32601);
    assert!(gateway.log.methods().is_empty());
}
