//! Ordered RLP list assembly.
//!
//! Transaction payloads are heterogeneous lists (integers, byte strings,
//! nested lists). [`RlpList`] appends encoded items in order and wraps them
//! in a list header on [`RlpList::finish`].

use alloy_primitives::{Address, U256};
use alloy_rlp::{Encodable, Header, EMPTY_STRING_CODE};

#[derive(Debug, Default, Clone)]
pub struct RlpList {
    payload: Vec<u8>,
}

impl RlpList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an unsigned integer with leading zero bytes stripped.
    pub fn uint(mut self, value: u64) -> Self {
        value.encode(&mut self.payload);
        self
    }

    pub fn u256(mut self, value: U256) -> Self {
        value.encode(&mut self.payload);
        self
    }

    pub fn bytes(mut self, value: &[u8]) -> Self {
        value.encode(&mut self.payload);
        self
    }

    pub fn str(mut self, value: &str) -> Self {
        value.as_bytes().encode(&mut self.payload);
        self
    }

    /// Appends a destination address, or the empty string for contract
    /// creation.
    pub fn to(mut self, to: Option<Address>) -> Self {
        match to {
            Some(address) => address.encode(&mut self.payload),
            None => self.payload.push(EMPTY_STRING_CODE),
        }
        self
    }

    /// Appends an already encoded item (typically a nested list).
    pub fn raw(mut self, encoded: &[u8]) -> Self {
        self.payload.extend_from_slice(encoded);
        self
    }

    /// Wraps the items in a list header.
    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload.len() + 9);
        Header {
            list: true,
            payload_length: self.payload.len(),
        }
        .encode(&mut out);
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Encodes a list of byte strings.
pub fn bytes_list<T: AsRef<[u8]>>(items: &[T]) -> Vec<u8> {
    items
        .iter()
        .fold(RlpList::new(), |list, item| list.bytes(item.as_ref()))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list() {
        assert_eq!(RlpList::new().finish(), vec![0xc0]);
    }

    #[test]
    fn integers_are_minimal() {
        let encoded = RlpList::new()
            .uint(0)
            .uint(0x7f)
            .uint(0x80)
            .u256(U256::from(0x0400u64))
            .finish();
        assert_eq!(encoded, vec![0xc7, 0x80, 0x7f, 0x81, 0x80, 0x82, 0x04, 0x00]);
    }

    #[test]
    fn contract_creation_is_empty_string() {
        assert_eq!(RlpList::new().to(None).finish(), vec![0xc1, 0x80]);
        let with_to = RlpList::new().to(Some(Address::repeat_byte(0x11))).finish();
        assert_eq!(with_to[0], 0xd5);
        assert_eq!(with_to[1], 0x94);
    }

    #[test]
    fn strings_and_nested_lists() {
        let inner = bytes_list(&[b"ab".as_slice()]);
        let encoded = RlpList::new().str("restricted").raw(&inner).finish();
        let mut expected = vec![0xcf, 0x8a];
        expected.extend_from_slice(b"restricted");
        expected.extend_from_slice(&[0xc3, 0x82, b'a', b'b']);
        assert_eq!(encoded, expected);
    }
}
