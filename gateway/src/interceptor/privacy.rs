//! Alias resolution of privacy fields, shared by the private pipelines.

use super::NodeInterceptor;
use crate::aliases::{alias_values, AliasKind, AliasResolver};
use crate::auth::UserInfo;
use crate::error::{GatewayError, Result};
use crate::ethereum::PrivateArgs;

impl NodeInterceptor {
    /// Replaces alias tokens in `privateFor`, `privateFrom` and
    /// `privacyGroupId`.
    ///
    /// A `privacyGroupId` alias holding an array is a member list: it is
    /// appended to `privateFor` and the group id is dropped.
    pub(super) async fn resolve_privacy(
        &self,
        private: &mut PrivateArgs,
        user: &UserInfo,
    ) -> Result<()> {
        if let Some(tokens) = &private.private_for {
            let resolved = self.aliases.replace(tokens, user).await.map_err(|e| {
                tracing::warn!(error = %e, "failed to replace aliases in privateFor");
                e
            })?;
            private.private_for = Some(resolved);
        }

        if let Some(token) = &private.private_from {
            let resolved = self.aliases.replace_simple(token, user).await.map_err(|e| {
                tracing::warn!(error = %e, "failed to replace alias in privateFrom");
                e
            })?;
            private.private_from = Some(resolved);
        }

        let Some(group) = private.privacy_group_id.clone() else {
            return Ok(());
        };
        let Some((registry, key)) = AliasResolver::parse(&group) else {
            return Ok(());
        };
        let alias = self.aliases.get(registry, key, user).await?;
        match alias.kind {
            AliasKind::String => {
                private.privacy_group_id = alias_values(&alias)?.into_iter().next();
            }
            AliasKind::Array => {
                let members = alias_values(&alias)?;
                private
                    .private_for
                    .get_or_insert_with(Vec::new)
                    .extend(members);
                private.privacy_group_id = None;
            }
            AliasKind::Unknown => {
                return Err(GatewayError::encoding(format!(
                    "wrong alias type for privacyGroupId {}",
                    group
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{setup, user, ALICE, BOB, CAROL, GROUP};
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn resolves_every_field() {
        let (interceptor, _) = setup();
        let mut private = PrivateArgs {
            private_from: Some("{{parties:alice}}".into()),
            private_for: Some(vec!["{{parties:consortium}}".into(), "plain".into()]),
            privacy_group_id: None,
            private_type: None,
        };
        interceptor.resolve_privacy(&mut private, &user()).await.unwrap();

        assert_eq!(private.private_from.as_deref(), Some(ALICE));
        assert_eq!(
            private.private_for,
            Some(vec![BOB.to_string(), CAROL.to_string(), "plain".to_string()])
        );
    }

    #[tokio::test]
    async fn group_alias_kinds() {
        let (interceptor, _) = setup();

        let mut string_group = PrivateArgs {
            privacy_group_id: Some("{{parties:group}}".into()),
            ..Default::default()
        };
        interceptor
            .resolve_privacy(&mut string_group, &user())
            .await
            .unwrap();
        assert_eq!(string_group.privacy_group_id.as_deref(), Some(GROUP));
        assert!(string_group.private_for.is_none());

        let mut array_group = PrivateArgs {
            private_for: Some(vec![ALICE.into()]),
            privacy_group_id: Some("{{parties:consortium}}".into()),
            ..Default::default()
        };
        interceptor
            .resolve_privacy(&mut array_group, &user())
            .await
            .unwrap();
        assert!(array_group.privacy_group_id.is_none());
        assert_eq!(
            array_group.private_for,
            Some(vec![ALICE.to_string(), BOB.to_string(), CAROL.to_string()])
        );
    }

    #[tokio::test]
    async fn literal_values_are_untouched() {
        let (interceptor, _) = setup();
        let mut private = PrivateArgs {
            privacy_group_id: Some(GROUP.into()),
            ..Default::default()
        };
        interceptor.resolve_privacy(&mut private, &user()).await.unwrap();
        assert_eq!(private.privacy_group_id.as_deref(), Some(GROUP));
    }

    #[tokio::test]
    async fn private_from_must_be_single_valued() {
        let (interceptor, _) = setup();
        let mut private = PrivateArgs {
            private_from: Some("{{parties:consortium}}".into()),
            ..Default::default()
        };
        let err = interceptor
            .resolve_privacy(&mut private, &user())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Encoding);
        assert_eq!(err.message, "alias should only have exactly 1 value");
    }

    #[tokio::test]
    async fn unknown_alias_is_not_found() {
        let (interceptor, _) = setup();
        let mut private = PrivateArgs {
            privacy_group_id: Some("{{parties:nobody}}".into()),
            ..Default::default()
        };
        let err = interceptor
            .resolve_privacy(&mut private, &user())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn group_alias_of_unknown_kind_is_an_encoding_error() {
        let (interceptor, _) = setup();
        let mut private = PrivateArgs {
            privacy_group_id: Some("{{parties:legacy}}".into()),
            ..Default::default()
        };
        let err = interceptor
            .resolve_privacy(&mut private, &user())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Encoding);
        assert_eq!(
            err.message,
            "wrong alias type for privacyGroupId {{parties:legacy}}"
        );
    }

    #[tokio::test]
    async fn malformed_string_group_alias_is_an_encoding_error() {
        let (interceptor, _) = setup();
        let mut private = PrivateArgs {
            privacy_group_id: Some("{{parties:broken}}".into()),
            ..Default::default()
        };
        let err = interceptor
            .resolve_privacy(&mut private, &user())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Encoding);
        assert_eq!(err.message, "bad string format");
        assert_eq!(private.privacy_group_id.as_deref(), Some("{{parties:broken}}"));
    }
}
