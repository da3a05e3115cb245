//! Request-parameter resolution for the double meaning of `client_id`.
//!
//! The wire parameter `client_id` is used by two protocols at once: the LMS
//! addresses one of its installations ("tenant") with it, while OAuth2
//! (RFC 6749) uses it for the API consumer, which the registry calls the
//! api_key. Callers that need to address a specific tenant send
//! `lms_client_id` instead. This module turns the raw parameter maps into an
//! unambiguous `ResolvedParams` without mutating anything.

use crate::directory::TokenInspector;
use std::collections::HashMap;

/// The two identifiers a request can carry, untangled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedParams {
    /// OAuth2 client identifier, i.e. the registry api_key.
    pub api_key: Option<String>,
    /// LMS installation addressed by the request.
    pub tenant: Option<String>,
}

/// Resolve `client_id`/`lms_client_id` from query and form parameters.
///
/// Query parameters win over form parameters. Within the query,
/// `client_id` doubles as the tenant when no `lms_client_id` is sent (the
/// LMS reads it that way); form parameters never leak into the tenant unless
/// sent as `lms_client_id`. An explicit `tenant_override` beats both sources.
pub fn resolve_client_params(
    query: &HashMap<String, String>,
    form: &HashMap<String, String>,
    tenant_override: Option<&str>,
) -> ResolvedParams {
    let mut api_key = None;
    let mut tenant = None;

    if query.contains_key("client_id") || query.contains_key("lms_client_id") {
        api_key = query.get("client_id").cloned();
        tenant = query
            .get("lms_client_id")
            .or_else(|| query.get("client_id"))
            .cloned();
    } else if form.contains_key("client_id") || form.contains_key("lms_client_id") {
        api_key = form.get("client_id").cloned();
        tenant = form.get("lms_client_id").cloned();
    }

    if let Some(t) = tenant_override {
        tenant = Some(t.to_string());
    }

    ResolvedParams { api_key, tenant }
}

/// Tenant embedded in a request's token material, when no parameter names
/// one. The access token is consulted first, then the refresh token.
pub fn tenant_from_token(
    inspector: &dyn TokenInspector,
    access_token: Option<&str>,
    refresh_token: Option<&str>,
) -> Option<String> {
    access_token
        .and_then(|t| inspector.tenant_of(t))
        .or_else(|| refresh_token.and_then(|t| inspector.tenant_of(t)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    struct FixedTenant(&'static str);

    impl TokenInspector for FixedTenant {
        fn tenant_of(&self, raw_token: &str) -> Option<String> {
            if raw_token.is_empty() {
                None
            } else {
                Some(self.0.to_string())
            }
        }
    }

    #[test]
    fn test_query_client_id_doubles_as_tenant() {
        let resolved = resolve_client_params(&params(&[("client_id", "key1")]), &params(&[]), None);
        assert_eq!(resolved.api_key, Some("key1".to_string()));
        assert_eq!(resolved.tenant, Some("key1".to_string()));
    }

    #[test]
    fn test_query_both_identifiers() {
        let resolved = resolve_client_params(
            &params(&[("client_id", "key1"), ("lms_client_id", "campus")]),
            &params(&[]),
            None,
        );
        assert_eq!(resolved.api_key, Some("key1".to_string()));
        assert_eq!(resolved.tenant, Some("campus".to_string()));
    }

    #[test]
    fn test_query_tenant_only() {
        let resolved =
            resolve_client_params(&params(&[("lms_client_id", "campus")]), &params(&[]), None);
        assert_eq!(resolved.api_key, None);
        assert_eq!(resolved.tenant, Some("campus".to_string()));
    }

    #[test]
    fn test_form_client_id_does_not_become_tenant() {
        let resolved = resolve_client_params(&params(&[]), &params(&[("client_id", "key1")]), None);
        assert_eq!(resolved.api_key, Some("key1".to_string()));
        assert_eq!(resolved.tenant, None);
    }

    #[test]
    fn test_form_both_identifiers() {
        let resolved = resolve_client_params(
            &params(&[]),
            &params(&[("client_id", "key1"), ("lms_client_id", "campus")]),
            None,
        );
        assert_eq!(resolved.api_key, Some("key1".to_string()));
        assert_eq!(resolved.tenant, Some("campus".to_string()));
    }

    #[test]
    fn test_query_wins_over_form() {
        let resolved = resolve_client_params(
            &params(&[("client_id", "from-query")]),
            &params(&[("client_id", "from-form"), ("lms_client_id", "campus")]),
            None,
        );
        assert_eq!(resolved.api_key, Some("from-query".to_string()));
        assert_eq!(resolved.tenant, Some("from-query".to_string()));
    }

    #[test]
    fn test_override_beats_everything() {
        let resolved = resolve_client_params(
            &params(&[("client_id", "key1"), ("lms_client_id", "campus")]),
            &params(&[]),
            Some("other-campus"),
        );
        assert_eq!(resolved.tenant, Some("other-campus".to_string()));
        assert_eq!(resolved.api_key, Some("key1".to_string()));
    }

    #[test]
    fn test_no_parameters() {
        let resolved = resolve_client_params(&params(&[]), &params(&[]), None);
        assert_eq!(resolved, ResolvedParams::default());
    }

    #[test]
    fn test_tenant_from_access_token() {
        let inspector = FixedTenant("campus");
        assert_eq!(
            tenant_from_token(&inspector, Some("tok"), None),
            Some("campus".to_string())
        );
    }

    #[test]
    fn test_tenant_from_refresh_token_fallback() {
        let inspector = FixedTenant("campus");
        // Empty access token decodes to nothing, refresh token fills in
        assert_eq!(
            tenant_from_token(&inspector, Some(""), Some("tok")),
            Some("campus".to_string())
        );
        assert_eq!(tenant_from_token(&inspector, None, None), None);
    }
}
