//! Bearer-token identity resolution.

use std::collections::HashMap;

use axum::http::HeaderMap;
use orchestrator::Caller;
use tracing::warn;

/// Static token table mapping bearer tokens to caller identities.
///
/// Stands in for a full identity provider; the pipeline only needs a
/// trusted (id, role) pair per request.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: HashMap<String, Caller>,
}

impl TokenRegistry {
    /// Empty registry. Every request is unauthorized.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a registry from a spec string of comma-separated
    /// `token=user:role` entries. Malformed entries are skipped with a
    /// warning.
    pub fn from_spec(spec: &str) -> Self {
        let mut tokens = HashMap::new();
        for entry in spec.split(',').filter(|e| !e.trim().is_empty()) {
            match parse_entry(entry.trim()) {
                Some((token, caller)) => {
                    tokens.insert(token, caller);
                }
                None => warn!("Skipping malformed token entry: {}", entry),
            }
        }
        Self { tokens }
    }

    /// Register a single token.
    pub fn insert(&mut self, token: impl Into<String>, caller: Caller) {
        self.tokens.insert(token.into(), caller);
    }

    /// Resolve the caller behind the request's Authorization header.
    pub fn resolve(&self, headers: &HeaderMap) -> Option<&Caller> {
        let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
        let token = value.strip_prefix("Bearer ").unwrap_or(value);
        self.tokens.get(token)
    }
}

fn parse_entry(entry: &str) -> Option<(String, Caller)> {
    let (token, identity) = entry.split_once('=')?;
    let (user, role) = identity.split_once(':')?;
    if token.is_empty() || user.is_empty() || role.is_empty() {
        return None;
    }
    Some((token.to_string(), Caller::new(user, role)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        headers
    }

    #[test]
    fn test_spec_parsing_and_resolution() {
        let registry = TokenRegistry::from_spec("tok-a=alice:client, tok-c=carol:counselor");

        let caller = registry.resolve(&bearer("tok-a")).unwrap();
        assert_eq!(caller.id, "alice");
        assert_eq!(caller.role, "client");

        let caller = registry.resolve(&bearer("tok-c")).unwrap();
        assert_eq!(caller.role, "counselor");

        assert!(registry.resolve(&bearer("tok-x")).is_none());
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let registry = TokenRegistry::from_spec("garbage,tok-a=alice:client,=x:y");
        assert!(registry.resolve(&bearer("tok-a")).is_some());
        assert!(registry.resolve(&bearer("garbage")).is_none());
    }

    #[test]
    fn test_missing_header_unresolved() {
        let registry = TokenRegistry::from_spec("tok-a=alice:client");
        assert!(registry.resolve(&HeaderMap::new()).is_none());
    }
}
