use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Identity attached to a bearer token by the credential collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Opaque caller identifier, used for logging only.
    pub subject: String,
    /// Whether the caller may issue timer control actions.
    pub admin: bool,
}

/// Resolves opaque bearer tokens into credentials.
pub trait CredentialResolver: Send + Sync {
    /// `None` when the token is unknown.
    fn resolve(&self, token: &str) -> Option<Credential>;
}

/// Fixed token table loaded from configuration.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    tokens: HashMap<String, Credential>,
}

impl StaticCredentials {
    /// Build the table from `(token, credential)` pairs. Later duplicates win.
    pub fn new(entries: impl IntoIterator<Item = (String, Credential)>) -> Self {
        Self {
            tokens: entries.into_iter().collect(),
        }
    }
}

impl CredentialResolver for StaticCredentials {
    fn resolve(&self, token: &str) -> Option<Credential> {
        self.tokens.get(token).cloned()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer   abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn resolves_known_tokens_only() {
        let credentials = StaticCredentials::new([(
            "t1".to_string(),
            Credential {
                subject: "host".into(),
                admin: true,
            },
        )]);
        assert!(credentials.resolve("t1").is_some_and(|c| c.admin));
        assert!(credentials.resolve("t2").is_none());
    }
}
