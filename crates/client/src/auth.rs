//! Bearer-token capability handed to the HTTP client at construction.
//!
//! The client never obtains or refreshes tokens itself. Whatever owns the
//! operator's session supplies a [`TokenProvider`]; the client asks it for
//! the current token on every request.

use std::sync::{Arc, RwLock};

pub trait TokenProvider: Send + Sync {
    /// Current bearer token, or `None` to send the request unauthenticated.
    fn bearer_token(&self) -> Option<String>;
}

/// A token fixed at construction (or no token at all).
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl TokenProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// A token slot shared with the session owner and replaceable at runtime.
#[derive(Debug, Clone, Default)]
pub struct SharedToken(Arc<RwLock<Option<String>>>);

impl SharedToken {
    pub fn new(initial: Option<String>) -> Self {
        Self(Arc::new(RwLock::new(initial)))
    }

    pub fn set(&self, token: Option<String>) {
        // A poisoned lock only means a writer panicked mid-assignment.
        let mut slot = self.0.write().unwrap_or_else(|e| e.into_inner());
        *slot = token;
    }
}

impl TokenProvider for SharedToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_token_sees_updates() {
        let shared = SharedToken::new(None);
        let provider: Arc<dyn TokenProvider> = Arc::new(shared.clone());
        assert_eq!(provider.bearer_token(), None);
        shared.set(Some("abc".into()));
        assert_eq!(provider.bearer_token().as_deref(), Some("abc"));
    }

    #[test]
    fn static_token() {
        assert_eq!(StaticToken::new("t").bearer_token().as_deref(), Some("t"));
        assert_eq!(StaticToken::none().bearer_token(), None);
    }
}
