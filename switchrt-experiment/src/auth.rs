use std::collections::HashMap;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AuthError;

/// Opaque handle returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub email: Option<String>,
}

/// Login collaborator. The engine only asks whether a token is authenticated
/// and which email it belongs to.
pub trait AuthService {
    fn login(&mut self, email: &str) -> Result<SessionToken, AuthError>;
    fn logout(&mut self, token: &SessionToken);
    fn status(&self, token: &SessionToken) -> AuthStatus;
}

/// Process-local sessions keyed by random tokens.
#[derive(Debug, Default)]
pub struct MemoryAuth {
    sessions: HashMap<SessionToken, String>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthService for MemoryAuth {
    fn login(&mut self, email: &str) -> Result<SessionToken, AuthError> {
        let email = email.trim();
        if !looks_like_email(email) {
            return Err(AuthError::InvalidEmail(email.to_string()));
        }
        let token = SessionToken(Uuid::new_v4().to_string());
        self.sessions.insert(token.clone(), email.to_string());
        info!(email, "participant logged in");
        Ok(token)
    }

    fn logout(&mut self, token: &SessionToken) {
        if let Some(email) = self.sessions.remove(token) {
            info!(email = %email, "participant logged out");
        } else {
            debug!("logout for unknown session ignored");
        }
    }

    fn status(&self, token: &SessionToken) -> AuthStatus {
        match self.sessions.get(token) {
            Some(email) => AuthStatus {
                authenticated: true,
                email: Some(email.clone()),
            },
            None => AuthStatus::default(),
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
