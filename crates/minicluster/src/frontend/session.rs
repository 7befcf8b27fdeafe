use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::trace;
use uuid::Uuid;

use super::error::FrontendError;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub user: String,
    pub opened_at: DateTime<Utc>,
}

/// Open sessions of one front-end server, shared by all transports.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: DashMap<String, SessionInfo>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session; any non-empty user is accepted.
    pub fn open(&self, user: &str, _password: &str) -> Result<String, FrontendError> {
        if user.trim().is_empty() {
            return Err(FrontendError::InvalidCredentials {
                reason: "user must not be empty".to_string(),
            });
        }
        let session_id = Uuid::new_v4().to_string();
        self.sessions.insert(
            session_id.clone(),
            SessionInfo {
                user: user.to_string(),
                opened_at: Utc::now(),
            },
        );
        trace!("Opened session {session_id} for user {user}");
        Ok(session_id)
    }

    pub fn close(&self, session_id: &str) -> Result<SessionInfo, FrontendError> {
        match self.sessions.remove(session_id) {
            Some((_, info)) => {
                trace!("Closed session {session_id}");
                Ok(info)
            }
            None => Err(FrontendError::SessionNotFound {
                session_id: session_id.to_string(),
            }),
        }
    }

    pub fn get(&self, session_id: &str) -> Option<SessionInfo> {
        self.sessions.get(session_id).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn clear(&self) {
        self.sessions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_close() {
        let sessions = SessionManager::new();
        let id = sessions.open("foo", "bar").unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions.get(&id).map(|info| info.user), Some("foo".to_string()));

        let info = sessions.close(&id).unwrap();
        assert_eq!(info.user, "foo");
        assert!(sessions.is_empty());
        assert!(matches!(
            sessions.close(&id),
            Err(FrontendError::SessionNotFound { .. })
        ));
    }

    #[test]
    fn test_empty_user_rejected() {
        let sessions = SessionManager::new();
        assert!(matches!(
            sessions.open("  ", "bar"),
            Err(FrontendError::InvalidCredentials { .. })
        ));
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_session_ids_are_unique() {
        let sessions = SessionManager::new();
        let a = sessions.open("foo", "bar").unwrap();
        let b = sessions.open("foo", "bar").unwrap();
        assert_ne!(a, b);
        assert_eq!(sessions.len(), 2);
    }
}
