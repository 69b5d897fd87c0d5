//! Authentication service implementation
//!
//! Resolves a signed-in principal into a [`Session`] from their profile and
//! role, and gates role-specific operations on it.

use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::RecordStore;
use crate::models::{Profile, Role};
use crate::utils::errors::{HostelError, Result};
use crate::utils::logging::log_user_action;

/// The signed-in principal. Read-only for the lifetime of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub room_number: Option<String>,
    pub hostel_block: Option<String>,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn from_profile(profile: Profile, role: Role) -> Self {
        Self {
            user_id: profile.user_id,
            name: profile.name,
            email: profile.email,
            role,
            room_number: profile.room_number,
            hostel_block: profile.hostel_block,
            signed_in_at: Utc::now(),
        }
    }

    /// Room as written onto records; staff without a room get "N/A"
    pub fn room_label(&self) -> String {
        self.room_number.clone().unwrap_or_else(|| "N/A".to_string())
    }

    /// Fail unless the session holds `role`
    pub fn require(&self, role: Role) -> Result<()> {
        if self.role == role {
            Ok(())
        } else {
            warn!(user_id = %self.user_id, role = %self.role, required = %role, "Role check failed");
            Err(HostelError::PermissionDenied(format!(
                "{} access required, signed in as {}",
                role, self.role
            )))
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn RecordStore>,
}

impl AuthService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Build a session for an authenticated user id
    pub async fn sign_in(&self, user_id: Uuid) -> Result<Session> {
        debug!(user_id = %user_id, "Resolving session");

        let profile = self
            .store
            .find_profile(user_id)
            .await?
            .ok_or(HostelError::ProfileNotFound { user_id })?;
        let role = self
            .store
            .find_role(user_id)
            .await?
            .ok_or_else(|| HostelError::PermissionDenied(format!("no role granted to {}", user_id)))?;

        let session = Session::from_profile(profile, role);
        info!(user_id = %user_id, role = %role, "Signed in");
        log_user_action(user_id, "sign_in", Some(role.as_str()));
        Ok(session)
    }

    /// End a session. Consumes it so it cannot be used afterwards.
    pub fn sign_out(&self, session: Session) {
        log_user_action(session.user_id, "sign_out", None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::database::{ChangeFeed, InMemoryStore};
    use crate::database::memory::{DEMO_STUDENT_ID, DEMO_WARDEN_ID};

    fn service() -> AuthService {
        let store = InMemoryStore::with_demo_data(ChangeFeed::default()).unwrap();
        AuthService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_sign_in_builds_session() {
        let auth = service();
        let session = auth.sign_in(Uuid::from_u128(DEMO_STUDENT_ID)).await.unwrap();
        assert_eq!(session.role, Role::Student);
        assert_eq!(session.name, "Aarav Sharma");
        assert_eq!(session.room_label(), "A-101");
        assert!(session.require(Role::Student).is_ok());
        assert_matches!(session.require(Role::Warden), Err(HostelError::PermissionDenied(_)));
        auth.sign_out(session);
    }

    #[tokio::test]
    async fn test_staff_room_label() {
        let session = service().sign_in(Uuid::from_u128(DEMO_WARDEN_ID)).await.unwrap();
        assert_eq!(session.role, Role::Warden);
        assert_eq!(session.room_label(), "N/A");
    }

    #[tokio::test]
    async fn test_unknown_user_has_no_profile() {
        let user_id = Uuid::new_v4();
        let err = service().sign_in(user_id).await.unwrap_err();
        assert_matches!(err, HostelError::ProfileNotFound { user_id: id } if id == user_id);
    }
}
