// ── Session context ──
//
// The signed-in user's profile, loaded once at startup and handed to
// every controller as `Arc<Session>`. Nothing mutates it afterwards.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::Backend;
use crate::error::CoreError;

pub const PROFILE_PATH: &str = "api/user/profile/";

/// Profile of the authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_owned()
        }
    }
}

/// Read-only process-wide session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: UserProfile,
}

impl Session {
    pub fn new(user: UserProfile) -> Arc<Self> {
        Arc::new(Self { user })
    }

    /// Session for tools that never call profile-dependent endpoints.
    pub fn anonymous() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Load the profile from the backend.
    pub async fn load<B: Backend>(backend: &B) -> Result<Arc<Self>, CoreError> {
        let value = backend.get(PROFILE_PATH, &[]).await?;
        let user: UserProfile =
            serde_json::from_value(value).map_err(|e| CoreError::Decode {
                message: format!("user profile: {e}"),
            })?;
        info!(email = %user.email, staff = user.is_staff, "session loaded");
        Ok(Self::new(user))
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn is_staff(&self) -> bool {
        self.user.is_staff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_email() {
        let user = UserProfile {
            email: "ops@example.com".into(),
            ..UserProfile::default()
        };
        assert_eq!(user.display_name(), "ops@example.com");

        let named = UserProfile {
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            ..user
        };
        assert_eq!(named.display_name(), "Asha Rao");
    }
}
