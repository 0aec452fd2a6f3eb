//! Caller identity as reported by the backend, plus the client-side state
//! that carries it between requests (token store, login navigation).

pub mod navigation;
pub mod token_store;

use serde::{Deserialize, Serialize};

pub use navigation::{candidate_auth_url, with_base_path, AuthMode, Navigator, LOGIN_PATH};
pub use token_store::{MemoryTokenStore, TokenStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Company,
    Candidate,
}

/// The authenticated caller, fetched fresh from `GET /api/auth/profile`.
/// Only valid for the lifetime of the access token that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub is_email_verified: bool,
    #[serde(rename = "is2FAEnabled")]
    pub is_2fa_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// `{ success, data? }` envelope returned by the profile endpoint.
#[derive(Debug, Deserialize)]
pub struct ProfileEnvelope {
    #[serde(default)]
    pub success: bool,
    pub data: Option<Session>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_uses_backend_field_names() {
        let session: Session = serde_json::from_value(json!({
            "userId": "u-1",
            "email": "ada@example.com",
            "role": "candidate",
            "isEmailVerified": true,
            "is2FAEnabled": false
        }))
        .unwrap();

        assert_eq!(session.role, Role::Candidate);
        assert!(session.jti.is_none());

        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["is2FAEnabled"], json!(false));
        assert!(value.get("jti").is_none());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = serde_json::from_value::<Session>(json!({
            "userId": "u-1",
            "email": "ada@example.com",
            "role": "superuser",
            "isEmailVerified": true,
            "is2FAEnabled": false
        }));
        assert!(result.is_err());
    }
}
