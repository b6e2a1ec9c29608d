//! Authenticated user and session

use serde::{Deserialize, Serialize};

use super::id_string;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[serde(other)]
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::User
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Name for display, falling back to the email
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// Response of `/auth/login` and `/auth/impersonate`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Persisted session
///
/// While impersonating, `impersonator` holds the suspended admin session so
/// it can be restored locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impersonator: Option<Box<Session>>,
}

impl Session {
    pub fn new(auth: AuthResponse) -> Self {
        Self {
            token: auth.token,
            user: auth.user,
            impersonator: None,
        }
    }

    pub fn is_impersonating(&self) -> bool {
        self.impersonator.is_some()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImpersonateRequest<'a> {
    pub user_id: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_role_is_user() {
        let user: User = serde_json::from_value(json!({
            "id": 5,
            "email": "ops@example.com",
            "role": "auditor"
        }))
        .unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.display_name(), "ops@example.com");
    }

    #[test]
    fn test_session_round_trips_with_impersonator() {
        let admin = Session {
            token: "admin-token".to_string(),
            user: User {
                id: "1".to_string(),
                email: "admin@example.com".to_string(),
                name: Some("Admin".to_string()),
                role: Role::Admin,
            },
            impersonator: None,
        };
        let session = Session {
            token: "user-token".to_string(),
            user: User {
                id: "2".to_string(),
                email: "user@example.com".to_string(),
                name: None,
                role: Role::User,
            },
            impersonator: Some(Box::new(admin.clone())),
        };

        let json = serde_json::to_string(&session).unwrap();
        let decoded: Session = serde_json::from_str(&json).unwrap();

        assert!(decoded.is_impersonating());
        assert_eq!(decoded.impersonator.as_deref(), Some(&admin));
    }
}
