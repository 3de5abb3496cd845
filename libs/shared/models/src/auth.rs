use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Capability context for doctor-scoped operations. Built server-side from
/// the validated token, never from anything the client asserts about itself.
#[derive(Debug, Clone)]
pub struct AuthorizationContext {
    pub user_id: String,
    pub role: Option<String>,
}

impl AuthorizationContext {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }

    /// A context may act for a doctor when it is that doctor (doctor rows
    /// are keyed by the identity provider's user id) or an admin.
    pub fn can_act_for_doctor(&self, doctor_id: &Uuid) -> bool {
        self.user_id == doctor_id.to_string() || self.is_admin()
    }
}
