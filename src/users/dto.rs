use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo::User;

/// Request body for registration and authentication.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Request body for email verification.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub code: String,
}

/// Partial profile update. Absent fields leave stored values untouched.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub headline: Option<String>,
    pub about: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub area: Option<String>,
    pub contact: Option<String>,
}

/// Token pair returned by a successful authentication.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expired_at: OffsetDateTime,
}

/// Public part of the user returned to the client. The password hash and
/// the verification code never leave the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            verified: user.verified,
            name: user.name,
            headline: user.headline,
            about: user.about,
            kind: user.kind,
            area: user.area,
            contact: user.contact,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_hides_credentials() {
        let user = User {
            id: Uuid::new_v4(),
            email: "test@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            verification_code: Uuid::new_v4(),
            verified: false,
            name: Some("Test".into()),
            headline: None,
            about: None,
            kind: Some("individual".into()),
            area: None,
            contact: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("\"type\":\"individual\""));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("passwordHash"));
        assert!(!json.contains("verificationCode"));
        assert!(!json.contains("headline"));
    }

    #[test]
    fn profile_update_accepts_partial_body() {
        let update: ProfileUpdateRequest =
            serde_json::from_str(r#"{"name":"A","type":"company"}"#).unwrap();
        assert_eq!(update.name.as_deref(), Some("A"));
        assert_eq!(update.kind.as_deref(), Some("company"));
        assert!(update.headline.is_none());
        assert!(update.area.is_none());
    }

    #[test]
    fn auth_tokens_serialize_camel_case_with_rfc3339_expiry() {
        let tokens = AuthTokens {
            access_token: "a.b.c".into(),
            refresh_token: "d.e.f".into(),
            expired_at: time::macros::datetime!(2020-02-03 09:00 UTC),
        };
        let json = serde_json::to_string(&tokens).unwrap();
        assert!(json.contains("\"accessToken\":\"a.b.c\""));
        assert!(json.contains("\"refreshToken\":\"d.e.f\""));
        assert!(json.contains("\"expiredAt\":\"2020-02-03T09:00:00Z\""));
    }
}
