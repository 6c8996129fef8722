use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::ApiError,
    mail::Mailer,
    users::{
        area::is_valid_area,
        dto::{AuthTokens, ProfileUpdateRequest},
        jwt::JwtKeys,
        password::PasswordHasher,
        repo::{NewUser, User, UserStore},
    },
};

const PASSWORD_MIN_LENGTH: usize = 8;
const VERIFICATION_EMAIL_SUBJECT: &str = "UserHub sign up verification";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[A-Za-z0-9+._%-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Orchestrates registration, verification, profile updates and
/// authentication. All collaborators are injected at construction.
pub struct UserService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    mailer: Arc<dyn Mailer>,
    keys: JwtKeys,
    frontend_url: String,
}

impl UserService {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        mailer: Arc<dyn Mailer>,
        keys: JwtKeys,
        frontend_url: String,
    ) -> Self {
        Self {
            store,
            hasher,
            mailer,
            keys,
            frontend_url,
        }
    }

    /// Registers a new, unverified user and sends the verification email.
    pub async fn create_user(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let email = email.trim().to_lowercase();

        if !is_valid_email(&email) {
            warn!(email = %email, "register with invalid email");
            return Err(ApiError::InvalidInput("Email should be _@_._".into()));
        }
        if password.len() < PASSWORD_MIN_LENGTH {
            warn!("register with short password");
            return Err(ApiError::InvalidInput(format!(
                "Password should be {PASSWORD_MIN_LENGTH} characters at least"
            )));
        }
        if self.store.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(ApiError::Conflict("Email already registered".into()));
        }

        let user = self
            .store
            .insert(NewUser {
                email,
                password_hash: self.hasher.hash(password)?,
                verification_code: Uuid::new_v4(),
            })
            .await?;

        self.send_verification_email(&user).await?;
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Confirms email ownership. A repeated call with the same valid code
    /// succeeds again with no observable change.
    pub async fn verify(&self, code: &str) -> Result<User, ApiError> {
        let code = Uuid::parse_str(code.trim())
            .map_err(|_| ApiError::InvalidInput("Code should be a UUID".into()))?;

        let mut user = self
            .store
            .find_by_verification_code(code)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

        user.verified = true;
        let user = self.store.update(&user).await?;
        info!(user_id = %user.id, email = %user.email, "user verified");
        Ok(user)
    }

    /// Applies only the fields present in the partial update. Nothing is
    /// persisted when a structured field fails validation.
    pub async fn update_profile(
        &self,
        email: &str,
        update: ProfileUpdateRequest,
    ) -> Result<User, ApiError> {
        let mut user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

        if let Some(area) = &update.area {
            if !is_valid_area(area) {
                warn!(email = %email, area = %area, "unknown area code");
                return Err(ApiError::InvalidInput("Unknown area code".into()));
            }
        }

        if let Some(name) = update.name {
            user.name = Some(name);
        }
        if let Some(headline) = update.headline {
            user.headline = Some(headline);
        }
        if let Some(about) = update.about {
            user.about = Some(about);
        }
        if let Some(kind) = update.kind {
            user.kind = Some(kind);
        }
        if let Some(area) = update.area {
            user.area = Some(area);
        }
        if let Some(contact) = update.contact {
            user.contact = Some(contact);
        }

        let user = self.store.update(&user).await?;
        info!(user_id = %user.id, email = %user.email, "profile updated");
        Ok(user)
    }

    /// Credentials in, token pair out. An unknown email and a wrong
    /// password produce the exact same error, so callers cannot probe for
    /// registered addresses.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthTokens, ApiError> {
        let email = email.trim().to_lowercase();

        let user = match self.store.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                warn!(email = %email, "authenticate with unknown email");
                return Err(ApiError::BadCredentials);
            }
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            warn!(email = %email, "authenticate with wrong password");
            return Err(ApiError::BadCredentials);
        }

        if !user.verified {
            warn!(email = %email, "authenticate before verification");
            return Err(ApiError::Unverified);
        }

        let access = self.keys.sign_access(&user.email)?;
        let refresh = self.keys.sign_refresh(&user.email)?;
        info!(user_id = %user.id, email = %user.email, "user authenticated");
        Ok(AuthTokens {
            access_token: access.token,
            refresh_token: refresh.token,
            expired_at: access.expires_at,
        })
    }

    async fn send_verification_email(&self, user: &User) -> Result<(), ApiError> {
        let link = format!(
            "{}/users/verify/?code={}",
            self.frontend_url, user.verification_code
        );
        let body = format!(
            "Thank you for joining UserHub!<br>\
             Please click this <a href='{link}' target='_blank'>link</a> \
             to verify your email."
        );
        self.mailer
            .send(&user.email, VERIFICATION_EMAIL_SUBJECT, &body)
            .await?;
        Ok(())
    }
}
