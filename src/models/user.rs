//! User, role and token claim types

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::validation_messages;
use crate::error::{AppError, AppResult};

/// Role granted to every account at registration
pub const NORMAL_USER_ROLE: &str = "NormalUser";
/// Role required for catalog mutations
pub const ADMIN_ROLE: &str = "Admin";

const PASSWORD_SYMBOLS: &str = r#"!@#$%^&*()_+-=[]{};':"\|,.<>/?"#;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([\w.\-]+)@([\w\-]+)((\.(\w){2,3})+)$").expect("email pattern compiles")
});

/// Account stored in the database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Values needed to insert a new account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Named assertion embedded in issued tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Claim {
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// Role with the claims it carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub name: String,
    pub claims: Vec<Claim>,
}

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(regex(path = *EMAIL_REGEX, message = "Email is not valid"))]
    pub email: String,
    #[validate(
        length(min = 8, message = "Password is too short"),
        custom(function = "upper_and_symbol")
    )]
    pub password: String,
}

impl RegisterRequest {
    /// Trim the username and email; the password is taken as typed
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
        }
    }

    /// Every registration rule the request breaks.
    ///
    /// Email uniqueness is checked later, against the store.
    pub fn validation_errors(&self) -> Vec<String> {
        validation_messages(self.validate())
    }
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

fn upper_and_symbol(password: &str) -> Result<(), ValidationError> {
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));
    if has_upper && has_symbol {
        Ok(())
    } else {
        Err(ValidationError::new("upper_and_symbol").with_message(Cow::Borrowed(
            "Password must contain at least one capital letter and one symbol",
        )))
    }
}

/// JWT claims issued at login and registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id
    pub sub: String,
    pub email: String,
    pub username: String,
    /// Unique token id, fresh for every issued token
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub roles: Vec<String>,
    #[serde(default)]
    pub claims: Vec<Claim>,
}

/// Identity resolved from a validated token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    pub roles: Vec<String>,
}

impl TryFrom<TokenClaims> for Identity {
    type Error = AppError;

    fn try_from(claims: TokenClaims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Authentication("Invalid token subject".to_string()))?;

        Ok(Identity {
            user_id,
            email: claims.email,
            username: claims.username,
            roles: claims.roles,
        })
    }
}

/// Request-scoped context handed to every service call by the HTTP layer
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub identity: Option<Identity>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    /// Identity of the caller, or an authentication error
    pub fn require_user(&self) -> AppResult<&Identity> {
        self.identity
            .as_ref()
            .ok_or_else(|| AppError::Authentication("Authentication required".to_string()))
    }

    pub fn require_role(&self, role: &str) -> AppResult<&Identity> {
        let identity = self.require_user()?;
        if identity.roles.iter().any(|r| r == role) {
            Ok(identity)
        } else {
            Err(AppError::Authorization(format!("{} role required", role)))
        }
    }
}

/// Profile returned to the authenticated user
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}
