//! Authentication, registration and token issuance

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        user::{
            Claim, Identity, LoginRequest, NewUser, RegisterRequest, RequestContext, Role, TokenClaims, User,
            UserProfile, ADMIN_ROLE, NORMAL_USER_ROLE,
        },
        validation_messages,
    },
    repository::{RoleProvider, UserStore},
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const EMAIL_TAKEN: &str = "This email already exists";

/// Signing parameters for issued tokens
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: Option<String>,
    pub ttl: Duration,
    pub issuer: String,
    pub audience: String,
}

impl From<&AuthConfig> for TokenSettings {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            ttl: Duration::minutes(config.jwt_expiration_minutes),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }
}

impl TokenSettings {
    fn secret(&self) -> AppResult<&[u8]> {
        match self.secret.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(secret.as_bytes()),
            _ => Err(AppError::Configuration("JWT secret is not configured".to_string())),
        }
    }
}

/// Signed token and its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Build and sign a token asserting the user's identity, roles and claims.
///
/// Direct user claims come first, followed by each role's claims in role order.
pub fn issue_token(user: &User, roles: &[Role], user_claims: &[Claim], settings: &TokenSettings) -> AppResult<IssuedToken> {
    let secret = settings.secret()?;

    let now = Utc::now();
    let expires_at = now + settings.ttl;

    let claims = TokenClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        username: user.username.clone(),
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
        iss: settings.issuer.clone(),
        aud: settings.audience.clone(),
        roles: roles.iter().map(|r| r.name.clone()).collect(),
        claims: user_claims
            .iter()
            .chain(roles.iter().flat_map(|r| r.claims.iter()))
            .cloned()
            .collect(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

    Ok(IssuedToken { token, expires_at })
}

/// Verify signature, expiry, issuer and audience of a token
pub fn validate_token(token: &str, settings: &TokenSettings) -> AppResult<TokenClaims> {
    let secret = settings.secret()?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[settings.issuer.as_str()]);
    validation.set_audience(&[settings.audience.as_str()]);
    validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))?;

    Ok(data.claims)
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleProvider>,
    settings: TokenSettings,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, roles: Arc<dyn RoleProvider>, settings: TokenSettings) -> Self {
        Self { users, roles, settings }
    }

    /// Register a new account with the NormalUser role and return a token
    pub async fn register(&self, request: RegisterRequest) -> AppResult<IssuedToken> {
        let request = request.normalized();
        let errors = request.validation_errors();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let email = request.email;
        if self.users.email_exists(&email).await? {
            return Err(AppError::validation(EMAIL_TAKEN));
        }

        let new_user = NewUser {
            username: request.username,
            email,
            password_hash: hash_password(&request.password)?,
        };

        let user = match self.users.create(&new_user, NORMAL_USER_ROLE).await {
            Ok(user) => user,
            // Lost a race against another registration with the same email
            Err(AppError::Conflict(_)) => return Err(AppError::validation(EMAIL_TAKEN)),
            Err(e) => return Err(e),
        };

        tracing::info!(user_id = %user.id, "User registered");

        self.token_for(&user).await
    }

    /// Authenticate by email and password and return a token
    pub async fn login(&self, request: LoginRequest) -> AppResult<IssuedToken> {
        let errors = validation_messages(request.validate());
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&user, &request.password)? {
            tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        self.token_for(&user).await
    }

    /// Profile of the authenticated caller
    pub async fn me(&self, ctx: &RequestContext) -> AppResult<UserProfile> {
        let identity = ctx.require_user()?;

        let user = self
            .users
            .find_by_id(identity.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", identity.user_id)))?;
        let roles = self.roles.roles_of(user.id).await?;

        Ok(UserProfile {
            id: user.id,
            email: user.email,
            username: user.username,
            roles: roles.into_iter().map(|r| r.name).collect(),
            created_at: user.created_at,
        })
    }

    /// Resolve the identity carried by a bearer token
    pub fn authenticate_token(&self, token: &str) -> AppResult<Identity> {
        validate_token(token, &self.settings)?.try_into()
    }

    /// Grant the Admin role to existing accounts with the given emails
    pub async fn promote_admins(&self, emails: &[String]) -> AppResult<()> {
        for email in emails {
            match self.users.find_by_email(email).await? {
                Some(user) => {
                    self.users.assign_role(user.id, ADMIN_ROLE).await?;
                    tracing::info!(user_id = %user.id, "Granted {} role", ADMIN_ROLE);
                }
                None => tracing::warn!("Admin account {} does not exist yet", email),
            }
        }
        Ok(())
    }

    async fn token_for(&self, user: &User) -> AppResult<IssuedToken> {
        let roles = self.roles.roles_of(user.id).await?;
        let claims = self.users.claims_of(user.id).await?;
        issue_token(user, &roles, &claims, &self.settings)
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
