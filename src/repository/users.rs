//! Users repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use super::{is_unique_violation, RoleProvider, UserStore};
use crate::{
    error::{AppError, AppResult},
    models::user::{Claim, NewUser, Role, User},
};

const USER_COLUMNS: &str = "id, email, username, password_hash, created_at";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UsersRepository {
    /// Get user by email (case-insensitive)
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
            .bind(email.trim())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Insert the user and its first role in one transaction
    async fn create(&self, user: &NewUser, role: &str) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, username, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user.email.trim())
        .bind(user.username.trim())
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Email already exists".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        let granted = sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) SELECT $1, id FROM roles WHERE name = $2",
        )
        .bind(created.id)
        .bind(role)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if granted == 0 {
            return Err(AppError::Internal(format!("Role {} does not exist", role)));
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn assign_role(&self, user_id: Uuid, role: &str) -> AppResult<()> {
        let role_id: Option<i32> = sqlx::query_scalar("SELECT id FROM roles WHERE name = $1")
            .bind(role)
            .fetch_optional(&self.pool)
            .await?;
        let role_id = role_id.ok_or_else(|| AppError::NotFound(format!("Role {} not found", role)))?;

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn claims_of(&self, user_id: Uuid) -> AppResult<Vec<Claim>> {
        let claims = sqlx::query_as::<_, Claim>(
            "SELECT claim_type, claim_value AS value FROM user_claims WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(claims)
    }
}

#[async_trait]
impl RoleProvider for UsersRepository {
    /// Roles of a user with their claims, ordered by role name
    async fn roles_of(&self, user_id: Uuid) -> AppResult<Vec<Role>> {
        let rows = sqlx::query(
            r#"
            SELECT r.name, rc.claim_type, rc.claim_value
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            LEFT JOIN role_claims rc ON rc.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name, rc.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut roles: Vec<Role> = Vec::new();
        for row in rows {
            let name: String = row.get("name");
            let claim_type: Option<String> = row.get("claim_type");
            let claim_value: Option<String> = row.get("claim_value");

            if roles.last().map(|r| r.name != name).unwrap_or(true) {
                roles.push(Role {
                    name,
                    claims: Vec::new(),
                });
            }

            if let (Some(claim_type), Some(value), Some(role)) = (claim_type, claim_value, roles.last_mut()) {
                role.claims.push(Claim::new(claim_type, value));
            }
        }

        Ok(roles)
    }
}
