use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;

use crate::domain::session::errors::StoreError;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::ports::CredentialStore;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::FirstName;
use crate::domain::user::models::LastName;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, phone_number, password_hash, created_at, updated_at";

const REFRESH_TOKEN_COLUMNS: &str = "id, user_id, token, expires_at, created_at, revoked";

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &PgRow) -> Result<User, StoreError> {
        let corrupt = |e: String| StoreError::Database(format!("Corrupt user row: {}", e));

        let last_name: Option<String> = row.try_get("last_name").map_err(database_error)?;
        let email: Option<String> = row.try_get("email").map_err(database_error)?;

        Ok(User {
            id: UserId(row.try_get("id").map_err(database_error)?),
            first_name: FirstName::new(row.try_get("first_name").map_err(database_error)?)
                .map_err(|e| corrupt(e.to_string()))?,
            last_name: last_name
                .map(LastName::new)
                .transpose()
                .map_err(|e| corrupt(e.to_string()))?,
            email: email
                .map(EmailAddress::new)
                .transpose()
                .map_err(|e| corrupt(e.to_string()))?,
            phone_number: PhoneNumber::new(row.try_get("phone_number").map_err(database_error)?)
                .map_err(|e| corrupt(e.to_string()))?,
            password_hash: row.try_get("password_hash").map_err(database_error)?,
            created_at: row.try_get("created_at").map_err(database_error)?,
            updated_at: row.try_get("updated_at").map_err(database_error)?,
        })
    }

    fn row_to_refresh_token(row: &PgRow) -> Result<RefreshToken, StoreError> {
        Ok(RefreshToken {
            id: row.try_get("id").map_err(database_error)?,
            user_id: UserId(row.try_get("user_id").map_err(database_error)?),
            token: row.try_get("token").map_err(database_error)?,
            expires_at: row.try_get("expires_at").map_err(database_error)?,
            created_at: row.try_get("created_at").map_err(database_error)?,
            revoked: row.try_get("revoked").map_err(database_error)?,
        })
    }
}

/// Classify a driver error: connectivity problems become `Unavailable`.
fn database_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        _ => StoreError::Database(e.to_string()),
    }
}

/// Like [`database_error`], but maps unique violations to `Conflict`.
fn write_error(e: sqlx::Error, conflicting: &str) -> StoreError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(conflicting.to_string());
        }
    }
    database_error(e)
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, email, phone_number, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id.0)
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_ref().map(|n| n.as_str()))
        .bind(user.email.as_ref().map(|e| e.as_str()))
        .bind(user.phone_number.as_str())
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, user.phone_number.as_str()))?;

        Ok(user)
    }

    async fn find_user_by_handle(
        &self,
        phone_number: &PhoneNumber,
    ) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE phone_number = $1",
            USER_COLUMNS
        ))
        .bind(phone_number.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn update_user(&self, user: User) -> Result<User, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, email = $4, phone_number = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_ref().map(|n| n.as_str()))
        .bind(user.email.as_ref().map(|e| e.as_str()))
        .bind(user.phone_number.as_str())
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, user.phone_number.as_str()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(user.id.to_string()));
        }

        Ok(user)
    }

    async fn save_refresh_token(&self, token: RefreshToken) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token, expires_at, created_at, revoked)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.id)
        .bind(token.user_id.0)
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(token.created_at)
        .bind(token.revoked)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "refresh token"))?;

        Ok(())
    }

    async fn find_active_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshToken>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM refresh_tokens WHERE token = $1 AND revoked = FALSE AND expires_at > now()",
            REFRESH_TOKEN_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.as_ref().map(Self::row_to_refresh_token).transpose()
    }

    async fn revoke_refresh_token(&self, token: &str) -> Result<(), StoreError> {
        // Conditional update; concurrent callers serialize on the row lock
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE token = $1 AND revoked = FALSE AND expires_at > now()
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("active refresh token".to_string()));
        }

        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: &UserId) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE user_id = $1 AND revoked = FALSE AND expires_at > now()
            "#,
        )
        .bind(user_id.0)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected())
    }

    async fn purge_expired_refresh_tokens(
        &self,
        before: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected())
    }
}
