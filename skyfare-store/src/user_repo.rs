use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use skyfare_core::models::UserAccount;
use skyfare_core::repository::{StoreResult, UserStore};

use crate::map_db_err;

pub struct PgUserStore {
    pub pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    is_staff: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        UserAccount {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            password_hash: row.password_hash,
            is_staff: row.is_staff,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, is_staff, created_at";

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> StoreResult<UserAccount> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name,
                               password_hash, is_staff, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, now())
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(UserAccount::from(row))
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(row.map(UserAccount::from))
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(row.map(UserAccount::from))
    }
}
