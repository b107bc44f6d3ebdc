// src/repositories/postgres/user.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use adhdscreen_common::models::{Gender, NewUser, User};
use adhdscreen_common::traits::UserRepository;
use crate::Error;

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: Pool<Postgres>,
}

impl PostgresUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_user(r: &PgRow) -> Result<User, Error> {
    let gender: String = r.try_get("gender")?;
    Ok(User {
        id: r.try_get("id")?,
        name: r.try_get("name")?,
        email: r.try_get("email")?,
        password_hash: r.try_get("password_hash")?,
        age: r.try_get("age")?,
        gender: gender.parse::<Gender>().map_err(|e| Error::Integrity(e.to_string()))?,
        phone: r.try_get("phone")?,
        address: r.try_get("address")?,
        is_active: r.try_get("is_active")?,
        created_at: r.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: r.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &NewUser) -> Result<i64, Error> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, age, gender, phone, address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.age)
            .bind(user.gender.as_str())
            .bind(&user.phone)
            .bind(&user.address)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("id")?)
    }

    async fn get(&self, id: i64) -> Result<Option<User>, Error> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, age, gender,
                   phone, address, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, age, gender,
                   phone, address, is_active, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn set_active(&self, id: i64, is_active: bool) -> Result<(), Error> {
        let done = sqlx::query(
            r#"
            UPDATE users
            SET is_active = $1,
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), Error> {
        // results and user_logs go with it (ON DELETE CASCADE)
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
