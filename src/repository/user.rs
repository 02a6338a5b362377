//! User repository

use crate::domain::{CaProfile, ClientProfile, NewProfile, NewUser, StringUuid, User};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the user and its role profile atomically
    async fn create(&self, user: &NewUser) -> Result<User>;
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_ca_profile(&self, user_id: StringUuid) -> Result<Option<CaProfile>>;
    async fn find_client_profile(&self, user_id: StringUuid) -> Result<Option<ClientProfile>>;
}

pub struct UserRepositoryImpl {
    pool: MySqlPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = r#"
    id, email, password_hash, first_name, last_name, phone, role, is_active, created_at, updated_at
"#;

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, user: &NewUser) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, phone, role, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, NOW(3), NOW(3))
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.role)
        .bind(user.is_active)
        .execute(&mut *tx)
        .await?;

        match &user.profile {
            Some(NewProfile::Ca(profile)) => {
                sqlx::query(
                    r#"
                    INSERT INTO ca_profiles (id, user_id, license_number, firm, experience, specialization)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(StringUuid::new_v4())
                .bind(user.id)
                .bind(&profile.license_number)
                .bind(&profile.firm)
                .bind(profile.experience)
                .bind(&profile.specialization)
                .execute(&mut *tx)
                .await?;
            }
            Some(NewProfile::Client(profile)) => {
                sqlx::query(
                    r#"
                    INSERT INTO client_profiles (id, user_id, company_name, gstin, pan, address)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(StringUuid::new_v4())
                .bind(user.id)
                .bind(&profile.company_name)
                .bind(&profile.gstin)
                .bind(&profile.pan)
                .bind(&profile.address)
                .execute(&mut *tx)
                .await?;
            }
            None => {}
        }

        tx.commit().await?;

        self.find_by_id(user.id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create user")))
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_ca_profile(&self, user_id: StringUuid) -> Result<Option<CaProfile>> {
        let profile = sqlx::query_as::<_, CaProfile>(
            r#"
            SELECT id, user_id, license_number, firm, experience, specialization
            FROM ca_profiles
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn find_client_profile(&self, user_id: StringUuid) -> Result<Option<ClientProfile>> {
        let profile = sqlx::query_as::<_, ClientProfile>(
            r#"
            SELECT id, user_id, company_name, gstin, pan, address
            FROM client_profiles
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}
