//! Registration and login

use crate::config::PasswordConfig;
use crate::domain::{
    LoginInput, NewUser, RegisterInput, RegisteredUser, StringUuid, UserRole, UserWithProfile,
};
use crate::error::{AppError, Result};
use crate::jwt::JwtManager;
use crate::repository::UserRepository;
use metrics::counter;
use std::sync::Arc;
use validator::Validate;

const INVALID_OR_INACTIVE: &str = "Invalid credentials or account deactivated";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub struct AuthService<U: UserRepository> {
    users: Arc<U>,
    jwt_manager: JwtManager,
    password: PasswordConfig,
}

/// bcrypt is CPU-bound; keep it off the async workers.
async fn hash_password(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to verify password: {}", e)))
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(users: Arc<U>, jwt_manager: JwtManager, password: PasswordConfig) -> Self {
        Self {
            users,
            jwt_manager,
            password,
        }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<(RegisteredUser, String)> {
        input.validate()?;
        let profile = input.profile()?;

        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::BadRequest("User already exists".to_string()));
        }

        let password_hash = hash_password(input.password, self.password.bcrypt_cost).await?;

        let user = self
            .users
            .create(&NewUser {
                id: StringUuid::new_v4(),
                email: input.email,
                password_hash,
                first_name: input.first_name,
                last_name: input.last_name,
                phone: input.phone,
                role: input.role,
                is_active: input.is_active.unwrap_or(true),
                profile,
            })
            .await?;

        let token = self.jwt_manager.create_token(user.id, user.role)?;
        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok((RegisteredUser::from(&user), token))
    }

    /// Unknown and deactivated accounts get the same answer.
    pub async fn login(&self, input: LoginInput) -> Result<(UserWithProfile, String)> {
        input.validate()?;

        let user = match self.users.find_by_email(&input.email).await? {
            Some(user) if user.is_active => user,
            _ => {
                counter!("cadesk_auth_login_total", "result" => "failure").increment(1);
                return Err(AppError::Unauthorized(INVALID_OR_INACTIVE.to_string()));
            }
        };

        if !verify_password(input.password, user.password_hash.clone()).await? {
            tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
            counter!("cadesk_auth_login_total", "result" => "failure").increment(1);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let (ca_profile, client_profile) = match user.role {
            UserRole::Ca => (self.users.find_ca_profile(user.id).await?, None),
            UserRole::Client => (None, self.users.find_client_profile(user.id).await?),
        };

        let token = self.jwt_manager.create_token(user.id, user.role)?;
        counter!("cadesk_auth_login_total", "result" => "success").increment(1);
        Ok((
            UserWithProfile {
                user,
                ca_profile,
                client_profile,
            },
            token,
        ))
    }
}
