// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::user::{Claims, User, UserRole},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, token_ttl: Duration) -> Self {
        Self { user_repo, jwt_secret, token_ttl }
    }

    pub async fn login_user<'e, E>(&self, executor: E, email: &str, password: &str) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = self
            .user_repo
            .find_by_email(executor, email)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // bcrypt is CPU bound, keep it off the async workers.
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("password verification task failed: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "user logged in");
        self.create_token(user.id, user.role)
    }

    /// Checks signature and expiry only; the claims carry everything the
    /// request needs.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims)
    }

    pub fn create_token(&self, user_id: Uuid, role: UserRole) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: user_id,
            role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    pub async fn get_user<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.user_repo.find_by_id(executor, id).await
    }

    pub async fn list_users<'e, E>(&self, executor: E) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.user_repo.list_users(executor).await
    }

    /// Creates a `master` account when the users table is empty. Returns
    /// the new user, or `None` if anyone already exists.
    pub async fn ensure_bootstrap_admin<'a, A>(
        &self,
        conn: A,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Option<User>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let password_clone = password.to_owned();
        let hashed_password = tokio::task::spawn_blocking(move || {
            hash(&password_clone, bcrypt::DEFAULT_COST)
        })
        .await
        .map_err(|e| anyhow::anyhow!("password hashing task failed: {}", e))??;

        let mut tx = conn.begin().await?;

        if self.user_repo.count_users(&mut *tx).await? > 0 {
            return Ok(None);
        }

        let username = email.split('@').next().unwrap_or(email);
        let user = self
            .user_repo
            .create_user(&mut *tx, username, email, &hashed_password, full_name, UserRole::Master)
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = %user.id, email = %user.email, "bootstrap admin created");
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(ttl: Duration) -> AuthService {
        AuthService::new(UserRepository::new(), "test-secret".into(), ttl)
    }

    #[test]
    fn token_round_trip_keeps_user_and_role() {
        let auth = service(Duration::hours(1));
        let user_id = Uuid::new_v4();

        let token = auth.create_token(user_id, UserRole::SalesAdmin).unwrap();
        let claims = auth.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::SalesAdmin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = service(Duration::hours(-2));
        let token = auth.create_token(Uuid::new_v4(), UserRole::Master).unwrap();

        assert!(matches!(auth.validate_token(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = AuthService::new(UserRepository::new(), "another-secret".into(), Duration::hours(1));
        let token = other.create_token(Uuid::new_v4(), UserRole::Master).unwrap();

        assert!(matches!(service(Duration::hours(1)).validate_token(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(
            service(Duration::hours(1)).validate_token("not-a-jwt"),
            Err(AppError::InvalidToken)
        ));
    }
}
