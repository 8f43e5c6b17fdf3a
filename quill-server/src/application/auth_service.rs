use crate::data::user_repository::UserRepository;
use crate::domain::error::Validator;
use crate::domain::user::{LoginUserRequest, RegisterUserRequest, UserResponse};
use crate::domain::DomainError;
use crate::infrastructure::jwt::JwtService;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::Arc;

pub struct AuthService {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    jwt_service: Arc<JwtService>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            user_repo,
            jwt_service,
        }
    }

    /// Create an account. Registration does not establish a session; the
    /// created user logs in afterwards.
    pub async fn register(&self, req: RegisterUserRequest) -> Result<UserResponse, DomainError> {
        let mut v = Validator::default();
        if req.name.trim().is_empty() {
            v.add("name", "The name field is required.");
        }
        if req.email.trim().is_empty() {
            v.add("email", "The email field is required.");
        } else if !req.email.contains('@') {
            v.add("email", "The email must be a valid email address.");
        }
        if req.password.len() < 8 {
            v.add("password", "The password must be at least 8 characters.");
        }
        v.finish()?;

        if self.user_repo.find_by_email(&req.email).await.is_ok() {
            tracing::warn!("Registration failed: email already taken");
            return Err(DomainError::UserAlreadyExists);
        }

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Password hashing failed: {}", e);
                DomainError::Internal(format!("Password hashing failed: {}", e))
            })?
            .to_string();

        let user = self.user_repo.create(req, password_hash).await?;

        tracing::info!("User registered: id={}, email={}", user.id, user.email);
        Ok(UserResponse::from(user))
    }

    pub async fn login(&self, req: LoginUserRequest) -> Result<(String, UserResponse), DomainError> {
        let user = match self.user_repo.find_by_email(&req.email).await {
            Ok(user) => user,
            Err(DomainError::UserNotFound) => {
                tracing::warn!("Login failed: unknown email");
                // Не раскрываем, существует ли адрес
                return Err(DomainError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| {
            tracing::error!("Invalid password hash format: {}", e);
            DomainError::Internal(format!("Invalid password hash: {}", e))
        })?;

        if Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .is_err()
        {
            tracing::warn!("Invalid password for user {}", user.email);
            return Err(DomainError::InvalidCredentials);
        }

        let token = self
            .jwt_service
            .generate_token(user.id, user.email.clone())?;

        tracing::info!("User logged in: id={}, email={}", user.id, user.email);
        Ok((token, UserResponse::from(user)))
    }

    /// The user a verified bearer token belongs to.
    pub async fn current_user(&self, user_id: i64) -> Result<UserResponse, DomainError> {
        let user = self.user_repo.find_by_id(user_id).await?;
        Ok(UserResponse::from(user))
    }
}
