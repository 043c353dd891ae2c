//! Account service: registration, sign-in, token sessions and user approval.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use spshare_common::{
    AppError, AppResult, IdGenerator,
    config::{AdminBootstrapConfig, LimitsConfig},
};
use spshare_db::{
    entities::{WorkflowStatus, user},
    repositories::UserRepository,
};
use tracing::info;
use validator::Validate;

use super::limits::UpdateLimitsInput;

#[allow(clippy::expect_used)]
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9]+$").expect("valid username pattern"));

const PASSWORD_SPECIALS: &str = "!@#$";

/// Input for creating an account.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 50, message = "First name should be 50 characters or less"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50, message = "Last name should be 50 characters or less"))]
    pub last_name: String,

    #[validate(
        length(min = 1, max = 50, message = "Email should be 50 characters or less"),
        email(message = "Email address is invalid")
    )]
    pub email: String,

    #[validate(length(min = 1, max = 12, message = "Username should be 12 characters or less"))]
    pub username: String,

    #[validate(length(
        min = 8,
        max = 20,
        message = "Password must be between 8 and 20 characters long"
    ))]
    pub password: String,

    pub confirm_password: String,
}

/// Credentials for sign-in.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignInInput {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// A successful sign-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub workflow_status: WorkflowStatus,
    pub user: user::Model,
}

/// Account service.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
    limits: LimitsConfig,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, limits: LimitsConfig) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
            limits,
        }
    }

    /// Register a new account. It starts pending until an admin approves it.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        let username = input.username.to_lowercase();
        if !USERNAME_RE.is_match(&username) {
            return Err(AppError::Validation(
                "Username should start with an alphabet and must include only alphabets (a-z, A-Z), numbers (0-9)"
                    .to_string(),
            ));
        }
        check_password_strength(&input.password)?;
        if input.password != input.confirm_password {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }

        let model = user::ActiveModel {
            username: Set(username.clone()),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            password: Set(hash_password(&input.password)?),
            token: Set(Some(self.id_gen.generate_token())),
            is_admin: Set(false),
            workflow_status: Set(WorkflowStatus::Pending),
            max_item_count: Set(self.limits.user_max_item_count),
            max_item_space: Set(self.limits.user_max_item_space),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
            ..Default::default()
        };

        if !self.user_repo.insert_if_absent(model).await? {
            return Err(AppError::Conflict(format!(
                "Username '{username}' is already taken"
            )));
        }

        let user = self
            .user_repo
            .find_by_username(&username)
            .await?
            .ok_or_else(|| AppError::Internal(format!("User {username} vanished after insert")))?;

        info!(user_id = user.id, username = %user.username, "Registered user pending approval");
        Ok(user)
    }

    /// Verify credentials and hand out the account's token.
    pub async fn sign_in(&self, input: SignInInput) -> AppResult<Session> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &user.password)? {
            return Err(AppError::Unauthorized);
        }

        let token = match &user.token {
            Some(token) => token.clone(),
            None => self.regenerate_token(user.id).await?,
        };

        Ok(Session {
            token,
            workflow_status: user.workflow_status,
            user,
        })
    }

    /// Resolve a bearer token to an approved user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        match user.workflow_status {
            WorkflowStatus::Approved => Ok(user),
            WorkflowStatus::Pending => Err(AppError::Forbidden(
                "Your account is pending approval".to_string(),
            )),
            WorkflowStatus::Rejected => Err(AppError::Forbidden(
                "Your account request was rejected".to_string(),
            )),
        }
    }

    /// Issue a fresh token, invalidating the old one.
    pub async fn regenerate_token(&self, user_id: i64) -> AppResult<String> {
        let token = self.id_gen.generate_token();
        if self.user_repo.set_token(user_id, &token).await? == 0 {
            return Err(AppError::UserNotFound(user_id.to_string()));
        }
        Ok(token)
    }

    /// Accounts waiting for review.
    pub async fn list_pending(&self) -> AppResult<Vec<user::Model>> {
        self.user_repo.find_pending().await
    }

    /// Approve or reject a pending account.
    pub async fn approve_or_reject(&self, user_id: i64, approve: bool) -> AppResult<user::Model> {
        let user = self.user_repo.get_by_id(user_id).await?;
        if !user.workflow_status.is_pending() {
            return Err(already_reviewed(&user.username));
        }

        let status = WorkflowStatus::from_decision(approve);
        if self.user_repo.set_workflow_status(user_id, status).await? == 0 {
            return Err(already_reviewed(&user.username));
        }

        info!(user_id, username = %user.username, status = %status, "Reviewed user request");
        self.user_repo.get_by_id(user_id).await
    }

    /// Approved non-admin accounts, for limit administration.
    pub async fn list_approved_members(&self) -> AppResult<Vec<user::Model>> {
        self.user_repo.find_approved_members().await
    }

    /// A single account with its current caps.
    pub async fn get_limits(&self, user_id: i64) -> AppResult<user::Model> {
        self.user_repo.get_by_id(user_id).await
    }

    /// Overwrite an account's caps.
    pub async fn update_limits(
        &self,
        user_id: i64,
        input: UpdateLimitsInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        if self
            .user_repo
            .update_limits(user_id, input.max_item_count, input.max_item_space)
            .await?
            == 0
        {
            return Err(AppError::UserNotFound(user_id.to_string()));
        }

        info!(
            user_id,
            max_item_count = input.max_item_count,
            max_item_space = input.max_item_space,
            "Updated user limits"
        );
        self.user_repo.get_by_id(user_id).await
    }

    /// Create the configured administrator unless the username already exists.
    pub async fn ensure_admin(&self, admin: &AdminBootstrapConfig) -> AppResult<user::Model> {
        if let Some(existing) = self.user_repo.find_by_username(&admin.username).await? {
            return Ok(existing);
        }

        let username = admin.username.to_lowercase();
        let model = user::ActiveModel {
            username: Set(username.clone()),
            first_name: Set(admin.first_name.clone()),
            last_name: Set(admin.last_name.clone()),
            email: Set(admin.email.clone()),
            password: Set(hash_password(&admin.password)?),
            token: Set(Some(self.id_gen.generate_token())),
            is_admin: Set(true),
            workflow_status: Set(WorkflowStatus::Approved),
            max_item_count: Set(self.limits.user_max_item_count),
            max_item_space: Set(self.limits.user_max_item_space),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
            ..Default::default()
        };
        self.user_repo.insert_if_absent(model).await?;

        let user = self
            .user_repo
            .find_by_username(&username)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Admin {username} vanished after insert")))?;

        info!(user_id = user.id, username = %user.username, "Bootstrapped administrator");
        Ok(user)
    }
}

fn already_reviewed(username: &str) -> AppError {
    AppError::BadRequest(format!(
        "The request of user '{username}' has already been reviewed"
    ))
}

fn check_password_strength(password: &str) -> AppResult<()> {
    let strong = password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if strong {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Invalid password. Must contain at least one - upper case letter, lowercase letter, digit, and special character (!@#$)"
                .to_string(),
        ))
    }
}

/// Hash a password into an argon2 PHC string.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: i64, username: &str, status: WorkflowStatus) -> user::Model {
        user::Model {
            id,
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: format!("{username}@example.com"),
            password: hash_password("Passw0rd!").unwrap(),
            token: Some("test_token".to_string()),
            is_admin: false,
            workflow_status: status,
            max_item_count: 20,
            max_item_space: 100.0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn register_input(username: &str, password: &str) -> RegisterInput {
        RegisterInput {
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            email: "alice@example.com".to_string(),
            username: username.to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
        }
    }

    fn service(db: MockDatabase) -> UserService {
        let db = Arc::new(db.into_connection());
        UserService::new(UserRepository::new(db), LimitsConfig::default())
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("Passw0rd!").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Passw0rd!", &hash).unwrap());
        assert!(!verify_password("passw0rd!", &hash).unwrap());
    }

    #[test]
    fn test_password_strength() {
        assert!(check_password_strength("Passw0rd!").is_ok());
        assert!(check_password_strength("Passw0rd").is_err());
        assert!(check_password_strength("passw0rd!").is_err());
        assert!(check_password_strength("PASSW0RD!").is_err());
        assert!(check_password_strength("Password!").is_err());
    }

    #[tokio::test]
    async fn test_register_creates_pending_user() {
        let stored = create_test_user(1, "alice", WorkflowStatus::Pending);
        let users = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1)])
                .append_query_results([[stored]]),
        );

        let user = users
            .register(register_input("Alice", "Passw0rd!"))
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.workflow_status, WorkflowStatus::Pending);
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let users = service(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec(0)]));

        let err = users
            .register(register_input("alice", "Passw0rd!"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let users = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = users
            .register(register_input("1alice", "Passw0rd!"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Username should start with an alphabet"));

        let err = users
            .register(register_input("alice", "password"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid password"));

        let mut mismatch = register_input("alice", "Passw0rd!");
        mismatch.confirm_password = "Passw0rd#".to_string();
        let err = users.register(mismatch).await.unwrap_err();
        assert!(err.to_string().contains("Passwords do not match"));

        let mut bad_email = register_input("alice", "Passw0rd!");
        bad_email.email = "not-an-email".to_string();
        assert!(matches!(
            users.register(bad_email).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_sign_in() {
        let user = create_test_user(1, "alice", WorkflowStatus::Pending);
        let users = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()], [user]]),
        );

        let session = users
            .sign_in(SignInInput {
                username: "ALICE".to_string(),
                password: "Passw0rd!".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(session.token, "test_token");
        assert_eq!(session.workflow_status, WorkflowStatus::Pending);

        let err = users
            .sign_in(SignInInput {
                username: "alice".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_authenticate_by_token_requires_approval() {
        let users = service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
            vec![create_test_user(1, "alice", WorkflowStatus::Approved)],
            vec![create_test_user(2, "bob", WorkflowStatus::Pending)],
            vec![create_test_user(3, "carol", WorkflowStatus::Rejected)],
            vec![],
        ]));

        assert_eq!(users.authenticate_by_token("t").await.unwrap().id, 1);
        assert!(matches!(
            users.authenticate_by_token("t").await.unwrap_err(),
            AppError::Forbidden(msg) if msg.contains("pending")
        ));
        assert!(matches!(
            users.authenticate_by_token("t").await.unwrap_err(),
            AppError::Forbidden(msg) if msg.contains("rejected")
        ));
        assert!(matches!(
            users.authenticate_by_token("t").await.unwrap_err(),
            AppError::Unauthorized
        ));
    }

    #[tokio::test]
    async fn test_approve_user() {
        let pending = create_test_user(2, "bob", WorkflowStatus::Pending);
        let mut approved = pending.clone();
        approved.workflow_status = WorkflowStatus::Approved;

        let users = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending], [approved]])
                .append_exec_results([exec(1)]),
        );

        let user = users.approve_or_reject(2, true).await.unwrap();
        assert_eq!(user.workflow_status, WorkflowStatus::Approved);
    }

    #[tokio::test]
    async fn test_review_is_one_shot() {
        let users = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user(2, "bob", WorkflowStatus::Rejected)]]),
        );

        let err = users.approve_or_reject(2, true).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_update_limits_rejects_invalid_space() {
        let users = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = users
            .update_limits(
                1,
                UpdateLimitsInput {
                    max_item_count: 10,
                    max_item_space: 0.0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_ensure_admin_keeps_existing_account() {
        let mut existing = create_test_user(1, "root", WorkflowStatus::Approved);
        existing.is_admin = true;
        let users = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[existing]]),
        );

        let admin = users
            .ensure_admin(&AdminBootstrapConfig {
                username: "root".to_string(),
                password: "Secr3t!pass".to_string(),
                first_name: "Admin".to_string(),
                last_name: "Admin".to_string(),
                email: "root@example.com".to_string(),
            })
            .await
            .unwrap();

        assert!(admin.is_admin);
    }
}
