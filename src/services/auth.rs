//! Identity lifecycle: registration, sessions (login/refresh/logout), profile
//! and account administration.

use crate::auth::{PasswordHasherService, TokenIssuer, TokenPair, TokenType};
use crate::error::{AppError, AppResult};
use crate::models::{
    normalize_email, AccountUpdate, Identity, NewUser, ProfileUpdate, Role, User, UserFilter,
};
use crate::repositories::{ProfileExtensions, TokenBlacklist, UserStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Same message for unknown user, inactive user and wrong password.
pub const BAD_CREDENTIALS: &str = "No active account found with the given credentials";

/// Sign-up payload.
#[derive(Debug, Deserialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(max = 254))]
    pub email: String,
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    /// Defaults to student; anything else needs an admin caller.
    #[serde(default)]
    pub role: Option<String>,
}

/// Successful login: the token pair plus the claims clients display.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub access: String,
    pub refresh: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshedAccess {
    pub access: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub studio_name: Option<String>,
}

/// Why a logout was refused. Logged in full, reported to the client as a
/// bare `BadRequest`.
#[derive(Debug, thiserror::Error)]
pub enum LogoutFailure {
    #[error("request body could not be parsed: {0}")]
    MalformedBody(String),

    #[error("no refresh token in request")]
    MissingToken,

    #[error("refresh token rejected: {0}")]
    InvalidToken(String),

    #[error("refresh token already blacklisted")]
    AlreadyRevoked,

    #[error("blacklist write failed: {0}")]
    Store(String),
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    profiles: Arc<dyn ProfileExtensions>,
    blacklist: Arc<dyn TokenBlacklist>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        profiles: Arc<dyn ProfileExtensions>,
        blacklist: Arc<dyn TokenBlacklist>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            users,
            profiles,
            blacklist,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Create an account. Issues no token.
    #[instrument(skip(self, caller, registration), fields(username = %registration.username))]
    pub async fn register(
        &self,
        caller: Option<&Identity>,
        registration: Registration,
    ) -> AppResult<User> {
        registration
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        validate_username(&registration.username)?;
        let email = normalize_email(&registration.email);
        PasswordHasherService::validate_email(&email)?;

        let role = match registration.role.as_deref() {
            None => Role::default(),
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|e| AppError::Validation(e.to_string()))?,
        };
        if role != Role::Student {
            let caller = caller.ok_or_else(|| {
                AppError::Forbidden("Only an admin may assign a role.".to_string())
            })?;
            self.require_admin(caller).await?;
        }

        PasswordHasherService::validate_strength(
            &registration.password,
            &registration.username,
            &email,
        )?;

        if self.users.username_taken(&registration.username).await? {
            return Err(AppError::Conflict(
                "A user with that username already exists.".to_string(),
            ));
        }
        if self.users.email_taken(&email).await? {
            return Err(AppError::Conflict(
                "A user with that email already exists.".to_string(),
            ));
        }

        let password_hash = PasswordHasherService::hash_password(&registration.password)?;
        let user = self
            .users
            .create(NewUser {
                username: registration.username,
                email,
                password_hash,
                role,
                phone_number: registration.phone_number,
                profile_picture: registration.profile_picture,
                bio: registration.bio,
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> AppResult<Session> {
        let user = self.users.find_by_username(username).await?;
        let verified = match &user {
            Some(u) => PasswordHasherService::verify_password(password, &u.password_hash)?,
            None => {
                PasswordHasherService::verify_dummy(password);
                false
            }
        };

        let user = match user {
            Some(u) if verified && u.is_active => u,
            _ => {
                info!("login rejected");
                return Err(AppError::Auth(BAD_CREDENTIALS.to_string()));
            }
        };

        self.users.record_login(user.id, Utc::now()).await?;
        let TokenPair { access, refresh } = self.tokens.issue_pair(&user)?;

        info!(user_id = %user.id, role = %user.role, "user logged in");
        Ok(Session {
            access,
            refresh,
            username: user.username,
            role: user.role,
        })
    }

    /// Exchange a refresh token for a new access token. All token problems
    /// surface as one `InvalidToken`; the reason is only logged.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<RefreshedAccess> {
        match self.try_refresh(refresh_token).await {
            Err(AppError::InvalidToken(reason)) => {
                debug!(reason = %reason, "refresh rejected");
                Err(AppError::InvalidToken(reason))
            }
            other => other,
        }
    }

    async fn try_refresh(&self, refresh_token: &str) -> AppResult<RefreshedAccess> {
        let claims = self.tokens.decode(refresh_token, TokenType::Refresh)?;
        if self.blacklist.is_revoked(&claims.jti).await? {
            return Err(AppError::InvalidToken(format!("jti {} is blacklisted", claims.jti)));
        }

        let user_id = claims.user_id()?;
        let user = match self.users.find_by_id(user_id).await? {
            Some(u) if u.is_active => u,
            Some(_) => return Err(AppError::InvalidToken(format!("user {} is inactive", user_id))),
            None => return Err(AppError::InvalidToken(format!("user {} not found", user_id))),
        };

        Ok(RefreshedAccess {
            access: self.tokens.issue_access(&user)?,
        })
    }

    /// Blacklist a refresh token. Any failure becomes a generic `BadRequest`
    /// after its cause is logged.
    #[instrument(skip_all, fields(user_id = %identity.user_id))]
    pub async fn logout(&self, identity: &Identity, refresh_token: Option<&str>) -> AppResult<()> {
        match self.try_logout(refresh_token).await {
            Ok(()) => {
                info!("refresh token blacklisted");
                Ok(())
            }
            Err(failure) => Err(self.reject_logout(identity, failure)),
        }
    }

    async fn try_logout(&self, refresh_token: Option<&str>) -> Result<(), LogoutFailure> {
        let token = refresh_token
            .filter(|t| !t.trim().is_empty())
            .ok_or(LogoutFailure::MissingToken)?;
        let claims = self
            .tokens
            .decode(token, TokenType::Refresh)
            .map_err(|e| LogoutFailure::InvalidToken(e.to_string()))?;
        let inserted = self
            .blacklist
            .revoke(&claims.jti, claims.remaining_lifetime())
            .await
            .map_err(|e| LogoutFailure::Store(e.to_string()))?;
        if !inserted {
            return Err(LogoutFailure::AlreadyRevoked);
        }
        Ok(())
    }

    /// Log a logout failure with its cause and collapse it for the client.
    pub fn reject_logout(&self, identity: &Identity, failure: LogoutFailure) -> AppError {
        warn!(user_id = %identity.user_id, cause = %failure, "logout failed");
        AppError::BadRequest
    }

    /// The caller's profile as currently persisted.
    #[instrument(skip_all, fields(user_id = %identity.user_id))]
    pub async fn profile(&self, identity: &Identity) -> AppResult<Profile> {
        let user = self.active_user(identity.user_id).await?;
        let studio_name = self.profiles.studio_name(user.id).await?;
        Ok(Profile {
            username: user.username,
            email: user.email,
            role: user.role,
            studio_name,
        })
    }

    #[instrument(skip_all, fields(user_id = %identity.user_id))]
    pub async fn update_profile(&self, identity: &Identity, update: ProfileUpdate) -> AppResult<User> {
        update
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.active_user(identity.user_id).await?;
        let user = self
            .users
            .update_profile(identity.user_id, update)
            .await?
            .ok_or_else(|| AppError::Auth("User not found".to_string()))?;
        info!("profile updated");
        Ok(user)
    }

    #[instrument(skip_all, fields(user_id = %identity.user_id))]
    pub async fn list_users(&self, identity: &Identity, filter: &UserFilter) -> AppResult<Vec<User>> {
        self.require_admin(identity).await?;
        self.users.list(filter).await
    }

    #[instrument(skip(self, identity, update), fields(user_id = %identity.user_id))]
    pub async fn update_user(
        &self,
        identity: &Identity,
        target: Uuid,
        update: AccountUpdate,
    ) -> AppResult<User> {
        self.require_admin(identity).await?;
        if update.is_empty() {
            return Err(AppError::Validation("No changes requested".to_string()));
        }
        let user = self
            .users
            .update_account(target, update)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", target)))?;
        info!(target_user = %user.id, role = %user.role, is_active = user.is_active, "account updated");
        Ok(user)
    }

    /// Admin rights come from the claim and the current row: a demoted or
    /// deactivated admin loses them before the access token expires.
    async fn require_admin(&self, identity: &Identity) -> AppResult<()> {
        identity.require_role(&[Role::Admin])?;
        self.active_user(identity.user_id).await?.role.require(&[Role::Admin])
    }

    async fn active_user(&self, user_id: Uuid) -> AppResult<User> {
        match self.users.find_by_id(user_id).await? {
            Some(u) if u.is_active => Ok(u),
            _ => Err(AppError::Auth("User not found".to_string())),
        }
    }
}

/// Letters, digits and `@ . + - _` only.
pub fn validate_username(username: &str) -> AppResult<()> {
    let valid = !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !valid {
        return Err(AppError::Validation(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MemoryBlacklist, MemoryProfileExtensions, MemoryUserStore};

    const PASSWORD: &str = "Sh0ot-the-m00n!";

    struct Fixture {
        service: AuthService,
        users: MemoryUserStore,
        profiles: MemoryProfileExtensions,
    }

    const SECRET: &str = "test-jwt-secret-min-32-chars!!!!";

    fn fixture() -> Fixture {
        fixture_with(TokenIssuer::new(SECRET, 300, 86_400))
    }

    fn fixture_with(tokens: TokenIssuer) -> Fixture {
        let users = MemoryUserStore::new();
        let profiles = MemoryProfileExtensions::new();
        let service = AuthService::new(
            Arc::new(users.clone()),
            Arc::new(profiles.clone()),
            Arc::new(MemoryBlacklist::new()),
            tokens,
        );
        Fixture {
            service,
            users,
            profiles,
        }
    }

    fn registration(username: &str, email: &str) -> Registration {
        Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            phone_number: None,
            profile_picture: None,
            bio: None,
            role: None,
        }
    }

    fn identity_from(service: &AuthService, session: &Session) -> Identity {
        let claims = service
            .tokens()
            .decode(&session.access, TokenType::Access)
            .unwrap();
        Identity {
            user_id: claims.user_id().unwrap(),
            username: claims.username,
            role: claims.role,
        }
    }

    async fn admin(f: &Fixture) -> Identity {
        let user = f
            .service
            .register(None, registration("root", "root@example.com"))
            .await
            .unwrap();
        f.users
            .update_account(
                user.id,
                AccountUpdate {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let session = f.service.login("root", PASSWORD).await.unwrap();
        identity_from(&f.service, &session)
    }

    #[tokio::test]
    async fn register_then_login_yields_claims_with_default_role() {
        let f = fixture();
        let user = f
            .service
            .register(None, registration("ada", "ada@example.com"))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Student);
        assert_ne!(user.password_hash, PASSWORD);

        let session = f.service.login("ada", PASSWORD).await.unwrap();
        assert_eq!(session.username, "ada");
        assert_eq!(session.role, Role::Student);

        let claims = f
            .service
            .tokens()
            .decode(&session.access, TokenType::Access)
            .unwrap();
        assert_eq!(claims.username, "ada");
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.sub, user.id.to_string());

        let stored = f.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn duplicate_username_or_email_is_a_conflict() {
        let f = fixture();
        f.service
            .register(None, registration("ada", "ada@example.com"))
            .await
            .unwrap();

        let same_username = f
            .service
            .register(None, registration("ada", "someone-else@example.com"))
            .await;
        assert!(matches!(same_username, Err(AppError::Conflict(_))));

        let same_email = f
            .service
            .register(None, registration("grace", "ada@EXAMPLE.com"))
            .await;
        assert!(matches!(same_email, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let f = fixture();
        f.service
            .register(None, registration("ada", "ada@example.com"))
            .await
            .unwrap();

        let wrong = f.service.login("ada", "not-the-password").await.unwrap_err();
        let unknown = f.service.login("nobody", PASSWORD).await.unwrap_err();
        match (wrong, unknown) {
            (AppError::Auth(a), AppError::Auth(b)) => {
                assert_eq!(a, b);
                assert_eq!(a, BAD_CREDENTIALS);
            }
            other => panic!("expected two Auth errors, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn inactive_user_cannot_log_in() {
        let f = fixture();
        let user = f
            .service
            .register(None, registration("ada", "ada@example.com"))
            .await
            .unwrap();
        f.users
            .update_account(
                user.id,
                AccountUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            f.service.login("ada", PASSWORD).await,
            Err(AppError::Auth(msg)) if msg == BAD_CREDENTIALS
        ));
    }

    #[tokio::test]
    async fn refresh_issues_access_until_logout() {
        let f = fixture();
        f.service
            .register(None, registration("ada", "ada@example.com"))
            .await
            .unwrap();
        let session = f.service.login("ada", PASSWORD).await.unwrap();
        let identity = identity_from(&f.service, &session);

        let refreshed = f.service.refresh(&session.refresh).await.unwrap();
        let claims = f
            .service
            .tokens()
            .decode(&refreshed.access, TokenType::Access)
            .unwrap();
        assert_eq!(claims.username, "ada");

        f.service
            .logout(&identity, Some(session.refresh.as_str()))
            .await
            .unwrap();
        assert!(matches!(
            f.service.refresh(&session.refresh).await,
            Err(AppError::InvalidToken(_))
        ));

        // A second logout never succeeds and never un-revokes.
        assert!(matches!(
            f.service.logout(&identity, Some(session.refresh.as_str())).await,
            Err(AppError::BadRequest)
        ));
        assert!(f.service.refresh(&session.refresh).await.is_err());
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens_and_garbage() {
        let f = fixture();
        f.service
            .register(None, registration("ada", "ada@example.com"))
            .await
            .unwrap();
        let session = f.service.login("ada", PASSWORD).await.unwrap();
        assert!(matches!(
            f.service.refresh(&session.access).await,
            Err(AppError::InvalidToken(_))
        ));
        assert!(matches!(
            f.service.refresh("garbage").await,
            Err(AppError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn refresh_rejects_deactivated_user() {
        let f = fixture();
        let user = f
            .service
            .register(None, registration("ada", "ada@example.com"))
            .await
            .unwrap();
        let session = f.service.login("ada", PASSWORD).await.unwrap();
        f.users
            .update_account(
                user.id,
                AccountUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            f.service.refresh(&session.refresh).await,
            Err(AppError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn logout_failures_collapse_to_bad_request() {
        let f = fixture();
        f.service
            .register(None, registration("ada", "ada@example.com"))
            .await
            .unwrap();
        let session = f.service.login("ada", PASSWORD).await.unwrap();
        let identity = identity_from(&f.service, &session);

        for token in [None, Some(""), Some("not-a-token"), Some(session.access.as_str())] {
            assert!(matches!(
                f.service.logout(&identity, token).await,
                Err(AppError::BadRequest)
            ));
        }
        // The refresh token itself is untouched by the failed attempts.
        assert!(f.service.refresh(&session.refresh).await.is_ok());
    }

    #[tokio::test]
    async fn profile_reflects_persisted_row_and_studio() {
        let f = fixture();
        let user = f
            .service
            .register(None, registration("ada", "ada@example.com"))
            .await
            .unwrap();
        let session = f.service.login("ada", PASSWORD).await.unwrap();
        let identity = identity_from(&f.service, &session);

        let profile = f.service.profile(&identity).await.unwrap();
        assert_eq!(
            profile,
            Profile {
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
                role: Role::Student,
                studio_name: None,
            }
        );

        f.users
            .update_account(
                user.id,
                AccountUpdate {
                    role: Some(Role::Photographer),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        f.profiles.set_studio_name(user.id, "North Light").await;

        // Token still says student; the profile reads the row.
        let profile = f.service.profile(&identity).await.unwrap();
        assert_eq!(profile.role, Role::Photographer);
        assert_eq!(profile.studio_name.as_deref(), Some("North Light"));
    }

    #[tokio::test]
    async fn profile_of_deactivated_user_is_unauthenticated() {
        let f = fixture();
        let user = f
            .service
            .register(None, registration("ada", "ada@example.com"))
            .await
            .unwrap();
        let session = f.service.login("ada", PASSWORD).await.unwrap();
        let identity = identity_from(&f.service, &session);
        f.users
            .update_account(
                user.id,
                AccountUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            f.service.profile(&identity).await,
            Err(AppError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let f = fixture();
        let mut reg = registration("ada", "ada@example.com");
        reg.role = Some("superuser".to_string());
        assert!(matches!(
            f.service.register(None, reg).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn explicit_student_role_needs_no_privilege() {
        let f = fixture();
        let mut reg = registration("ada", "ada@example.com");
        reg.role = Some("student".to_string());
        let user = f.service.register(None, reg).await.unwrap();
        assert_eq!(user.role, Role::Student);
    }

    #[tokio::test]
    async fn privileged_role_requires_admin_caller() {
        let f = fixture();
        let mut reg = registration("pia", "pia@example.com");
        reg.role = Some("photographer".to_string());
        assert!(matches!(
            f.service.register(None, reg).await,
            Err(AppError::Forbidden(_))
        ));

        let admin = admin(&f).await;
        let mut reg = registration("pia", "pia@example.com");
        reg.role = Some("photographer".to_string());
        let user = f.service.register(Some(&admin), reg).await.unwrap();
        assert_eq!(user.role, Role::Photographer);
    }

    #[tokio::test]
    async fn invalid_fields_fail_validation() {
        let f = fixture();
        let cases = [
            registration("bad name", "ok@example.com"),
            registration("ada", "not-an-email"),
            registration("", "ok@example.com"),
            Registration {
                password: "1234567890".to_string(),
                ..registration("ada", "ada@example.com")
            },
            Registration {
                phone_number: Some("0".repeat(21)),
                ..registration("ada", "ada@example.com")
            },
        ];
        for reg in cases {
            assert!(matches!(
                f.service.register(None, reg).await,
                Err(AppError::Validation(_))
            ));
        }
        assert!(f.users.list(&UserFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_profile_changes_optional_fields() {
        let f = fixture();
        f.service
            .register(None, registration("ada", "ada@example.com"))
            .await
            .unwrap();
        let session = f.service.login("ada", PASSWORD).await.unwrap();
        let identity = identity_from(&f.service, &session);

        let user = f
            .service
            .update_profile(
                &identity,
                ProfileUpdate {
                    bio: Some("Class of 2027".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(user.bio.as_deref(), Some("Class of 2027"));
        assert_eq!(user.phone_number, None);
    }

    #[tokio::test]
    async fn admin_tools_are_admin_only() {
        let f = fixture();
        f.service
            .register(None, registration("ada", "ada@example.com"))
            .await
            .unwrap();
        let session = f.service.login("ada", PASSWORD).await.unwrap();
        let student = identity_from(&f.service, &session);

        assert!(matches!(
            f.service.list_users(&student, &UserFilter::default()).await,
            Err(AppError::Forbidden(_))
        ));

        let admin = admin(&f).await;
        let students = f
            .service
            .list_users(
                &admin,
                &UserFilter {
                    role: Some(Role::Student),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].to_string(), "ada (Basic Student)");

        let updated = f
            .service
            .update_user(
                &admin,
                student.user_id,
                AccountUpdate {
                    role: Some(Role::Representative),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Representative);

        assert!(matches!(
            f.service
                .update_user(
                    &admin,
                    Uuid::new_v4(),
                    AccountUpdate {
                        is_active: Some(false),
                        ..Default::default()
                    }
                )
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service
                .update_user(&admin, student.user_id, AccountUpdate::default())
                .await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn revoked_refresh_token_stays_dead_past_expiry() {
        let f = fixture_with(TokenIssuer::new(SECRET, 300, 2));
        f.service
            .register(None, registration("ada", "ada@example.com"))
            .await
            .unwrap();
        let session = f.service.login("ada", PASSWORD).await.unwrap();
        let identity = identity_from(&f.service, &session);
        f.service
            .logout(&identity, Some(session.refresh.as_str()))
            .await
            .unwrap();
        assert!(f.service.refresh(&session.refresh).await.is_err());

        tokio::time::sleep(std::time::Duration::from_millis(3_500)).await;
        assert!(matches!(
            f.service.refresh(&session.refresh).await,
            Err(AppError::InvalidToken(_))
        ));
    }

    /// Passes both uniqueness pre-checks, then loses the insert to a
    /// concurrent registration.
    struct LosingRaceStore;

    #[async_trait::async_trait]
    impl UserStore for LosingRaceStore {
        async fn create(&self, _user: NewUser) -> AppResult<User> {
            Err(AppError::Conflict(
                "A user with that username already exists.".to_string(),
            ))
        }

        async fn find_by_id(&self, _id: Uuid) -> AppResult<Option<User>> {
            Ok(None)
        }

        async fn find_by_username(&self, _username: &str) -> AppResult<Option<User>> {
            Ok(None)
        }

        async fn username_taken(&self, _username: &str) -> AppResult<bool> {
            Ok(false)
        }

        async fn email_taken(&self, _email: &str) -> AppResult<bool> {
            Ok(false)
        }

        async fn record_login(&self, _id: Uuid, _at: chrono::DateTime<Utc>) -> AppResult<()> {
            Ok(())
        }

        async fn update_profile(&self, _id: Uuid, _update: ProfileUpdate) -> AppResult<Option<User>> {
            Ok(None)
        }

        async fn update_account(&self, _id: Uuid, _update: AccountUpdate) -> AppResult<Option<User>> {
            Ok(None)
        }

        async fn list(&self, _filter: &UserFilter) -> AppResult<Vec<User>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn insert_conflict_after_clean_prechecks_is_a_bad_request() {
        use axum::response::IntoResponse;

        let service = AuthService::new(
            Arc::new(LosingRaceStore),
            Arc::new(MemoryProfileExtensions::new()),
            Arc::new(MemoryBlacklist::new()),
            TokenIssuer::new(SECRET, 300, 86_400),
        );
        let err = service
            .register(None, registration("ada", "ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.into_response().status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn demoted_admin_loses_admin_tools_immediately() {
        let f = fixture();
        let admin = admin(&f).await;
        assert!(f.service.list_users(&admin, &UserFilter::default()).await.is_ok());

        f.users
            .update_account(
                admin.user_id,
                AccountUpdate {
                    role: Some(Role::Student),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            f.service.list_users(&admin, &UserFilter::default()).await,
            Err(AppError::Forbidden(_))
        ));
        let mut reg = registration("pia", "pia@example.com");
        reg.role = Some("photographer".to_string());
        assert!(matches!(
            f.service.register(Some(&admin), reg).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn deactivated_admin_is_unauthenticated_for_admin_tools() {
        let f = fixture();
        let admin = admin(&f).await;
        f.users
            .update_account(
                admin.user_id,
                AccountUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            f.service
                .update_user(
                    &admin,
                    admin.user_id,
                    AccountUpdate {
                        is_active: Some(true),
                        ..Default::default()
                    }
                )
                .await,
            Err(AppError::Auth(_))
        ));
    }

    #[test]
    fn username_charset() {
        assert!(validate_username("ada.lovelace+1@x_y-z").is_ok());
        assert!(validate_username("ada lovelace").is_err());
        assert!(validate_username("ada/1").is_err());
        assert!(validate_username("").is_err());
    }
}
