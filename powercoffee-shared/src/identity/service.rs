use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::domain::{AuthResponse, MessageResponse, SignupInput, UpdateUserInput, UserResponse};
use super::error::IdentityError;
use crate::auth::google::IdentityProvider;
use crate::auth::jwt::TokenIssuer;
use crate::auth::password::{PasswordError, PasswordHasher};
use crate::auth::reset_token::{self, generate_reset_token, hash_reset_token};
use crate::models::role::{Role, RoleName};
use crate::models::user::{normalize_email, NewUser, ResetTokenState, UpdateUser, User};
use crate::notify::ResetNotifier;
use crate::pagination::{PageRequest, PaginationResponse};
use crate::store::{CredentialStore, RoleCatalog, StoreError, UniqueField};

/// Default lifetime of a password reset token
pub const DEFAULT_RESET_TOKEN_TTL_MINUTES: i64 = 30;

/// Longest username the schema accepts
const MAX_USERNAME_LEN: usize = 40;

/// Attempts at a unique username for externally authenticated users
const USERNAME_ATTEMPTS: u32 = 100;

/// Collaborators of the identity workflow
#[derive(Clone)]
pub struct IdentityDeps {
    pub users: Arc<dyn CredentialStore>,
    pub roles: Arc<dyn RoleCatalog>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenIssuer>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub notifier: Arc<dyn ResetNotifier>,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub reset_token_ttl: Duration,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            reset_token_ttl: Duration::minutes(DEFAULT_RESET_TOKEN_TTL_MINUTES),
        }
    }
}

/// User identity and role-assignment workflow, independent of the web layer
pub struct IdentityService {
    users: Arc<dyn CredentialStore>,
    roles: Arc<dyn RoleCatalog>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
    identity_provider: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn ResetNotifier>,
    cfg: IdentityConfig,
}

impl IdentityService {
    pub fn new(deps: IdentityDeps, cfg: IdentityConfig) -> Self {
        Self {
            users: deps.users,
            roles: deps.roles,
            hasher: deps.hasher,
            tokens: deps.tokens,
            identity_provider: deps.identity_provider,
            notifier: deps.notifier,
            cfg,
        }
    }

    /// Registers a new user
    ///
    /// Duplicates are reported username first, then email, then phone. Roles
    /// are resolved in full before anything is written; no token is issued.
    /// The email is stored in its normalized form.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn signup(&self, input: SignupInput) -> Result<MessageResponse, IdentityError> {
        let email = normalize_email(&input.email);
        self.ensure_unique(None, Some(&input.username), Some(&email), Some(&input.phone_number))
            .await?;

        let roles = self.resolve_roles(input.roles.as_deref()).await?;
        let password_hash = self.hash(&input.password).await?;

        let user = self
            .users
            .create(NewUser {
                username: input.username,
                email,
                phone_number: input.phone_number,
                first_name: input.first_name,
                last_name: input.last_name,
                password_hash,
                roles,
            })
            .await?;

        info!(user_id = %user.id, roles = ?user.role_names(), "user_registered");
        Ok(MessageResponse::new("User registered successfully!"))
    }

    /// Maps requested role names onto catalog roles
    ///
    /// No names means the default role. Any unknown or unresolvable name
    /// fails the whole request.
    pub async fn resolve_roles(&self, requested: Option<&[String]>) -> Result<Vec<Role>, IdentityError> {
        let names: Vec<RoleName> = match requested {
            None | Some([]) => vec![RoleName::DEFAULT],
            Some(requested) => requested
                .iter()
                .map(|name| {
                    RoleName::from_name(name).ok_or_else(|| IdentityError::RoleNotFound(name.clone()))
                })
                .collect::<Result<_, _>>()?,
        };

        let mut roles = Vec::with_capacity(names.len());
        for name in names {
            let role = self
                .roles
                .find_by_name(name)
                .await?
                .ok_or_else(|| IdentityError::RoleNotFound(name.as_str().to_string()))?;
            if !roles.iter().any(|r: &Role| r.name == role.name) {
                roles.push(role);
            }
        }

        Ok(roles)
    }

    /// Password sign-in
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<AuthResponse, IdentityError> {
        let Some(user) = self.users.find_by_username(username).await? else {
            debug!("unknown username");
            return Err(IdentityError::AuthenticationFailed);
        };

        if !self.verify(password, &user.password_hash).await? {
            debug!(user_id = %user.id, "password mismatch");
            return Err(IdentityError::AuthenticationFailed);
        }

        let token = self.tokens.issue(&user)?;
        info!(user_id = %user.id, "user_signed_in");
        Ok(AuthResponse::new(&user, token))
    }

    /// Sign-in with an external identity assertion
    ///
    /// Users unknown by email are created on the fly with the default role.
    #[instrument(skip(self, assertion))]
    pub async fn authenticate_with_external_identity(
        &self,
        assertion: &str,
    ) -> Result<AuthResponse, IdentityError> {
        let identity = self
            .identity_provider
            .verify(assertion)
            .await
            .map_err(|e| IdentityError::ExternalAuthFailed(e.to_string()))?;

        let email = normalize_email(&identity.email);
        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                let roles = self.resolve_roles(None).await?;
                // The random password is never revealed, so password sign-in is impossible
                let (unusable, _) = generate_reset_token();
                let password_hash = self.hash(&unusable).await?;
                let user = self
                    .create_with_unique_username(
                        &email,
                        NewUser {
                            username: String::new(),
                            email: email.clone(),
                            phone_number: format!("google-{}", Uuid::new_v4()),
                            first_name: identity.given_name.unwrap_or_default(),
                            last_name: identity.family_name.unwrap_or_default(),
                            password_hash,
                            roles,
                        },
                    )
                    .await?;
                info!(user_id = %user.id, "user_registered_external");
                user
            }
        };

        let token = self.tokens.issue(&user)?;
        Ok(AuthResponse::new(&user, token))
    }

    async fn create_with_unique_username(
        &self,
        email: &str,
        mut new_user: NewUser,
    ) -> Result<User, IdentityError> {
        let base = username_base(email);

        for attempt in 0..USERNAME_ATTEMPTS {
            let candidate = username_candidate(&base, attempt);
            if self.users.exists_by_username(&candidate).await? {
                continue;
            }

            new_user.username = candidate;
            match self.users.create(new_user.clone()).await {
                Ok(user) => return Ok(user),
                // Lost a race for this name; try the next one
                Err(StoreError::UniqueViolation(UniqueField::Username)) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(IdentityError::DuplicateUsername)
    }

    /// Issues a reset token for `email` and hands it to the notifier
    ///
    /// Unknown addresses succeed silently. A new token replaces any
    /// outstanding one.
    #[instrument(skip(self, email))]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let Some(user) = self.users.find_by_email(&normalize_email(email)).await? else {
            debug!("password reset requested for unknown email");
            return Ok(());
        };

        let (token, digest) = generate_reset_token();
        let expires_at = Utc::now() + self.cfg.reset_token_ttl;

        let changes = UpdateUser {
            reset_token: Some(Some(ResetTokenState { digest, expires_at })),
            ..Default::default()
        };
        if self.users.update(user.id, changes).await?.is_none() {
            debug!(user_id = %user.id, "user vanished before reset token was stored");
            return Ok(());
        }

        if let Err(e) = self.notifier.send_reset_token(&user, &token, expires_at).await {
            warn!(user_id = %user.id, error = %e, "reset token notification failed");
        }

        Ok(())
    }

    /// Checks a reset token without consuming it
    #[instrument(skip(self, token))]
    pub async fn check_reset_token(&self, token: &str) -> Result<(), IdentityError> {
        self.user_for_reset_token(token).await.map(|_| ())
    }

    /// Consumes a reset token and sets a new password
    ///
    /// The token is checked up front so bad tokens fail before any hashing,
    /// then consumed in a single conditional store write. A token that was
    /// used or replaced in between fails with `InvalidOrExpiredToken`.
    #[instrument(skip(self, token, new_password))]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), IdentityError> {
        self.user_for_reset_token(token).await?;
        let password_hash = self.hash(new_password).await?;

        let user_id = self
            .users
            .consume_reset_token(&hash_reset_token(token), &password_hash)
            .await?
            .ok_or(IdentityError::InvalidOrExpiredToken)?;

        info!(%user_id, "password_reset");
        Ok(())
    }

    async fn user_for_reset_token(&self, token: &str) -> Result<User, IdentityError> {
        if !reset_token::is_well_formed(token) {
            return Err(IdentityError::InvalidOrExpiredToken);
        }

        let user = self
            .users
            .find_by_reset_token(&hash_reset_token(token))
            .await?
            .ok_or(IdentityError::InvalidOrExpiredToken)?;

        match user.reset_token_expires_at {
            Some(expires_at) if expires_at > Utc::now() => Ok(user),
            _ => Err(IdentityError::InvalidOrExpiredToken),
        }
    }

    /// Changes a password after verifying the current one
    #[instrument(skip(self, old_password, new_password))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        if !self.verify(old_password, &user.password_hash).await? {
            return Err(IdentityError::InvalidCredential);
        }

        let password_hash = self.hash(new_password).await?;
        let changes = UpdateUser {
            password_hash: Some(password_hash),
            ..Default::default()
        };
        self.users
            .update(user_id, changes)
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        info!(%user_id, "password_changed");
        Ok(())
    }

    #[instrument(skip(self, input))]
    pub async fn update_user(&self, id: Uuid, input: UpdateUserInput) -> Result<UserResponse, IdentityError> {
        let current = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        let email = input.email.as_deref().map(normalize_email);
        self.ensure_unique(
            Some(&current),
            input.username.as_deref(),
            email.as_deref(),
            input.phone_number.as_deref(),
        )
        .await?;

        let changes = UpdateUser {
            username: input.username,
            email,
            phone_number: input.phone_number,
            first_name: input.first_name,
            last_name: input.last_name,
            ..Default::default()
        };
        let user = self
            .users
            .update(id, changes)
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        Ok(UserResponse::from(&user))
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> Result<(), IdentityError> {
        if !self.users.delete(id).await? {
            return Err(IdentityError::UserNotFound);
        }
        info!(user_id = %id, "user_deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_id(&self, id: Uuid) -> Result<UserResponse, IdentityError> {
        self.users
            .find_by_id(id)
            .await?
            .map(UserResponse::from)
            .ok_or(IdentityError::UserNotFound)
    }

    /// Looks a user up by email and issues them a fresh token
    ///
    /// The address is matched case-insensitively.
    #[instrument(skip(self, email))]
    pub async fn get_user_by_email(&self, email: &str) -> Result<AuthResponse, IdentityError> {
        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        let token = self.tokens.issue(&user)?;
        Ok(AuthResponse::new(&user, token))
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self, page: PageRequest) -> Result<PaginationResponse<UserResponse>, IdentityError> {
        let (users, total) = self.users.list(&page).await?;
        let content = users.iter().map(UserResponse::from).collect();
        Ok(PaginationResponse::new(content, &page, total))
    }

    /// Store liveness, for health checks
    pub async fn ping(&self) -> Result<(), IdentityError> {
        self.users.ping().await.map_err(IdentityError::Store)
    }

    /// Rejects values already held by a user other than `current`
    async fn ensure_unique(
        &self,
        current: Option<&User>,
        username: Option<&str>,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<(), IdentityError> {
        if let Some(username) = username {
            let own = current.is_some_and(|u| u.username == username);
            if !own && self.users.exists_by_username(username).await? {
                return Err(IdentityError::DuplicateUsername);
            }
        }
        if let Some(email) = email {
            let own = current.is_some_and(|u| u.email == email);
            if !own && self.users.exists_by_email(email).await? {
                return Err(IdentityError::DuplicateEmail);
            }
        }
        if let Some(phone_number) = phone_number {
            let own = current.is_some_and(|u| u.phone_number == phone_number);
            if !own && self.users.exists_by_phone_number(phone_number).await? {
                return Err(IdentityError::DuplicatePhone);
            }
        }

        Ok(())
    }

    async fn hash(&self, password: &str) -> Result<String, IdentityError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();

        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| PasswordError::HashError(format!("hashing task failed: {}", e)))??;
        Ok(hash)
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, IdentityError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();
        let hash = hash.to_owned();

        let ok = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| PasswordError::VerifyError(format!("verification task failed: {}", e)))??;
        Ok(ok)
    }
}

/// Username stem from an email's local part
fn username_base(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let base: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .take(MAX_USERNAME_LEN - 3)
        .collect();

    if base.is_empty() {
        "user".to_string()
    } else {
        base
    }
}

fn username_candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{}{}", base, attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::auth::google::{DisabledIdentityProvider, ExternalIdentity, ExternalIdentityError};
    use crate::auth::jwt::JwtIssuer;
    use crate::auth::password::Argon2Hasher;
    use crate::notify::{MemoryNotifier, NotifyError};
    use crate::store::memory::MemoryStore;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    struct Harness {
        service: IdentityService,
        store: Arc<MemoryStore>,
        notifier: Arc<MemoryNotifier>,
        tokens: Arc<JwtIssuer>,
    }

    fn harness_with(store: MemoryStore, ttl: Duration, provider: Arc<dyn IdentityProvider>) -> Harness {
        let store = Arc::new(store);
        let notifier = Arc::new(MemoryNotifier::new());
        let tokens = Arc::new(JwtIssuer::new(SECRET, Duration::hours(1)));

        let service = IdentityService::new(
            IdentityDeps {
                users: store.clone(),
                roles: store.clone(),
                hasher: Arc::new(Argon2Hasher::with_params(8, 1, 1)),
                tokens: tokens.clone(),
                identity_provider: provider,
                notifier: notifier.clone(),
            },
            IdentityConfig { reset_token_ttl: ttl },
        );

        Harness {
            service,
            store,
            notifier,
            tokens,
        }
    }

    fn harness() -> Harness {
        harness_with(
            MemoryStore::new(),
            Duration::minutes(30),
            Arc::new(DisabledIdentityProvider),
        )
    }

    fn signup_input(username: &str, email: &str, phone: &str) -> SignupInput {
        SignupInput {
            username: username.to_string(),
            email: email.to_string(),
            phone_number: phone.to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            password: "pw1".to_string(),
            roles: None,
        }
    }

    async fn signup_alice(h: &Harness) -> User {
        h.service
            .signup(signup_input("alice", "a@x.io", "555-0001"))
            .await
            .unwrap();
        h.store.find_by_username("alice").await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn signup_then_signin_with_requested_role() {
        let h = harness();
        let mut input = signup_input("alice", "a@x.io", "555-0001");
        input.roles = Some(vec!["employee".to_string()]);

        let message = h.service.signup(input).await.unwrap();
        assert_eq!(message.message, "User registered successfully!");

        let auth = h.service.authenticate("alice", "pw1").await.unwrap();
        assert_eq!(auth.username, "alice");
        assert_eq!(auth.email, "a@x.io");
        assert_eq!(auth.roles, vec!["employee"]);
        assert!(!auth.token.is_empty());

        let claims = h.tokens.verify(&auth.token).unwrap();
        assert_eq!(claims.sub, auth.id);
        assert_eq!(claims.roles, vec!["employee"]);
    }

    #[tokio::test]
    async fn signup_stores_hash_not_password() {
        let h = harness();
        let user = signup_alice(&h).await;
        assert_ne!(user.password_hash, "pw1");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn omitted_or_empty_roles_default_to_admin() {
        let h = harness();
        let user = signup_alice(&h).await;
        assert_eq!(user.roles, vec![RoleName::Admin]);

        let mut input = signup_input("bob", "b@x.io", "555-0002");
        input.roles = Some(vec![]);
        h.service.signup(input).await.unwrap();
        let bob = h.store.find_by_username("bob").await.unwrap().unwrap();
        assert_eq!(bob.roles, vec![RoleName::Admin]);
    }

    #[tokio::test]
    async fn role_names_match_case_insensitively() {
        let h = harness();
        let mut input = signup_input("alice", "a@x.io", "555-0001");
        input.roles = Some(vec!["Employee".to_string(), "SUPER_ADMIN".to_string()]);
        h.service.signup(input).await.unwrap();

        let user = h.store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(user.roles, vec![RoleName::Employee, RoleName::SuperAdmin]);
    }

    #[tokio::test]
    async fn duplicate_username_rejected_without_writing() {
        let h = harness();
        signup_alice(&h).await;

        let err = h
            .service
            .signup(signup_input("alice", "other@x.io", "555-9999"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::DuplicateUsername));
        assert_eq!(h.store.user_count(), 1);
    }

    #[tokio::test]
    async fn duplicates_reported_in_order() {
        let h = harness();
        signup_alice(&h).await;

        // Username wins over email and phone
        let err = h
            .service
            .signup(signup_input("alice", "a@x.io", "555-0001"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::DuplicateUsername));

        let err = h
            .service
            .signup(signup_input("bob", "a@x.io", "555-0001"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::DuplicateEmail));

        let err = h
            .service
            .signup(signup_input("bob", "b@x.io", "555-0001"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::DuplicatePhone));
    }

    #[tokio::test]
    async fn emails_are_case_insensitive() {
        let h = harness();
        h.service
            .signup(signup_input("alice", "  Alice@X.io", "555-0001"))
            .await
            .unwrap();

        let alice = h.store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.email, "alice@x.io");

        let err = h
            .service
            .signup(signup_input("mallory", "ALICE@x.io", "555-0666"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::DuplicateEmail));
        assert_eq!(h.store.user_count(), 1);

        let found = h.service.get_user_by_email("alice@X.IO").await.unwrap();
        assert_eq!(found.id, alice.id);

        h.service.request_password_reset("ALICE@x.io").await.unwrap();
        assert!(h.notifier.last_token_for("alice@x.io").is_some());

        let changed = UpdateUserInput {
            email: Some("Ally@X.io".to_string()),
            ..Default::default()
        };
        let updated = h.service.update_user(alice.id, changed).await.unwrap();
        assert_eq!(updated.email, "ally@x.io");
    }

    #[tokio::test]
    async fn unknown_role_creates_nothing() {
        let h = harness();
        let mut input = signup_input("alice", "a@x.io", "555-0001");
        input.roles = Some(vec!["employee".to_string(), "wizard".to_string()]);

        let err = h.service.signup(input).await.unwrap_err();
        assert!(matches!(err, IdentityError::RoleNotFound(name) if name == "wizard"));
        assert_eq!(h.store.user_count(), 0);
    }

    #[tokio::test]
    async fn role_missing_from_catalog_creates_nothing() {
        let h = harness_with(
            MemoryStore::with_roles(&[RoleName::Customer]),
            Duration::minutes(30),
            Arc::new(DisabledIdentityProvider),
        );

        let err = h
            .service
            .signup(signup_input("alice", "a@x.io", "555-0001"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::RoleNotFound(name) if name == "admin"));
        assert_eq!(h.store.user_count(), 0);
    }

    /// Passes every existence check, so only the store's own uniqueness
    /// guard can catch a duplicate
    struct RacingStore(MemoryStore);

    #[async_trait]
    impl CredentialStore for RacingStore {
        async fn ping(&self) -> Result<(), StoreError> {
            self.0.ping().await
        }
        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            self.0.find_by_id(id).await
        }
        async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
            self.0.find_by_username(username).await
        }
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            self.0.find_by_email(email).await
        }
        async fn find_by_reset_token(&self, digest: &str) -> Result<Option<User>, StoreError> {
            self.0.find_by_reset_token(digest).await
        }
        async fn exists_by_username(&self, _: &str) -> Result<bool, StoreError> {
            Ok(false)
        }
        async fn exists_by_email(&self, _: &str) -> Result<bool, StoreError> {
            Ok(false)
        }
        async fn exists_by_phone_number(&self, _: &str) -> Result<bool, StoreError> {
            Ok(false)
        }
        async fn create(&self, user: NewUser) -> Result<User, StoreError> {
            self.0.create(user).await
        }
        async fn consume_reset_token(
            &self,
            digest: &str,
            password_hash: &str,
        ) -> Result<Option<Uuid>, StoreError> {
            self.0.consume_reset_token(digest, password_hash).await
        }
        async fn update(&self, id: Uuid, changes: UpdateUser) -> Result<Option<User>, StoreError> {
            self.0.update(id, changes).await
        }
        async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
            CredentialStore::delete(&self.0, id).await
        }
        async fn list(&self, page: &PageRequest) -> Result<(Vec<User>, i64), StoreError> {
            CredentialStore::list(&self.0, page).await
        }
    }

    #[tokio::test]
    async fn write_time_unique_violation_maps_to_duplicate() {
        let racing = Arc::new(RacingStore(MemoryStore::new()));
        let roles = Arc::new(MemoryStore::new());
        let service = IdentityService::new(
            IdentityDeps {
                users: racing.clone(),
                roles,
                hasher: Arc::new(Argon2Hasher::with_params(8, 1, 1)),
                tokens: Arc::new(JwtIssuer::new(SECRET, Duration::hours(1))),
                identity_provider: Arc::new(DisabledIdentityProvider),
                notifier: Arc::new(MemoryNotifier::new()),
            },
            IdentityConfig::default(),
        );

        service
            .signup(signup_input("alice", "a@x.io", "555-0001"))
            .await
            .unwrap();
        let err = service
            .signup(signup_input("alice2", "a@x.io", "555-0002"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::DuplicateEmail));
        assert_eq!(racing.0.user_count(), 1);
    }

    #[tokio::test]
    async fn signin_failures_are_indistinguishable() {
        let h = harness();
        signup_alice(&h).await;

        let wrong_password = h.service.authenticate("alice", "nope").await.unwrap_err();
        let unknown_user = h.service.authenticate("nobody", "pw1").await.unwrap_err();

        assert!(matches!(wrong_password, IdentityError::AuthenticationFailed));
        assert!(matches!(unknown_user, IdentityError::AuthenticationFailed));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn reset_round_trip_then_replay_fails() {
        let h = harness();
        signup_alice(&h).await;

        h.service.request_password_reset("a@x.io").await.unwrap();
        let token = h.notifier.last_token_for("a@x.io").expect("token sent");

        // The plaintext never reaches the store
        let stored = h.store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.reset_token_hash, Some(hash_reset_token(&token)));

        h.service.check_reset_token(&token).await.unwrap();
        h.service.reset_password(&token, "pw2").await.unwrap();

        let user = h.store.find_by_username("alice").await.unwrap().unwrap();
        assert!(user.reset_token_hash.is_none());
        assert!(user.reset_token_expires_at.is_none());

        assert!(h.service.authenticate("alice", "pw2").await.is_ok());
        assert!(h.service.authenticate("alice", "pw1").await.is_err());

        let replay = h.service.reset_password(&token, "pw3").await.unwrap_err();
        assert!(matches!(replay, IdentityError::InvalidOrExpiredToken));
        let check = h.service.check_reset_token(&token).await.unwrap_err();
        assert!(matches!(check, IdentityError::InvalidOrExpiredToken));
    }

    #[tokio::test]
    async fn concurrent_resets_consume_token_once() {
        let h = harness();
        signup_alice(&h).await;

        h.service.request_password_reset("a@x.io").await.unwrap();
        let token = h.notifier.last_token_for("a@x.io").unwrap();

        // Both calls pass the up-front check before either one writes
        let (first, second) = tokio::join!(
            h.service.reset_password(&token, "pw2"),
            h.service.reset_password(&token, "pw3"),
        );

        let results = [first, second];
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(IdentityError::InvalidOrExpiredToken))));

        let user = h.store.find_by_username("alice").await.unwrap().unwrap();
        assert!(user.reset_token_hash.is_none());
        let pw2 = h.service.authenticate("alice", "pw2").await.is_ok();
        let pw3 = h.service.authenticate("alice", "pw3").await.is_ok();
        assert!(pw2 ^ pw3);
    }

    #[tokio::test]
    async fn token_replaced_mid_reset_is_rejected() {
        let h = harness();
        let alice = signup_alice(&h).await;

        h.service.request_password_reset("a@x.io").await.unwrap();
        let token = h.notifier.last_token_for("a@x.io").unwrap();
        h.service.request_password_reset("a@x.io").await.unwrap();

        let consumed = h
            .store
            .consume_reset_token(&hash_reset_token(&token), "new-hash")
            .await
            .unwrap();
        assert!(consumed.is_none());

        let after = h.store.find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(after.password_hash, alice.password_hash);
        assert!(after.reset_token_hash.is_some());
    }

    #[tokio::test]
    async fn check_invalid_token_is_idempotent() {
        let h = harness();
        let alice = signup_alice(&h).await;

        for _ in 0..2 {
            let err = h
                .service
                .check_reset_token("ABCDEFGHIJKLMNOPQRSTUVWXYZabcdef")
                .await
                .unwrap_err();
            assert!(matches!(err, IdentityError::InvalidOrExpiredToken));
        }

        let after = h.store.find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(after.updated_at, alice.updated_at);
        assert!(after.reset_token_hash.is_none());
    }

    #[tokio::test]
    async fn malformed_token_rejected() {
        let h = harness();
        let err = h.service.check_reset_token("../../etc").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidOrExpiredToken));
    }

    #[tokio::test]
    async fn expired_token_rejected() {
        let h = harness_with(
            MemoryStore::new(),
            Duration::zero(),
            Arc::new(DisabledIdentityProvider),
        );
        signup_alice(&h).await;

        h.service.request_password_reset("a@x.io").await.unwrap();
        let token = h.notifier.last_token_for("a@x.io").unwrap();

        let err = h.service.check_reset_token(&token).await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidOrExpiredToken));
        let err = h.service.reset_password(&token, "pw2").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidOrExpiredToken));
        assert!(h.service.authenticate("alice", "pw1").await.is_ok());
    }

    #[tokio::test]
    async fn new_reset_request_invalidates_previous_token() {
        let h = harness();
        signup_alice(&h).await;

        h.service.request_password_reset("a@x.io").await.unwrap();
        let first = h.notifier.last_token_for("a@x.io").unwrap();
        h.service.request_password_reset("a@x.io").await.unwrap();
        let second = h.notifier.last_token_for("a@x.io").unwrap();
        assert_ne!(first, second);

        assert!(matches!(
            h.service.check_reset_token(&first).await,
            Err(IdentityError::InvalidOrExpiredToken)
        ));
        assert!(h.service.check_reset_token(&second).await.is_ok());
    }

    #[tokio::test]
    async fn forgot_password_for_unknown_email_is_silent() {
        let h = harness();
        let alice = signup_alice(&h).await;

        h.service.request_password_reset("ghost@x.io").await.unwrap();

        assert!(h.notifier.sent().is_empty());
        let after = h.store.find_by_id(alice.id).await.unwrap().unwrap();
        assert!(after.reset_token_hash.is_none());
    }

    struct FailingNotifier;

    #[async_trait]
    impl ResetNotifier for FailingNotifier {
        async fn send_reset_token(
            &self,
            _user: &User,
            _token: &str,
            _expires_at: chrono::DateTime<Utc>,
        ) -> Result<(), NotifyError> {
            Err(NotifyError("smtp down".to_string()))
        }
    }

    #[tokio::test]
    async fn notifier_failure_is_not_surfaced() {
        let store = Arc::new(MemoryStore::new());
        let service = IdentityService::new(
            IdentityDeps {
                users: store.clone(),
                roles: store.clone(),
                hasher: Arc::new(Argon2Hasher::with_params(8, 1, 1)),
                tokens: Arc::new(JwtIssuer::new(SECRET, Duration::hours(1))),
                identity_provider: Arc::new(DisabledIdentityProvider),
                notifier: Arc::new(FailingNotifier),
            },
            IdentityConfig::default(),
        );
        service
            .signup(signup_input("alice", "a@x.io", "555-0001"))
            .await
            .unwrap();

        service.request_password_reset("a@x.io").await.unwrap();
        let user = store.find_by_email("a@x.io").await.unwrap().unwrap();
        assert!(user.reset_token_hash.is_some());
    }

    #[tokio::test]
    async fn change_password_with_wrong_old_password() {
        let h = harness();
        let alice = signup_alice(&h).await;

        let err = h
            .service
            .change_password(alice.id, "wrong", "pw2")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredential));

        let after = h.store.find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(after.password_hash, alice.password_hash);
    }

    #[tokio::test]
    async fn change_password_success_and_unknown_user() {
        let h = harness();
        let alice = signup_alice(&h).await;

        h.service.change_password(alice.id, "pw1", "pw2").await.unwrap();
        assert!(h.service.authenticate("alice", "pw2").await.is_ok());

        let err = h
            .service
            .change_password(Uuid::new_v4(), "pw1", "pw2")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::UserNotFound));
    }

    #[tokio::test]
    async fn update_user_checks_other_users() {
        let h = harness();
        let alice = signup_alice(&h).await;
        h.service
            .signup(signup_input("bob", "b@x.io", "555-0002"))
            .await
            .unwrap();

        // Keeping your own values is fine
        let same = UpdateUserInput {
            username: Some("alice".to_string()),
            email: Some("a@x.io".to_string()),
            first_name: Some("Ally".to_string()),
            ..Default::default()
        };
        let updated = h.service.update_user(alice.id, same).await.unwrap();
        assert_eq!(updated.first_name, "Ally");

        let clash = UpdateUserInput {
            phone_number: Some("555-0002".to_string()),
            ..Default::default()
        };
        let err = h.service.update_user(alice.id, clash).await.unwrap_err();
        assert!(matches!(err, IdentityError::DuplicatePhone));

        let err = h
            .service
            .update_user(Uuid::new_v4(), UpdateUserInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::UserNotFound));
    }

    #[tokio::test]
    async fn delete_and_lookup() {
        let h = harness();
        let alice = signup_alice(&h).await;

        let found = h.service.get_user_by_id(alice.id).await.unwrap();
        assert_eq!(found.username, "alice");

        let by_email = h.service.get_user_by_email("a@x.io").await.unwrap();
        assert_eq!(by_email.id, alice.id);
        assert!(!by_email.token.is_empty());

        h.service.delete_user(alice.id).await.unwrap();
        assert!(matches!(
            h.service.delete_user(alice.id).await,
            Err(IdentityError::UserNotFound)
        ));
        assert!(matches!(
            h.service.get_user_by_id(alice.id).await,
            Err(IdentityError::UserNotFound)
        ));
        assert!(matches!(
            h.service.get_user_by_email("a@x.io").await,
            Err(IdentityError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn list_users_pages() {
        let h = harness();
        for (i, name) in ["carol", "alice", "bob"].iter().enumerate() {
            h.service
                .signup(signup_input(name, &format!("{name}@x.io"), &format!("555-000{i}")))
                .await
                .unwrap();
        }

        let page = PageRequest::new(Some(0), Some(2), Some("username".to_string()), None);
        let result = h.service.list_users(page).await.unwrap();

        assert_eq!(result.total_elements, 3);
        assert_eq!(result.total_pages, 2);
        assert!(!result.last);
        let names: Vec<_> = result.content.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    struct StaticProvider(ExternalIdentity);

    #[async_trait]
    impl IdentityProvider for StaticProvider {
        async fn verify(&self, assertion: &str) -> Result<ExternalIdentity, ExternalIdentityError> {
            if assertion == "good" {
                Ok(self.0.clone())
            } else {
                Err(ExternalIdentityError::Rejected("bad assertion".to_string()))
            }
        }
    }

    fn google_harness(email: &str) -> Harness {
        harness_with(
            MemoryStore::new(),
            Duration::minutes(30),
            Arc::new(StaticProvider(ExternalIdentity {
                email: email.to_string(),
                given_name: Some("Alice".to_string()),
                family_name: None,
            })),
        )
    }

    #[tokio::test]
    async fn external_signin_creates_then_reuses_user() {
        let h = google_harness("alice@gmail.com");

        let first = h
            .service
            .authenticate_with_external_identity("good")
            .await
            .unwrap();
        assert_eq!(first.username, "alice");
        assert_eq!(first.roles, vec!["admin"]);
        assert!(!first.token.is_empty());

        let second = h
            .service
            .authenticate_with_external_identity("good")
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(h.store.user_count(), 1);

        let user = h.store.find_by_id(first.id).await.unwrap().unwrap();
        assert!(user.phone_number.starts_with("google-"));
        assert_eq!(user.first_name, "Alice");
    }

    #[tokio::test]
    async fn external_signin_matches_email_case_insensitively() {
        let h = google_harness("Alice@Gmail.com");
        h.service
            .signup(signup_input("alice", "alice@gmail.com", "555-0001"))
            .await
            .unwrap();

        let auth = h
            .service
            .authenticate_with_external_identity("good")
            .await
            .unwrap();
        assert_eq!(auth.username, "alice");
        assert_eq!(h.store.user_count(), 1);
    }

    #[tokio::test]
    async fn external_signin_picks_free_username() {
        let h = google_harness("alice@gmail.com");
        signup_alice(&h).await;

        let auth = h
            .service
            .authenticate_with_external_identity("good")
            .await
            .unwrap();
        assert_eq!(auth.username, "alice1");
    }

    #[tokio::test]
    async fn external_signin_rejection() {
        let h = google_harness("alice@gmail.com");
        let err = h
            .service
            .authenticate_with_external_identity("forged")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::ExternalAuthFailed(_)));

        let disabled = harness();
        let err = disabled
            .service
            .authenticate_with_external_identity("good")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::ExternalAuthFailed(_)));
    }

    #[test]
    fn username_base_from_email() {
        assert_eq!(username_base("alice.smith@gmail.com"), "alice.smith");
        assert_eq!(username_base("a+tag@x.io"), "atag");
        assert_eq!(username_base("@x.io"), "user");
        assert!(username_base(&format!("{}@x.io", "a".repeat(80))).len() <= MAX_USERNAME_LEN - 3);
        assert_eq!(username_candidate("alice", 0), "alice");
        assert_eq!(username_candidate("alice", 7), "alice7");
    }
}
