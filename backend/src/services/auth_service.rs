//! Core business logic for the identity and session lifecycle.
//!
//! Every inbound auth request maps to exactly one operation on
//! [`AuthService`]. Operations read and write the user store, hash or verify
//! secrets, and enqueue mail/upload jobs; they never wait on job delivery.
//!
//! Secret handling rule: only digests are persisted. The plaintext of a
//! verify/reset token exists in the outbound email link and nowhere else.

use crate::auth::provider::ProviderClaim;
use crate::database::models::{CreateUser, Provider, SecretSlot, User, UserFilter, UserPatch};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::UserStore;
use crate::services::mail_service::MailService;
use crate::services::upload_service::{UploadFile, UploadService};
use crate::utils::jwt::{JwtIssuer, TokenPair};
use crate::utils::secrets::SecretHasher;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

const VERIFY_TOKEN_TTL_MINUTES: i64 = 15;
const RESET_TOKEN_TTL_MINUTES: i64 = 15;
const REFRESH_TOKEN_TTL_DAYS: i64 = 7;
const TOKEN_BYTE_LEN: usize = 32;

/// Input for the register operation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub name: String,
    pub password: String,
    pub profile_picture: Option<UploadFile>,
}

/// Input for the update-profile operation.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub username: Option<String>,
    pub profile_picture: Option<UploadFile>,
}

/// Authentication service orchestrating registration, verification, login,
/// token rotation, and password management.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: SecretHasher,
    jwt: JwtIssuer,
    mail: MailService,
    upload: UploadService,
    base_url: String,
}

fn is_expired(date: DateTime<Utc>) -> bool {
    Utc::now() > date
}

impl AuthService {
    /// Creates a new AuthService instance
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: SecretHasher,
        jwt: JwtIssuer,
        mail: MailService,
        upload: UploadService,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            hasher,
            jwt,
            mail,
            upload,
            base_url: base_url.into(),
        }
    }

    fn verification_link(&self, uid: &str, token: &str) -> String {
        format!("{}/verify-email?token={}&uid={}", self.base_url, token, uid)
    }

    fn reset_link(&self, uid: &str, token: &str) -> String {
        format!("{}/reset-password?token={}&uid={}", self.base_url, token, uid)
    }

    /// Registers a new email/password user.
    ///
    /// Creates the record unverified with a fresh verify-token slot and
    /// enqueues the verification email carrying the plaintext token.
    pub async fn register(&self, data: Registration) -> ServiceResult<()> {
        if self
            .store
            .find_one(UserFilter::by_email(&data.email))
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists("User", &data.email));
        }

        let profile_picture_url = match &data.profile_picture {
            Some(file) => Some(self.upload.upload_and_get_url(file).await?),
            None => None,
        };

        let verify_token = self.hasher.generate_token(TOKEN_BYTE_LEN);
        let verify_token_exp = Utc::now() + Duration::minutes(VERIFY_TOKEN_TTL_MINUTES);
        let token_hash = self.hasher.hash(&verify_token)?;
        let password_hash = self.hasher.hash(&data.password)?;

        let user = self
            .store
            .create(CreateUser {
                id: Uuid::now_v7().to_string(),
                email: data.email,
                username: data.username,
                name: data.name,
                password_hash: Some(password_hash),
                provider: Provider::Email,
                profile_picture_url,
                email_verified: false,
                verify_token: Some(SecretSlot::new(token_hash, verify_token_exp)),
            })
            .await?;

        self.mail
            .send_account_verify_email(
                &user.email,
                &user.username,
                &self.verification_link(&user.id, &verify_token),
            )
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(())
    }

    /// Consumes a verification token and marks the email verified.
    ///
    /// Single-use: the slot is cleared on success, so a replay fails NotFound.
    pub async fn validate_account_verify_email(&self, uid: &str, token: &str) -> ServiceResult<()> {
        let user = self
            .store
            .find_one(UserFilter::by_id(uid))
            .await?
            .ok_or_else(|| ServiceError::not_found("User", uid))?;

        let (Some(stored), Some(exp)) = (user.verify_token.as_deref(), user.verify_token_exp)
        else {
            return Err(ServiceError::not_found("User", uid));
        };

        if !self.hasher.verify(token, stored) {
            return Err(ServiceError::validation("Tokens are not matched"));
        }
        if is_expired(exp) {
            return Err(ServiceError::validation("Verification token is expired"));
        }

        self.store
            .update(
                &user.id,
                UserPatch {
                    email_verified: Some(true),
                    verify_token: Some(None),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, "account email verified");
        Ok(())
    }

    /// Reissues the verification token once the previous one has expired.
    ///
    /// One live token at a time: a still-valid token rejects the request.
    pub async fn resend_account_verification(&self, email: &str) -> ServiceResult<()> {
        let user = self
            .store
            .find_one(UserFilter::by_email(email))
            .await?
            .filter(|u| !u.email_verified)
            .ok_or_else(|| ServiceError::not_found("User", email))?;

        let (Some(_), Some(exp)) = (user.verify_token.as_deref(), user.verify_token_exp) else {
            return Err(ServiceError::not_found("User", email));
        };

        if !is_expired(exp) {
            return Err(ServiceError::invalid_operation(
                "Verification token is still valid. No need to request a new one",
            ));
        }

        let verify_token = self.hasher.generate_token(TOKEN_BYTE_LEN);
        let verify_token_exp = Utc::now() + Duration::minutes(VERIFY_TOKEN_TTL_MINUTES);
        let token_hash = self.hasher.hash(&verify_token)?;

        self.store
            .update(
                &user.id,
                UserPatch {
                    verify_token: Some(Some(SecretSlot::new(token_hash, verify_token_exp))),
                    ..Default::default()
                },
            )
            .await?;

        self.mail
            .send_account_verify_email(
                &user.email,
                &user.username,
                &self.verification_link(&user.id, &verify_token),
            )
            .await?;

        Ok(())
    }

    /// Password login for a verified user.
    ///
    /// Federated accounts carry no password hash; their password check is
    /// skipped and they authenticate through their provider instead.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<TokenPair> {
        let user = self
            .store
            .find_one(UserFilter::by_email(email))
            .await?
            .filter(|u| u.email_verified)
            .ok_or_else(|| ServiceError::not_found("User", email))?;

        // Re-pin the provider only for email accounts; a federated account
        // logging in here must keep its original provider.
        let mut pinned_provider = None;
        if user.provider == Provider::Email {
            let Some(password_hash) = user.password_hash.as_deref() else {
                return Err(ServiceError::validation(
                    "Password not set for this user. Use social login",
                ));
            };
            if !self.hasher.verify(password, password_hash) {
                return Err(ServiceError::validation("Credentials are not matched"));
            }
            pinned_provider = Some(Provider::Email);
        }

        let pair = self
            .issue_and_store(&user.id, &user.email, pinned_provider)
            .await?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(pair)
    }

    /// Login with a verified external identity claim; creates the user on
    /// first contact. The provider is pinned at creation and never rewritten
    /// by subsequent token saves.
    pub async fn federated_login(
        &self,
        provider: Provider,
        claim: ProviderClaim,
    ) -> ServiceResult<TokenPair> {
        let user = match self
            .store
            .find_one(UserFilter::by_email(&claim.email))
            .await?
        {
            Some(user) => user,
            None => {
                let user = self
                    .store
                    .create(CreateUser {
                        id: Uuid::now_v7().to_string(),
                        email: claim.email,
                        username: claim.username,
                        name: claim.name,
                        password_hash: None,
                        provider,
                        profile_picture_url: claim.profile_picture_url,
                        // The provider already verified this address.
                        email_verified: true,
                        verify_token: None,
                    })
                    .await?;
                tracing::info!(user_id = %user.id, provider = %provider, "federated user created");
                user
            }
        };

        self.issue_and_store(&user.id, &user.email, None).await
    }

    /// Rotates the refresh token: a successful refresh invalidates the token
    /// that was presented.
    pub async fn refresh_token(&self, uid: &str, token: &str) -> ServiceResult<TokenPair> {
        let user = self
            .store
            .find_one(UserFilter::by_id(uid))
            .await?
            .ok_or_else(|| ServiceError::not_found("User or refresh token", uid))?;

        let (Some(stored), Some(exp)) = (user.refresh_token.as_deref(), user.refresh_token_exp)
        else {
            return Err(ServiceError::not_found("User or refresh token", uid));
        };

        if !self.hasher.verify(token, stored) || is_expired(exp) {
            return Err(ServiceError::validation(
                "Tokens are not matched or expired",
            ));
        }

        self.jwt
            .verify_refresh(token)
            .map_err(|_| ServiceError::validation("Refresh token signature is not valid"))?;

        self.issue_and_store(&user.id, &user.email, None).await
    }

    /// Issues a reset token when none is outstanding and emails the link.
    pub async fn forget_password(&self, email: &str) -> ServiceResult<()> {
        let user = self
            .store
            .find_one(UserFilter::by_email(email))
            .await?
            .ok_or_else(|| ServiceError::not_found("User", email))?;

        if let (Some(_), Some(exp)) = (user.reset_token.as_deref(), user.reset_token_exp) {
            if !is_expired(exp) {
                return Err(ServiceError::invalid_operation(
                    "A reset email was already sent. Please wait before requesting again",
                ));
            }
        }

        let reset_token = self.hasher.generate_token(TOKEN_BYTE_LEN);
        let reset_token_exp = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        let token_hash = self.hasher.hash(&reset_token)?;

        self.store
            .update(
                &user.id,
                UserPatch {
                    reset_token: Some(Some(SecretSlot::new(token_hash, reset_token_exp))),
                    ..Default::default()
                },
            )
            .await?;

        self.mail
            .send_password_reset_email(
                &user.email,
                &user.name,
                &self.reset_link(&user.id, &reset_token),
            )
            .await?;

        Ok(())
    }

    /// Consumes a valid, unexpired reset token and stores the new password.
    pub async fn reset_password(
        &self,
        uid: &str,
        token: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let user = self
            .store
            .find_one(UserFilter::by_id(uid))
            .await?
            .ok_or_else(|| ServiceError::unauthorized("User not found"))?;

        let (Some(stored), Some(exp)) = (user.reset_token.as_deref(), user.reset_token_exp) else {
            return Err(ServiceError::unauthorized("User not found"));
        };

        if !self.hasher.verify(token, stored) {
            return Err(ServiceError::unauthorized("Reset token is not valid"));
        }
        if is_expired(exp) {
            return Err(ServiceError::forbidden("Reset token is expired"));
        }

        let password_hash = self.hasher.hash(new_password)?;
        self.store
            .update(
                &user.id,
                UserPatch {
                    password_hash: Some(password_hash),
                    reset_token: Some(None),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, "password reset");
        Ok(())
    }

    /// Changes the password of an authenticated email-provider user.
    pub async fn change_password(
        &self,
        uid: &str,
        old_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let user = self
            .store
            .find_one(UserFilter::by_id(uid))
            .await?
            .ok_or_else(|| ServiceError::not_found("User", uid))?;

        let password_hash = match (&user.provider, user.password_hash.as_deref()) {
            (Provider::Email, Some(hash)) => hash,
            _ => {
                return Err(ServiceError::validation(
                    "User has no password. Use social login",
                ));
            }
        };

        if !self.hasher.verify(old_password, password_hash) {
            return Err(ServiceError::validation("Old password is not matched"));
        }

        let new_hash = self.hasher.hash(new_password)?;
        self.store
            .update(
                &user.id,
                UserPatch {
                    password_hash: Some(new_hash),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, "password changed");
        Ok(())
    }

    /// Full session revoke: clears all three secret slots, populated or not.
    pub async fn logout(&self, uid: &str) -> ServiceResult<()> {
        self.store
            .find_one(UserFilter::by_id(uid))
            .await?
            .ok_or_else(|| ServiceError::not_found("User", uid))?;

        self.store
            .update(
                uid,
                UserPatch {
                    verify_token: Some(None),
                    reset_token: Some(None),
                    refresh_token: Some(None),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id = %uid, "user logged out");
        Ok(())
    }

    /// Fetches the profile of an authenticated user.
    pub async fn get_user_profile(&self, uid: &str) -> ServiceResult<User> {
        self.store
            .find_one(UserFilter::by_id(uid))
            .await?
            .ok_or_else(|| ServiceError::not_found("User", uid))
    }

    /// Updates non-secret profile fields.
    pub async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> ServiceResult<User> {
        let user = self
            .store
            .find_one(UserFilter::by_id(uid))
            .await?
            .ok_or_else(|| ServiceError::not_found("User", uid))?;

        if let Some(username) = &update.username {
            let taken = self
                .store
                .find_one(UserFilter::by_username(username))
                .await?
                .map(|other| other.id != user.id)
                .unwrap_or(false);
            if taken {
                return Err(ServiceError::already_exists("User", username));
            }
        }

        let profile_picture_url = match &update.profile_picture {
            Some(file) => Some(self.upload.upload_and_get_url(file).await?),
            None => None,
        };

        self.store
            .update(
                &user.id,
                UserPatch {
                    name: update.name,
                    username: update.username,
                    profile_picture_url,
                    ..Default::default()
                },
            )
            .await
    }

    /// Issues a token pair and persists the refresh-token digest, replacing
    /// whatever the slot held before.
    async fn issue_and_store(
        &self,
        user_id: &str,
        email: &str,
        provider: Option<Provider>,
    ) -> ServiceResult<TokenPair> {
        let pair = self.jwt.issue_pair(user_id, email)?;
        let refresh_hash = self.hasher.hash(&pair.refresh_token)?;
        let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS);

        self.store
            .update(
                user_id,
                UserPatch {
                    provider,
                    refresh_token: Some(Some(SecretSlot::new(refresh_hash, expires_at))),
                    ..Default::default()
                },
            )
            .await?;

        Ok(pair)
    }
}
