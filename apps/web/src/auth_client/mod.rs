//! Browser-side session operations against the backend's `/api/auth` endpoints.
//!
//! Only email/password flows exist on the backend. Every other operation the
//! UI might ask for is part of the closed `AuthOperation` set and fails fast
//! with `NotSupported`.

use std::sync::Arc;

use anyhow::Result;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::backend::{BackendClient, BackendRequest, ExecutionMode};
use crate::errors::{BackendError, ErrorKind};
use crate::session::{Navigator, ProfileEnvelope, Session, TokenStore};

pub const PROFILE_PATH: &str = "/api/auth/profile";
const LOGIN_PATH: &str = "/api/auth/login";
const REGISTER_PATH: &str = "/api/auth/register";
const LOGOUT_PATH: &str = "/api/auth/logout";
const FORGOT_PASSWORD_PATH: &str = "/api/auth/forgot-password";
const RESET_PASSWORD_PATH: &str = "/api/auth/reset-password";
const CHANGE_PASSWORD_PATH: &str = "/api/auth/change-password";
const RESEND_OTP_PATH: &str = "/api/auth/resend-otp";
const VERIFY_LOGIN_PATH: &str = "/api/auth/verify-login";

/// Every auth operation the UI can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    GetSession,
    SignInEmail,
    SignInUsername,
    SignInPasskey,
    SignInSocial,
    SignInOAuth2,
    SignUpEmail,
    SignOut,
    RequestPasswordReset,
    ResetPassword,
    ChangePassword,
    ResendOtp,
    TwoFactorVerifyTotp,
    TwoFactorEnable,
    TwoFactorDisable,
    TwoFactorVerifyBackupCode,
    ApiKeyCreate,
    ApiKeyList,
    ApiKeyDelete,
    PasskeyList,
    PasskeyAdd,
    PasskeyDelete,
    UpdateUser,
    ChangeEmail,
    SendVerificationEmail,
    ListAccounts,
    LinkSocial,
    UnlinkAccount,
}

impl AuthOperation {
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            AuthOperation::GetSession
                | AuthOperation::SignInEmail
                | AuthOperation::SignUpEmail
                | AuthOperation::SignOut
                | AuthOperation::RequestPasswordReset
                | AuthOperation::ResetPassword
                | AuthOperation::ChangePassword
                | AuthOperation::ResendOtp
                | AuthOperation::TwoFactorVerifyTotp
        )
    }
}

#[derive(Debug, Clone)]
pub enum SignInMethod {
    Email { email: String, password: String },
    Username,
    Passkey,
    Social { provider: String },
    OAuth2 { provider_id: String },
}

impl SignInMethod {
    fn operation(&self) -> AuthOperation {
        match self {
            SignInMethod::Email { .. } => AuthOperation::SignInEmail,
            SignInMethod::Username => AuthOperation::SignInUsername,
            SignInMethod::Passkey => AuthOperation::SignInPasskey,
            SignInMethod::Social { .. } => AuthOperation::SignInSocial,
            SignInMethod::OAuth2 { .. } => AuthOperation::SignInOAuth2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn,
    /// A second factor is needed; the email is parked in the token store.
    TwoFactorRequired,
    EmailVerificationRequired,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    #[serde(default, rename = "requires2FA")]
    requires_2fa: bool,
    #[serde(default)]
    requires_email_verification: bool,
    access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenData {
    access_token: Option<String>,
}

pub struct AuthClient {
    backend: BackendClient,
    tokens: Arc<dyn TokenStore>,
}

impl AuthClient {
    pub fn browser(
        base_url: Url,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let backend = BackendClient::new(
            base_url,
            ExecutionMode::Browser {
                tokens: tokens.clone(),
                navigator,
            },
        )?;
        Ok(Self { backend, tokens })
    }

    pub fn ensure_supported(operation: AuthOperation) -> Result<(), BackendError> {
        if operation.is_supported() {
            Ok(())
        } else {
            debug!("rejected unsupported auth operation {operation:?}");
            Err(BackendError::not_supported())
        }
    }

    pub async fn get_session(&self) -> Result<Session, BackendError> {
        let envelope: ProfileEnvelope = self
            .backend
            .request_json(&BackendRequest::get(PROFILE_PATH))
            .await?;
        match envelope {
            ProfileEnvelope {
                success: true,
                data: Some(session),
            } => Ok(session),
            _ => Err(BackendError::new(
                ErrorKind::Unauthorized,
                "Unable to fetch session",
            )),
        }
    }

    /// The current session, or `None` on any failure.
    pub async fn current_session(&self) -> Option<Session> {
        self.get_session().await.ok()
    }

    pub async fn sign_in(&self, method: SignInMethod) -> Result<SignInOutcome, BackendError> {
        Self::ensure_supported(method.operation())?;
        match method {
            SignInMethod::Email { email, password } => self.sign_in_email(&email, &password).await,
            _ => Err(BackendError::not_supported()),
        }
    }

    pub async fn sign_in_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignInOutcome, BackendError> {
        let data: Option<LoginData> = self
            .backend
            .request_data(
                &BackendRequest::post(LOGIN_PATH)
                    .json(json!({ "email": email, "password": password })),
            )
            .await?;
        let data = data.unwrap_or_default();

        if data.requires_2fa {
            self.tokens.set_pending_email(email);
            return Ok(SignInOutcome::TwoFactorRequired);
        }
        if data.requires_email_verification {
            return Ok(SignInOutcome::EmailVerificationRequired);
        }

        if let Some(token) = data.access_token.as_deref().filter(|t| !t.is_empty()) {
            self.tokens.set_access_token(token);
        }
        info!("signed in");
        Ok(SignInOutcome::SignedIn)
    }

    /// Completes a two-factor login started by `sign_in_email`.
    pub async fn verify_two_factor(&self, code: &str) -> Result<(), BackendError> {
        let email = self.tokens.pending_email().ok_or_else(|| {
            BackendError::new(ErrorKind::BadRequest, "Missing pending login email.")
        })?;

        let data: Option<TokenData> = self
            .backend
            .request_data(
                &BackendRequest::post(VERIFY_LOGIN_PATH)
                    .json(json!({ "email": email, "code": code })),
            )
            .await?;

        if let Some(token) = data.and_then(|d| d.access_token).filter(|t| !t.is_empty()) {
            self.tokens.set_access_token(&token);
        }
        self.tokens.take_pending_email();
        Ok(())
    }

    pub async fn sign_up_email(&self, email: &str, password: &str) -> Result<(), BackendError> {
        self.post(
            REGISTER_PATH,
            json!({ "email": email, "password": password, "role": "candidate" }),
        )
        .await
    }

    /// Local state is cleared even when the backend cannot be reached.
    pub async fn sign_out(&self) {
        if let Err(e) = self
            .backend
            .request(&BackendRequest::post(LOGOUT_PATH))
            .await
        {
            debug!("logout call failed, clearing local session anyway: {e}");
        }
        self.tokens.clear();
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), BackendError> {
        self.post(FORGOT_PASSWORD_PATH, json!({ "email": email }))
            .await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), BackendError> {
        self.post(
            RESET_PASSWORD_PATH,
            json!({ "token": token, "password": new_password }),
        )
        .await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), BackendError> {
        self.post(
            CHANGE_PASSWORD_PATH,
            json!({ "currentPassword": current_password, "newPassword": new_password }),
        )
        .await
    }

    pub async fn resend_otp(&self, email: &str) -> Result<(), BackendError> {
        self.post(RESEND_OTP_PATH, json!({ "email": email })).await
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), BackendError> {
        self.backend
            .request(&BackendRequest::post(path).json(body))
            .await
            .map(|_| ())
    }
}
