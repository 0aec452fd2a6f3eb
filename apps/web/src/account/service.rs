//! Account-level operations that do not need a signed-in browser session.

use std::collections::BTreeMap;

use anyhow::Result;
use reqwest::Url;
use serde_json::json;

use crate::backend::{BackendClient, BackendRequest, ExecutionMode};
use crate::errors::{BackendError, ErrorKind};

/// Provider id → display name, as shown on the sign-in page.
pub type ProviderList = BTreeMap<&'static str, &'static str>;

#[derive(Clone)]
pub struct AccountService {
    backend: BackendClient,
    /// Social sign-in is only offered when a backend was configured explicitly.
    social_providers: bool,
}

impl AccountService {
    pub fn new(backend_url: Url, social_providers: bool) -> Result<Self> {
        Ok(Self {
            backend: BackendClient::new(backend_url, ExecutionMode::Server)?,
            social_providers,
        })
    }

    pub fn providers(&self) -> ProviderList {
        let mut list = ProviderList::new();
        list.insert("credential", "Password");
        if self.social_providers {
            list.insert("google", "Google");
            list.insert("facebook", "Facebook");
            list.insert("linkedin", "LinkedIn");
        }
        list
    }

    /// Checks the password of a protected public resume. Sent without the
    /// caller's credentials.
    pub async fn verify_resume_password(
        &self,
        id: &str,
        password: &str,
    ) -> Result<bool, BackendError> {
        let request = BackendRequest::post(format!("/api/resumes/public/{id}/verify-password"))
            .json(json!({ "password": password }));

        match self.backend.request(&request).await {
            Ok(_) => Ok(true),
            Err(e) => Err(match e.status {
                Some(401) => BackendError::new(ErrorKind::InvalidPassword, "Invalid password"),
                Some(404) => BackendError::new(ErrorKind::NotFound, "Resume not found"),
                _ => BackendError::new(
                    ErrorKind::InternalError,
                    format!("Password verification failed: {}", e.message),
                ),
            }),
        }
    }

    pub async fn delete_account(&self) -> Result<(), BackendError> {
        Err(BackendError::new(
            ErrorKind::InternalError,
            "Account deletion is managed by the primary backend.",
        ))
    }
}
