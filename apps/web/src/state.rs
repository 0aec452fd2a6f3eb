use std::sync::Arc;

use anyhow::Result;

use crate::account::AccountService;
use crate::config::Config;
use crate::resume::ResumeService;
use crate::rpc::{AccessPolicy, ProfileResolver, SessionResolver};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Gate every procedure passes through before its handler runs.
    pub policy: AccessPolicy,
    pub resumes: ResumeService,
    pub accounts: AccountService,
}

impl AppState {
    /// Wires the services against the configured backend, identifying callers
    /// through its profile endpoint.
    pub fn from_config(config: Config) -> Result<Self> {
        let resolver: Arc<dyn SessionResolver> =
            Arc::new(ProfileResolver::new(config.backend_url.clone())?);
        Self::with_resolver(config, resolver)
    }

    pub fn with_resolver(config: Config, resolver: Arc<dyn SessionResolver>) -> Result<Self> {
        Ok(Self {
            policy: AccessPolicy::new(resolver, config.flags.debug_printer),
            resumes: ResumeService::new(config.backend_url.clone())?,
            accounts: AccountService::new(config.backend_url.clone(), config.backend_configured)?,
            config,
        })
    }
}
