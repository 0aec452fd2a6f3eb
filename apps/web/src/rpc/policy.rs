//! Three-tier access gate applied to every procedure before its handler runs.
//!
//! Public resolves the caller; Authenticated additionally requires one;
//! ServerOnly requires the in-process trust marker (or the debug-printer
//! override) whatever the caller's identity.

use std::sync::Arc;

use tracing::debug;

use super::context::{CallContext, InboundCall, SessionResolver};
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    Public,
    Authenticated,
    ServerOnly,
}

/// A remotely callable operation, registered under `/api/rpc/<path>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Procedure {
    pub path: &'static str,
    pub tier: AccessTier,
}

impl Procedure {
    pub const fn public(path: &'static str) -> Self {
        Self {
            path,
            tier: AccessTier::Public,
        }
    }

    pub const fn authenticated(path: &'static str) -> Self {
        Self {
            path,
            tier: AccessTier::Authenticated,
        }
    }

    pub const fn server_only(path: &'static str) -> Self {
        Self {
            path,
            tier: AccessTier::ServerOnly,
        }
    }

    pub fn route(&self) -> String {
        format!("/api/rpc/{}", self.path)
    }
}

#[derive(Clone)]
pub struct AccessPolicy {
    resolver: Arc<dyn SessionResolver>,
    /// Operational override that opens server-only procedures to the network.
    server_only_override: bool,
}

impl AccessPolicy {
    pub fn new(resolver: Arc<dyn SessionResolver>, server_only_override: bool) -> Self {
        Self {
            resolver,
            server_only_override,
        }
    }

    /// Builds the call context for `procedure`, or rejects the call.
    pub async fn admit(
        &self,
        procedure: &Procedure,
        inbound: InboundCall,
    ) -> Result<CallContext, AppError> {
        let context = self.identify(inbound).await;

        match procedure.tier {
            AccessTier::Public => Ok(context),
            AccessTier::Authenticated => {
                if context.user.is_none() {
                    debug!("{}: rejected anonymous caller", procedure.path);
                    return Err(AppError::Unauthorized(None));
                }
                Ok(context)
            }
            AccessTier::ServerOnly => {
                if !(self.server_only_override || context.server_side_call) {
                    debug!("{}: rejected network caller", procedure.path);
                    return Err(AppError::Unauthorized(Some(
                        "This endpoint can only be called from server-side code".to_string(),
                    )));
                }
                Ok(context)
            }
        }
    }

    /// The Public tier: identify the caller once, never reject. Page routes
    /// use this directly.
    pub async fn identify(&self, inbound: InboundCall) -> CallContext {
        let server_side_call = inbound.is_server_side_call();
        let user = self.resolver.resolve(&inbound.forwarded()).await;
        CallContext {
            locale: inbound.locale,
            headers: inbound.headers,
            user,
            server_side_call,
        }
    }
}
