//! In-process procedure client for trusted server code.
//!
//! Calls made through `ServerCaller` carry the inbound request's headers plus
//! `x-server-side-call: true`, which is what admits them to server-only
//! procedures. Network callers can never produce that marker.

use axum::http::HeaderMap;

use super::context::{CallContext, InboundCall};
use crate::errors::AppError;
use crate::models::resume::ResumeDetail;
use crate::resume::handlers::{self, GET_BY_ID_FOR_PRINTER, GET_PUBLIC_BY_ID};
use crate::state::AppState;

/// The outcome of an in-process call together with the context it ran in.
#[derive(Debug)]
pub struct Called<T> {
    pub ctx: CallContext,
    pub value: T,
}

pub struct ServerCaller<'a> {
    state: &'a AppState,
    request_headers: &'a HeaderMap,
}

impl<'a> ServerCaller<'a> {
    pub fn new(state: &'a AppState, request_headers: &'a HeaderMap) -> Self {
        Self {
            state,
            request_headers,
        }
    }

    fn inbound(&self) -> InboundCall {
        InboundCall::from_server(self.request_headers)
    }

    pub async fn resume_for_printer(&self, id: &str) -> Result<Called<ResumeDetail>, AppError> {
        let ctx = self
            .state
            .policy
            .admit(&GET_BY_ID_FOR_PRINTER, self.inbound())
            .await?;
        let value = handlers::load_for_printer(self.state, &ctx, id).await?;
        Ok(Called { ctx, value })
    }

    pub async fn public_resume(&self, id: &str) -> Result<Called<ResumeDetail>, AppError> {
        let ctx = self
            .state
            .policy
            .admit(&GET_PUBLIC_BY_ID, self.inbound())
            .await?;
        let value = handlers::load_public(self.state, id).await?;
        Ok(Called { ctx, value })
    }
}
