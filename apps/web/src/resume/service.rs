//! Resume operations, proxied to the backend's `/api/resumes` API with the
//! caller's forwarded credentials.

use anyhow::Result;
use reqwest::Url;
use serde_json::json;
use tracing::debug;

use crate::backend::{BackendClient, BackendRequest, ExecutionMode, ForwardedHeaders};
use crate::errors::{BackendError, ErrorKind};
use crate::models::resume::{
    CreatedResume, NewResume, ResumeDetail, ResumePatch, ResumeSort, ResumeStatistics,
    ResumeSummary,
};

const RESUMES_PATH: &str = "/api/resumes";

/// Name/slug/tags to apply to a copy instead of the original's.
#[derive(Debug, Clone, Default)]
pub struct DuplicateOverrides {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct ResumeService {
    backend: BackendClient,
}

impl ResumeService {
    pub fn new(backend_url: Url) -> Result<Self> {
        Ok(Self {
            backend: BackendClient::new(backend_url, ExecutionMode::Server)?,
        })
    }

    pub async fn list_tags(&self, caller: &ForwardedHeaders) -> Result<Vec<String>, BackendError> {
        let request = BackendRequest::get(format!("{RESUMES_PATH}/tags")).forwarding(caller);
        Ok(self.backend.request_data(&request).await?.unwrap_or_default())
    }

    pub async fn statistics(
        &self,
        caller: &ForwardedHeaders,
        id: &str,
    ) -> Result<ResumeStatistics, BackendError> {
        let request = BackendRequest::get(format!("{RESUMES_PATH}/{id}/stats")).forwarding(caller);
        Ok(self.backend.request_data(&request).await?.unwrap_or_default())
    }

    /// Public counter bump; sent without credentials.
    pub async fn increment_statistics(
        &self,
        id: &str,
        views: bool,
        downloads: bool,
    ) -> Result<(), BackendError> {
        let request = BackendRequest::post(format!("{RESUMES_PATH}/public/{id}/stats"))
            .json(json!({ "views": views, "downloads": downloads }));
        self.backend.request(&request).await?;
        Ok(())
    }

    pub async fn list(
        &self,
        caller: &ForwardedHeaders,
        tags: &[String],
        sort: ResumeSort,
    ) -> Result<Vec<ResumeSummary>, BackendError> {
        let mut request = BackendRequest::get(RESUMES_PATH).forwarding(caller);
        if !tags.is_empty() {
            request = request.query_param("tags", tags.join(","));
        }
        request = request.query_param("sort", sort.as_str());

        Ok(self.backend.request_data(&request).await?.unwrap_or_default())
    }

    pub async fn get_by_id(
        &self,
        caller: &ForwardedHeaders,
        id: &str,
    ) -> Result<ResumeDetail, BackendError> {
        let request = BackendRequest::get(format!("{RESUMES_PATH}/{id}")).forwarding(caller);
        self.backend
            .request_data(&request)
            .await?
            .ok_or_else(resume_not_found)
    }

    pub async fn get_public_by_id(&self, id: &str) -> Result<ResumeDetail, BackendError> {
        let request = BackendRequest::get(format!("{RESUMES_PATH}/public/{id}"));
        self.backend
            .request_data(&request)
            .await?
            .ok_or_else(resume_not_found)
    }

    /// Returns the id of the new resume.
    pub async fn create(
        &self,
        caller: &ForwardedHeaders,
        resume: &NewResume,
    ) -> Result<String, BackendError> {
        let body = serde_json::to_value(resume)
            .map_err(|e| BackendError::new(ErrorKind::InternalError, e.to_string()))?;
        let request = BackendRequest::post(RESUMES_PATH)
            .forwarding(caller)
            .json(body);

        let created: Option<CreatedResume> = self.backend.request_data(&request).await?;
        created.map(|c| c.id).ok_or_else(|| {
            BackendError::new(ErrorKind::InternalError, "Backend did not return a resume id")
        })
    }

    pub async fn update(
        &self,
        caller: &ForwardedHeaders,
        id: &str,
        patch: &ResumePatch,
    ) -> Result<(), BackendError> {
        let body = serde_json::to_value(patch)
            .map_err(|e| BackendError::new(ErrorKind::InternalError, e.to_string()))?;
        let request = BackendRequest::put(format!("{RESUMES_PATH}/{id}"))
            .forwarding(caller)
            .json(body);
        self.backend.request(&request).await?;
        Ok(())
    }

    pub async fn set_locked(
        &self,
        caller: &ForwardedHeaders,
        id: &str,
        is_locked: bool,
    ) -> Result<(), BackendError> {
        let request = BackendRequest::post(format!("{RESUMES_PATH}/{id}/lock"))
            .forwarding(caller)
            .json(json!({ "isLocked": is_locked }));
        self.backend.request(&request).await?;
        Ok(())
    }

    pub async fn set_password(
        &self,
        caller: &ForwardedHeaders,
        id: &str,
        password: &str,
    ) -> Result<(), BackendError> {
        let request = BackendRequest::post(format!("{RESUMES_PATH}/{id}/password"))
            .forwarding(caller)
            .json(json!({ "password": password }));
        self.backend.request(&request).await?;
        Ok(())
    }

    pub async fn remove_password(
        &self,
        caller: &ForwardedHeaders,
        id: &str,
    ) -> Result<(), BackendError> {
        let request =
            BackendRequest::delete(format!("{RESUMES_PATH}/{id}/password")).forwarding(caller);
        self.backend.request(&request).await?;
        Ok(())
    }

    /// Copies the document of `id` into a new resume. Returns the new id.
    pub async fn duplicate(
        &self,
        caller: &ForwardedHeaders,
        id: &str,
        overrides: DuplicateOverrides,
    ) -> Result<String, BackendError> {
        let original = self.get_by_id(caller, id).await?;
        debug!("duplicating resume {id}");

        let copy = NewResume {
            name: overrides.name.unwrap_or(original.name),
            slug: overrides.slug.unwrap_or(original.slug),
            tags: overrides.tags.unwrap_or(original.tags),
            data: Some(original.data),
        };
        self.create(caller, &copy).await
    }

    pub async fn delete(&self, caller: &ForwardedHeaders, id: &str) -> Result<(), BackendError> {
        let request = BackendRequest::delete(format!("{RESUMES_PATH}/{id}")).forwarding(caller);
        self.backend.request(&request).await?;
        Ok(())
    }
}

fn resume_not_found() -> BackendError {
    BackendError::new(ErrorKind::NotFound, "Resume not found")
}
