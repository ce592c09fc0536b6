//! Typed Halo admin API calls.
//!
//! Every call goes through the [`AuthInterceptor`], so an expired token is
//! refreshed transparently. Paths are relative to the admin base URL
//! (e.g. `http://localhost:8090/api/admin`).

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::interceptor::AuthInterceptor;
use crate::store::SecretStore;
use crate::transport::{HttpRequest, Transport};

mod types;

pub use types::{
    Attachment, Envelope, Environment, Journal, JournalType, NewJournal, Page, Post, PostDetail,
    PostQuery, format_date,
};

/// Halo admin API client.
pub struct HaloClient<T, S> {
    interceptor: AuthInterceptor<T, S>,
}

impl<T: Transport, S: SecretStore> HaloClient<T, S> {
    pub fn new(interceptor: AuthInterceptor<T, S>) -> Self {
        Self { interceptor }
    }

    pub fn interceptor(&self) -> &AuthInterceptor<T, S> {
        &self.interceptor
    }

    async fn data<R: DeserializeOwned>(&self, request: HttpRequest) -> Result<R, ApiError> {
        let envelope: Envelope<R> = self.interceptor.send_json(request).await?;
        Ok(envelope.data)
    }

    pub async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>, ApiError> {
        let request = HttpRequest::get("/posts")
            .query_opt("keyword", query.keyword.as_deref())
            .query_opt("categoryId", query.category_id)
            .query_opt("page", query.page)
            .query_opt("size", query.size);
        let page: Page<Post> = self.data(request).await?;
        debug!(count = page.content.len(), total = page.total, "Listed posts");
        Ok(page.content)
    }

    pub async fn get_post(&self, id: u64) -> Result<PostDetail, ApiError> {
        self.data(HttpRequest::get(format!("/posts/{}", id))).await
    }

    pub async fn list_journals(&self, keyword: Option<&str>) -> Result<Vec<Journal>, ApiError> {
        let request = HttpRequest::get("/journals").query_opt("keyword", keyword);
        let page: Page<Journal> = self.data(request).await?;
        Ok(page.content)
    }

    /// Publish a journal. Blank content is rejected before any request is sent.
    pub async fn create_journal(&self, content: &str, kind: JournalType) -> Result<Journal, ApiError> {
        if content.trim().is_empty() {
            return Err(ApiError::request("Please enter content"));
        }
        let request = HttpRequest::post("/journals").json(&NewJournal {
            source_content: content,
            kind,
        })?;
        self.data(request).await
    }

    pub async fn list_attachments(&self, keyword: Option<&str>) -> Result<Vec<Attachment>, ApiError> {
        let request = HttpRequest::get("/attachments").query_opt("keyword", keyword);
        let page: Page<Attachment> = self.data(request).await?;
        Ok(page.content)
    }

    pub async fn environment(&self) -> Result<Environment, ApiError> {
        self.data(HttpRequest::get("/environments")).await
    }
}
