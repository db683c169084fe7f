use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::metrics::ApiMetrics;
use crate::notification::{
    MarkAllReadResponse, Notification, NotificationFilter, NotificationListItem, UnreadCount,
};

/// Anything that can report the server-side unread count
#[async_trait]
pub trait UnreadCountSource: Send + Sync {
    async fn unread_count(&self) -> Result<u64, ApiError>;
}

/// Error body returned by the API (`{"detail": ...}`)
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// REST client for the notification endpoints, authenticated with a bearer
/// credential
#[derive(Debug, Clone)]
pub struct NotificationsApi {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl NotificationsApi {
    pub fn new(config: &ApiConfig, token: impl Into<String>) -> Result<Self, ApiError> {
        // Url::join drops the last segment unless the base ends with '/'
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: Url::parse(&base)?,
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
    }

    /// `GET /notifications/unread-count`
    pub async fn get_unread_count(&self) -> Result<UnreadCount, ApiError> {
        let url = self.endpoint("notifications/unread-count")?;
        self.send_json(self.request(Method::GET, url), "unread_count")
            .await
    }

    /// `GET /notifications/` with optional `is_read` and `type` filters
    #[tracing::instrument(name = "api.list_notifications", skip(self))]
    pub async fn list(
        &self,
        filter: &NotificationFilter,
    ) -> Result<Vec<NotificationListItem>, ApiError> {
        let mut url = self.endpoint("notifications/")?;
        let pairs = filter.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        self.send_json(self.request(Method::GET, url), "list").await
    }

    /// `PATCH /notifications/{id}/read`
    pub async fn mark_as_read(&self, id: Uuid) -> Result<Notification, ApiError> {
        let url = self.endpoint(&format!("notifications/{}/read", id))?;
        self.send_json(self.request(Method::PATCH, url), "mark_as_read")
            .await
    }

    /// `POST /notifications/mark-all-read`
    pub async fn mark_all_read(&self) -> Result<MarkAllReadResponse, ApiError> {
        let url = self.endpoint("notifications/mark-all-read")?;
        self.send_json(self.request(Method::POST, url), "mark_all_read")
            .await
    }

    /// `DELETE /notifications/{id}`
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("notifications/{}", id))?;
        let result = self.send(self.request(Method::DELETE, url)).await;
        ApiMetrics::record("delete", result.is_ok());
        result.map(|_| ())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &'static str,
    ) -> Result<T, ApiError> {
        let result = match self.send(request).await {
            Ok(response) => response.json::<T>().await.map_err(ApiError::from),
            Err(e) => Err(e),
        };
        ApiMetrics::record(endpoint, result.is_ok());
        result
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .and_then(|detail| detail.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

        tracing::debug!(status = status.as_u16(), detail = %detail, "API request failed");

        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl UnreadCountSource for NotificationsApi {
    async fn unread_count(&self) -> Result<u64, ApiError> {
        Ok(self.get_unread_count().await?.unread_count)
    }
}
