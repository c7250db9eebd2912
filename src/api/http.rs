//! HTTP implementation of [`ListingApi`] on top of [`reqwest`].

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::ListingApi;
use crate::error::ApiError;
use crate::listing::{Listing, ListingStatus, TaskReport};

#[derive(Deserialize)]
struct ListResponse {
    cars: Vec<Listing>,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct CreateResponse {
    task_id: String,
}

#[derive(Serialize)]
struct StatusRequest<'a> {
    status: &'a str,
}

/// Client for the car-tracker backend.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    /// Always ends in `/`.
    base_url: Url,
}

impl HttpApi {
    /// Create a client for the backend at `base_url` (e.g.
    /// `http://localhost:5000`).  A trailing slash is optional.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let invalid = |source: url::ParseError| ApiError::BaseUrl {
            url: base_url.to_string(),
            source,
        };
        let mut url = Url::parse(base_url).map_err(invalid)?;
        if url.cannot_be_a_base() {
            return Err(invalid(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self {
            client,
            base_url: url,
        })
    }

    /// Resolve path segments against the base URL.  Each segment is
    /// percent-encoded, so ids containing `/`, `?` or `#` stay one segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if !segments.is_empty() {
            // A base URL always has path segments; see `new`.
            if let Ok(mut path) = url.path_segments_mut() {
                path.pop_if_empty().extend(segments);
            }
        }
        url
    }

    /// Send a request and reject anything that is not 2xx.
    async fn send(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        log::debug!("-> {path}");
        let response = request.send().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let body = response.bytes().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ListingApi for HttpApi {
    async fn list_all(&self) -> Result<Vec<Listing>, ApiError> {
        let path = "/";
        let response = self.send(path, self.client.get(self.endpoint(&[]))).await?;
        let body: ListResponse = Self::decode(path, response).await?;
        Ok(body.cars)
    }

    async fn create_from_url(&self, url: &str) -> Result<String, ApiError> {
        let path = "/add_car";
        let request = self
            .client
            .post(self.endpoint(&["add_car"]))
            .json(&CreateRequest { url });
        let response = self.send(path, request).await?;
        let body: CreateResponse = Self::decode(path, response).await?;
        Ok(body.task_id)
    }

    async fn poll_task(&self, task_id: &str) -> Result<TaskReport, ApiError> {
        let path = format!("/task_status/{task_id}");
        let request = self.client.get(self.endpoint(&["task_status", task_id]));
        let response = self.send(&path, request).await?;
        Self::decode(&path, response).await
    }

    async fn update_status(&self, id: &str, status: &ListingStatus) -> Result<(), ApiError> {
        let path = format!("/update_status/{id}");
        let request = self
            .client
            .post(self.endpoint(&["update_status", id]))
            .json(&StatusRequest {
            status: status.as_str(),
        });
        self.send(&path, request).await?;
        Ok(())
    }

    async fn delete_listing(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/delete_car/{id}");
        let request = self.client.post(self.endpoint(&["delete_car", id]));
        self.send(&path, request).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
