//! Backend API abstraction.
//!
//! [`ListingApi`] is the seam between the UI and the car-tracker backend.
//! [`HttpApi`] talks to the real service; tests drive the poller and the
//! dispatcher through the in-memory [`fake::FakeApi`] instead.
//!
//! | Method | Path                     | Body         | Response                          |
//! |--------|--------------------------|--------------|-----------------------------------|
//! | GET    | `/`                      |              | `{ cars: Listing[] }`             |
//! | POST   | `/add_car`               | `{ url }`    | `{ task_id }`                     |
//! | GET    | `/task_status/{task_id}` |              | `{ status, message, car_data? }`  |
//! | POST   | `/update_status/{id}`    | `{ status }` | ack                               |
//! | POST   | `/delete_car/{id}`       |              | ack                               |

mod http;

pub use http::HttpApi;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::listing::{Listing, ListingStatus, TaskReport};

/// Everything the client asks of the backend.
///
/// Calls are single attempts: no retries, no backoff.  Implementations must
/// be shareable across tokio tasks since every poll loop holds a handle.
#[async_trait]
pub trait ListingApi: Send + Sync {
    /// Fetch every persisted listing.
    async fn list_all(&self) -> Result<Vec<Listing>, ApiError>;

    /// Submit a marketplace URL for ingestion and return the task id.
    async fn create_from_url(&self, url: &str) -> Result<String, ApiError>;

    /// Current state of an ingestion task.
    async fn poll_task(&self, task_id: &str) -> Result<TaskReport, ApiError>;

    async fn update_status(&self, id: &str, status: &ListingStatus) -> Result<(), ApiError>;

    async fn delete_listing(&self, id: &str) -> Result<(), ApiError>;
}
