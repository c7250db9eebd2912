//! Side effects requested by the UI.
//!
//! [`crate::app::App`] never performs IO.  Its methods return effects and the
//! [`crate::dispatch::Dispatcher`] carries them out.

use crate::listing::ListingStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Reload every listing from the backend.
    Refresh,
    CreateListing { provisional_id: String, url: String },
    StartPolling { task_id: String, generation: u64 },
    StopPolling { task_id: String },
    UpdateStatus { id: String, status: ListingStatus },
    DeleteListing { id: String },
    /// Show a marketplace page in the system browser.
    OpenUrl { url: String },
}
