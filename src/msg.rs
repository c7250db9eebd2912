//! Messages delivered to the UI loop.
//!
//! Background work (API calls, poll loops) never touches application state
//! directly.  It sends a [`Msg`] over the channel and [`crate::app::App::apply`]
//! folds it in on the UI thread.

use crate::listing::{Listing, ListingStatus};
use crate::poll::PollMsg;

#[derive(Debug)]
pub enum Msg {
    /// A `list_all` call returned.  `seq` orders overlapping refreshes.
    Listings { seq: u64, listings: Vec<Listing> },
    /// The backend accepted a URL and started a task for it.
    TaskCreated {
        provisional_id: String,
        task_id: String,
    },
    /// The backend refused (or never saw) a submitted URL.
    CreateFailed {
        provisional_id: String,
        error: String,
    },
    StatusUpdated { id: String, status: ListingStatus },
    Deleted { id: String },
    /// Something a task poll loop observed.
    Poll(PollMsg),
    /// A call failed; the text is already logged and ready for the status bar.
    Failed(String),
}
