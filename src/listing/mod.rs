//! Listing records and the in-memory store that holds them.
//!
//! * [`model`] — the `Listing` type, its status enumeration, task phases and
//!   the partial-update types a task reports while it runs.
//! * [`store`] — the ordered collection the UI renders.
//!
//! ## For contributors
//!
//! The backend owns persisted listings; the client only ever edits its own
//! placeholders.  If you add a field to the backend's car JSON, add it to
//! [`Listing`] *and* `ListingPatch` so partial task reports can fill it in.

mod model;
mod store;

pub use model::{Listing, ListingStatus, Pending, Price, TaskPhase, TaskReport};
pub use store::{ListingStore, MergeOutcome};
