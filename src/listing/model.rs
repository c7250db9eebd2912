//! The listing record shared by the store, the API client and the UI.
//!
//! `Listing` mirrors the backend's `car` JSON object.  The backend is trusted
//! to validate shape, so deserialization is lenient: most fields default when
//! absent, the id may arrive as a number or a string, and the price may be a
//! bare number or a pre-formatted string.
//!
//! Placeholders for in-flight ingestion tasks are ordinary `Listing`s with
//! [`Listing::pending`] set.  That field is never serialized and the backend
//! never produces it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Open-ended vehicle attributes (`mileage`, `transmission`, ...).
///
/// Kept as a map so unknown keys from the backend survive a round trip.
pub type About = BTreeMap<String, Option<String>>;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Where the user is with a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ListingStatus {
    #[default]
    New,
    Contacted,
    Viewed,
    Negotiating,
    Completed,
    /// A value outside the fixed set, kept verbatim.
    Other(String),
}

impl ListingStatus {
    /// The values offered by the status picker, in display order.
    pub const CHOICES: [ListingStatus; 5] = [
        ListingStatus::New,
        ListingStatus::Contacted,
        ListingStatus::Viewed,
        ListingStatus::Negotiating,
        ListingStatus::Completed,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            ListingStatus::New => "new",
            ListingStatus::Contacted => "contacted",
            ListingStatus::Viewed => "viewed",
            ListingStatus::Negotiating => "negotiating",
            ListingStatus::Completed => "completed",
            ListingStatus::Other(raw) => raw,
        }
    }

    /// Human-readable label for the picker.
    pub fn label(&self) -> &str {
        match self {
            ListingStatus::New => "New",
            ListingStatus::Contacted => "Contacted",
            ListingStatus::Viewed => "Viewed",
            ListingStatus::Negotiating => "Negotiating",
            ListingStatus::Completed => "Completed",
            ListingStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for ListingStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "new" => ListingStatus::New,
            "contacted" => ListingStatus::Contacted,
            "viewed" => ListingStatus::Viewed,
            "negotiating" => ListingStatus::Negotiating,
            "completed" => ListingStatus::Completed,
            _ => ListingStatus::Other(raw),
        }
    }
}

impl From<ListingStatus> for String {
    fn from(status: ListingStatus) -> Self {
        match status {
            ListingStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Task phase
// ---------------------------------------------------------------------------

/// Phase of an ingestion task as reported by `/task_status/{id}`.
///
/// Only `complete` and `error` mean anything to the client; every other tag is
/// carried through for display.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TaskPhase {
    Initializing,
    Running,
    Complete,
    Error,
    Other(String),
}

impl TaskPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskPhase::Complete | TaskPhase::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskPhase::Initializing => "initializing",
            TaskPhase::Running => "running",
            TaskPhase::Complete => "complete",
            TaskPhase::Error => "error",
            TaskPhase::Other(raw) => raw,
        }
    }
}

impl From<String> for TaskPhase {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "initializing" => TaskPhase::Initializing,
            "running" => TaskPhase::Running,
            "complete" => TaskPhase::Complete,
            "error" => TaskPhase::Error,
            _ => TaskPhase::Other(raw),
        }
    }
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

/// Asking price, either numeric or already formatted by the scraper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(f64),
    Text(String),
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Amount(value) if value.fract() == 0.0 => write!(f, "${value:.0}"),
            Price::Amount(value) => write!(f, "${value:.2}"),
            Price::Text(text) => f.write_str(text),
        }
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Ingestion progress carried by a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    pub phase: TaskPhase,
    pub message: String,
    /// Store generation the placeholder was created in.
    pub generation: u64,
}

/// One tracked marketplace vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireListing")]
pub struct Listing {
    /// Server-assigned id, or the task id (or a provisional local id) while
    /// the listing is a placeholder.
    pub id: String,
    pub title: String,
    pub price: Option<Price>,
    pub location: String,
    /// Marketplace URL the listing was scraped from.
    pub url: String,
    pub status: ListingStatus,
    pub time_posted: Option<String>,
    pub images: Vec<String>,
    pub description: Option<String>,
    pub about: About,
    /// Set only on client-side placeholders.
    #[serde(skip)]
    pub pending: Option<Pending>,
}

/// A listing as the backend sends it.
///
/// Backends serving the SQL `cars` table also put `mileage` in a top-level
/// column; it is folded into `about` unless `about` already has one.
#[derive(Deserialize)]
struct WireListing {
    id: TextOrNumber,
    #[serde(default)]
    title: String,
    #[serde(default)]
    price: Option<Price>,
    #[serde(default)]
    location: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    status: ListingStatus,
    #[serde(default)]
    time_posted: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    about: About,
    #[serde(default)]
    mileage: Option<TextOrNumber>,
}

impl From<WireListing> for Listing {
    fn from(wire: WireListing) -> Self {
        let mut about = wire.about;
        if let Some(mileage) = wire.mileage {
            about
                .entry("mileage".to_string())
                .or_insert(None)
                .get_or_insert_with(|| mileage.into());
        }
        Self {
            id: wire.id.into(),
            title: wire.title,
            price: wire.price,
            location: wire.location,
            url: wire.url,
            status: wire.status,
            time_posted: wire.time_posted,
            images: wire.images,
            description: wire.description,
            about,
            pending: None,
        }
    }
}

impl Listing {
    /// A provisional record for a URL that is being ingested.
    pub fn placeholder(
        id: impl Into<String>,
        url: impl Into<String>,
        message: impl Into<String>,
        generation: u64,
    ) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            price: None,
            location: String::new(),
            url: url.into(),
            status: ListingStatus::New,
            time_posted: None,
            images: Vec::new(),
            description: None,
            about: About::new(),
            pending: Some(Pending {
                phase: TaskPhase::Initializing,
                message: message.into(),
                generation,
            }),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Look up a present `about` attribute.
    pub fn about_value(&self, key: &str) -> Option<&str> {
        self.about.get(key).and_then(|v| v.as_deref())
    }

    /// Fold a task report into this record without erasing anything the
    /// report leaves out.
    pub fn apply_report(&mut self, report: &TaskReport) {
        if let Some(pending) = self.pending.as_mut() {
            pending.phase = report.status.clone();
            if let Some(message) = &report.message {
                pending.message = message.clone();
            }
        }
        if let Some(patch) = &report.car_data {
            self.apply_patch(patch);
        }
    }

    fn apply_patch(&mut self, patch: &ListingPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(price) = &patch.price {
            self.price = Some(price.clone());
        }
        if let Some(location) = &patch.location {
            self.location = location.clone();
        }
        if let Some(url) = &patch.url {
            self.url = url.clone();
        }
        if let Some(time_posted) = &patch.time_posted {
            self.time_posted = Some(time_posted.clone());
        }
        if let Some(images) = &patch.images {
            self.images = images.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(about) = &patch.about {
            for (key, value) in about {
                match value {
                    Some(v) => {
                        self.about.insert(key.clone(), Some(v.clone()));
                    }
                    None => {
                        self.about.entry(key.clone()).or_insert(None);
                    }
                }
            }
        }
    }
}

/// Accept `"42"` and `42` alike; SQL-backed backends send integer ids.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<TextOrNumber> for String {
    fn from(raw: TextOrNumber) -> Self {
        match raw {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Integer(n) => n.to_string(),
            TextOrNumber::Float(n) => n.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Partial updates
// ---------------------------------------------------------------------------

/// Listing fields a task may have scraped so far.  `None` means "not known
/// yet", never "cleared".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub price: Option<Price>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub time_posted: Option<String>,
    pub images: Option<Vec<String>>,
    pub description: Option<String>,
    pub about: Option<About>,
}

/// Body of `GET /task_status/{task_id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskReport {
    pub status: TaskPhase,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub car_data: Option<ListingPatch>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report(json: &str) -> TaskReport {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn deserializes_full_backend_record() {
        let json = r#"{
            "id": 7,
            "title": "2019 Civic",
            "price": 15000,
            "location": "Columbus, OH",
            "url": "https://marketplace.example/item/123",
            "status": "contacted",
            "time_posted": "2 days ago",
            "images": ["https://img.example/1.jpg"],
            "description": "Runs great",
            "about": { "mileage": "42,000 miles", "mpg": null, "drive": "FWD" }
        }"#;

        let listing: Listing = serde_json::from_str(json).unwrap();

        assert_eq!(listing.id, "7");
        assert_eq!(listing.price, Some(Price::Amount(15000.0)));
        assert_eq!(listing.status, ListingStatus::Contacted);
        assert_eq!(listing.about_value("mileage"), Some("42,000 miles"));
        assert_eq!(listing.about_value("mpg"), None);
        assert_eq!(listing.about_value("drive"), Some("FWD"), "unknown keys survive");
        assert!(!listing.is_pending());
    }

    #[test]
    fn deserializes_minimal_record_with_string_price() {
        let json = r#"{ "id": "abc", "title": "Truck", "price": "$9,500" }"#;
        let listing: Listing = serde_json::from_str(json).unwrap();

        assert_eq!(listing.id, "abc");
        assert_eq!(listing.price.unwrap().to_string(), "$9,500");
        assert_eq!(listing.status, ListingStatus::New);
        assert!(listing.images.is_empty());
        assert!(listing.about.is_empty());
    }

    #[test]
    fn top_level_mileage_column_lands_in_about() {
        let listing: Listing =
            serde_json::from_str(r#"{ "id": 3, "title": "Miata", "mileage": 88000 }"#).unwrap();
        assert_eq!(listing.about_value("mileage"), Some("88000"));

        let listing: Listing = serde_json::from_str(
            r#"{ "id": 4, "mileage": "90k", "about": { "mileage": "88,000 miles" } }"#,
        )
        .unwrap();
        assert_eq!(listing.about_value("mileage"), Some("88,000 miles"), "about wins");

        let listing: Listing = serde_json::from_str(
            r#"{ "id": 5, "mileage": "90k", "about": { "mileage": null } }"#,
        )
        .unwrap();
        assert_eq!(listing.about_value("mileage"), Some("90k"));
    }

    #[test]
    fn unknown_status_is_kept_verbatim() {
        let status: ListingStatus = serde_json::from_str(r#""Interested""#).unwrap();
        assert_eq!(status, ListingStatus::Other("Interested".into()));
        assert_eq!(serde_json::to_string(&status).unwrap(), r#""Interested""#);
    }

    #[test]
    fn known_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ListingStatus::Negotiating).unwrap(),
            r#""negotiating""#
        );
    }

    #[test]
    fn price_display() {
        assert_eq!(Price::Amount(15000.0).to_string(), "$15000");
        assert_eq!(Price::Amount(99.5).to_string(), "$99.50");
        assert_eq!(Price::Text("Free".into()).to_string(), "Free");
    }

    #[test]
    fn only_complete_and_error_are_terminal() {
        assert!(TaskPhase::Complete.is_terminal());
        assert!(TaskPhase::Error.is_terminal());
        assert!(!TaskPhase::Initializing.is_terminal());
        assert!(!TaskPhase::Running.is_terminal());
        assert!(!TaskPhase::from("scraping_images".to_string()).is_terminal());
    }

    #[test]
    fn apply_report_updates_phase_and_message() {
        let mut listing = Listing::placeholder("t1", "https://x", "Submitting", 0);
        listing.apply_report(&report(r#"{"status":"running","message":"fetching images"}"#));

        let pending = listing.pending.as_ref().unwrap();
        assert_eq!(pending.phase, TaskPhase::Running);
        assert_eq!(pending.message, "fetching images");
    }

    #[test]
    fn apply_report_never_clears_known_fields() {
        let mut listing = Listing::placeholder("t1", "https://x", "Submitting", 0);
        listing.apply_report(&report(
            r#"{"status":"running","message":"got title",
                "car_data":{"title":"2019 Civic","about":{"mileage":"42k"}}}"#,
        ));
        listing.apply_report(&report(
            r#"{"status":"running",
                "car_data":{"price":15000,"about":{"mileage":null,"color":"Blue"}}}"#,
        ));

        assert_eq!(listing.title, "2019 Civic");
        assert_eq!(listing.price, Some(Price::Amount(15000.0)));
        assert_eq!(listing.about_value("mileage"), Some("42k"));
        assert_eq!(listing.about_value("color"), Some("Blue"));
        assert_eq!(listing.pending.unwrap().message, "got title");
    }
}
