use std::collections::HashSet;

use chrono::{DateTime, Local};
use ratatui::widgets::ListState;

use crate::effect::Effect;
use crate::listing::{Listing, ListingStatus, ListingStore, MergeOutcome, TaskPhase};
use crate::msg::Msg;
use crate::poll::PollMsg;

/// Which overlay, if any, is on top of the listing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    /// Typing a marketplace URL to submit.
    AddUrl { input: String },
    /// Detail modal for one listing.
    Detail { id: String },
    /// Status picker; `index` points into [`ListingStatus::CHOICES`].
    PickStatus { id: String, index: usize },
    ConfirmDelete { id: String },
}

pub struct App {
    /// Listings in display order, placeholders first.
    pub store: ListingStore,
    /// List selection state for scrolling.
    pub list_state: ListState,
    pub mode: Mode,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last status-bar message.
    pub status: String,
    /// At least one refresh has succeeded.
    pub loaded: bool,
    pub last_refreshed: Option<DateTime<Local>>,
    /// Newest refresh applied; older responses are dropped.
    last_refresh_seq: u64,
    next_local_id: u64,
    /// Provisional ids whose `/add_car` call has not answered yet.
    awaiting_task: HashSet<String>,
    /// Provisional ids dismissed before their task id arrived.
    dismissed: HashSet<String>,
}

impl App {
    pub fn new() -> Self {
        Self {
            store: ListingStore::new(),
            list_state: ListState::default(),
            mode: Mode::Browse,
            quit: false,
            status: "Starting…".into(),
            loaded: false,
            last_refreshed: None,
            last_refresh_seq: 0,
            next_local_id: 0,
            awaiting_task: HashSet::new(),
            dismissed: HashSet::new(),
        }
    }

    pub fn selected(&self) -> Option<&Listing> {
        self.list_state
            .selected()
            .and_then(|i| self.store.items().get(i))
    }

    /// Placeholders still waiting on their task.
    pub fn pending_count(&self) -> usize {
        self.store.items().iter().filter(|l| l.is_pending()).count()
    }

    // -- intents -------------------------------------------------------------

    /// Submit a marketplace URL.  A placeholder appears immediately; it takes
    /// the task id once the backend answers.
    pub fn submit_url(&mut self, raw: &str) -> Vec<Effect> {
        let url = raw.trim();
        if url.is_empty() {
            return Vec::new();
        }

        self.next_local_id += 1;
        let provisional_id = format!("local-{}", self.next_local_id);
        self.store
            .prepend_placeholder(&provisional_id, url, "Submitting listing…");
        // Keep the cursor on the same listing after the insert.
        if let Some(i) = self.list_state.selected() {
            self.list_state.select(Some(i + 1));
        }
        self.status = format!("Submitting {url}");
        self.awaiting_task.insert(provisional_id.clone());

        vec![Effect::CreateListing {
            provisional_id,
            url: url.to_string(),
        }]
    }

    /// Open the marketplace page of the listing in the detail modal, or of
    /// the selected one, in the system browser.
    pub fn open_listing_url(&mut self) -> Vec<Effect> {
        let listing = match &self.mode {
            Mode::Detail { id } => self.store.get(id),
            _ => self.selected(),
        };
        let Some(url) = listing
            .map(|l| l.url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string)
        else {
            return Vec::new();
        };
        self.status = format!("Opening {url}");
        vec![Effect::OpenUrl { url }]
    }

    pub fn refresh(&mut self) -> Vec<Effect> {
        self.status = "Refreshing…".into();
        vec![Effect::Refresh]
    }

    // -- overlays ------------------------------------------------------------

    pub fn open_add_url(&mut self) {
        self.mode = Mode::AddUrl {
            input: String::new(),
        };
    }

    /// Submit whatever is in the URL box and close it.
    pub fn confirm_add_url(&mut self) -> Vec<Effect> {
        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::AddUrl { input } => self.submit_url(&input),
            other => {
                self.mode = other;
                Vec::new()
            }
        }
    }

    pub fn open_detail(&mut self) {
        if let Some(id) = self.selected().map(|l| l.id.clone()) {
            self.mode = Mode::Detail { id };
        }
    }

    pub fn open_status_picker(&mut self) {
        let Some((id, index, pending)) = self.selected().map(|listing| {
            let index = ListingStatus::CHOICES
                .iter()
                .position(|s| *s == listing.status)
                .unwrap_or(0);
            (listing.id.clone(), index, listing.is_pending())
        }) else {
            return;
        };
        if pending {
            self.status = "Still ingesting; status can be set once it is saved".into();
            return;
        }
        self.mode = Mode::PickStatus { id, index };
    }

    /// Move the picker cursor by `delta`, clamped to the choices.
    pub fn move_picker(&mut self, delta: isize) {
        if let Mode::PickStatus { index, .. } = &mut self.mode {
            let last = ListingStatus::CHOICES.len() - 1;
            *index = index.saturating_add_signed(delta).min(last);
        }
    }

    pub fn confirm_status(&mut self) -> Vec<Effect> {
        let Mode::PickStatus { id, index } = std::mem::replace(&mut self.mode, Mode::Browse)
        else {
            return Vec::new();
        };
        let status = ListingStatus::CHOICES[index].clone();
        match self.store.get(&id) {
            Some(listing) if listing.status == status => Vec::new(),
            Some(_) => {
                self.status = format!("Setting status to {}…", status.label());
                vec![Effect::UpdateStatus { id, status }]
            }
            None => Vec::new(),
        }
    }

    pub fn open_delete_confirm(&mut self) {
        if let Some(id) = self.selected().map(|l| l.id.clone()) {
            self.mode = Mode::ConfirmDelete { id };
        }
    }

    /// Delete the listing awaiting confirmation.
    ///
    /// Placeholders were never persisted, so they are dropped locally and
    /// their poll loop is cancelled instead of calling the backend.  One
    /// still waiting for its task id is remembered so polling never starts.
    pub fn confirm_delete(&mut self) -> Vec<Effect> {
        let Mode::ConfirmDelete { id } = std::mem::replace(&mut self.mode, Mode::Browse) else {
            return Vec::new();
        };
        match self.store.get(&id) {
            Some(listing) if listing.is_pending() => {
                self.remove_listing(&id);
                self.status = "Dismissed pending listing".into();
                if self.awaiting_task.contains(&id) {
                    self.dismissed.insert(id);
                    Vec::new()
                } else {
                    vec![Effect::StopPolling { task_id: id }]
                }
            }
            Some(_) => {
                self.status = "Deleting…".into();
                vec![Effect::DeleteListing { id }]
            }
            None => Vec::new(),
        }
    }

    pub fn close_overlay(&mut self) {
        self.mode = Mode::Browse;
    }

    // -- messages ------------------------------------------------------------

    /// Fold one background result into the state.  Returns follow-up effects.
    pub fn apply(&mut self, msg: Msg) -> Vec<Effect> {
        match msg {
            Msg::Listings { seq, listings } => {
                if seq <= self.last_refresh_seq {
                    log::debug!("dropping out-of-order refresh #{seq}");
                    return Vec::new();
                }
                self.last_refresh_seq = seq;
                self.loaded = true;
                self.last_refreshed = Some(Local::now());
                self.status = format!("Loaded {} cars", listings.len());
                self.store.replace_all(listings);
                self.clamp_selection();
                Vec::new()
            }
            Msg::TaskCreated {
                provisional_id,
                task_id,
            } => {
                self.awaiting_task.remove(&provisional_id);
                if self.dismissed.remove(&provisional_id) {
                    log::info!("task {task_id} belongs to a dismissed listing; not polling");
                    return Vec::new();
                }
                let generation = if self.store.rekey(&provisional_id, &task_id) {
                    self.rename_overlay(&provisional_id, &task_id);
                    self.store
                        .get(&task_id)
                        .and_then(|l| l.pending.as_ref())
                        .map_or(self.store.generation(), |p| p.generation)
                } else {
                    log::debug!("placeholder {provisional_id} gone before task {task_id} started");
                    self.store.generation()
                };
                self.status = format!("Task {task_id} started");
                vec![Effect::StartPolling {
                    task_id,
                    generation,
                }]
            }
            Msg::CreateFailed {
                provisional_id,
                error,
            } => {
                self.awaiting_task.remove(&provisional_id);
                self.dismissed.remove(&provisional_id);
                if self.store.get(&provisional_id).is_some_and(Listing::is_pending) {
                    self.remove_listing(&provisional_id);
                }
                self.status = error;
                Vec::new()
            }
            Msg::StatusUpdated { id, status } => {
                log::info!("listing {id} is now {status}");
                self.status = format!("Status set to {}", status.label());
                vec![Effect::Refresh]
            }
            Msg::Deleted { id } => {
                log::info!("deleted listing {id}");
                self.remove_listing(&id);
                self.status = "Deleted".into();
                vec![Effect::Refresh]
            }
            Msg::Poll(poll) => self.apply_poll(poll),
            Msg::Failed(error) => {
                self.status = error;
                Vec::new()
            }
        }
    }

    fn apply_poll(&mut self, msg: PollMsg) -> Vec<Effect> {
        match msg {
            PollMsg::Report {
                task_id,
                generation,
                report,
            } => {
                match self.store.merge_by_id(&task_id, generation, &report) {
                    MergeOutcome::Applied => {}
                    MergeOutcome::Missing => {
                        log::debug!("task {task_id}: no placeholder to update");
                    }
                    MergeOutcome::Stale => {
                        log::info!("task {task_id}: dropped update for superseded generation {generation}");
                    }
                }
                match report.status {
                    TaskPhase::Complete => {
                        self.status = format!("Task {task_id} complete; refreshing shortly");
                    }
                    TaskPhase::Error => {
                        let detail = report.message.as_deref().unwrap_or("no details");
                        self.status = format!("Task {task_id} failed: {detail}");
                    }
                    _ => {}
                }
                Vec::new()
            }
            PollMsg::RefreshDue { task_id } => {
                log::debug!("refresh after task {task_id}");
                vec![Effect::Refresh]
            }
            PollMsg::Failed { error, .. } => {
                self.status = error;
                Vec::new()
            }
        }
    }

    /// Keep an open overlay pointing at a placeholder that was just rekeyed.
    fn rename_overlay(&mut self, old: &str, new: &str) {
        match &mut self.mode {
            Mode::Detail { id } | Mode::PickStatus { id, .. } | Mode::ConfirmDelete { id }
                if *id == old =>
            {
                *id = new.to_string();
            }
            _ => {}
        }
    }

    /// Remove one record, keeping the cursor on the listing it was on.
    fn remove_listing(&mut self, id: &str) {
        let Some(index) = self.store.items().iter().position(|l| l.id == id) else {
            return;
        };
        self.store.remove_by_id(id);
        if let Some(selected) = self.list_state.selected() {
            if selected > index {
                self.list_state.select(Some(selected - 1));
            }
        }
        self.clamp_selection();
    }

    /// Fix the selection and drop overlays whose listing vanished.
    fn clamp_selection(&mut self) {
        let len = self.store.len();
        match self.list_state.selected() {
            Some(_) if len == 0 => self.list_state.select(None),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            _ => {}
        }

        let orphaned = match &self.mode {
            Mode::Detail { id } | Mode::PickStatus { id, .. } | Mode::ConfirmDelete { id } => {
                self.store.get(id).is_none()
            }
            Mode::Browse | Mode::AddUrl { .. } => false,
        };
        if orphaned {
            self.mode = Mode::Browse;
        }
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.store.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.store.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.store.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.store.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.store.is_empty() {
            self.list_state.select(Some(self.store.len() - 1));
        }
    }
}
