//! Carries out [`Effect`]s on the tokio runtime.
//!
//! Each API call is spawned as its own task and reports back with a [`Msg`].
//! Failures go through [`error::report`] so every call site logs and surfaces
//! errors the same way.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

use crate::api::ListingApi;
use crate::effect::Effect;
use crate::error;
use crate::msg::Msg;
use crate::poll::{PollSettings, TaskPoller};

pub struct Dispatcher {
    api: Arc<dyn ListingApi>,
    runtime: Handle,
    tx: UnboundedSender<Msg>,
    poller: TaskPoller,
    refresh_seq: u64,
}

impl Dispatcher {
    pub fn new(
        api: Arc<dyn ListingApi>,
        runtime: Handle,
        tx: UnboundedSender<Msg>,
        settings: PollSettings,
    ) -> Self {
        let poller = TaskPoller::new(Arc::clone(&api), runtime.clone(), tx.clone(), settings);
        Self {
            api,
            runtime,
            tx,
            poller,
            refresh_seq: 0,
        }
    }

    pub fn run_all(&mut self, effects: impl IntoIterator<Item = Effect>) {
        for effect in effects {
            self.run(effect);
        }
    }

    pub fn run(&mut self, effect: Effect) {
        log::debug!("effect: {effect:?}");
        match effect {
            Effect::Refresh => {
                self.refresh_seq += 1;
                let seq = self.refresh_seq;
                self.spawn(move |api, tx| async move {
                    let msg = match api.list_all().await {
                        Ok(listings) => Msg::Listings { seq, listings },
                        Err(err) => Msg::Failed(error::report("Refresh", &err)),
                    };
                    let _ = tx.send(msg);
                });
            }
            Effect::CreateListing {
                provisional_id,
                url,
            } => {
                self.spawn(move |api, tx| async move {
                    let msg = match api.create_from_url(&url).await {
                        Ok(task_id) => {
                            log::info!("created task {task_id} for {url}");
                            Msg::TaskCreated {
                                provisional_id,
                                task_id,
                            }
                        }
                        Err(err) => Msg::CreateFailed {
                            provisional_id,
                            error: error::report("Add car", &err),
                        },
                    };
                    let _ = tx.send(msg);
                });
            }
            Effect::StartPolling {
                task_id,
                generation,
            } => self.poller.start(&task_id, generation),
            Effect::StopPolling { task_id } => {
                self.poller.cancel(&task_id);
            }
            Effect::UpdateStatus { id, status } => {
                self.spawn(move |api, tx| async move {
                    let msg = match api.update_status(&id, &status).await {
                        Ok(()) => Msg::StatusUpdated { id, status },
                        Err(err) => Msg::Failed(error::report("Update status", &err)),
                    };
                    let _ = tx.send(msg);
                });
            }
            Effect::DeleteListing { id } => {
                self.spawn(move |api, tx| async move {
                    let msg = match api.delete_listing(&id).await {
                        Ok(()) => Msg::Deleted { id },
                        Err(err) => Msg::Failed(error::report("Delete", &err)),
                    };
                    let _ = tx.send(msg);
                });
            }
            Effect::OpenUrl { url } => {
                if let Err(err) = open::that_detached(&url) {
                    log::error!("Open {url}: {err}");
                    let _ = self.tx.send(Msg::Failed(format!("Open {url} failed: {err}")));
                }
            }
        }
    }

    /// Housekeeping once per UI tick.
    pub fn tick(&mut self) {
        self.poller.reap();
    }

    /// Number of ingestion tasks still being polled.
    pub fn active_tasks(&self) -> usize {
        self.poller.active()
    }

    fn spawn<F, Fut>(&self, make: F)
    where
        F: FnOnce(Arc<dyn ListingApi>, UnboundedSender<Msg>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.runtime
            .spawn(make(Arc::clone(&self.api), self.tx.clone()));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::api::fake::{listing, report, FakeApi};
    use crate::app::App;
    use crate::listing::{ListingStatus, Price, TaskPhase};
    use crate::poll::PollMsg;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn dispatcher(api: &Arc<FakeApi>) -> (Dispatcher, UnboundedReceiver<Msg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let api: Arc<dyn ListingApi> = api.clone();
        let dispatcher = Dispatcher::new(api, Handle::current(), tx, PollSettings::default());
        (dispatcher, rx)
    }

    /// Feed messages into the app until `done` holds, running every effect
    /// the app asks for along the way.
    async fn drive_until(
        app: &mut App,
        dispatcher: &mut Dispatcher,
        rx: &mut UnboundedReceiver<Msg>,
        mut done: impl FnMut(&App, &Msg) -> bool,
    ) {
        loop {
            let msg = rx.recv().await.expect("channel open");
            let stop = done(app, &msg);
            let effects = app.apply(msg);
            dispatcher.run_all(effects);
            if stop {
                return;
            }
        }
    }

    #[tokio::test]
    async fn refresh_sends_numbered_listings() {
        let api = Arc::new(FakeApi::with_listings(vec![listing("1", "Civic")]));
        let (mut dispatcher, mut rx) = dispatcher(&api);

        dispatcher.run(Effect::Refresh);
        dispatcher.run(Effect::Refresh);

        let mut seqs = Vec::new();
        for _ in 0..2 {
            match rx.recv().await.unwrap() {
                Msg::Listings { seq, listings } => {
                    assert_eq!(listings.len(), 1);
                    seqs.push(seq);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        seqs.sort();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[tokio::test]
    async fn create_failure_is_reported_with_provisional_id() {
        let api = Arc::new(FakeApi::new());
        api.fail_create();
        let (mut dispatcher, mut rx) = dispatcher(&api);

        dispatcher.run(Effect::CreateListing {
            provisional_id: "local-1".into(),
            url: "https://x".into(),
        });

        match rx.recv().await.unwrap() {
            Msg::CreateFailed {
                provisional_id,
                error,
            } => {
                assert_eq!(provisional_id, "local-1");
                assert!(error.starts_with("Add car failed"), "{error}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_status_failure_becomes_failed_message() {
        let api = Arc::new(FakeApi::new());
        let (mut dispatcher, mut rx) = dispatcher(&api);

        dispatcher.run(Effect::UpdateStatus {
            id: "missing".into(),
            status: ListingStatus::Viewed,
        });

        match rx.recv().await.unwrap() {
            Msg::Failed(text) => assert!(text.contains("404"), "{text}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn submit_poll_complete_refresh_scenario() {
        let api = Arc::new(FakeApi::new());
        api.script(
            "t1",
            vec![
                Ok(report(serde_json::json!({ "status": "running", "message": "fetching images" }))),
                Ok(report(serde_json::json!({
                    "status": "complete",
                    "car_data": { "title": "2019 Civic", "price": 15000 }
                }))),
            ],
        );
        let (mut dispatcher, mut rx) = dispatcher(&api);
        let mut app = App::new();

        let effects = app.submit_url("  https://marketplace.example/item/123  ");
        assert_eq!(app.store.len(), 1, "placeholder before any response");
        dispatcher.run_all(effects);

        drive_until(&mut app, &mut dispatcher, &mut rx, |_, msg| {
            matches!(msg, Msg::TaskCreated { .. })
        })
        .await;
        assert_eq!(app.store.items()[0].id, "t1");
        assert_eq!(dispatcher.active_tasks(), 1);

        drive_until(&mut app, &mut dispatcher, &mut rx, |_, msg| {
            matches!(msg, Msg::Poll(PollMsg::Report { .. }))
        })
        .await;
        let record = app.store.get("t1").unwrap();
        let pending = record.pending.as_ref().unwrap();
        assert_eq!(pending.phase, TaskPhase::Running);
        assert_eq!(pending.message, "fetching images");
        assert_eq!(record.url, "https://marketplace.example/item/123");
        assert!(record.title.is_empty());

        // The backend persists the car once the task completes.
        let mut persisted = listing("17", "2019 Civic");
        persisted.price = Some(Price::Amount(15000.0));
        api.set_listings(vec![persisted]);

        drive_until(&mut app, &mut dispatcher, &mut rx, |_, msg| {
            matches!(msg, Msg::Listings { .. })
        })
        .await;

        assert!(app.store.get("t1").is_none(), "placeholder superseded");
        assert_eq!(app.store.len(), 1);
        assert_eq!(app.store.items()[0].id, "17");
        assert!(!app.store.items()[0].is_pending());
        assert_eq!(api.poll_count("t1"), 2);
    }

    #[tokio::test]
    async fn status_update_round_trips_through_refresh() {
        let api = Arc::new(FakeApi::with_listings(vec![listing("1", "Civic")]));
        let (mut dispatcher, mut rx) = dispatcher(&api);
        let mut app = App::new();

        dispatcher.run(Effect::Refresh);
        drive_until(&mut app, &mut dispatcher, &mut rx, |_, msg| {
            matches!(msg, Msg::Listings { .. })
        })
        .await;

        app.select_first();
        app.open_status_picker();
        app.move_picker(1);
        dispatcher.run_all(app.confirm_status());

        drive_until(&mut app, &mut dispatcher, &mut rx, |_, msg| {
            matches!(msg, Msg::Listings { .. })
        })
        .await;

        assert_eq!(app.store.get("1").unwrap().status, ListingStatus::Contacted);
        assert_eq!(
            api.calls(),
            vec!["list_all", "update_status 1 contacted", "list_all"]
        );
    }

    #[tokio::test]
    async fn delete_removes_exactly_that_listing() {
        let api = Arc::new(FakeApi::with_listings(vec![
            listing("1", "Civic"),
            listing("2", "F-150"),
            listing("3", "Miata"),
        ]));
        let (mut dispatcher, mut rx) = dispatcher(&api);
        let mut app = App::new();

        dispatcher.run(Effect::Refresh);
        drive_until(&mut app, &mut dispatcher, &mut rx, |_, msg| {
            matches!(msg, Msg::Listings { .. })
        })
        .await;

        app.select_next();
        app.select_next();
        app.open_delete_confirm();
        dispatcher.run_all(app.confirm_delete());

        drive_until(&mut app, &mut dispatcher, &mut rx, |_, msg| {
            matches!(msg, Msg::Deleted { .. })
        })
        .await;
        let ids: Vec<&str> = app.store.items().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_a_placeholder_cancels_its_poller() {
        let api = Arc::new(FakeApi::new());
        let (mut dispatcher, mut rx) = dispatcher(&api);
        let mut app = App::new();

        dispatcher.run_all(app.submit_url("https://x"));
        drive_until(&mut app, &mut dispatcher, &mut rx, |_, msg| {
            matches!(msg, Msg::TaskCreated { .. })
        })
        .await;
        assert_eq!(dispatcher.active_tasks(), 1);

        app.select_first();
        app.open_delete_confirm();
        dispatcher.run_all(app.confirm_delete());

        assert!(app.store.is_empty());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(dispatcher.active_tasks(), 0);
        assert_eq!(api.poll_count("t1"), 0);
        assert!(!api.calls().iter().any(|c| c.starts_with("delete")));
    }
}
