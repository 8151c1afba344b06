//! Dataset lookups and startup restore.
//!
//! Lookups run asynchronously (tokio natively, the browser event loop on the
//! web) and report back through the [`QueryResult`] channel, which is drained
//! once per frame.

use super::state::{QueryResult, WordTreeApp};
use crate::lexicon::{normalize_query, Lexicon};
use crate::query::{fetch_dataset, lookup_url, resolve_startup, store_fetch, StartupAction, StartupParams};
use crate::types::Dataset;
use eframe::egui;

impl WordTreeApp {
    /// Builds the app from persisted settings, then restores or fetches a dataset.
    ///
    /// # Arguments
    ///
    /// * `storage` - Persistent storage, if the platform provides one
    /// * `params` - Lexicon and query from the page URL
    pub fn from_storage(storage: Option<&dyn eframe::Storage>, params: &StartupParams) -> Self {
        let mut app = storage
            .and_then(|s| s.get_string(crate::constants::CACHE_KEY_APP_STATE))
            .and_then(|json| match Self::from_json(&json) {
                Ok(app) => Some(app),
                Err(e) => {
                    log::warn!("discarding unreadable app state: {e}");
                    None
                }
            })
            .unwrap_or_default();

        let action = resolve_startup(params, storage);
        app.query.lexicon = action.lexicon();
        match action {
            StartupAction::Fetch { lexicon, query } => {
                app.query.query_text = query.clone();
                app.query.pending_fetch = Some((lexicon, query));
            }
            StartupAction::Restore { json, .. } => {
                app.show_dataset(&json);
            }
            StartupAction::Empty { .. } => {}
        }
        app
    }

    /// Validates the search form and queues a lookup; invalid input is ignored.
    pub fn submit_query(&mut self) {
        match normalize_query(&self.query.query_text) {
            Some(query) => {
                self.query.query_text = query.clone();
                self.query.pending_fetch = Some((self.query.lexicon, query));
                self.status = None;
            }
            None => log::debug!("ignoring invalid query {:?}", self.query.query_text),
        }
    }

    /// Parses a raw dataset and shows it.
    ///
    /// # Returns
    ///
    /// `true` if the dataset replaced the current one.
    pub fn show_dataset(&mut self, json: &str) -> bool {
        let dataset = match Dataset::from_json(json) {
            Ok(dataset) => dataset,
            Err(e) => {
                log::error!("failed to parse dataset: {e}");
                self.status = Some(format!("Invalid dataset: {e}"));
                return false;
            }
        };
        match self.view.load(dataset) {
            Ok(()) => {
                self.canvas.animation = None;
                self.canvas.hovered_label = None;
                self.status = None;
                true
            }
            Err(e) => {
                log::error!("failed to lay out dataset: {e}");
                self.status = Some(format!("Cannot draw tree: {e}"));
                false
            }
        }
    }

    /// Handles finished lookups and starts queued ones.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context for requesting repaints
    /// * `storage` - Where every fetched body is cached, even one that fails to draw
    pub fn handle_pending_queries(
        &mut self,
        ctx: &egui::Context,
        mut storage: Option<&mut (dyn eframe::Storage + 'static)>,
    ) {
        let mut finished = Vec::new();
        if let Some(receiver) = &self.query.receiver {
            while let Ok(result) = receiver.try_recv() {
                finished.push(result);
            }
        }
        for result in finished {
            self.query.in_flight = None;
            match result {
                QueryResult::Fetched {
                    lexicon,
                    query,
                    json,
                } => {
                    log::info!("received {} for {query}", lexicon);
                    if let Some(storage) = storage.as_deref_mut() {
                        store_fetch(storage, lexicon, &json);
                    }
                    if self.show_dataset(&json) {
                        self.query.lexicon = lexicon;
                    }
                }
                QueryResult::Failed { query, error } => {
                    log::error!("lookup of {query} failed: {error}");
                    self.status = Some(format!("Lookup of {query} failed: {error}"));
                }
            }
        }

        if let Some((lexicon, query)) = self.query.pending_fetch.take() {
            self.start_fetch(ctx, lexicon, query);
        }
    }

    fn start_fetch(&mut self, ctx: &egui::Context, lexicon: Lexicon, query: String) {
        let Some(sender) = self.query.sender.clone() else {
            return;
        };
        let url = match lookup_url(lexicon, &query) {
            Ok(url) => url,
            Err(error) => {
                let _ = sender.send(QueryResult::Failed { query, error });
                return;
            }
        };
        self.query.in_flight = Some(query.clone());
        let ctx = ctx.clone();
        let task = async move {
            let result = match fetch_dataset(url).await {
                Ok(json) => QueryResult::Fetched {
                    lexicon,
                    query,
                    json,
                },
                Err(error) => QueryResult::Failed { query, error },
            };
            let _ = sender.send(result);
            ctx.request_repaint();
        };

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(task);

        #[cfg(not(target_arch = "wasm32"))]
        tokio::spawn(task);
    }
}
