//! # Bulk Price Refresh
//!
//! Walks a queue of components that carry a vendor link, asks the price
//! source for each one in turn, and stores the new prices.
//!
//! ## Item State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Refresh Item States                               │
//! │                                                                         │
//! │   Pending ──► Updating ──┬──► Success  (old price, new price stored)    │
//! │                          └──► Error    (message, batch continues)       │
//! │                                                                         │
//! │  Items left Pending after a cancellation were never attempted.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Run Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Idle ──► Running{0} ──► Running{1} ──► ... ──► Done                    │
//! │                │              │                                         │
//! │                └──────────────┴──► Cancelled   (token checked before    │
//! │                                                 each item; the item in  │
//! │                                                 flight always finishes) │
//! │                                                                         │
//! │  Items run strictly one after another so a single lookup service is    │
//! │  never hit concurrently. Every lookup is bounded by the configured     │
//! │  timeout.                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use atelier_core::text::same_name;
use atelier_core::{Component, UNCATEGORIZED};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{PricingError, PricingResult};
use crate::source::PriceSource;

// =============================================================================
// Item and Run State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Updating,
    Success,
    Error,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Pending => write!(f, "pending"),
            ItemStatus::Updating => write!(f, "updating"),
            ItemStatus::Success => write!(f, "success"),
            ItemStatus::Error => write!(f, "error"),
        }
    }
}

/// One component in the refresh queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshItem {
    pub component_id: String,
    pub name: String,
    pub link: String,
    pub status: ItemStatus,
    pub old_price: Decimal,
    pub new_price: Option<Decimal>,
    pub error: Option<String>,
}

impl RefreshItem {
    /// Queue entry for a component. `None` when it has no vendor link.
    pub fn from_component(component: &Component) -> Option<Self> {
        let link = component.link.as_deref().map(str::trim).filter(|l| !l.is_empty())?;
        Some(RefreshItem {
            component_id: component.id.clone(),
            name: component.name.clone(),
            link: link.to_string(),
            status: ItemStatus::Pending,
            old_price: component.price,
            new_price: None,
            error: None,
        })
    }
}

/// Where the runner is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    /// Working on the item at `index`.
    Running { index: usize },
    Cancelled,
    Done,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running { .. })
    }
}

/// Progress notifications sent while a run is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    Started { total: usize },
    /// An item changed state. Sent once when it starts and once when it
    /// settles.
    Item { index: usize, item: RefreshItem },
    Finished { state: RunState },
}

/// Outcome of a run: every queued item, attempted or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshReport {
    pub state: RunState,
    pub items: Vec<RefreshItem>,
}

impl RefreshReport {
    fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|item| item.status == status).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(ItemStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(ItemStatus::Error)
    }

    /// Items never attempted.
    pub fn skipped(&self) -> usize {
        self.count(ItemStatus::Pending)
    }

    pub fn was_cancelled(&self) -> bool {
        self.state == RunState::Cancelled
    }
}

// =============================================================================
// Queue Selection
// =============================================================================

/// Components to refresh: those with a link, optionally limited to one
/// category. [`UNCATEGORIZED`] selects components with no category.
pub fn select_queue(components: &[Component], category: Option<&str>) -> Vec<RefreshItem> {
    components
        .iter()
        .filter(|component| match category {
            None => true,
            Some(wanted) if same_name(wanted, UNCATEGORIZED) => component.category.trim().is_empty(),
            Some(wanted) => same_name(&component.category, wanted),
        })
        .filter_map(RefreshItem::from_component)
        .collect()
}

// =============================================================================
// Component Store Seam
// =============================================================================

/// Where component prices are read from and written to.
#[async_trait]
pub trait ComponentPriceStore: Send + Sync {
    async fn list_components(&self) -> PricingResult<Vec<Component>>;

    async fn store_price(&self, component_id: &str, price: Decimal) -> PricingResult<()>;
}

#[async_trait]
impl ComponentPriceStore for atelier_db::Database {
    async fn list_components(&self) -> PricingResult<Vec<Component>> {
        Ok(self.components().list().await?)
    }

    async fn store_price(&self, component_id: &str, price: Decimal) -> PricingResult<()> {
        self.components().update_price(component_id, price).await?;
        Ok(())
    }
}

// =============================================================================
// Price Refresh Runner
// =============================================================================

/// Drives one refresh at a time.
pub struct PriceRefresh {
    source: Arc<dyn PriceSource>,
    store: Arc<dyn ComponentPriceStore>,
    timeout: Duration,
    state_tx: watch::Sender<RunState>,
    events: Option<mpsc::Sender<RefreshEvent>>,
}

impl PriceRefresh {
    pub fn new(
        source: Arc<dyn PriceSource>,
        store: Arc<dyn ComponentPriceStore>,
        timeout: Duration,
    ) -> Self {
        let (state_tx, _) = watch::channel(RunState::Idle);
        PriceRefresh {
            source,
            store,
            timeout,
            state_tx,
            events: None,
        }
    }

    /// Sends progress events to `events` during each run.
    pub fn with_events(mut self, events: mpsc::Sender<RefreshEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> RunState {
        *self.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state_tx.subscribe()
    }

    /// Loads the components and builds the queue for `category`.
    pub async fn queue(&self, category: Option<&str>) -> PricingResult<Vec<RefreshItem>> {
        let components = self.store.list_components().await?;
        Ok(select_queue(&components, category))
    }

    /// Processes `items` in order until the queue is exhausted or `cancel`
    /// fires. A failing item is recorded and the run moves on.
    #[instrument(skip_all, fields(total = items.len()))]
    pub async fn run(
        &self,
        mut items: Vec<RefreshItem>,
        cancel: CancellationToken,
    ) -> PricingResult<RefreshReport> {
        // Claimed before the first await so two callers cannot both start.
        let claimed = self.state_tx.send_if_modified(|state| {
            if state.is_running() {
                return false;
            }
            *state = RunState::Running { index: 0 };
            true
        });
        if !claimed {
            return Err(PricingError::AlreadyRunning);
        }

        info!("Price refresh started");
        self.emit(RefreshEvent::Started { total: items.len() }).await;

        let mut state = RunState::Done;
        for index in 0..items.len() {
            if cancel.is_cancelled() {
                state = RunState::Cancelled;
                break;
            }
            self.state_tx.send_replace(RunState::Running { index });

            items[index].status = ItemStatus::Updating;
            self.emit(RefreshEvent::Item { index, item: items[index].clone() }).await;

            let item = &mut items[index];
            match self.refresh_item(item).await {
                Ok(price) => {
                    debug!(id = %item.component_id, old = %item.old_price, new = %price, "Price refreshed");
                    item.status = ItemStatus::Success;
                    item.new_price = Some(price);
                }
                Err(err) => {
                    warn!(id = %item.component_id, error = %err, "Price refresh failed");
                    item.status = ItemStatus::Error;
                    item.error = Some(err.to_string());
                }
            }
            self.emit(RefreshEvent::Item { index, item: items[index].clone() }).await;
        }

        self.state_tx.send_replace(state);
        self.emit(RefreshEvent::Finished { state }).await;

        let report = RefreshReport { state, items };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped(),
            cancelled = report.was_cancelled(),
            "Price refresh finished"
        );
        Ok(report)
    }

    async fn refresh_item(&self, item: &RefreshItem) -> PricingResult<Decimal> {
        let price = tokio::time::timeout(self.timeout, self.source.fetch_price(&item.link))
            .await
            .map_err(|_| PricingError::Timeout(self.timeout.as_secs()))??;
        self.store.store_price(&item.component_id, price).await?;
        Ok(price)
    }

    async fn emit(&self, event: RefreshEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = events.send(event).await;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    fn component(id: &str, category: &str, link: Option<&str>, price: i64) -> Component {
        let mut doc = json!({ "id": id, "name": format!("Comp {id}"), "category": category, "price": price });
        if let Some(link) = link {
            doc["link"] = json!(link);
        }
        serde_json::from_value(doc).unwrap()
    }

    /// Answers from a fixed table; unknown links fail like a missing marker.
    struct FakeSource {
        prices: HashMap<String, Decimal>,
        cancel_on: Option<(String, CancellationToken)>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(prices: &[(&str, i64)]) -> Self {
            FakeSource {
                prices: prices
                    .iter()
                    .map(|(link, price)| (link.to_string(), Decimal::from(*price)))
                    .collect(),
                cancel_on: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PriceSource for FakeSource {
        async fn fetch_price(&self, link: &str) -> PricingResult<Decimal> {
            self.calls.lock().await.push(link.to_string());
            if let Some((trigger, token)) = &self.cancel_on {
                if trigger == link {
                    token.cancel();
                }
            }
            self.prices
                .get(link)
                .copied()
                .ok_or_else(|| PricingError::Service("Precio no encontrado".into()))
        }
    }

    /// Never answers.
    struct StalledSource;

    #[async_trait]
    impl PriceSource for StalledSource {
        async fn fetch_price(&self, _link: &str) -> PricingResult<Decimal> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Decimal::ONE)
        }
    }

    #[derive(Default)]
    struct FakeStore {
        components: Vec<Component>,
        stored: Mutex<HashMap<String, Decimal>>,
    }

    #[async_trait]
    impl ComponentPriceStore for FakeStore {
        async fn list_components(&self) -> PricingResult<Vec<Component>> {
            Ok(self.components.clone())
        }

        async fn store_price(&self, component_id: &str, price: Decimal) -> PricingResult<()> {
            self.stored.lock().await.insert(component_id.to_string(), price);
            Ok(())
        }
    }

    fn three_items() -> Vec<Component> {
        vec![
            component("a", "telas", Some("https://v/a"), 100),
            component("b", "telas", Some("https://v/b"), 200),
            component("c", "herrajes", Some("https://v/c"), 300),
        ]
    }

    #[test]
    fn test_select_queue() {
        let components = vec![
            component("a", "telas", Some("https://v/a"), 1),
            component("b", "Telas", None, 1),
            component("c", "", Some("https://v/c"), 1),
            component("d", "herrajes", Some("  "), 1),
            component("e", "herrajes", Some("https://v/e"), 1),
        ];

        let ids = |items: Vec<RefreshItem>| items.into_iter().map(|i| i.component_id).collect::<Vec<_>>();

        assert_eq!(ids(select_queue(&components, None)), vec!["a", "c", "e"]);
        assert_eq!(ids(select_queue(&components, Some("TELAS"))), vec!["a"]);
        assert_eq!(ids(select_queue(&components, Some(UNCATEGORIZED))), vec!["c"]);
        assert!(select_queue(&components, Some("mercería")).is_empty());
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_batch() {
        let store = Arc::new(FakeStore { components: three_items(), ..FakeStore::default() });
        let source = Arc::new(FakeSource::new(&[("https://v/a", 110), ("https://v/c", 330)]));
        let refresh = PriceRefresh::new(source.clone(), store.clone(), Duration::from_secs(15));

        let queue = refresh.queue(None).await.unwrap();
        let report = refresh.run(queue, CancellationToken::new()).await.unwrap();

        let statuses: Vec<ItemStatus> = report.items.iter().map(|i| i.status).collect();
        assert_eq!(statuses, vec![ItemStatus::Success, ItemStatus::Error, ItemStatus::Success]);
        assert_eq!(report.state, RunState::Done);
        assert_eq!(report.items[0].old_price, Decimal::from(100));
        assert_eq!(report.items[0].new_price, Some(Decimal::from(110)));
        assert_eq!(report.items[1].new_price, None);
        assert!(report.items[1].error.as_deref().unwrap().contains("Precio no encontrado"));

        let stored = store.stored.lock().await;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored["c"], Decimal::from(330));
        assert_eq!(source.calls.lock().await.len(), 3);
        assert_eq!(refresh.state(), RunState::Done);
    }

    #[tokio::test]
    async fn test_cancel_stops_after_item_in_flight() {
        let store = Arc::new(FakeStore { components: three_items(), ..FakeStore::default() });
        let cancel = CancellationToken::new();
        let mut source = FakeSource::new(&[("https://v/a", 1), ("https://v/b", 2), ("https://v/c", 3)]);
        source.cancel_on = Some(("https://v/a".into(), cancel.clone()));
        let source = Arc::new(source);
        let refresh = PriceRefresh::new(source.clone(), store.clone(), Duration::from_secs(15));

        let queue = select_queue(&three_items(), None);
        let report = refresh.run(queue, cancel).await.unwrap();

        assert!(report.was_cancelled());
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.skipped(), 2);
        assert_eq!(*source.calls.lock().await, vec!["https://v/a".to_string()]);
        assert_eq!(refresh.state(), RunState::Cancelled);
    }

    #[tokio::test]
    async fn test_events_follow_item_states() {
        let store = Arc::new(FakeStore::default());
        let source = Arc::new(FakeSource::new(&[]));
        let (tx, mut rx) = mpsc::channel(16);
        let refresh = PriceRefresh::new(source, store, Duration::from_secs(15)).with_events(tx);

        let queue = select_queue(&[component("a", "telas", Some("https://v/a"), 5)], None);
        refresh.run(queue, CancellationToken::new()).await.unwrap();
        drop(refresh);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], RefreshEvent::Started { total: 1 });
        assert!(matches!(&events[1], RefreshEvent::Item { item, .. } if item.status == ItemStatus::Updating));
        assert!(matches!(&events[2], RefreshEvent::Item { item, .. } if item.status == ItemStatus::Error));
        assert_eq!(events[3], RefreshEvent::Finished { state: RunState::Done });
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_timeout_is_an_item_error() {
        let store = Arc::new(FakeStore::default());
        let refresh = PriceRefresh::new(Arc::new(StalledSource), store.clone(), Duration::from_secs(15));

        let queue = select_queue(&[component("a", "telas", Some("https://v/a"), 5)], None);
        let report = refresh.run(queue, CancellationToken::new()).await.unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.items[0].error.as_deref(),
            Some("Lookup timeout after 15 seconds")
        );
        assert!(store.stored.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_second_run_is_rejected_while_first_waits_on_events() {
        let store = Arc::new(FakeStore::default());
        let source = Arc::new(FakeSource::new(&[("https://v/a", 7)]));
        let (tx, mut rx) = mpsc::channel(1);
        // A full channel makes the first run wait before its first event.
        tx.send(RefreshEvent::Started { total: 0 }).await.unwrap();
        let refresh = PriceRefresh::new(source.clone(), store, Duration::from_secs(15)).with_events(tx);
        let queue = select_queue(&[component("a", "telas", Some("https://v/a"), 5)], None);

        let (first, second) = tokio::join!(
            refresh.run(queue.clone(), CancellationToken::new()),
            async {
                let second = refresh.run(queue.clone(), CancellationToken::new()).await;
                for _ in 0..5 {
                    rx.recv().await.unwrap();
                }
                second
            }
        );

        assert!(matches!(second, Err(PricingError::AlreadyRunning)));
        assert_eq!(first.unwrap().succeeded(), 1);
        assert_eq!(source.calls.lock().await.len(), 1);
        assert_eq!(refresh.state(), RunState::Done);
    }

    #[tokio::test]
    async fn test_empty_queue() {
        let refresh = PriceRefresh::new(
            Arc::new(FakeSource::new(&[])),
            Arc::new(FakeStore::default()),
            Duration::from_secs(1),
        );
        let report = refresh.run(Vec::new(), CancellationToken::new()).await.unwrap();
        assert_eq!(report.state, RunState::Done);
        assert!(report.items.is_empty());
    }
}
