//! # Price Refresh Command
//!
//! Runs the bulk refresh in the foreground, printing each item as it
//! settles. Ctrl-C stops the run after the item in flight.

use std::sync::Arc;

use atelier_pricing::{HttpPriceSource, ItemStatus, PriceRefresh, RefreshEvent, RefreshReport};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{money, Context};
use crate::error::CliResult;

pub async fn refresh_prices(ctx: &Context, category: Option<&str>) -> CliResult<()> {
    let source = Arc::new(HttpPriceSource::new(&ctx.config.lookup)?);
    let (events_tx, mut events_rx) = mpsc::channel(32);
    let refresh = PriceRefresh::new(source, Arc::new(ctx.db.clone()), ctx.config.timeout())
        .with_events(events_tx);

    let queue = refresh.queue(category).await?;
    if queue.is_empty() {
        if !ctx.json {
            println!("No components with a vendor link to refresh");
        }
        return ctx.emit(
            &RefreshReport {
                state: refresh.state(),
                items: Vec::new(),
            },
            |_| {},
        );
    }

    let cancel = CancellationToken::new();
    let ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping after the current item");
                cancel.cancel();
            }
        }
    });

    let show_progress = !ctx.json;
    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if show_progress {
                print_event(&event);
            }
        }
    });

    let result = refresh.run(queue, cancel).await;
    // Closing the sender ends the printer loop.
    drop(refresh);
    let _ = printer.await;
    ctrl_c.abort();

    let report = result?;
    ctx.emit(&report, |r| {
        println!(
            "{} updated, {} failed, {} not attempted{}",
            r.succeeded(),
            r.failed(),
            r.skipped(),
            if r.was_cancelled() { " (cancelled)" } else { "" }
        );
    })
}

fn print_event(event: &RefreshEvent) {
    match event {
        RefreshEvent::Started { total } => println!("Refreshing {total} component(s)..."),
        RefreshEvent::Item { index, item } => match item.status {
            ItemStatus::Success => println!(
                "  [{:>3}] ✓ {:<32} {:>12} → {:>12}",
                index + 1,
                item.name,
                money(item.old_price),
                item.new_price.map(money).unwrap_or_default()
            ),
            ItemStatus::Error => println!(
                "  [{:>3}] ✗ {:<32} {}",
                index + 1,
                item.name,
                item.error.as_deref().unwrap_or("unknown error")
            ),
            ItemStatus::Pending | ItemStatus::Updating => {}
        },
        RefreshEvent::Finished { .. } => {}
    }
}
