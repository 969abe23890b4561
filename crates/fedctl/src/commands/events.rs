//! Events command - merged snapshot and live event stream

use std::sync::Arc;

use anyhow::Result;
use fedgate::{CancellationToken, EventStreamOptions, FederatedGateway, TracingSink};
use futures::StreamExt;

use crate::output::{EventLine, OutputContext};

/// Print historical events from every backend, then follow live ones
/// until the stream ends or `cancel` fires
pub async fn events(
    gateway: &FederatedGateway,
    follow: bool,
    tail: Option<usize>,
    cancel: &CancellationToken,
    ctx: &OutputContext,
) -> Result<()> {
    let opts = EventStreamOptions {
        tail,
        follow,
        ..Default::default()
    };

    if follow {
        ctx.info("Press Ctrl+C to stop");
    }

    let mut stream = match gateway
        .event_stream(&opts, cancel, Arc::new(TracingSink))
        .await
    {
        Ok(stream) => stream,
        // Ctrl+C while the snapshot loads is a normal stop
        Err(e) if e.is_cancelled() => {
            ctx.info("Cancelled");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut count = 0usize;
    while let Some(event) = stream.next().await {
        ctx.print_line(&EventLine(&event));
        count += 1;
    }

    if stream.is_cancelled() {
        ctx.info("\nStopping event stream...");
    }
    stream.shutdown().await;
    ctx.success(&format!("{} event(s)", count));
    Ok(())
}
