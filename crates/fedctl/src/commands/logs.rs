//! Logs command - app log lines from the owning backend

use anyhow::Result;
use fedgate::{CancellationToken, FederatedGateway, LogOptions};
use futures::StreamExt;

use crate::output::{LogLine, OutputContext};

pub async fn logs(
    gateway: &FederatedGateway,
    app: &str,
    follow: bool,
    tail: Option<usize>,
    cancel: &CancellationToken,
    ctx: &OutputContext,
) -> Result<()> {
    let opts = LogOptions { tail, follow };
    let mut lines = gateway.app_logs(app, &opts).await?;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            line = lines.next() => match line {
                Some(line) => ctx.print_line(&LogLine(&line)),
                None => break,
            },
        }
    }
    Ok(())
}
