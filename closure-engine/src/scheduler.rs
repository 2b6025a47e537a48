// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::sync::Arc;
use std::time::Duration;

use log::info;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::MonitoringService;

/// Drives the closure pipeline: one catch-up pass immediately, then one pass
/// per `interval` until cancellation. The token is only observed between
/// passes, so a pass in flight always runs to completion.
pub fn spawn_monitor_loop(
    service: Arc<MonitoringService>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("transaction monitor loop starting");
        while !cancel.is_cancelled() {
            service.close_completed_transactions().await;
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(interval) => {}
            }
        }
        info!("transaction monitor loop stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::{CapturingSink, StubReader};

    fn service(reader: Arc<StubReader>) -> Arc<MonitoringService> {
        Arc::new(MonitoringService::with_sink(
            reader,
            Arc::new(CapturingSink::default()),
            "Annotations",
            60,
            60,
        ))
    }

    #[tokio::test]
    async fn runs_catch_up_pass_immediately_and_stops_on_cancel() {
        let reader = Arc::new(StubReader::default());
        let cancel = CancellationToken::new();
        // one-hour interval: only the immediate pass can run
        let handle = spawn_monitor_loop(
            service(Arc::clone(&reader)),
            Duration::from_secs(3600),
            cancel.clone(),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(reader.latest_event_calls(), 1);

        cancel.cancel();
        handle.await.expect("loop joins after cancel");
    }

    #[tokio::test]
    async fn ticks_repeatedly_until_cancelled() {
        let reader = Arc::new(StubReader::default());
        let cancel = CancellationToken::new();
        let handle = spawn_monitor_loop(
            service(Arc::clone(&reader)),
            Duration::from_millis(10),
            cancel.clone(),
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        handle.await.expect("loop joins after cancel");
        assert!(reader.latest_event_calls() >= 2);
    }
}
