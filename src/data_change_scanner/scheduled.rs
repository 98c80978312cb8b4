//! Optional periodic wrapper around the Data-Change Scanner (§4.7, §1.1).
//! Built on a `ScheduledTask`/`ScheduledExecutor` idiom: an
//! `Arc<AtomicBool>` shutdown flag checked around a `tokio::time::sleep`
//! loop. Not the out-of-scope DAG orchestrator — a convenience wrapper
//! around a single scan operation callers may ignore.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A handle to a running periodic scan; dropping it does not stop the scan,
/// call [`ScheduledScanHandle::stop`] explicitly.
#[derive(Clone)]
pub struct ScheduledScanHandle {
    shutdown: Arc<AtomicBool>,
}

impl ScheduledScanHandle {
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

/// Runs `scan_once` every `interval`, until [`ScheduledScanHandle::stop`] is
/// called. `scan_once` is responsible for logging its own failures; this
/// loop never stops on a scan error, only on an explicit stop signal.
pub fn run_periodic_scan<F, Fut>(interval: Duration, mut scan_once: F) -> ScheduledScanHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let shutdown = Arc::new(AtomicBool::new(false));
    let handle = ScheduledScanHandle { shutdown: shutdown.clone() };

    tokio::spawn(async move {
        while !shutdown.load(Ordering::SeqCst) {
            scan_once().await;

            let mut remaining = interval;
            let step = Duration::from_millis(250);
            while remaining > Duration::ZERO {
                if shutdown.load(Ordering::SeqCst) {
                    return;
                }
                let sleep_for = step.min(remaining);
                tokio::time::sleep(sleep_for).await;
                remaining = remaining.saturating_sub(sleep_for);
            }
        }
    });

    handle
}
