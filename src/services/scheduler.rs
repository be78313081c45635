//! Single-shot and continuous check loops, with graceful shutdown.

use std::future::Future;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use tracing::{info, warn};

use crate::services::check_service::{CheckReport, CheckService};
use crate::services::notification_service::Notifier;
use crate::sources::FeedFetcher;
use crate::storage::{SeenState, StateStore};

/// Process-wide stop request, shared between the loop and the signal listener
#[derive(Clone, Default)]
pub struct Shutdown {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        let (lock, condvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        condvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for up to `timeout`; returns true as soon as shutdown is requested
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, condvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = condvar
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    /// Trigger on SIGINT/SIGTERM (Ctrl+C elsewhere) from a background thread.
    /// A second signal exits the process without waiting for the current check.
    pub fn listen_for_signals(&self) -> std::io::Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let shutdown = self.clone();

        std::thread::Builder::new()
            .name("signal-listener".to_string())
            .spawn(move || {
                runtime.block_on(handle_signals(shutdown, wait_for_signal, || {
                    std::process::exit(FORCED_EXIT_CODE);
                }));
            })?;

        Ok(())
    }
}

/// Exit status after a second interrupt, as shells report for SIGINT
const FORCED_EXIT_CODE: i32 = 130;

async fn handle_signals<S, Fut, X>(shutdown: Shutdown, mut next_signal: S, force_exit: X)
where
    S: FnMut() -> Fut,
    Fut: Future<Output = ()>,
    X: FnOnce(),
{
    next_signal().await;
    info!("Shutdown requested, finishing the current check (signal again to quit now)");
    shutdown.trigger();

    next_signal().await;
    warn!("Second signal received, exiting without finishing the check");
    force_exit();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = sigterm.recv() => {},
                _ = tokio::signal::ctrl_c() => {},
            }
        }
        Err(e) => {
            warn!(error = %e, "Could not install SIGTERM handler, listening for Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

pub struct Scheduler<F: FeedFetcher, N: Notifier, S: StateStore> {
    service: CheckService<F, N, S>,
    interval: Duration,
    shutdown: Shutdown,
}

impl<F: FeedFetcher, N: Notifier, S: StateStore> Scheduler<F, N, S> {
    pub fn new(service: CheckService<F, N, S>, interval: Duration, shutdown: Shutdown) -> Self {
        Self {
            service,
            interval,
            shutdown,
        }
    }

    pub fn run_once(&self, state: &mut SeenState) -> CheckReport {
        self.service.run_check(state)
    }

    /// Check immediately, then every interval until shutdown. Returns ticks run.
    pub fn run_forever(&self, state: &mut SeenState) -> usize {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting continuous mode"
        );
        let mut ticks = 0;

        while !self.shutdown.is_triggered() {
            self.service.run_check(state);
            ticks += 1;

            if self.shutdown.wait_timeout(self.interval) {
                break;
            }
        }

        info!(ticks, "Stopped");
        ticks
    }
}
