use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::SourceError;
use crate::models::{AnalyticsView, StatsSnapshot};
use crate::source::{self, LogSource};

/// Stats card refresh.
pub const PERSONNEL_STATS_PERIOD: Duration = Duration::from_secs(5);
/// Analytics header and charts refresh.
pub const ANALYTICS_PERIOD: Duration = Duration::from_secs(30);

/// Periodic pull of a snapshot. Each success replaces the last value; a
/// failure is logged and leaves the last good value in place. The task is
/// aborted on [`Poller::stop`] or drop.
pub struct Poller<T> {
    rx: watch::Receiver<Option<T>>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Clone + Send + Sync + 'static> Poller<T> {
    /// Fetch once immediately, then every `period`.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, SourceError>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match fetch().await {
                    Ok(value) => {
                        if tx.send(Some(value)).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(poller = name, error = %e, "poll failed, keeping last snapshot"),
                }
            }
        });
        Self {
            rx,
            handle: Some(handle),
        }
    }

    /// Last good snapshot, if any poll has succeeded yet.
    pub fn latest(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    /// A receiver that wakes on every successful poll.
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.rx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

pub fn stats_poller<S: LogSource + 'static>(source: Arc<S>, period: Duration) -> Poller<StatsSnapshot> {
    Poller::spawn("stats", period, move || {
        let source = Arc::clone(&source);
        async move { source::fetch_stats(&*source).await }
    })
}

pub fn analytics_poller<S: LogSource + 'static>(source: Arc<S>, period: Duration) -> Poller<AnalyticsView> {
    Poller::spawn("analytics", period, move || {
        let source = Arc::clone(&source);
        async move { source::fetch_analytics_view(&*source).await }
    })
}
