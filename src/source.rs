use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SourceError;
use crate::models::{AnalyticsSnapshot, AnalyticsView, LogRecord, StatsSnapshot};

pub const STATS_PATH: &str = "/stats";
pub const ANALYTICS_PATH: &str = "/analytics/data";
pub const VIDEO_FEED_PATH: &str = "/video_feed";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Read-only access to the detection service. Implementations return the
/// decoded JSON body of a GET on `path`.
pub trait LogSource: Send + Sync {
    fn get_json(&self, path: &str) -> impl Future<Output = Result<Value, SourceError>> + Send;

    /// Base URL that image and stream paths are resolved against.
    fn base_url(&self) -> &str;
}

pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("idintel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| SourceError::Network {
                url: base_url.to_string(),
                source,
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl LogSource for HttpSource {
    async fn get_json(&self, path: &str) -> Result<Value, SourceError> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| SourceError::Network {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = resp.text().await.map_err(|source| SourceError::Network {
            url: url.clone(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|source| SourceError::Decode { path: url, source })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

async fn get_typed<T: DeserializeOwned, S: LogSource + ?Sized>(
    source: &S,
    path: &str,
) -> Result<T, SourceError> {
    let body = source.get_json(path).await?;
    serde_json::from_value(body).map_err(|e| SourceError::Decode {
        path: path.to_string(),
        source: e,
    })
}

/// Fetch the complete collection for one log type.
pub async fn fetch_all<R: LogRecord, S: LogSource + ?Sized>(source: &S) -> Result<Vec<R>, SourceError> {
    let records: Vec<R> = get_typed(source, R::KIND.endpoint()).await?;
    tracing::debug!(kind = ?R::KIND, count = records.len(), "fetched log collection");
    Ok(records)
}

pub async fn fetch_stats<S: LogSource + ?Sized>(source: &S) -> Result<StatsSnapshot, SourceError> {
    get_typed(source, STATS_PATH).await
}

pub async fn fetch_analytics<S: LogSource + ?Sized>(source: &S) -> Result<AnalyticsSnapshot, SourceError> {
    get_typed(source, ANALYTICS_PATH).await
}

/// Stats and chart data, fetched concurrently. Either half may be missing;
/// the whole refresh fails only when both do.
pub async fn fetch_analytics_view<S: LogSource + ?Sized>(source: &S) -> Result<AnalyticsView, SourceError> {
    let (analytics, stats) = tokio::join!(fetch_analytics(source), fetch_stats(source));
    match (analytics, stats) {
        (Err(e), Err(_)) => Err(e),
        (analytics, stats) => {
            if let Err(e) = &analytics {
                tracing::warn!(error = %e, "analytics data unavailable");
            }
            if let Err(e) = &stats {
                tracing::warn!(error = %e, "stats unavailable");
            }
            Ok(AnalyticsView {
                analytics: analytics.ok(),
                stats: stats.ok(),
            })
        }
    }
}

pub fn image_url<S: LogSource + ?Sized>(source: &S, image_path: &str) -> String {
    crate::browser::preview::resolve_image_url(source.base_url(), image_path)
}

pub fn video_feed_url<S: LogSource + ?Sized>(source: &S) -> String {
    format!("{}{VIDEO_FEED_PATH}", source.base_url().trim_end_matches('/'))
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Canned responses keyed by path; anything else is a 503.
    #[derive(Default)]
    pub struct FakeSource {
        pub responses: Mutex<HashMap<String, Value>>,
        pub calls: AtomicUsize,
    }

    impl FakeSource {
        pub fn with(path: &str, body: Value) -> Self {
            let fake = Self::default();
            fake.set(path, body);
            fake
        }

        pub fn set(&self, path: &str, body: Value) {
            if let Ok(mut map) = self.responses.lock() {
                map.insert(path.to_string(), body);
            }
        }

        pub fn remove(&self, path: &str) {
            if let Ok(mut map) = self.responses.lock() {
                map.remove(path);
            }
        }
    }

    impl LogSource for FakeSource {
        async fn get_json(&self, path: &str) -> Result<Value, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = self.responses.lock().ok().and_then(|m| m.get(path).cloned());
            body.ok_or_else(|| SourceError::Status {
                url: path.to_string(),
                status: 503,
            })
        }

        fn base_url(&self) -> &str {
            "http://fake:8081"
        }
    }
}
