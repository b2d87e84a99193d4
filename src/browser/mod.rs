pub mod filter;
pub mod paginate;
pub mod preview;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};

use crate::error::{ExportError, SourceError};
use crate::export::{self, ExportArtifact};
use crate::models::LogRecord;
use crate::notify::{Notification, NotificationKind, NotificationQueue};
use crate::poll::Poller;

pub use filter::DateRange;
pub use paginate::{PageLink, PAGE_SIZE};
pub use preview::{ImagePreview, PreviewImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Ready,
    Failed,
}

/// Everything the pager needs to draw itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerView {
    pub current: usize,
    pub total_pages: usize,
    pub links: Vec<PageLink>,
    pub has_previous: bool,
    pub has_next: bool,
    pub label: String,
}

/// Controller for one log view: fetch result in, filtered page out.
///
/// `all` is set once per successful fetch and never patched; `filtered` and
/// the visible page are derived from it on every query or date change.
pub struct LogBrowser<R: LogRecord> {
    state: ViewState,
    all: Vec<R>,
    filtered: Vec<R>,
    current_page: usize,
    page_size: usize,
    query: String,
    date_range: DateRange,
    base_url: String,
    notifications: NotificationQueue,
    preview: ImagePreview,
}

impl<R: LogRecord> LogBrowser<R> {
    pub fn new(base_url: &str) -> Self {
        Self {
            state: ViewState::Loading,
            all: Vec::new(),
            filtered: Vec::new(),
            current_page: 1,
            page_size: PAGE_SIZE,
            query: String::new(),
            date_range: DateRange::default(),
            base_url: base_url.to_string(),
            notifications: NotificationQueue::new(),
            preview: ImagePreview::new(),
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    fn notify(&mut self, kind: NotificationKind, message: String) {
        tracing::debug!(view = ?R::KIND, ?kind, %message, "notification");
        self.notifications.push(kind, message);
    }

    // ── Fetch lifecycle ──────────────────────────────────────────────────────

    pub fn load_succeeded(&mut self, records: Vec<R>) {
        let count = records.len();
        self.all = records;
        self.filtered = self.all.clone();
        self.query.clear();
        self.date_range = DateRange::default();
        self.current_page = 1;
        self.state = ViewState::Ready;
        self.notify(
            NotificationKind::Success,
            format!("Loaded {count} {}", R::KIND.record_noun()),
        );
    }

    /// Keeps whatever was loaded before. A view that never loaded moves to
    /// `Failed`.
    pub fn load_failed(&mut self, error: &SourceError) {
        tracing::warn!(view = ?R::KIND, %error, "fetch failed");
        if self.state == ViewState::Loading {
            self.state = ViewState::Failed;
        }
        self.notify(
            NotificationKind::Error,
            format!("Failed to load {} data", R::KIND.data_label()),
        );
    }

    pub fn apply_fetch(&mut self, result: Result<Vec<R>, SourceError>) {
        match result {
            Ok(records) => self.load_succeeded(records),
            Err(e) => self.load_failed(&e),
        }
    }

    // ── Filtering ────────────────────────────────────────────────────────────

    fn refilter(&mut self, today: NaiveDate) {
        self.filtered = filter::filter(&self.all, &self.query, &self.date_range, today);
        self.current_page = 1;
    }

    pub fn search(&mut self, query: &str) {
        self.search_on(query, Local::now().date_naive());
    }

    pub fn search_on(&mut self, query: &str, today: NaiveDate) {
        if query.is_empty() && self.query.is_empty() {
            return;
        }
        self.query = query.to_string();
        self.refilter(today);
        if !query.is_empty() {
            self.notify(
                NotificationKind::Info,
                format!("Found {} matching {}", self.filtered.len(), R::KIND.match_noun()),
            );
        }
    }

    pub fn filter_dates(&mut self, range: DateRange) {
        self.filter_dates_on(range, Local::now().date_naive());
    }

    /// An empty range drops the date half; with no query left that is a
    /// full clear.
    pub fn filter_dates_on(&mut self, range: DateRange, today: NaiveDate) {
        if range.is_empty() && self.query.is_empty() {
            self.clear_filters();
            return;
        }
        self.date_range = range;
        self.refilter(today);
        if range.is_empty() {
            self.notify(NotificationKind::Info, "Date filter cleared".to_string());
        } else {
            self.notify(
                NotificationKind::Success,
                format!("Filtered to {} {}", self.filtered.len(), R::KIND.match_noun()),
            );
        }
    }

    pub fn clear_filters(&mut self) {
        self.query.clear();
        self.date_range = DateRange::default();
        self.filtered = self.all.clone();
        self.current_page = 1;
        self.notify(NotificationKind::Info, "Filters cleared".to_string());
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    pub fn all(&self) -> &[R] {
        &self.all
    }

    pub fn filtered(&self) -> &[R] {
        &self.filtered
    }

    // ── Pagination ───────────────────────────────────────────────────────────

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        paginate::total_pages(self.filtered.len(), self.page_size)
    }

    /// Rejects page 0 and anything past the last page.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if !paginate::is_navigable(page, self.total_pages()) {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn next_page(&mut self) -> bool {
        paginate::has_next(self.current_page, self.total_pages()) && self.go_to_page(self.current_page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        paginate::has_previous(self.current_page) && self.go_to_page(self.current_page - 1)
    }

    pub fn visible(&self) -> &[R] {
        paginate::paginate(&self.filtered, self.current_page, self.page_size).visible
    }

    /// `None` when everything fits on one page.
    pub fn pager(&self) -> Option<PagerView> {
        let total = self.total_pages();
        if !paginate::shows_pager(total) {
            return None;
        }
        Some(PagerView {
            current: self.current_page,
            total_pages: total,
            links: paginate::page_numbers(self.current_page, total),
            has_previous: paginate::has_previous(self.current_page),
            has_next: paginate::has_next(self.current_page, total),
            label: paginate::range_label(self.current_page, self.page_size, self.filtered.len()),
        })
    }

    // ── Export ───────────────────────────────────────────────────────────────

    /// Serialize the filtered collection. Failures raise a notification and
    /// produce nothing; success stays silent until the artifact is saved.
    pub fn export(&mut self, today: NaiveDate) -> Result<ExportArtifact, ExportError> {
        let result = self.build_export(today);
        match &result {
            Ok(_) => {}
            Err(ExportError::Empty) => {
                self.notify(NotificationKind::Warning, "Nothing to export".to_string())
            }
            Err(e) => self.notify(NotificationKind::Error, format!("Export failed: {e}")),
        }
        result
    }

    fn build_export(&self, today: NaiveDate) -> Result<ExportArtifact, ExportError> {
        if self.filtered.is_empty() {
            return Err(ExportError::Empty);
        }
        let rows: Vec<_> = self.filtered.iter().map(LogRecord::export_row).collect();
        let bytes = export::serialize(&rows, None)?;
        Ok(ExportArtifact::csv(R::KIND.export_name(), today, bytes))
    }

    /// Serialize and write into `dir`. Exactly one notification results:
    /// the success line only once the file is in place.
    pub fn save_export(&mut self, today: NaiveDate, dir: &Path) -> Result<PathBuf, ExportError> {
        let artifact = self.export(today)?;
        match artifact.write_to(dir) {
            Ok(path) => {
                self.notify(
                    NotificationKind::Success,
                    format!("Exported {} rows to {}", self.filtered.len(), artifact.filename),
                );
                Ok(path)
            }
            Err(e) => {
                self.notify(NotificationKind::Error, format!("Export failed: {e}"));
                Err(e)
            }
        }
    }

    // ── Image preview ────────────────────────────────────────────────────────

    /// Open the `index`-th record of the visible page (0-based).
    pub fn open_preview(&mut self, index: usize) -> bool {
        let Some(record) = self.visible().get(index) else {
            return false;
        };
        let source = preview::resolve_image_url(&self.base_url, record.image_path());
        let label = record.display_name();
        self.preview.open(source, label);
        true
    }

    pub fn close_preview(&mut self) {
        self.preview.close();
    }

    pub fn preview(&self) -> &ImagePreview {
        &self.preview
    }

    pub fn preview_mut(&mut self) -> &mut ImagePreview {
        &mut self.preview
    }

    // ── Notifications ────────────────────────────────────────────────────────

    pub fn notifications(&self, now: Instant) -> Vec<&Notification> {
        self.notifications.active(now).collect()
    }

    pub fn expire_notifications(&mut self, now: Instant) -> usize {
        self.notifications.expire(now)
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        self.notifications.dismiss(id)
    }
}

// ── Mount lifetime ───────────────────────────────────────────────────────────

/// Cloneable liveness flag handed to in-flight work for a mounted view.
#[derive(Clone, Debug)]
pub struct MountToken(Arc<AtomicBool>);

impl MountToken {
    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A view's lifetime on screen. Owns the view's pollers; dropping it marks
/// the view dead so late fetch results are discarded, and cancels the
/// pollers.
pub struct Mount<T: Clone + Send + Sync + 'static> {
    live: Arc<AtomicBool>,
    poller: Option<Poller<T>>,
}

impl<T: Clone + Send + Sync + 'static> Mount<T> {
    pub fn new() -> Self {
        Self {
            live: Arc::new(AtomicBool::new(true)),
            poller: None,
        }
    }

    pub fn with_poller(poller: Poller<T>) -> Self {
        Self {
            live: Arc::new(AtomicBool::new(true)),
            poller: Some(poller),
        }
    }

    pub fn token(&self) -> MountToken {
        MountToken(Arc::clone(&self.live))
    }

    pub fn unmount(&mut self) {
        self.live.store(false, Ordering::Release);
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for Mount<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for Mount<T> {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Spawn the one-shot list fetch for a mounted view. The result is only
/// delivered while the mount is live.
pub fn spawn_fetch<R, S>(
    source: Arc<S>,
    token: MountToken,
) -> tokio::sync::oneshot::Receiver<Result<Vec<R>, SourceError>>
where
    R: LogRecord,
    S: crate::source::LogSource + 'static,
{
    let (tx, rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let result = crate::source::fetch_all::<R, S>(&*source).await;
        if token.is_live() {
            let _ = tx.send(result);
        } else {
            tracing::debug!(view = ?R::KIND, "discarding fetch for unmounted view");
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{VerifiedRecord, ViolationRecord};
    use crate::source::fake::FakeSource;
    use crate::source::LogSource;
    use serde_json::json;

    fn violation(i: usize, day: u32) -> ViolationRecord {
        let name = if i % 3 == 0 { "Unknown".to_string() } else { format!("Worker{i}") };
        ViolationRecord {
            filename: format!("{name}_202405{day:02}_101500.jpg"),
            image_path: format!("violations\\{name}_{i}.jpg"),
            timestamp: format!("2024-05-{day:02}T10:15:00"),
            status: if name == "Unknown" { "VIOLATION".into() } else { "IDENTIFIED".into() },
        }
    }

    fn loaded(n: usize) -> LogBrowser<ViolationRecord> {
        let mut b = LogBrowser::new("http://localhost:8081");
        b.load_succeeded((0..n).map(|i| violation(i, 1 + (i % 28) as u32)).collect());
        b
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn messages(b: &LogBrowser<impl LogRecord>) -> Vec<String> {
        b.notifications(Instant::now()).iter().map(|n| n.message.clone()).collect()
    }

    #[test]
    fn starts_loading_then_ready() {
        let mut b: LogBrowser<ViolationRecord> = LogBrowser::new("http://x");
        assert_eq!(b.state(), ViewState::Loading);
        b.load_succeeded(vec![violation(1, 1)]);
        assert_eq!(b.state(), ViewState::Ready);
        assert_eq!(messages(&b), ["Loaded 1 violation records"]);
    }

    #[test]
    fn first_load_failure_is_failed_state() {
        let mut b: LogBrowser<VerifiedRecord> = LogBrowser::new("http://x");
        b.load_failed(&SourceError::Status { url: "/verified_list".into(), status: 500 });
        assert_eq!(b.state(), ViewState::Failed);
        assert_eq!(messages(&b), ["Failed to load verified data"]);
    }

    #[test]
    fn later_failure_keeps_loaded_data() {
        let mut b = loaded(20);
        b.load_failed(&SourceError::Status { url: "/all_violation_images".into(), status: 502 });
        assert_eq!(b.state(), ViewState::Ready);
        assert_eq!(b.all().len(), 20);
    }

    #[test]
    fn empty_search_leaves_everything_and_page() {
        let mut b = loaded(20);
        b.go_to_page(2);
        b.search_on("", today());
        assert_eq!(b.filtered().len(), 20);
        assert_eq!(b.current_page(), 2);
        assert_eq!(messages(&b).len(), 1);
    }

    #[test]
    fn repeated_search_reports_each_time() {
        let mut b = loaded(30);
        b.search_on("unknown", today());
        b.search_on("unknown", today());
        let found: Vec<_> = messages(&b).into_iter().filter(|m| m.starts_with("Found ")).collect();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], found[1]);
    }

    #[test]
    fn empty_range_with_query_keeps_query() {
        let mut b = loaded(30);
        b.search_on("unknown", today());
        let matching = b.filtered().len();
        b.filter_dates_on(DateRange::new(NaiveDate::from_ymd_opt(2024, 5, 20), None), today());
        b.filter_dates_on(DateRange::default(), today());
        assert_eq!(b.query(), "unknown");
        assert_eq!(b.filtered().len(), matching);
        assert_eq!(messages(&b).last().map(String::as_str), Some("Date filter cleared"));
    }

    #[test]
    fn empty_range_without_query_clears() {
        let mut b = loaded(30);
        b.filter_dates_on(DateRange::new(NaiveDate::from_ymd_opt(2024, 5, 20), None), today());
        b.filter_dates_on(DateRange::default(), today());
        assert_eq!(b.filtered().len(), 30);
        assert_eq!(messages(&b).last().map(String::as_str), Some("Filters cleared"));
    }

    #[test]
    fn save_export_notifies_after_the_write() {
        let mut b = loaded(5);
        let dir = tempfile::tempdir().unwrap();
        let path = b.save_export(today(), dir.path()).unwrap();
        assert!(path.exists());
        assert_eq!(
            messages(&b).last().map(String::as_str),
            Some("Exported 5 rows to violations_report_2024-06-01.csv")
        );

        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        assert!(matches!(b.save_export(today(), &blocker), Err(ExportError::Io(_))));
        let tail: Vec<String> = messages(&b).into_iter().skip(2).collect();
        assert_eq!(tail.len(), 1);
        assert!(tail[0].starts_with("Export failed: "));
    }

    #[test]
    fn query_change_resets_page() {
        let mut b = loaded(40);
        assert!(b.go_to_page(3));
        b.search_on("worker", today());
        assert_eq!(b.current_page(), 1);
        assert!(messages(&b).iter().any(|m| m.starts_with("Found ") && m.ends_with(" matching violations")));
    }

    #[test]
    fn date_change_resets_page() {
        let mut b = loaded(40);
        assert!(b.go_to_page(2));
        let end = NaiveDate::from_ymd_opt(2024, 5, 10);
        b.filter_dates_on(DateRange::new(None, end), today());
        assert_eq!(b.current_page(), 1);
        assert!(b.filtered().iter().all(|r| r.timestamp.as_str() <= "2024-05-10T23:59:59"));
        assert!(messages(&b).last().unwrap().starts_with("Filtered to "));
    }

    #[test]
    fn query_and_dates_compose() {
        let mut b = loaded(56);
        b.search_on("unknown", today());
        let start = NaiveDate::from_ymd_opt(2024, 5, 20);
        b.filter_dates_on(DateRange::new(start, None), today());
        assert!(!b.filtered().is_empty());
        assert!(b.filtered().iter().all(|r| r.status == "VIOLATION" && r.timestamp.as_str() >= "2024-05-20"));
    }

    #[test]
    fn clear_filters_restores_all() {
        let mut b = loaded(30);
        b.search_on("unknown", today());
        b.go_to_page(1);
        b.clear_filters();
        assert_eq!(b.filtered().len(), 30);
        assert_eq!(b.query(), "");
        assert_eq!(b.current_page(), 1);
        assert_eq!(messages(&b).last().map(String::as_str), Some("Filters cleared"));
    }

    #[test]
    fn boundary_navigation_is_rejected() {
        let mut b = loaded(30);
        assert_eq!(b.total_pages(), 3);
        assert!(!b.previous_page());
        assert!(!b.go_to_page(0));
        assert!(b.go_to_page(3));
        assert!(!b.next_page());
        assert!(!b.go_to_page(4));
        assert_eq!(b.current_page(), 3);
        assert_eq!(b.visible().len(), 6);

        let pager = b.pager().unwrap();
        assert!(!pager.has_next);
        assert!(pager.has_previous);
        assert_eq!(pager.label, "Showing 25-30 of 30 items");
    }

    #[test]
    fn single_page_has_no_pager() {
        let b = loaded(12);
        assert!(b.pager().is_none());
        assert_eq!(b.visible().len(), 12);
    }

    #[test]
    fn export_reflects_filter() {
        let mut b = loaded(30);
        b.search_on("unknown", today());
        let expected = b.filtered().len();
        let artifact = b.export(today()).unwrap();
        assert_eq!(artifact.filename, "violations_report_2024-06-01.csv");

        let mut reader = csv::Reader::from_reader(artifact.bytes.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), ["Name", "Status", "Date", "Time", "Image Path"]);
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), expected);
        assert!(rows.iter().all(|r| &r[0] == "Unknown"));
    }

    #[test]
    fn export_of_empty_filter_warns() {
        let mut b = loaded(5);
        b.search_on("nobody-by-this-name", today());
        assert!(matches!(b.export(today()), Err(ExportError::Empty)));
        assert_eq!(messages(&b).last().map(String::as_str), Some("Nothing to export"));
    }

    #[test]
    fn preview_resolves_visible_record() {
        let mut b = loaded(15);
        b.go_to_page(2);
        assert!(b.open_preview(1));
        let selected = b.preview().selected().unwrap();
        assert_eq!(selected.source, "http://localhost:8081/violations/Worker13_13.jpg");
        assert_eq!(selected.label, "Worker13");
        assert!(!b.open_preview(3));
        b.close_preview();
        assert!(b.preview().selected().is_none());
    }

    #[tokio::test]
    async fn unmounted_view_discards_fetch() {
        let fake = Arc::new(FakeSource::with("/verified_list", json!([])));
        let mut mount: Mount<()> = Mount::new();
        let rx = spawn_fetch::<VerifiedRecord, _>(Arc::clone(&fake), mount.token());
        mount.unmount();
        assert!(rx.await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_mount_stops_its_poller() {
        use crate::poll::{stats_poller, PERSONNEL_STATS_PERIOD};

        let fake = Arc::new(FakeSource::with("/stats", json!({"person_count": 2})));
        let mount = Mount::with_poller(stats_poller(Arc::clone(&fake), PERSONNEL_STATS_PERIOD));
        let token = mount.token();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        let before = fake.calls.load(Ordering::SeqCst);
        assert_eq!(before, 1);

        drop(mount);
        assert!(!token.is_live());
        tokio::time::advance(PERSONNEL_STATS_PERIOD * 3).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(fake.calls.load(Ordering::SeqCst), before);
    }

    #[tokio::test]
    async fn live_view_receives_fetch() {
        let fake = Arc::new(FakeSource::with("/verified_list", json!([])));
        let mount: Mount<()> = Mount::new();
        let rx = spawn_fetch::<VerifiedRecord, _>(Arc::clone(&fake), mount.token());
        let mut b: LogBrowser<VerifiedRecord> = LogBrowser::new(fake.base_url());
        b.apply_fetch(rx.await.unwrap());
        assert_eq!(b.state(), ViewState::Ready);
        assert_eq!(messages(&b), ["Loaded 0 verified personnel records"]);
    }
}
