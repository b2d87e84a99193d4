use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};

use idintel::browser::DateRange;
use idintel::source::{fetch_all, fetch_analytics_view, fetch_stats};
use idintel::{HttpSource, LogBrowser, LogSource, SourceError, VerifiedRecord, ViewState, ViolationRecord};

mod common {
    use serde_json::{json, Value};

    pub fn violations(n: usize) -> Value {
        let rows: Vec<Value> = (0..n)
            .map(|i| {
                let name = if i % 4 == 0 { "Unknown".to_string() } else { format!("Worker{i}") };
                json!({
                    "filename": format!("{name}_202405{:02}_101500.jpg", 1 + i % 28),
                    "image_path": format!("database\\violations\\{name}_{i}.jpg"),
                    "timestamp": format!("2024-05-{:02}T10:15:00.{:06}", 1 + i % 28, i),
                    "status": if name == "Unknown" { "VIOLATION" } else { "IDENTIFIED" },
                })
            })
            .collect();
        Value::Array(rows)
    }

    pub fn verified() -> Value {
        json!([
            {"id": 1, "person_name": "Smith, John", "timestamp": "2024-05-01T08:00:00",
             "image_path": "database/verified/1.jpg", "track_id": 11, "status": "VERIFIED"},
            {"id": 2, "person_name": "Ann \"Red\" Lee", "timestamp": "2024-05-02T09:00:00",
             "image_path": "database/verified/2.jpg", "track_id": 12, "status": "VERIFIED"},
        ])
    }
}

#[derive(Clone, Default)]
struct Service {
    down: Arc<AtomicBool>,
}

async fn violations_handler(State(svc): State<Service>) -> Result<Json<Value>, StatusCode> {
    if svc.down.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(common::violations(30)))
}

async fn spawn_service(svc: Service) -> String {
    let app = Router::new()
        .route("/all_violation_images", get(violations_handler))
        .route("/verified_list", get(|| async { Json(common::verified()) }))
        .route(
            "/stats",
            get(|| async {
                Json(json!({"total_detections": 40, "compliance_rate": "97.5%", "violations": 1, "active_cameras": 1}))
            }),
        )
        .route("/analytics/data", get(|| async { StatusCode::NOT_FOUND }))
        .with_state(svc);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

#[tokio::test]
async fn fetches_and_pages_violations() {
    let base = spawn_service(Service::default()).await;
    let source = HttpSource::new(&base).unwrap();

    let records: Vec<ViolationRecord> = fetch_all(&source).await.unwrap();
    assert_eq!(records.len(), 30);

    let mut browser = LogBrowser::new(source.base_url());
    browser.load_succeeded(records);
    assert_eq!(browser.state(), ViewState::Ready);
    assert_eq!(browser.total_pages(), 3);
    assert!(browser.go_to_page(3));
    assert_eq!(browser.visible().len(), 6);

    browser.search_on("unknown", today());
    assert_eq!(browser.current_page(), 1);
    assert_eq!(browser.filtered().len(), 8);

    assert!(browser.open_preview(0));
    let preview = browser.preview().selected().unwrap();
    assert_eq!(preview.source, format!("{base}/violations/Unknown_0.jpg"));
}

#[tokio::test]
async fn failed_refetch_keeps_previous_data() {
    let svc = Service::default();
    let base = spawn_service(svc.clone()).await;
    let source = HttpSource::new(&base).unwrap();
    let mut browser: LogBrowser<ViolationRecord> = LogBrowser::new(&base);

    browser.apply_fetch(fetch_all(&source).await);
    svc.down.store(true, Ordering::SeqCst);
    let second = fetch_all::<ViolationRecord, _>(&source).await;
    assert!(matches!(second, Err(SourceError::Status { status: 500, .. })));
    browser.apply_fetch(second);

    assert_eq!(browser.state(), ViewState::Ready);
    assert_eq!(browser.all().len(), 30);
    let messages: Vec<String> = browser
        .notifications(Instant::now())
        .iter()
        .map(|n| n.message.clone())
        .collect();
    assert_eq!(messages, ["Loaded 30 violation records", "Failed to load violation data"]);
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = HttpSource::new(&format!("http://{addr}")).unwrap();
    let err = fetch_stats(&source).await.unwrap_err();
    assert!(matches!(err, SourceError::Network { .. }));
}

#[tokio::test]
async fn stats_and_partial_analytics() {
    let base = spawn_service(Service::default()).await;
    let source = HttpSource::new(&base).unwrap();

    let stats = fetch_stats(&source).await.unwrap();
    assert_eq!(stats.total_detections, 40);
    assert_eq!(stats.compliance_display(), "97.5%");

    let view = fetch_analytics_view(&source).await.unwrap();
    assert!(view.analytics.is_none());
    assert_eq!(view.stats.map(|s| s.active_cameras), Some(1));
}

#[tokio::test]
async fn exported_file_round_trips_quoted_names() {
    let base = spawn_service(Service::default()).await;
    let source = HttpSource::new(&base).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let mut browser: LogBrowser<VerifiedRecord> = LogBrowser::new(&base);
    browser.apply_fetch(fetch_all(&source).await);
    browser.filter_dates_on(
        DateRange::new(None, NaiveDate::from_ymd_opt(2024, 5, 2)),
        today(),
    );
    let artifact = browser.export(today()).unwrap();
    let path = artifact.write_to(dir.path()).unwrap();
    assert!(path.ends_with("verified_personnel_report_2024-06-01.csv"));

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, ["ID", "Name", "Track ID", "Status", "Date", "Time", "Image Path"]);
    let names: Vec<String> = reader.records().map(|r| r.unwrap()[1].to_string()).collect();
    assert_eq!(names, ["Smith, John", "Ann \"Red\" Lee"]);
}
