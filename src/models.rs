use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Violations,
    Verified,
}

impl LogKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            LogKind::Violations => "/all_violation_images",
            LogKind::Verified => "/verified_list",
        }
    }

    /// Noun used in load notifications ("Loaded 3 violation records").
    pub fn record_noun(self) -> &'static str {
        match self {
            LogKind::Violations => "violation records",
            LogKind::Verified => "verified personnel records",
        }
    }

    /// Noun used in filter notifications ("Found 3 matching personnel").
    pub fn match_noun(self) -> &'static str {
        match self {
            LogKind::Violations => "violations",
            LogKind::Verified => "personnel",
        }
    }

    pub fn data_label(self) -> &'static str {
        match self {
            LogKind::Violations => "violation",
            LogKind::Verified => "verified",
        }
    }

    pub fn export_name(self) -> &'static str {
        match self {
            LogKind::Violations => "violations_report",
            LogKind::Verified => "verified_personnel_report",
        }
    }

    pub fn empty_message(self) -> &'static str {
        match self {
            LogKind::Violations => "No violation images found matching your criteria.",
            LogKind::Verified => "No verified logs found matching your criteria.",
        }
    }
}

/// Shape contract shared by both log types.
pub trait LogRecord: Clone + Send + Sync + DeserializeOwned + 'static {
    const KIND: LogKind;

    fn timestamp(&self) -> &str;
    fn image_path(&self) -> &str;
    fn status(&self) -> &str;
    fn display_name(&self) -> String;

    /// Extra identifier shown next to the name in listings.
    fn tag(&self) -> Option<String> {
        None
    }

    /// Strings the text query is matched against.
    fn search_fields(&self) -> Vec<String>;

    /// Row handed to the export serializer. Key order is column order.
    fn export_row(&self) -> Map<String, Value>;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ViolationRecord {
    pub filename: String,
    pub image_path: String,
    pub timestamp: String,
    pub status: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VerifiedRecord {
    pub id: i64,
    pub person_name: String,
    pub timestamp: String,
    pub image_path: String,
    pub track_id: i64,
    pub status: String,
}

/// `Alice_20240501_101500.jpg` → `Alice`.
pub fn violation_display_name(filename: &str) -> String {
    filename
        .split('_')
        .next()
        .unwrap_or(filename)
        .replacen(".jpg", "", 1)
        .replacen(".png", "", 1)
}

impl LogRecord for ViolationRecord {
    const KIND: LogKind = LogKind::Violations;

    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn image_path(&self) -> &str {
        &self.image_path
    }

    fn status(&self) -> &str {
        &self.status
    }

    fn display_name(&self) -> String {
        violation_display_name(&self.filename)
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.display_name(), self.status.clone()]
    }

    fn export_row(&self) -> Map<String, Value> {
        let (date, time) = split_local(&self.timestamp);
        let mut row = Map::new();
        row.insert("Name".into(), json!(self.display_name()));
        row.insert("Status".into(), json!(self.status));
        row.insert("Date".into(), json!(date));
        row.insert("Time".into(), json!(time));
        row.insert("Image Path".into(), json!(self.image_path));
        row
    }
}

impl LogRecord for VerifiedRecord {
    const KIND: LogKind = LogKind::Verified;

    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn image_path(&self) -> &str {
        &self.image_path
    }

    fn status(&self) -> &str {
        &self.status
    }

    fn display_name(&self) -> String {
        self.person_name.clone()
    }

    fn tag(&self) -> Option<String> {
        Some(format!("track {}", self.track_id))
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.person_name.clone(),
            self.status.clone(),
            self.track_id.to_string(),
        ]
    }

    fn export_row(&self) -> Map<String, Value> {
        let (date, time) = split_local(&self.timestamp);
        let mut row = Map::new();
        row.insert("ID".into(), json!(self.id));
        row.insert("Name".into(), json!(self.person_name));
        row.insert("Track ID".into(), json!(self.track_id));
        row.insert("Status".into(), json!(self.status));
        row.insert("Date".into(), json!(date));
        row.insert("Time".into(), json!(time));
        row.insert("Image Path".into(), json!(self.image_path));
        row
    }
}

/// Parse a record timestamp. Accepts RFC 3339, or a naive ISO-8601 value
/// which the detection service writes in its local time.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    Local.from_local_datetime(&naive).earliest()
}

/// Local `(date, time)` display strings; both empty when unparseable.
pub fn split_local(ts: &str) -> (String, String) {
    match parse_timestamp(ts) {
        Some(dt) => (
            dt.format("%Y-%m-%d").to_string(),
            dt.format("%H:%M:%S").to_string(),
        ),
        None => (String::new(), String::new()),
    }
}

// ── Aggregates ───────────────────────────────────────────────────────────────

/// Point-in-time counters from `/stats`. Absent fields default to zero; the
/// service may send either the `person_count` or the `total_detections` form.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct StatsSnapshot {
    pub person_count: u64,
    pub violation_count: u64,
    pub total_detections: u64,
    pub violations: u64,
    pub active_cameras: u64,
    pub compliance_rate: Option<String>,
}

impl StatsSnapshot {
    pub fn compliance_percent(&self) -> u64 {
        if self.person_count == 0 {
            return 0;
        }
        let total = (self.person_count + self.violation_count) as f64;
        (self.person_count as f64 / total * 100.0).round() as u64
    }

    pub fn compliance_display(&self) -> String {
        match self.compliance_rate.as_deref() {
            Some(rate) if !rate.is_empty() => rate.to_string(),
            _ => format!("{}%", self.compliance_percent()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TrendPoint {
    pub name: String,
    pub violations: u64,
    pub verified: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct HourlyBucket {
    pub name: String,
    pub events: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PieSlice {
    pub name: String,
    pub value: u64,
    pub color: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AnalyticsSnapshot {
    pub trend: Vec<TrendPoint>,
    pub hourly: Vec<HourlyBucket>,
    pub pie: Vec<PieSlice>,
}

impl AnalyticsSnapshot {
    pub fn total_violations_7d(&self) -> u64 {
        self.trend.iter().map(|p| p.violations).sum()
    }
}

/// Stats and chart data refreshed together on the analytics cadence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsView {
    pub stats: Option<StatsSnapshot>,
    pub analytics: Option<AnalyticsSnapshot>,
}
