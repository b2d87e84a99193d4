use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::models::{parse_timestamp, LogRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Inclusive local bounds. Missing start is the epoch, missing end is
    /// `today`; the end always runs to 23:59:59.999.
    fn bounds(&self, today: NaiveDate) -> (DateTime<Local>, DateTime<Local>) {
        let start = self
            .start
            .and_then(|d| Local.from_local_datetime(&d.and_time(NaiveTime::MIN)).earliest())
            .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH.with_timezone(&Local));
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        let end_date = self.end.unwrap_or(today);
        let end = Local
            .from_local_datetime(&end_date.and_time(end_of_day))
            .latest()
            .unwrap_or_else(Local::now);
        (start, end)
    }

    pub fn contains(&self, timestamp: &str, today: NaiveDate) -> bool {
        if self.is_empty() {
            return true;
        }
        let Some(ts) = parse_timestamp(timestamp) else {
            return false;
        };
        let (start, end) = self.bounds(today);
        start <= ts && ts <= end
    }
}

/// Parse a `--since`/`--until` style date expression: `today`, `yesterday`,
/// `7d`, `2w`, `1m`, or `YYYY-MM-DD`. `-` and empty mean "no bound".
pub fn parse_date_expr(expr: &str, today: NaiveDate) -> Result<Option<NaiveDate>, String> {
    use chrono::Months;

    let expr = expr.trim();
    let amount = |suffix: char| -> Option<u64> { expr.strip_suffix(suffix)?.parse().ok() };
    let out_of_range = || format!("date out of range: {expr}");

    let date = match expr {
        "" | "-" => return Ok(None),
        "today" => today,
        "yesterday" => days_before(today, 1).ok_or_else(out_of_range)?,
        _ if amount('d').is_some() => amount('d')
            .and_then(|n| days_before(today, n))
            .ok_or_else(out_of_range)?,
        _ if amount('w').is_some() => amount('w')
            .and_then(|n| n.checked_mul(7))
            .and_then(|n| days_before(today, n))
            .ok_or_else(out_of_range)?,
        _ if amount('m').is_some() => amount('m')
            .and_then(|n| u32::try_from(n).ok())
            .and_then(|n| today.checked_sub_months(Months::new(n)))
            .ok_or_else(out_of_range)?,
        _ => NaiveDate::parse_from_str(expr, "%Y-%m-%d")
            .map_err(|_| format!("invalid date: {expr} (expected YYYY-MM-DD, today, 7d, 2w, 1m)"))?,
    };
    Ok(Some(date))
}

/// Longer than the whole representable calendar.
const MAX_OFFSET_DAYS: u64 = 1 << 27;

fn days_before(today: NaiveDate, n: u64) -> Option<NaiveDate> {
    if n > MAX_OFFSET_DAYS {
        return None;
    }
    today.checked_sub_days(chrono::Days::new(n))
}

pub fn matches_query<R: LogRecord>(record: &R, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Reduce `all` to the records matching both the text query and the date
/// range, keeping their original order.
pub fn filter<R: LogRecord>(all: &[R], query: &str, range: &DateRange, today: NaiveDate) -> Vec<R> {
    if query.is_empty() && range.is_empty() {
        return all.to_vec();
    }
    all.iter()
        .filter(|r| matches_query(*r, query))
        .filter(|r| range.contains(r.timestamp(), today))
        .cloned()
        .collect()
}
