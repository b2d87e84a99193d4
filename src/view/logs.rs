use std::time::Instant;

use super::fmt::{
    cprintln, notification_badge, section_header, short_timestamp, status_badge, trunc, BOLD,
    CYAN, DIM, RESET, YELLOW,
};
use crate::browser::{ImagePreview, LogBrowser, PageLink, PagerView, ViewState};
use crate::models::LogRecord;
use crate::notify::Notification;

const SKELETON_ROWS: usize = 3;

/// One listing row. `index` is the 1-based position on the visible page,
/// which is what `open <n>` takes.
pub(crate) fn record_line<R: LogRecord>(index: usize, record: &R) -> String {
    let name = trunc(&record.display_name(), 20);
    let tag = record
        .tag()
        .map(|t| format!(" {DIM}{t}{RESET}"))
        .unwrap_or_default();
    format!(
        "  {DIM}{index:>2}{RESET}  {BOLD}{name:<20}{RESET}{tag}  {}  {DIM}{}{RESET}",
        status_badge(record.status()),
        short_timestamp(record.timestamp()),
    )
}

pub(crate) fn pager_line(pager: &PagerView) -> String {
    let numbers: Vec<String> = pager
        .links
        .iter()
        .map(|link| match link {
            PageLink::Number(n) if *n == pager.current => format!("{BOLD}{CYAN}[{n}]{RESET}"),
            PageLink::Number(n) => n.to_string(),
            PageLink::Ellipsis => "…".to_string(),
        })
        .collect();
    let prev = if pager.has_previous { "‹ prev" } else { "      " };
    let next = if pager.has_next { "next ›" } else { "" };
    format!(
        "  {DIM}{prev}{RESET}  {}  {DIM}{next}{RESET}   {DIM}{}{RESET}",
        numbers.join(" "),
        pager.label
    )
}

pub(crate) fn filter_line<R: LogRecord>(browser: &LogBrowser<R>) -> Option<String> {
    let mut parts = Vec::new();
    if !browser.query().is_empty() {
        parts.push(format!("search {YELLOW}\"{}\"{RESET}", browser.query()));
    }
    let range = browser.date_range();
    if !range.is_empty() {
        let fmt = |d: Option<chrono::NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "…".to_string())
        };
        parts.push(format!("dates {YELLOW}{} → {}{RESET}", fmt(range.start), fmt(range.end)));
    }
    if parts.is_empty() {
        None
    } else {
        Some(format!(
            "  {DIM}filter:{RESET} {}  {DIM}({} of {}){RESET}",
            parts.join(" · "),
            browser.filtered().len(),
            browser.all().len()
        ))
    }
}

pub fn print_page<R: LogRecord>(browser: &LogBrowser<R>) {
    println!();
    section_header(&format!("{} log", R::KIND.match_noun()));
    println!();

    match browser.state() {
        ViewState::Loading => {
            for _ in 0..SKELETON_ROWS {
                cprintln!("  {DIM}░░  ░░░░░░░░░░░░░░░░░░░░  ░░░░░░░░  ░░░░░░░░░░░░░░░░░░░{RESET}");
            }
            println!();
            return;
        }
        ViewState::Failed => {
            cprintln!("  {DIM}no data loaded{RESET}");
            println!();
            return;
        }
        ViewState::Ready => {}
    }

    if let Some(line) = filter_line(browser) {
        cprintln!("{line}");
        println!();
    }

    let visible = browser.visible();
    if visible.is_empty() {
        cprintln!("  {DIM}{}{RESET}", R::KIND.empty_message());
    } else {
        for (i, record) in visible.iter().enumerate() {
            cprintln!("{}", record_line(i + 1, record));
        }
    }

    if let Some(pager) = browser.pager() {
        println!();
        cprintln!("{}", pager_line(&pager));
    }
    println!();
}

pub(crate) fn notification_line(n: &Notification) -> String {
    format!("  {} {}  {DIM}#{}{RESET}", notification_badge(n.kind), n.message, n.id)
}

pub fn print_notifications(list: &[&Notification]) {
    for n in list {
        cprintln!("{}", notification_line(n));
    }
}

/// Print notifications that have not expired yet.
pub fn print_active_notifications<R: LogRecord>(browser: &LogBrowser<R>) {
    print_notifications(&browser.notifications(Instant::now()));
}

pub fn print_preview(preview: &ImagePreview) {
    let Some(image) = preview.selected() else {
        return;
    };
    let zoom = if preview.is_zoomed() { "zoomed" } else { "fit" };
    println!();
    cprintln!("  {BOLD}{}{RESET}  {DIM}[{zoom}]{RESET}", image.label);
    cprintln!("  {CYAN}{}{RESET}", image.source);
    cprintln!("  {DIM}zoom · close{RESET}");
    println!();
}
