pub mod fmt;
mod logs;
mod stats;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};

use crate::browser::{filter::parse_date_expr, DateRange, LogBrowser};
use crate::error::ExportError;
use crate::models::LogRecord;
use crate::poll::{self, ANALYTICS_PERIOD, PERSONNEL_STATS_PERIOD};
use crate::session::{NavItem, Session};
use crate::source::{self, LogSource};

use self::fmt::{ceprintln, cprintln, BOLD, DIM, GREEN, RESET};

pub use logs::{print_active_notifications, print_page, print_preview};
pub use stats::{print_analytics, print_stats};

/// Filter and page selection for the one-shot list and export commands.
#[derive(Debug, Clone, Default)]
pub struct ViewArgs {
    pub search: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub page: usize,
}

impl ViewArgs {
    /// Resolve `--since`/`--until` expressions against `today`.
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange> {
        let parse = |expr: Option<&str>| -> Result<Option<NaiveDate>> {
            match expr {
                Some(e) => parse_date_expr(e, today).map_err(anyhow::Error::msg),
                None => Ok(None),
            }
        };
        Ok(DateRange::new(
            parse(self.since.as_deref()).context("--since")?,
            parse(self.until.as_deref()).context("--until")?,
        ))
    }
}

/// Fetch one log and apply `args` to a fresh browser.
async fn load<R: LogRecord, S: LogSource>(source: &S, args: &ViewArgs) -> Result<LogBrowser<R>> {
    let today = Local::now().date_naive();
    let range = args.date_range(today)?;

    let mut browser = LogBrowser::new(source.base_url());
    let records = source::fetch_all::<R, S>(source).await;
    if let Err(e) = &records {
        browser.load_failed(e);
        print_active_notifications(&browser);
    }
    let records = records.with_context(|| format!("fetching {}", R::KIND.endpoint()))?;
    browser.load_succeeded(records);

    if let Some(q) = args.search.as_deref() {
        browser.search_on(q, today);
    }
    if !range.is_empty() {
        browser.filter_dates_on(range, today);
    }
    Ok(browser)
}

pub async fn list<R: LogRecord, S: LogSource>(source: &S, args: &ViewArgs) -> Result<()> {
    let mut browser: LogBrowser<R> = load(source, args).await?;

    let page = args.page.max(1);
    if page != 1 && !browser.go_to_page(page) {
        ceprintln!(
            "{DIM}[idintel]{RESET} page {page} is out of range (1-{}), showing page 1",
            browser.total_pages().max(1)
        );
    }

    print_page(&browser);
    print_active_notifications(&browser);
    Ok(())
}

pub async fn export<R: LogRecord, S: LogSource>(source: &S, args: &ViewArgs, dir: &Path) -> Result<()> {
    let mut browser: LogBrowser<R> = load(source, args).await?;
    let today = Local::now().date_naive();

    match browser.save_export(today, dir) {
        Ok(path) => {
            print_active_notifications(&browser);
            cprintln!("  {GREEN}→{RESET} {}", path.display());
            Ok(())
        }
        Err(ExportError::Empty) => {
            print_active_notifications(&browser);
            Ok(())
        }
        Err(e) => {
            print_active_notifications(&browser);
            Err(e).with_context(|| format!("exporting to {}", dir.display()))
        }
    }
}

pub async fn stats<S: LogSource + 'static>(source: Arc<S>, watch: bool) -> Result<()> {
    if !watch {
        let snapshot = source::fetch_stats(&*source).await.context("fetching /stats")?;
        print_stats(Some(&snapshot));
        return Ok(());
    }

    let poller = poll::stats_poller(source, PERSONNEL_STATS_PERIOD);
    let mut rx = poller.subscribe();
    cprintln!("{DIM}[idintel]{RESET} refreshing every {}s, ctrl+c to stop", PERSONNEL_STATS_PERIOD.as_secs());
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = rx.borrow_and_update().clone();
                print_stats(latest.as_ref());
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

pub async fn analytics<S: LogSource + 'static>(source: Arc<S>, session: &Session, watch: bool) -> Result<()> {
    if !session.can_see(NavItem::Analytics) {
        bail!("analytics is only available to admin sessions");
    }

    if !watch {
        let view = source::fetch_analytics_view(&*source)
            .await
            .context("fetching analytics")?;
        print_analytics(&view);
        return Ok(());
    }

    let poller = poll::analytics_poller(source, ANALYTICS_PERIOD);
    let mut rx = poller.subscribe();
    cprintln!("{DIM}[idintel]{RESET} refreshing every {}s, ctrl+c to stop", ANALYTICS_PERIOD.as_secs());
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(view) = rx.borrow_and_update().clone() {
                    print_analytics(&view);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

pub fn nav(session: &Session) {
    println!();
    fmt::section_header(&format!("idintel · {}", session.role));
    println!();
    for item in session.nav_items() {
        match item.command() {
            Some(cmd) => cprintln!("  {BOLD}{:<14}{RESET} {DIM}idintel {cmd}{RESET}", item.label()),
            None => cprintln!("  {BOLD}{:<14}{RESET} {DIM}environment variables, see --help{RESET}", item.label()),
        }
    }
    println!();
}
