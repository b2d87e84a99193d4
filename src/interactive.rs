use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::browser::{filter::parse_date_expr, spawn_fetch, DateRange, LogBrowser, Mount};
use crate::models::{LogRecord, StatsSnapshot};
use crate::poll::{self, PERSONNEL_STATS_PERIOD};
use crate::source::LogSource;
use crate::view::fmt::{cprint, cprintln, DIM, RESET};
use crate::view;

const SWEEP_PERIOD: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Dates(String, String),
    Clear,
    Next,
    Prev,
    Page(usize),
    Open(usize),
    Zoom,
    Close,
    Export,
    Dismiss(u64),
    Reload,
    Stats,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let number = |what: &str| -> Result<usize, String> {
        rest.parse()
            .map_err(|_| format!("{what} needs a number, got '{rest}'"))
    };

    match head {
        "search" | "s" => Ok(Command::Search(rest.to_string())),
        "dates" | "d" => {
            let mut parts = rest.split_whitespace();
            let start = parts.next().unwrap_or("-").to_string();
            let end = parts.next().unwrap_or("-").to_string();
            Ok(Command::Dates(start, end))
        }
        "clear" => Ok(Command::Clear),
        "next" | "n" => Ok(Command::Next),
        "prev" | "p" => Ok(Command::Prev),
        "page" => number("page").map(Command::Page),
        "open" | "o" => number("open").map(Command::Open),
        "zoom" | "z" => Ok(Command::Zoom),
        "close" | "c" => Ok(Command::Close),
        "export" | "e" => Ok(Command::Export),
        "dismiss" => rest
            .trim_start_matches('#')
            .parse()
            .map(Command::Dismiss)
            .map_err(|_| format!("dismiss needs a notification id, got '{rest}'")),
        "reload" | "r" => Ok(Command::Reload),
        "stats" => Ok(Command::Stats),
        "help" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        "" => Err(String::new()),
        other => Err(format!("unknown command '{other}', try 'help'")),
    }
}

/// What the loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Render,
    Preview,
    Notify,
    Refetch,
    ShowStats,
    Help,
    Quit,
}

/// Apply one command to the browser. Everything except network work
/// happens here.
pub fn apply<R: LogRecord>(
    browser: &mut LogBrowser<R>,
    command: Command,
    today: NaiveDate,
    export_dir: &Path,
) -> Outcome {
    match command {
        Command::Search(q) => {
            browser.search_on(&q, today);
            Outcome::Render
        }
        Command::Dates(start, end) => {
            let parsed = parse_date_expr(&start, today)
                .and_then(|s| parse_date_expr(&end, today).map(|e| (s, e)));
            match parsed {
                Ok((s, e)) => {
                    browser.filter_dates_on(DateRange::new(s, e), today);
                    Outcome::Render
                }
                Err(msg) => {
                    cprintln!("  {msg}");
                    Outcome::Notify
                }
            }
        }
        Command::Clear => {
            browser.clear_filters();
            Outcome::Render
        }
        Command::Next => {
            browser.next_page();
            Outcome::Render
        }
        Command::Prev => {
            browser.previous_page();
            Outcome::Render
        }
        Command::Page(n) => {
            if !browser.go_to_page(n) {
                cprintln!("  {DIM}no page {n} (1-{}){RESET}", browser.total_pages().max(1));
            }
            Outcome::Render
        }
        Command::Open(n) => {
            if n == 0 || !browser.open_preview(n - 1) {
                cprintln!("  {DIM}no row {n} on this page{RESET}");
                return Outcome::Notify;
            }
            Outcome::Preview
        }
        Command::Zoom => {
            browser.preview_mut().toggle_zoom();
            Outcome::Preview
        }
        Command::Close => {
            browser.close_preview();
            Outcome::Render
        }
        Command::Export => {
            if let Ok(path) = browser.save_export(today, export_dir) {
                cprintln!("  {DIM}→ {}{RESET}", path.display());
            }
            Outcome::Notify
        }
        Command::Dismiss(id) => {
            browser.dismiss(id);
            Outcome::Notify
        }
        Command::Reload => Outcome::Refetch,
        Command::Stats => Outcome::ShowStats,
        Command::Help => Outcome::Help,
        Command::Quit => Outcome::Quit,
    }
}

fn print_help() {
    cprintln!("  {DIM}search <q> · dates <start|-> <end|-> · clear · next · prev · page <n>{RESET}");
    cprintln!("  {DIM}open <n> · zoom · close · export · dismiss <id> · reload · stats · quit{RESET}");
}

fn prompt<R: LogRecord>(browser: &LogBrowser<R>) {
    use std::io::Write;
    cprint!("{DIM}{} p{}/{}>{RESET} ", R::KIND.match_noun(), browser.current_page(), browser.total_pages().max(1));
    let _ = std::io::stdout().flush();
}

/// Interactive session over one log. Fetch, stats polling, input and the
/// notification sweep all run on this task; the mount is torn down on exit.
pub async fn run<R: LogRecord, S: LogSource + 'static>(source: Arc<S>, export_dir: PathBuf) -> Result<()> {
    let poller = poll::stats_poller(Arc::clone(&source), PERSONNEL_STATS_PERIOD);
    let mut stats_rx = poller.subscribe();
    let mut stats_live = true;
    let mut mount: Mount<StatsSnapshot> = Mount::with_poller(poller);
    let mut last_stats: Option<StatsSnapshot> = None;

    let mut browser: LogBrowser<R> = LogBrowser::new(source.base_url());
    let mut fetch = spawn_fetch::<R, S>(Arc::clone(&source), mount.token());
    let mut fetch_pending = true;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut sweep = tokio::time::interval(SWEEP_PERIOD);

    tracing::debug!(view = ?R::KIND, export_dir = %export_dir.display(), "browse session started");
    view::print_page(&browser);
    print_help();
    prompt(&browser);

    loop {
        tokio::select! {
            result = &mut fetch, if fetch_pending => {
                fetch_pending = false;
                match result {
                    Ok(result) => browser.apply_fetch(result),
                    Err(_) => tracing::debug!("fetch task dropped its result"),
                }
                println!();
                view::print_page(&browser);
                view::print_active_notifications(&browser);
                prompt(&browser);
            }
            changed = stats_rx.changed(), if stats_live => {
                if changed.is_err() {
                    stats_live = false;
                    continue;
                }
                let latest = stats_rx.borrow_and_update().clone();
                if latest.is_some() && latest != last_stats {
                    tracing::debug!("stats snapshot updated");
                    last_stats = latest;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                let command = match parse_command(&line) {
                    Ok(c) => c,
                    Err(msg) => {
                        if !msg.is_empty() {
                            cprintln!("  {msg}");
                        }
                        prompt(&browser);
                        continue;
                    }
                };
                let today = Local::now().date_naive();
                match apply(&mut browser, command, today, &export_dir) {
                    Outcome::Quit => break,
                    Outcome::Render => view::print_page(&browser),
                    Outcome::Preview => view::print_preview(browser.preview()),
                    Outcome::Notify => {}
                    Outcome::Refetch => {
                        if !fetch_pending {
                            fetch = spawn_fetch::<R, S>(Arc::clone(&source), mount.token());
                            fetch_pending = true;
                        }
                    }
                    Outcome::ShowStats => view::print_stats(last_stats.as_ref()),
                    Outcome::Help => print_help(),
                }
                view::print_active_notifications(&browser);
                prompt(&browser);
            }
            _ = sweep.tick() => {
                browser.expire_notifications(Instant::now());
            }
        }
    }

    mount.unmount();
    tracing::debug!(view = ?R::KIND, "browse session ended");
    Ok(())
}
