use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use crate::notify::NotificationKind;

static FORCE_NO_COLOR: AtomicBool = AtomicBool::new(false);
static COLOR: OnceLock<bool> = OnceLock::new();

pub fn disable_color() {
    FORCE_NO_COLOR.store(true, Ordering::Relaxed);
}

pub fn use_color() -> bool {
    if FORCE_NO_COLOR.load(Ordering::Relaxed) {
        return false;
    }
    *COLOR.get_or_init(|| std::env::var("NO_COLOR").is_err() && atty::is(atty::Stream::Stdout))
}

pub fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_esc = false;
    for ch in s.chars() {
        if in_esc {
            if ch == 'm' {
                in_esc = false;
            }
        } else if ch == '\x1b' {
            in_esc = true;
        } else {
            out.push(ch);
        }
    }
    out
}

macro_rules! cprintln {
    () => { println!() };
    ($($arg:tt)*) => {{
        let s = format!($($arg)*);
        if $crate::view::fmt::use_color() {
            println!("{s}");
        } else {
            println!("{}", $crate::view::fmt::strip_ansi(&s));
        }
    }};
}
pub(crate) use cprintln;

macro_rules! ceprintln {
    () => { eprintln!() };
    ($($arg:tt)*) => {{
        let s = format!($($arg)*);
        if $crate::view::fmt::use_color() {
            eprintln!("{s}");
        } else {
            eprintln!("{}", $crate::view::fmt::strip_ansi(&s));
        }
    }};
}
pub(crate) use ceprintln;

macro_rules! cprint {
    ($($arg:tt)*) => {{
        let s = format!($($arg)*);
        if $crate::view::fmt::use_color() {
            print!("{s}");
        } else {
            print!("{}", $crate::view::fmt::strip_ansi(&s));
        }
    }};
}
pub(crate) use cprint;

pub(crate) const RESET: &str = "\x1b[0m";
pub(crate) const BOLD: &str = "\x1b[1m";
pub(crate) const DIM: &str = "\x1b[2m";
pub(crate) const CYAN: &str = "\x1b[36m";
pub(crate) const GREEN: &str = "\x1b[32m";
pub(crate) const RED: &str = "\x1b[31m";
pub(crate) const YELLOW: &str = "\x1b[33m";
pub(crate) const BRIGHT_RED: &str = "\x1b[91m";
pub(crate) const WHITE: &str = "\x1b[97m";
pub(crate) const BG_BLUE: &str = "\x1b[44m";
pub(crate) const BG_RED: &str = "\x1b[41m";

pub(crate) fn trunc(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s
            .char_indices()
            .nth(max.saturating_sub(1))
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        format!("{}…", &s[..end])
    }
}

pub(crate) fn notification_badge(kind: NotificationKind) -> String {
    match kind {
        NotificationKind::Success => format!("{GREEN}✔ ok  {RESET}"),
        NotificationKind::Error => format!("{BRIGHT_RED}✖ err {RESET}"),
        NotificationKind::Info => format!("{CYAN}ℹ info{RESET}"),
        NotificationKind::Warning => format!("{YELLOW}▲ warn{RESET}"),
    }
}

/// Status column: violations loud, verified calm, anything else plain.
pub(crate) fn status_badge(status: &str) -> String {
    match status.to_ascii_uppercase().as_str() {
        "VIOLATION" => format!("{BG_RED}{BOLD}{WHITE} {status} {RESET}"),
        "VERIFIED" | "IDENTIFIED" => format!("{BG_BLUE}{BOLD}{WHITE} {status} {RESET}"),
        _ => format!("{DIM}{status}{RESET}"),
    }
}

pub(crate) fn section_header(title: &str) {
    let rule = "─".repeat(44usize.saturating_sub(title.chars().count()));
    cprintln!("{DIM}── {title} {rule}{RESET}");
}

/// `2024-05-01T10:15:00.123` → `2024-05-01 10:15:00`.
pub(crate) fn short_timestamp(ts: &str) -> String {
    let (date, time) = crate::models::split_local(ts);
    if date.is_empty() {
        ts.to_string()
    } else {
        format!("{date} {time}")
    }
}
