use super::fmt::{cprintln, section_header, BOLD, CYAN, DIM, GREEN, RED, RESET, YELLOW};
use crate::models::{AnalyticsSnapshot, AnalyticsView, StatsSnapshot};

const BAR_WIDTH: u64 = 24;

fn bar(value: u64, max: u64) -> String {
    if value == 0 {
        return String::new();
    }
    let len = (value * BAR_WIDTH) / max.max(1);
    "█".repeat(len.max(1) as usize)
}

/// Personnel, violations and compliance, as on the stats card.
pub(crate) fn stats_lines(s: &StatsSnapshot) -> Vec<String> {
    let compliance = s.compliance_percent();
    let color = match compliance {
        90.. => GREEN,
        70..=89 => YELLOW,
        _ => RED,
    };
    let mut lines = vec![
        format!("  {BOLD}{}{RESET} verified personnel", s.person_count),
        format!("  {RED}{}{RESET} violations", s.violation_count),
        format!("  {color}{compliance}%{RESET} compliance"),
    ];
    if s.total_detections > 0 || s.active_cameras > 0 {
        lines.push(format!(
            "  {DIM}{} detections total · {} camera{} active · service rate {}{RESET}",
            s.total_detections,
            s.active_cameras,
            if s.active_cameras == 1 { "" } else { "s" },
            s.compliance_display(),
        ));
    }
    lines
}

pub(crate) fn analytics_lines(a: &AnalyticsSnapshot) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!("  {BOLD}last 7 days{RESET}"));
    lines.push(format!("  {DIM}───────────{RESET}"));
    let max = a
        .trend
        .iter()
        .map(|p| p.violations.max(p.verified))
        .max()
        .unwrap_or(0);
    for p in &a.trend {
        lines.push(format!(
            "  {:<4} {RED}{:>4}{RESET} {RED}{:<24}{RESET} {GREEN}{:>4}{RESET} {GREEN}{}{RESET}",
            p.name,
            p.violations,
            bar(p.violations, max),
            p.verified,
            bar(p.verified, max)
        ));
    }

    lines.push(String::new());
    lines.push(format!("  {BOLD}hourly activity{RESET}"));
    lines.push(format!("  {DIM}───────────────{RESET}"));
    let max = a.hourly.iter().map(|h| h.events).max().unwrap_or(0);
    for h in &a.hourly {
        lines.push(format!(
            "  {:<6} {:>4} {CYAN}{}{RESET}",
            h.name,
            h.events,
            bar(h.events, max)
        ));
    }

    if !a.pie.is_empty() {
        lines.push(String::new());
        lines.push(format!("  {BOLD}breakdown{RESET}"));
        lines.push(format!("  {DIM}─────────{RESET}"));
        let total: u64 = a.pie.iter().map(|s| s.value).sum();
        for slice in &a.pie {
            let pct = if total > 0 { slice.value * 100 / total } else { 0 };
            lines.push(format!("  {:<12} {:>5}  {DIM}{pct}%{RESET}", slice.name, slice.value));
        }
    }
    lines
}

pub fn print_stats(stats: Option<&StatsSnapshot>) {
    println!();
    section_header("idintel stats");
    println!();
    match stats {
        Some(s) => {
            for line in stats_lines(s) {
                cprintln!("{line}");
            }
        }
        None => cprintln!("  {DIM}waiting for stats…{RESET}"),
    }
    println!();
}

pub fn print_analytics(view: &AnalyticsView) {
    println!();
    section_header("idintel analytics");
    println!();

    let violations_7d = view.analytics.as_ref().map(AnalyticsSnapshot::total_violations_7d);
    let compliance = view.stats.as_ref().map(StatsSnapshot::compliance_display);
    cprintln!(
        "  {RED}{}{RESET} violations (7d) · {GREEN}{}{RESET} compliance",
        violations_7d.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
        compliance.unwrap_or_else(|| "-".into()),
    );
    if let Some(s) = &view.stats {
        cprintln!(
            "  {DIM}{} detections · {} camera{} active{RESET}",
            s.total_detections,
            s.active_cameras,
            if s.active_cameras == 1 { "" } else { "s" }
        );
    }
    println!();

    match &view.analytics {
        Some(a) => {
            for line in analytics_lines(a) {
                cprintln!("{line}");
            }
        }
        None => cprintln!("  {DIM}chart data unavailable{RESET}"),
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::super::fmt::strip_ansi;
    use super::*;
    use crate::models::{HourlyBucket, PieSlice, TrendPoint};

    #[test]
    fn stats_lines_show_derived_compliance() {
        let s = StatsSnapshot {
            person_count: 38,
            violation_count: 2,
            ..Default::default()
        };
        let lines: Vec<String> = stats_lines(&s).iter().map(|l| strip_ansi(l)).collect();
        assert_eq!(lines[0], "  38 verified personnel");
        assert_eq!(lines[2], "  95% compliance");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn bars_scale_to_max() {
        assert_eq!(bar(0, 10), "");
        assert_eq!(bar(10, 10).chars().count(), BAR_WIDTH as usize);
        assert_eq!(bar(1, 1000).chars().count(), 1);
    }

    #[test]
    fn analytics_lines_cover_all_sections() {
        let a = AnalyticsSnapshot {
            trend: vec![TrendPoint { name: "Mon".into(), violations: 2, verified: 8 }],
            hourly: vec![HourlyBucket { name: "08:00".into(), events: 5 }],
            pie: vec![
                PieSlice { name: "Verified".into(), value: 75, color: None },
                PieSlice { name: "Violations".into(), value: 25, color: Some("#ef4444".into()) },
            ],
        };
        let text = strip_ansi(&analytics_lines(&a).join("\n"));
        assert!(text.contains("last 7 days"));
        assert!(text.contains("08:00"));
        assert!(text.contains("Violations      25  25%"));
    }
}
