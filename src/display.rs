use std::io::Write;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::report::{Report, UnitReport};
use crate::source::ProgressCallback;
use crate::utils::{NumberFormatOptions, format_number};

const SEPARATOR: &str = "--------------------";
const COUNT_HEADER: &str = "Transactions";

/// Two right-aligned columns: the unit's buckets and their counts.
pub fn render_unit_table(unit: &UnitReport, format_options: &NumberFormatOptions) -> String {
    let counts: Vec<String> = unit
        .rows
        .iter()
        .map(|(_, count)| format_number(*count, format_options))
        .collect();

    let title = unit.unit.title();
    let key_width = unit
        .rows
        .iter()
        .map(|(key, _)| key.chars().count())
        .chain(std::iter::once(title.len()))
        .max()
        .unwrap_or(0);
    let count_width = counts
        .iter()
        .map(|c| c.chars().count())
        .chain(std::iter::once(COUNT_HEADER.len()))
        .max()
        .unwrap_or(0);

    let mut out = format!("{title:>key_width$}  {COUNT_HEADER:>count_width$}\n");
    for ((key, _), count) in unit.rows.iter().zip(&counts) {
        out.push_str(&format!("{key:>key_width$}  {count:>count_width$}\n"));
    }
    out.push_str(SEPARATOR);
    out.push('\n');
    out
}

pub fn peak_line(unit: &UnitReport) -> Option<String> {
    let peak = unit.peak.as_ref()?;
    let mut line = format!("{} with most transactions is {}", unit.unit.title(), peak);
    if unit.is_tied() {
        let others: Vec<&str> = unit
            .ties
            .iter()
            .filter(|k| *k != peak)
            .map(String::as_str)
            .collect();
        line.push_str(&format!(" (tied with {})", others.join(", ")));
    }
    Some(line)
}

/// The full console report: header, one table per unit, then peak lines.
pub fn render_report(report: &Report, format_options: &NumberFormatOptions) -> String {
    let mut out = format!(
        "Printing statistic of {} transactions (block numbers {}-{}, timezone {}):\n\n",
        format_number(report.transactions, format_options),
        report.start_block,
        report.end_block,
        report.timezone
    );

    if report.is_empty() {
        out.push_str("No transactions found in range\n");
        return out;
    }

    for unit in &report.units {
        out.push_str(&render_unit_table(unit, format_options));
    }
    out.push('\n');
    for line in report.units.iter().filter_map(peak_line) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub fn show_connecting(url: &str) {
    eprintln!("Connecting to {url} ...");
}

pub fn show_connected(url: &str, head: u64) {
    eprintln!("Successfully connected to {url} (latest block {head})");
}

pub fn show_error(message: &str) {
    eprintln!("ERROR: {message}");
}

/// Single-line block fetch progress on stderr, redrawn at most every 100ms
/// unless the fetch has finished.
pub fn create_fetch_progress_callback(format_options: &NumberFormatOptions) -> ProgressCallback {
    let format_options = format_options.clone();
    let last_draw: Mutex<Option<Instant>> = Mutex::new(None);

    Box::new(move |done, total| {
        let Ok(mut last) = last_draw.lock() else {
            return;
        };
        let finished = done >= total;
        if !finished && last.is_some_and(|t| t.elapsed() < Duration::from_millis(100)) {
            return;
        }
        *last = Some(Instant::now());

        let percent = if total == 0 { 100 } else { done * 100 / total };
        let mut stderr = std::io::stderr();
        let _ = write!(
            stderr,
            "\rFetching blocks: {}/{} ({percent}%)",
            format_number(done, &format_options),
            format_number(total, &format_options),
        );
        if finished {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::TimeUnit;

    fn unit(unit: TimeUnit, rows: &[(&str, u64)], peak: Option<&str>, ties: &[&str]) -> UnitReport {
        UnitReport {
            unit,
            rows: rows.iter().map(|(k, c)| (k.to_string(), *c)).collect(),
            peak: peak.map(str::to_string),
            ties: ties.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn sample_report() -> Report {
        Report {
            transactions: 3,
            start_block: 2_000_000,
            end_block: 2_000_500,
            timezone: "UTC".to_string(),
            units: vec![
                unit(TimeUnit::Year, &[("2023", 3)], Some("2023"), &["2023"]),
                unit(TimeUnit::Month, &[("Jan", 3)], Some("Jan"), &["Jan"]),
                unit(
                    TimeUnit::Weekday,
                    &[("Mon", 2), ("Tue", 1)],
                    Some("Mon"),
                    &["Mon"],
                ),
                unit(TimeUnit::Hour, &[("9", 2), ("10", 1)], Some("9"), &["9"]),
                unit(
                    TimeUnit::Minute,
                    &[("9:0", 2), ("10:0", 1)],
                    Some("9:0"),
                    &["9:0"],
                ),
            ],
        }
    }

    #[test]
    fn unit_table_is_right_aligned() {
        let report = sample_report();
        let table = render_unit_table(
            report.unit(TimeUnit::Weekday).unwrap(),
            &NumberFormatOptions::default(),
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Day  Transactions");
        assert_eq!(lines[1], "Mon             2");
        assert_eq!(lines[2], "Tue             1");
        assert_eq!(lines[3], SEPARATOR);
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn report_prints_tables_then_peaks() {
        let text = render_report(&sample_report(), &NumberFormatOptions::default());

        assert!(text.starts_with(
            "Printing statistic of 3 transactions (block numbers 2000000-2000500, timezone UTC):"
        ));
        assert_eq!(text.matches(SEPARATOR).count(), 5);
        assert!(text.contains("Year with most transactions is 2023\n"));
        assert!(text.contains("Month with most transactions is Jan\n"));
        assert!(text.contains("Day with most transactions is Mon\n"));
        assert!(text.contains("Hour with most transactions is 9\n"));
        assert!(text.contains("Minute with most transactions is 9:0\n"));

        let last_table = text.rfind(SEPARATOR).unwrap();
        let first_peak = text.find("with most transactions").unwrap();
        assert!(last_table < first_peak);
    }

    #[test]
    fn tied_peaks_are_listed() {
        let tied = unit(
            TimeUnit::Weekday,
            &[("Mon", 4), ("Tue", 4), ("Wed", 1)],
            Some("Mon"),
            &["Mon", "Tue"],
        );
        assert_eq!(
            peak_line(&tied).unwrap(),
            "Day with most transactions is Mon (tied with Tue)"
        );
    }

    #[test]
    fn empty_report_skips_peaks() {
        let report = Report {
            transactions: 0,
            start_block: 5,
            end_block: 6,
            timezone: "UTC".to_string(),
            units: TimeUnit::ALL
                .iter()
                .map(|u| unit(*u, &[], None, &[]))
                .collect(),
        };

        let text = render_report(&report, &NumberFormatOptions::default());
        assert!(text.contains("No transactions found in range"));
        assert!(!text.contains("with most transactions"));
        assert!(report.units.iter().all(|u| peak_line(u).is_none()));
    }

    #[test]
    fn counts_use_number_formatting() {
        let big = unit(TimeUnit::Year, &[("2023", 1_234_567)], Some("2023"), &["2023"]);
        let options = NumberFormatOptions {
            use_comma: true,
            ..NumberFormatOptions::default()
        };
        let table = render_unit_table(&big, &options);
        assert!(table.contains("1,234,567"));
    }

    #[test]
    fn progress_callback_runs_without_panicking() {
        let progress = create_fetch_progress_callback(&NumberFormatOptions::default());
        progress(0, 10);
        progress(5, 10);
        progress(10, 10);
        progress(0, 0);
    }
}
