//! Markdown report and live progress line.
//!
//! ```text
//! | Server                    | Tester                         | Duration  |
//! | ------------------------- | ------------------------------ | --------: |
//! | Flask jsonify             | Pytest real request get        |     1.234 |
//! | Express                   | Jest fetch get                 | Timeout (120 s) |
//! ```

use crate::config::BenchmarkOptions;
use crate::orchestrator::{PairingOutcome, PairingResult, ProgressSink};
use chrono::NaiveDateTime;
use reqbench_common::VariantName;
use std::io::{self, Write};
use std::time::Duration;
use tracing::debug;

pub const SERVER_COLUMN_WIDTH: usize = 25;
pub const TESTER_COLUMN_WIDTH: usize = 30;
pub const DURATION_COLUMN_WIDTH: usize = 9;

const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[39m";
const CLEAR_LINE: &str = "\x1b[2K\r";

/// One table row with fixed-width, left-justified cells.
pub fn format_row(server: &str, tester: &str, duration: &str) -> String {
    format!(
        "| {:<sw$} | {:<tw$} | {:<dw$} |",
        server,
        tester,
        duration,
        sw = SERVER_COLUMN_WIDTH,
        tw = TESTER_COLUMN_WIDTH,
        dw = DURATION_COLUMN_WIDTH
    )
}

fn format_result_row(server: &VariantName, tester: &VariantName, cell: &str) -> String {
    format_row(&server.display_name(), &tester.display_name(), cell)
}

/// Seconds with millisecond precision, right-aligned to the column width.
pub fn format_seconds(duration: Duration) -> String {
    format!("{:9.3}", duration.as_secs_f64())
}

pub fn outcome_cell(outcome: &PairingOutcome) -> String {
    match outcome {
        PairingOutcome::Success(duration) => format_seconds(*duration),
        PairingOutcome::Timeout(budget) => format!("Timeout ({} s)", budget.as_secs_f64()),
        PairingOutcome::Error(_) => "Error".to_string(),
        PairingOutcome::Aborted => "Aborted".to_string(),
    }
}

/// Writes the markdown report. Every row is flushed as soon as it is written.
pub struct Report<W: Write> {
    out: W,
}

impl<W: Write> Report<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn preamble(&mut self, options: &BenchmarkOptions, updated: NaiveDateTime) -> io::Result<()> {
        writeln!(self.out, "# {}", options.title)?;
        writeln!(self.out)?;

        if !options.description.is_empty() {
            for line in &options.description {
                writeln!(self.out, "{}", line)?;
            }
            writeln!(self.out)?;
        }

        writeln!(self.out, "This page was last updated at {}", updated.format("%Y-%m-%dT%H:%M"))?;
        writeln!(self.out)?;

        if !options.parameters.is_empty() {
            let parameters: Vec<String> = options
                .parameters
                .iter()
                .map(|(key, value)| format!("`{}={}`", key, value))
                .collect();
            writeln!(self.out, "Each tester ran with {}.", parameters.join(", "))?;
            writeln!(self.out)?;
        }

        self.out.flush()
    }

    pub fn header(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", format_row("Server", "Tester", "Duration"))?;
        writeln!(
            self.out,
            "| {} | {} | {}: |",
            "-".repeat(SERVER_COLUMN_WIDTH),
            "-".repeat(TESTER_COLUMN_WIDTH),
            "-".repeat(DURATION_COLUMN_WIDTH - 1)
        )?;
        self.out.flush()
    }

    pub fn row(&mut self, result: &PairingResult) -> io::Result<()> {
        let cell = outcome_cell(&result.outcome);
        writeln!(self.out, "{}", format_result_row(&result.server, &result.tester, &cell))?;
        self.out.flush()
    }

    pub fn aborted(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Aborted")?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Progress line in yellow, rewritten in place with a carriage return.
pub struct TerminalProgress<W: Write> {
    out: W,
    dirty: bool,
}

impl<W: Write> TerminalProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out, dirty: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        write!(self.out, "{}{}{}\r", YELLOW, line, RESET)?;
        self.out.flush()
    }
}

impl TerminalProgress<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> ProgressSink for TerminalProgress<W> {
    fn update(&mut self, server: &VariantName, tester: &VariantName, elapsed: Duration) {
        let line = format_result_row(server, tester, &format_seconds(elapsed));
        match self.write_line(&line) {
            Ok(()) => self.dirty = true,
            Err(e) => debug!("Failed to write progress line: {}", e),
        }
    }

    fn finish(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        if let Err(e) = write!(self.out, "{}", CLEAR_LINE).and_then(|_| self.out.flush()) {
            debug!("Failed to clear progress line: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::PairingFailure;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn result(server: &str, tester: &str, outcome: PairingOutcome) -> PairingResult {
        PairingResult {
            server: VariantName::from(server),
            tester: VariantName::from(tester),
            outcome,
        }
    }

    fn rendered<F: FnOnce(&mut Report<Vec<u8>>) -> io::Result<()>>(f: F) -> String {
        let mut report = Report::new(Vec::new());
        f(&mut report).unwrap();
        String::from_utf8(report.into_inner()).unwrap()
    }

    #[test]
    fn test_header_and_separator() {
        let text = rendered(|r| r.header());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            format!("| Server{} | Tester{} | Duration  |", " ".repeat(19), " ".repeat(24))
        );
        assert_eq!(
            lines[1],
            format!("| {} | {} | --------: |", "-".repeat(25), "-".repeat(30))
        );
        assert_eq!(lines[0].len(), lines[1].len());
    }

    #[test]
    fn test_success_row() {
        let text = rendered(|r| {
            r.row(&result(
                "flask_json_lib",
                "jest_sync_request_curl_get",
                PairingOutcome::Success(Duration::from_millis(12_345)),
            ))
        });

        assert_eq!(
            text,
            format!(
                "| Flask json lib{} | Jest sync request curl get{} |    12.345 |\n",
                " ".repeat(11),
                " ".repeat(4)
            )
        );
    }

    #[test]
    fn test_outcome_cells() {
        assert_eq!(outcome_cell(&PairingOutcome::Success(Duration::from_millis(1500))), "    1.500");
        assert_eq!(
            outcome_cell(&PairingOutcome::Timeout(Duration::from_secs(120))),
            "Timeout (120 s)"
        );
        assert_eq!(
            outcome_cell(&PairingOutcome::Timeout(Duration::from_millis(2500))),
            "Timeout (2.5 s)"
        );
        assert_eq!(
            outcome_cell(&PairingOutcome::Error(PairingFailure::NonZeroExit { exit_code: 1 })),
            "Error"
        );
        assert_eq!(outcome_cell(&PairingOutcome::Aborted), "Aborted");
    }

    #[test]
    fn test_long_cells_are_not_truncated() {
        let row = format_row("Server", "Tester", "Timeout (120 s)");
        assert!(row.ends_with("| Timeout (120 s) |"));
    }

    #[test]
    fn test_preamble() {
        let options = BenchmarkOptions {
            title: "Best Test Request".to_string(),
            description: vec![
                "A simple benchmark to determine the best request function when".to_string(),
                "testing (or at least the fastest one).".to_string(),
            ],
            parameters: BTreeMap::from([
                ("NUM_TESTS".to_string(), "100".to_string()),
                ("NUM_REQUESTS".to_string(), "50".to_string()),
            ]),
            ..BenchmarkOptions::default()
        };
        let updated = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 7, 59)
            .unwrap();

        let text = rendered(|r| r.preamble(&options, updated));

        assert_eq!(
            text,
            "# Best Test Request\n\
             \n\
             A simple benchmark to determine the best request function when\n\
             testing (or at least the fastest one).\n\
             \n\
             This page was last updated at 2024-03-09T14:07\n\
             \n\
             Each tester ran with `NUM_REQUESTS=50`, `NUM_TESTS=100`.\n\
             \n"
        );
    }

    #[test]
    fn test_preamble_without_extras() {
        let updated = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let text = rendered(|r| r.preamble(&BenchmarkOptions::default(), updated));
        assert_eq!(text, "# Benchmark\n\nThis page was last updated at 2024-01-01T00:00\n\n");
    }

    #[test]
    fn test_aborted_marker() {
        assert_eq!(rendered(|r| r.aborted()), "\nAborted\n");
    }

    #[test]
    fn test_progress_line() {
        let mut progress = TerminalProgress::new(Vec::new());
        progress.update(
            &VariantName::from("express"),
            &VariantName::from("jest_fetch_get"),
            Duration::from_millis(2_100),
        );
        progress.finish();
        progress.finish();

        let text = String::from_utf8(progress.into_inner()).unwrap();
        let expected_row = format_row("Express", "Jest fetch get", "    2.100");
        assert_eq!(text, format!("\x1b[33m{}\x1b[39m\r\x1b[2K\r", expected_row));
    }

    #[test]
    fn test_progress_finish_without_updates_writes_nothing() {
        let mut progress = TerminalProgress::new(Vec::new());
        progress.finish();
        assert!(progress.into_inner().is_empty());
    }
}
