// pgdump-monitor/src/commands/scan.rs
//
// USE CASE: One dry-run scan of the host, printed as a table or JSON.

use std::path::PathBuf;

use anyhow::Context;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use pgdump_core::application::{ProcessReport, ScanReport};
use pgdump_core::domain::detection::Verdict;
use pgdump_core::domain::units::format_bytes;
use pgdump_core::infrastructure::host::hostname;

use super::{ScanMode, build_scan_service, load_config};

/// Exit status when something suspicious is running.
const EXIT_SUSPICIOUS: i32 = 2;

pub async fn execute(config_path: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let loaded = load_config(config_path.as_deref())?;
    crate::init_tracing(&loaded.config.log.level);

    let mut service = build_scan_service(&loaded.config, hostname(), ScanMode::DryRun)?;
    let report = service.scan_once().await.context("Scan failed")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Cannot serialize scan report")?
        );
    } else {
        print_report(&report);
    }

    if report.suspicious_processes > 0 {
        std::process::exit(EXIT_SUSPICIOUS);
    }
    Ok(())
}

fn print_report(report: &ScanReport) {
    println!(
        "🔍 Scanned {} processes on {} ({} candidates)",
        report.processes_scanned,
        report.host,
        report.candidates.len()
    );
    if report.candidates.is_empty() {
        println!("✅ No pg_dump activity found.");
        return;
    }

    println!("{}", candidates_table(&report.candidates));

    if report.suspicious_processes > 0 {
        println!(
            "🚨 {} suspicious process(es). Dry run: nothing was journaled or blocked.",
            report.suspicious_processes
        );
    } else {
        println!("✅ Candidates found, none above the suspicion threshold.");
    }
}

fn candidates_table(candidates: &[ProcessReport]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "PID", "User", "Command", "Score", "Verdict", "PG conns", "Open files", "Reasons",
        ]);

    for process in candidates {
        table.add_row(vec![
            Cell::new(process.pid),
            Cell::new(&process.user),
            Cell::new(truncate(&command_line(process), 60)),
            Cell::new(format!("{}%", process.score)),
            Cell::new(process.verdict).fg(verdict_color(process.verdict)),
            Cell::new(process.postgres_connections),
            Cell::new(format_bytes(process.open_file_bytes)),
            Cell::new(process.reasons.join("\n")),
        ]);
    }
    table
}

fn command_line(process: &ProcessReport) -> String {
    if process.arguments.is_empty() {
        process.command.clone()
    } else {
        format!("{} {}", process.command, process.arguments)
    }
}

fn verdict_color(verdict: Verdict) -> Color {
    match verdict {
        Verdict::Benign => Color::Green,
        Verdict::Suspicious => Color::Yellow,
        Verdict::Block => Color::Red,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgdump_core::domain::detection::CommandLineAnalysis;

    fn report(verdict: Verdict) -> ProcessReport {
        ProcessReport {
            pid: 4242,
            user: "postgres".to_string(),
            command: "pg_dump".to_string(),
            arguments: "-h db -U admin -f dump.sql shop".to_string(),
            scan_count: 1,
            score: 85,
            verdict,
            reasons: vec!["Known pg_dump binary (pg_dump)".to_string()],
            matched_patterns: vec!["short_host".to_string()],
            dump_scope: "full",
            connections: 1,
            postgres_connections: 1,
            external_connections: 0,
            open_file_bytes: 2048,
            large_output_files: 0,
            suspicious_locations: 0,
            command_line: CommandLineAnalysis::default(),
            blocked: false,
        }
    }

    #[test]
    fn test_table_lists_candidates() {
        let rendered = candidates_table(&[report(Verdict::Block)]).to_string();
        assert!(rendered.contains("4242"));
        assert!(rendered.contains("85%"));
        assert!(rendered.contains("block"));
        assert!(rendered.contains("2.00 KB"));
    }

    #[test]
    fn test_command_column_shows_binary() {
        let process = report(Verdict::Suspicious);
        assert_eq!(command_line(&process), "pg_dump -h db -U admin -f dump.sql shop");

        let bare = ProcessReport {
            arguments: String::new(),
            ..process
        };
        assert_eq!(command_line(&bare), "pg_dump");
    }

    #[test]
    fn test_truncate_keeps_short_text() {
        assert_eq!(truncate("pg_dump", 10), "pg_dump");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
