//! The run command: copy, extract and relink, then print a summary

use colored::Colorize;

use dbsync_core::{
    DescriptorOutcome, PowerShellHost, RunMode, RunReport, Settings, SyncEngine, TransferOutcome,
};

use crate::error::Result;

/// Run every configured database through `mode` and print the summary.
pub fn run_sync(settings: Settings, mode: RunMode) -> Result<RunReport> {
    println!(
        "{} Running dbsync ({})...",
        "=>".blue().bold(),
        mode.to_string().cyan()
    );

    let host = PowerShellHost::new(settings.host_shell());
    let engine = SyncEngine::new(settings, Box::new(host))?;
    let report = engine.run(mode)?;

    print_summary(&report);
    Ok(report)
}

fn print_summary(report: &RunReport) {
    println!();
    println!("{}", "Summary".bold());
    for outcome in &report.outcomes {
        let label = if outcome.is_failed() {
            "FAIL".red().bold()
        } else {
            " OK ".green().bold()
        };
        println!("  {} {} {}", label, outcome.name.cyan(), describe(outcome).dimmed());
        for reason in &outcome.failures {
            println!("       {} {}", "-".red(), reason);
        }
    }

    println!();
    let total = report.outcomes.len();
    if report.is_success() {
        println!(
            "{} {} of {} databases processed successfully.",
            "OK".green().bold(),
            total,
            total
        );
    } else {
        println!(
            "{} {} of {} databases failed. See the log for details.",
            "FAILED".red().bold(),
            report.failed_count(),
            total
        );
    }
}

fn describe(outcome: &DescriptorOutcome) -> String {
    let mut parts = Vec::new();

    if let Some(reachability) = &outcome.reachability {
        parts.push(format!("remote {}", reachability));
    }
    match &outcome.transfer {
        Some(TransferOutcome::Copied { bytes, .. }) => parts.push(format!("copied {} bytes", bytes)),
        Some(TransferOutcome::Extracted(extract)) => {
            parts.push(format!("extracted {} records", extract.rows_copied))
        }
        Some(TransferOutcome::Skipped { .. }) => parts.push("copy skipped".to_string()),
        Some(TransferOutcome::Failed { .. }) => parts.push("copy failed".to_string()),
        None => {}
    }
    match &outcome.links {
        Some(links) => {
            let mut text = format!("{} relinked", links.relinked());
            if links.unresolved() > 0 {
                text.push_str(&format!(", {} unresolved", links.unresolved()));
            }
            parts.push(text);
        }
        None if outcome.reachability.is_none() || outcome.transfer.is_some() => {
            parts.push("links not updated".to_string())
        }
        None => {}
    }

    parts.join(", ")
}
