// Colored terminal output for detection reports and configuration.
//
// The CLI's one-shot commands delegate here; the HTTP surface never prints.

use colored::Colorize;

use crate::config::Config;
use crate::error::ServiceError;
use crate::report::{ConfidenceBand, DetectionReport};

/// Display a detection report in the terminal.
pub fn display_report(report: &DetectionReport, subject: &str) {
    println!(
        "\n{}",
        format!("=== {} detection ===", report.modality).bold()
    );
    println!("  {:<14} {}", "Input".dimmed(), super::truncate_chars(subject, 60));
    println!(
        "  {:<14} {}%  ({})",
        "AI probability".dimmed(),
        report.ai_probability,
        colorize_band(report.confidence_band),
    );
    println!("  {:<14}", "Signals".dimmed());
    for explanation in &report.explanations {
        println!("    - {explanation}");
    }
    println!("\n  {}", report.disclaimer.dimmed());
    println!("  {}", format!("request {}", report.request_id).dimmed());
}

/// Display a failed detection with its wire status and body.
pub fn display_error(err: &ServiceError) {
    let (status, body) = err.to_wire();
    println!(
        "{} {} ({})",
        "Detection failed:".red().bold(),
        err.message,
        err.code
    );
    println!("  {}", format!("HTTP {status} {body}").dimmed());
}

/// Display the resolved configuration, secrets redacted.
pub fn display_config(config: &Config) {
    println!("\n{}", "=== Configuration ===".bold());
    for (name, value) in config.describe() {
        println!("  {:<16} {}", name.dimmed(), value);
    }
}

/// Colorize a confidence band.
fn colorize_band(band: ConfidenceBand) -> colored::ColoredString {
    match band {
        ConfidenceBand::High => band.as_str().red().bold(),
        ConfidenceBand::Medium => band.as_str().yellow(),
        ConfidenceBand::Low => band.as_str().green(),
    }
}
