//! Time a batch of commands through the assistant

use colored::*;
use eyre::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::module::envelope::Envelope;
use crate::session::Session;

#[derive(Debug, Default, Serialize)]
pub struct BenchReport {
    /// Seconds spent across every command
    pub total_time: f64,
    pub successful_commands: usize,
    pub failed_commands: usize,
    pub average_response_time: f64,
    pub response_times: Vec<f64>,
}

impl BenchReport {
    pub fn success_rate(&self) -> f64 {
        let total = self.successful_commands + self.failed_commands;
        if total == 0 {
            return 0.0;
        }
        self.successful_commands as f64 / total as f64 * 100.0
    }
}

pub fn run(
    commands: Vec<String>,
    file: Option<PathBuf>,
    format: OutputFormat,
    config: &Config,
    quiet: bool,
) -> Result<()> {
    let commands = collect_commands(commands, file.as_ref())?;
    if commands.is_empty() {
        eyre::bail!("No commands to run; pass them as arguments or with --file");
    }

    let session = Session::start(config, false)?;

    if format == OutputFormat::Text && !quiet {
        println!("{}", "Running benchmarks...".bold().blue());
    }
    let report = run_benchmark(&commands, |command| session.agent.process(command));

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&report)?),
        OutputFormat::Text => display_report(&report),
    }

    Ok(())
}

fn collect_commands(mut commands: Vec<String>, file: Option<&PathBuf>) -> Result<Vec<String>> {
    if let Some(path) = file {
        let content =
            fs::read_to_string(path).context(format!("Failed to read commands from {}", path.display()))?;
        commands.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(String::from),
        );
    }
    Ok(commands)
}

pub fn run_benchmark<F>(commands: &[String], mut process: F) -> BenchReport
where
    F: FnMut(&str) -> Envelope,
{
    let mut report = BenchReport::default();

    for command in commands {
        let start = Instant::now();
        let envelope = process(command);
        let elapsed = start.elapsed().as_secs_f64();

        log::debug!("bench: {:?} took {:.3}s", command, elapsed);
        report.response_times.push(elapsed);

        if envelope.is_success() {
            report.successful_commands += 1;
        } else {
            report.failed_commands += 1;
        }
    }

    report.total_time = report.response_times.iter().sum();
    if !commands.is_empty() {
        report.average_response_time = report.total_time / commands.len() as f64;
    }

    report
}

fn display_report(report: &BenchReport) {
    println!();
    println!("{}", "Benchmark Results".bold());
    println!();

    let rows = [
        ("Total Time", format!("{:.2}s", report.total_time)),
        ("Average Response Time", format!("{:.2}s", report.average_response_time)),
        ("Successful Commands", report.successful_commands.to_string()),
        ("Failed Commands", report.failed_commands.to_string()),
        ("Success Rate", format!("{:.1}%", report.success_rate())),
    ];

    for (metric, value) in rows {
        println!("  {:<24} {}", metric.cyan(), value.magenta());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_run_benchmark_counts_outcomes() {
        let commands: Vec<String> = ["ok", "fail", "ok"].iter().map(|s| s.to_string()).collect();

        let report = run_benchmark(&commands, |command| {
            if command == "ok" {
                Envelope::success("done")
            } else {
                Envelope::error("nope")
            }
        });

        assert_eq!(report.successful_commands, 2);
        assert_eq!(report.failed_commands, 1);
        assert_eq!(report.response_times.len(), 3);
        assert!((report.total_time - report.response_times.iter().sum::<f64>()).abs() < 1e-9);
        assert!((report.success_rate() - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_report_has_zero_rate() {
        let report = run_benchmark(&[], |_| Envelope::success("unused"));
        assert_eq!(report.average_response_time, 0.0);
        assert_eq!(report.success_rate(), 0.0);
    }

    #[test]
    fn test_collect_commands_from_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("commands.txt");
        fs::write(&path, "# sample\nremind me to stretch in 5 minutes\n\n  hello  \n").unwrap();

        let commands = collect_commands(vec!["first".to_string()], Some(&path)).unwrap();
        assert_eq!(commands, vec!["first", "remind me to stretch in 5 minutes", "hello"]);
    }
}
