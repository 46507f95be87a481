use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::core::write_json_file;

use super::suite::CheckResult;

#[derive(Debug, Clone, Serialize)]
pub struct SmokeReport {
	pub base_url: String,
	pub started_at: String,
	pub finished_at: String,
	pub duration_ms: u128,
	pub checks_total: usize,
	pub checks_passed: usize,
	pub checks_failed: usize,
	pub checks: Vec<CheckResult>,
}

impl SmokeReport {
	pub fn new(
		base_url: String,
		started_at: String,
		finished_at: String,
		duration_ms: u128,
		checks: Vec<CheckResult>,
	) -> Self {
		let checks_failed = checks.iter().filter(|c| !c.passed).count();
		Self {
			base_url,
			started_at,
			finished_at,
			duration_ms,
			checks_total: checks.len(),
			checks_passed: checks.len() - checks_failed,
			checks_failed,
			checks,
		}
	}
}

pub fn print_human_report(report: &SmokeReport) {
	for check in &report.checks {
		let mark = if check.passed { "PASS" } else { "FAIL" };
		println!("  {mark} {} - {}", check.name, check.message);
	}
	println!("Smoke run summary ({}):", report.base_url);
	println!(
		"  checks: {} total, {} passed, {} failed",
		report.checks_total, report.checks_passed, report.checks_failed
	);
	if report.checks_total > 0 {
		println!(
			"  success rate: {:.1}%",
			report.checks_passed as f64 * 100.0 / report.checks_total as f64
		);
	}
	println!("  duration_ms: {}", report.duration_ms);
}

pub fn write_json_report(path: &Path, report: &SmokeReport) -> Result<()> {
	write_json_file(path, report)
}
