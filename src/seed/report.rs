use std::fmt;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::error;

use crate::core::write_json_file;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
	Org,
	Menu,
	Category,
	Subcategory,
	Environment,
	Table,
	Product,
	User,
	Customer,
	Tag,
	Reservation,
	ProductTag,
	NotificationTemplate,
	Settings,
	Theme,
	Fixture,
	Timeout,
}

impl EntityKind {
	pub fn label(self) -> &'static str {
		match self {
			Self::Org => "org",
			Self::Menu => "menu",
			Self::Category => "category",
			Self::Subcategory => "subcategory",
			Self::Environment => "environment",
			Self::Table => "table",
			Self::Product => "product",
			Self::User => "user",
			Self::Customer => "customer",
			Self::Tag => "tag",
			Self::Reservation => "reservation",
			Self::ProductTag => "product_tag",
			Self::NotificationTemplate => "notification_template",
			Self::Settings => "settings",
			Self::Theme => "theme",
			Self::Fixture => "fixture",
			Self::Timeout => "timeout",
		}
	}
}

impl fmt::Display for EntityKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeedError {
	pub kind: EntityKind,
	pub item: String,
	pub message: String,
}

impl fmt::Display for SeedError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}] {}: {}", self.kind, self.item, self.message)
	}
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct Tally {
	pub created: usize,
	pub skipped: usize,
	pub failed: usize,
}

impl Tally {
	pub fn add(&mut self, other: Tally) {
		self.created += other.created;
		self.skipped += other.skipped;
		self.failed += other.failed;
	}
}

/// Counters and errors of one seed file.
#[derive(Debug, Clone, Default)]
pub struct SeedState {
	pub tally: Tally,
	pub errors: Vec<SeedError>,
}

impl SeedState {
	pub fn created(&mut self) {
		self.tally.created += 1;
	}

	pub fn skipped(&mut self) {
		self.tally.skipped += 1;
	}

	pub fn fail(&mut self, kind: EntityKind, item: impl Into<String>, message: impl Into<String>) {
		let err = SeedError {
			kind,
			item: item.into(),
			message: message.into(),
		};
		error!("{err}");
		self.tally.failed += 1;
		self.errors.push(err);
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
	pub file: String,
	pub created: usize,
	pub skipped: usize,
	pub failed: usize,
	pub duration_ms: u128,
	pub errors: Vec<SeedError>,
}

impl FileReport {
	pub fn new(file: String, state: SeedState, duration_ms: u128) -> Self {
		Self {
			file,
			created: state.tally.created,
			skipped: state.tally.skipped,
			failed: state.tally.failed,
			duration_ms,
			errors: state.errors,
		}
	}

	pub fn tally(&self) -> Tally {
		Tally {
			created: self.created,
			skipped: self.skipped,
			failed: self.failed,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
	pub started_at: String,
	pub finished_at: String,
	pub duration_ms: u128,
	pub files_total: usize,
	pub created: usize,
	pub skipped: usize,
	pub failed: usize,
	pub files: Vec<FileReport>,
}

pub fn print_file_report(report: &FileReport) {
	println!("Seed file {}:", report.file);
	println!(
		"  created: {}, skipped: {}, failed: {}",
		report.created, report.skipped, report.failed
	);
	println!("  duration: {:.2}s", report.duration_ms as f64 / 1000.0);
	if report.errors.is_empty() {
		return;
	}
	println!("  errors:");
	for err in &report.errors {
		println!("    {err}");
	}
}

pub fn print_human_report(report: &RunReport) {
	println!("Seed run summary:");
	println!("  files: {}", report.files_total);
	println!(
		"  created: {}, skipped: {}, failed: {}",
		report.created, report.skipped, report.failed
	);
	println!("  duration_ms: {}", report.duration_ms);
	let failing: Vec<&FileReport> = report.files.iter().filter(|f| f.failed > 0).collect();
	for file in failing {
		println!("  FAIL {} ({} failed)", file.file, file.failed);
	}
}

pub fn write_json_report(path: &Path, report: &RunReport) -> Result<()> {
	write_json_file(path, report)
}
