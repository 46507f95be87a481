pub mod bootstrap;
pub mod fixture;
pub mod payload;
pub mod refs;
pub mod report;
pub mod resources;
pub mod runner;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::client::ApiClient;
use crate::config::{DEFAULT_SEED_FILE, SeedConfig, SeedOverrides};
use crate::core::{display, now_rfc3339};
use crate::logging;

use bootstrap::BootstrapPlan;
use report::{EntityKind, FileReport, RunReport, SeedState, Tally};
use runner::SeedRun;

/// Fixtures probed in the working directory when nothing else is named.
pub const FALLBACK_SEED_FILES: [&str; 2] = [DEFAULT_SEED_FILE, "seed-data.json"];

/// Deadline for all steps of one seed file.
pub const FILE_DEADLINE: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Default)]
pub struct SeedOpts {
	pub files: Vec<PathBuf>,
	pub config: PathBuf,
	pub json_out: Option<PathBuf>,
	pub overrides: SeedOverrides,
}

pub async fn run_seed(opts: SeedOpts) -> Result<()> {
	let cfg = SeedConfig::resolve(&opts.config, &opts.overrides)?;
	logging::init(&cfg.logging.level);
	cfg.print_summary();
	if cfg.seed.parallel {
		warn!("seed.parallel is set but files are always seeded one after another");
	}

	let files = seed_files(&opts.files, &cfg.seed.file, Path::new("."))?;
	if files.is_empty() {
		bail!(
			"No seed file found (looked for {})",
			FALLBACK_SEED_FILES.join(", ")
		);
	}

	let started_at = now_rfc3339();
	let started = Instant::now();
	let mut totals = Tally::default();
	let mut reports = Vec::with_capacity(files.len());

	for (index, path) in files.iter().enumerate() {
		let file_report = seed_file(&cfg, path).await;
		report::print_file_report(&file_report);
		totals.add(file_report.tally());
		let failed = file_report.failed > 0;
		reports.push(file_report);

		let remaining = files.len() - index - 1;
		if failed && cfg.seed.stop_on_error && remaining > 0 {
			warn!(remaining, "stop_on_error is set; skipping the remaining seed files");
			break;
		}
	}

	let run = RunReport {
		started_at,
		finished_at: now_rfc3339(),
		duration_ms: started.elapsed().as_millis(),
		files_total: files.len(),
		created: totals.created,
		skipped: totals.skipped,
		failed: totals.failed,
		files: reports,
	};
	report::print_human_report(&run);
	if let Some(path) = &opts.json_out {
		report::write_json_report(path, &run)?;
	}

	if run.failed > 0 {
		bail!("{} seed operations failed", run.failed);
	}
	Ok(())
}

async fn seed_file(cfg: &SeedConfig, path: &Path) -> FileReport {
	let file = display(path);
	let started = Instant::now();
	info!(file = %file, "seeding");

	let loaded = fixture::load(path).and_then(|data| {
		fixture::validate(&data)?;
		Ok(data)
	});
	let data = match loaded {
		Ok(data) => data,
		Err(err) => {
			let mut state = SeedState::default();
			state.fail(EntityKind::Fixture, file.clone(), format!("{err:#}"));
			return FileReport::new(file, state, started.elapsed().as_millis());
		}
	};

	let client = match ApiClient::new(&cfg.server.url, cfg.timeout()) {
		Ok(client) => client.with_payload_logging(cfg.logging.show_payloads && cfg.is_verbose()),
		Err(err) => {
			let mut state = SeedState::default();
			state.fail(EntityKind::Org, cfg.server.url.clone(), err.to_string());
			return FileReport::new(file, state, started.elapsed().as_millis());
		}
	};

	let plan = BootstrapPlan::from_config(cfg, &data.organization.name);
	let mut run = SeedRun::new(client, plan, &data);
	let finished = tokio::time::timeout(FILE_DEADLINE, run.execute()).await;
	let mut state = run.into_state();
	if finished.is_err() {
		state.fail(
			EntityKind::Timeout,
			file.clone(),
			format!("gave up after {}s", FILE_DEADLINE.as_secs()),
		);
	}
	FileReport::new(file, state, started.elapsed().as_millis())
}

/// Explicit files win, then a configured non-default file, then whichever
/// fallback fixtures exist under `root`.
pub fn seed_files(explicit: &[PathBuf], configured: &str, root: &Path) -> Result<Vec<PathBuf>> {
	if !explicit.is_empty() {
		let mut files = Vec::new();
		for path in explicit {
			files.extend(expand(path)?);
		}
		return Ok(files);
	}

	let configured = configured.trim();
	if !configured.is_empty() && configured != DEFAULT_SEED_FILE {
		let path = root.join(configured);
		if !path.exists() {
			bail!("configured seed file not found: {}", display(&path));
		}
		return expand(&path);
	}

	Ok(FALLBACK_SEED_FILES
		.iter()
		.map(|name| root.join(name))
		.filter(|path| path.is_file())
		.collect())
}

fn expand(path: &Path) -> Result<Vec<PathBuf>> {
	if !path.is_dir() {
		return Ok(vec![path.to_path_buf()]);
	}
	let mut files: Vec<PathBuf> = WalkDir::new(path)
		.follow_links(true)
		.into_iter()
		.filter_map(|e| e.ok())
		.filter(|e| e.file_type().is_file())
		.map(|e| e.into_path())
		.filter(|p| p.extension().and_then(|x| x.to_str()) == Some("json"))
		.collect();
	if files.is_empty() {
		bail!("no *.json seed files in {}", display(path));
	}
	files.sort();
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use wiremock::matchers::any;
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn touch(path: &Path) {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).expect("mkdir");
		}
		fs::write(path, "{}").expect("write");
	}

	#[test]
	fn fallback_fixtures_are_found_in_order() {
		let dir = tempfile::tempdir().expect("tmp");
		assert!(seed_files(&[], DEFAULT_SEED_FILE, dir.path()).expect("files").is_empty());

		touch(&dir.path().join("seed-data.json"));
		touch(&dir.path().join("seed-fattoria.json"));
		let files = seed_files(&[], DEFAULT_SEED_FILE, dir.path()).expect("files");
		assert_eq!(
			files,
			vec![dir.path().join("seed-fattoria.json"), dir.path().join("seed-data.json")]
		);
	}

	#[test]
	fn configured_file_must_exist() {
		let dir = tempfile::tempdir().expect("tmp");
		let err = seed_files(&[], "custom.json", dir.path()).unwrap_err();
		assert!(err.to_string().contains("custom.json"));

		touch(&dir.path().join("custom.json"));
		let files = seed_files(&[], "custom.json", dir.path()).expect("files");
		assert_eq!(files, vec![dir.path().join("custom.json")]);
	}

	#[test]
	fn directories_expand_to_sorted_json() {
		let dir = tempfile::tempdir().expect("tmp");
		let seeds = dir.path().join("seeds");
		touch(&seeds.join("b.json"));
		touch(&seeds.join("a.json"));
		touch(&seeds.join("nested/c.json"));
		touch(&seeds.join("notes.txt"));
		let single = dir.path().join("single.json");

		let files = seed_files(&[single.clone(), seeds.clone()], DEFAULT_SEED_FILE, dir.path())
			.expect("files");
		assert_eq!(
			files,
			vec![
				single,
				seeds.join("a.json"),
				seeds.join("b.json"),
				seeds.join("nested/c.json"),
			]
		);
	}

	#[tokio::test]
	async fn fixture_without_menus_never_reaches_the_backend() {
		let server = MockServer::start().await;
		let dir = tempfile::tempdir().expect("tmp");
		let fixture = dir.path().join("seed.json");
		fs::write(&fixture, r#"{"organization": {"name": "Fattoria"}, "menus": []}"#).expect("write");
		let out = dir.path().join("report.json");

		let err = run_seed(SeedOpts {
			files: vec![fixture],
			config: dir.path().join("missing-config.yaml"),
			json_out: Some(out.clone()),
			overrides: SeedOverrides {
				url: Some(server.uri()),
				..SeedOverrides::default()
			},
		})
		.await
		.unwrap_err();

		assert_eq!(err.to_string(), "1 seed operations failed");
		let received = server.received_requests().await.expect("recording enabled");
		assert!(received.is_empty());
		let raw = fs::read_to_string(out).expect("report");
		assert!(raw.contains("\"kind\": \"fixture\""));
		assert!(raw.contains("at least one menu"));
	}

	#[tokio::test]
	async fn stop_on_error_leaves_later_files_untouched() {
		let server = MockServer::start().await;
		Mock::given(any())
			.respond_with(ResponseTemplate::new(500))
			.mount(&server)
			.await;
		let dir = tempfile::tempdir().expect("tmp");
		let broken = dir.path().join("a-broken.json");
		fs::write(&broken, r#"{"organization": {"name": "Broken"}}"#).expect("write");
		let valid = dir.path().join("b-valid.json");
		fs::write(&valid, r#"{"organization": {"name": "Valid"}, "menus": [{"name": "Jantar"}]}"#)
			.expect("write");
		let config = dir.path().join("config.yaml");
		let out = dir.path().join("report.json");

		let opts = |stop: bool| {
			fs::write(&config, format!("seed:\n  stop_on_error: {stop}\n")).expect("config");
			SeedOpts {
				files: vec![broken.clone(), valid.clone()],
				config: config.clone(),
				json_out: Some(out.clone()),
				overrides: SeedOverrides {
					url: Some(server.uri()),
					..SeedOverrides::default()
				},
			}
		};

		run_seed(opts(true)).await.unwrap_err();
		assert!(server.received_requests().await.expect("recording").is_empty());
		let report: serde_json::Value =
			serde_json::from_str(&fs::read_to_string(&out).expect("report")).expect("json");
		assert_eq!(report["files_total"], 2);
		assert_eq!(report["files"].as_array().map(Vec::len), Some(1));

		run_seed(opts(false)).await.unwrap_err();
		assert!(!server.received_requests().await.expect("recording").is_empty());
		let report: serde_json::Value =
			serde_json::from_str(&fs::read_to_string(&out).expect("report")).expect("json");
		assert_eq!(report["files"].as_array().map(Vec::len), Some(2));
	}
}
