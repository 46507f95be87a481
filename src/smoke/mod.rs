//! End-to-end smoke checks against a running backend with fixed
//! credentials.

mod assertions;
mod checks;
mod report;
mod suite;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::client::ApiClient;
use crate::core::now_rfc3339;

use report::SmokeReport;
use suite::SmokeSuite;

pub const BACKEND_URL: &str = "http://localhost:8080";
pub const TEST_EMAIL: &str = "pablo@lep.com";
pub const TEST_PASSWORD: &str = "senha123";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SmokeTarget {
	pub base_url: String,
	pub email: String,
	pub password: String,
	pub timeout: Duration,
}

impl Default for SmokeTarget {
	fn default() -> Self {
		Self {
			base_url: BACKEND_URL.to_string(),
			email: TEST_EMAIL.to_string(),
			password: TEST_PASSWORD.to_string(),
			timeout: REQUEST_TIMEOUT,
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct SmokeOpts {
	pub json_out: Option<PathBuf>,
}

pub async fn run_smoke(opts: SmokeOpts) -> Result<()> {
	let target = SmokeTarget::default();
	println!("Smoke suite against {} as {}", target.base_url, target.email);

	let report = execute(target).await?;
	report::print_human_report(&report);
	if let Some(path) = &opts.json_out {
		report::write_json_report(path, &report)?;
	}
	if report.checks_failed > 0 {
		bail!("{} smoke checks failed", report.checks_failed);
	}
	Ok(())
}

pub async fn execute(target: SmokeTarget) -> Result<SmokeReport> {
	let client = ApiClient::new(&target.base_url, target.timeout).context("building smoke client")?;
	let base_url = target.base_url.clone();
	let mut suite = SmokeSuite::new(client, target);

	let started_at = now_rfc3339();
	let started = Instant::now();
	checks::run_all(&mut suite).await;
	info!(
		checks = suite.results().len(),
		failed = suite.failed(),
		"smoke checks finished"
	);

	Ok(SmokeReport::new(
		base_url,
		started_at,
		now_rfc3339(),
		started.elapsed().as_millis(),
		suite.into_results(),
	))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use wiremock::matchers::{method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn target(server: &MockServer) -> SmokeTarget {
		SmokeTarget {
			base_url: server.uri(),
			timeout: Duration::from_secs(5),
			..SmokeTarget::default()
		}
	}

	#[tokio::test]
	async fn failed_login_aborts_the_run() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/login"))
			.respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid credentials" })))
			.expect(1)
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200))
			.expect(0)
			.mount(&server)
			.await;

		let report = execute(target(&server)).await.expect("report");
		assert_eq!(report.checks_total, 1);
		assert_eq!(report.checks_failed, 1);
		assert_eq!(report.checks[0].message, "status 401: invalid credentials");
	}

	#[tokio::test]
	async fn full_run_against_a_permissive_backend() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/login"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"token": "tok",
				"user": { "id": "u-1", "organization_id": "o-1", "project_id": "p-1" },
			})))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(path("/checkToken"))
			.respond_with(ResponseTemplate::new(200))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/ping"))
			.respond_with(ResponseTemplate::new(200).set_body_string("pong"))
			.mount(&server)
			.await;
		Mock::given(wiremock::matchers::path_regex(r"^/upload/"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"success": true,
				"data": { "image_url": "http://localhost:8080/uploads/x.png", "file_hash": "h" },
			})))
			.mount(&server)
			.await;
		Mock::given(wiremock::matchers::any())
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"data": { "id": "99999999-9999-4999-8999-999999999999" },
			})))
			.mount(&server)
			.await;

		let report = execute(target(&server)).await.expect("report");
		let failures: Vec<String> = report
			.checks
			.iter()
			.filter(|c| !c.passed)
			.map(|c| format!("{}: {}", c.name, c.message))
			.collect();
		assert!(failures.is_empty(), "{failures:#?}");
		assert_eq!(report.checks.first().map(|c| c.name.as_str()), Some("POST /login"));
		assert_eq!(report.checks.last().map(|c| c.name.as_str()), Some("POST /logout"));
		assert!(report.checks_total > 100);
	}
}
