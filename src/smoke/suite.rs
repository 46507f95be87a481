use std::collections::BTreeMap;
use std::fmt;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::client::{ApiClient, ApiResult, Body, FileUpload, Reply};

use super::SmokeTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
	Get,
	Post,
	Put,
	Delete,
}

impl Verb {
	fn method(self) -> Method {
		match self {
			Self::Get => Method::GET,
			Self::Post => Method::POST,
			Self::Put => Method::PUT,
			Self::Delete => Method::DELETE,
		}
	}
}

impl fmt::Display for Verb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.method().as_str())
	}
}

/// What a check accepts as a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
	/// Any 2xx.
	Success,
	/// One of the listed statuses.
	Statuses(&'static [u16]),
	/// Anything the server answered below 500.
	Reachable,
	/// Always passes; failures are noted.
	Tolerant,
}

impl Expect {
	pub fn judge(self, outcome: &ApiResult<Reply>) -> (bool, String) {
		let status = match outcome {
			Ok(reply) => Some(reply.status),
			Err(err) => err.status(),
		};
		let failure = || match outcome {
			Ok(reply) => format!("status {}", reply.status),
			Err(err) => err.to_string(),
		};

		match self {
			Self::Success => match outcome {
				Ok(reply) => (true, format!("status {}", reply.status)),
				Err(err) => (false, err.to_string()),
			},
			Self::Statuses(allowed) => match status {
				Some(code) if allowed.contains(&code) => (true, format!("status {code}")),
				Some(code) => (false, format!("status {code}, expected one of {allowed:?}")),
				None => (false, failure()),
			},
			Self::Reachable => match status {
				Some(code) if code < 500 => (true, format!("status {code}")),
				_ => (false, failure()),
			},
			Self::Tolerant => match outcome {
				Ok(reply) => (true, format!("status {}", reply.status)),
				Err(err) => (true, format!("TODO: endpoint not implemented ({err})")),
			},
		}
	}
}

/// How `create_as` treats a reply that carries no usable id. Either way
/// the dependent steps are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingId {
	Fail,
	Continue,
}

/// One declarative check. `path` may carry `{placeholders}` from the
/// suite context.
#[derive(Debug, Clone)]
pub struct Probe {
	pub verb: Verb,
	pub path: &'static str,
	pub expect: Expect,
	pub public: bool,
	pub body: Option<Value>,
}

impl Probe {
	fn new(verb: Verb, path: &'static str) -> Self {
		Self {
			verb,
			path,
			expect: Expect::Success,
			public: false,
			body: None,
		}
	}

	pub fn get(path: &'static str) -> Self {
		Self::new(Verb::Get, path)
	}

	pub fn post(path: &'static str) -> Self {
		Self::new(Verb::Post, path)
	}

	pub fn put(path: &'static str) -> Self {
		Self::new(Verb::Put, path)
	}

	pub fn delete(path: &'static str) -> Self {
		Self::new(Verb::Delete, path)
	}

	pub fn expect(mut self, expect: Expect) -> Self {
		self.expect = expect;
		self
	}

	pub fn public(mut self) -> Self {
		self.public = true;
		self
	}

	pub fn json(mut self, body: Value) -> Self {
		self.body = Some(body);
		self
	}

	pub fn name(&self) -> String {
		format!("{} {}", self.verb, self.path)
	}
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CheckResult {
	pub name: String,
	pub passed: bool,
	pub message: String,
}

/// Client, discovered ids and results of one smoke run.
pub struct SmokeSuite {
	client: ApiClient,
	target: SmokeTarget,
	ctx: BTreeMap<String, String>,
	results: Vec<CheckResult>,
}

impl SmokeSuite {
	pub fn new(client: ApiClient, target: SmokeTarget) -> Self {
		Self {
			client,
			target,
			ctx: BTreeMap::new(),
			results: Vec::new(),
		}
	}

	pub fn target(&self) -> &SmokeTarget {
		&self.target
	}

	pub fn client(&mut self) -> &mut ApiClient {
		&mut self.client
	}

	pub fn remember(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.ctx.insert(key.into(), value.into());
	}

	pub fn forget(&mut self, key: &str) {
		self.ctx.remove(key);
	}

	pub fn recall(&self, key: &str) -> Option<&str> {
		self.ctx.get(key).map(String::as_str)
	}

	pub fn results(&self) -> &[CheckResult] {
		&self.results
	}

	pub fn failed(&self) -> usize {
		self.results.iter().filter(|r| !r.passed).count()
	}

	pub fn into_results(self) -> Vec<CheckResult> {
		self.results
	}

	pub fn record(&mut self, name: impl Into<String>, passed: bool, message: impl Into<String>) {
		let result = CheckResult {
			name: name.into(),
			passed,
			message: message.into(),
		};
		if result.passed {
			info!(check = %result.name, "PASS {}", result.message);
		} else {
			error!(check = %result.name, "FAIL {}", result.message);
		}
		self.results.push(result);
	}

	/// Substitutes `{key}` segments from the context. Errs with the first
	/// unknown key.
	pub fn expand(&self, template: &str) -> Result<String, String> {
		let mut out = String::with_capacity(template.len());
		let mut rest = template;
		while let Some(start) = rest.find('{') {
			out.push_str(&rest[..start]);
			let tail = &rest[start + 1..];
			let Some(end) = tail.find('}') else {
				out.push_str(&rest[start..]);
				return Ok(out);
			};
			let key = &tail[..end];
			match self.recall(key) {
				Some(value) => out.push_str(value),
				None => return Err(key.to_string()),
			}
			rest = &tail[end + 1..];
		}
		out.push_str(rest);
		Ok(out)
	}

	pub async fn send(
		&mut self,
		verb: Verb,
		path: &str,
		body: Option<&Value>,
		public: bool,
	) -> ApiResult<Reply> {
		if public {
			self.client.request_public(verb.method(), path, body).await
		} else {
			self.client.request(verb.method(), path, body).await
		}
	}

	/// Runs one call and records its verdict. The body comes back whenever
	/// the call itself succeeded.
	pub async fn check(
		&mut self,
		name: impl Into<String>,
		verb: Verb,
		path: &str,
		body: Option<&Value>,
		expect: Expect,
	) -> Option<Body> {
		let outcome = self.send(verb, path, body, false).await;
		self.conclude(name.into(), outcome, expect)
	}

	pub async fn check_public(
		&mut self,
		name: impl Into<String>,
		verb: Verb,
		path: &str,
		body: Option<&Value>,
		expect: Expect,
	) -> Option<Body> {
		let outcome = self.send(verb, path, body, true).await;
		self.conclude(name.into(), outcome, expect)
	}

	pub async fn check_upload(
		&mut self,
		name: impl Into<String>,
		path: &str,
		file: &FileUpload,
		expect: Expect,
	) -> Option<Body> {
		let outcome = self.client.upload(path, file).await;
		self.conclude(name.into(), outcome, expect)
	}

	fn conclude(&mut self, name: String, outcome: ApiResult<Reply>, expect: Expect) -> Option<Body> {
		let (passed, message) = expect.judge(&outcome);
		self.record(name, passed, message);
		outcome.ok().map(|reply| reply.body)
	}

	pub async fn probe(&mut self, probe: &Probe) -> Option<Body> {
		let path = match self.expand(probe.path) {
			Ok(path) => path,
			Err(key) => {
				debug!(probe = %probe.name(), key, "placeholder unknown");
				self.record(probe.name(), true, format!("skipped: no {key} available"));
				return None;
			}
		};
		let outcome = self
			.send(probe.verb, &path, probe.body.as_ref(), probe.public)
			.await;
		self.conclude(probe.name(), outcome, probe.expect)
	}

	pub async fn run_probes(&mut self, probes: &[Probe]) {
		for probe in probes {
			self.probe(probe).await;
		}
	}

	/// Creates a resource and remembers its id under `key`. A reply
	/// without an id is a failure.
	pub async fn create(
		&mut self,
		name: impl Into<String>,
		path: &str,
		body: &Value,
		key: &str,
	) -> Option<String> {
		self.create_as(name, path, body, key, MissingId::Fail).await
	}

	pub async fn create_as(
		&mut self,
		name: impl Into<String>,
		path: &str,
		body: &Value,
		key: &str,
		missing: MissingId,
	) -> Option<String> {
		let name = name.into();
		let reply = self.check(name.clone(), Verb::Post, path, Some(body), Expect::Success).await?;
		match reply.entity_id() {
			Ok(id) => {
				let id = id.to_string();
				self.remember(key, id.clone());
				Some(id)
			}
			Err(err) => {
				match missing {
					MissingId::Fail => self.record(format!("{name} (id)"), false, err.to_string()),
					MissingId::Continue => {
						self.record(format!("{name} (id)"), true, format!("TODO: no id in reply ({err}), continuing"))
					}
				}
				None
			}
		}
	}
}
