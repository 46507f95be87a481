//! Getting a session for the organization being seeded.
//!
//! Strategies run in a fixed order. Each one either hands back a session,
//! defers to the next strategy, or stops the chain when retrying cannot help
//! (the backend is unreachable, or an organization was created but cannot be
//! logged into).

use anyhow::{Result, bail};
use reqwest::Method;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::client::{ApiClient, ApiResult, Body, Session};
use crate::config::SeedConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
	pub email: String,
	pub password: String,
}

#[derive(Debug, Clone)]
pub struct BootstrapPlan {
	pub organization: String,
	pub primary: Credentials,
	pub fallback: Credentials,
}

impl BootstrapPlan {
	/// Fixture organization name is used when the config does not set one.
	pub fn from_config(cfg: &SeedConfig, fixture_organization: &str) -> Self {
		let organization = if cfg.auth.organization_name.trim().is_empty() {
			fixture_organization.trim().to_string()
		} else {
			cfg.auth.organization_name.trim().to_string()
		};
		Self {
			primary: Credentials {
				email: cfg.primary_email(&organization),
				password: cfg.auth.password.clone(),
			},
			fallback: Credentials {
				email: cfg.auth.fallback_email.clone(),
				password: cfg.auth.fallback_password.clone(),
			},
			organization,
		}
	}
}

#[derive(Debug, Clone)]
pub struct Bootstrapped {
	pub session: Session,
	pub created: bool,
	pub strategy: &'static str,
}

#[derive(Debug)]
pub enum Attempt {
	Success(Bootstrapped),
	TryNext(String),
	Fatal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
	CreateOrganization,
	Login,
	FallbackLogin,
}

pub const CHAIN: [Strategy; 3] = [
	Strategy::CreateOrganization,
	Strategy::Login,
	Strategy::FallbackLogin,
];

impl Strategy {
	pub fn name(self) -> &'static str {
		match self {
			Self::CreateOrganization => "create-organization",
			Self::Login => "login",
			Self::FallbackLogin => "fallback-login",
		}
	}

	pub async fn attempt(self, client: &mut ApiClient, plan: &BootstrapPlan) -> Attempt {
		match self {
			Self::CreateOrganization => create_organization(client, plan).await,
			Self::Login => login_attempt(client, &plan.primary, None, self).await,
			Self::FallbackLogin => {
				login_attempt(client, &plan.fallback, Some(plan.organization.as_str()), self).await
			}
		}
	}
}

pub async fn run(client: &mut ApiClient, plan: &BootstrapPlan) -> Result<Bootstrapped> {
	let mut reasons = Vec::new();
	for strategy in CHAIN {
		match strategy.attempt(client, plan).await {
			Attempt::Success(done) => {
				info!(
					strategy = strategy.name(),
					organization = %plan.organization,
					"session ready"
				);
				return Ok(done);
			}
			Attempt::TryNext(reason) => {
				warn!(strategy = strategy.name(), "{reason}");
				reasons.push(format!("{}: {reason}", strategy.name()));
			}
			Attempt::Fatal(reason) => bail!("{}: {reason}", strategy.name()),
		}
	}
	bail!("no bootstrap strategy succeeded ({})", reasons.join("; "))
}

async fn create_organization(client: &mut ApiClient, plan: &BootstrapPlan) -> Attempt {
	let strategy = Strategy::CreateOrganization;
	let payload = json!({
		"name": plan.organization,
		"email": plan.primary.email,
		"password": plan.primary.password,
	});
	let reply = match client
		.request_public(Method::POST, "/create-organization", Some(&payload))
		.await
	{
		Ok(reply) => reply,
		Err(err) if err.is_conflict() => {
			return Attempt::TryNext("organization already exists".into());
		}
		Err(err) if err.is_transport() => return Attempt::Fatal(err.to_string()),
		Err(err) => return Attempt::TryNext(err.to_string()),
	};

	let (organization_id, project_id) = match tenant_ids(&reply.body, None) {
		Ok(ids) => ids,
		Err(reason) => return Attempt::TryNext(format!("organization created but {reason}")),
	};
	let token = match token(&reply.body) {
		Some(token) => token,
		None => match login(client, &plan.primary).await {
			Ok(body) => match token(&body) {
				Some(token) => token,
				None => {
					return Attempt::Fatal("login after creation returned no token".into());
				}
			},
			Err(err) => return Attempt::Fatal(format!("login after creation failed: {err}")),
		},
	};

	Attempt::Success(Bootstrapped {
		session: Session::new(token, organization_id, project_id),
		created: true,
		strategy: strategy.name(),
	})
}

async fn login_attempt(
	client: &mut ApiClient,
	credentials: &Credentials,
	organization: Option<&str>,
	strategy: Strategy,
) -> Attempt {
	match login(client, credentials).await {
		Ok(body) => match session_from_login(&body, organization) {
			Ok(session) => Attempt::Success(Bootstrapped {
				session,
				created: false,
				strategy: strategy.name(),
			}),
			Err(reason) => Attempt::TryNext(reason),
		},
		Err(err) if err.is_transport() => Attempt::Fatal(err.to_string()),
		Err(err) => Attempt::TryNext(format!("login as {} failed: {err}", credentials.email)),
	}
}

async fn login(client: &mut ApiClient, credentials: &Credentials) -> ApiResult<Body> {
	let payload = json!({
		"email": credentials.email,
		"password": credentials.password,
	});
	let reply = client
		.request_public(Method::POST, "/login", Some(&payload))
		.await?;
	Ok(reply.body)
}

pub fn session_from_login(body: &Body, organization: Option<&str>) -> Result<Session, String> {
	let token = token(body).ok_or_else(|| "login response carries no token".to_string())?;
	let (organization_id, project_id) = tenant_ids(body, organization)?;
	Ok(Session::new(token, organization_id, project_id))
}

fn token(body: &Body) -> Option<String> {
	body.string("token")
		.filter(|t| !t.is_empty())
		.map(str::to_string)
}

const ORGANIZATION_PATHS: [&[&str]; 5] = [
	&["data", "organization", "id"],
	&["data", "organization_id"],
	&["organization", "id"],
	&["organization_id"],
	&["user", "organization_id"],
];

const PROJECT_PATHS: [&[&str]; 5] = [
	&["data", "project", "id"],
	&["data", "project_id"],
	&["project", "id"],
	&["project_id"],
	&["user", "project_id"],
];

/// Organization and project ids from a login or creation reply.
pub fn tenant_ids(body: &Body, organization: Option<&str>) -> Result<(String, String), String> {
	let root = body.to_value();
	if let Some(memberships) = memberships(&root) {
		return pick_membership(memberships, organization);
	}
	let organization_id = first_str(&root, &ORGANIZATION_PATHS);
	let project_id = first_str(&root, &PROJECT_PATHS);
	match (organization_id, project_id) {
		(Some(org), Some(project)) => Ok((org.to_string(), project.to_string())),
		_ => Err("response carries no organization/project ids".to_string()),
	}
}

fn memberships(root: &Value) -> Option<&[Value]> {
	root.get("projects")
		.or_else(|| root.get("data").and_then(|d| d.get("projects")))
		.and_then(Value::as_array)
		.filter(|list| !list.is_empty())
		.map(Vec::as_slice)
}

fn first_str<'v>(root: &'v Value, paths: &[&[&str]]) -> Option<&'v str> {
	paths.iter().find_map(|path| {
		path.iter()
			.try_fold(root, |node, key| node.get(*key))
			.and_then(Value::as_str)
			.filter(|s| !s.is_empty())
	})
}

fn membership_ids(membership: &Value) -> Option<(String, String)> {
	let org = membership.get("organization_id")?.as_str()?;
	let project = membership.get("project_id")?.as_str()?;
	Some((org.to_string(), project.to_string()))
}

fn pick_membership(list: &[Value], organization: Option<&str>) -> Result<(String, String), String> {
	let Some(name) = organization else {
		return list
			.first()
			.and_then(membership_ids)
			.ok_or_else(|| "first project membership has no ids".to_string());
	};

	fn organization_name(m: &Value) -> Option<&str> {
		m.get("organization_name").and_then(Value::as_str)
	}
	if list.iter().any(|m| organization_name(m).is_some()) {
		return list
			.iter()
			.find(|m| organization_name(m).is_some_and(|n| n.trim().eq_ignore_ascii_case(name.trim())))
			.and_then(membership_ids)
			.ok_or_else(|| format!("no project membership for organization '{name}'"));
	}

	// Known gap: memberships without organization names cannot be matched,
	// so the second one is assumed to be the newest organization.
	warn!(
		organization = name,
		memberships = list.len(),
		"memberships carry no organization names; assuming the second project, which may target the wrong organization"
	);
	list.get(1)
		.or_else(|| list.first())
		.and_then(membership_ids)
		.ok_or_else(|| "project membership has no ids".to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;
	use wiremock::matchers::{body_partial_json, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn plan() -> BootstrapPlan {
		BootstrapPlan::from_config(&SeedConfig::default(), "Fattoria Nonna")
	}

	fn client(server: &MockServer) -> ApiClient {
		ApiClient::new(&server.uri(), Duration::from_secs(5)).expect("client")
	}

	#[test]
	fn plan_derives_primary_mailbox() {
		let plan = plan();
		assert_eq!(plan.organization, "Fattoria Nonna");
		assert_eq!(plan.primary.email, "fattoria-nonna@lep.com");
		assert_eq!(plan.fallback.email, "pablo@lep.com");
	}

	#[test]
	fn ids_from_nested_creation_reply() {
		let body = Body::decode(
			br#"{"data":{"organization":{"id":"org-1"},"project":{"id":"proj-1"}}}"#,
		);
		assert_eq!(tenant_ids(&body, None), Ok(("org-1".into(), "proj-1".into())));
	}

	#[test]
	fn membership_targeting_prefers_name_match() {
		let body = Body::decode(
			br#"{"token":"t","projects":[
				{"organization_id":"o1","project_id":"p1","organization_name":"Other"},
				{"organization_id":"o2","project_id":"p2","organization_name":"Fattoria"}
			]}"#,
		);
		let session = session_from_login(&body, Some("fattoria")).expect("session");
		assert_eq!(session.organization_id.as_deref(), Some("o2"));
		assert!(session_from_login(&body, Some("Missing")).is_err());
		let first = session_from_login(&body, None).expect("session");
		assert_eq!(first.project_id.as_deref(), Some("p1"));
	}

	#[test]
	fn unnamed_memberships_fall_back_to_second() {
		let body = Body::decode(
			br#"{"token":"t","projects":[
				{"organization_id":"o1","project_id":"p1"},
				{"organization_id":"o2","project_id":"p2"}
			]}"#,
		);
		let session = session_from_login(&body, Some("Fattoria")).expect("session");
		assert_eq!(session.project_id.as_deref(), Some("p2"));
	}

	#[tokio::test]
	async fn conflict_on_creation_switches_to_login() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/create-organization"))
			.respond_with(ResponseTemplate::new(409).set_body_json(json!({ "message": "exists" })))
			.expect(1)
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(path("/login"))
			.and(body_partial_json(json!({
				"email": "fattoria-nonna@lep.com",
				"password": "senha123",
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"token": "tok",
				"projects": [{ "organization_id": "o1", "project_id": "p1" }],
			})))
			.expect(1)
			.mount(&server)
			.await;

		let done = run(&mut client(&server), &plan()).await.expect("bootstrap");
		assert_eq!(done.strategy, "login");
		assert!(!done.created);
		assert_eq!(done.session, Session::new("tok", "o1", "p1"));
	}

	#[tokio::test]
	async fn creation_without_token_logs_in_for_one() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/create-organization"))
			.respond_with(ResponseTemplate::new(201).set_body_json(json!({
				"data": { "organization": { "id": "o9" }, "project": { "id": "p9" } },
			})))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(path("/login"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"token": "fresh",
				"projects": [{ "organization_id": "old", "project_id": "old" }],
			})))
			.expect(1)
			.mount(&server)
			.await;

		let done = run(&mut client(&server), &plan()).await.expect("bootstrap");
		assert!(done.created);
		assert_eq!(done.session, Session::new("fresh", "o9", "p9"));
	}

	#[tokio::test]
	async fn fallback_login_targets_the_organization() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/create-organization"))
			.respond_with(ResponseTemplate::new(500))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(path("/login"))
			.and(body_partial_json(json!({ "email": "fattoria-nonna@lep.com" })))
			.respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "bad credentials" })))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(path("/login"))
			.and(body_partial_json(json!({ "email": "pablo@lep.com" })))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"token": "admin",
				"projects": [
					{ "organization_id": "o1", "project_id": "p1", "organization_name": "LEP" },
					{ "organization_id": "o2", "project_id": "p2", "organization_name": "Fattoria Nonna" },
				],
			})))
			.mount(&server)
			.await;

		let done = run(&mut client(&server), &plan()).await.expect("bootstrap");
		assert_eq!(done.strategy, "fallback-login");
		assert_eq!(done.session, Session::new("admin", "o2", "p2"));
	}

	#[tokio::test]
	async fn exhausted_chain_reports_every_reason() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(401))
			.mount(&server)
			.await;

		let err = run(&mut client(&server), &plan()).await.expect_err("no session");
		let text = err.to_string();
		assert!(text.contains("create-organization"));
		assert!(text.contains("fallback-login"));
	}

	#[tokio::test]
	async fn unreachable_backend_stops_the_chain() {
		let mut api = ApiClient::new("http://127.0.0.1:1", Duration::from_secs(2)).expect("client");
		let err = run(&mut api, &plan()).await.expect_err("no backend");
		assert!(err.to_string().starts_with("create-organization"));
	}
}
