use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::client::Session;
use crate::smoke::assertions::text_at;
use crate::smoke::suite::{Expect, Probe, SmokeSuite, Verb};

use super::first_id;

const LOGIN: &str = "POST /login";

/// Logs in and seeds the context with tenant and user ids. Missing tenant
/// ids are replaced with random ones so tenant headers are always sent.
pub async fn login(suite: &mut SmokeSuite) -> bool {
	let credentials = json!({
		"email": suite.target().email,
		"password": suite.target().password,
	});
	let outcome = suite.send(Verb::Post, "/login", Some(&credentials), true).await;
	let body = match outcome {
		Ok(reply) => reply.body,
		Err(err) => {
			suite.record(LOGIN, false, err.to_string());
			return false;
		}
	};

	let Some(token) = body.string("token").filter(|t| !t.is_empty()).map(str::to_string) else {
		suite.record(LOGIN, false, "no token in login response");
		return false;
	};
	let organization =
		text_at(&body, "user.organization_id").unwrap_or_else(|| Uuid::new_v4().to_string());
	let project = text_at(&body, "user.project_id").unwrap_or_else(|| Uuid::new_v4().to_string());
	if let Some(user) = text_at(&body, "user.id") {
		suite.remember("user", user);
	}

	suite.client().set_session(Session::new(token, &organization, &project));
	suite.remember("org", organization.clone());
	suite.remember("project", project);
	suite.record(LOGIN, true, format!("session for organization {organization}"));
	true
}

pub async fn health(suite: &mut SmokeSuite) {
	let Some(body) = suite
		.check_public("GET /ping", Verb::Get, "/ping", None, Expect::Success)
		.await
	else {
		return;
	};
	if body.text().is_none() {
		debug!(body = %body.to_value(), "unrecognised ping reply");
		suite.record("GET /ping (message)", false, "empty reply, structure not recognised");
	}
}

/// Public menu and category routes live under different prefixes across
/// backend versions; the first one answering wins.
async fn first_reachable(suite: &mut SmokeSuite, name: &str, candidates: &[&str]) {
	for path in candidates {
		if suite.send(Verb::Get, path, None, true).await.is_ok() {
			suite.record(name, true, format!("found at {path}"));
			return;
		}
	}
	suite.record(name, true, "TODO: endpoint not implemented");
}

pub async fn reads(suite: &mut SmokeSuite) {
	first_reachable(
		suite,
		"GET /menu (public)",
		&["/public/menu", "/menu", "/public/menu/test", "/api/menu"],
	)
	.await;
	first_reachable(
		suite,
		"GET /categories (public)",
		&["/public/categories", "/categories", "/public/categories/test", "/api/categories"],
	)
	.await;

	if let Some(users) = suite.check("GET /user", Verb::Get, "/user", None, Expect::Success).await {
		if suite.recall("user").is_none() {
			if let Some(id) = first_id(&users) {
				suite.remember("user", id);
			}
		}
	}
	suite
		.run_probes(&[
			Probe::get("/user/{user}"),
			Probe::get("/user/{user}/organizations-projects"),
			Probe::get("/product"),
			Probe::get("/table"),
			Probe::get("/reservation"),
		])
		.await;
}

pub async fn admin_images(suite: &mut SmokeSuite) {
	suite
		.run_probes(&[
			Probe::get("/admin/images/stats").expect(Expect::Reachable),
			Probe::post("/admin/images/cleanup").expect(Expect::Reachable),
		])
		.await;
}

/// 200 means valid, 401 means the route exists but rejected the token.
pub async fn token(suite: &mut SmokeSuite) {
	for path in ["/checkToken", "/check-token", "/token/validate", "/token/check"] {
		let outcome = suite.send(Verb::Post, path, None, false).await;
		let status = match &outcome {
			Ok(reply) => Some(reply.status),
			Err(err) => err.status(),
		};
		if matches!(status, Some(200 | 401)) {
			suite.record(
				format!("POST {path}"),
				true,
				format!("token endpoint found (status {})", status.unwrap_or_default()),
			);
			return;
		}
		debug!(path, ?status, "token endpoint probe");
	}
	suite.record("POST /checkToken", false, "no token validation endpoint found");
}

pub async fn logout(suite: &mut SmokeSuite) {
	suite
		.check("POST /logout", Verb::Post, "/logout", None, Expect::Success)
		.await;
	suite.client().set_session(Session::default());
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::smoke::suite::tests::suite_for;
	use wiremock::matchers::{body_partial_json, header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	#[tokio::test]
	async fn login_sets_tenant_headers_from_user() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/login"))
			.and(body_partial_json(json!({ "email": "pablo@lep.com", "password": "senha123" })))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"token": "tok-123",
				"user": { "id": "u-1", "organization_id": "o-1", "project_id": "p-1" },
			})))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/user/u-1"))
			.and(header("authorization", "Bearer tok-123"))
			.and(header("x-lpe-organization-id", "o-1"))
			.and(header("x-lpe-project-id", "p-1"))
			.respond_with(ResponseTemplate::new(200))
			.expect(1)
			.mount(&server)
			.await;

		let mut suite = suite_for(&server);
		assert!(login(&mut suite).await);
		assert_eq!(suite.recall("org"), Some("o-1"));
		suite.run_probes(&[Probe::get("/user/{user}")]).await;
		assert!(suite.results().iter().all(|r| r.passed));
	}

	#[tokio::test]
	async fn login_without_tenant_ids_falls_back_to_random_ones() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/login"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "tok" })))
			.mount(&server)
			.await;

		let mut suite = suite_for(&server);
		assert!(login(&mut suite).await);
		let org = suite.recall("org").expect("org id");
		assert!(Uuid::parse_str(org).is_ok());
		assert!(suite.recall("user").is_none());
	}

	#[tokio::test]
	async fn ping_text_is_read_from_any_shape() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/ping"))
			.respond_with(ResponseTemplate::new(200).set_body_string("pong"))
			.mount(&server)
			.await;

		let mut suite = suite_for(&server);
		health(&mut suite).await;
		assert_eq!(suite.results().len(), 1);
		assert!(suite.results()[0].passed);
	}

	#[tokio::test]
	async fn token_check_accepts_unauthorized() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/check-token"))
			.respond_with(ResponseTemplate::new(401))
			.mount(&server)
			.await;

		let mut suite = suite_for(&server);
		token(&mut suite).await;
		assert_eq!(suite.results()[0].name, "POST /check-token");
		assert!(suite.results()[0].passed);
	}
}
