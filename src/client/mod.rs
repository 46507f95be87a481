mod body;
mod error;

use std::time::{Duration, Instant};

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::debug;

pub use body::{Body, item_id};
pub use error::{ApiError, ApiResult};

pub const ORGANIZATION_HEADER: &str = "X-Lpe-Organization-Id";
pub const PROJECT_HEADER: &str = "X-Lpe-Project-Id";

/// Credentials attached to authenticated calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
	pub token: Option<String>,
	pub organization_id: Option<String>,
	pub project_id: Option<String>,
}

impl Session {
	pub fn new(
		token: impl Into<String>,
		organization_id: impl Into<String>,
		project_id: impl Into<String>,
	) -> Self {
		Self {
			token: Some(token.into()),
			organization_id: Some(organization_id.into()),
			project_id: Some(project_id.into()),
		}
	}

	/// Tenant ids, only when both are known.
	pub fn tenant(&self) -> Option<(&str, &str)> {
		match (&self.organization_id, &self.project_id) {
			(Some(org), Some(project)) if !org.is_empty() && !project.is_empty() => {
				Some((org.as_str(), project.as_str()))
			}
			_ => None,
		}
	}
}

#[derive(Debug, Clone)]
pub struct Reply {
	pub status: u16,
	pub body: Body,
}

#[derive(Debug, Clone)]
pub struct FileUpload {
	pub field: String,
	pub file_name: String,
	pub content_type: String,
	pub bytes: Vec<u8>,
}

enum Access {
	Session,
	Anonymous,
}

enum Payload<'a> {
	Empty,
	Json(&'a Value),
	File(&'a FileUpload),
}

pub struct ApiClient {
	http: reqwest::Client,
	base_url: String,
	session: Session,
	show_payloads: bool,
	last_status: Option<u16>,
}

impl ApiClient {
	pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
		let http = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| ApiError::InvalidRequest(format!("building HTTP client: {e}")))?;
		Ok(Self {
			http,
			base_url: base_url.trim_end_matches('/').to_string(),
			session: Session::default(),
			show_payloads: false,
			last_status: None,
		})
	}

	pub fn with_payload_logging(mut self, enabled: bool) -> Self {
		self.show_payloads = enabled;
		self
	}

	pub fn set_session(&mut self, session: Session) {
		self.session = session;
	}

	pub fn last_status(&self) -> Option<u16> {
		self.last_status
	}

	/// JSON call carrying whatever session credentials are set.
	pub async fn request(
		&mut self,
		method: Method,
		path: &str,
		body: Option<&Value>,
	) -> ApiResult<Reply> {
		let payload = body.map_or(Payload::Empty, Payload::Json);
		self.dispatch(method, path, payload, Access::Session).await
	}

	/// JSON call that never carries session credentials.
	pub async fn request_public(
		&mut self,
		method: Method,
		path: &str,
		body: Option<&Value>,
	) -> ApiResult<Reply> {
		let payload = body.map_or(Payload::Empty, Payload::Json);
		self.dispatch(method, path, payload, Access::Anonymous).await
	}

	/// Multipart POST with a single file part.
	pub async fn upload(&mut self, path: &str, file: &FileUpload) -> ApiResult<Reply> {
		self.dispatch(Method::POST, path, Payload::File(file), Access::Session)
			.await
	}

	async fn dispatch(
		&mut self,
		method: Method,
		path: &str,
		payload: Payload<'_>,
		access: Access,
	) -> ApiResult<Reply> {
		let url = self.url(path);
		let mut headers = self.headers(&access)?;
		let mut req = self.http.request(method.clone(), &url);

		match payload {
			Payload::Empty => {
				headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
			}
			Payload::Json(value) => {
				let raw = serde_json::to_vec(value)?;
				if self.show_payloads {
					debug!(%method, path, payload = %String::from_utf8_lossy(&raw), "outbound payload");
				}
				headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
				req = req.body(raw);
			}
			Payload::File(file) => {
				let part = Part::bytes(file.bytes.clone())
					.file_name(file.file_name.clone())
					.mime_str(&file.content_type)
					.map_err(|e| {
						ApiError::InvalidRequest(format!(
							"content type '{}': {e}",
							file.content_type
						))
					})?;
				req = req.multipart(Form::new().part(file.field.clone(), part));
			}
		}

		let started = Instant::now();
		let resp = req
			.headers(headers)
			.send()
			.await
			.map_err(|source| ApiError::Transport {
				url: url.clone(),
				source,
			})?;
		let status = resp.status();
		let bytes = resp.bytes().await.map_err(|source| ApiError::Transport {
			url: url.clone(),
			source,
		})?;
		let elapsed_ms = started.elapsed().as_millis() as u64;
		self.last_status = Some(status.as_u16());

		debug!(%method, path, status = status.as_u16(), elapsed_ms, "response");
		if self.show_payloads {
			debug!(path, body = %String::from_utf8_lossy(&bytes), "inbound body");
		}

		let body = Body::decode(&bytes);
		if !status.is_success() {
			let message = body
				.message()
				.map(str::to_string)
				.unwrap_or_else(|| status.canonical_reason().unwrap_or("unexpected status").to_string());
			return Err(ApiError::Status {
				status: status.as_u16(),
				message,
				body,
			});
		}

		Ok(Reply {
			status: status.as_u16(),
			body,
		})
	}

	fn url(&self, path: &str) -> String {
		let path = path.trim();
		format!(
			"{}{}{}",
			self.base_url,
			if path.starts_with('/') { "" } else { "/" },
			path
		)
	}

	fn headers(&self, access: &Access) -> ApiResult<HeaderMap> {
		let mut headers = HeaderMap::new();
		if matches!(access, Access::Anonymous) {
			return Ok(headers);
		}
		if let Some(token) = self.session.token.as_deref().filter(|t| !t.is_empty()) {
			insert_header(&mut headers, AUTHORIZATION.as_str(), &format!("Bearer {token}"))?;
		}
		if let Some((org, project)) = self.session.tenant() {
			insert_header(&mut headers, ORGANIZATION_HEADER, org)?;
			insert_header(&mut headers, PROJECT_HEADER, project)?;
		}
		Ok(headers)
	}
}

fn insert_header(headers: &mut HeaderMap, key: &str, value: &str) -> ApiResult<()> {
	let name = HeaderName::from_bytes(key.as_bytes())
		.map_err(|_| ApiError::InvalidRequest(format!("invalid header name '{key}'")))?;
	let val = HeaderValue::from_str(value)
		.map_err(|_| ApiError::InvalidRequest(format!("invalid header value for '{key}'")))?;
	headers.insert(name, val);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use wiremock::matchers::{header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn client(server: &MockServer) -> ApiClient {
		ApiClient::new(&server.uri(), Duration::from_secs(5)).expect("client")
	}

	#[tokio::test]
	async fn authenticated_calls_carry_token_and_tenant() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/menu"))
			.and(header("authorization", "Bearer tok"))
			.and(header("x-lpe-organization-id", "org-1"))
			.and(header("x-lpe-project-id", "proj-1"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
			.expect(1)
			.mount(&server)
			.await;

		let mut api = client(&server);
		api.set_session(Session::new("tok", "org-1", "proj-1"));
		let reply = api.request(Method::GET, "menu", None).await.expect("ok");
		assert_eq!(reply.status, 200);
		assert_eq!(reply.body.items().map(<[Value]>::len), Some(0));
		assert_eq!(api.last_status(), Some(200));
	}

	#[tokio::test]
	async fn public_calls_omit_session_headers() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/login"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t" })))
			.mount(&server)
			.await;

		let mut api = client(&server);
		api.set_session(Session::new("tok", "org-1", "proj-1"));
		api.request_public(Method::POST, "/login", Some(&json!({ "email": "a@b.c" })))
			.await
			.expect("ok");

		let received = server.received_requests().await.expect("recording enabled");
		assert_eq!(received.len(), 1);
		assert!(received[0].headers.get("authorization").is_none());
		assert!(received[0].headers.get("x-lpe-organization-id").is_none());
	}

	#[tokio::test]
	async fn tenant_headers_need_both_ids() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200))
			.mount(&server)
			.await;

		let mut api = client(&server);
		api.set_session(Session {
			token: Some("tok".into()),
			organization_id: Some("org-1".into()),
			project_id: None,
		});
		api.request(Method::GET, "/user", None).await.expect("ok");

		let received = server.received_requests().await.expect("recording enabled");
		assert!(received[0].headers.get("authorization").is_some());
		assert!(received[0].headers.get("x-lpe-organization-id").is_none());
	}

	#[tokio::test]
	async fn non_success_carries_status_and_server_message() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/menu"))
			.respond_with(
				ResponseTemplate::new(409).set_body_json(json!({ "message": "menu already exists" })),
			)
			.mount(&server)
			.await;

		let mut api = client(&server);
		let err = api
			.request(Method::POST, "/menu", Some(&json!({ "name": "Lunch" })))
			.await
			.expect_err("conflict");
		assert!(err.is_conflict());
		assert_eq!(err.to_string(), "status 409: menu already exists");
		assert_eq!(api.last_status(), Some(409));
	}

	#[tokio::test]
	async fn upload_sends_named_multipart_part() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/upload/banners/image"))
			.respond_with(
				ResponseTemplate::new(200).set_body_json(json!({ "data": { "file_hash": "abc" } })),
			)
			.mount(&server)
			.await;

		let mut api = client(&server);
		let file = FileUpload {
			field: "image".into(),
			file_name: "pixel.png".into(),
			content_type: "image/png".into(),
			bytes: vec![1, 2, 3],
		};
		let reply = api.upload("/upload/banners/image", &file).await.expect("ok");
		assert_eq!(reply.body.string("file_hash"), Some("abc"));

		let received = server.received_requests().await.expect("recording enabled");
		let content_type = received[0]
			.headers
			.get("content-type")
			.and_then(|v| v.to_str().ok())
			.unwrap_or_default()
			.to_string();
		assert!(content_type.starts_with("multipart/form-data"));
		let raw = String::from_utf8_lossy(&received[0].body);
		assert!(raw.contains("name=\"image\""));
		assert!(raw.contains("filename=\"pixel.png\""));
		assert!(raw.contains("image/png"));
	}

	#[tokio::test]
	async fn unreachable_backend_is_a_transport_error() {
		let mut api = ApiClient::new("http://127.0.0.1:1", Duration::from_secs(2)).expect("client");
		let err = api.request(Method::GET, "/ping", None).await.expect_err("refused");
		assert!(err.is_transport());
		assert_eq!(api.last_status(), None);
	}
}
