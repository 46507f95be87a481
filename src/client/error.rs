use thiserror::Error;

use super::body::Body;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
	#[error("request to {url} failed: {source}")]
	Transport {
		url: String,
		#[source]
		source: reqwest::Error,
	},

	#[error("encoding request body failed: {0}")]
	Encode(#[from] serde_json::Error),

	#[error("status {status}: {message}")]
	Status {
		status: u16,
		message: String,
		body: Body,
	},

	#[error("malformed response: {0}")]
	Malformed(String),

	#[error("invalid request: {0}")]
	InvalidRequest(String),
}

impl ApiError {
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}

	pub fn is_conflict(&self) -> bool {
		self.status() == Some(409)
	}

	pub fn is_transport(&self) -> bool {
		matches!(self, Self::Transport { .. })
	}
}
