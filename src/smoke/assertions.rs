use anyhow::{Result, anyhow};
use regex::Regex;
use serde_json::Value;

use crate::client::Body;

/// Non-empty string at `path`, tried on the reply root and then under `data`.
pub fn text_at(body: &Body, path: &str) -> Option<String> {
	body.at(path)
		.or_else(|| body.at(&format!("data.{path}")))
		.and_then(Value::as_str)
		.filter(|s| !s.is_empty())
		.map(str::to_string)
}

pub fn matches_pattern(text: &str, pattern: &str) -> Result<bool> {
	let re = Regex::new(pattern).map_err(|e| anyhow!("invalid regex '{pattern}': {e}"))?;
	Ok(re.is_match(text))
}

/// Stored images are served either from object storage or a local server.
pub fn is_image_url(text: &str) -> bool {
	matches_pattern(
		text,
		r"^https?://(storage\.googleapis\.com|localhost|127\.0\.0\.1)[:/]",
	)
	.unwrap_or(false)
}
