use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use crate::client::{ApiClient, ApiResult, item_id};

/// Field that identifies an entity across runs.
#[derive(Debug, Clone, Copy)]
pub enum NaturalKey<'a> {
	Text { field: &'static str, value: &'a str },
	Number { field: &'static str, value: i64 },
}

impl NaturalKey<'_> {
	pub fn matches(&self, item: &Value) -> bool {
		match *self {
			Self::Text { field, value } => item.get(field).and_then(Value::as_str) == Some(value),
			Self::Number { field, value } => match item.get(field) {
				Some(Value::Number(n)) => n.as_i64() == Some(value),
				Some(Value::String(s)) => s.trim().parse::<i64>().ok() == Some(value),
				_ => false,
			},
		}
	}
}

pub async fn find_id(
	client: &mut ApiClient,
	collection: &str,
	key: &NaturalKey<'_>,
) -> ApiResult<Option<Uuid>> {
	let reply = client.request(Method::GET, collection, None).await?;
	Ok(reply
		.body
		.items()
		.unwrap_or_default()
		.iter()
		.find(|item| key.matches(item))
		.and_then(item_id))
}

pub async fn create(client: &mut ApiClient, collection: &str, payload: &Value) -> ApiResult<Uuid> {
	let reply = client.request(Method::POST, collection, Some(payload)).await?;
	reply.body.entity_id()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linked {
	Linked,
	AlreadyLinked,
}

/// 409 means the relation already exists.
pub async fn link(client: &mut ApiClient, path: &str, payload: &Value) -> ApiResult<Linked> {
	match client.request(Method::POST, path, Some(payload)).await {
		Ok(_) => Ok(Linked::Linked),
		Err(err) if err.is_conflict() => Ok(Linked::AlreadyLinked),
		Err(err) => Err(err),
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
	Created,
	Updated,
}

/// POST, and PUT the same body when the singleton already exists.
pub async fn upsert(client: &mut ApiClient, path: &str, payload: &Value) -> ApiResult<Upserted> {
	match client.request(Method::POST, path, Some(payload)).await {
		Ok(_) => Ok(Upserted::Created),
		Err(err) if err.is_conflict() => {
			client.request(Method::PUT, path, Some(payload)).await?;
			Ok(Upserted::Updated)
		}
		Err(err) => Err(err),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn number_keys_accept_numeric_strings() {
		let key = NaturalKey::Number {
			field: "number",
			value: 7,
		};
		assert!(key.matches(&json!({ "number": 7 })));
		assert!(key.matches(&json!({ "number": "7" })));
		assert!(!key.matches(&json!({ "number": 8 })));
		assert!(!key.matches(&json!({ "name": "7" })));
	}

	#[test]
	fn text_keys_match_exactly() {
		let key = NaturalKey::Text {
			field: "name",
			value: "Lunch",
		};
		assert!(key.matches(&json!({ "name": "Lunch" })));
		assert!(!key.matches(&json!({ "name": "lunch" })));
	}
}
