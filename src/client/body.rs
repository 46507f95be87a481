use serde_json::{Map, Value};
use uuid::Uuid;

use super::error::ApiError;

/// Response body, classified once when the bytes arrive.
///
/// The backend wraps single resources in `data`, returns bare arrays from
/// some list endpoints and plain text from `/ping`. Every accessor below
/// works on all three shapes so callers never match on the variant to pull
/// an id or a list out.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
	Object(Map<String, Value>),
	Array(Vec<Value>),
	Raw(String),
}

const LIST_KEYS: [&str; 3] = ["data", "items", "results"];

impl Body {
	pub fn decode(bytes: &[u8]) -> Self {
		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Self::Object(Map::new());
		}
		match serde_json::from_slice::<Value>(bytes) {
			Ok(Value::Object(map)) => Self::Object(map),
			Ok(Value::Array(items)) => Self::Array(items),
			Ok(Value::String(text)) => Self::Raw(text),
			Ok(other) => Self::Raw(other.to_string()),
			Err(_) => Self::Raw(String::from_utf8_lossy(bytes).into_owned()),
		}
	}

	pub fn empty() -> Self {
		Self::Object(Map::new())
	}

	fn object(&self) -> Option<&Map<String, Value>> {
		match self {
			Self::Object(map) => Some(map),
			_ => None,
		}
	}

	/// The `data` object when present, otherwise the top-level object.
	pub fn data(&self) -> Option<&Map<String, Value>> {
		let map = self.object()?;
		match map.get("data") {
			Some(Value::Object(inner)) => Some(inner),
			_ => Some(map),
		}
	}

	fn field(&self, key: &str) -> Option<&Value> {
		let map = self.object()?;
		map.get(key).or_else(|| match map.get("data") {
			Some(Value::Object(inner)) => inner.get(key),
			_ => None,
		})
	}

	pub fn string(&self, key: &str) -> Option<&str> {
		self.field(key).and_then(Value::as_str)
	}

	pub fn flag(&self, key: &str) -> Option<bool> {
		self.field(key).and_then(Value::as_bool)
	}

	/// Value at a dotted path such as `data.items.0.id`. A raw body has no
	/// paths.
	pub fn at(&self, path: &str) -> Option<&Value> {
		let mut segments = path.split('.').filter(|s| !s.is_empty());
		let first = segments.next()?;
		let start = match self {
			Self::Object(map) => map.get(first)?,
			Self::Array(items) => items.get(first.parse::<usize>().ok()?)?,
			Self::Raw(_) => return None,
		};
		segments.try_fold(start, descend)
	}

	/// Entity list of a collection response.
	pub fn items(&self) -> Option<&[Value]> {
		match self {
			Self::Array(items) => Some(items.as_slice()),
			Self::Object(map) => {
				for key in LIST_KEYS {
					if let Some(Value::Array(items)) = map.get(key) {
						return Some(items.as_slice());
					}
				}
				match map.get("data") {
					Some(Value::Object(inner)) => LIST_KEYS
						.iter()
						.find_map(|key| inner.get(*key).and_then(Value::as_array))
						.map(Vec::as_slice),
					_ => None,
				}
			}
			Self::Raw(_) => None,
		}
	}

	/// Human text carried by the body, whatever its shape.
	pub fn text(&self) -> Option<&str> {
		match self {
			Self::Raw(text) => Some(text.as_str()),
			Self::Object(map) => map
				.get("message")
				.and_then(Value::as_str)
				.or_else(|| match map.get("data") {
					Some(Value::String(text)) => Some(text.as_str()),
					Some(Value::Object(inner)) => inner.get("message").and_then(Value::as_str),
					_ => None,
				}),
			Self::Array(_) => None,
		}
	}

	/// Server-provided error or status message.
	pub fn message(&self) -> Option<&str> {
		let map = self.object()?;
		["message", "error"]
			.iter()
			.find_map(|key| map.get(*key).and_then(Value::as_str))
	}

	/// Identifier of the resource in a single-entity reply: `data.id`, then `id`.
	pub fn entity_id(&self) -> Result<Uuid, ApiError> {
		let map = self
			.object()
			.ok_or_else(|| ApiError::Malformed("response is not a JSON object".into()))?;
		let nested = match map.get("data") {
			Some(Value::Object(inner)) => inner.get("id"),
			_ => None,
		};
		let raw = nested
			.or_else(|| map.get("id"))
			.and_then(Value::as_str)
			.ok_or_else(|| ApiError::Malformed("response carries no id".into()))?;
		Uuid::parse_str(raw).map_err(|e| ApiError::Malformed(format!("id '{raw}' is not a uuid: {e}")))
	}

	pub fn to_value(&self) -> Value {
		match self {
			Self::Object(map) => Value::Object(map.clone()),
			Self::Array(items) => Value::Array(items.clone()),
			Self::Raw(text) => Value::String(text.clone()),
		}
	}
}

/// Id of one entity inside a list reply.
pub fn item_id(item: &Value) -> Option<Uuid> {
	item.get("id")
		.and_then(Value::as_str)
		.and_then(|raw| Uuid::parse_str(raw).ok())
}

fn descend<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
	match value {
		Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
		Value::Object(map) => map.get(segment),
		_ => None,
	}
}
