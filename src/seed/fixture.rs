use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::core::display;

/// A seed file. Cross references (`*_id_ref`) are indices into the named list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
	pub organization: Organization,
	pub menus: Vec<Menu>,
	pub categories: Vec<Category>,
	pub subcategories: Vec<Subcategory>,
	pub environments: Vec<Environment>,
	pub tables: Vec<Table>,
	pub products: Vec<Product>,
	pub users: Vec<User>,
	pub customers: Vec<Customer>,
	pub reservations: Vec<Reservation>,
	pub tags: Vec<Tag>,
	pub product_tags: Vec<ProductTag>,
	pub settings: Option<Settings>,
	pub notification_templates: Vec<NotificationTemplate>,
	pub theme_customization: Option<Theme>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Organization {
	pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Menu {
	pub name: String,
	pub description: String,
	pub order: i64,
	pub priority: i64,
	pub time_range_start: String,
	pub time_range_end: String,
	pub applicable_days: Vec<String>,
	pub applicable_dates: Vec<String>,
	pub is_manual_override: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Category {
	pub name: String,
	pub description: String,
	pub menu_id_ref: Option<i64>,
	pub order: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Subcategory {
	pub name: String,
	pub description: String,
	pub category_id_ref: Option<i64>,
	pub order: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Environment {
	pub name: String,
	pub description: String,
	pub capacity: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Table {
	pub number: i64,
	pub capacity: i64,
	pub location: String,
	pub status: String,
	pub environment_id_ref: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Product {
	pub name: String,
	pub description: String,
	#[serde(rename = "type")]
	pub kind: String,
	pub price_normal: f64,
	pub price_promo: f64,
	pub price_glass: f64,
	pub price_bottle: f64,
	pub price_half_bottle: f64,
	pub menu_id_ref: Option<i64>,
	pub category_id_ref: Option<i64>,
	pub subcategory_id_ref: Option<i64>,
	pub order: i64,
	pub prep_time_minutes: i64,
	pub vintage: String,
	pub country: String,
	pub region: String,
	pub winery: String,
	pub wine_type: String,
	pub volume: i64,
	pub alcohol_content: f64,
}

impl Product {
	pub const WINE: &'static str = "vinho";

	pub fn is_wine(&self) -> bool {
		self.kind == Self::WINE
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct User {
	pub name: String,
	pub email: String,
	pub password: String,
	pub role: String,
	pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Customer {
	pub name: String,
	pub email: String,
	pub phone: String,
	pub birth_date: String,
	pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Reservation {
	pub customer_id_ref: Option<i64>,
	pub table_id_ref: Option<i64>,
	pub datetime: String,
	pub party_size: i64,
	pub notes: String,
	pub status: String,
	pub confirmation_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Tag {
	pub name: String,
	pub color: String,
	pub description: String,
	pub entity_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductTag {
	pub product_id_ref: Option<i64>,
	pub tag_id_ref: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub reservation_min_advance_hours: i64,
	pub reservation_max_advance_days: i64,
	pub notify_reservation_create: bool,
	pub notify_reservation_update: bool,
	pub notify_reservation_cancel: bool,
	pub notify_table_available: bool,
	pub notify_confirmation_24h: bool,
	pub default_notification_channel: String,
	pub enable_sms: bool,
	pub enable_email: bool,
	pub enable_whatsapp: bool,
	pub timezone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotificationTemplate {
	pub name: String,
	pub channel: String,
	pub subject: String,
	pub body: String,
	pub active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Theme {
	pub primary_color: String,
	pub secondary_color: String,
	pub background_color: String,
	pub card_background_color: String,
	pub text_color: String,
	pub text_secondary_color: String,
	pub accent_color: String,
	pub success_color: Option<String>,
	pub error_color: Option<String>,
	pub warning_color: Option<String>,
	pub info_color: Option<String>,
	pub disabled_opacity: f64,
	pub shadow_intensity: f64,
	pub is_active: bool,
}

pub fn load(path: &Path) -> Result<SeedData> {
	let raw = fs::read_to_string(path)
		.with_context(|| format!("reading seed file {}", display(path)))?;
	parse(&raw).with_context(|| format!("parsing seed file {}", display(path)))
}

pub fn parse(raw: &str) -> Result<SeedData> {
	let data = serde_json::from_str::<SeedData>(raw)?;
	Ok(data)
}

/// Rejects fixtures the backend cannot bootstrap from.
pub fn validate(data: &SeedData) -> Result<()> {
	if data.organization.name.trim().is_empty() {
		bail!("organization must have a name");
	}
	if data.menus.is_empty() {
		bail!("must have at least one menu");
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_refs_and_optional_blocks() {
		let data = parse(
			r#"{
				"organization": {"name": "Fattoria", "phone": "+55 11 3333-0000", "active": true},
				"menus": [{"name": "Lunch", "order": 1, "active": false}],
				"categories": [{"name": "Starters", "menu_id_ref": 0}, {"name": "Loose"}],
				"products": [{"name": "Chianti", "type": "vinho", "price_normal": 89.9, "vintage": "2019"}],
				"orders": [{"ignored": true}]
			}"#,
		)
		.expect("parse");
		assert_eq!(data.categories[0].menu_id_ref, Some(0));
		assert_eq!(data.categories[1].menu_id_ref, None);
		assert!(data.products[0].is_wine());
		assert!(data.settings.is_none());
		assert!(data.theme_customization.is_none());
	}

	#[test]
	fn rejects_missing_menus() {
		let data = parse(r#"{"organization": {"name": "Fattoria"}}"#).expect("parse");
		let err = validate(&data).expect_err("no menus");
		assert_eq!(err.to_string(), "must have at least one menu");
	}

	#[test]
	fn rejects_unnamed_organization() {
		let data = parse(r#"{"menus": [{"name": "Lunch"}]}"#).expect("parse");
		let err = validate(&data).expect_err("no name");
		assert_eq!(err.to_string(), "organization must have a name");
	}

	#[test]
	fn load_reports_the_path() {
		let dir = tempfile::tempdir().expect("tmp");
		let path = dir.path().join("broken.json");
		fs::write(&path, "{ not json").expect("write");
		let err = load(&path).expect_err("broken");
		assert!(format!("{err:#}").contains("broken.json"));
	}
}
