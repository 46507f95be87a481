//! Request bodies for the seeded resources.
//!
//! Optional fixture fields are only sent when they carry a value, so the
//! backend applies its own defaults instead of storing empty strings.

use serde_json::{Map, Value, json};
use uuid::Uuid;

use super::fixture::{
	Category, Customer, Environment, Menu, NotificationTemplate, Product, Reservation, Settings,
	Subcategory, Table, Tag, Theme, User,
};

pub const DEFAULT_TABLE_STATUS: &str = "livre";

const DARK_BACKGROUND: &str = "#1a1a1a";
const DARK_CARD_BACKGROUND: &str = "#2d2d2d";
const DARK_TEXT: &str = "#f0f0f0";
const DARK_TEXT_SECONDARY: &str = "#b0b0b0";

type Fields = Map<String, Value>;

fn fields(seed: Value) -> Fields {
	match seed {
		Value::Object(map) => map,
		_ => Map::new(),
	}
}

fn put_text(map: &mut Fields, key: &str, value: &str) {
	if !value.trim().is_empty() {
		map.insert(key.to_string(), json!(value));
	}
}

fn put_int(map: &mut Fields, key: &str, value: i64) {
	if value > 0 {
		map.insert(key.to_string(), json!(value));
	}
}

fn put_float(map: &mut Fields, key: &str, value: f64) {
	if value > 0.0 {
		map.insert(key.to_string(), json!(value));
	}
}

fn put_id(map: &mut Fields, key: &str, id: Option<Uuid>) {
	if let Some(id) = id {
		map.insert(key.to_string(), json!(id));
	}
}

pub fn menu(menu: &Menu) -> Value {
	let mut body = fields(json!({
		"name": menu.name,
		"order": menu.order,
		"active": true,
	}));
	put_text(&mut body, "description", &menu.description);
	put_int(&mut body, "priority", menu.priority);
	put_text(&mut body, "time_range_start", &menu.time_range_start);
	put_text(&mut body, "time_range_end", &menu.time_range_end);
	if !menu.applicable_days.is_empty() {
		body.insert("applicable_days".into(), json!(menu.applicable_days));
	}
	if !menu.applicable_dates.is_empty() {
		body.insert("applicable_dates".into(), json!(menu.applicable_dates));
	}
	if menu.is_manual_override {
		body.insert("is_manual_override".into(), json!(true));
	}
	Value::Object(body)
}

pub fn category(category: &Category, menu_id: Uuid) -> Value {
	let mut body = fields(json!({
		"menu_id": menu_id,
		"name": category.name,
		"order": category.order,
		"active": true,
	}));
	put_text(&mut body, "description", &category.description);
	Value::Object(body)
}

pub fn subcategory(subcategory: &Subcategory, category_id: Uuid) -> Value {
	let mut body = fields(json!({
		"category_id": category_id,
		"name": subcategory.name,
		"active": true,
	}));
	put_text(&mut body, "description", &subcategory.description);
	put_int(&mut body, "order", subcategory.order);
	Value::Object(body)
}

pub fn subcategory_link(category_id: Uuid) -> Value {
	json!({ "category_id": category_id })
}

pub fn environment(environment: &Environment) -> Value {
	let mut body = fields(json!({
		"name": environment.name,
		"capacity": environment.capacity,
		"active": true,
	}));
	put_text(&mut body, "description", &environment.description);
	Value::Object(body)
}

pub fn table(table: &Table, environment_id: Option<Uuid>) -> Value {
	let status = if table.status.trim().is_empty() {
		DEFAULT_TABLE_STATUS
	} else {
		table.status.as_str()
	};
	let mut body = fields(json!({
		"number": table.number,
		"capacity": table.capacity,
		"status": status,
		"active": true,
	}));
	put_id(&mut body, "environment_id", environment_id);
	put_text(&mut body, "location", &table.location);
	Value::Object(body)
}

/// Resolved parents of a product; `None` fields are left out of the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductParents {
	pub menu: Option<Uuid>,
	pub category: Option<Uuid>,
	pub subcategory: Option<Uuid>,
}

pub fn product(product: &Product, parents: ProductParents) -> Value {
	let mut body = fields(json!({
		"name": product.name,
		"type": product.kind,
		"price_normal": product.price_normal,
		"prep_time_minutes": product.prep_time_minutes,
		"active": true,
		"order": product.order,
	}));
	put_id(&mut body, "menu_id", parents.menu);
	put_id(&mut body, "category_id", parents.category);
	put_id(&mut body, "subcategory_id", parents.subcategory);
	put_text(&mut body, "description", &product.description);
	put_float(&mut body, "price_promo", product.price_promo);

	if product.is_wine() {
		put_text(&mut body, "vintage", &product.vintage);
		put_text(&mut body, "country", &product.country);
		put_text(&mut body, "region", &product.region);
		put_text(&mut body, "winery", &product.winery);
		put_text(&mut body, "wine_type", &product.wine_type);
		put_int(&mut body, "volume", product.volume);
		put_float(&mut body, "alcohol_content", product.alcohol_content);
		put_float(&mut body, "price_bottle", product.price_bottle);
		put_float(&mut body, "price_glass", product.price_glass);
		put_float(&mut body, "price_half_bottle", product.price_half_bottle);
	}
	Value::Object(body)
}

pub fn user(user: &User) -> Value {
	let mut body = fields(json!({
		"name": user.name,
		"email": user.email,
		"password": user.password,
		"role": user.role,
		"active": true,
	}));
	if !user.permissions.is_empty() {
		body.insert("permissions".into(), json!(user.permissions));
	}
	Value::Object(body)
}

pub fn customer(customer: &Customer) -> Value {
	let mut body = fields(json!({
		"name": customer.name,
		"email": customer.email,
		"phone": customer.phone,
		"active": true,
	}));
	put_text(&mut body, "birth_date", &customer.birth_date);
	put_text(&mut body, "notes", &customer.notes);
	Value::Object(body)
}

pub fn reservation(reservation: &Reservation, customer_id: Uuid, table_id: Uuid) -> Value {
	let mut body = fields(json!({
		"customer_id": customer_id,
		"table_id": table_id,
		"datetime": reservation.datetime,
		"party_size": reservation.party_size,
		"status": reservation.status,
	}));
	put_text(&mut body, "notes", &reservation.notes);
	put_text(&mut body, "confirmation_key", &reservation.confirmation_key);
	Value::Object(body)
}

pub fn tag(tag: &Tag) -> Value {
	let mut body = fields(json!({
		"name": tag.name,
		"active": true,
	}));
	put_text(&mut body, "color", &tag.color);
	put_text(&mut body, "description", &tag.description);
	put_text(&mut body, "entity_type", &tag.entity_type);
	Value::Object(body)
}

pub fn product_tag_link(tag_id: Uuid) -> Value {
	json!({ "tag_id": tag_id })
}

pub fn notification_template(template: &NotificationTemplate) -> Value {
	let mut body = fields(json!({
		"name": template.name,
		"channel": template.channel,
		"body": template.body,
		"active": template.active,
	}));
	put_text(&mut body, "subject", &template.subject);
	Value::Object(body)
}

/// `None` when the block carries nothing worth sending.
pub fn settings(settings: &Settings) -> Option<Value> {
	let configured = !settings.timezone.trim().is_empty()
		|| settings.reservation_min_advance_hours > 0
		|| settings.reservation_max_advance_days > 0
		|| !settings.default_notification_channel.trim().is_empty();
	if !configured {
		return None;
	}

	let mut body = fields(json!({
		"notify_reservation_create": settings.notify_reservation_create,
		"notify_reservation_update": settings.notify_reservation_update,
		"notify_reservation_cancel": settings.notify_reservation_cancel,
		"notify_table_available": settings.notify_table_available,
		"notify_confirmation_24h": settings.notify_confirmation_24h,
		"enable_sms": settings.enable_sms,
		"enable_email": settings.enable_email,
		"enable_whatsapp": settings.enable_whatsapp,
	}));
	put_int(&mut body, "min_advance_hours", settings.reservation_min_advance_hours);
	put_int(&mut body, "max_advance_days", settings.reservation_max_advance_days);
	put_text(
		&mut body,
		"default_notification_channel",
		&settings.default_notification_channel,
	);
	put_text(&mut body, "timezone", &settings.timezone);
	Some(Value::Object(body))
}

/// Light variant takes the fixture colors; the dark one keeps the accents
/// and swaps surfaces and text for fixed dark tones.
pub fn theme(theme: &Theme) -> Option<Value> {
	if theme.primary_color.trim().is_empty() {
		return None;
	}

	let mut body = Map::new();
	let pairs = [
		("primary_color", theme.primary_color.as_str(), None),
		("secondary_color", theme.secondary_color.as_str(), None),
		("background_color", theme.background_color.as_str(), Some(DARK_BACKGROUND)),
		(
			"card_background_color",
			theme.card_background_color.as_str(),
			Some(DARK_CARD_BACKGROUND),
		),
		("text_color", theme.text_color.as_str(), Some(DARK_TEXT)),
		(
			"text_secondary_color",
			theme.text_secondary_color.as_str(),
			Some(DARK_TEXT_SECONDARY),
		),
		("accent_color", theme.accent_color.as_str(), None),
	];
	for (key, light, dark) in pairs {
		put_text(&mut body, &format!("{key}_light"), light);
		put_text(&mut body, &format!("{key}_dark"), dark.unwrap_or(light));
	}

	let semantic = [
		("success_color", &theme.success_color),
		("error_color", &theme.error_color),
		("warning_color", &theme.warning_color),
		("info_color", &theme.info_color),
	];
	for (key, color) in semantic {
		if let Some(color) = color.as_deref() {
			put_text(&mut body, &format!("{key}_light"), color);
			put_text(&mut body, &format!("{key}_dark"), color);
		}
	}

	put_float(&mut body, "disabled_opacity", theme.disabled_opacity);
	put_float(&mut body, "shadow_intensity", theme.shadow_intensity);
	body.insert("is_active".into(), json!(theme.is_active));
	Some(Value::Object(body))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn category_carries_the_menu_uuid() {
		let menu_id = Uuid::new_v4();
		let body = category(
			&Category {
				name: "Starters".into(),
				menu_id_ref: Some(0),
				..Default::default()
			},
			menu_id,
		);
		assert_eq!(body["menu_id"], json!(menu_id.to_string()));
		assert_eq!(body["active"], json!(true));
		assert!(body.get("description").is_none());
	}

	#[test]
	fn wine_fields_only_for_wine() {
		let mut wine = Product {
			name: "Chianti".into(),
			kind: "vinho".into(),
			price_normal: 90.0,
			vintage: "2019".into(),
			volume: 750,
			price_glass: 0.0,
			..Default::default()
		};
		let body = product(&wine, ProductParents::default());
		assert_eq!(body["vintage"], json!("2019"));
		assert_eq!(body["volume"], json!(750));
		assert!(body.get("price_glass").is_none());
		assert!(body.get("menu_id").is_none());

		wine.kind = "prato".into();
		let dish = product(&wine, ProductParents::default());
		assert!(dish.get("vintage").is_none());
		assert!(dish.get("volume").is_none());
	}

	#[test]
	fn table_defaults_status_and_optional_environment() {
		let env = Uuid::new_v4();
		let with_env = table(&Table { number: 4, capacity: 2, ..Default::default() }, Some(env));
		assert_eq!(with_env["status"], json!("livre"));
		assert_eq!(with_env["environment_id"], json!(env.to_string()));

		let bare = table(&Table { number: 5, status: "ocupada".into(), ..Default::default() }, None);
		assert_eq!(bare["status"], json!("ocupada"));
		assert!(bare.get("environment_id").is_none());
	}

	#[test]
	fn settings_need_a_meaningful_field() {
		assert!(settings(&Settings::default()).is_none());
		let body = settings(&Settings {
			timezone: "America/Sao_Paulo".into(),
			enable_email: true,
			..Default::default()
		})
		.expect("configured");
		assert_eq!(body["timezone"], json!("America/Sao_Paulo"));
		assert_eq!(body["enable_email"], json!(true));
		assert!(body.get("min_advance_hours").is_none());
	}

	#[test]
	fn theme_derives_dark_surfaces() {
		assert!(theme(&Theme::default()).is_none());
		let body = theme(&Theme {
			primary_color: "#aa0000".into(),
			background_color: "#ffffff".into(),
			text_color: "#111111".into(),
			success_color: Some("#00ff00".into()),
			is_active: true,
			..Default::default()
		})
		.expect("themed");
		assert_eq!(body["primary_color_light"], json!("#aa0000"));
		assert_eq!(body["primary_color_dark"], json!("#aa0000"));
		assert_eq!(body["background_color_light"], json!("#ffffff"));
		assert_eq!(body["background_color_dark"], json!("#1a1a1a"));
		assert_eq!(body["text_color_dark"], json!("#f0f0f0"));
		assert_eq!(body["card_background_color_dark"], json!("#2d2d2d"));
		assert_eq!(body["success_color_dark"], json!("#00ff00"));
		assert!(body.get("secondary_color_light").is_none());
		assert_eq!(body["is_active"], json!(true));
	}
}
