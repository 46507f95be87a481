use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::ApiClient;

use super::bootstrap::{self, BootstrapPlan};
use super::fixture::SeedData;
use super::payload::{self, ProductParents};
use super::refs::{RefTable, Reference};
use super::report::{EntityKind, SeedState};
use super::resources::{self, Linked, NaturalKey, Upserted};

/// One entity about to be ensured on the backend.
struct Item<'k> {
	kind: EntityKind,
	label: String,
	collection: &'static str,
	key: Option<NaturalKey<'k>>,
}

impl<'k> Item<'k> {
	fn keyed(
		kind: EntityKind,
		collection: &'static str,
		label: impl Into<String>,
		field: &'static str,
		value: &'k str,
	) -> Self {
		Self {
			kind,
			label: label.into(),
			collection,
			key: (!value.trim().is_empty()).then_some(NaturalKey::Text { field, value }),
		}
	}

	fn named(kind: EntityKind, collection: &'static str, name: &'k str) -> Self {
		Self::keyed(kind, collection, name, "name", name)
	}
}

/// Seeds one fixture against one backend session.
pub struct SeedRun<'a> {
	client: ApiClient,
	plan: BootstrapPlan,
	data: &'a SeedData,
	state: SeedState,
	menus: RefTable,
	categories: RefTable,
	subcategories: RefTable,
	environments: RefTable,
	tables: RefTable,
	products: RefTable,
	customers: RefTable,
	tags: RefTable,
}

impl<'a> SeedRun<'a> {
	pub fn new(client: ApiClient, plan: BootstrapPlan, data: &'a SeedData) -> Self {
		Self {
			client,
			plan,
			state: SeedState::default(),
			menus: RefTable::with_len(EntityKind::Menu, data.menus.len()),
			categories: RefTable::with_len(EntityKind::Category, data.categories.len()),
			subcategories: RefTable::with_len(EntityKind::Subcategory, data.subcategories.len()),
			environments: RefTable::with_len(EntityKind::Environment, data.environments.len()),
			tables: RefTable::with_len(EntityKind::Table, data.tables.len()),
			products: RefTable::with_len(EntityKind::Product, data.products.len()),
			customers: RefTable::with_len(EntityKind::Customer, data.customers.len()),
			tags: RefTable::with_len(EntityKind::Tag, data.tags.len()),
			data,
		}
	}

	pub fn into_state(self) -> SeedState {
		self.state
	}

	/// Runs every step in dependency order. Only a failed bootstrap is an error.
	pub async fn execute(&mut self) -> Result<()> {
		self.bootstrap().await?;
		self.seed_menus().await;
		self.seed_categories().await;
		self.seed_subcategories().await;
		self.seed_environments().await;
		self.seed_tables().await;
		self.seed_products().await;
		self.seed_users().await;
		self.seed_customers().await;
		self.seed_tags().await;
		self.seed_reservations().await;
		self.seed_product_tags().await;
		self.seed_notification_templates().await;
		self.seed_settings().await;
		self.seed_theme().await;
		Ok(())
	}

	async fn bootstrap(&mut self) -> Result<()> {
		match bootstrap::run(&mut self.client, &self.plan).await {
			Ok(done) => {
				debug!(strategy = done.strategy, created = done.created, "bootstrapped");
				if done.created {
					self.state.created();
				} else {
					self.state.skipped();
				}
				self.client.set_session(done.session);
				Ok(())
			}
			Err(err) => {
				self.state
					.fail(EntityKind::Org, self.plan.organization.clone(), format!("{err:#}"));
				Err(err)
			}
		}
	}

	/// Lookup by natural key, then create. Returns the id to bind, if any.
	async fn ensure(&mut self, item: Item<'_>, payload: Value) -> Option<Uuid> {
		if let Some(key) = &item.key {
			match resources::find_id(&mut self.client, item.collection, key).await {
				Ok(Some(id)) => {
					info!(kind = %item.kind, item = %item.label, "already exists, reusing");
					self.state.skipped();
					return Some(id);
				}
				Ok(None) => {}
				Err(err) => warn!(kind = %item.kind, item = %item.label, "lookup failed: {err}"),
			}
		}

		match resources::create(&mut self.client, item.collection, &payload).await {
			Ok(id) => {
				info!(kind = %item.kind, item = %item.label, %id, "created");
				self.state.created();
				Some(id)
			}
			Err(err) if err.is_conflict() => {
				warn!(kind = %item.kind, item = %item.label, "backend reports it already exists");
				self.state.skipped();
				match &item.key {
					Some(key) => resources::find_id(&mut self.client, item.collection, key)
						.await
						.ok()
						.flatten(),
					None => None,
				}
			}
			Err(err) => {
				self.state.fail(item.kind, item.label, err.to_string());
				None
			}
		}
	}

	async fn seed_menus(&mut self) {
		let data = self.data;
		for (index, menu) in data.menus.iter().enumerate() {
			let item = Item::named(EntityKind::Menu, "/menu", &menu.name);
			if let Some(id) = self.ensure(item, payload::menu(menu)).await {
				self.menus.bind(index, id);
			}
		}
	}

	async fn seed_categories(&mut self) {
		let data = self.data;
		for (index, category) in data.categories.iter().enumerate() {
			let Some(menu_id) = require(
				&mut self.state,
				EntityKind::Category,
				&category.name,
				&self.menus,
				category.menu_id_ref,
			) else {
				continue;
			};
			let item = Item::named(EntityKind::Category, "/category", &category.name);
			if let Some(id) = self.ensure(item, payload::category(category, menu_id)).await {
				self.categories.bind(index, id);
			}
		}
	}

	async fn seed_subcategories(&mut self) {
		let data = self.data;
		for (index, subcategory) in data.subcategories.iter().enumerate() {
			let Some(category_id) = require(
				&mut self.state,
				EntityKind::Subcategory,
				&subcategory.name,
				&self.categories,
				subcategory.category_id_ref,
			) else {
				continue;
			};
			let item = Item::named(EntityKind::Subcategory, "/subcategory", &subcategory.name);
			let Some(id) = self
				.ensure(item, payload::subcategory(subcategory, category_id))
				.await
			else {
				continue;
			};
			self.subcategories.bind(index, id);

			let path = format!("/subcategory/{id}/category/{category_id}");
			match resources::link(&mut self.client, &path, &payload::subcategory_link(category_id))
				.await
			{
				Ok(Linked::Linked) => debug!(subcategory = %subcategory.name, "linked to category"),
				Ok(Linked::AlreadyLinked) => {
					debug!(subcategory = %subcategory.name, "already linked to category")
				}
				Err(err) => self.state.fail(
					EntityKind::Subcategory,
					subcategory.name.clone(),
					format!("linking to category failed: {err}"),
				),
			}
		}
	}

	async fn seed_environments(&mut self) {
		let data = self.data;
		for (index, environment) in data.environments.iter().enumerate() {
			let item = Item::named(EntityKind::Environment, "/environment", &environment.name);
			if let Some(id) = self.ensure(item, payload::environment(environment)).await {
				self.environments.bind(index, id);
			}
		}
	}

	async fn seed_tables(&mut self) {
		let data = self.data;
		for (index, table) in data.tables.iter().enumerate() {
			let label = format!("mesa_{}", table.number);
			let Some(environment_id) = optional(
				&mut self.state,
				EntityKind::Table,
				&label,
				&self.environments,
				table.environment_id_ref,
			) else {
				continue;
			};
			let item = Item {
				kind: EntityKind::Table,
				label,
				collection: "/table",
				key: Some(NaturalKey::Number {
					field: "number",
					value: table.number,
				}),
			};
			if let Some(id) = self.ensure(item, payload::table(table, environment_id)).await {
				self.tables.bind(index, id);
			}
		}
	}

	async fn seed_products(&mut self) {
		let data = self.data;
		for (index, product) in data.products.iter().enumerate() {
			let kind = EntityKind::Product;
			let Some(menu) = optional(&mut self.state, kind, &product.name, &self.menus, product.menu_id_ref)
			else {
				continue;
			};
			let Some(category) = optional(
				&mut self.state,
				kind,
				&product.name,
				&self.categories,
				product.category_id_ref,
			) else {
				continue;
			};
			let Some(subcategory) = optional(
				&mut self.state,
				kind,
				&product.name,
				&self.subcategories,
				product.subcategory_id_ref,
			) else {
				continue;
			};
			let parents = ProductParents {
				menu,
				category,
				subcategory,
			};
			let item = Item::named(kind, "/product", &product.name);
			if let Some(id) = self.ensure(item, payload::product(product, parents)).await {
				self.products.bind(index, id);
			}
		}
	}

	async fn seed_users(&mut self) {
		let data = self.data;
		for user in &data.users {
			let item = Item::keyed(EntityKind::User, "/user", &user.email, "email", &user.email);
			self.ensure(item, payload::user(user)).await;
		}
	}

	async fn seed_customers(&mut self) {
		let data = self.data;
		for (index, customer) in data.customers.iter().enumerate() {
			let label = if customer.email.is_empty() {
				customer.name.as_str()
			} else {
				customer.email.as_str()
			};
			let item = Item::keyed(EntityKind::Customer, "/customer", label, "email", &customer.email);
			if let Some(id) = self.ensure(item, payload::customer(customer)).await {
				self.customers.bind(index, id);
			}
		}
	}

	async fn seed_tags(&mut self) {
		let data = self.data;
		for (index, tag) in data.tags.iter().enumerate() {
			let item = Item::named(EntityKind::Tag, "/tag", &tag.name);
			if let Some(id) = self.ensure(item, payload::tag(tag)).await {
				self.tags.bind(index, id);
			}
		}
	}

	async fn seed_reservations(&mut self) {
		let data = self.data;
		for (index, reservation) in data.reservations.iter().enumerate() {
			let kind = EntityKind::Reservation;
			let label = if reservation.confirmation_key.is_empty() {
				format!("reservation_{index}")
			} else {
				reservation.confirmation_key.clone()
			};
			let Some(customer_id) = require(
				&mut self.state,
				kind,
				&label,
				&self.customers,
				reservation.customer_id_ref,
			) else {
				continue;
			};
			let Some(table_id) = require(&mut self.state, kind, &label, &self.tables, reservation.table_id_ref)
			else {
				continue;
			};
			let item = Item::keyed(
				kind,
				"/reservation",
				label,
				"confirmation_key",
				&reservation.confirmation_key,
			);
			self.ensure(item, payload::reservation(reservation, customer_id, table_id))
				.await;
		}
	}

	async fn seed_product_tags(&mut self) {
		let data = self.data;
		for (index, link) in data.product_tags.iter().enumerate() {
			let kind = EntityKind::ProductTag;
			let label = format!("product_tag_{index}");
			let Some(product_id) = require(&mut self.state, kind, &label, &self.products, link.product_id_ref)
			else {
				continue;
			};
			let Some(tag_id) = require(&mut self.state, kind, &label, &self.tags, link.tag_id_ref) else {
				continue;
			};
			let path = format!("/product/{product_id}/tag/{tag_id}");
			match resources::link(&mut self.client, &path, &payload::product_tag_link(tag_id)).await {
				Ok(Linked::Linked) => {
					info!(item = %label, "product tagged");
					self.state.created();
				}
				Ok(Linked::AlreadyLinked) => {
					info!(item = %label, "product already tagged");
					self.state.skipped();
				}
				Err(err) => self.state.fail(kind, label, err.to_string()),
			}
		}
	}

	async fn seed_notification_templates(&mut self) {
		let data = self.data;
		for template in &data.notification_templates {
			let item = Item::named(
				EntityKind::NotificationTemplate,
				"/notification-template",
				&template.name,
			);
			self.ensure(item, payload::notification_template(template)).await;
		}
	}

	async fn seed_settings(&mut self) {
		let Some(body) = self.data.settings.as_ref().and_then(payload::settings) else {
			debug!("no project settings to apply");
			return;
		};
		self.upsert_singleton(EntityKind::Settings, "project_settings", "/settings", &body)
			.await;
	}

	async fn seed_theme(&mut self) {
		let Some(body) = self.data.theme_customization.as_ref().and_then(payload::theme) else {
			debug!("no theme customization to apply");
			return;
		};
		self.upsert_singleton(
			EntityKind::Theme,
			"theme_customization",
			"/theme-customization",
			&body,
		)
		.await;
	}

	async fn upsert_singleton(&mut self, kind: EntityKind, label: &str, path: &str, body: &Value) {
		match resources::upsert(&mut self.client, path, body).await {
			Ok(Upserted::Created) => {
				info!(item = label, "created");
				self.state.created();
			}
			Ok(Upserted::Updated) => {
				info!(item = label, "updated");
				self.state.created();
			}
			Err(err) => self.state.fail(kind, label, err.to_string()),
		}
	}
}

/// A dependency the item cannot be created without.
fn require(
	state: &mut SeedState,
	kind: EntityKind,
	item: &str,
	refs: &RefTable,
	raw: Option<i64>,
) -> Option<Uuid> {
	match refs.reference(raw) {
		Reference::Resolved(id) => Some(id),
		Reference::Absent => {
			state.fail(kind, item, format!("missing {} reference", refs.kind()));
			None
		}
		Reference::Unresolved(index) => {
			state.fail(kind, item, format!("{} reference {index} is unresolved", refs.kind()));
			None
		}
	}
}

/// `Some(None)` when the fixture names no parent; `None` when the named
/// parent could not be resolved and the item must be skipped.
fn optional(
	state: &mut SeedState,
	kind: EntityKind,
	item: &str,
	refs: &RefTable,
	raw: Option<i64>,
) -> Option<Option<Uuid>> {
	match refs.reference(raw) {
		Reference::Absent => Some(None),
		Reference::Resolved(id) => Some(Some(id)),
		Reference::Unresolved(index) => {
			state.fail(kind, item, format!("{} reference {index} is unresolved", refs.kind()));
			None
		}
	}
}
