use serde_json::{Value, json};
use uuid::Uuid;

use crate::core::unique_suffix;
use crate::smoke::suite::{Expect, MissingId, SmokeSuite, Verb};

use super::first_id;

/// create → list → get → update → delete for one collection.
struct Flow {
	key: &'static str,
	collection: &'static str,
	create: Value,
	update: Value,
	status: Option<Value>,
	/// Judges the update and status steps.
	update_expect: Expect,
	missing_id: MissingId,
	/// Plural route tried before the collection itself when listing.
	list_alias: Option<&'static str>,
}

impl Flow {
	fn new(key: &'static str, collection: &'static str, create: Value, update: Value) -> Self {
		Self {
			key,
			collection,
			create,
			update,
			status: None,
			update_expect: Expect::Success,
			missing_id: MissingId::Fail,
			list_alias: None,
		}
	}

	/// Updates may be refused by business rules without failing the run.
	fn lenient(mut self) -> Self {
		self.update_expect = Expect::Tolerant;
		self
	}

	/// A create reply without an id ends the flow as a passing note.
	fn id_optional(mut self) -> Self {
		self.missing_id = MissingId::Continue;
		self
	}

	fn with_status(mut self, status: Value) -> Self {
		self.status = Some(status);
		self
	}

	fn listed_as(mut self, alias: &'static str) -> Self {
		self.list_alias = Some(alias);
		self
	}
}

async fn run_flow(suite: &mut SmokeSuite, flow: Flow) {
	let collection = flow.collection;
	let Some(id) = suite
		.create_as(format!("POST {collection}"), collection, &flow.create, flow.key, flow.missing_id)
		.await
	else {
		return;
	};
	let item = format!("{collection}/{id}");

	list(suite, &flow).await;
	suite
		.check(format!("GET {collection}/:id"), Verb::Get, &item, None, Expect::Success)
		.await;
	suite
		.check(
			format!("PUT {collection}/:id"),
			Verb::Put,
			&item,
			Some(&flow.update),
			flow.update_expect,
		)
		.await;
	if let Some(status) = &flow.status {
		suite
			.check(
				format!("PUT {collection}/:id/status"),
				Verb::Put,
				&format!("{item}/status"),
				Some(status),
				flow.update_expect,
			)
			.await;
	}
	suite
		.check(format!("DELETE {collection}/:id"), Verb::Delete, &item, None, Expect::Success)
		.await;
	suite.forget(flow.key);
}

/// An alias that is not served falls back to the collection. Neither
/// failing is fatal.
async fn list(suite: &mut SmokeSuite, flow: &Flow) {
	let collection = flow.collection;
	let Some(alias) = flow.list_alias else {
		suite
			.check(format!("GET {collection}"), Verb::Get, collection, None, Expect::Success)
			.await;
		return;
	};
	let name = format!("GET {alias}");
	if suite.send(Verb::Get, alias, None, false).await.is_ok() {
		suite.record(name, true, "listed");
	} else if suite.send(Verb::Get, collection, None, false).await.is_ok() {
		suite.record(name, true, format!("listed via GET {collection}"));
	} else {
		suite.record(name, true, format!("TODO: endpoint {alias} not implemented"));
	}
}

fn table_number() -> u64 {
	(Uuid::new_v4().as_u128() % 9000 + 1000) as u64
}

fn tenant(suite: &SmokeSuite) -> (String, String) {
	(
		suite.recall("org").unwrap_or_default().to_string(),
		suite.recall("project").unwrap_or_default().to_string(),
	)
}

pub async fn flows(suite: &mut SmokeSuite) {
	let (org, project) = tenant(suite);
	let suffix = unique_suffix();

	let customer = Flow::new(
		"customer",
		"/customer",
		json!({ "name": format!("Smoke Customer {suffix}"), "email": format!("smoke-{suffix}@test.com"), "phone": "+5511999999999" }),
		json!({ "name": format!("Smoke Customer {suffix} (updated)"), "email": format!("smoke-{suffix}@test.com"), "phone": "+5511999999999" }),
	);
	run_flow(suite, customer).await;

	let table = Flow::new(
		"table",
		"/table",
		json!({ "number": table_number(), "capacity": 4, "status": "livre", "location": "smoke" }),
		json!({ "capacity": 6, "status": "ocupada" }),
	);
	run_flow(suite, table).await;

	reservation_flow(suite, &suffix).await;

	let order = Flow::new(
		"order",
		"/order",
		json!({
			"customer_id": Uuid::new_v4(),
			"table_id": Uuid::new_v4(),
			"total_amount": 50.0,
			"status": "pending",
			"organization_id": org,
			"project_id": project,
			"items": [{ "product_id": Uuid::new_v4(), "quantity": 1, "price": 50.0 }],
		}),
		json!({ "status": "processing" }),
	)
	.listed_as("/orders");
	run_flow(suite, order).await;

	let waitlist = Flow::new(
		"waitlist",
		"/waitlist",
		json!({
			"party_size": 5,
			"status": "waiting",
			"customer_id": Uuid::new_v4(),
			"organization_id": org,
			"project_id": project,
		}),
		json!({ "status": "seated" }),
	)
	.lenient()
	.id_optional();
	run_flow(suite, waitlist).await;

	let menu = Flow::new(
		"menu",
		"/menu",
		json!({ "name": format!("Smoke Menu {suffix}"), "description": "smoke menu", "status": "active", "organization_id": org, "project_id": project }),
		json!({ "description": "smoke menu (updated)" }),
	)
	.lenient()
	.id_optional()
	.with_status(json!({ "status": "inactive" }));
	run_flow(suite, menu).await;

	catalogue_flows(suite, &suffix).await;

	let tag = Flow::new(
		"tag",
		"/tag",
		json!({ "name": format!("smoke-{suffix}"), "color": "#FF6B35", "entity_type": "product", "active": true }),
		json!({ "color": "#1E293B" }),
	)
	.lenient()
	.id_optional();
	run_flow(suite, tag).await;

	let environment = Flow::new(
		"environment",
		"/environment",
		json!({ "name": format!("Smoke Room {suffix}"), "description": "smoke", "capacity": 20, "active": true }),
		json!({ "capacity": 30 }),
	)
	.lenient()
	.id_optional();
	run_flow(suite, environment).await;
}

/// Reservations need a live customer and table.
async fn reservation_flow(suite: &mut SmokeSuite, suffix: &str) {
	let guest = json!({ "name": format!("Smoke Guest {suffix}"), "email": format!("guest-{suffix}@test.com"), "phone": "+5511988887777" });
	let Some(customer_id) = suite
		.create("POST /customer (reservation guest)", "/customer", &guest, "guest")
		.await
	else {
		return;
	};
	let spot = json!({ "number": table_number(), "capacity": 4, "status": "livre" });
	let Some(table_id) = suite
		.create("POST /table (reservation table)", "/table", &spot, "guest_table")
		.await
	else {
		return;
	};

	let reservation = Flow::new(
		"reservation",
		"/reservation",
		json!({
			"customer_id": customer_id,
			"table_id": table_id,
			"datetime": "2025-11-15T19:00:00Z",
			"party_size": 4,
			"status": "confirmed",
		}),
		json!({ "status": "completed" }),
	)
	.lenient();
	run_flow(suite, reservation).await;

	suite
		.check(
			"DELETE /table/:id (reservation table)",
			Verb::Delete,
			&format!("/table/{table_id}"),
			None,
			Expect::Reachable,
		)
		.await;
	suite
		.check(
			"DELETE /customer/:id (reservation guest)",
			Verb::Delete,
			&format!("/customer/{customer_id}"),
			None,
			Expect::Reachable,
		)
		.await;
}

/// Categories hang off a menu, subcategories off a category.
async fn catalogue_flows(suite: &mut SmokeSuite, suffix: &str) {
	let parent = json!({ "name": format!("Smoke Parent Menu {suffix}"), "active": true });
	let Some(menu_id) = suite
		.create("POST /menu (category parent)", "/menu", &parent, "parent_menu")
		.await
	else {
		return;
	};

	let category = Flow::new(
		"category",
		"/category",
		json!({ "name": format!("Smoke Category {suffix}"), "menu_id": menu_id, "active": true, "order": 1 }),
		json!({ "name": format!("Smoke Category {suffix} (updated)"), "menu_id": menu_id }),
	)
	.lenient()
	.id_optional();
	run_flow(suite, category).await;

	let holder = json!({ "name": format!("Smoke Parent Category {suffix}"), "menu_id": menu_id, "active": true });
	if let Some(category_id) = suite
		.create("POST /category (subcategory parent)", "/category", &holder, "parent_category")
		.await
	{
		let subcategory = Flow::new(
			"subcategory",
			"/subcategory",
			json!({ "name": format!("Smoke Subcategory {suffix}"), "category_id": category_id, "active": true }),
			json!({ "description": "smoke subcategory (updated)" }),
		)
		.lenient()
		.id_optional();
		run_flow(suite, subcategory).await;
		suite
			.check(
				"DELETE /category/:id (subcategory parent)",
				Verb::Delete,
				&format!("/category/{category_id}"),
				None,
				Expect::Reachable,
			)
			.await;
	}

	suite
		.check(
			"DELETE /menu/:id (category parent)",
			Verb::Delete,
			&format!("/menu/{menu_id}"),
			None,
			Expect::Reachable,
		)
		.await;
}

/// Users and products are read and updated in place, never deleted.
pub async fn existing_items(suite: &mut SmokeSuite) {
	for (collection, update) in [
		("/user", json!({ "name": "Smoke User" })),
		("/product", json!({ "description": "smoke check" })),
	] {
		let Some(list) = suite
			.check(format!("GET {collection} (existing)"), Verb::Get, collection, None, Expect::Success)
			.await
		else {
			continue;
		};
		let Some(id) = first_id(&list) else {
			suite.record(format!("GET {collection}/:id"), true, "skipped: collection is empty");
			continue;
		};
		let item = format!("{collection}/{id}");
		suite
			.check(format!("GET {collection}/:id"), Verb::Get, &item, None, Expect::Success)
			.await;
		suite
			.check(format!("PUT {collection}/:id"), Verb::Put, &item, Some(&update), Expect::Reachable)
			.await;
		if collection == "/product" {
			suite.remember("product", id);
		}
	}
}
