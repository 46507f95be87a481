use serde_json::json;

use crate::core::unique_suffix;
use crate::smoke::suite::{Expect, Probe, SmokeSuite, Verb};

use super::first_id;

const FOUND_OR_MISSING: Expect = Expect::Statuses(&[200, 404]);

pub async fn tenancy(suite: &mut SmokeSuite) {
	suite
		.run_probes(&[
			Probe::get("/project"),
			Probe::get("/project/active").expect(FOUND_OR_MISSING),
			Probe::get("/organization"),
			Probe::get("/organization/{org}").expect(FOUND_OR_MISSING),
			Probe::get("/organization/active").expect(FOUND_OR_MISSING),
		])
		.await;
}

/// Lists a parent collection and reads its first item back.
async fn list_then_get(suite: &mut SmokeSuite, collection: &str) {
	let Some(list) = suite
		.check(format!("GET {collection} (relation)"), Verb::Get, collection, None, Expect::Success)
		.await
	else {
		return;
	};
	if let Some(id) = first_id(&list) {
		suite
			.check(
				format!("GET {collection}/:id (relation)"),
				Verb::Get,
				&format!("{collection}/{id}"),
				None,
				Expect::Success,
			)
			.await;
	}
}

pub async fn relations(suite: &mut SmokeSuite) {
	suite
		.run_probes(&[
			Probe::get("/user/{user}/organizations-projects"),
			Probe::get("/organization/active").expect(FOUND_OR_MISSING),
			Probe::get("/project/active").expect(FOUND_OR_MISSING),
			Probe::get("/tag"),
		])
		.await;

	let tagged = json!({
		"name": format!("Smoke Tagged Product {}", unique_suffix()),
		"description": "product for tag relations",
		"price_normal": 99.99,
		"organization_id": suite.recall("org"),
		"project_id": suite.recall("project"),
	});
	if let Some(id) = suite
		.create("POST /product (tag relation)", "/product", &tagged, "tagged_product")
		.await
	{
		suite
			.check(
				"DELETE /product/:id (tag relation)",
				Verb::Delete,
				&format!("/product/{id}"),
				None,
				Expect::Reachable,
			)
			.await;
		suite.forget("tagged_product");
	}

	for collection in ["/menu", "/category", "/environment", "/table"] {
		list_then_get(suite, collection).await;
	}
}

pub async fn notifications(suite: &mut SmokeSuite) {
	let template = format!("smoke-{}", unique_suffix());
	suite
		.run_probes(&[
			Probe::get("/notification").expect(Expect::Reachable),
			Probe::get("/notification/config").expect(Expect::Reachable),
			Probe::get("/notification/templates").expect(Expect::Reachable),
			Probe::post("/notification/send").expect(Expect::Tolerant).json(json!({
				"type": "email",
				"recipient": "test@example.com",
				"subject": "Smoke notification",
				"message": "This is a smoke test notification",
				"template_id": template,
			})),
			Probe::get("/notification/logs").expect(Expect::Reachable),
			Probe::post("/notification/template").expect(Expect::Tolerant).json(json!({
				"name": template,
				"channel": "email",
				"subject": "Smoke",
				"body": "Hello {{name}}",
			})),
			Probe::put("/notification/template").expect(Expect::Tolerant).json(json!({
				"name": template,
				"body": "Hello again {{name}}",
			})),
			Probe::post("/notification/event").expect(Expect::Tolerant).json(json!({
				"event_type": "reservation_create",
				"entity_id": uuid::Uuid::new_v4(),
			})),
			Probe::post("/notification/config").expect(Expect::Tolerant).json(json!({
				"event_type": "reservation_create",
				"channels": ["email"],
				"enabled": true,
			})),
		])
		.await;
}

pub async fn settings(suite: &mut SmokeSuite) {
	let update = json!({
		"notification_enabled": true,
		"auto_confirmation": false,
		"theme": "dark",
		"organization_id": suite.recall("org"),
		"project_id": suite.recall("project"),
	});
	suite
		.run_probes(&[
			Probe::get("/settings"),
			Probe::put("/settings").expect(Expect::Reachable).json(update),
			Probe::get("/settings/notifications").expect(Expect::Reachable),
			Probe::post("/settings/reset").expect(Expect::Tolerant),
		])
		.await;
}

pub async fn kitchen(suite: &mut SmokeSuite) {
	suite.remember("kitchen_item", unique_suffix());
	suite
		.run_probes(&[
			Probe::get("/kitchen/queue").expect(Expect::Reachable),
			Probe::put("/kitchen/queue/{kitchen_item}")
				.expect(Expect::Tolerant)
				.json(json!({ "status": "completed" })),
			Probe::get("/kitchen/queue?status=preparing&limit=10").expect(Expect::Reachable),
		])
		.await;
}

pub async fn filtering(suite: &mut SmokeSuite) {
	suite
		.run_probes(&[
			Probe::get("/product?page=1&limit=10").expect(Expect::Reachable),
			Probe::get("/customer?search=test").expect(Expect::Reachable),
			Probe::get("/order?status=completed").expect(Expect::Reachable),
			Probe::get("/table?sort=table_number&order=asc").expect(Expect::Reachable),
			Probe::get("/reservation?status=confirmed&date=2024-11-01").expect(Expect::Reachable),
			Probe::get("/product?minPrice=10&maxPrice=50").expect(Expect::Reachable),
		])
		.await;
}

pub async fn bulk(suite: &mut SmokeSuite) {
	suite
		.run_probes(&[
			Probe::post("/product/bulk").expect(Expect::Tolerant).json(json!({
				"products": [
					{ "name": "Smoke Bulk 1", "description": "bulk import 1", "price_normal": 29.99 },
					{ "name": "Smoke Bulk 2", "description": "bulk import 2", "price_normal": 39.99 },
				],
			})),
			Probe::put("/table/bulk").expect(Expect::Tolerant).json(json!({
				"tables": [
					{ "id": "fake-id-1", "status": "livre" },
					{ "id": "fake-id-2", "status": "livre" },
				],
			})),
			Probe::delete("/customer/bulk")
				.expect(Expect::Tolerant)
				.json(json!({ "ids": ["id-1", "id-2", "id-3"] })),
		])
		.await;
}
