use serde_json::{Value, json};

use crate::smoke::suite::{Expect, SmokeSuite, Verb};

use super::first_id;

fn tag_counts(items: &[Value]) -> (usize, usize) {
	items
		.iter()
		.filter_map(|p| p.get("tags").and_then(Value::as_array))
		.filter(|tags| !tags.is_empty())
		.fold((0, 0), |(products, tags), list| (products + 1, tags + list.len()))
}

/// `includeTags` must embed the tags in the product list.
pub async fn product_tags(suite: &mut SmokeSuite) {
	suite
		.check("GET /product (without tags)", Verb::Get, "/product", None, Expect::Success)
		.await;

	let Some(with_tags) = suite
		.check(
			"GET /product?includeTags=true",
			Verb::Get,
			"/product?includeTags=true",
			None,
			Expect::Success,
		)
		.await
	else {
		return;
	};
	let items = with_tags.items().unwrap_or_default();
	let (tagged, tags) = tag_counts(items);
	suite.record(
		"product tags included",
		true,
		format!("{} products, {tagged} tagged, {tags} tags loaded", items.len()),
	);

	suite
		.check(
			"GET /product?active=true&includeTags=true",
			Verb::Get,
			"/product?active=true&includeTags=true",
			None,
			Expect::Success,
		)
		.await;
}

/// Options, the currently active menu, and a manual override round trip.
pub async fn selection(suite: &mut SmokeSuite) {
	let options = suite
		.check("GET /menu/options", Verb::Get, "/menu/options", None, Expect::Success)
		.await;
	suite
		.check("GET /menu/active-now", Verb::Get, "/menu/active-now", None, Expect::Success)
		.await;
	suite
		.check("GET /menu/active", Verb::Get, "/menu/active", None, Expect::Reachable)
		.await;

	let Some(menu_id) = options.as_ref().and_then(first_id) else {
		suite.record("PUT /menu/:id/manual-override", true, "skipped: no menu options");
		return;
	};
	let overridden = suite
		.check(
			"PUT /menu/:id/manual-override",
			Verb::Put,
			&format!("/menu/{menu_id}/manual-override"),
			Some(&json!({})),
			Expect::Success,
		)
		.await;
	if let Some(now) = suite
		.check("GET /menu/active-now (override)", Verb::Get, "/menu/active-now", None, Expect::Success)
		.await
	{
		let active = now.data().and_then(|d| d.get("id")).and_then(Value::as_str);
		if overridden.is_some() && active.is_some() {
			suite.record(
				"manual override applied",
				active == Some(menu_id.as_str()),
				format!("active menu {}", active.unwrap_or_default()),
			);
		}
	}

	suite
		.check(
			"DELETE /menu/manual-override",
			Verb::Delete,
			"/menu/manual-override",
			None,
			Expect::Success,
		)
		.await;
	suite
		.check("GET /menu/active-now (cleared)", Verb::Get, "/menu/active-now", None, Expect::Success)
		.await;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counts_only_products_with_tags() {
		let items = vec![
			json!({ "id": "a", "tags": [{ "id": "t1" }, { "id": "t2" }] }),
			json!({ "id": "b", "tags": [] }),
			json!({ "id": "c" }),
		];
		assert_eq!(tag_counts(&items), (1, 2));
	}
}
