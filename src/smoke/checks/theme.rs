use serde_json::json;

use crate::smoke::assertions::text_at;
use crate::smoke::suite::{Expect, Probe, SmokeSuite, Verb};

const THEME: &str = "/project/settings/theme";

pub async fn display_and_theme(suite: &mut SmokeSuite) {
	suite
		.run_probes(&[
			Probe::get("/project/settings/display"),
			Probe::put("/project/settings/display")
				.expect(Expect::Reachable)
				.json(json!({ "show_prices": true, "show_images": true, "show_descriptions": true })),
			Probe::post("/project/settings/display/reset")
				.expect(Expect::Reachable)
				.json(json!({})),
			Probe::get(THEME).expect(Expect::Statuses(&[200, 404])),
		])
		.await;

	let palette = json!({
		"primary_color_light": "#FF6B35",
		"secondary_color_light": "#F4A261",
		"background_color_light": "#FFFFFF",
		"card_background_color_light": "#FFFFFF",
		"text_color_light": "#0F172A",
		"text_secondary_color_light": "#64748B",
		"accent_color_light": "#FF9F1C",
		"primary_color_dark": "#FF6B35",
		"secondary_color_dark": "#F4A261",
		"background_color_dark": "#09090b",
		"card_background_color_dark": "#18181b",
		"text_color_dark": "#fafafa",
		"text_secondary_color_dark": "#a1a1aa",
		"accent_color_dark": "#FF9F1C",
		"success_color_light": "#10B981",
		"success_color_dark": "#34D399",
		"warning_color_light": "#F59E0B",
		"warning_color_dark": "#FBBF24",
		"disabled_opacity": 0.5,
		"shadow_intensity": 1.0,
		"is_active": true,
	});
	if let Some(body) = suite
		.check(format!("POST {THEME}"), Verb::Post, THEME, Some(&palette), Expect::Success)
		.await
	{
		expect_colors(suite, "theme saved", &body, &[
			("primary_color_light", "#FF6B35"),
			("primary_color_dark", "#FF6B35"),
		]);
	}

	let partial = json!({ "primary_color_light": "#1E293B", "accent_color_dark": "#F472B6" });
	if let Some(body) = suite
		.check(format!("PUT {THEME}"), Verb::Put, THEME, Some(&partial), Expect::Success)
		.await
	{
		expect_colors(suite, "theme partially updated", &body, &[
			("primary_color_light", "#1E293B"),
			("accent_color_dark", "#F472B6"),
		]);
	}

	suite
		.run_probes(&[
			Probe::post("/project/settings/theme/reset").json(json!({})),
			Probe::get(THEME).expect(Expect::Statuses(&[200, 404])),
			Probe::delete(THEME).expect(Expect::Statuses(&[200, 204, 404])),
		])
		.await;
}

/// Colors are compared only when the reply echoes them.
fn expect_colors(suite: &mut SmokeSuite, name: &str, body: &crate::client::Body, wanted: &[(&str, &str)]) {
	let mismatched: Vec<String> = wanted
		.iter()
		.filter_map(|(key, color)| match text_at(body, key) {
			Some(actual) if actual.eq_ignore_ascii_case(color) => None,
			Some(actual) => Some(format!("{key}={actual}")),
			None => None,
		})
		.collect();
	if mismatched.is_empty() {
		suite.record(name, true, "colors persisted");
	} else {
		suite.record(name, false, format!("unexpected colors: {}", mismatched.join(", ")));
	}
}
