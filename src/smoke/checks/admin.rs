use serde_json::json;

use crate::smoke::suite::{Expect, Probe, SmokeSuite};

/// Membership routes, the password reset, and reports.
pub async fn relations(suite: &mut SmokeSuite) {
	suite
		.run_probes(&[
			Probe::get("/user-organization/user/{user}").expect(Expect::Reachable),
			Probe::get("/user-organization/org/{org}").expect(Expect::Reachable),
			Probe::put("/user-organization/user-org-123")
				.expect(Expect::Tolerant)
				.json(json!({ "role": "admin" })),
			Probe::get("/user-project/user/{user}").expect(Expect::Reachable),
			Probe::get("/user-project/user/{user}/org/{org}").expect(Expect::Reachable),
			Probe::get("/user-project/proj/{project}").expect(Expect::Reachable),
			Probe::put("/user-project/user-proj-123")
				.expect(Expect::Tolerant)
				.json(json!({ "role": "admin" })),
			Probe::post("/admin/reset-passwords")
				.expect(Expect::Reachable)
				.json(json!({ "dry_run": true })),
			Probe::get("/reports/occupancy").expect(Expect::Reachable),
			Probe::get("/reports/reservations").expect(Expect::Reachable),
			Probe::get("/reports/waitlist").expect(Expect::Reachable),
			Probe::get("/reports/leads").expect(Expect::Reachable),
		])
		.await;
}

pub async fn statistics(suite: &mut SmokeSuite) {
	suite
		.run_probes(&[
			Probe::get("/product?minPrice=10&maxPrice=50").expect(Expect::Reachable),
			Probe::get("/product?active=true").expect(Expect::Reachable),
			Probe::get("/category").expect(Expect::Reachable),
			Probe::get("/subcategory").expect(Expect::Reachable),
			Probe::get("/tag").expect(Expect::Reachable),
			Probe::get("/environment").expect(Expect::Reachable),
			Probe::get("/user?role=admin").expect(Expect::Reachable),
			Probe::get("/project/{project}").expect(Expect::Reachable),
			Probe::get("/organization/{org}").expect(Expect::Reachable),
		])
		.await;
}
