use serde_json::json;
use sha2::{Digest, Sha256};

use crate::client::FileUpload;
use crate::smoke::assertions::{is_image_url, text_at};
use crate::smoke::suite::{Expect, Probe, SmokeSuite};

/// 1x1 white PNG.
pub const PIXEL_PNG: &[u8] = &[
	0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
	0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53,
	0xde, 0x00, 0x00, 0x00, 0x0c, 0x49, 0x44, 0x41, 0x54, 0x08, 0xd7, 0x63, 0xf8, 0xff, 0xff, 0x3f,
	0x00, 0x05, 0xfe, 0x02, 0xfe, 0xa7, 0x35, 0x81, 0x84, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e,
	0x44, 0xae, 0x42, 0x60, 0x82,
];

fn png(file_name: &str) -> FileUpload {
	FileUpload {
		field: "image".to_string(),
		file_name: file_name.to_string(),
		content_type: "image/png".to_string(),
		bytes: PIXEL_PNG.to_vec(),
	}
}

pub fn local_digest(bytes: &[u8]) -> String {
	hex::encode(Sha256::digest(bytes))
}

/// Uploads a PNG and checks `data.image_url` came back. Returns the URL.
async fn upload_image(suite: &mut SmokeSuite, path: &str, file_name: &str) -> Option<String> {
	let name = format!("POST {path}");
	let body = suite
		.check_upload(name.clone(), path, &png(file_name), Expect::Success)
		.await?;
	if body.flag("success") == Some(false) {
		suite.record(format!("{name} (success flag)"), false, "response.success = false");
		return None;
	}
	match text_at(&body, "image_url") {
		Some(url) => {
			let known = is_image_url(&url);
			suite.record(
				format!("{name} (image_url)"),
				known,
				if known { url.clone() } else { format!("unexpected image url {url}") },
			);
			Some(url)
		}
		None => {
			suite.record(format!("{name} (image_url)"), false, "data.image_url missing");
			None
		}
	}
}

pub async fn images(suite: &mut SmokeSuite) {
	upload_image(suite, "/upload/categories/image", "smoke_category.png").await;
	let product_image = upload_image(suite, "/upload/products/image", "smoke_product.png").await;

	// Legacy single-product route.
	if let Some(url) = product_image {
		suite
			.run_probes(&[Probe::put("/product/{product}/image")
				.expect(Expect::Tolerant)
				.json(json!({ "image_url": url }))])
			.await;
	}

	deduplication(suite).await;
}

/// Identical bytes must yield identical backend hashes, when reported.
pub async fn deduplication(suite: &mut SmokeSuite) {
	let digest = local_digest(PIXEL_PNG);
	let path = "/upload/banners/image";

	let Some(first) = suite
		.check_upload("POST /upload/banners/image (1st)", path, &png("banner1.png"), Expect::Success)
		.await
	else {
		return;
	};
	let Some(second) = suite
		.check_upload("POST /upload/banners/image (2nd)", path, &png("banner2.png"), Expect::Success)
		.await
	else {
		return;
	};

	let name = "upload deduplication";
	match (text_at(&first, "file_hash"), text_at(&second, "file_hash")) {
		(Some(a), Some(b)) if a == b => {
			suite.record(name, true, format!("hashes match ({a}); local sha256 {digest}"))
		}
		(Some(a), Some(b)) => {
			suite.record(name, false, format!("hashes differ: {a} vs {b}; local sha256 {digest}"))
		}
		_ => suite.record(name, true, format!("backend reports no file_hash; local sha256 {digest}")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::smoke::suite::tests::suite_for;
	use wiremock::matchers::{method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	#[test]
	fn digest_is_hex_sha256() {
		let digest = local_digest(PIXEL_PNG);
		assert_eq!(digest.len(), 64);
		assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
		assert_eq!(digest, local_digest(&PIXEL_PNG.to_vec()));
	}

	#[tokio::test]
	async fn identical_uploads_report_equal_hashes() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/upload/banners/image"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"success": true,
				"data": { "image_url": "http://localhost:8080/uploads/a.png", "file_hash": "abc123" },
			})))
			.expect(2)
			.mount(&server)
			.await;

		let mut suite = suite_for(&server);
		deduplication(&mut suite).await;
		let last = suite.results().last().expect("verdict");
		assert_eq!(last.name, "upload deduplication");
		assert!(last.passed, "{}", last.message);
		assert!(last.message.contains("hashes match (abc123)"));
	}

	#[tokio::test]
	async fn differing_hashes_fail() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/upload/banners/image"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "file_hash": "one" } })))
			.up_to_n_times(1)
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(path("/upload/banners/image"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "file_hash": "two" } })))
			.mount(&server)
			.await;

		let mut suite = suite_for(&server);
		deduplication(&mut suite).await;
		assert_eq!(suite.failed(), 1);
	}

	#[tokio::test]
	async fn missing_image_url_fails() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/upload/categories/image"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": {} })))
			.mount(&server)
			.await;

		let mut suite = suite_for(&server);
		assert!(upload_image(&mut suite, "/upload/categories/image", "c.png").await.is_none());
		assert_eq!(suite.results()[1].message, "data.image_url missing");
	}
}
