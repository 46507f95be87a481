use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub fn display(p: &Path) -> String {
	p.to_string_lossy().into_owned()
}

pub fn now_rfc3339() -> String {
	OffsetDateTime::now_utc()
		.format(&Rfc3339)
		.unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string())
}

/// Pretty JSON with a trailing newline; parent directories are created.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent)
			.with_context(|| format!("creating report directory {}", parent.display()))?;
	}
	let raw = serde_json::to_string_pretty(value).context("serializing report json")?;
	fs::write(path, format!("{raw}\n"))
		.with_context(|| format!("writing report file {}", path.display()))?;
	Ok(())
}

/// Lower-case slug used to derive mailbox names from organization names.
pub fn email_slug(name: &str) -> String {
	name.trim().to_lowercase().replace([' ', '_'], "-")
}

/// Short random suffix for names that must not collide across runs.
pub fn unique_suffix() -> String {
	uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn slug_maps_separators() {
		assert_eq!(email_slug("Fattoria Da_Nonna"), "fattoria-da-nonna");
		assert_eq!(email_slug("  lep "), "lep");
	}

	#[test]
	fn suffix_is_short_and_unique() {
		let a = unique_suffix();
		let b = unique_suffix();
		assert_eq!(a.len(), 8);
		assert_ne!(a, b);
	}
}
