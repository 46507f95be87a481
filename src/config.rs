use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use rust_dotenv::dotenv::DotEnv;
use serde::Deserialize;

use crate::core::{display, email_slug};

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_SEED_FILE: &str = "seed-fattoria.json";
pub const DEFAULT_PASSWORD: &str = "senha123";
pub const AUTO_EMAIL_DOMAIN: &str = "lep.com";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeedConfig {
	pub server: ServerCfg,
	pub auth: AuthCfg,
	pub seed: SeedCfg,
	pub logging: LoggingCfg,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerCfg {
	pub url: String,
	/// Seconds
	pub timeout: u64,
}

impl Default for ServerCfg {
	fn default() -> Self {
		Self {
			url: DEFAULT_BASE_URL.to_string(),
			timeout: 30,
		}
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthCfg {
	pub organization_name: String,
	pub password: String,
	pub fallback_email: String,
	pub fallback_password: String,
	pub auto_email: bool,
}

impl Default for AuthCfg {
	fn default() -> Self {
		Self {
			organization_name: String::new(),
			password: DEFAULT_PASSWORD.to_string(),
			fallback_email: format!("pablo@{AUTO_EMAIL_DOMAIN}"),
			fallback_password: DEFAULT_PASSWORD.to_string(),
			auto_email: true,
		}
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeedCfg {
	pub file: String,
	pub stop_on_error: bool,
	/// Accepted for compatibility; steps always run in order.
	pub parallel: bool,
}

impl Default for SeedCfg {
	fn default() -> Self {
		Self {
			file: DEFAULT_SEED_FILE.to_string(),
			stop_on_error: false,
			parallel: false,
		}
	}
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingCfg {
	pub level: String,
	pub show_payloads: bool,
}

impl Default for LoggingCfg {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			show_payloads: false,
		}
	}
}

/// Values supplied on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct SeedOverrides {
	pub url: Option<String>,
	pub organization: Option<String>,
	pub timeout_secs: Option<u64>,
	pub verbose: bool,
}

impl SeedConfig {
	/// Defaults, then the YAML file, then `.env`/environment, then flags.
	pub fn resolve(path: &Path, overrides: &SeedOverrides) -> Result<Self> {
		let mut cfg = Self::load(path)?;
		let dotenv = DotEnv::new("");
		cfg.apply_env(|key| dotenv.get_var(key.to_string()));
		cfg.apply_overrides(overrides);
		Ok(cfg)
	}

	/// Missing file means defaults; a file that exists must parse.
	pub fn load(path: &Path) -> Result<Self> {
		if !path.exists() {
			return Ok(Self::default());
		}
		let raw = fs::read_to_string(path)
			.with_context(|| format!("reading config file {}", display(path)))?;
		Self::from_yaml(&raw).with_context(|| format!("parsing config file {}", display(path)))
	}

	pub fn from_yaml(raw: &str) -> Result<Self> {
		if raw.trim().is_empty() {
			return Ok(Self::default());
		}
		let cfg = serde_yaml_ng::from_str::<Self>(raw).context("invalid YAML")?;
		Ok(cfg)
	}

	pub fn apply_env<F>(&mut self, lookup: F)
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
		if let Some(url) = get("LEPKIT_SERVER_URL") {
			self.server.url = url;
		}
		if let Some(org) = get("LEPKIT_ORGANIZATION") {
			self.auth.organization_name = org;
		}
		if let Some(email) = get("LEPKIT_FALLBACK_EMAIL") {
			self.auth.fallback_email = email;
		}
		if let Some(password) = get("LEPKIT_FALLBACK_PASSWORD") {
			self.auth.fallback_password = password;
		}
	}

	pub fn apply_overrides(&mut self, overrides: &SeedOverrides) {
		if let Some(url) = &overrides.url {
			self.server.url = url.clone();
		}
		if let Some(org) = &overrides.organization {
			self.auth.organization_name = org.clone();
		}
		if let Some(secs) = overrides.timeout_secs {
			self.server.timeout = secs;
		}
		if overrides.verbose {
			self.logging.level = "debug".to_string();
			self.logging.show_payloads = true;
		}
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.server.timeout.max(1))
	}

	pub fn is_verbose(&self) -> bool {
		matches!(
			self.logging.level.to_ascii_lowercase().as_str(),
			"debug" | "verbose" | "trace"
		)
	}

	pub fn auto_email(&self, organization: &str) -> String {
		format!("{}@{}", email_slug(organization), AUTO_EMAIL_DOMAIN)
	}

	/// Mailbox used to create, or log into, the seeded organization.
	pub fn primary_email(&self, organization: &str) -> String {
		if self.auth.auto_email {
			self.auto_email(organization)
		} else {
			self.auth.fallback_email.clone()
		}
	}

	pub fn print_summary(&self) {
		println!("Seed configuration:");
		println!("  server: {} (timeout {}s)", self.server.url, self.server.timeout);
		if self.auth.organization_name.is_empty() {
			println!("  organization: <from seed file>");
		} else {
			println!(
				"  organization: {} ({})",
				self.auth.organization_name,
				self.primary_email(&self.auth.organization_name)
			);
		}
		println!("  fallback login: {}", self.auth.fallback_email);
		println!("  seed file: {}", self.seed.file);
		println!("  stop on error: {}", self.seed.stop_on_error);
		println!(
			"  logging: {} (payloads {})",
			self.logging.level,
			if self.logging.show_payloads { "on" } else { "off" }
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use std::io::Write;

	#[test]
	fn defaults_match_backend_conventions() {
		let cfg = SeedConfig::default();
		assert_eq!(cfg.server.url, "http://localhost:8080");
		assert_eq!(cfg.server.timeout, 30);
		assert_eq!(cfg.seed.file, "seed-fattoria.json");
		assert_eq!(cfg.auth.fallback_email, "pablo@lep.com");
		assert!(cfg.auth.auto_email);
		assert!(!cfg.is_verbose());
	}

	#[test]
	fn yaml_overrides_only_named_keys() {
		let cfg = SeedConfig::from_yaml(
			"server:\n  url: http://api:9000\nseed:\n  stop_on_error: true\n  parallel: true\nextra: 1\n",
		)
		.expect("parse");
		assert_eq!(cfg.server.url, "http://api:9000");
		assert_eq!(cfg.server.timeout, 30);
		assert!(cfg.seed.stop_on_error);
		assert_eq!(cfg.seed.file, DEFAULT_SEED_FILE);
	}

	#[test]
	fn malformed_yaml_is_an_error() {
		let mut file = tempfile::NamedTempFile::new().expect("tmp");
		write!(file, "server: [unclosed").expect("write");
		let err = SeedConfig::load(file.path()).expect_err("must fail");
		assert!(err.to_string().contains("parsing config file"));
	}

	#[test]
	fn missing_file_yields_defaults() {
		let dir = tempfile::tempdir().expect("tmp");
		let cfg = SeedConfig::load(&dir.path().join("config.yaml")).expect("defaults");
		assert_eq!(cfg, SeedConfig::default());
	}

	#[test]
	fn flags_beat_env_beat_yaml() {
		let mut cfg = SeedConfig::from_yaml("server:\n  url: http://yaml\nauth:\n  organization_name: Yaml Org\n")
			.expect("parse");
		let env: HashMap<&str, &str> = [
			("LEPKIT_SERVER_URL", "http://env"),
			("LEPKIT_FALLBACK_EMAIL", "ops@lep.com"),
		]
		.into_iter()
		.collect();
		cfg.apply_env(|key| env.get(key).map(|v| v.to_string()));
		assert_eq!(cfg.server.url, "http://env");
		assert_eq!(cfg.auth.fallback_email, "ops@lep.com");

		cfg.apply_overrides(&SeedOverrides {
			url: Some("http://flag".into()),
			organization: None,
			timeout_secs: Some(5),
			verbose: true,
		});
		assert_eq!(cfg.server.url, "http://flag");
		assert_eq!(cfg.auth.organization_name, "Yaml Org");
		assert_eq!(cfg.timeout(), Duration::from_secs(5));
		assert!(cfg.is_verbose());
		assert!(cfg.logging.show_payloads);
	}

	#[test]
	fn auto_email_uses_slug() {
		let cfg = SeedConfig::default();
		assert_eq!(cfg.primary_email("Fattoria Da Nonna"), "fattoria-da-nonna@lep.com");

		let mut manual = SeedConfig::default();
		manual.auth.auto_email = false;
		assert_eq!(manual.primary_email("Fattoria"), "pablo@lep.com");
	}
}
