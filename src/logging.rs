use std::env;

pub const LOG_ENV: &str = "LEPKIT_LOG";

/// `LEPKIT_LOG` wins over the level resolved from flags and config.
/// A subscriber installed earlier stays in place.
pub fn init(level: &str) {
	let filter = env::var(LOG_ENV).unwrap_or_else(|_| filter_for(level));
	let installed = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.try_init();
	if let Err(err) = installed {
		tracing::debug!("keeping the existing log subscriber: {err}");
	}
}

fn filter_for(level: &str) -> String {
	match level.trim().to_ascii_lowercase().as_str() {
		"debug" | "verbose" => "lepkit=debug,info".to_string(),
		"trace" => "lepkit=trace,info".to_string(),
		"warn" | "warning" => "warn".to_string(),
		"error" => "error".to_string(),
		_ => "info".to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn maps_config_levels_to_filters() {
		assert_eq!(filter_for("DEBUG"), "lepkit=debug,info");
		assert_eq!(filter_for("verbose"), "lepkit=debug,info");
		assert_eq!(filter_for("warning"), "warn");
		assert_eq!(filter_for(""), "info");
	}

	#[test]
	fn repeated_init_does_not_panic() {
		init("debug");
		init("error");
	}
}
