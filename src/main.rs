use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod client;
mod config;
mod core;
mod logging;
mod seed;
mod smoke;

use config::{DEFAULT_CONFIG_FILE, SeedOverrides};
use seed::{SeedOpts, run_seed};
use smoke::{SmokeOpts, run_smoke};

#[derive(Parser, Debug)]
#[command(version, about = "Seed and smoke-test the LEP restaurant backend")]
pub struct Cli {
	/// Increase output
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Populate an organization from JSON seed files
	Seed {
		/// Backend base URL
		#[arg(long)]
		url: Option<String>,

		/// Seed file or directory of *.json files (repeatable)
		#[arg(long = "file")]
		files: Vec<PathBuf>,

		/// Organization name to create or log into
		#[arg(long)]
		org: Option<String>,

		/// Request timeout in seconds
		#[arg(long)]
		timeout: Option<u64>,

		#[arg(long, default_value = DEFAULT_CONFIG_FILE)]
		config: PathBuf,

		#[arg(long)]
		json_out: Option<PathBuf>,
	},
	/// Walk the backend API with the fixed test account
	Smoke {
		#[arg(long)]
		json_out: Option<PathBuf>,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Cli::parse();

	match args.command {
		Commands::Seed {
			url,
			files,
			org,
			timeout,
			config,
			json_out,
		} => {
			run_seed(SeedOpts {
				files,
				config,
				json_out,
				overrides: SeedOverrides {
					url,
					organization: org,
					timeout_secs: timeout,
					verbose: args.verbose,
				},
			})
			.await?;
		}
		Commands::Smoke { json_out } => {
			logging::init(if args.verbose { "debug" } else { "info" });
			run_smoke(SmokeOpts { json_out }).await?;
		}
	}

	Ok(())
}
