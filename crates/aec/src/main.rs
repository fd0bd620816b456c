//! `aec`, the action extension compiler.
//!
//! Loads one action manifest into a fresh action system, optionally applies
//! saved user customization, and prints the registered actions and the
//! resolved domain layouts as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use appcore_actions::{ActionSystem, LoadOptions, MemorySettings};
use clap::Parser;
use tracing::{debug, info};

mod report;

/// Action extension compiler command line arguments.
#[derive(Parser, Debug)]
#[command(name = "aec", version)]
#[command(about = "Action extension compiler: resolve an action manifest and print it as JSON")]
struct Args {
	/// Manifest file to read from
	#[arg(value_name = "FILE")]
	file: PathBuf,

	/// Write output to a file rather than stdout
	#[arg(short, long, value_name = "FILE")]
	output: Option<PathBuf>,

	/// Extension identifier, defaults to the file name without extension
	#[arg(short, long, value_name = "ID")]
	identifier: Option<String>,

	/// Define a variable for `${NAME}` references
	#[arg(short = 'D', value_name = "NAME[=VALUE]", value_parser = parse_define)]
	define: Vec<(String, String)>,

	/// Settings file (JSON object of store keys) with saved customization
	#[arg(long, value_name = "FILE")]
	settings: Option<PathBuf>,

	/// Print layouts with saved customization applied
	#[arg(long)]
	cached: bool,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	setup_tracing(args.verbose);
	run(&args)
}

fn run(args: &Args) -> anyhow::Result<()> {
	let mut options = LoadOptions::default();
	for (name, value) in &args.define {
		options = options.with_variable(name, value);
	}

	let mut system = ActionSystem::new();
	system
		.load_manifest_file(&args.file, &options)
		.with_context(|| format!("failed to load manifest {}", args.file.display()))?;

	if let Some(path) = &args.settings {
		let settings = read_settings(path)?;
		system.read_settings(&settings);
	}

	let identifier = match &args.identifier {
		Some(id) => id.clone(),
		None => default_identifier(&args.file)?,
	};
	let report = report::build(&system, &identifier, args.cached);
	let mut json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
	json.push('\n');

	match &args.output {
		Some(path) => {
			fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
			info!(path = %path.display(), "report written");
		}
		None => print!("{json}"),
	}
	Ok(())
}

/// Parses `NAME[=VALUE]`. A bare name defines itself.
fn parse_define(arg: &str) -> anyhow::Result<(String, String)> {
	let (name, value) = arg.split_once('=').unwrap_or((arg, arg));
	if name.is_empty() {
		bail!("missing variable name in '{arg}'");
	}
	Ok((name.to_string(), value.to_string()))
}

fn default_identifier(file: &Path) -> anyhow::Result<String> {
	file.file_stem()
		.map(|stem| stem.to_string_lossy().into_owned())
		.with_context(|| format!("cannot derive an identifier from {}", file.display()))
}

fn read_settings(path: &Path) -> anyhow::Result<MemorySettings> {
	let text = fs::read_to_string(path).with_context(|| format!("failed to read settings {}", path.display()))?;
	let value: serde_json::Value =
		serde_json::from_str(&text).with_context(|| format!("invalid settings JSON in {}", path.display()))?;
	let Some(entries) = value.as_object() else {
		bail!("settings file {} is not a JSON object", path.display());
	};
	debug!(keys = entries.len(), "settings file read");
	Ok(entries
		.iter()
		.fold(MemorySettings::new(), |store, (key, value)| store.with(key.clone(), value.clone())))
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("appcore=trace,debug")
		} else {
			EnvFilter::new("warn")
		}
	});
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}
