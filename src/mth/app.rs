// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: mthasher
// File: app.rs
// Author: mthasher maintainers

use crate::mth::config::{EngineConfig, EngineMode};
use crate::mth::driver::{BatchSummary, Driver};
use crate::mth::engine::{build_engine, DigestEngine};
use crate::mth::error::MthError;
use crate::mth::output::{OutputFormat, TableWriter};
use crate::mth::registry::{algorithms, Algorithm, AlgorithmSet};
use crate::mth::source::Input;
use crate::mth::telemetry;
use clap::error::ErrorKind;
use clap::{crate_name, Arg, ArgAction, ArgMatches};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

const HELP_TEMPLATE: &str = "{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

const ALGORITHM_HEADING: &str = "Available hash algorithms";

fn build_cli() -> clap::Command {
	let cli = clap::Command::new(crate_name!())
		.color(clap::ColorChoice::Never)
		.help_template(HELP_TEMPLATE)
		.bin_name(crate_name!())
		.version(clap::crate_version!())
		.about("Calculate one or more hashes for one or more files, one algorithm per thread")
		.arg(
			Arg::new("input")
				.short('i')
				.long("input")
				.value_name("FILES")
				.num_args(1..)
				.action(ArgAction::Append)
				.help("Input files instead of STDIN (STDIN is denoted with -)")
				.default_value("-"),
		)
		.arg(
			Arg::new("output")
				.short('o')
				.long("output")
				.value_name("FILE")
				.value_parser(clap::value_parser!(PathBuf))
				.help("Use output file instead of STDOUT"),
		)
		.arg(
			Arg::new("format")
				.short('f')
				.long("format")
				.value_parser(clap::value_parser!(OutputFormat))
				.help("Result table format")
				.default_value("tsv"),
		)
		.arg(
			Arg::new("mode")
				.long("mode")
				.value_parser(clap::value_parser!(EngineMode))
				.help("Hash algorithms in parallel threads or one after another")
				.default_value("parallel"),
		)
		.arg(
			Arg::new("block-size")
				.long("block-size")
				.value_name("BYTES")
				.value_parser(clap::value_parser!(usize))
				.help("Read block size")
				.default_value("1048576"),
		)
		.arg(
			Arg::new("queue-size")
				.long("queue-size")
				.value_name("BLOCKS")
				.value_parser(clap::value_parser!(usize))
				.help("Blocks queued per algorithm before reading pauses")
				.default_value("10"),
		)
		.arg(
			Arg::new("all")
				.long("all")
				.help("Use every available algorithm")
				.action(ArgAction::SetTrue)
				.help_heading(ALGORITHM_HEADING),
		)
		.arg(
			Arg::new("list")
				.long("list")
				.help("List available algorithms and exit")
				.action(ArgAction::SetTrue),
		)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.help("Increase log verbosity (repeatable)")
				.action(ArgAction::Count),
		)
		.arg(
			Arg::new("quiet")
				.short('q')
				.long("quiet")
				.help("Only log errors")
				.action(ArgAction::SetTrue)
				.conflicts_with("verbose"),
		);

	algorithms().fold(cli, |cli, algorithm| {
		cli.arg(
			// Append keeps the index of every occurrence, so a repeated
			// flag is accepted and still ordered by its first appearance.
			Arg::new(algorithm.as_str())
				.long(algorithm.as_str())
				.help(format!("{} hash algorithm", algorithm.display_name()))
				.num_args(0)
				.default_missing_value("true")
				.value_parser(clap::value_parser!(bool))
				.action(ArgAction::Append)
				.help_heading(ALGORITHM_HEADING),
		)
	})
}

/// Algorithms in the order their flags appeared on the command line.
fn selected_algorithms(matches: &ArgMatches) -> Vec<Algorithm> {
	if matches.get_flag("all") {
		return algorithms().collect();
	}
	let mut picked: Vec<(usize, Algorithm)> = algorithms()
		.filter_map(|alg| {
			matches
				.indices_of(alg.as_str())
				.and_then(|mut indices| indices.next())
				.map(|index| (index, alg))
		})
		.collect();
	picked.sort_by_key(|(index, _)| *index);
	picked.into_iter().map(|(_, alg)| alg).collect()
}

fn engine_config(matches: &ArgMatches) -> EngineConfig {
	let defaults = EngineConfig::default();
	EngineConfig {
		mode: matches
			.get_one::<EngineMode>("mode")
			.copied()
			.unwrap_or(defaults.mode),
		block_size: matches
			.get_one::<usize>("block-size")
			.copied()
			.unwrap_or(defaults.block_size),
		queue_capacity: matches
			.get_one::<usize>("queue-size")
			.copied()
			.unwrap_or(defaults.queue_capacity),
	}
}

fn collect_inputs(matches: &ArgMatches) -> Vec<Input<'static>> {
	match matches.get_many::<String>("input") {
		Some(values) => values.map(|arg| Input::from_arg(arg)).collect(),
		None => vec![Input::Stdin],
	}
}

/// Hashes `inputs` and writes the table to `out`, diagnostics to stderr.
pub fn write_batch<W: Write>(
	engine: &dyn DigestEngine,
	inputs: Vec<Input<'_>>,
	format: OutputFormat,
	out: W,
) -> Result<BatchSummary, MthError> {
	let mut writer =
		TableWriter::new(format, BufWriter::new(out), io::stderr());
	let summary = Driver::new(engine).run(inputs, &mut writer)?;
	writer.finish()?.flush()?;
	Ok(summary)
}

fn print_algorithms() {
	for algorithm in algorithms() {
		println!("{}\t{}", algorithm, algorithm.display_name());
	}
}

pub fn run() -> Result<(), Box<dyn Error>> {
	let mut cli = build_cli();
	let matches = cli.get_matches_mut();
	telemetry::init(matches.get_count("verbose"), matches.get_flag("quiet"));

	if matches.get_flag("list") {
		print_algorithms();
		return Ok(());
	}

	let selected = selected_algorithms(&matches);
	if selected.is_empty() {
		cli.error(
			ErrorKind::MissingRequiredArgument,
			"missing digest: select at least one algorithm (e.g. --sha256) or --all",
		)
		.exit();
	}
	let algorithms =
		AlgorithmSet::new(selected).map_err(MthError::from)?;
	let config = engine_config(&matches);
	let engine = build_engine(algorithms, &config).map_err(MthError::from)?;
	let format = matches
		.get_one::<OutputFormat>("format")
		.copied()
		.unwrap_or_default();
	let inputs = collect_inputs(&matches);
	info!(
		mode = %config.mode,
		format = format.canonical_name(),
		inputs = inputs.len(),
		"hashing"
	);

	let summary = match matches.get_one::<PathBuf>("output") {
		Some(path) => {
			write_batch(engine.as_ref(), inputs, format, File::create(path)?)?
		}
		None => {
			write_batch(engine.as_ref(), inputs, format, io::stdout().lock())?
		}
	};
	info!(
		rows = summary.rows,
		failures = summary.failures,
		"done"
	);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(args: &[&str]) -> ArgMatches {
		build_cli()
			.try_get_matches_from(
				std::iter::once("mthasher").chain(args.iter().copied()),
			)
			.expect("arguments parse")
	}

	#[test]
	fn cli_definition_is_consistent() {
		build_cli().debug_assert();
	}

	#[test]
	fn flag_order_is_caller_order() {
		let matches = parse(&["--sha512", "--md5", "--blake2b"]);
		assert_eq!(
			selected_algorithms(&matches),
			vec![Algorithm::Sha512, Algorithm::Md5, Algorithm::Blake2b]
		);
	}

	#[test]
	fn repeated_flag_keeps_first_position() {
		let matches = parse(&["--md5", "--sha1", "--md5", "--sha1"]);
		assert_eq!(
			selected_algorithms(&matches),
			vec![Algorithm::Md5, Algorithm::Sha1]
		);
		let matches = parse(&["--sha256", "-i", "a", "b", "--md5", "--sha256"]);
		assert_eq!(
			selected_algorithms(&matches),
			vec![Algorithm::Sha256, Algorithm::Md5]
		);
	}

	#[test]
	fn all_selects_the_registry() {
		let matches = parse(&["--all"]);
		assert_eq!(selected_algorithms(&matches).len(), 12);
	}

	#[test]
	fn inputs_default_to_stdin() {
		let matches = parse(&["--md5"]);
		let inputs = collect_inputs(&matches);
		assert_eq!(inputs.len(), 1);
		assert!(matches!(inputs[0], Input::Stdin));
	}

	#[test]
	fn engine_options_are_read() {
		let matches = parse(&[
			"--md5",
			"--mode",
			"sequential",
			"--block-size",
			"4096",
			"--queue-size",
			"3",
		]);
		let config = engine_config(&matches);
		assert_eq!(config.mode, EngineMode::Sequential);
		assert_eq!(config.block_size, 4096);
		assert_eq!(config.queue_capacity, 3);
	}
}
