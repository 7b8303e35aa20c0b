// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: mthasher
// File: telemetry.rs
// Author: mthasher maintainers

//! Log subscriber setup. Logs go to stderr; result rows never do.

use std::io;
use std::sync::Once;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

/// Level selected by `-q` / `-v` when `RUST_LOG` is unset.
pub fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
	if quiet {
		return LevelFilter::ERROR;
	}
	match verbosity {
		0 => LevelFilter::WARN,
		1 => LevelFilter::INFO,
		2 => LevelFilter::DEBUG,
		_ => LevelFilter::TRACE,
	}
}

/// Installs the global subscriber once. `RUST_LOG` takes precedence
/// over the command-line verbosity.
pub fn init(verbosity: u8, quiet: bool) {
	static ONCE: Once = Once::new();

	ONCE.call_once(|| {
		let fallback =
			Targets::new().with_default(level_for(verbosity, quiet));
		let targets = match std::env::var("RUST_LOG") {
			Ok(var) => var.parse().unwrap_or(fallback),
			Err(_) => fallback,
		};
		let _ = tracing_subscriber::fmt()
			.with_writer(io::stderr)
			.with_ansi(false)
			.with_target(false)
			.with_thread_names(true)
			.with_max_level(LevelFilter::TRACE)
			.finish()
			.with(targets)
			.try_init();
	});
}
