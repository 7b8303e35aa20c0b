// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: mthasher
// File: main.rs
// Author: mthasher maintainers

use colored::Colorize;
use mthasher::mth::app;
use std::process::ExitCode;

fn main() -> ExitCode {
	match app::run() {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("{} {}", "error:".red().bold(), err);
			ExitCode::FAILURE
		}
	}
}
