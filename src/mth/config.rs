// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: mthasher
// File: config.rs
// Author: mthasher maintainers

use crate::mth::error::ConfigError;
use crate::mth::parallel::DEFAULT_QUEUE_CAPACITY;
use crate::mth::source::DEFAULT_BLOCK_SIZE;
use std::fmt;
use strum::EnumIter;

#[derive(
	clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter,
)]
pub enum EngineMode {
	/// One worker thread per algorithm.
	#[default]
	Parallel,
	/// All algorithms on the reading thread.
	Sequential,
}

impl fmt::Display for EngineMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Parallel => "parallel",
			Self::Sequential => "sequential",
		})
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
	pub mode: EngineMode,
	/// Largest chunk handed to the hash states, in bytes.
	pub block_size: usize,
	/// Chunks each parallel worker may have queued before the reader
	/// blocks. Peak buffering is about
	/// `queue_capacity * block_size * algorithms`.
	pub queue_capacity: usize,
}

impl Default for EngineConfig {
	fn default() -> Self {
		EngineConfig {
			mode: EngineMode::Parallel,
			block_size: DEFAULT_BLOCK_SIZE,
			queue_capacity: DEFAULT_QUEUE_CAPACITY,
		}
	}
}

impl EngineConfig {
	pub fn sequential() -> Self {
		EngineConfig {
			mode: EngineMode::Sequential,
			..Self::default()
		}
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.block_size == 0 {
			return Err(ConfigError::ZeroBlockSize);
		}
		if self.queue_capacity == 0 {
			return Err(ConfigError::ZeroQueueCapacity);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use strum::IntoEnumIterator;

	#[test]
	fn defaults_match_documented_values() {
		let config = EngineConfig::default();
		assert_eq!(config.mode, EngineMode::Parallel);
		assert_eq!(config.block_size, 1_048_576);
		assert_eq!(config.queue_capacity, 10);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn zero_block_size_is_rejected() {
		let config = EngineConfig {
			block_size: 0,
			..EngineConfig::default()
		};
		assert_eq!(config.validate(), Err(ConfigError::ZeroBlockSize));
	}

	#[test]
	fn mode_names_round_trip_through_clap() {
		use clap::ValueEnum;
		for mode in EngineMode::iter() {
			let parsed = EngineMode::from_str(&mode.to_string(), false)
				.expect("known mode");
			assert_eq!(parsed, mode);
		}
	}
}
