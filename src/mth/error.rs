// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: mthasher
// File: error.rs
// Author: mthasher maintainers

use std::io;
use thiserror::Error;

/// Rejected algorithm selection. Raised once, when an engine is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlgorithmError {
	#[error("unsupported algorithm `{0}`")]
	Unknown(String),
	#[error("algorithm `{0}` was requested more than once")]
	Duplicate(String),
	#[error("no digest algorithm selected")]
	Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
	#[error("block size must be greater than zero")]
	ZeroBlockSize,
	#[error("queue capacity must be greater than zero")]
	ZeroQueueCapacity,
}

/// Failure to produce a digest for a single input. Never fatal to a batch.
#[derive(Debug, Error)]
pub enum HashError {
	#[error("{input}: {source}")]
	Io { input: String, source: io::Error },
	#[error("{input}: {algorithm} worker failed: {message}")]
	WorkerFault {
		input: String,
		algorithm: &'static str,
		message: String,
	},
}

impl HashError {
	pub fn io(input: impl Into<String>, source: io::Error) -> Self {
		Self::Io {
			input: input.into(),
			source,
		}
	}

	pub fn input(&self) -> &str {
		match self {
			Self::Io { input, .. } | Self::WorkerFault { input, .. } => {
				input
			}
		}
	}

	pub fn is_io(&self) -> bool {
		matches!(self, Self::Io { .. })
	}
}

#[derive(Debug, Error)]
pub enum MthError {
	#[error("invalid algorithm selection: {0}")]
	InvalidAlgorithm(#[from] AlgorithmError),
	#[error("invalid configuration: {0}")]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Io(#[from] io::Error),
}
