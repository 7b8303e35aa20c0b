// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: mthasher
// File: lib.rs
// Author: mthasher maintainers

pub mod mth {
	pub mod app;
	pub mod config;
	pub mod driver;
	pub mod engine;
	pub mod error;
	pub mod output;
	pub mod parallel;
	pub mod registry;
	pub mod source;
	pub mod telemetry;
}

pub use mth::config::{EngineConfig, EngineMode};
pub use mth::driver::{BatchReport, BatchSink, BatchSummary, Driver, ResultRow};
pub use mth::engine::{
	build_engine, DigestEngine, DigestResult, Header, SequentialEngine,
};
pub use mth::error::{AlgorithmError, ConfigError, HashError, MthError};
pub use mth::parallel::ParallelEngine;
pub use mth::registry::{Algorithm, AlgorithmSet};
pub use mth::source::{BlockSource, Input};

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	const PHRASE: &str =
		"Jeder wackere Bayer vertilgt bequem zwo Pfund Kalbshaxen.";

	fn digest_of(algorithm: &str, data: &[u8]) -> String {
		let engine = ParallelEngine::with_algorithms([algorithm])
			.expect("known algorithm");
		let mut reader = Cursor::new(data.to_vec());
		engine
			.hash_input(&mut Input::stream("vector", &mut reader))
			.expect("hash")
			.into_inner()
			.remove(0)
	}

	#[test]
	fn test_md5_empty() {
		assert_eq!(
			digest_of("md5", b""),
			"d41d8cd98f00b204e9800998ecf8427e"
		);
	}

	#[test]
	fn test_sha1_empty() {
		assert_eq!(
			digest_of("sha1", b""),
			"da39a3ee5e6b4b0d3255bfef95601890afd80709"
		);
	}

	#[test]
	fn test_sha256_abc() {
		assert_eq!(
			digest_of("sha256", b"abc"),
			"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
		);
	}

	#[test]
	fn test_sha512_empty() {
		assert_eq!(
			digest_of("sha512", b""),
			"cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
		);
	}

	#[test]
	fn test_sha3_256_empty() {
		assert_eq!(
			digest_of("sha3_256", b""),
			"a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
		);
	}

	#[test]
	fn test_blake2b_phrase() {
		assert_eq!(
			digest_of("blake2b", PHRASE.as_bytes()),
			"95b7ecb0d7de59820205a0a94fe3ca5ee36fd296b1a9ecaa4e01634aed9fa9505d70182c12f900b9dd95f1d5c04fe57dbc5b1e48acdf3a8bae2996f5d8f4578a"
		);
	}

	#[test]
	fn test_blake2s_phrase() {
		assert_eq!(
			digest_of("blake2s", PHRASE.as_bytes()),
			"dbfd3f2c835adcc9fc955d812384bb3bf569de0b9613ffca0e723254c05cf497"
		);
	}

	#[test]
	fn test_sha1_phrase() {
		assert_eq!(
			digest_of("sha1", PHRASE.as_bytes()),
			"1c90817fe5067ab226a331d4e7454858f6dd966a"
		);
	}
}
