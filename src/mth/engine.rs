// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: mthasher
// File: engine.rs
// Author: mthasher maintainers

//! Engine contract shared by the sequential and parallel hashers, plus the
//! single-threaded baseline.

use crate::mth::config::{EngineConfig, EngineMode};
use crate::mth::error::{AlgorithmError, ConfigError, HashError};
use crate::mth::parallel::{panic_message, ParallelEngine};
use crate::mth::registry::{Algorithm, AlgorithmSet, DigestExecutor};
use crate::mth::source::{BlockSource, Input};
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// First column of every header.
pub const FILENAME_COLUMN: &str = "filename";

/// `filename` followed by the requested algorithms in caller order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
	algorithms: Vec<Algorithm>,
}

impl Header {
	pub fn new(algorithms: &AlgorithmSet) -> Self {
		Self {
			algorithms: algorithms.as_slice().to_vec(),
		}
	}

	pub fn columns(&self) -> Vec<&'static str> {
		std::iter::once(FILENAME_COLUMN)
			.chain(self.algorithms.iter().map(|alg| alg.as_str()))
			.collect()
	}

	pub fn algorithms(&self) -> &[Algorithm] {
		&self.algorithms
	}
}

/// Hex digests positionally aligned with [`Header::algorithms`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DigestResult(Vec<String>);

impl DigestResult {
	pub fn from_digests<I>(digests: I) -> Self
	where
		I: IntoIterator<Item = Vec<u8>>,
	{
		Self(digests.into_iter().map(hex::encode).collect())
	}

	pub fn as_slice(&self) -> &[String] {
		&self.0
	}

	pub fn get(&self, index: usize) -> Option<&str> {
		self.0.get(index).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn into_inner(self) -> Vec<String> {
		self.0
	}
}

pub trait DigestEngine: Send + Sync {
	fn algorithms(&self) -> &AlgorithmSet;

	fn header(&self) -> &Header;

	/// Reads `input` to the end and digests it with every algorithm.
	fn hash_input(
		&self,
		input: &mut Input<'_>,
	) -> Result<DigestResult, HashError>;

	/// Index of `algorithm` within a [`DigestResult`], if requested.
	fn position(&self, algorithm: Algorithm) -> Option<usize> {
		self.algorithms().iter().position(|alg| alg == algorithm)
	}
}

/// Opens `input`, mapping a failure to [`HashError::Io`].
pub(crate) fn open_source<'a>(
	input: &'a mut Input<'_>,
	block_size: usize,
) -> Result<(String, BlockSource<'a>), HashError> {
	let name = input.name().into_owned();
	match BlockSource::open(input, block_size) {
		Ok(source) => Ok((name, source)),
		Err(err) => Err(HashError::io(name, err)),
	}
}

/// Applies each chunk of `source` to every executor in turn on the
/// calling thread and returns the raw digests in executor order.
///
/// A panicking executor fails this input with
/// [`HashError::WorkerFault`]; the caller's batch is unaffected.
pub(crate) fn digest_in_turn(
	input: &str,
	source: BlockSource<'_>,
	mut executors: Vec<(&'static str, Box<dyn DigestExecutor>)>,
) -> Result<Vec<Vec<u8>>, HashError> {
	let fault = |algorithm: &'static str, payload: Box<dyn Any + Send>| {
		HashError::WorkerFault {
			input: input.to_owned(),
			algorithm,
			message: panic_message(payload),
		}
	};
	for chunk in source {
		let chunk = chunk.map_err(|err| HashError::io(input, err))?;
		for (label, executor) in executors.iter_mut() {
			panic::catch_unwind(AssertUnwindSafe(|| executor.update(&chunk)))
				.map_err(|payload| fault(*label, payload))?;
		}
	}
	executors
		.into_iter()
		.map(|(label, executor)| {
			panic::catch_unwind(AssertUnwindSafe(move || executor.finalize()))
				.map_err(|payload| fault(label, payload))
		})
		.collect()
}

/// Feeds every chunk to every hash state in turn on the calling thread.
#[derive(Debug)]
pub struct SequentialEngine {
	algorithms: AlgorithmSet,
	header: Header,
	block_size: usize,
}

impl SequentialEngine {
	pub fn new(algorithms: AlgorithmSet, config: &EngineConfig) -> Self {
		Self {
			header: Header::new(&algorithms),
			algorithms,
			block_size: config.block_size,
		}
	}

	pub fn with_algorithms<I, S>(
		identifiers: I,
	) -> Result<Self, AlgorithmError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let algorithms = AlgorithmSet::parse(identifiers)?;
		Ok(Self::new(algorithms, &EngineConfig::default()))
	}

	/// Hashes an already opened source named `input`. State never
	/// outlives the call.
	pub fn hash_source(
		&self,
		input: &str,
		source: BlockSource<'_>,
	) -> Result<DigestResult, HashError> {
		let executors = self
			.algorithms
			.iter()
			.map(|alg: Algorithm| (alg.as_str(), alg.executor()))
			.collect();
		digest_in_turn(input, source, executors)
			.map(DigestResult::from_digests)
	}
}

impl DigestEngine for SequentialEngine {
	fn algorithms(&self) -> &AlgorithmSet {
		&self.algorithms
	}

	fn header(&self) -> &Header {
		&self.header
	}

	fn hash_input(
		&self,
		input: &mut Input<'_>,
	) -> Result<DigestResult, HashError> {
		let (name, source) = open_source(input, self.block_size)?;
		let digests = self.hash_source(&name, source)?;
		debug!(input = %name, "sequential digest complete");
		Ok(digests)
	}
}

/// Validates `config` and builds the engine it selects.
pub fn build_engine(
	algorithms: AlgorithmSet,
	config: &EngineConfig,
) -> Result<Box<dyn DigestEngine>, ConfigError> {
	config.validate()?;
	debug!(
		mode = %config.mode,
		algorithms = algorithms.len(),
		block_size = config.block_size,
		queue_capacity = config.queue_capacity,
		"building digest engine"
	);
	Ok(match config.mode {
		EngineMode::Parallel => {
			Box::new(ParallelEngine::new(algorithms, config))
		}
		EngineMode::Sequential => {
			Box::new(SequentialEngine::new(algorithms, config))
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::{self, Cursor, Read};

	struct Exploding;

	impl DigestExecutor for Exploding {
		fn update(&mut self, _data: &[u8]) {
			panic!("hash implementation blew up");
		}

		fn finalize(self: Box<Self>) -> Vec<u8> {
			Vec::new()
		}
	}

	struct Broken;

	impl Read for Broken {
		fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
			Err(io::Error::new(
				io::ErrorKind::PermissionDenied,
				"denied",
			))
		}
	}

	#[test]
	fn header_starts_with_filename() {
		let engine = SequentialEngine::with_algorithms(["sha1", "md5"])
			.expect("valid selection");
		assert_eq!(
			engine.header().columns(),
			vec!["filename", "sha1", "md5"]
		);
		assert_eq!(engine.position(Algorithm::Md5), Some(1));
		assert_eq!(engine.position(Algorithm::Sha256), None);
	}

	#[test]
	fn empty_input_digests() {
		let engine = SequentialEngine::with_algorithms(["md5", "sha256"])
			.expect("valid selection");
		let mut data = io::empty();
		let result = engine
			.hash_input(&mut Input::stream("empty", &mut data))
			.expect("hash");
		assert_eq!(
			result.as_slice(),
			&[
				"d41d8cd98f00b204e9800998ecf8427e",
				"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
			]
		);
	}

	#[test]
	fn repeated_calls_do_not_share_state() {
		let engine =
			SequentialEngine::with_algorithms(["sha1"]).expect("valid");
		let mut first = Cursor::new(b"abc".to_vec());
		let mut second = Cursor::new(b"abc".to_vec());
		let a = engine
			.hash_input(&mut Input::stream("a", &mut first))
			.expect("hash");
		let b = engine
			.hash_input(&mut Input::stream("b", &mut second))
			.expect("hash");
		assert_eq!(a, b);
		assert_eq!(
			a.get(0),
			Some("a9993e364706816aba3e25717850c26c9cd0d89d")
		);
	}

	#[test]
	fn read_failure_reports_input_name() {
		let engine =
			SequentialEngine::with_algorithms(["md5"]).expect("valid");
		let mut broken = Broken;
		let err = engine
			.hash_input(&mut Input::stream("tape0", &mut broken))
			.expect_err("read must fail");
		assert!(err.is_io());
		assert_eq!(err.input(), "tape0");
		assert_eq!(err.to_string(), "tape0: denied");
	}

	#[test]
	fn panicking_hash_fails_only_its_input() {
		let mut data = Cursor::new(vec![7u8; 32]);
		let source = BlockSource::from_reader(&mut data, 8);
		let executors: Vec<(&'static str, Box<dyn DigestExecutor>)> = vec![
			("md5", Algorithm::Md5.executor()),
			("exploding", Box::new(Exploding)),
		];
		let err = digest_in_turn("reel", source, executors)
			.expect_err("panic must surface as a fault");
		match err {
			HashError::WorkerFault {
				input,
				algorithm,
				message,
			} => {
				assert_eq!(input, "reel");
				assert_eq!(algorithm, "exploding");
				assert!(message.contains("blew up"));
			}
			other => panic!("unexpected error: {other}"),
		}

		// The same engine keeps working for the next input.
		let engine =
			SequentialEngine::with_algorithms(["md5"]).expect("valid");
		let mut next = Cursor::new(b"abc".to_vec());
		let digests = engine
			.hash_input(&mut Input::stream("next", &mut next))
			.expect("hash");
		assert_eq!(digests.get(0), Some("900150983cd24fb0d6963f7d28e17f72"));
	}

	#[test]
	fn build_engine_rejects_bad_config() {
		let config = EngineConfig {
			queue_capacity: 0,
			..EngineConfig::default()
		};
		let err = build_engine(AlgorithmSet::all(), &config)
			.err()
			.expect("zero capacity is invalid");
		assert_eq!(err, ConfigError::ZeroQueueCapacity);
	}
}
