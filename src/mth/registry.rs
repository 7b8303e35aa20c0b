// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: mthasher
// File: registry.rs
// Author: mthasher maintainers

//! The closed set of supported digest algorithms and the validated,
//! caller-ordered selections built from it.

use crate::mth::error::AlgorithmError;
use digest::Digest;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, IntoEnumIterator};

/// A running hash state fed one chunk at a time.
pub trait DigestExecutor: Send + 'static {
	fn update(&mut self, data: &[u8]);
	fn finalize(self: Box<Self>) -> Vec<u8>;
}

/// Adapts any fixed-output RustCrypto hasher to [`DigestExecutor`].
pub struct Accumulator<D>(D);

impl<D> Accumulator<D>
where
	D: Digest + Send + 'static,
{
	pub fn new() -> Self {
		Self(D::new())
	}
}

impl<D> Default for Accumulator<D>
where
	D: Digest + Send + 'static,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<D> DigestExecutor for Accumulator<D>
where
	D: Digest + Send + 'static,
{
	fn update(&mut self, data: &[u8]) {
		Digest::update(&mut self.0, data);
	}

	fn finalize(self: Box<Self>) -> Vec<u8> {
		self.0.finalize().to_vec()
	}
}

// Variants are declared in lexical order of their identifiers so the
// derived ordering matches string ordering.
#[derive(
	Clone,
	Copy,
	Debug,
	PartialEq,
	Eq,
	PartialOrd,
	Ord,
	Hash,
	EnumIter,
)]
pub enum Algorithm {
	Blake2b,
	Blake2s,
	Md5,
	Sha1,
	Sha224,
	Sha256,
	Sha384,
	Sha3_224,
	Sha3_256,
	Sha3_384,
	Sha3_512,
	Sha512,
}

impl Algorithm {
	/// Canonical lowercase identifier, as used in headers and CLI flags.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Blake2b => "blake2b",
			Self::Blake2s => "blake2s",
			Self::Md5 => "md5",
			Self::Sha1 => "sha1",
			Self::Sha224 => "sha224",
			Self::Sha256 => "sha256",
			Self::Sha384 => "sha384",
			Self::Sha3_224 => "sha3_224",
			Self::Sha3_256 => "sha3_256",
			Self::Sha3_384 => "sha3_384",
			Self::Sha3_512 => "sha3_512",
			Self::Sha512 => "sha512",
		}
	}

	pub const fn display_name(self) -> &'static str {
		match self {
			Self::Blake2b => "BLAKE2b-512",
			Self::Blake2s => "BLAKE2s-256",
			Self::Md5 => "MD5",
			Self::Sha1 => "SHA-1",
			Self::Sha224 => "SHA-224",
			Self::Sha256 => "SHA-256",
			Self::Sha384 => "SHA-384",
			Self::Sha3_224 => "SHA3-224",
			Self::Sha3_256 => "SHA3-256",
			Self::Sha3_384 => "SHA3-384",
			Self::Sha3_512 => "SHA3-512",
			Self::Sha512 => "SHA-512",
		}
	}

	/// Digest length in bytes.
	pub const fn output_size(self) -> usize {
		match self {
			Self::Md5 => 16,
			Self::Sha1 => 20,
			Self::Sha224 | Self::Sha3_224 => 28,
			Self::Blake2s | Self::Sha256 | Self::Sha3_256 => 32,
			Self::Sha384 | Self::Sha3_384 => 48,
			Self::Blake2b | Self::Sha512 | Self::Sha3_512 => 64,
		}
	}

	/// Fresh hash state for this algorithm.
	pub fn executor(self) -> Box<dyn DigestExecutor> {
		match self {
			Self::Blake2b => {
				Box::new(Accumulator::<blake2::Blake2b512>::new())
			}
			Self::Blake2s => {
				Box::new(Accumulator::<blake2::Blake2s256>::new())
			}
			Self::Md5 => Box::new(Accumulator::<md5::Md5>::new()),
			Self::Sha1 => Box::new(Accumulator::<sha1::Sha1>::new()),
			Self::Sha224 => {
				Box::new(Accumulator::<sha2::Sha224>::new())
			}
			Self::Sha256 => {
				Box::new(Accumulator::<sha2::Sha256>::new())
			}
			Self::Sha384 => {
				Box::new(Accumulator::<sha2::Sha384>::new())
			}
			Self::Sha3_224 => {
				Box::new(Accumulator::<sha3::Sha3_224>::new())
			}
			Self::Sha3_256 => {
				Box::new(Accumulator::<sha3::Sha3_256>::new())
			}
			Self::Sha3_384 => {
				Box::new(Accumulator::<sha3::Sha3_384>::new())
			}
			Self::Sha3_512 => {
				Box::new(Accumulator::<sha3::Sha3_512>::new())
			}
			Self::Sha512 => {
				Box::new(Accumulator::<sha2::Sha512>::new())
			}
		}
	}
}

impl fmt::Display for Algorithm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Algorithm {
	type Err = AlgorithmError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		find_algorithm(s)
			.ok_or_else(|| AlgorithmError::Unknown(s.to_owned()))
	}
}

/// Every supported algorithm, in canonical order.
pub fn algorithms() -> impl Iterator<Item = Algorithm> {
	Algorithm::iter()
}

pub fn find_algorithm(identifier: &str) -> Option<Algorithm> {
	algorithms()
		.find(|alg| alg.as_str().eq_ignore_ascii_case(identifier))
}

/// A non-empty, duplicate-free selection of algorithms in caller order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlgorithmSet {
	algorithms: Vec<Algorithm>,
}

impl AlgorithmSet {
	pub fn new(
		algorithms: Vec<Algorithm>,
	) -> Result<Self, AlgorithmError> {
		if algorithms.is_empty() {
			return Err(AlgorithmError::Empty);
		}
		let mut seen = HashSet::with_capacity(algorithms.len());
		for algorithm in &algorithms {
			if !seen.insert(*algorithm) {
				return Err(AlgorithmError::Duplicate(
					algorithm.as_str().to_owned(),
				));
			}
		}
		Ok(Self { algorithms })
	}

	/// Resolves and validates identifiers such as `["sha256", "md5"]`.
	pub fn parse<I, S>(identifiers: I) -> Result<Self, AlgorithmError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let algorithms = identifiers
			.into_iter()
			.map(|id| id.as_ref().parse())
			.collect::<Result<Vec<Algorithm>, _>>()?;
		Self::new(algorithms)
	}

	/// The whole registry, in canonical order.
	pub fn all() -> Self {
		Self {
			algorithms: algorithms().collect(),
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = Algorithm> + '_ {
		self.algorithms.iter().copied()
	}

	pub fn as_slice(&self) -> &[Algorithm] {
		&self.algorithms
	}

	pub fn len(&self) -> usize {
		self.algorithms.len()
	}

	pub fn is_empty(&self) -> bool {
		self.algorithms.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn registry_is_sorted_and_excludes_xof() {
		let names: Vec<&str> =
			algorithms().map(Algorithm::as_str).collect();
		let mut sorted = names.clone();
		sorted.sort_unstable();
		assert_eq!(names, sorted);
		assert_eq!(names.len(), 12);
		assert!(!names.iter().any(|name| name.starts_with("shake")));
	}

	#[test]
	fn derived_order_matches_identifier_order() {
		let mut by_enum: Vec<Algorithm> = algorithms().collect();
		by_enum.reverse();
		by_enum.sort();
		let mut by_name: Vec<Algorithm> = algorithms().collect();
		by_name.sort_by_key(|alg| alg.as_str());
		assert_eq!(by_enum, by_name);
	}

	#[test]
	fn lookup_ignores_ascii_case() {
		assert_eq!(find_algorithm("SHA3_256"), Some(Algorithm::Sha3_256));
		assert_eq!("Md5".parse::<Algorithm>(), Ok(Algorithm::Md5));
		assert_eq!(find_algorithm("shake_128"), None);
	}

	#[test]
	fn output_size_matches_executor() {
		for algorithm in algorithms() {
			let digest = algorithm.executor().finalize();
			assert_eq!(
				digest.len(),
				algorithm.output_size(),
				"{algorithm}"
			);
		}
	}

	#[test]
	fn set_keeps_caller_order() {
		let set = AlgorithmSet::parse(["sha512", "md5", "blake2s"])
			.expect("valid selection");
		assert_eq!(
			set.as_slice(),
			&[Algorithm::Sha512, Algorithm::Md5, Algorithm::Blake2s]
		);
	}

	#[test]
	fn set_rejects_unknown_duplicate_and_empty() {
		assert_eq!(
			AlgorithmSet::parse(["sha256", "whirlpool"]),
			Err(AlgorithmError::Unknown("whirlpool".into()))
		);
		assert_eq!(
			AlgorithmSet::parse(["sha256", "md5", "SHA256"]),
			Err(AlgorithmError::Duplicate("sha256".into()))
		);
		assert_eq!(
			AlgorithmSet::parse(Vec::<&str>::new()),
			Err(AlgorithmError::Empty)
		);
	}

	#[test]
	fn every_single_algorithm_and_the_full_registry_validate() {
		for algorithm in algorithms() {
			assert!(AlgorithmSet::new(vec![algorithm]).is_ok());
		}
		let all: Vec<Algorithm> = algorithms().collect();
		assert_eq!(AlgorithmSet::new(all), Ok(AlgorithmSet::all()));
	}
}
