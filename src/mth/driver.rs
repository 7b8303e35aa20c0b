// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: mthasher
// File: driver.rs
// Author: mthasher maintainers

//! Runs an engine over a list of inputs. A failing input costs its own
//! row and nothing else.

use crate::mth::engine::{DigestEngine, DigestResult, Header};
use crate::mth::error::HashError;
use crate::mth::source::Input;
use serde::Serialize;
use std::io;
use tracing::debug;

/// One successfully hashed input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResultRow {
	pub input: String,
	pub digests: DigestResult,
}

/// Receives the header, the rows and the per-input failures of a batch.
///
/// Errors returned here are output failures and abort the batch.
pub trait BatchSink {
	fn header(&mut self, header: &Header) -> io::Result<()>;
	fn row(&mut self, row: ResultRow) -> io::Result<()>;
	fn failure(&mut self, error: HashError) -> io::Result<()>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
	pub rows: usize,
	pub failures: usize,
}

/// In-memory [`BatchSink`].
#[derive(Debug, Default)]
pub struct BatchReport {
	pub header: Option<Header>,
	pub rows: Vec<ResultRow>,
	pub failures: Vec<HashError>,
}

impl BatchSink for BatchReport {
	fn header(&mut self, header: &Header) -> io::Result<()> {
		self.header = Some(header.clone());
		Ok(())
	}

	fn row(&mut self, row: ResultRow) -> io::Result<()> {
		self.rows.push(row);
		Ok(())
	}

	fn failure(&mut self, error: HashError) -> io::Result<()> {
		self.failures.push(error);
		Ok(())
	}
}

pub struct Driver<'e> {
	engine: &'e dyn DigestEngine,
}

impl<'e> Driver<'e> {
	pub fn new(engine: &'e dyn DigestEngine) -> Self {
		Self { engine }
	}

	/// Emits the header, then one row or one failure per input, in order.
	pub fn run<'i, I, S>(
		&self,
		inputs: I,
		sink: &mut S,
	) -> io::Result<BatchSummary>
	where
		I: IntoIterator<Item = Input<'i>>,
		S: BatchSink + ?Sized,
	{
		sink.header(self.engine.header())?;
		let mut summary = BatchSummary::default();
		for mut input in inputs {
			match self.engine.hash_input(&mut input) {
				Ok(digests) => {
					summary.rows += 1;
					sink.row(ResultRow {
						input: input.name().into_owned(),
						digests,
					})?;
				}
				Err(err) => {
					summary.failures += 1;
					debug!(input = err.input(), error = %err, "skipping input");
					sink.failure(err)?;
				}
			}
		}
		debug!(
			rows = summary.rows,
			failures = summary.failures,
			"batch finished"
		);
		Ok(summary)
	}

	/// Runs the batch into a [`BatchReport`].
	pub fn collect<'i, I>(&self, inputs: I) -> BatchReport
	where
		I: IntoIterator<Item = Input<'i>>,
	{
		let mut report = BatchReport::default();
		// BatchReport never fails to accept output.
		let _ = self.run(inputs, &mut report);
		report
	}
}
