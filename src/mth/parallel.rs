// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: mthasher
// File: parallel.rs
// Author: mthasher maintainers

//! Broadcast hashing: one worker thread per algorithm, each fed the same
//! chunks through its own bounded channel.
//!
//! Workers live for exactly one input. The reader sends every chunk to
//! every channel and blocks whenever a channel is full, so memory stays
//! near `capacity * block_size * algorithms`. An empty chunk is the
//! end-of-stream sentinel. It is sent to every worker on every exit path
//! (end of input, read error, worker fault, unwinding) before the workers
//! are joined.

use crate::mth::config::EngineConfig;
use crate::mth::engine::{
	open_source, DigestEngine, DigestResult, Header,
};
use crate::mth::error::{AlgorithmError, HashError};
use crate::mth::registry::{Algorithm, AlgorithmSet, DigestExecutor};
use crate::mth::source::{BlockSource, Input};
use bytes::Bytes;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::any::Any;
use std::io;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace};

/// Chunks buffered per worker before the reader blocks.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
	Idle,
	Running,
	Draining,
	Stopped,
}

pub(crate) fn chunk_channel(
	capacity: usize,
) -> (Sender<Bytes>, Receiver<Bytes>) {
	bounded(capacity)
}

/// Worker loop: apply chunks until the sentinel arrives.
fn consume(
	receiver: Receiver<Bytes>,
	mut executor: Box<dyn DigestExecutor>,
) -> Box<dyn DigestExecutor> {
	while let Ok(chunk) = receiver.recv() {
		if chunk.is_empty() {
			break;
		}
		executor.update(&chunk);
	}
	executor
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		(*message).to_owned()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"worker panicked".to_owned()
	}
}

/// Feeder-side handle on one worker thread.
struct Worker {
	label: &'static str,
	state: WorkerState,
	sender: Sender<Bytes>,
	handle: Option<JoinHandle<Box<dyn DigestExecutor>>>,
}

impl Worker {
	fn spawn(
		label: &'static str,
		executor: Box<dyn DigestExecutor>,
		capacity: usize,
	) -> io::Result<Self> {
		let (sender, receiver) = chunk_channel(capacity);
		let mut worker = Worker {
			label,
			state: WorkerState::Idle,
			sender,
			handle: None,
		};
		let handle = thread::Builder::new()
			.name(format!("mth-{label}"))
			.spawn(move || consume(receiver, executor))?;
		worker.handle = Some(handle);
		worker.state = WorkerState::Running;
		trace!(worker = label, "worker started");
		Ok(worker)
	}

	/// Blocks while the channel is full. Fails only if the worker is gone.
	fn feed(&self, chunk: &Bytes) -> bool {
		self.sender.send(chunk.clone()).is_ok()
	}

	fn signal_end(&mut self) {
		if self.state == WorkerState::Running {
			// A dead worker has dropped its receiver; nothing to signal.
			let _ = self.sender.send(Bytes::new());
			self.state = WorkerState::Draining;
		}
	}

	fn join(&mut self) -> Result<Box<dyn DigestExecutor>, String> {
		let handle = match self.handle.take() {
			Some(handle) => handle,
			None => return Err("worker already joined".to_owned()),
		};
		let joined = handle.join();
		self.state = WorkerState::Stopped;
		trace!(worker = self.label, "worker stopped");
		match joined {
			Ok(executor) => {
				debug_assert!(
					self.sender.is_empty(),
					"{} worker stopped with {} queued chunks",
					self.label,
					self.sender.len()
				);
				Ok(executor)
			}
			Err(payload) => Err(panic_message(payload)),
		}
	}

	#[cfg(test)]
	fn pending(&self) -> usize {
		self.sender.len()
	}
}

impl Drop for Worker {
	fn drop(&mut self) {
		if self.handle.is_some() {
			self.signal_end();
			let _ = self.join();
		}
	}
}

/// Runs one worker per executor over `source` and returns the raw
/// digests in executor order.
pub(crate) fn fan_out(
	input: &str,
	source: BlockSource<'_>,
	executors: Vec<(&'static str, Box<dyn DigestExecutor>)>,
	capacity: usize,
) -> Result<Vec<Vec<u8>>, HashError> {
	let mut workers = Vec::with_capacity(executors.len());
	for (label, executor) in executors {
		// Workers already started are shut down by `Drop` on early return.
		let worker =
			Worker::spawn(label, executor, capacity).map_err(|err| {
				HashError::WorkerFault {
					input: input.to_owned(),
					algorithm: label,
					message: format!("could not start worker: {err}"),
				}
			})?;
		workers.push(worker);
	}
	debug!(input, workers = workers.len(), "workers started");

	let mut read_error = None;
	let mut chunks = 0u64;
	'feed: for chunk in source {
		match chunk {
			Ok(chunk) => {
				chunks += 1;
				for worker in &workers {
					if !worker.feed(&chunk) {
						// The worker died; its join reports why.
						break 'feed;
					}
				}
			}
			Err(err) => {
				read_error = Some(err);
				break;
			}
		}
	}

	for worker in workers.iter_mut() {
		worker.signal_end();
	}
	let mut executors = Vec::with_capacity(workers.len());
	let mut fault = None;
	for worker in workers.iter_mut() {
		match worker.join() {
			Ok(executor) => executors.push(executor),
			Err(message) => {
				debug!(
					input,
					algorithm = worker.label,
					%message,
					"digest worker failed"
				);
				if fault.is_none() {
					fault = Some(HashError::WorkerFault {
						input: input.to_owned(),
						algorithm: worker.label,
						message,
					});
				}
			}
		}
	}
	trace!(input, chunks, "all workers joined");

	if let Some(fault) = fault {
		return Err(fault);
	}
	if let Some(err) = read_error {
		return Err(HashError::io(input, err));
	}
	Ok(executors
		.into_iter()
		.map(|executor| executor.finalize())
		.collect())
}

/// Hashes each input with one thread per algorithm.
#[derive(Debug)]
pub struct ParallelEngine {
	algorithms: AlgorithmSet,
	header: Header,
	block_size: usize,
	queue_capacity: usize,
}

impl ParallelEngine {
	pub fn new(algorithms: AlgorithmSet, config: &EngineConfig) -> Self {
		Self {
			header: Header::new(&algorithms),
			algorithms,
			block_size: config.block_size,
			queue_capacity: config.queue_capacity.max(1),
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
}

impl DigestEngine for ParallelEngine {
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
		let executors = self
			.algorithms
			.iter()
			.map(|alg: Algorithm| (alg.as_str(), alg.executor()))
			.collect();
		let digests =
			fan_out(&name, source, executors, self.queue_capacity)?;
		debug!(input = %name, "parallel digest complete");
		Ok(DigestResult::from_digests(digests))
	}
}
