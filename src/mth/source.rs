// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: mthasher
// File: source.rs
// Author: mthasher maintainers

//! Fixed-size block reading over files, stdin and caller-owned streams.

use bytes::Bytes;
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::iter::FusedIterator;
use std::path::PathBuf;
use tracing::trace;

/// One mebibyte.
pub const DEFAULT_BLOCK_SIZE: usize = 1 << 20;

/// Command-line spelling of standard input.
pub const STDIN_NAME: &str = "-";

/// Something to hash.
pub enum Input<'a> {
	Path(PathBuf),
	Stdin,
	/// A stream the caller opened and keeps ownership of.
	Stream {
		name: String,
		reader: &'a mut dyn Read,
	},
}

impl<'a> Input<'a> {
	/// Maps `-` to stdin and anything else to a path.
	pub fn from_arg(arg: &str) -> Input<'static> {
		if arg == STDIN_NAME {
			Input::Stdin
		} else {
			Input::Path(PathBuf::from(arg))
		}
	}

	pub fn stream(
		name: impl Into<String>,
		reader: &'a mut dyn Read,
	) -> Self {
		Input::Stream {
			name: name.into(),
			reader,
		}
	}

	pub fn name(&self) -> Cow<'_, str> {
		match self {
			Input::Path(path) => path.to_string_lossy(),
			Input::Stdin => Cow::Borrowed(STDIN_NAME),
			Input::Stream { name, .. } => Cow::Borrowed(name),
		}
	}
}

impl fmt::Debug for Input<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Input::Path(path) => f.debug_tuple("Path").field(path).finish(),
			Input::Stdin => f.write_str("Stdin"),
			Input::Stream { name, .. } => {
				f.debug_struct("Stream").field("name", name).finish()
			}
		}
	}
}

impl From<PathBuf> for Input<'static> {
	fn from(path: PathBuf) -> Self {
		Input::Path(path)
	}
}

enum Reader<'a> {
	File(File),
	Stdin(io::StdinLock<'static>),
	Borrowed(&'a mut dyn Read),
}

impl Read for Reader<'_> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		match self {
			Reader::File(file) => file.read(buf),
			Reader::Stdin(stdin) => stdin.read(buf),
			Reader::Borrowed(reader) => reader.read(buf),
		}
	}
}

/// Lazy, forward-only sequence of chunks of at most `block_size` bytes.
///
/// A file opened from a path is dropped (and so closed) as soon as the
/// sequence ends, whether by exhaustion or by a read error. Stdin and
/// borrowed streams are left open. The iterator is fused: after the end
/// or an error it only yields `None`.
pub struct BlockSource<'a> {
	reader: Option<Reader<'a>>,
	block_size: usize,
	bytes_read: u64,
}

impl<'a> BlockSource<'a> {
	pub fn open(
		input: &'a mut Input<'_>,
		block_size: usize,
	) -> io::Result<Self> {
		let reader = match input {
			Input::Path(path) => Reader::File(File::open(path)?),
			Input::Stdin => Reader::Stdin(io::stdin().lock()),
			Input::Stream { reader, .. } => Reader::Borrowed(&mut **reader),
		};
		Ok(Self {
			reader: Some(reader),
			block_size: block_size.max(1),
			bytes_read: 0,
		})
	}

	/// Wraps a caller-owned reader directly.
	pub fn from_reader(
		reader: &'a mut dyn Read,
		block_size: usize,
	) -> Self {
		Self {
			reader: Some(Reader::Borrowed(reader)),
			block_size: block_size.max(1),
			bytes_read: 0,
		}
	}

	pub fn bytes_read(&self) -> u64 {
		self.bytes_read
	}

	/// True once the underlying reader has been let go.
	pub fn is_released(&self) -> bool {
		self.reader.is_none()
	}

	fn release(&mut self) {
		if let Some(reader) = self.reader.take() {
			if matches!(reader, Reader::File(_)) {
				trace!(bytes = self.bytes_read, "closing input file");
			}
		}
	}
}

impl Iterator for BlockSource<'_> {
	type Item = io::Result<Bytes>;

	fn next(&mut self) -> Option<Self::Item> {
		let reader = self.reader.as_mut()?;
		let mut block = Vec::with_capacity(self.block_size);
		// `read_to_end` retries on `Interrupted` and coalesces short reads.
		let outcome = reader
			.by_ref()
			.take(self.block_size as u64)
			.read_to_end(&mut block);
		match outcome {
			Ok(0) => {
				self.release();
				None
			}
			Ok(n) => {
				self.bytes_read += n as u64;
				Some(Ok(Bytes::from(block)))
			}
			Err(err) => {
				self.release();
				Some(Err(err))
			}
		}
	}
}

impl FusedIterator for BlockSource<'_> {}
