// SPDX-License-Identifier: MIT OR Apache-2.0
// Project: mthasher
// Module: output
// Purpose: Serialize digest tables and report skipped inputs.

use crate::mth::driver::{BatchSink, ResultRow};
use crate::mth::engine::Header;
use crate::mth::error::HashError;
use clap::ValueEnum;
use csv::{QuoteStyle, WriterBuilder};
use serde_json::{Map, Value};
use std::fmt;
use std::io::{self, Write};
use strum::EnumIter;

/// Table formats surfaced via the CLI `--format` flag.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum, EnumIter)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
	/// Tab-separated header and rows.
	#[default]
	Tsv,
	Csv,
	/// A single JSON array of row objects.
	Json,
	/// One JSON object per line, no header.
	#[value(alias = "jsonl")]
	JsonLines,
}

impl OutputFormat {
	pub fn canonical_name(self) -> &'static str {
		match self {
			Self::Tsv => "tsv",
			Self::Csv => "csv",
			Self::Json => "json",
			Self::JsonLines => "jsonl",
		}
	}
}

impl fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			Self::Tsv => "Tab-separated values",
			Self::Csv => "CSV",
			Self::Json => "JSON array",
			Self::JsonLines => "JSON Lines",
		};
		write!(f, "{}", label)
	}
}

/// Line written to the diagnostic stream for a skipped input.
pub fn diagnostic_line(error: &HashError) -> String {
	format!("digest: {}", error)
}

enum Target<W: Write> {
	Table(csv::Writer<W>),
	Json { writer: W, rows: Vec<Value> },
	JsonLines(W),
}

/// Writes result rows to `W` and diagnostics to `D`.
pub struct TableWriter<W: Write, D: Write> {
	target: Target<W>,
	diagnostics: D,
	columns: Vec<&'static str>,
}

impl<W: Write, D: Write> TableWriter<W, D> {
	pub fn new(format: OutputFormat, writer: W, diagnostics: D) -> Self {
		let target = match format {
			OutputFormat::Tsv => Target::Table(
				WriterBuilder::new()
					.delimiter(b'\t')
					.quote_style(QuoteStyle::Never)
					.flexible(true)
					.from_writer(writer),
			),
			OutputFormat::Csv => {
				Target::Table(WriterBuilder::new().from_writer(writer))
			}
			OutputFormat::Json => Target::Json {
				writer,
				rows: Vec::new(),
			},
			OutputFormat::JsonLines => Target::JsonLines(writer),
		};
		Self {
			target,
			diagnostics,
			columns: Vec::new(),
		}
	}

	fn row_object(&self, row: &ResultRow) -> Value {
		let mut object = Map::with_capacity(self.columns.len());
		let values = std::iter::once(row.input.as_str())
			.chain(row.digests.as_slice().iter().map(String::as_str));
		for (column, value) in self.columns.iter().zip(values) {
			object.insert(
				(*column).to_owned(),
				Value::String(value.to_owned()),
			);
		}
		Value::Object(object)
	}

	/// Flushes buffered output and hands back the row writer.
	pub fn finish(self) -> io::Result<W> {
		let mut diagnostics = self.diagnostics;
		diagnostics.flush()?;
		match self.target {
			Target::Table(table) => {
				table.into_inner().map_err(|err| err.into_error())
			}
			Target::Json { mut writer, rows } => {
				serde_json::to_writer_pretty(
					&mut writer,
					&Value::Array(rows),
				)?;
				writeln!(writer)?;
				writer.flush()?;
				Ok(writer)
			}
			Target::JsonLines(mut writer) => {
				writer.flush()?;
				Ok(writer)
			}
		}
	}
}

impl<W: Write, D: Write> BatchSink for TableWriter<W, D> {
	fn header(&mut self, header: &Header) -> io::Result<()> {
		self.columns = header.columns();
		if let Target::Table(table) = &mut self.target {
			table.write_record(&self.columns)?;
		}
		Ok(())
	}

	fn row(&mut self, row: ResultRow) -> io::Result<()> {
		let object = match &self.target {
			Target::Table(_) => None,
			_ => Some(self.row_object(&row)),
		};
		match (&mut self.target, object) {
			(Target::Table(table), _) => {
				table.write_field(&row.input)?;
				table.write_record(row.digests.as_slice())?;
				// Rows stay visible promptly when piping.
				table.flush()?;
			}
			(Target::Json { rows, .. }, Some(object)) => rows.push(object),
			(Target::JsonLines(writer), Some(object)) => {
				serde_json::to_writer(&mut *writer, &object)?;
				writeln!(writer)?;
				writer.flush()?;
			}
			_ => {}
		}
		Ok(())
	}

	fn failure(&mut self, error: HashError) -> io::Result<()> {
		writeln!(self.diagnostics, "{}", diagnostic_line(&error))
	}
}
