//! Log input formats and sources
//!
//! Logs reach the indexer as JSON lines, one record per line. A record is
//! either an already decoded [`ChainLog`] or a [`RawLog`] straight from an
//! RPC node, which is decoded on read:
//!
//! ```text
//! {"address":"0xfa..","block":{"number":7,"timestamp":1700000000},"log_index":0,"kind":{"kind":"transfer",..}}
//! {"address":"0xaa..","topics":["0xddf2.."],"data":"0x","block_number":8,"block_timestamp":1700000012,"log_index":3}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use crate::abi::{self, RawLog};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use ticketgraph_core::{
    error::{Result, TicketgraphError},
    ChainLog,
};

/// One line of a log file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogRecord {
    Decoded(ChainLog),
    Raw(RawLog),
}

impl LogRecord {
    /// Typed log for this record; `None` for raw logs of unrelated events
    pub fn into_chain_log(self) -> Result<Option<ChainLog>> {
        match self {
            LogRecord::Decoded(log) => Ok(Some(log)),
            LogRecord::Raw(raw) => abi::decode_log(&raw),
        }
    }
}

impl From<ChainLog> for LogRecord {
    fn from(log: ChainLog) -> Self {
        LogRecord::Decoded(log)
    }
}

impl From<RawLog> for LogRecord {
    fn from(raw: RawLog) -> Self {
        LogRecord::Raw(raw)
    }
}

/// Encode one record as a single JSON line (without the newline)
pub fn encode_line(record: &LogRecord) -> Result<String> {
    serde_json::to_string(record).map_err(|e| TicketgraphError::Serialization(e.to_string()))
}

pub fn decode_line(line: &str) -> Result<LogRecord> {
    serde_json::from_str(line).map_err(|e| TicketgraphError::Serialization(e.to_string()))
}

/// Write records as JSON lines
pub fn write_records<'a, W: Write>(
    mut writer: W,
    records: impl IntoIterator<Item = &'a LogRecord>,
) -> Result<()> {
    for record in records {
        writeln!(writer, "{}", encode_line(record)?)?;
    }
    writer.flush()?;
    Ok(())
}

/// A stream of typed logs in chain order
pub trait LogSource {
    /// Next logs, at most `max`. An empty batch means nothing is available yet.
    fn next_batch(&mut self, max: usize) -> Result<Vec<ChainLog>>;

    /// `true` once the source can never produce another log
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// In-process source over an iterator of logs
pub struct IterSource<I> {
    iter: I,
    exhausted: bool,
}

impl<I: Iterator<Item = ChainLog>> IterSource<I> {
    pub fn new(logs: impl IntoIterator<Item = ChainLog, IntoIter = I>) -> Self {
        Self {
            iter: logs.into_iter(),
            exhausted: false,
        }
    }
}

impl<I: Iterator<Item = ChainLog>> LogSource for IterSource<I> {
    fn next_batch(&mut self, max: usize) -> Result<Vec<ChainLog>> {
        let mut batch = Vec::new();
        while batch.len() < max {
            match self.iter.next() {
                Some(log) => batch.push(log),
                None => {
                    self.exhausted = true;
                    break;
                }
            }
        }
        Ok(batch)
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// JSON-lines file source
///
/// In follow mode the file is treated as append-only: reaching the end yields
/// an empty batch, and a trailing line without its newline is held back until
/// the writer finishes it.
pub struct JsonLinesSource {
    path: PathBuf,
    reader: BufReader<File>,
    follow: bool,
    line_no: u64,
    partial: String,
    at_eof: bool,
}

impl JsonLinesSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
            follow: false,
            line_no: 0,
            partial: String::new(),
            at_eof: false,
        })
    }

    pub fn with_follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of complete lines consumed so far
    pub fn lines_read(&self) -> u64 {
        self.line_no
    }

    fn parse(&self, line: &str) -> Result<Option<ChainLog>> {
        let record = decode_line(line).map_err(|e| {
            TicketgraphError::Serialization(format!(
                "{}:{}: {}",
                self.path.display(),
                self.line_no,
                e
            ))
        })?;
        record.into_chain_log().map_err(|e| match e {
            TicketgraphError::Decode(msg) => TicketgraphError::Decode(format!(
                "{}:{}: {}",
                self.path.display(),
                self.line_no,
                msg
            )),
            other => other,
        })
    }
}

impl LogSource for JsonLinesSource {
    fn next_batch(&mut self, max: usize) -> Result<Vec<ChainLog>> {
        let mut batch = Vec::new();
        self.at_eof = false;

        while batch.len() < max {
            let read = self.reader.read_line(&mut self.partial)?;
            if read == 0 {
                // In follow mode an unfinished line stays in `partial`
                self.at_eof = true;
                break;
            }
            if self.follow && !self.partial.ends_with('\n') {
                continue;
            }

            let line = std::mem::take(&mut self.partial);
            self.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            match self.parse(trimmed)? {
                Some(log) => batch.push(log),
                None => tracing::debug!(
                    "Ignoring unrelated log at {}:{}",
                    self.path.display(),
                    self.line_no
                ),
            }
        }

        Ok(batch)
    }

    fn is_exhausted(&self) -> bool {
        !self.follow && self.at_eof && self.partial.is_empty()
    }
}
