use super::model::{AdminEventRecord, UserEventRecord};
use crate::core::event::{ParseOperationTypeError, RawEvent};
use crate::core::traits::EventSource;
use serde_json::Value;
use std::io::BufRead;

/// Error while decoding a raw event record.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("invalid event json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event record is not a JSON object")]
    NotAnObject,
    #[error(transparent)]
    OperationType(#[from] ParseOperationTypeError),
}

/// Decodes one JSON event record.
///
/// Records with an `operationType` are admin events; everything else is
/// read as a user event. `include_representation` applies to admin records
/// that do not carry their own `includeRepresentation` flag.
pub fn parse_line(line: &str, include_representation: bool) -> Result<RawEvent, SourceError> {
    let value: Value = serde_json::from_str(line)?;
    let Some(object) = value.as_object() else {
        return Err(SourceError::NotAnObject);
    };

    if object.contains_key("operationType") {
        let record: AdminEventRecord = serde_json::from_value(value)?;
        let include = record.include_representation.unwrap_or(include_representation);
        Ok(RawEvent::Admin {
            event: record.try_into()?,
            include_representation: include,
        })
    } else {
        let record: UserEventRecord = serde_json::from_value(value)?;
        Ok(RawEvent::User(record.into()))
    }
}

/// Event source over newline-delimited JSON records.
///
/// Malformed records, including lines that are not UTF-8, are logged and
/// skipped; an I/O error ends the stream.
pub struct JsonlEventReader<R> {
    reader: R,
    buffer: Vec<u8>,
    include_representation: bool,
    line_number: u64,
    skipped: u64,
}

impl<R: BufRead> JsonlEventReader<R> {
    pub fn new(reader: R, include_representation: bool) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            include_representation,
            line_number: 0,
            skipped: 0,
        }
    }

    /// Number of records dropped as malformed.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl<R: BufRead> EventSource for JsonlEventReader<R> {
    fn next_event(&mut self) -> Option<RawEvent> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(line = self.line_number + 1, error = %err, "event read failed");
                    return None;
                }
            }
            self.line_number += 1;
            let line = match std::str::from_utf8(&self.buffer) {
                Ok(line) => line,
                Err(err) => {
                    self.skipped += 1;
                    tracing::warn!(line = self.line_number, error = %err, "skipping non-utf8 event record");
                    continue;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_line(trimmed, self.include_representation) {
                Ok(event) => return Some(event),
                Err(err) => {
                    self.skipped += 1;
                    tracing::warn!(line = self.line_number, error = %err, "skipping event record");
                }
            }
        }
    }
}
