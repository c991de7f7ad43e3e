//! JSON Lines sink for reports.
//!
//! Buffers one report per line and writes a new file once the buffer reaches
//! the target size or outlives the max age.

use crate::core::report::Report;
use crate::core::traits::ReportWriter;
use chrono::{SecondsFormat, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// JSONL writer with size/age rotation and optional gzip.
pub struct JsonlWriter {
    dir: PathBuf,
    target_size_bytes: u64,
    max_age: Option<Duration>,
    compression: JsonlCompression,
    buffer: Vec<u8>,
    first_report_at: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsonlCompression {
    None,
    Gzip,
}

/// Line layout: delivery metadata followed by the report fields.
#[derive(Serialize)]
struct ReportRecord<'a> {
    event_id: String,
    captured_at: String,
    #[serde(flatten)]
    report: &'a Report,
}

impl JsonlWriter {
    /// Creates a JSONL writer with size-based rotation and optional max age.
    pub fn new(
        dir: impl Into<PathBuf>,
        target_size_mb: u64,
        max_age_seconds: Option<u64>,
        compression: Option<&str>,
    ) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let max_age = max_age_seconds
            .and_then(|seconds| if seconds > 0 { Some(Duration::from_secs(seconds)) } else { None });
        let compression = parse_compression(compression)?;
        Ok(Self {
            dir,
            target_size_bytes: target_size_mb.saturating_mul(1024 * 1024),
            max_age,
            compression,
            buffer: Vec::new(),
            first_report_at: None,
        })
    }

    fn write_file(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let file = open_file(&self.dir, self.compression)?;
        match self.compression {
            JsonlCompression::None => {
                let mut file = file;
                file.write_all(&self.buffer)?;
                file.flush()?;
            }
            JsonlCompression::Gzip => {
                let mut encoder = GzEncoder::new(file, Compression::default());
                encoder.write_all(&self.buffer)?;
                encoder.finish()?;
            }
        }
        tracing::debug!(bytes = self.buffer.len(), dir = %self.dir.display(), "report file written");
        self.buffer.clear();
        self.first_report_at = None;
        Ok(())
    }
}

impl ReportWriter for JsonlWriter {
    fn write_report(&mut self, report: &Report) -> io::Result<u64> {
        let record = ReportRecord {
            event_id: event_id(),
            captured_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            report,
        };
        let mut line = serde_json::to_vec(&record).map_err(io::Error::other)?;
        line.push(b'\n');
        let size = line.len() as u64;

        if self.buffer.is_empty() {
            self.first_report_at = Some(Instant::now());
        }
        self.buffer.extend_from_slice(&line);

        if self.buffer.len() as u64 >= self.target_size_bytes {
            self.write_file()?;
        }
        Ok(size)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        if let (Some(max_age), Some(start)) = (self.max_age, self.first_report_at) {
            if start.elapsed() < max_age {
                return Ok(());
            }
        }
        self.write_file()
    }

    fn close(&mut self) -> io::Result<()> {
        self.write_file()
    }
}

fn open_file(dir: &Path, compression: JsonlCompression) -> io::Result<File> {
    let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");
    let unique = unique_id();
    let ext = match compression {
        JsonlCompression::None => "jsonl",
        JsonlCompression::Gzip => "jsonl.gz",
    };
    File::create(dir.join(format!("reports_{stamp}_{unique}.{ext}")))
}

/// 32 lower-case hex digits, the id format monitoring sinks expect.
fn event_id() -> String {
    format!("{:032x}", rand::thread_rng().gen::<u128>())
}

fn unique_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

fn parse_compression(value: Option<&str>) -> io::Result<JsonlCompression> {
    let Some(value) = value else {
        return Ok(JsonlCompression::None);
    };
    let normalized = value.trim().to_lowercase();
    match normalized.as_str() {
        "" | "none" => Ok(JsonlCompression::None),
        "gzip" | "gz" => Ok(JsonlCompression::Gzip),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported jsonl compression: {value}"),
        )),
    }
}
