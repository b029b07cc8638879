//! Serializable envelopes for handing results to a report writer

use crate::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Provenance of an exported result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub model_name: String,
    pub run_id: Option<String>,
    pub crate_version: String,
    pub generated_at: DateTime<Utc>,
    pub history_start: Option<NaiveDate>,
    pub history_end: Option<NaiveDate>,
    pub observations: usize,
}

/// Metadata plus payload, ready to write as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEnvelope<T> {
    pub metadata: ExportMetadata,
    pub payload: T,
}

impl<T: Serialize> ExportEnvelope<T> {
    pub fn new(metadata: ExportMetadata, payload: T) -> Self {
        Self { metadata, payload }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
