//! Tag export
//!
//! Seam between the reconciliation pipeline and whatever consumes its
//! results. The default [`LogExporter`] reports the resolved tags through the
//! log; a file-writing exporter plugs in behind the same trait.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::types::{Song, TagValue};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to export tags: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Consumes the final, reconciled tag set of a song.
pub trait TagExporter: Send + Sync {
    fn export(
        &self,
        song: &Song,
        tags: &BTreeMap<String, TagValue>,
        cover: Option<&[u8]>,
    ) -> Result<(), ExportError>;
}

/// Exporter that logs the resolved tags without touching any file.
#[derive(Debug, Default)]
pub struct LogExporter;

impl TagExporter for LogExporter {
    fn export(
        &self,
        song: &Song,
        tags: &BTreeMap<String, TagValue>,
        cover: Option<&[u8]>,
    ) -> Result<(), ExportError> {
        let rendered: Vec<String> = tags
            .iter()
            .map(|(key, value)| format!("{}={}", key, render(value)))
            .collect();

        tracing::info!(
            path = %song.path.display(),
            cover_bytes = cover.map(|c| c.len()).unwrap_or(0),
            tags = %rendered.join(", "),
            "Resolved tags"
        );
        Ok(())
    }
}

fn render(value: &TagValue) -> String {
    match value {
        TagValue::Text(text) => text.clone(),
        TagValue::Number(n) => n.to_string(),
        TagValue::List(items) => items.join(";"),
    }
}
