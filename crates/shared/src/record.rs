use std::io;

use chrono::NaiveDateTime;
use serde::{
    ser::{Error as _, SerializeMap},
    Serialize, Serializer,
};
use serde_json::ser::Formatter;

use crate::{
    domain::{fields, TIMESTAMP_COLUMN},
    form::{FieldValue, FormState},
};

/// Seconds precision, no offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One questionnaire submission, ready to be appended as a sheet row.
///
/// Entries follow header order. Serializes as a JSON object with `timestamp`
/// first and the multi-select kept as an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    timestamp: String,
    entries: Vec<(&'static str, FieldValue)>,
}

impl SubmissionRecord {
    pub fn from_form(form: &FormState, submitted_at: NaiveDateTime) -> Self {
        let entries = fields()
            .map(|field| {
                let value = form
                    .value(field.key)
                    .unwrap_or_else(|| FieldValue::Text(String::new()));
                (field.column, value)
            })
            .collect();
        Self {
            timestamp: submitted_at.format(TIMESTAMP_FORMAT).to_string(),
            entries,
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.entries.iter().map(|(column, value)| (*column, value))
    }

    /// Single-line JSON with `", "` and `": "` separators, the layout of the
    /// rows the hosted form has already written.
    pub fn payload_json(&self) -> serde_json::Result<String> {
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(out).map_err(serde_json::Error::custom)
    }

    /// Cells in header order: timestamp, one per field, then the JSON payload.
    pub fn to_row(&self) -> serde_json::Result<Vec<String>> {
        let mut row = Vec::with_capacity(self.entries.len() + 2);
        row.push(self.timestamp.clone());
        row.extend(self.entries.iter().map(|(_, value)| value.to_cell()));
        row.push(self.payload_json()?);
        Ok(row)
    }
}

impl Serialize for SubmissionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len() + 1))?;
        map.serialize_entry(TIMESTAMP_COLUMN, &self.timestamp)?;
        for (column, value) in &self.entries {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
#[path = "tests/record_tests.rs"]
mod tests;
