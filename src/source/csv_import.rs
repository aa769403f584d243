//! CSV import
//!
//! Header-mapped CSV loading of time entries. Column names are matched
//! case-insensitively; `date` and `hours` are required, `rate`, `project`,
//! `client`, `category` and `notes` are optional. Rows that fail to parse
//! are collected as errors, not fatal.

use crate::source::error::{SourceError, SourceResult};
use crate::source::types::TimeEntry;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// CSV file importer with a configurable date format.
pub struct CsvImporter {
    date_format: String,
}

/// Result of a CSV import operation.
#[derive(Debug)]
pub struct CsvImport {
    pub entries: Vec<TimeEntry>,
    pub rows_processed: usize,
    pub rows_failed: usize,
    pub errors: Vec<String>,
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvImporter {
    pub fn new() -> Self {
        Self {
            date_format: "%Y-%m-%d".to_string(),
        }
    }

    /// Set the strftime format used to parse the `date` column.
    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = format.to_string();
        self
    }

    /// Import entries from a CSV file.
    pub fn import(&self, path: &Path) -> SourceResult<CsvImport> {
        self.import_reader(csv::Reader::from_path(path)?)
    }

    /// Import entries from any reader producing CSV with a header row.
    pub fn import_reader<R: Read>(&self, mut reader: csv::Reader<R>) -> SourceResult<CsvImport> {
        let headers = reader.headers()?.clone();
        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();

        let date_col = *columns
            .get("date")
            .ok_or_else(|| SourceError::Malformed("missing required column 'date'".into()))?;
        let hours_col = *columns
            .get("hours")
            .ok_or_else(|| SourceError::Malformed("missing required column 'hours'".into()))?;

        let mut import = CsvImport {
            entries: Vec::new(),
            rows_processed: 0,
            rows_failed: 0,
            errors: Vec::new(),
        };

        for (index, record) in reader.records().enumerate() {
            // Header is line 1.
            let row = index + 2;
            import.rows_processed += 1;

            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    import.rows_failed += 1;
                    import.errors.push(format!("row {row}: {e}"));
                    continue;
                }
            };

            match self.parse_row(&record, date_col, hours_col, &columns) {
                Ok(entry) => import.entries.push(entry),
                Err(message) => {
                    import.rows_failed += 1;
                    import.errors.push(format!("row {row}: {message}"));
                }
            }
        }

        Ok(import)
    }

    fn parse_row(
        &self,
        record: &csv::StringRecord,
        date_col: usize,
        hours_col: usize,
        columns: &HashMap<String, usize>,
    ) -> Result<TimeEntry, String> {
        let date_text = record.get(date_col).unwrap_or("").trim();
        let date = NaiveDate::parse_from_str(date_text, &self.date_format)
            .map_err(|_| format!("invalid date '{date_text}'"))?;

        let hours_text = record.get(hours_col).unwrap_or("").trim();
        let hours: f64 = hours_text
            .parse()
            .map_err(|_| format!("invalid hours '{hours_text}'"))?;
        if hours < 0.0 {
            return Err(format!("negative hours '{hours_text}'"));
        }

        let mut entry = TimeEntry::new(date, hours);

        if let Some(text) = optional_field(record, columns, "rate") {
            let rate: f64 = text
                .parse()
                .map_err(|_| format!("invalid rate '{text}'"))?;
            entry = entry.rate(rate);
        }
        if let Some(text) = optional_field(record, columns, "project") {
            entry = entry.project(text);
        }
        if let Some(text) = optional_field(record, columns, "client") {
            entry = entry.client(text);
        }
        if let Some(text) = optional_field(record, columns, "category") {
            entry = entry.category(text);
        }
        if let Some(text) = optional_field(record, columns, "notes") {
            entry = entry.notes(text);
        }

        Ok(entry)
    }
}

fn optional_field(
    record: &csv::StringRecord,
    columns: &HashMap<String, usize>,
    name: &str,
) -> Option<String> {
    let index = *columns.get(name)?;
    let text = record.get(index)?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import(text: &str) -> CsvImport {
        CsvImporter::new()
            .import_reader(csv::Reader::from_reader(text.as_bytes()))
            .unwrap()
    }

    #[test]
    fn test_import_basic() {
        let result = import(
            "date,hours,rate,project\n\
             2024-01-02,8,75,Acme Redesign\n\
             2024-01-03,7.5,75,Acme Redesign\n",
        );
        assert_eq!(result.rows_processed, 2);
        assert_eq!(result.rows_failed, 0);
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].invoiced(), 600.0);
        assert_eq!(
            result.entries[1].project.as_deref(),
            Some("Acme Redesign")
        );
    }

    #[test]
    fn test_import_collects_row_errors() {
        let result = import(
            "date,hours\n\
             2024-01-02,8\n\
             not-a-date,4\n\
             2024-01-04,-2\n",
        );
        assert_eq!(result.rows_processed, 3);
        assert_eq!(result.rows_failed, 2);
        assert_eq!(result.entries.len(), 1);
        assert!(result.errors[0].contains("row 3"));
        assert!(result.errors[1].contains("negative hours"));
    }

    #[test]
    fn test_import_missing_required_column() {
        let err = CsvImporter::new()
            .import_reader(csv::Reader::from_reader("date,rate\n2024-01-02,75\n".as_bytes()))
            .unwrap_err();
        assert!(err.to_string().contains("hours"));
    }

    #[test]
    fn test_import_header_case_insensitive() {
        let result = import("Date,Hours,Project\n2024-01-02,8,Acme\n");
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].project.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_import_custom_date_format() {
        let result = CsvImporter::new()
            .with_date_format("%d.%m.%Y")
            .import_reader(csv::Reader::from_reader(
                "date,hours\n02.01.2024,8\n".as_bytes(),
            ))
            .unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].month_key(), (2024, 1));
    }

    #[test]
    fn test_import_blank_optional_fields() {
        let result = import("date,hours,rate,notes\n2024-01-02,8,,\n");
        assert_eq!(result.entries.len(), 1);
        assert!(result.entries[0].rate.is_none());
        assert!(result.entries[0].notes.is_none());
    }
}
