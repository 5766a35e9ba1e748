use crate::core::store::StoreError;
use crate::core::RecordStore;
use crate::input::convert::{parse_cell, CellValue, ConvertError};
use crate::input::schema::{DatalogSchema, RowValues, HEADER_ROWS};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// What to do with a data row that has fewer cells than the schema needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortRowPolicy {
    /// Log the row and leave it out of the store
    #[default]
    Skip,
    /// Fail the whole load
    Abort,
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read datalog: {0}")]
    Csv(#[from] csv::Error),

    #[error("Line {line} has {found} columns, {required} required")]
    ShortRow {
        line: usize,
        found: usize,
        required: usize,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A cell that failed to convert and was replaced with zero
#[derive(Debug, Clone, PartialEq)]
pub struct CellDiagnostic {
    /// 1-based line in the datalog file
    pub line: usize,
    pub column: usize,
    pub field: &'static str,
    pub error: ConvertError,
}

/// Summary of a completed load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub diagnostics: Vec<CellDiagnostic>,
}

/// Reads a datalog export into a [`RecordStore`]
pub struct DatalogLoader {
    schema: DatalogSchema,
    short_rows: ShortRowPolicy,
}

impl DatalogLoader {
    pub fn new(schema: DatalogSchema, short_rows: ShortRowPolicy) -> Self {
        Self { schema, short_rows }
    }

    /// Load a datalog file from disk
    pub fn load_path(&self, path: &Path) -> Result<(RecordStore, LoadReport), LoadError> {
        info!("Reading in datalog file {}", path.display());
        let file = File::open(path).map_err(csv::Error::from)?;
        self.load_reader(file)
    }

    /// Load a datalog from any reader
    pub fn load_reader<R: Read>(&self, reader: R) -> Result<(RecordStore, LoadReport), LoadError> {
        self.load_csv(Self::builder().from_reader(reader))
    }

    fn builder() -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        // Header rows are skipped by count, and row width is checked against the schema
        builder.has_headers(false).flexible(true);
        builder
    }

    fn load_csv<R: Read>(&self, mut rdr: csv::Reader<R>) -> Result<(RecordStore, LoadReport), LoadError> {
        let mut store = RecordStore::new(self.schema.variant());
        let mut report = LoadReport::default();
        let required = self.schema.required_columns();

        for (i, result) in rdr.records().enumerate() {
            let record = result?;
            if i < HEADER_ROWS {
                continue;
            }

            let line = record.position().map(|p| p.line() as usize).unwrap_or(i + 1);

            if record.len() < required {
                match self.short_rows {
                    ShortRowPolicy::Abort => {
                        return Err(LoadError::ShortRow {
                            line,
                            found: record.len(),
                            required,
                        });
                    }
                    ShortRowPolicy::Skip => {
                        warn!(line, found = record.len(), required, "Skipping short datalog row");
                        report.rows_skipped += 1;
                        continue;
                    }
                }
            }

            let values = self.convert_row(&record, line, &mut report.diagnostics);
            let index = store.push(values.into_row(self.schema.variant()))?;
            debug!(line, index, "Loaded datalog row");
            report.rows_loaded += 1;
        }

        info!(
            "Loaded {} rows ({} skipped, {} bad cells)",
            report.rows_loaded,
            report.rows_skipped,
            report.diagnostics.len()
        );

        Ok((store, report))
    }

    /// Convert every schema column of a row, substituting zero for bad cells
    fn convert_row(
        &self,
        record: &csv::StringRecord,
        line: usize,
        diagnostics: &mut Vec<CellDiagnostic>,
    ) -> RowValues {
        let mut values = RowValues::default();

        for column in self.schema.columns() {
            // Width was checked against required_columns
            let cell = record.get(column.index).unwrap_or_default();
            let value = match parse_cell(cell, column.kind) {
                Ok(value) => value,
                Err(error) => {
                    warn!(
                        line,
                        column = column.index,
                        field = column.field.label(),
                        "{}",
                        error
                    );
                    diagnostics.push(CellDiagnostic {
                        line,
                        column: column.index,
                        field: column.field.label(),
                        error,
                    });
                    CellValue::zero(column.kind)
                }
            };
            values.set(column.field, value);
        }

        values
    }
}
