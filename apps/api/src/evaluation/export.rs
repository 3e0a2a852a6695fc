// CSV export of an evaluation table. One row per record, header = field names.

use serde::Serialize;
use thiserror::Error;

use crate::evaluation::models::Evaluation;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer flush failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Evaluation {
    pub fn to_csv(&self) -> Result<String, ExportError> {
        match self {
            Evaluation::Rubric(records) => records_to_csv(records),
            Evaluation::Comparative(records) => records_to_csv(records),
        }
    }
}

fn records_to_csv<T: Serialize>(records: &[T]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(vec![]);
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}
