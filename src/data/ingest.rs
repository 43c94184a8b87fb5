//! # Carga del Dataset
//! src/data/ingest.rs
//!
//! Lee el CSV de la encuesta. Solo interesan cinco columnas; el resto se
//! ignora. Los valores no numéricos de `Data_Value` quedan como faltantes.

use crate::data::{Dataset, Record};
use crate::error::DatasetError;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Fila cruda tal como viene en el CSV
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Question")]
    question: String,

    #[serde(rename = "LocationDesc")]
    location: String,

    #[serde(rename = "Data_Value", default)]
    data_value: Option<String>,

    #[serde(rename = "StratificationCategory1", default)]
    category: Option<String>,

    #[serde(rename = "Stratification1", default)]
    stratification: Option<String>,
}

impl From<RawRecord> for Record {
    fn from(raw: RawRecord) -> Self {
        Record {
            question: raw.question,
            location: raw.location,
            category: non_empty(raw.category),
            stratification: non_empty(raw.stratification),
            value: raw.data_value.as_deref().and_then(parse_value),
        }
    }
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

/// Convierte una celda numérica; NaN e infinitos cuentan como faltantes
fn parse_value(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parsea un CSV desde cualquier lector
pub fn parse_csv<R: Read>(reader: R) -> Result<Dataset, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let records = reader
        .deserialize::<RawRecord>()
        .map(|row| row.map(Record::from))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Dataset::from_records(records))
}

/// Carga el dataset desde un archivo
pub fn load_csv(path: impl AsRef<Path>) -> Result<Dataset, DatasetError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path_str.clone(),
        source,
    })?;

    let dataset = parse_csv(file).map_err(|source| DatasetError::Csv {
        path: path_str.clone(),
        source,
    })?;

    tracing::info!(
        path = %path_str,
        rows = dataset.len(),
        questions = dataset.question_count(),
        "dataset loaded"
    );

    Ok(dataset)
}
