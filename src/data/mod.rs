//! # Dataset de Salud Pública
//!
//! Registros de la encuesta (pregunta, ubicación, estratificación, valor)
//! cargados una vez al arrancar y compartidos en modo solo lectura entre
//! todos los workers.
//!
//! - `ingest`: lectura del CSV
//! - `queries`: Query Engine (agregaciones puras sobre el dataset)

pub mod ingest;
pub mod queries;

pub use ingest::{load_csv, parse_csv};
pub use queries::QueryEngine;

use std::collections::HashSet;

/// Una fila del dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub question: String,
    pub location: String,
    pub category: Option<String>,
    pub stratification: Option<String>,

    /// `Data_Value`; `None` si la celda estaba vacía o no era numérica
    pub value: Option<f64>,
}

/// Dataset inmutable
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    questions: HashSet<String>,
}

impl Dataset {
    pub fn from_records(records: Vec<Record>) -> Self {
        let questions = records.iter().map(|r| r.question.clone()).collect();
        Self { records, questions }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_question(&self, question: &str) -> bool {
        self.questions.contains(question)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Filas de una pregunta
    pub(crate) fn rows_for<'a>(&'a self, question: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records.iter().filter(move |r| r.question == question)
    }
}
