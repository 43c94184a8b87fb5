//! # Tipos y Estructuras para el Sistema de Jobs
//! src/jobs/types.rs
//!
//! Define los tipos fundamentales para el manejo de trabajos asíncronos:
//! identificadores, tipos de consulta, argumentos y resultados.

use crate::error::InvalidJobId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Identificador único de un job: `job_id_<N>` con N >= 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
    /// Prefijo de todos los identificadores
    pub const PREFIX: &'static str = "job_id_";

    /// Crea un id a partir de su número de secuencia
    pub fn from_number(number: u64) -> Self {
        Self(number)
    }

    /// Número de secuencia del id
    pub fn number(&self) -> u64 {
        self.0
    }

    /// Nombre del archivo de resultado para este job
    pub fn file_name(&self) -> String {
        format!("{}.json", self)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl FromStr for JobId {
    type Err = InvalidJobId;

    /// Solo acepta `job_id_<N>` con dígitos decimales y N >= 1.
    /// Cualquier otra cosa (incluyendo `../`) se rechaza.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| InvalidJobId(s.to_string()))?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidJobId(s.to_string()));
        }

        match digits.parse::<u64>() {
            Ok(n) if n >= 1 => Ok(Self(n)),
            _ => Err(InvalidJobId(s.to_string())),
        }
    }
}

impl Serialize for JobId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Tipo de consulta que ejecuta el job
///
/// El conjunto es cerrado: cada variante corresponde a una función del
/// Query Engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    StatesMean,
    StateMean,
    Best5,
    Worst5,
    GlobalMean,
    DiffFromMean,
    StateDiffFromMean,
    MeanByCategory,
    StateMeanByCategory,
}

impl QueryKind {
    pub const ALL: [QueryKind; 9] = [
        QueryKind::StatesMean,
        QueryKind::StateMean,
        QueryKind::Best5,
        QueryKind::Worst5,
        QueryKind::GlobalMean,
        QueryKind::DiffFromMean,
        QueryKind::StateDiffFromMean,
        QueryKind::MeanByCategory,
        QueryKind::StateMeanByCategory,
    ];

    /// Nombre usado en la ruta `/api/<nombre>`
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::StatesMean => "states_mean",
            QueryKind::StateMean => "state_mean",
            QueryKind::Best5 => "best5",
            QueryKind::Worst5 => "worst5",
            QueryKind::GlobalMean => "global_mean",
            QueryKind::DiffFromMean => "diff_from_mean",
            QueryKind::StateDiffFromMean => "state_diff_from_mean",
            QueryKind::MeanByCategory => "mean_by_category",
            QueryKind::StateMeanByCategory => "state_mean_by_category",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Las consultas por estado necesitan el argumento `state`
    pub fn requires_state(&self) -> bool {
        matches!(
            self,
            QueryKind::StateMean | QueryKind::StateDiffFromMean | QueryKind::StateMeanByCategory
        )
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Argumentos tipados de una consulta
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryArgs {
    pub question: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl QueryArgs {
    pub fn question(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            state: None,
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}

/// Un trabajo encolado
///
/// Inmutable una vez creado. La cola lo entrega por valor a un único
/// worker, que se queda con su ownership hasta persistir el resultado.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    id: JobId,
    kind: QueryKind,
    args: QueryArgs,
}

impl Job {
    pub fn new(id: JobId, kind: QueryKind, args: QueryArgs) -> Self {
        Self { id, kind, args }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn args(&self) -> &QueryArgs {
        &self.args
    }
}

/// Resultado terminal de un job
#[derive(Debug, Clone, PartialEq)]
pub enum JobResult {
    /// Payload producido por el Query Engine
    Success(Value),

    /// El job falló; el motivo queda legible para el cliente
    Failure(String),
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        matches!(self, JobResult::Success(_))
    }

    /// Forma persistida: el payload tal cual, o el sobre
    /// `{"status": "error", "reason": ...}` para un fallo
    pub fn to_json(&self) -> Value {
        match self {
            JobResult::Success(payload) => payload.clone(),
            JobResult::Failure(reason) => json!({ "status": "error", "reason": reason }),
        }
    }

    /// Inversa de `to_json`
    pub fn from_json(value: Value) -> Self {
        if let Some(obj) = value.as_object() {
            if obj.len() == 2 && obj.get("status").and_then(Value::as_str) == Some("error") {
                if let Some(reason) = obj.get("reason").and_then(Value::as_str) {
                    return JobResult::Failure(reason.to_string());
                }
            }
        }
        JobResult::Success(value)
    }
}

/// Estado de un job visto por `/api/get_results`
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// Aún en cola o ejecutándose
    Running,

    /// Terminado; contiene la forma persistida del resultado
    Done(Value),

    /// Id malformado, nunca emitido, o resultado ilegible
    Invalid,
}

impl JobStatus {
    pub fn to_json(&self) -> Value {
        match self {
            JobStatus::Running => json!({ "status": "running" }),
            JobStatus::Done(data) => json!({ "status": "done", "data": data }),
            JobStatus::Invalid => json!({ "status": "error", "reason": "Invalid job_id" }),
        }
    }
}

/// Respuesta de `/api/graceful_shutdown`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownStatus {
    /// Quedaron jobs en la cola que nunca se van a procesar
    Running,

    /// La cola quedó vacía
    Done,
}
