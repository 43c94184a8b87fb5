//! # Query Engine
//! src/data/queries.rs
//!
//! Agregaciones sobre el dataset: medias por ubicación, top/bottom 5,
//! media global, diferencias contra la media global y medias por
//! categoría de estratificación.
//!
//! Todas las funciones son puras: leen el dataset y construyen un valor
//! JSON nuevo. No hay estado mutable compartido, así que varios workers
//! pueden ejecutarlas a la vez sin locks.

use crate::data::{Dataset, Record};
use crate::error::QueryError;
use crate::jobs::types::{QueryArgs, QueryKind};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Preguntas donde un valor más bajo es mejor
pub const QUESTIONS_BEST_IS_MIN: [&str; 5] = [
    "Percent of adults aged 18 years and older who have an overweight classification",
    "Percent of adults aged 18 years and older who have obesity",
    "Percent of adults who engage in no leisure-time physical activity",
    "Percent of adults who report consuming fruit less than one time daily",
    "Percent of adults who report consuming vegetables less than one time daily",
];

/// Cuántas ubicaciones devuelven best5 / worst5
const TOP_N: usize = 5;

/// Punto de entrada que usan los workers
pub trait QueryEngine: Send + Sync {
    fn run(&self, kind: QueryKind, args: &QueryArgs) -> Result<Value, QueryError>;
}

impl QueryEngine for Dataset {
    fn run(&self, kind: QueryKind, args: &QueryArgs) -> Result<Value, QueryError> {
        let question = args.question.as_str();
        if !self.has_question(question) {
            return Err(QueryError::UnknownQuestion(question.to_string()));
        }

        let state = || {
            args.state.as_deref().ok_or(QueryError::MissingArgument {
                kind: kind.as_str(),
                argument: "state",
            })
        };

        let value = match kind {
            QueryKind::StatesMean => self.states_mean(question),
            QueryKind::StateMean => self.state_mean(question, state()?),
            QueryKind::Best5 => self.best5(question),
            QueryKind::Worst5 => self.worst5(question),
            QueryKind::GlobalMean => self.global_mean(question),
            QueryKind::DiffFromMean => self.diff_from_mean(question),
            QueryKind::StateDiffFromMean => self.state_diff_from_mean(question, state()?),
            QueryKind::MeanByCategory => self.mean_by_category(question),
            QueryKind::StateMeanByCategory => self.state_mean_by_category(question, state()?),
        };

        Ok(value)
    }
}

/// Acumulador de media que ignora faltantes
#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn get(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

fn mean_of<'a>(rows: impl Iterator<Item = &'a Record>) -> Option<f64> {
    let mut mean = Mean::default();
    for row in rows {
        mean.push(row.value);
    }
    mean.get()
}

fn number(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::from)
}

fn to_object(pairs: impl IntoIterator<Item = (String, Option<f64>)>) -> Value {
    let map: Map<String, Value> = pairs.into_iter().map(|(k, v)| (k, number(v))).collect();
    Value::Object(map)
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

fn sort_ascending(pairs: &mut [(String, f64)]) {
    // Orden estable: empates quedan en orden alfabético de ubicación
    pairs.sort_by(|a, b| a.1.total_cmp(&b.1));
}

impl Dataset {
    /// Media por ubicación, sin las ubicaciones que no tienen valores,
    /// en orden alfabético
    fn location_means(&self, question: &str) -> Vec<(String, f64)> {
        let mut groups: BTreeMap<&str, Mean> = BTreeMap::new();
        for row in self.rows_for(question) {
            groups.entry(row.location.as_str()).or_default().push(row.value);
        }

        groups
            .into_iter()
            .filter_map(|(location, mean)| mean.get().map(|m| (location.to_string(), m)))
            .collect()
    }

    fn question_mean(&self, question: &str) -> Option<f64> {
        mean_of(self.rows_for(question))
    }

    fn location_mean(&self, question: &str, state: &str) -> Option<f64> {
        mean_of(self.rows_for(question).filter(|r| r.location == state))
    }

    fn lower_is_better(question: &str) -> bool {
        QUESTIONS_BEST_IS_MIN.contains(&question)
    }

    fn smallest(&self, question: &str) -> Value {
        let mut means = self.location_means(question);
        sort_ascending(&mut means);
        to_object(means.into_iter().take(TOP_N).map(|(k, v)| (k, Some(v))))
    }

    fn largest(&self, question: &str) -> Value {
        let mut means = self.location_means(question);
        // Mayor primero; empates en orden alfabético
        means.sort_by(|a, b| b.1.total_cmp(&a.1));
        to_object(means.into_iter().take(TOP_N).map(|(k, v)| (k, Some(v))))
    }

    /// `{ubicación: media}` ascendente por valor
    pub fn states_mean(&self, question: &str) -> Value {
        let mut means = self.location_means(question);
        sort_ascending(&mut means);
        to_object(means.into_iter().map(|(k, v)| (k, Some(v))))
    }

    /// `{estado: media}`; `null` si el estado no tiene valores
    pub fn state_mean(&self, question: &str, state: &str) -> Value {
        single(state, number(self.location_mean(question, state)))
    }

    pub fn best5(&self, question: &str) -> Value {
        if Self::lower_is_better(question) {
            self.smallest(question)
        } else {
            self.largest(question)
        }
    }

    pub fn worst5(&self, question: &str) -> Value {
        if Self::lower_is_better(question) {
            self.largest(question)
        } else {
            self.smallest(question)
        }
    }

    pub fn global_mean(&self, question: &str) -> Value {
        single("global_mean", number(self.question_mean(question)))
    }

    /// `media_global - media_ubicación` por ubicación, ascendente
    pub fn diff_from_mean(&self, question: &str) -> Value {
        let Some(global) = self.question_mean(question) else {
            return Value::Object(Map::new());
        };

        let mut diffs: Vec<(String, f64)> = self
            .location_means(question)
            .into_iter()
            .map(|(location, mean)| (location, global - mean))
            .collect();
        sort_ascending(&mut diffs);

        to_object(diffs.into_iter().map(|(k, v)| (k, Some(v))))
    }

    pub fn state_diff_from_mean(&self, question: &str, state: &str) -> Value {
        let diff = self
            .question_mean(question)
            .zip(self.location_mean(question, state))
            .map(|(global, local)| global - local);

        single(state, number(diff))
    }

    /// Claves `('<ubicación>', '<categoría>', '<estratificación>')`
    pub fn mean_by_category(&self, question: &str) -> Value {
        let mut groups: BTreeMap<(&str, &str, &str), Mean> = BTreeMap::new();

        for row in self.rows_for(question) {
            let (Some(category), Some(strat)) = (&row.category, &row.stratification) else {
                continue;
            };
            groups
                .entry((row.location.as_str(), category.as_str(), strat.as_str()))
                .or_default()
                .push(row.value);
        }

        to_object(groups.into_iter().map(|((location, category, strat), mean)| {
            (format!("('{}', '{}', '{}')", location, category, strat), mean.get())
        }))
    }

    /// `{estado: {"('<categoría>', '<estratificación>')": media}}`
    pub fn state_mean_by_category(&self, question: &str, state: &str) -> Value {
        let mut groups: BTreeMap<(&str, &str), Mean> = BTreeMap::new();

        for row in self.rows_for(question).filter(|r| r.location == state) {
            let (Some(category), Some(strat)) = (&row.category, &row.stratification) else {
                continue;
            };
            groups
                .entry((category.as_str(), strat.as_str()))
                .or_default()
                .push(row.value);
        }

        let inner = to_object(
            groups
                .into_iter()
                .map(|((category, strat), mean)| (format!("('{}', '{}')", category, strat), mean.get())),
        );

        single(state, inner)
    }
}
