//! Record and frame types shared by every pipeline stage.
//!
//! A `RawPassenger` is one row as it arrives from the caller. Ingestion
//! assigns each record a stable synthetic `row_id`; every later merge of
//! per-row values (e.g. imputed ages) joins on that identifier, never on
//! positional order. Each stage owns the frame it returns and never aliases
//! the previous stage's frame.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::math::Array2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn label(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

/// One passenger row with raw fields, immutable once read.
///
/// `boat` and `body` are accepted on input but never enter the modeling
/// frame: both look ahead at the outcome.
#[derive(Debug, Clone)]
pub struct RawPassenger {
    pub pclass: u8,
    pub name: String,
    pub sex: Sex,
    pub age: Option<f64>,
    pub sibsp: u32,
    pub parch: u32,
    pub ticket: String,
    pub fare: Option<f64>,
    pub cabin: Option<String>,
    pub embarked: Option<String>,
    pub boat: Option<String>,
    pub body: Option<u32>,
    pub home_dest: Option<String>,
    pub survived: bool,
}

/// A raw record plus its stable synthetic identifier.
#[derive(Debug, Clone)]
pub struct Record {
    pub row_id: u32,
    pub raw: RawPassenger,
}

/// Validate the raw table and assign row identifiers.
///
/// Fatal conditions (empty input, a single outcome class, out-of-range
/// class codes, negative fares) abort before any stage runs.
pub fn ingest(records: Vec<RawPassenger>) -> Result<Vec<Record>, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::Schema("input table is empty".into()));
    }
    let survivors = records.iter().filter(|r| r.survived).count();
    if survivors == 0 || survivors == records.len() {
        return Err(PipelineError::Schema(
            "outcome column has a single level; both classes are required".into(),
        ));
    }
    for (i, r) in records.iter().enumerate() {
        if !(1..=3).contains(&r.pclass) {
            return Err(PipelineError::Schema(format!(
                "row {}: passenger class {} outside 1..=3",
                i, r.pclass
            )));
        }
        if let Some(fare) = r.fare {
            if !fare.is_finite() || fare < 0.0 {
                return Err(PipelineError::Schema(format!(
                    "row {}: fare {} is not a non-negative number",
                    i, fare
                )));
            }
        }
        if let Some(age) = r.age {
            if !age.is_finite() || age < 0.0 {
                return Err(PipelineError::Schema(format!(
                    "row {}: age {} is not a non-negative number",
                    i, age
                )));
            }
        }
    }
    Ok(records
        .into_iter()
        .enumerate()
        .map(|(i, raw)| Record {
            row_id: i as u32,
            raw,
        })
        .collect())
}

/// A record after imputation: all modeling inputs present.
#[derive(Debug, Clone)]
pub struct ImputedRecord {
    pub row_id: u32,
    pub pclass: u8,
    pub name: String,
    pub sex: Sex,
    pub age: f64,
    pub sibsp: u32,
    pub parch: u32,
    pub fare: f64,
    pub cabin: String,
    pub embarked: String,
    pub home_dest: String,
    pub survived: bool,
}

/// One named column of a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Continuous(Vec<f64>),
    Categorical(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Continuous(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rectangular table of named, typed predictor columns plus the outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub row_ids: Vec<u32>,
    pub outcome: Vec<bool>,
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Frame {
    pub fn new(row_ids: Vec<u32>, outcome: Vec<bool>) -> Self {
        assert_eq!(row_ids.len(), outcome.len(), "row id / outcome mismatch");
        Frame {
            row_ids,
            outcome,
            names: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.row_ids.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn push_column(&mut self, name: &str, column: Column) {
        assert_eq!(
            column.len(),
            self.n_rows(),
            "column {} length does not match frame",
            name
        );
        assert!(
            !self.names.iter().any(|n| n == name),
            "duplicate column {}",
            name
        );
        self.names.push(name.to_string());
        self.columns.push(column);
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names
            .iter()
            .map(|n| n.as_str())
            .zip(self.columns.iter())
    }

    /// Log a one-line summary of the frame at a named stage.
    pub fn log_summary(&self, stage: &str) {
        let positives = self.outcome.iter().filter(|&&v| v).count();
        log::info!(
            "{}: {} rows x {} predictor columns ({} positive / {} negative outcomes)",
            stage,
            self.n_rows(),
            self.n_cols(),
            positives,
            self.n_rows() - positives
        );
    }
}

/// How a design-matrix feature group maps back to a frame column.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKind {
    Continuous,
    Categorical { levels: Vec<String> },
}

/// The encoded columns that together represent one frame column.
///
/// Permutation importance and partial dependence operate on groups so that a
/// one-hot block is shuffled or swept as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureGroup {
    pub name: String,
    pub cols: Vec<usize>,
    pub kind: GroupKind,
}

/// Dense numeric encoding of a frame: one-hot categoricals, raw continuous.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    pub x: Array2<f64>,
    pub y: Vec<u8>,
    pub feature_names: Vec<String>,
    pub groups: Vec<FeatureGroup>,
}

impl Frame {
    /// Encode the frame as a dense design matrix.
    ///
    /// Categorical levels are one-hot encoded in sorted level order; the
    /// encoded column names are `column=level`.
    pub fn to_design_matrix(&self) -> Result<DesignMatrix, PipelineError> {
        if self.n_cols() == 0 {
            return Err(PipelineError::DegenerateFeatures);
        }
        let n = self.n_rows();
        let mut feature_names = Vec::new();
        let mut groups = Vec::new();
        let mut encoded: Vec<Vec<f64>> = Vec::new();

        for (name, column) in self.iter() {
            match column {
                Column::Continuous(values) => {
                    groups.push(FeatureGroup {
                        name: name.to_string(),
                        cols: vec![encoded.len()],
                        kind: GroupKind::Continuous,
                    });
                    feature_names.push(name.to_string());
                    encoded.push(values.clone());
                }
                Column::Categorical(values) => {
                    let mut levels: Vec<String> = {
                        let mut seen: HashMap<&str, ()> = HashMap::new();
                        values.iter().for_each(|v| {
                            seen.entry(v.as_str()).or_insert(());
                        });
                        seen.keys().map(|k| k.to_string()).collect()
                    };
                    levels.sort();
                    let first = encoded.len();
                    for level in &levels {
                        feature_names.push(format!("{}={}", name, level));
                        encoded.push(
                            values
                                .iter()
                                .map(|v| if v == level { 1.0 } else { 0.0 })
                                .collect(),
                        );
                    }
                    groups.push(FeatureGroup {
                        name: name.to_string(),
                        cols: (first..encoded.len()).collect(),
                        kind: GroupKind::Categorical { levels },
                    });
                }
            }
        }

        let ncols = encoded.len();
        let mut data = Vec::with_capacity(n * ncols);
        for row in 0..n {
            for col in &encoded {
                data.push(col[row]);
            }
        }
        let x = Array2::from_shape_vec((n, ncols), data)
            .map_err(|e| PipelineError::Shape(e.to_string()))?;
        let y = self.outcome.iter().map(|&v| v as u8).collect();

        Ok(DesignMatrix {
            x,
            y,
            feature_names,
            groups,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passenger(survived: bool) -> RawPassenger {
        RawPassenger {
            pclass: 1,
            name: "Moore, Mr. Brian".into(),
            sex: Sex::Male,
            age: Some(30.0),
            sibsp: 0,
            parch: 0,
            ticket: "12345".into(),
            fare: Some(80.0),
            cabin: Some("C85".into()),
            embarked: Some("S".into()),
            boat: None,
            body: None,
            home_dest: None,
            survived,
        }
    }

    #[test]
    fn ingest_assigns_sequential_row_ids() {
        let records = ingest(vec![passenger(true), passenger(false)]).unwrap();
        assert_eq!(records[0].row_id, 0);
        assert_eq!(records[1].row_id, 1);
    }

    #[test]
    fn ingest_rejects_single_class_outcome() {
        let err = ingest(vec![passenger(true), passenger(true)]).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }

    #[test]
    fn one_hot_encoding_groups_levels() {
        let mut frame = Frame::new(vec![0, 1, 2], vec![true, false, true]);
        frame.push_column(
            "sex",
            Column::Categorical(vec!["male".into(), "female".into(), "male".into()]),
        );
        frame.push_column("age", Column::Continuous(vec![22.0, 38.0, 26.0]));

        let dm = frame.to_design_matrix().unwrap();
        assert_eq!(dm.x.shape(), (3, 3));
        assert_eq!(
            dm.feature_names,
            vec!["sex=female", "sex=male", "age"]
        );
        // first row is male
        assert_eq!(dm.x[(0, 0)], 0.0);
        assert_eq!(dm.x[(0, 1)], 1.0);
        assert_eq!(dm.groups.len(), 2);
    }
}
