//! Final frame cleanup before modeling.
//!
//! Two passes, in a fixed order: rare categorical levels are first collapsed
//! into the catch-all level, then any column that has become near-constant
//! is dropped. The order matters: collapsing rare levels can itself make a
//! column near-constant.
use std::collections::HashMap;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::frame::{Column, Frame};

/// Catch-all level absorbing rare categorical levels.
pub const OTHER_LEVEL: &str = "Other";

pub struct FeatureSanitizer<'a> {
    config: &'a PipelineConfig,
}

impl<'a> FeatureSanitizer<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        FeatureSanitizer { config }
    }

    /// Produce the modeling frame: same rows, collapsed levels, near-constant
    /// columns removed. Fails with `DegenerateFeatures` if nothing survives.
    pub fn sanitize(&self, frame: &Frame) -> Result<Frame, PipelineError> {
        let mut out = Frame::new(frame.row_ids.clone(), frame.outcome.clone());
        let mut dropped = Vec::new();

        for (name, column) in frame.iter() {
            let column = match column {
                Column::Categorical(values) => {
                    Column::Categorical(self.collapse_rare(values))
                }
                Column::Continuous(values) => Column::Continuous(values.clone()),
            };
            if self.near_zero_variance(&column) {
                dropped.push(name.to_string());
                continue;
            }
            out.push_column(name, column);
        }

        if !dropped.is_empty() {
            log::info!(
                "dropped {} near-constant column(s): {}",
                dropped.len(),
                dropped.join(", ")
            );
        }
        if out.n_cols() == 0 {
            return Err(PipelineError::DegenerateFeatures);
        }
        out.log_summary("modeling frame");
        Ok(out)
    }

    fn collapse_rare(&self, values: &[String]) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for v in values {
            *counts.entry(v.as_str()).or_insert(0) += 1;
        }
        values
            .iter()
            .map(|v| {
                if counts[v.as_str()] < self.config.min_level_support {
                    OTHER_LEVEL.to_string()
                } else {
                    v.clone()
                }
            })
            .collect()
    }

    /// caret-style near-zero-variance test: the ratio of the most frequent
    /// value to the second most frequent exceeds the bound AND the fraction
    /// of distinct values is small.
    fn near_zero_variance(&self, column: &Column) -> bool {
        let counts: Vec<usize> = match column {
            Column::Categorical(values) => {
                let mut m: HashMap<&str, usize> = HashMap::new();
                for v in values {
                    *m.entry(v.as_str()).or_insert(0) += 1;
                }
                m.into_values().collect()
            }
            Column::Continuous(values) => {
                let mut m: HashMap<u64, usize> = HashMap::new();
                for v in values {
                    *m.entry(v.to_bits()).or_insert(0) += 1;
                }
                m.into_values().collect()
            }
        };
        let n = column.len();
        if n == 0 {
            return true;
        }
        let mut sorted = counts;
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        if sorted.len() < 2 {
            return true;
        }
        let freq_ratio = sorted[0] as f64 / sorted[1] as f64;
        let unique_pct = 100.0 * sorted.len() as f64 / n as f64;
        freq_ratio > self.config.nzv_freq_ratio && unique_pct < self.config.nzv_unique_pct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PipelineConfig {
        PipelineConfig {
            min_level_support: 3,
            ..PipelineConfig::default()
        }
    }

    fn small_frame(values: Vec<&str>) -> Frame {
        let n = values.len();
        let mut frame = Frame::new(
            (0..n as u32).collect(),
            (0..n).map(|i| i % 2 == 0).collect(),
        );
        frame.push_column(
            "level",
            Column::Categorical(values.into_iter().map(String::from).collect()),
        );
        frame.push_column(
            "noise",
            Column::Continuous((0..n).map(|i| i as f64).collect()),
        );
        frame
    }

    #[test]
    fn rare_levels_collapse_to_other() {
        let cfg = config();
        let frame = small_frame(vec!["a", "a", "a", "b", "a", "a", "a", "a"]);
        let out = FeatureSanitizer::new(&cfg).sanitize(&frame).unwrap();
        match out.column("level").unwrap() {
            Column::Categorical(values) => {
                assert_eq!(values[3], OTHER_LEVEL);
                assert_eq!(values[0], "a");
            }
            _ => panic!("expected categorical column"),
        }
    }

    #[test]
    fn near_constant_column_is_dropped() {
        let mut cfg = config();
        cfg.nzv_freq_ratio = 5.0;
        cfg.nzv_unique_pct = 50.0;
        // 7 of one level vs 1 collapsed: freq ratio 7, unique 25% -> dropped
        let frame = small_frame(vec!["a", "a", "a", "b", "a", "a", "a", "a"]);
        let out = FeatureSanitizer::new(&cfg).sanitize(&frame).unwrap();
        assert!(out.column("level").is_none());
        assert!(out.column("noise").is_some());
        assert_eq!(out.n_rows(), frame.n_rows());
    }
}
