//! Constant-rule baseline: majority outcome per level of one designated
//! categorical predictor. Every other family has to beat this to matter.
use crate::error::PipelineError;
use crate::frame::FeatureGroup;
use crate::math::Array2;
use crate::models::Classifier;

pub struct OneRuleBaseline {
    /// Encoded one-hot columns of the designated predictor; empty when the
    /// frame has no categorical column, in which case the rule degrades to
    /// the overall majority class.
    group_cols: Vec<usize>,
    level_rates: Vec<f64>,
    overall_rate: f64,
    fitted: bool,
}

impl OneRuleBaseline {
    pub fn new(group: Option<&FeatureGroup>) -> Self {
        OneRuleBaseline {
            group_cols: group.map(|g| g.cols.clone()).unwrap_or_default(),
            level_rates: Vec::new(),
            overall_rate: 0.0,
            fitted: false,
        }
    }

    fn active_level(&self, x: &Array2<f64>, row: usize) -> Option<usize> {
        self.group_cols
            .iter()
            .position(|&c| x[(row, c)] > 0.0)
    }
}

impl Classifier for OneRuleBaseline {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), PipelineError> {
        if x.nrows() != y.len() {
            return Err(PipelineError::Shape(format!(
                "baseline fit: {} rows vs {} labels",
                x.nrows(),
                y.len()
            )));
        }
        let positives = y.iter().filter(|&&v| v == 1).count();
        self.overall_rate = positives as f64 / y.len() as f64;

        self.level_rates = self
            .group_cols
            .iter()
            .map(|&col| {
                let mut n = 0usize;
                let mut pos = 0usize;
                for row in 0..x.nrows() {
                    if x[(row, col)] > 0.0 {
                        n += 1;
                        pos += y[row] as usize;
                    }
                }
                if n == 0 {
                    self.overall_rate
                } else {
                    pos as f64 / n as f64
                }
            })
            .collect();
        self.fitted = true;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Vec<f64> {
        assert!(self.fitted, "predict before fit");
        (0..x.nrows())
            .map(|row| match self.active_level(x, row) {
                Some(level) => self.level_rates[level],
                None => self.overall_rate,
            })
            .collect()
    }

    fn name(&self) -> &str {
        "baseline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::GroupKind;

    #[test]
    fn learns_per_level_rates() {
        // columns: sex=female, sex=male
        let x = Array2::from_shape_vec(
            (4, 2),
            vec![
                1.0, 0.0,
                1.0, 0.0,
                0.0, 1.0,
                0.0, 1.0,
            ],
        )
        .unwrap();
        let y = vec![1u8, 1, 0, 1];

        let group = FeatureGroup {
            name: "sex".into(),
            cols: vec![0, 1],
            kind: GroupKind::Categorical {
                levels: vec!["female".into(), "male".into()],
            },
        };
        let mut model = OneRuleBaseline::new(Some(&group));
        model.fit(&x, &y).unwrap();

        let probs = model.predict_proba(&x);
        assert!((probs[0] - 1.0).abs() < 1e-9);
        assert!((probs[2] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn without_group_uses_overall_majority() {
        let x = Array2::from_shape_vec((3, 1), vec![0.3, 0.1, 0.9]).unwrap();
        let y = vec![1u8, 1, 0];
        let mut model = OneRuleBaseline::new(None);
        model.fit(&x, &y).unwrap();
        for p in model.predict_proba(&x) {
            assert!((p - 2.0 / 3.0).abs() < 1e-9);
        }
    }
}
