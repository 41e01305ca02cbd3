//! Gradient-boosted tree ensemble with logistic loss.
//!
//! Additive logit model: start at the log-odds of the base rate, then at
//! each round fit a shallow regression tree to the current residuals
//! (`y - p`) with hessian weights (`p (1 - p)`) and take a shrunken Newton
//! step per leaf.
use crate::error::PipelineError;
use crate::math::Array2;
use crate::models::tree::RegressionTree;
use crate::models::{sigmoid, Classifier};

pub struct GradientBoost {
    n_trees: usize,
    depth: usize,
    learning_rate: f64,
    base_score: f64,
    trees: Vec<RegressionTree>,
    fitted: bool,
}

impl GradientBoost {
    pub fn new(n_trees: usize, depth: usize, learning_rate: f64) -> Self {
        GradientBoost {
            n_trees,
            depth,
            learning_rate,
            base_score: 0.0,
            trees: Vec::new(),
            fitted: false,
        }
    }
}

impl Classifier for GradientBoost {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), PipelineError> {
        let n = x.nrows();
        if n != y.len() {
            return Err(PipelineError::Shape(format!(
                "boost fit: {} rows vs {} labels",
                n,
                y.len()
            )));
        }
        let pos = y.iter().filter(|&&v| v == 1).count();
        if pos == 0 || pos == n {
            return Err(PipelineError::FitFailure {
                family: "boost".into(),
                detail: "training fold contains a single class".into(),
            });
        }

        let rate = pos as f64 / n as f64;
        self.base_score = (rate / (1.0 - rate)).ln();
        self.trees.clear();

        let mut scores = vec![self.base_score; n];
        for _ in 0..self.n_trees {
            let mut residuals = vec![0.0f64; n];
            let mut weights = vec![0.0f64; n];
            for i in 0..n {
                let p = sigmoid(scores[i]);
                residuals[i] = y[i] as f64 - p;
                weights[i] = (p * (1.0 - p)).max(1e-6);
            }

            let mut tree = RegressionTree::new(self.depth, 10);
            tree.fit(x, &residuals, &weights);
            for i in 0..n {
                scores[i] += self.learning_rate * tree.predict_row(x, i);
            }
            self.trees.push(tree);
        }
        self.fitted = true;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Vec<f64> {
        assert!(self.fitted, "predict before fit");
        (0..x.nrows())
            .map(|row| {
                let mut score = self.base_score;
                for tree in &self.trees {
                    score += self.learning_rate * tree.predict_row(x, row);
                }
                sigmoid(score)
            })
            .collect()
    }

    fn name(&self) -> &str {
        "boost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boosting_improves_on_base_rate() {
        let values: Vec<f64> = (0..50).map(|i| i as f64 / 50.0).collect();
        let y: Vec<u8> = values.iter().map(|&v| (v > 0.35) as u8).collect();
        let x = Array2::from_shape_vec((50, 1), values).unwrap();

        let mut model = GradientBoost::new(30, 2, 0.1);
        model.fit(&x, &y).unwrap();
        let probs = model.predict_proba(&x);
        let correct = probs
            .iter()
            .zip(y.iter())
            .filter(|(p, &label)| (**p >= 0.5) == (label == 1))
            .count();
        assert!(correct >= 47, "only {} of 50 correct", correct);
    }

    #[test]
    fn single_class_fold_is_a_fit_failure() {
        let x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let mut model = GradientBoost::new(5, 1, 0.1);
        assert!(matches!(
            model.fit(&x, &[1, 1, 1, 1]),
            Err(PipelineError::FitFailure { .. })
        ));
    }
}
