//! Logistic regression, plain and penalized.
//!
//! One implementation covers the unregularized, lasso, ridge and elastic-net
//! families: full-batch proximal gradient descent on the logistic loss with
//! an L2 term in the gradient and an L1 soft-threshold step. The intercept
//! is never penalized.
use crate::error::PipelineError;
use crate::math::Array2;
use crate::models::{sigmoid, Classifier};

pub struct LogisticRegression {
    /// L1 penalty weight (lambda * l1_ratio).
    l1: f64,
    /// L2 penalty weight (lambda * (1 - l1_ratio)).
    l2: f64,
    epochs: usize,
    step: f64,
    weights: Vec<f64>,
    intercept: f64,
    fitted: bool,
}

impl LogisticRegression {
    pub fn new(l1_ratio: f64, lambda: f64) -> Self {
        LogisticRegression {
            l1: lambda * l1_ratio,
            l2: lambda * (1.0 - l1_ratio),
            epochs: 500,
            step: 0.5,
            weights: Vec::new(),
            intercept: 0.0,
            fitted: false,
        }
    }

    pub fn unregularized() -> Self {
        Self::new(0.0, 0.0)
    }

    fn raw_score(&self, x: &Array2<f64>, row: usize) -> f64 {
        let mut z = self.intercept;
        for (c, w) in self.weights.iter().enumerate() {
            z += w * x[(row, c)];
        }
        z
    }
}

fn soft_threshold(value: f64, bound: f64) -> f64 {
    if value > bound {
        value - bound
    } else if value < -bound {
        value + bound
    } else {
        0.0
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), PipelineError> {
        let (n, p) = x.shape();
        if n != y.len() {
            return Err(PipelineError::Shape(format!(
                "logistic fit: {} rows vs {} labels",
                n,
                y.len()
            )));
        }
        self.weights = vec![0.0; p];
        self.intercept = 0.0;
        let n_f = n as f64;

        for _ in 0..self.epochs {
            let mut grad_w = vec![0.0f64; p];
            let mut grad_b = 0.0f64;
            for row in 0..n {
                let err = sigmoid(self.raw_score(x, row)) - y[row] as f64;
                grad_b += err;
                for c in 0..p {
                    grad_w[c] += err * x[(row, c)];
                }
            }
            self.intercept -= self.step * grad_b / n_f;
            for c in 0..p {
                let proposed =
                    self.weights[c] - self.step * (grad_w[c] / n_f + self.l2 * self.weights[c]);
                self.weights[c] = soft_threshold(proposed, self.step * self.l1);
            }
        }

        if self.weights.iter().any(|w| !w.is_finite()) || !self.intercept.is_finite() {
            return Err(PipelineError::FitFailure {
                family: "logistic".into(),
                detail: "coefficients diverged".into(),
            });
        }
        self.fitted = true;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Vec<f64> {
        assert!(self.fitted, "predict before fit");
        (0..x.nrows())
            .map(|row| sigmoid(self.raw_score(x, row)))
            .collect()
    }

    fn name(&self) -> &str {
        "logistic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_data() -> (Array2<f64>, Vec<u8>) {
        // positive class clusters at +1, negative at -1 on the first feature
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            let jitter = (i % 5) as f64 * 0.05;
            rows.extend_from_slice(&[1.0 + jitter, 0.1]);
            y.push(1u8);
            rows.extend_from_slice(&[-1.0 - jitter, -0.1]);
            y.push(0u8);
        }
        (Array2::from_shape_vec((40, 2), rows).unwrap(), y)
    }

    #[test]
    fn separates_simple_clusters() {
        let (x, y) = separable_data();
        let mut model = LogisticRegression::unregularized();
        model.fit(&x, &y).unwrap();
        let probs = model.predict_proba(&x);
        let correct = probs
            .iter()
            .zip(y.iter())
            .filter(|(p, &label)| (**p >= 0.5) == (label == 1))
            .count();
        assert_eq!(correct, y.len());
    }

    #[test]
    fn strong_l1_zeroes_noise_weight() {
        let (x, y) = separable_data();
        let mut model = LogisticRegression::new(1.0, 0.3);
        model.fit(&x, &y).unwrap();
        // second feature carries almost no signal; lasso should kill it
        assert!(
            model.weights[1].abs() < 1e-6,
            "noise weight = {}",
            model.weights[1]
        );
        assert!(model.weights[0] > 0.0);
    }

    #[test]
    fn soft_threshold_shrinks_toward_zero() {
        assert_eq!(soft_threshold(1.0, 0.4), 0.6);
        assert_eq!(soft_threshold(-1.0, 0.4), -0.6);
        assert_eq!(soft_threshold(0.3, 0.4), 0.0);
    }
}
