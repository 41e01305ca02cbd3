//! Linear discriminant classifier: class means, pooled covariance, and the
//! resulting linear decision scores. A numerically singular pooled
//! covariance is a fit failure for this grid point, not a panic.
use crate::error::PipelineError;
use crate::math::{solve_linear_system, Array2};
use crate::models::{sigmoid, Classifier};

pub struct LinearDiscriminant {
    /// Discriminant direction `sigma^-1 (mu1 - mu0)`.
    direction: Vec<f64>,
    threshold: f64,
    log_prior_ratio: f64,
    fitted: bool,
}

impl LinearDiscriminant {
    pub fn new() -> Self {
        LinearDiscriminant {
            direction: Vec::new(),
            threshold: 0.0,
            log_prior_ratio: 0.0,
            fitted: false,
        }
    }

    fn project(&self, x: &Array2<f64>, row: usize) -> f64 {
        let mut z = 0.0;
        for (c, w) in self.direction.iter().enumerate() {
            z += w * x[(row, c)];
        }
        z
    }
}

impl Default for LinearDiscriminant {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for LinearDiscriminant {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), PipelineError> {
        let (n, p) = x.shape();
        if n != y.len() {
            return Err(PipelineError::Shape(format!(
                "lda fit: {} rows vs {} labels",
                n,
                y.len()
            )));
        }
        let fail = |detail: &str| PipelineError::FitFailure {
            family: "lda".into(),
            detail: detail.into(),
        };

        let pos: Vec<usize> = (0..n).filter(|&i| y[i] == 1).collect();
        let neg: Vec<usize> = (0..n).filter(|&i| y[i] == 0).collect();
        if pos.is_empty() || neg.is_empty() {
            return Err(fail("training fold contains a single class"));
        }

        let class_mean = |rows: &[usize]| -> Vec<f64> {
            let mut mean = vec![0.0f64; p];
            for &r in rows {
                for c in 0..p {
                    mean[c] += x[(r, c)];
                }
            }
            for v in mean.iter_mut() {
                *v /= rows.len() as f64;
            }
            mean
        };
        let mu1 = class_mean(&pos);
        let mu0 = class_mean(&neg);

        // Pooled within-class covariance.
        let mut cov = Array2::zeros(p, p);
        for (rows, mu) in [(&pos, &mu1), (&neg, &mu0)] {
            for &r in rows.iter() {
                for a in 0..p {
                    let da = x[(r, a)] - mu[a];
                    for b in 0..p {
                        cov[(a, b)] += da * (x[(r, b)] - mu[b]);
                    }
                }
            }
        }
        let denom = (n - 2).max(1) as f64;
        for a in 0..p {
            for b in 0..p {
                cov[(a, b)] /= denom;
            }
        }

        let diff: Vec<f64> = (0..p).map(|c| mu1[c] - mu0[c]).collect();
        let direction = solve_linear_system(&cov, &diff)
            .ok_or_else(|| fail("pooled covariance is singular"))?;

        let project = |mu: &[f64]| -> f64 {
            direction.iter().zip(mu.iter()).map(|(w, m)| w * m).sum()
        };
        self.threshold = (project(&mu1) + project(&mu0)) / 2.0;
        self.log_prior_ratio =
            (pos.len() as f64 / neg.len() as f64).ln();
        self.direction = direction;
        self.fitted = true;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Vec<f64> {
        assert!(self.fitted, "predict before fit");
        (0..x.nrows())
            .map(|row| sigmoid(self.project(x, row) - self.threshold + self.log_prior_ratio))
            .collect()
    }

    fn name(&self) -> &str {
        "lda"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_shifted_gaussians() {
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for i in 0..30 {
            let noise = ((i * 7) % 11) as f64 / 11.0 - 0.5;
            rows.extend_from_slice(&[2.0 + noise, 1.0 - noise * 0.5]);
            y.push(1u8);
            rows.extend_from_slice(&[-2.0 + noise, -1.0 + noise * 0.5]);
            y.push(0u8);
        }
        let x = Array2::from_shape_vec((60, 2), rows).unwrap();
        let mut model = LinearDiscriminant::new();
        model.fit(&x, &y).unwrap();
        let probs = model.predict_proba(&x);
        let correct = probs
            .iter()
            .zip(y.iter())
            .filter(|(p, &label)| (**p >= 0.5) == (label == 1))
            .count();
        assert!(correct >= 58, "only {} of 60 correct", correct);
    }

    #[test]
    fn duplicate_columns_fail_to_fit() {
        // identical columns -> singular pooled covariance
        let x = Array2::from_shape_vec(
            (6, 2),
            vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0, -1.0, -1.0, -2.0, -2.0, -3.0, -3.0],
        )
        .unwrap();
        let y = vec![1u8, 1, 1, 0, 0, 0];
        let mut model = LinearDiscriminant::new();
        let err = model.fit(&x, &y).unwrap_err();
        assert!(matches!(err, PipelineError::FitFailure { .. }));
    }
}
