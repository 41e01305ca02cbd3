//! Distance-based classifier: the predicted probability is the positive
//! fraction among the k nearest training rows (Euclidean distance on the
//! standardized design matrix).
use crate::error::PipelineError;
use crate::math::Array2;
use crate::models::Classifier;

pub struct KNearest {
    k: usize,
    train_x: Option<Array2<f64>>,
    train_y: Vec<u8>,
}

impl KNearest {
    pub fn new(k: usize) -> Self {
        assert!(k >= 1, "k must be at least 1");
        KNearest {
            k,
            train_x: None,
            train_y: Vec::new(),
        }
    }
}

impl Classifier for KNearest {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), PipelineError> {
        if x.nrows() != y.len() {
            return Err(PipelineError::Shape(format!(
                "knn fit: {} rows vs {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() < self.k {
            return Err(PipelineError::FitFailure {
                family: "knn".into(),
                detail: format!("k={} exceeds {} training rows", self.k, x.nrows()),
            });
        }
        self.train_x = Some(x.clone());
        self.train_y = y.to_vec();
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Vec<f64> {
        let train = self.train_x.as_ref().expect("predict before fit");
        let p = train.ncols();
        (0..x.nrows())
            .map(|row| {
                let mut dists: Vec<(f64, u8)> = (0..train.nrows())
                    .map(|t| {
                        let mut d = 0.0;
                        for c in 0..p {
                            let diff = x[(row, c)] - train[(t, c)];
                            d += diff * diff;
                        }
                        (d, self.train_y[t])
                    })
                    .collect();
                dists.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
                let pos = dists
                    .iter()
                    .take(self.k)
                    .filter(|(_, label)| *label == 1)
                    .count();
                pos as f64 / self.k as f64
            })
            .collect()
    }

    fn name(&self) -> &str {
        "knn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_neighbor_memorizes_training_set() {
        let x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 10.0, 11.0]).unwrap();
        let y = vec![0u8, 0, 1, 1];
        let mut model = KNearest::new(1);
        model.fit(&x, &y).unwrap();
        let probs = model.predict_proba(&x);
        assert_eq!(probs, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn k_larger_than_train_is_a_fit_failure() {
        let x = Array2::from_shape_vec((2, 1), vec![0.0, 1.0]).unwrap();
        let mut model = KNearest::new(5);
        assert!(matches!(
            model.fit(&x, &[0, 1]),
            Err(PipelineError::FitFailure { .. })
        ));
    }
}
