//! Random-forest ensemble: bootstrap replicas of gini trees with per-split
//! candidate-feature subsampling, averaged probabilities.
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::error::PipelineError;
use crate::math::Array2;
use crate::models::tree::ClassificationTree;
use crate::models::Classifier;

pub struct RandomForest {
    n_trees: usize,
    mtry: usize,
    min_leaf: usize,
    seed: u64,
    trees: Vec<ClassificationTree>,
}

impl RandomForest {
    pub fn new(n_trees: usize, mtry: usize, min_leaf: usize, seed: u64) -> Self {
        RandomForest {
            n_trees,
            mtry,
            min_leaf,
            seed,
            trees: Vec::new(),
        }
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), PipelineError> {
        let n = x.nrows();
        if n != y.len() {
            return Err(PipelineError::Shape(format!(
                "forest fit: {} rows vs {} labels",
                n,
                y.len()
            )));
        }
        self.trees.clear();
        for t in 0..self.n_trees {
            // Independent generator per tree so the ensemble is reproducible
            // regardless of fit order.
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(t as u64));
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();

            // Deep unpruned trees, randomized by the bootstrap and mtry.
            let mut tree = ClassificationTree::cart(0.0, 16);
            tree.set_min_leaf(self.min_leaf);
            tree.fit_subset(x, y, &sample, Some(self.mtry), Some(&mut rng))?;
            self.trees.push(tree);
        }
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Vec<f64> {
        assert!(!self.trees.is_empty(), "predict before fit");
        let mut acc = vec![0.0f64; x.nrows()];
        for tree in &self.trees {
            for (slot, p) in acc.iter_mut().zip(tree.predict_proba(x)) {
                *slot += p;
            }
        }
        for slot in acc.iter_mut() {
            *slot /= self.trees.len() as f64;
        }
        acc
    }

    fn name(&self) -> &str {
        "forest"
    }
}
