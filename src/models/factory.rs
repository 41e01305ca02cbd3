//! Dispatch table from model family + grid point to a boxed classifier.
use crate::config::ModelFamily;
use crate::frame::{FeatureGroup, GroupKind};
use crate::models::baseline::OneRuleBaseline;
use crate::models::boost::GradientBoost;
use crate::models::forest::RandomForest;
use crate::models::grid::HyperPoint;
use crate::models::knn::KNearest;
use crate::models::lda::LinearDiscriminant;
use crate::models::linear::LogisticRegression;
use crate::models::tree::ClassificationTree;
use crate::models::Classifier;

/// The categorical predictor the constant-rule baseline keys on: `sex` when
/// present, otherwise the first categorical group in the frame.
pub fn baseline_group(groups: &[FeatureGroup]) -> Option<&FeatureGroup> {
    groups
        .iter()
        .find(|g| g.name == "sex" && matches!(g.kind, GroupKind::Categorical { .. }))
        .or_else(|| {
            groups
                .iter()
                .find(|g| matches!(g.kind, GroupKind::Categorical { .. }))
        })
}

/// Build a boxed classifier for one grid point.
///
/// A family/point mismatch is a programming error in the grid tables, not a
/// data condition, hence the panic.
pub fn build_model(
    family: ModelFamily,
    point: &HyperPoint,
    groups: &[FeatureGroup],
    seed: u64,
) -> Box<dyn Classifier> {
    match (family, point) {
        (ModelFamily::Baseline, HyperPoint::Baseline) => {
            Box::new(OneRuleBaseline::new(baseline_group(groups)))
        }
        (ModelFamily::Logistic, HyperPoint::Logistic) => {
            Box::new(LogisticRegression::unregularized())
        }
        (
            ModelFamily::Lasso | ModelFamily::Ridge | ModelFamily::ElasticNet,
            HyperPoint::Penalized { l1_ratio, lambda },
        ) => Box::new(LogisticRegression::new(*l1_ratio, *lambda)),
        (ModelFamily::Lda, HyperPoint::Lda) => Box::new(LinearDiscriminant::new()),
        (ModelFamily::Knn, HyperPoint::Knn { k }) => Box::new(KNearest::new(*k)),
        (ModelFamily::TreeCart, HyperPoint::Cart { cp, max_depth }) => {
            Box::new(ClassificationTree::cart(*cp, *max_depth))
        }
        (ModelFamily::TreeConditional, HyperPoint::Conditional { alpha, max_depth }) => {
            Box::new(ClassificationTree::conditional(*alpha, *max_depth))
        }
        (
            ModelFamily::Forest,
            HyperPoint::Forest {
                n_trees,
                mtry,
                min_leaf,
            },
        ) => Box::new(RandomForest::new(*n_trees, *mtry, *min_leaf, seed)),
        (
            ModelFamily::Boost,
            HyperPoint::Boost {
                n_trees,
                depth,
                learning_rate,
            },
        ) => Box::new(GradientBoost::new(*n_trees, *depth, *learning_rate)),
        (family, point) => panic!(
            "grid point {:?} does not belong to family {}",
            point,
            family.name()
        ),
    }
}

/// The full hyperparameter grid for a family, simplest point first.
pub fn grid_for(family: ModelFamily, n_features: usize) -> Vec<HyperPoint> {
    use crate::models::grid;
    match family {
        ModelFamily::Baseline => vec![HyperPoint::Baseline],
        ModelFamily::Logistic => vec![HyperPoint::Logistic],
        ModelFamily::Lasso => grid::penalized_grid(1.0),
        ModelFamily::Ridge => grid::penalized_grid(0.0),
        ModelFamily::ElasticNet => grid::elastic_net_grid(),
        ModelFamily::Lda => vec![HyperPoint::Lda],
        ModelFamily::Knn => grid::knn_grid(),
        ModelFamily::TreeCart => grid::cart_grid(),
        ModelFamily::TreeConditional => grid::conditional_grid(),
        ModelFamily::Forest => grid::forest_grid(n_features),
        ModelFamily::Boost => grid::boost_grid(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Array2;

    #[test]
    fn factory_builds_every_family() {
        let x = Array2::from_shape_vec(
            (8, 2),
            vec![
                0.0, 1.0, 0.1, 0.9, 0.2, 0.8, 0.3, 0.7, 1.0, 0.0, 0.9, 0.1, 0.8, 0.2, 0.7, 0.3,
            ],
        )
        .unwrap();
        let y = vec![0u8, 0, 0, 0, 1, 1, 1, 1];

        for &family in ModelFamily::all() {
            let grid = grid_for(family, x.ncols());
            assert!(!grid.is_empty(), "{} has an empty grid", family.name());
            let mut model = build_model(family, &grid[0], &[], 3);
            if model.fit(&x, &y).is_ok() {
                assert_eq!(model.predict_proba(&x).len(), x.nrows());
            }
        }
    }
}
