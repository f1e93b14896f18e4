use nalgebra::Vector3;
use ordered_float::OrderedFloat;

use crate::error::{Error, Result};
use crate::kdtree::KdTree;
use crate::pointcloud::PointCloud;

/// Point-to-point Hausdorff distance between a target and a candidate set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HausdorffDistance {
    /// Largest distance from a target point to its closest candidate point.
    pub target_to_candidate: f32,
    /// Largest distance from a candidate point to its closest target point.
    pub candidate_to_target: f32,
}

impl HausdorffDistance {
    /// The symmetric distance, max of both directions.
    pub fn value(&self) -> f32 {
        self.target_to_candidate.max(self.candidate_to_target)
    }
}

impl std::fmt::Display for HausdorffDistance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.6} (target->candidate: {:.6}, candidate->target: {:.6})",
            self.value(),
            self.target_to_candidate,
            self.candidate_to_target
        )
    }
}

/// Scores candidate alignments against a fixed target.
///
/// The target is borrowed for the lifetime of the evaluator, so its search
/// tree cannot go stale. The candidate side is rebuilt on every call.
pub struct DistanceEvaluator<'target> {
    target: &'target PointCloud,
    target_tree: KdTree,
}

impl<'target> DistanceEvaluator<'target> {
    /// Create a new evaluator.
    ///
    /// # Arguments
    ///
    /// * target - The fixed point set, must not be empty.
    pub fn new(target: &'target PointCloud) -> Result<Self> {
        target.ensure_not_empty("target")?;
        Ok(Self {
            target,
            target_tree: KdTree::new(&target.points.view()),
        })
    }

    /// Hausdorff distance between the target and `candidate`.
    pub fn evaluate(&self, candidate: &PointCloud) -> Result<HausdorffDistance> {
        candidate.ensure_not_empty("candidate")?;
        let candidate_tree = KdTree::new(&candidate.points.view());

        let distance = HausdorffDistance {
            target_to_candidate: max_closest_distance(self.target.points.iter(), &candidate_tree)?,
            candidate_to_target: max_closest_distance(candidate.points.iter(), &self.target_tree)?,
        };

        if distance.value().is_finite() {
            Ok(distance)
        } else {
            Err(Error::registration(format!(
                "non finite Hausdorff distance: {distance}"
            )))
        }
    }
}

fn max_closest_distance<'a, I>(queries: I, tree: &KdTree) -> Result<f32>
where
    I: Iterator<Item = &'a Vector3<f32>>,
{
    let mut max_sqr_distance = OrderedFloat(0.0f32);
    for query in queries {
        let (_, sqr_distance) = tree
            .nearest(query)
            .ok_or_else(|| Error::invalid_input("nearest neighbor query on empty set"))?;
        if sqr_distance.is_nan() {
            return Err(Error::registration("NaN point found while measuring distance"));
        }
        max_sqr_distance = max_sqr_distance.max(OrderedFloat(sqr_distance));
    }
    Ok(max_sqr_distance.0.sqrt())
}

/// Hausdorff distance for one-off comparisons.
pub fn hausdorff_distance(target: &PointCloud, candidate: &PointCloud) -> Result<HausdorffDistance> {
    DistanceEvaluator::new(target)?.evaluate(candidate)
}
