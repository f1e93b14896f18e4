use std::path::Path;

use log::info;
use ordered_float::OrderedFloat;
use serde_derive::{Deserialize, Serialize};

use crate::align::{BoxAligner, BoxAlignParams, BoxAlignment};
use crate::error::{Error, Result};
use crate::hausdorff::DistanceEvaluator;
use crate::icp::{Icp, IcpParams, IcpResult};
use crate::pointcloud::PointCloud;
use crate::transform::Transform;

/// Parameters of both registration stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationParams {
    pub box_align: BoxAlignParams,
    pub icp: IcpParams,
}

impl RegistrationParams {
    /// Loads the parameters from a JSON file, missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|err| {
            Error::invalid_input(format!("{}: invalid parameters: {err}", path.display()))
        })
    }
}

/// Which of the three candidate alignments was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The source as given.
    Original,
    /// The oriented bounding box alignment.
    BoundingBox,
    /// The bounding box alignment refined with ICP.
    Icp,
}

impl Strategy {
    /// Picks the strategy of the smallest distance. Ties favor the earlier
    /// stage: original, then bounding box, then ICP.
    pub fn select(original: f32, aligned: f32, refined: f32) -> (Strategy, f32) {
        let min = [original, aligned, refined]
            .into_iter()
            .map(OrderedFloat)
            .min()
            .map_or(original, |min| min.0);
        let strategy = if min == original {
            Strategy::Original
        } else if min == aligned {
            Strategy::BoundingBox
        } else {
            Strategy::Icp
        };
        (strategy, min)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Original => write!(f, "Using original alignment"),
            Strategy::BoundingBox => write!(f, "Using alignment by OBB"),
            Strategy::Icp => write!(f, "Using alignment by ICP"),
        }
    }
}

/// Result of a registration run.
#[derive(Debug, Clone)]
pub struct RegistrationReport {
    /// Distance of the original source to the target.
    pub distance_before: f32,
    /// Distance after the bounding box alignment.
    pub distance_aligned: f32,
    /// Distance after ICP.
    pub distance_refined: f32,
    pub min_distance: f32,
    pub strategy: Strategy,
    /// The source moved by the selected strategy.
    pub aligned: PointCloud,
    /// Transform from the original source to `aligned`.
    pub transform: Transform,
    pub box_alignment: BoxAlignment,
    /// False when the bounding box alignment made things worse and ICP
    /// started from the original source.
    pub box_alignment_kept: bool,
    pub icp: IcpResult,
}

impl RegistrationReport {
    /// The `Distance before, after align, after ICP, min` summary line.
    pub fn distances_line(&self) -> String {
        format!(
            "Distance before, after align, after ICP, min: {}, {}, {}, {}",
            self.distance_before, self.distance_aligned, self.distance_refined, self.min_distance
        )
    }
}

/// Coarse to fine registration: bounding box alignment, then ICP, keeping
/// whichever of the original, aligned or refined source is closest to the
/// target.
#[derive(Default)]
pub struct Registration {
    pub params: RegistrationParams,
}

impl Registration {
    pub fn new(params: RegistrationParams) -> Self {
        Self { params }
    }

    /// Registers `source` onto `target`.
    ///
    /// # Arguments
    ///
    /// * `source` - The set to move, owned by the registration.
    /// * `target` - The fixed set.
    ///
    /// # Returns
    ///
    /// The report with the selected aligned source. Empty sets are
    /// `InvalidInput`, numerical failures of any stage are `Registration`.
    pub fn run(&self, source: PointCloud, target: &PointCloud) -> Result<RegistrationReport> {
        let original = source.clone();
        let mut working = source;

        original.ensure_not_empty("source")?;
        let evaluator = DistanceEvaluator::new(target)?;

        let distance_before = evaluator.evaluate(&original)?.value();
        info!("Distance before alignment: {distance_before}");

        let box_alignment =
            BoxAligner::new(self.params.box_align.clone()).align(&mut working, target)?;
        let distance_aligned = evaluator.evaluate(&working)?.value();
        info!("Distance after bounding box alignment: {distance_aligned}");

        let box_alignment_kept = distance_aligned <= distance_before;
        let aligned_transform = if box_alignment_kept {
            box_alignment.transform.clone()
        } else {
            info!("Bounding box alignment increased the distance, ICP starts from the original source");
            working = original.clone();
            Transform::eye()
        };

        let icp = Icp::new(self.params.icp.clone(), target)?.align(&working)?;
        let refined = &icp.transform * &working;
        let distance_refined = evaluator.evaluate(&refined)?.value();
        info!(
            "Distance after ICP: {distance_refined} ({} iterations, converged: {})",
            icp.iterations, icp.converged
        );

        let (strategy, min_distance) =
            Strategy::select(distance_before, distance_aligned, distance_refined);
        let (aligned, transform) = match strategy {
            Strategy::Original => (original, Transform::eye()),
            Strategy::BoundingBox => (working, aligned_transform),
            Strategy::Icp => {
                let transform = &icp.transform * &aligned_transform;
                (refined, transform)
            }
        };
        info!("{strategy}");

        Ok(RegistrationReport {
            distance_before,
            distance_aligned,
            distance_refined,
            min_distance,
            strategy,
            aligned,
            transform,
            box_alignment,
            box_alignment_kept,
            icp,
        })
    }
}
