use log::{info, warn};
use nalgebra::{Unit, Vector3};
use serde_derive::{Deserialize, Serialize};

use crate::bounds::{ObbTree, OrientedBox};
use crate::error::{Error, Result};
use crate::hausdorff::DistanceEvaluator;
use crate::landmark::{fit_landmarks, LandmarkMode};
use crate::pointcloud::PointCloud;
use crate::transform::Transform;

/// Boxes with fewer points are not split when building the tree.
const MIN_TREE_POINTS: usize = 4;

/// Axis of a candidate rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationAxis {
    X,
    Y,
    Z,
}

impl RotationAxis {
    pub const ALL: [RotationAxis; 3] = [RotationAxis::X, RotationAxis::Y, RotationAxis::Z];

    pub fn unit(self) -> Unit<Vector3<f32>> {
        match self {
            RotationAxis::X => Vector3::x_axis(),
            RotationAxis::Y => Vector3::y_axis(),
            RotationAxis::Z => Vector3::z_axis(),
        }
    }
}

impl std::fmt::Display for RotationAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Bounding box alignment parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxAlignParams {
    /// Levels of the box tree built on each set. Only its root is used.
    pub max_level: usize,
    /// Degrees of freedom of the landmark fit.
    pub mode: LandmarkMode,
    /// Rotations, in degrees, tried about each axis.
    pub angles: Vec<f32>,
}

impl Default for BoxAlignParams {
    fn default() -> Self {
        Self {
            max_level: 1,
            mode: LandmarkMode::Similarity,
            angles: vec![0.0, 90.0, 180.0, 270.0],
        }
    }
}

impl BoxAlignParams {
    pub fn max_level(&'_ mut self, value: usize) -> &'_ mut BoxAlignParams {
        self.max_level = value;
        self
    }

    pub fn mode(&'_ mut self, value: LandmarkMode) -> &'_ mut BoxAlignParams {
        self.mode = value;
        self
    }

    pub fn angles(&'_ mut self, value: Vec<f32>) -> &'_ mut BoxAlignParams {
        self.angles = value;
        self
    }
}

/// One tested rotation of the source box.
#[derive(Debug, Clone)]
pub struct AlignmentCandidate {
    pub axis: RotationAxis,
    pub angle_deg: f32,
    /// Fitted transform, `None` when the fit failed.
    pub transform: Option<Transform>,
    /// Hausdorff distance to the target, `None` when it could not be measured.
    pub distance: Option<f32>,
}

impl AlignmentCandidate {
    pub fn is_valid(&self) -> bool {
        self.transform.is_some() && self.distance.is_some()
    }
}

impl std::fmt::Display for AlignmentCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.distance {
            Some(distance) => write!(f, "testDistance: {distance}")?,
            None => write!(f, "testDistance: invalid")?,
        }
        write!(f, " (axis {}, {}°)", self.axis, self.angle_deg)
    }
}

/// What the bounding box alignment tried and applied.
#[derive(Debug, Clone)]
pub struct BoxAlignment {
    pub candidates: Vec<AlignmentCandidate>,
    /// Index of the applied candidate.
    pub selected: usize,
    /// Transform applied to the source.
    pub transform: Transform,
    /// Distance of the source to the target after the alignment.
    pub distance: f32,
}

/// Coarse alignment of a source onto a target by matching their oriented
/// bounding boxes under a set of axis rotations.
pub struct BoxAligner {
    pub params: BoxAlignParams,
}

impl Default for BoxAligner {
    fn default() -> Self {
        Self::new(BoxAlignParams::default())
    }
}

impl BoxAligner {
    pub fn new(params: BoxAlignParams) -> Self {
        Self { params }
    }

    fn bounding_box(&self, cloud: &PointCloud, what: &str) -> Result<OrientedBox> {
        let tree = ObbTree::build(&cloud.points.view(), self.params.max_level, MIN_TREE_POINTS)?;
        let obb = tree
            .representation(0)
            .into_iter()
            .next()
            .ok_or_else(|| Error::registration(format!("no bounding box for the {what}")))?;
        if obb.is_degenerate() {
            return Err(Error::registration(format!(
                "the {what} bounding box is degenerate, extents: {:?}",
                obb.extents().as_slice()
            )));
        }
        Ok(obb)
    }

    /// Aligns `source` onto `target`, modifying `source` in place.
    ///
    /// Every axis and angle pair is tried: the source box landmarks are
    /// rotated about their centre, a landmark transform onto the target box
    /// is fitted and applied to the whole source, and the result is scored
    /// with the Hausdorff distance. The candidate with the strictly smallest
    /// distance is applied, ties keep the earliest.
    ///
    /// # Returns
    ///
    /// The report of all candidates. Fails with `InvalidInput` on empty sets
    /// and with `Registration` on degenerate boxes or when no candidate
    /// could be evaluated.
    pub fn align(&self, source: &mut PointCloud, target: &PointCloud) -> Result<BoxAlignment> {
        source.ensure_not_empty("source")?;
        target.ensure_not_empty("target")?;
        if self.params.angles.is_empty() {
            return Err(Error::invalid_input("no candidate angles to test"));
        }

        let source_landmarks = self.bounding_box(source, "source")?.landmarks();
        let target_landmarks = self.bounding_box(target, "target")?.landmarks();
        let center = source_landmarks.iter().sum::<Vector3<f32>>() / source_landmarks.len() as f32;

        let evaluator = DistanceEvaluator::new(target)?;
        let mut candidates = Vec::with_capacity(RotationAxis::ALL.len() * self.params.angles.len());
        for axis in RotationAxis::ALL {
            for angle_deg in self.params.angles.iter().copied() {
                let rotation = Transform::rotation_about(&axis.unit(), angle_deg.to_radians(), &center);
                let rotated = source_landmarks
                    .iter()
                    .map(|landmark| &rotation * landmark)
                    .collect::<Vec<_>>();

                let outcome = fit_landmarks(&rotated, &target_landmarks, self.params.mode)
                    .and_then(|transform| {
                        let distance = evaluator.evaluate(&(&transform * &*source))?;
                        Ok((transform, distance.value()))
                    });

                let candidate = match outcome {
                    Ok((transform, distance)) => AlignmentCandidate {
                        axis,
                        angle_deg,
                        transform: Some(transform),
                        distance: Some(distance),
                    },
                    Err(err) => {
                        warn!("Candidate axis {axis}, {angle_deg}° is invalid: {err}");
                        AlignmentCandidate {
                            axis,
                            angle_deg,
                            transform: None,
                            distance: None,
                        }
                    }
                };
                info!("{candidate}");
                candidates.push(candidate);
            }
        }

        let mut best: Option<(usize, f32, &Transform)> = None;
        for (index, candidate) in candidates.iter().enumerate() {
            if let (Some(transform), Some(distance)) = (&candidate.transform, candidate.distance) {
                if best.map_or(true, |(_, best_distance, _)| distance < best_distance) {
                    best = Some((index, distance, transform));
                }
            }
        }
        let (selected, distance, transform) = best
            .map(|(index, distance, transform)| (index, distance, transform.clone()))
            .ok_or_else(|| Error::registration("every bounding box candidate failed"))?;

        source.transform_mut(&transform);
        info!(
            "Bounding box alignment selected axis {}, {}°: distance {distance}",
            candidates[selected].axis, candidates[selected].angle_deg
        );

        Ok(BoxAlignment {
            candidates,
            selected,
            transform,
            distance,
        })
    }
}
