use itertools::izip;
use log::debug;
use nalgebra::Vector3;

use super::icp_params::{IcpParams, MeanDistanceMode};
use crate::{
    error::{Error, Result},
    kdtree::KdTree,
    landmark::fit_landmarks,
    pointcloud::PointCloud,
    transform::Transform,
};

/// Outcome of an ICP run.
#[derive(Debug, Clone)]
pub struct IcpResult {
    /// Transform taking the source onto the target.
    pub transform: Transform,
    /// Number of fitted iterations.
    pub iterations: usize,
    /// Mean landmark displacement of the last iteration, infinite if never measured.
    pub mean_distance: f32,
    /// Whether the landmark displacement fell to `max_mean_distance`.
    pub converged: bool,
}

/// Iterative Closest Point (ICP) algorithm for aligning two point clouds.
/// This implementation uses the point-to-point distance on a subset of
/// source landmarks.
pub struct Icp<'target_lt> {
    // Parameters of the ICP algorithm.
    pub params: IcpParams,
    target: &'target_lt PointCloud,
    kdtree: KdTree,
}

impl<'target_lt> Icp<'target_lt> {
    /// Create a new ICP instance.
    ///
    /// # Arguments
    ///
    /// * params - Parameters of the ICP algorithm.
    /// * target - Target point cloud.
    pub fn new(params: IcpParams, target: &'target_lt PointCloud) -> Result<Self> {
        target.ensure_not_empty("ICP target")?;
        if params.max_landmarks == 0 {
            return Err(Error::invalid_input("ICP needs at least one landmark"));
        }
        Ok(Self {
            params,
            target,
            kdtree: KdTree::new(&target.points.view()),
        })
    }

    /// Evenly strided subset of at most `max_landmarks` source points.
    fn landmarks(&self, source: &PointCloud) -> Vec<Vector3<f32>> {
        let count = self.params.max_landmarks.min(source.len());
        let step = (source.len() / count.max(1)).max(1);
        source.points.iter().step_by(step).take(count).copied().collect()
    }

    /// How far the landmarks moved in one iteration.
    fn mean_distance(&self, before: &[Vector3<f32>], after: &[Vector3<f32>]) -> f32 {
        let count = before.len().max(1) as f32;
        match self.params.mean_distance_mode {
            MeanDistanceMode::Rms => {
                let sum_sqr = izip!(before, after)
                    .map(|(b, a)| (a - b).norm_squared())
                    .sum::<f32>();
                (sum_sqr / count).sqrt()
            }
            MeanDistanceMode::AbsoluteValue => {
                izip!(before, after).map(|(b, a)| (a - b).norm()).sum::<f32>() / count
            }
        }
    }

    /// Aligns the source point cloud to the target point cloud.
    ///
    /// # Arguments
    ///
    /// * source - Source point cloud.
    ///
    /// # Returns
    ///
    /// The transformation that aligns the source point cloud to the target point cloud.
    pub fn align(&self, source: &PointCloud) -> Result<IcpResult> {
        source.ensure_not_empty("ICP source")?;

        let mut landmarks = self.landmarks(source);
        let mut accumulated = Transform::eye();
        if self.params.start_by_matching_centroids {
            if let (Some(source_centroid), Some(target_centroid)) =
                (source.centroid(), self.target.centroid())
            {
                accumulated = Transform::from_translation(&(target_centroid - source_centroid));
                landmarks
                    .iter_mut()
                    .for_each(|point| *point = accumulated.transform_vector(point));
            }
        }

        let mut matched = Vec::with_capacity(landmarks.len());
        let mut previous = Vec::with_capacity(landmarks.len());
        let mut mean_distance = f32::INFINITY;
        let mut iterations = 0;
        let mut converged = false;
        loop {
            matched.clear();
            for point in landmarks.iter() {
                let (index, _) = self
                    .kdtree
                    .nearest(point)
                    .ok_or_else(|| Error::invalid_input("ICP target is empty"))?;
                matched.push(self.target.points[index]);
            }

            let step = fit_landmarks(&landmarks, &matched, self.params.mode)?;
            accumulated = &step * &accumulated;
            iterations += 1;

            if iterations >= self.params.max_iterations {
                break;
            }

            previous.clone_from(&landmarks);
            landmarks
                .iter_mut()
                .for_each(|point| *point = step.transform_vector(point));
            if self.params.check_mean_distance {
                mean_distance = self.mean_distance(&previous, &landmarks);
                debug!("ICP iteration {iterations}: mean distance {mean_distance}");
                if !mean_distance.is_finite() {
                    return Err(Error::registration(format!(
                        "ICP mean distance became {mean_distance}"
                    )));
                }
                if mean_distance <= self.params.max_mean_distance {
                    converged = true;
                    break;
                }
            }
        }

        if !accumulated.is_finite() {
            return Err(Error::registration("ICP produced a non finite transform"));
        }

        Ok(IcpResult {
            transform: accumulated,
            iterations,
            mean_distance,
            converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    use crate::{
        metrics::TransformMetrics,
        unit_test::{ellipsoid, random_cloud, sample_ellipsoid},
    };
    use nalgebra::UnitQuaternion;

    /// Test the ICP algorithm.
    #[rstest]
    fn test_icp(sample_ellipsoid: PointCloud) {
        let target_pcl = sample_ellipsoid;
        let gt_transform = Transform::new(
            &Vector3::new(0.05, -0.03, 0.02),
            &UnitQuaternion::from_euler_angles(0.04, -0.03, 0.05),
        );
        let source_pcl = &gt_transform.inverse() * &target_pcl;

        let result = Icp::new(IcpParams::default(), &target_pcl)
            .unwrap()
            .align(&source_pcl)
            .unwrap();

        assert!(result.iterations > 1);
        let metrics = TransformMetrics::new(&result.transform, &gt_transform);
        assert!(metrics.angle.abs() < 0.01, "{metrics}");
        assert!(metrics.translation < 0.01, "{metrics}");
    }

    #[rstest]
    fn test_identity_converges_at_once(sample_ellipsoid: PointCloud) {
        let result = Icp::new(IcpParams::default(), &sample_ellipsoid)
            .unwrap()
            .align(&sample_ellipsoid)
            .unwrap();
        assert!(result.converged);
        assert_eq!(result.iterations, 1);
        assert!(result.mean_distance < 1e-5);
    }

    #[rstest]
    fn test_stops_at_max_iterations(sample_ellipsoid: PointCloud) {
        let source = &Transform::new(
            &Vector3::new(0.3, 0.0, 0.0),
            &UnitQuaternion::from_euler_angles(0.2, 0.0, 0.0),
        ) * &sample_ellipsoid;
        let mut params = IcpParams::default();
        params.max_iterations(2);

        let result = Icp::new(params, &sample_ellipsoid)
            .unwrap()
            .align(&source)
            .unwrap();
        assert_eq!(result.iterations, 2);
        assert!(!result.converged);
    }

    #[test]
    fn test_landmark_subsampling() {
        let target = PointCloud::from_points((0..10).map(|i| Vector3::new(i as f32, 0.0, 0.0)));
        let mut params = IcpParams::default();
        params.max_landmarks(3);
        let icp = Icp::new(params, &target).unwrap();

        let source = PointCloud::from_points((0..250).map(|i| Vector3::new(i as f32, 0.0, 0.0)));
        let landmarks = icp.landmarks(&source);
        assert_eq!(landmarks.len(), 3);
        assert_eq!(landmarks[1], Vector3::new(83.0, 0.0, 0.0));

        let small = PointCloud::from_points((0..2).map(|i| Vector3::new(i as f32, 0.0, 0.0)));
        assert_eq!(icp.landmarks(&small).len(), 2);
    }

    #[rstest]
    #[case(101)]
    #[case(150)]
    #[case(199)]
    #[case(250)]
    fn test_landmarks_never_exceed_default(#[case] n: usize) {
        let target = random_cloud(1, 10);
        let icp = Icp::new(IcpParams::default(), &target).unwrap();
        let landmarks = icp.landmarks(&random_cloud(2, n));
        assert_eq!(landmarks.len(), 100);
    }

    #[test]
    fn test_converges_between_different_samplings() {
        let target = ellipsoid(1, 500);
        let source = &Transform::from_translation(&Vector3::new(0.05, 0.0, 0.0))
            * &ellipsoid(2, 500);

        let result = Icp::new(IcpParams::default(), &target)
            .unwrap()
            .align(&source)
            .unwrap();
        assert!(result.converged);
        assert!(result.iterations < 500);
        assert!(result.mean_distance <= 1e-5);
    }

    #[test]
    fn test_empty_inputs() {
        let empty = PointCloud::from_points(Vec::new());
        assert!(matches!(
            Icp::new(IcpParams::default(), &empty),
            Err(Error::InvalidInput(_))
        ));
    }
}
