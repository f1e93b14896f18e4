use crate::transform::Transform;

/// Metrics for comparing two transforms.
#[derive(Clone, Debug, Default)]
pub struct TransformMetrics {
    /// Angle between the two transforms in radians.
    pub angle: f32,
    /// Translation vector size between the two transforms.
    pub translation: f32,
    /// Ratio between the scales of the two transforms.
    pub scale: f32,
}

impl TransformMetrics {
    /// Creates a new `TransformMetrics` from two transforms.
    pub fn new(lfs: &Transform, rhs: &Transform) -> Self {
        let lfs_inv = lfs.inverse();
        let diff = &lfs_inv * rhs;

        Self {
            angle: diff.angle(),
            translation: diff.translation().norm(),
            scale: diff.scale(),
        }
    }

    /// How far a transform is from the identity.
    pub fn magnitude(transform: &Transform) -> Self {
        Self::new(&Transform::eye(), transform)
    }

    /// Returns the total error of the two transforms.
    pub fn total(&self) -> f32 {
        self.angle + self.translation + (self.scale - 1.0).abs()
    }
}

impl std::fmt::Display for TransformMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "angle: {:.2}°, translation: {:.5}, scale: {:.5}",
            self.angle.to_degrees(),
            self.translation,
            self.scale
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use nalgebra::{Quaternion, Rotation3, UnitQuaternion, Vector3};

    use super::*;

    #[test]
    fn test_transform_metrics() {
        let sample0 = Transform::new(
            &Vector3::new(0.00022050377, 7.3633055e-5, -1.51071e-5),
            &UnitQuaternion::from_quaternion(Quaternion::new(
                2.059626e-5,
                0.00888227,
                0.0008264509,
                0.99996024,
            )),
        );
        let sample1 = sample0.clone();

        let metrics = TransformMetrics::new(&sample0, &sample1);

        assert_abs_diff_eq!(metrics.angle, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(metrics.translation, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(metrics.total(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_magnitude() {
        let transform = Transform::from_parts(
            &Vector3::new(3.0, 0.0, 4.0),
            &Rotation3::from_axis_angle(&Vector3::y_axis(), std::f32::consts::FRAC_PI_2),
            2.0,
        );
        let metrics = TransformMetrics::magnitude(&transform);
        assert_abs_diff_eq!(metrics.angle, std::f32::consts::FRAC_PI_2, epsilon = 1e-5);
        assert_abs_diff_eq!(metrics.translation, 5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(metrics.scale, 2.0, epsilon = 1e-6);
        assert!(format!("{metrics}").starts_with("angle: 90.00°"));
    }
}
