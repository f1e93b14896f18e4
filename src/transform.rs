use nalgebra::{
    Matrix4, Point3, Rotation3, Similarity3, Translation3, Unit, UnitQuaternion, Vector3,
};

use std::ops;

/// Similarity transform: rotation, uniform scale and translation.
/// Rigid transforms are the ones with scale `1`.
///
/// Applying `&a * &b` to a point applies `b` first.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform(Similarity3<f32>);

impl Default for Transform {
    fn default() -> Self {
        Self::eye()
    }
}

impl Transform {
    /// Identity transform.
    pub fn eye() -> Self {
        Self(Similarity3::identity())
    }

    /// Creates a rigid transform from a translation and a rotation.
    pub fn new(translation: &Vector3<f32>, rotation: &UnitQuaternion<f32>) -> Self {
        Self(Similarity3::from_parts(
            Translation3::from(*translation),
            *rotation,
            1.0,
        ))
    }

    /// Creates a transform from its parts. It computes `scale * rotation * p + translation`.
    ///
    /// # Arguments
    ///
    /// * `translation` - Translation applied last.
    /// * `rotation` - Rotation matrix, must be orthonormal.
    /// * `scale` - Uniform scale, must be positive.
    pub fn from_parts(translation: &Vector3<f32>, rotation: &Rotation3<f32>, scale: f32) -> Self {
        Self(Similarity3::from_parts(
            Translation3::from(*translation),
            UnitQuaternion::from_rotation_matrix(rotation),
            scale,
        ))
    }

    /// Pure translation.
    pub fn from_translation(translation: &Vector3<f32>) -> Self {
        Self::new(translation, &UnitQuaternion::identity())
    }

    /// Rotation of `angle` radians about `axis` passing through `center`.
    pub fn rotation_about(axis: &Unit<Vector3<f32>>, angle: f32, center: &Vector3<f32>) -> Self {
        let rotation = UnitQuaternion::from_axis_angle(axis, angle);
        let translation = center - rotation * center;
        Self::new(&translation, &rotation)
    }

    /// Transforms a point.
    pub fn transform_vector(&self, vector: &Vector3<f32>) -> Vector3<f32> {
        self.0.transform_point(&Point3::from(*vector)).coords
    }

    /// Rotates a normal, scale and translation are ignored.
    pub fn transform_normal(&self, normal: &Vector3<f32>) -> Vector3<f32> {
        self.0.isometry.rotation * normal
    }

    pub fn inverse(&self) -> Self {
        Self(self.0.inverse())
    }

    pub fn scale(&self) -> f32 {
        self.0.scaling()
    }

    pub fn rotation(&self) -> UnitQuaternion<f32> {
        self.0.isometry.rotation
    }

    /// Rotation angle in radians.
    pub fn angle(&self) -> f32 {
        self.0.isometry.rotation.angle()
    }

    pub fn translation(&self) -> Vector3<f32> {
        self.0.isometry.translation.vector
    }

    /// Whether every coefficient is finite. Degenerate fits produce NaNs.
    pub fn is_finite(&self) -> bool {
        self.0.to_homogeneous().iter().all(|v| v.is_finite())
    }
}

impl ops::Mul<&Vector3<f32>> for &Transform {
    type Output = Vector3<f32>;

    fn mul(self, rhs: &Vector3<f32>) -> Self::Output {
        self.transform_vector(rhs)
    }
}

impl ops::Mul<&Transform> for &Transform {
    type Output = Transform;

    fn mul(self, rhs: &Transform) -> Self::Output {
        Transform(self.0 * rhs.0)
    }
}

impl From<Transform> for Matrix4<f32> {
    fn from(transform: Transform) -> Self {
        transform.0.to_homogeneous()
    }
}

impl std::fmt::Display for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let t = self.translation();
        write!(
            f,
            "rotation: {:.2}°, scale: {:.5}, translation: [{:.5}, {:.5}, {:.5}]",
            self.angle().to_degrees(),
            self.scale(),
            t[0],
            t[1],
            t[2]
        )
    }
}
