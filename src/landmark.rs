use nalgebra::{Matrix3, Rotation3, Vector3};
use serde_derive::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transform::Transform;

/// Degrees of freedom of a landmark fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandmarkMode {
    /// Rotation and translation.
    RigidBody,
    /// Rotation, uniform scale and translation.
    Similarity,
}

/// Least-squares transform mapping `source[i]` onto `target[i]` (Umeyama's method).
///
/// # Arguments
///
/// * `source` - Source landmarks.
/// * `target` - Target landmarks, same length as `source`.
/// * `mode` - Whether the scale is estimated.
///
/// # Returns
///
/// The transform minimizing `sum |T(source[i]) - target[i]|^2`. Fails with
/// `InvalidInput` on mismatched or too few landmarks and with `Registration`
/// when the source landmarks have no spread.
pub fn fit_landmarks(
    source: &[Vector3<f32>],
    target: &[Vector3<f32>],
    mode: LandmarkMode,
) -> Result<Transform> {
    if source.len() != target.len() {
        return Err(Error::invalid_input(format!(
            "landmark count mismatch: {} source and {} target",
            source.len(),
            target.len()
        )));
    }
    if source.len() < 3 {
        return Err(Error::invalid_input(format!(
            "at least 3 landmarks are needed, got {}",
            source.len()
        )));
    }

    let count = source.len() as f64;
    let to_f64 = |v: &Vector3<f32>| -> Vector3<f64> { nalgebra::convert(*v) };

    let source_mean = source.iter().map(to_f64).sum::<Vector3<f64>>() / count;
    let target_mean = target.iter().map(to_f64).sum::<Vector3<f64>>() / count;

    let mut covariance = Matrix3::<f64>::zeros();
    let mut source_variance = 0.0;
    for (s, t) in source.iter().zip(target.iter()) {
        let s = to_f64(s) - source_mean;
        let t = to_f64(t) - target_mean;
        covariance += t * s.transpose();
        source_variance += s.norm_squared();
    }
    covariance /= count;
    source_variance /= count;

    let target_scale = target_mean.norm().max(source_mean.norm()).max(1.0);
    if source_variance <= f64::EPSILON * target_scale * target_scale {
        return Err(Error::registration(
            "source landmarks collapse to a single point",
        ));
    }

    let svd = covariance.svd(true, true);
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => return Err(Error::registration("landmark SVD did not converge")),
    };

    let mut correction = Vector3::new(1.0, 1.0, 1.0);
    if u.determinant() * v_t.determinant() < 0.0 {
        correction[2] = -1.0;
    }
    let rotation = u * Matrix3::from_diagonal(&correction) * v_t;

    let scale = match mode {
        LandmarkMode::RigidBody => 1.0,
        LandmarkMode::Similarity => {
            svd.singular_values.component_mul(&correction).sum() / source_variance
        }
    };
    if !(scale.is_finite() && scale > 0.0) {
        return Err(Error::registration(format!(
            "invalid landmark scale {scale}"
        )));
    }

    let translation = target_mean - rotation * source_mean * scale;
    let transform = Transform::from_parts(
        &nalgebra::convert(translation),
        &Rotation3::from_matrix_unchecked(nalgebra::convert(rotation)),
        scale as f32,
    );

    if transform.is_finite() {
        Ok(transform)
    } else {
        Err(Error::registration("landmark transform is not finite"))
    }
}
