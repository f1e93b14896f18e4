use nalgebra::{Matrix3, SymmetricEigen, Vector3};

use crate::error::{Error, Result};

/// Relative gap under which two covariance eigenvalues are taken as equal.
const EIGEN_DEGENERACY: f64 = 1e-5;
/// Relative third moment under which an axis is taken as symmetric.
const SKEW_SYMMETRY: f64 = 1e-4;

/// Box aligned to the principal axes of a point set.
///
/// The frame is right-handed and built only from the point positions, so the
/// box of a rotated point set is the rotated box, with the same corner
/// ordering.
#[derive(Clone, Debug, PartialEq)]
pub struct OrientedBox {
    /// Corner with the minimum projection on every axis.
    pub corner: Vector3<f32>,
    /// Edges leaving `corner`, sorted by decreasing point variance.
    pub axes: [Vector3<f32>; 3],
}

impl OrientedBox {
    /// Computes the box of a point set.
    ///
    /// # Arguments
    ///
    /// * `points` - Iterator over the points, it is traversed several times.
    ///
    /// # Returns
    ///
    /// The box, or `InvalidInput` when there are no points.
    pub fn from_point_iter<'a, I>(points: I) -> Result<Self>
    where
        I: Iterator<Item = &'a Vector3<f32>> + Clone,
    {
        let mut count = 0usize;
        let sum = points.clone().fold(Vector3::<f64>::zeros(), |sum, point| {
            count += 1;
            let point: Vector3<f64> = nalgebra::convert(*point);
            sum + point
        });
        if count == 0 {
            return Err(Error::invalid_input(
                "cannot compute a bounding box without points",
            ));
        }
        let mean = sum / count as f64;

        let covariance = points.clone().fold(Matrix3::<f64>::zeros(), |cov, point| {
            let diff: Vector3<f64> = nalgebra::convert::<_, Vector3<f64>>(*point) - mean;
            cov + diff * diff.transpose()
        }) / count as f64;

        let frame = principal_frame(points.clone(), &mean, covariance);

        let mut min = Vector3::repeat(f64::INFINITY);
        let mut max = Vector3::repeat(f64::NEG_INFINITY);
        for point in points {
            let diff: Vector3<f64> = nalgebra::convert::<_, Vector3<f64>>(*point) - mean;
            for k in 0..3 {
                let proj = frame[k].dot(&diff);
                min[k] = min[k].min(proj);
                max[k] = max[k].max(proj);
            }
        }

        let corner = mean + frame[0] * min[0] + frame[1] * min[1] + frame[2] * min[2];
        Ok(Self {
            corner: nalgebra::convert(corner),
            axes: [0, 1, 2].map(|k| nalgebra::convert(frame[k] * (max[k] - min[k]))),
        })
    }

    pub fn center(&self) -> Vector3<f32> {
        self.corner + (self.axes[0] + self.axes[1] + self.axes[2]) * 0.5
    }

    /// Edge lengths, in axes order.
    pub fn extents(&self) -> Vector3<f32> {
        Vector3::new(self.axes[0].norm(), self.axes[1].norm(), self.axes[2].norm())
    }

    pub fn diagonal(&self) -> f32 {
        (self.axes[0] + self.axes[1] + self.axes[2]).norm()
    }

    /// A box is degenerate when it collapses to a point or a segment, it
    /// cannot determine an orientation then.
    pub fn is_degenerate(&self) -> bool {
        let diagonal = self.diagonal();
        if !diagonal.is_finite() || diagonal <= f32::EPSILON {
            return true;
        }
        self.extents()
            .iter()
            .filter(|extent| **extent > diagonal * 1e-5)
            .count()
            < 2
    }

    /// The 8 box corners: `c`, `c+a0`, `c+a1`, `c+a0+a1`, `c+a2`, `c+a0+a2`,
    /// `c+a1+a2`, `c+a0+a1+a2`.
    pub fn landmarks(&self) -> [Vector3<f32>; 8] {
        let [a0, a1, a2] = self.axes;
        let c = self.corner;
        [
            c,
            c + a0,
            c + a1,
            c + a0 + a1,
            c + a2,
            c + a0 + a2,
            c + a1 + a2,
            c + a0 + a1 + a2,
        ]
    }
}

/// Unit principal axes sorted by decreasing eigenvalue and made
/// independent of the eigen solver's arbitrary choices.
fn principal_frame<'a, I>(
    points: I,
    mean: &Vector3<f64>,
    covariance: Matrix3<f64>,
) -> [Vector3<f64>; 3]
where
    I: Iterator<Item = &'a Vector3<f32>> + Clone,
{
    let eigen = SymmetricEigen::new(covariance);
    let mut order = [0usize, 1, 2];
    order.sort_by(|a, b| {
        eigen.eigenvalues[*b]
            .partial_cmp(&eigen.eigenvalues[*a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let values = order.map(|k| eigen.eigenvalues[k]);
    let vectors = order.map(|k| eigen.eigenvectors.column(k).into_owned());

    let tolerance = values[0].abs().max(f64::MIN_POSITIVE) * EIGEN_DEGENERACY;
    let equal01 = values[0] - values[1] <= tolerance;
    let equal12 = values[1] - values[2] <= tolerance;

    match (equal01, equal12) {
        (true, true) => {
            let u0 = farthest_direction(points.clone(), mean, None).unwrap_or(vectors[0]);
            let u1 = farthest_direction(points, mean, Some(&u0))
                .unwrap_or_else(|| any_orthogonal(&u0));
            [u0, u1, u0.cross(&u1)]
        }
        (true, false) => {
            let u2 = orient_axis(points.clone(), mean, vectors[2]);
            let u0 = farthest_direction(points, mean, Some(&u2))
                .unwrap_or_else(|| any_orthogonal(&u2));
            [u0, u2.cross(&u0), u2]
        }
        (false, true) => {
            let u0 = orient_axis(points.clone(), mean, vectors[0]);
            let u1 = farthest_direction(points, mean, Some(&u0))
                .unwrap_or_else(|| any_orthogonal(&u0));
            [u0, u1, u0.cross(&u1)]
        }
        (false, false) => {
            let u0 = orient_axis(points.clone(), mean, vectors[0]);
            let u1 = orient_axis(points, mean, vectors[1]);
            [u0, u1, u0.cross(&u1)]
        }
    }
}

/// Flips `axis` so that the projections have a positive third moment. For
/// symmetric projections the farthest point decides.
fn orient_axis<'a, I>(points: I, mean: &Vector3<f64>, axis: Vector3<f64>) -> Vector3<f64>
where
    I: Iterator<Item = &'a Vector3<f32>> + Clone,
{
    let (moment, abs_moment) = points.clone().fold((0.0f64, 0.0f64), |(m, a), point| {
        let proj = axis.dot(&(nalgebra::convert::<_, Vector3<f64>>(*point) - mean));
        let cube = proj * proj * proj;
        (m + cube, a + cube.abs())
    });

    let positive = if moment.abs() > abs_moment * SKEW_SYMMETRY {
        moment > 0.0
    } else {
        points
            .map(|point| axis.dot(&(nalgebra::convert::<_, Vector3<f64>>(*point) - mean)))
            .fold(0.0f64, |best, proj| if proj.abs() > best.abs() { proj } else { best })
            >= 0.0
    };

    if positive {
        axis
    } else {
        -axis
    }
}

/// Unit direction of the point farthest from `mean`, after projecting out
/// `normal` when given.
fn farthest_direction<'a, I>(
    points: I,
    mean: &Vector3<f64>,
    normal: Option<&Vector3<f64>>,
) -> Option<Vector3<f64>>
where
    I: Iterator<Item = &'a Vector3<f32>>,
{
    let (best, best_norm) = points
        .map(|point| {
            let mut diff = nalgebra::convert::<_, Vector3<f64>>(*point) - mean;
            if let Some(normal) = normal {
                diff -= normal * normal.dot(&diff);
            }
            let norm = diff.norm_squared();
            (diff, norm)
        })
        .fold((Vector3::zeros(), 0.0f64), |best, current| {
            if current.1 > best.1 {
                current
            } else {
                best
            }
        });

    if best_norm > f64::EPSILON * f64::EPSILON {
        Some(best / best_norm.sqrt())
    } else {
        None
    }
}

fn any_orthogonal(axis: &Vector3<f64>) -> Vector3<f64> {
    let helper = if axis[0].abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    axis.cross(&helper).normalize()
}
