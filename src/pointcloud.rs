use nalgebra::Vector3;
use ndarray::{Array1, Array2};

use crate::error::{Error, Result};
use crate::io::Geometry;
use crate::transform::Transform;

/// Point set used for alignment. Faces are carried along but never used by the
/// alignment itself.
#[derive(Clone, Debug)]
pub struct PointCloud {
    pub points: Array1<Vector3<f32>>,
    pub normals: Option<Array1<Vector3<f32>>>,
    pub faces: Option<Array2<usize>>,
}

impl PointCloud {
    pub fn from_geometry(geometry: Geometry) -> Self {
        Self {
            points: geometry.points,
            normals: geometry.normals,
            faces: geometry.faces,
        }
    }

    /// Point cloud without normals or faces.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Vector3<f32>>,
    {
        Self {
            points: points.into_iter().collect(),
            normals: None,
            faces: None,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mean of the points.
    pub fn centroid(&self) -> Option<Vector3<f32>> {
        if self.is_empty() {
            return None;
        }
        let sum = self
            .points
            .iter()
            .fold(Vector3::<f64>::zeros(), |accum, point| {
                let point: Vector3<f64> = nalgebra::convert(*point);
                accum + point
            });
        Some(nalgebra::convert(sum / self.len() as f64))
    }

    /// Returns `InvalidInput` for empty sets, naming the set with `what`.
    pub fn ensure_not_empty(&self, what: &str) -> Result<()> {
        if self.is_empty() {
            Err(Error::invalid_input(format!("{what} point set is empty")))
        } else {
            Ok(())
        }
    }

    /// Transforms the points and normals in place.
    pub fn transform_mut(&mut self, transform: &Transform) {
        self.points
            .iter_mut()
            .for_each(|point| *point = transform.transform_vector(point));
        if let Some(normals) = self.normals.as_mut() {
            normals
                .iter_mut()
                .for_each(|normal| *normal = transform.transform_normal(normal));
        }
    }
}

impl std::ops::Mul<&PointCloud> for &Transform {
    type Output = PointCloud;
    fn mul(self, rhs: &PointCloud) -> PointCloud {
        PointCloud {
            points: rhs.points.map(|point| self.transform_vector(point)),
            normals: rhs
                .normals
                .as_ref()
                .map(|normals| normals.map(|normal| self.transform_normal(normal))),
            faces: rhs.faces.clone(),
        }
    }
}

impl From<PointCloud> for Geometry {
    fn from(pcl: PointCloud) -> Geometry {
        Geometry {
            points: pcl.points,
            normals: pcl.normals,
            faces: pcl.faces,
        }
    }
}
