use nalgebra::Vector3;
use ndarray::prelude::*;

use crate::error::{Error, Result};

/// Generic representation of attributes found in 3D model/object/geometry files.
#[derive(Clone, Debug)]
pub struct Geometry {
    /// The 3D points.
    pub points: Array1<Vector3<f32>>,
    /// Per vertices normals.
    pub normals: Option<Array1<Vector3<f32>>>,
    /// The indices to conect vertices that make faces in the geometry.
    /// Shape is (Nx3), we always convert to triangles.
    pub faces: Option<Array2<usize>>,
}

impl Geometry {
    pub fn len_vertices(&self) -> usize {
        self.points.len()
    }

    pub fn len_faces(&self) -> usize {
        self.faces.as_ref().map(|faces| faces.nrows()).unwrap_or(0)
    }
}

/// Accumulates vertices and polygons while parsing, polygons are fan triangulated.
#[derive(Default)]
pub struct GeometryBuilder {
    points: Vec<Vector3<f32>>,
    normals: Vec<Vector3<f32>>,
    faces: Vec<usize>,
}

impl GeometryBuilder {
    pub fn add_point(&mut self, point: Vector3<f32>) -> &mut Self {
        self.points.push(point);
        self
    }

    pub fn add_normal(&mut self, normal: Vector3<f32>) -> &mut Self {
        self.normals.push(normal);
        self
    }

    /// Adds a polygon. Polygons with less than 3 vertices are skipped.
    pub fn add_polygon(&mut self, polygon: &[usize]) -> &mut Self {
        for k in 1..polygon.len().saturating_sub(1) {
            self.faces.extend([polygon[0], polygon[k], polygon[k + 1]]);
        }
        self
    }

    /// Adds a triangle strip, flipping every other triangle to keep the winding.
    pub fn add_strip(&mut self, strip: &[usize]) -> &mut Self {
        for (k, window) in strip.windows(3).enumerate() {
            if k % 2 == 0 {
                self.add_polygon(window);
            } else {
                self.add_polygon(&[window[1], window[0], window[2]]);
            }
        }
        self
    }

    pub fn len_vertices(&self) -> usize {
        self.points.len()
    }

    /// Builds the geometry, checking that every face index is valid.
    pub fn build(self) -> Result<Geometry> {
        let num_vertices = self.points.len();
        if let Some(index) = self.faces.iter().find(|index| **index >= num_vertices) {
            return Err(Error::parser(format!(
                "face index {index} is out of range, there are {num_vertices} vertices"
            )));
        }

        let normals = if !self.normals.is_empty() && self.normals.len() == num_vertices {
            Some(Array1::from_vec(self.normals))
        } else {
            None
        };
        let faces = if self.faces.is_empty() {
            None
        } else {
            let num_faces = self.faces.len() / 3;
            Some(
                Array2::from_shape_vec((num_faces, 3), self.faces)
                    .map_err(Error::parser)?,
            )
        };

        Ok(Geometry {
            points: Array1::from_vec(self.points),
            normals,
            faces,
        })
    }
}
