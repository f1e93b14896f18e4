use std::f32::consts::PI;

use nalgebra::Vector3;
use ndarray::{Array1, Array2};

use crate::io::Geometry;

/// Latitude/longitude tessellated sphere, with a vertex on each pole.
#[derive(Clone, Debug)]
pub struct SphereSource {
    pub radius: f32,
    pub center: Vector3<f32>,
    /// Number of points around the equator.
    pub theta_resolution: usize,
    /// Number of points from pole to pole, poles included.
    pub phi_resolution: usize,
}

impl Default for SphereSource {
    fn default() -> Self {
        Self {
            radius: 0.5,
            center: Vector3::zeros(),
            theta_resolution: 8,
            phi_resolution: 8,
        }
    }
}

impl SphereSource {
    pub fn radius(mut self, value: f32) -> Self {
        self.radius = value;
        self
    }

    pub fn center(mut self, value: Vector3<f32>) -> Self {
        self.center = value;
        self
    }

    pub fn resolution(mut self, theta: usize, phi: usize) -> Self {
        self.theta_resolution = theta;
        self.phi_resolution = phi;
        self
    }

    /// Generates the sphere vertices, outward normals and triangles.
    ///
    /// Points are ordered: north pole, south pole, then each meridian from
    /// north to south.
    pub fn generate(&self) -> Geometry {
        let theta_res = self.theta_resolution.max(3);
        let phi_res = self.phi_resolution.max(3);
        let ring_count = phi_res - 2;

        let mut normals = Vec::with_capacity(2 + theta_res * ring_count);
        normals.push(Vector3::z());
        normals.push(-Vector3::z());
        for i in 0..theta_res {
            let theta = 2.0 * PI * i as f32 / theta_res as f32;
            for j in 1..=ring_count {
                let phi = PI * j as f32 / (phi_res - 1) as f32;
                normals.push(Vector3::new(
                    phi.sin() * theta.cos(),
                    phi.sin() * theta.sin(),
                    phi.cos(),
                ));
            }
        }

        let index = |i: usize, j: usize| 2 + (i % theta_res) * ring_count + (j - 1);
        let mut faces = Vec::with_capacity(theta_res * 2 * (ring_count - 1) * 3 + theta_res * 6);
        for i in 0..theta_res {
            faces.extend([0, index(i, 1), index(i + 1, 1)]);
            for j in 1..ring_count {
                let (a, b) = (index(i, j), index(i, j + 1));
                let (c, d) = (index(i + 1, j + 1), index(i + 1, j));
                faces.extend([a, b, c, a, c, d]);
            }
            faces.extend([1, index(i + 1, ring_count), index(i, ring_count)]);
        }

        let points = normals
            .iter()
            .map(|normal| self.center + normal * self.radius)
            .collect::<Array1<_>>();
        let num_faces = faces.len() / 3;
        Geometry {
            points,
            normals: Some(Array1::from_vec(normals)),
            faces: Array2::from_shape_vec((num_faces, 3), faces).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SphereSource;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_default_sphere() {
        let sphere = SphereSource::default().generate();
        assert_eq!(sphere.len_vertices(), 50);
        assert_eq!(sphere.len_faces(), 8 * 2 + 8 * 5 * 2);

        for point in sphere.points.iter() {
            assert_abs_diff_eq!(point.norm(), 0.5, epsilon = 1e-6);
        }
        let faces = sphere.faces.as_ref().unwrap();
        assert!(faces.iter().all(|idx| *idx < sphere.len_vertices()));
    }

    #[test]
    fn test_faces_point_outwards() {
        let sphere = SphereSource::default()
            .radius(2.0)
            .center(Vector3::new(1.0, 2.0, 3.0))
            .resolution(12, 9)
            .generate();
        let center = Vector3::new(1.0, 2.0, 3.0);

        for face in sphere.faces.as_ref().unwrap().rows() {
            let (a, b, c) = (
                sphere.points[face[0]],
                sphere.points[face[1]],
                sphere.points[face[2]],
            );
            let normal = (b - a).cross(&(c - a));
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(&(centroid - center)) > 0.0);
        }
    }
}
