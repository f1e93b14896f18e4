use nalgebra::Vector3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rstest::*;

use crate::pointcloud::PointCloud;
use crate::shapes::SphereSource;

/// The default tessellated sphere: 50 points, radius 0.5.
#[fixture]
pub fn sample_sphere() -> PointCloud {
    PointCloud::from_geometry(SphereSource::default().generate())
}

#[fixture]
pub fn unit_sphere() -> PointCloud {
    PointCloud::from_geometry(SphereSource::default().radius(1.0).generate())
}

/// 500 random points on an ellipsoid with radii 3, 2 and 1. The uneven
/// sampling makes its bounding box orientation unambiguous.
#[fixture]
pub fn sample_ellipsoid() -> PointCloud {
    ellipsoid(7, 500)
}

/// `n` random points on the ellipsoid of `sample_ellipsoid`, reproducible by `seed`.
pub fn ellipsoid(seed: u64, n: usize) -> PointCloud {
    let mut rng = SmallRng::seed_from_u64(seed);
    let radii = Vector3::new(3.0, 2.0, 1.0);
    let mut points = Vec::with_capacity(n);
    while points.len() < n {
        let direction = Vector3::<f32>::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let norm = direction.norm();
        if !(0.1..=1.0).contains(&norm) {
            continue;
        }
        points.push((direction / norm).component_mul(&radii));
    }
    PointCloud::from_points(points)
}

/// `n` uniform points in `[-1, 1)^3`, reproducible by `seed`.
pub fn random_cloud(seed: u64, n: usize) -> PointCloud {
    let mut rng = SmallRng::seed_from_u64(seed);
    PointCloud::from_points((0..n).map(|_| {
        Vector3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        )
    }))
}
