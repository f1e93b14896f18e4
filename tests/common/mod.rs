use nalgebra::Vector3;
use polyalign::pointcloud::PointCloud;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Random points on an ellipsoid with radii 3, 2 and 1.
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
        if (0.1..=1.0).contains(&norm) {
            points.push((direction / norm).component_mul(&radii));
        }
    }
    PointCloud::from_points(points)
}

/// Uniform points in a box with the given half sizes.
pub fn random_cloud(seed: u64, n: usize, half_size: Vector3<f32>) -> PointCloud {
    let mut rng = SmallRng::seed_from_u64(seed);
    PointCloud::from_points((0..n).map(|_| {
        Vector3::new(
            rng.gen_range(-half_size[0]..half_size[0]),
            rng.gen_range(-half_size[1]..half_size[1]),
            rng.gen_range(-half_size[2]..half_size[2]),
        )
    }))
}
