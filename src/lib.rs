pub mod align;
pub mod bounds;
pub mod error;
pub mod hausdorff;
pub mod icp;
pub mod io;
pub mod kdtree;
pub mod landmark;
pub mod metrics;
pub mod pointcloud;
pub mod registration;
pub mod shapes;
pub mod transform;

#[cfg(test)]
mod unit_test;
