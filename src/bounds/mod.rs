mod obb;
pub use obb::OrientedBox;
mod obb_tree;
pub use obb_tree::ObbTree;
