use nalgebra::Vector3;
use ndarray::ArrayView1;

use super::OrientedBox;
use crate::error::Result;

struct ObbNode {
    obb: OrientedBox,
    num_points: usize,
    children: Option<Box<(ObbNode, ObbNode)>>,
}

/// Hierarchy of oriented boxes. Each level splits the points of a box in
/// two halves at the box center.
pub struct ObbTree {
    root: ObbNode,
    depth: usize,
}

impl ObbTree {
    /// Builds the tree.
    ///
    /// # Arguments
    ///
    /// * `points` - The point set.
    /// * `max_level` - Maximum number of splits from the root, `0` builds only the root box.
    /// * `min_points` - Boxes with fewer points are not split.
    pub fn build(
        points: &ArrayView1<Vector3<f32>>,
        max_level: usize,
        min_points: usize,
    ) -> Result<Self> {
        fn rec(
            points: &ArrayView1<Vector3<f32>>,
            indices: Vec<usize>,
            level: usize,
            max_level: usize,
            min_points: usize,
        ) -> Result<(ObbNode, usize)> {
            let obb = OrientedBox::from_point_iter(indices.iter().map(move |idx| &points[*idx]))?;
            let num_points = indices.len();

            if level >= max_level || num_points < min_points.max(2) {
                return Ok((
                    ObbNode {
                        obb,
                        num_points,
                        children: None,
                    },
                    level,
                ));
            }

            let center = obb.center();
            for axis in obb.axes.iter() {
                let norm = axis.norm();
                if norm <= f32::EPSILON {
                    continue;
                }
                let direction = axis / norm;
                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .copied()
                    .partition(|idx| direction.dot(&(points[*idx] - center)) < 0.0);
                if left.is_empty() || right.is_empty() {
                    continue;
                }

                let (left, left_depth) = rec(points, left, level + 1, max_level, min_points)?;
                let (right, right_depth) = rec(points, right, level + 1, max_level, min_points)?;
                return Ok((
                    ObbNode {
                        obb,
                        num_points,
                        children: Some(Box::new((left, right))),
                    },
                    left_depth.max(right_depth),
                ));
            }

            Ok((
                ObbNode {
                    obb,
                    num_points,
                    children: None,
                },
                level,
            ))
        }

        let indices = Vec::from_iter(0..points.len());
        let (root, depth) = rec(points, indices, 0, max_level, min_points)?;
        Ok(Self { root, depth })
    }

    /// Deepest level present in the tree.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn root(&self) -> &OrientedBox {
        &self.root.obb
    }

    /// Boxes found at `level`. Leaves above that level are returned too, so
    /// the boxes always cover all points.
    pub fn representation(&self, level: usize) -> Vec<OrientedBox> {
        fn rec(node: &ObbNode, current: usize, level: usize, boxes: &mut Vec<OrientedBox>) {
            match &node.children {
                Some(children) if current < level => {
                    rec(&children.0, current + 1, level, boxes);
                    rec(&children.1, current + 1, level, boxes);
                }
                _ => boxes.push(node.obb.clone()),
            }
        }

        let mut boxes = Vec::new();
        rec(&self.root, 0, level, &mut boxes);
        boxes
    }

    /// Number of points inside each box of `representation(level)`.
    pub fn representation_sizes(&self, level: usize) -> Vec<usize> {
        fn rec(node: &ObbNode, current: usize, level: usize, sizes: &mut Vec<usize>) {
            match &node.children {
                Some(children) if current < level => {
                    rec(&children.0, current + 1, level, sizes);
                    rec(&children.1, current + 1, level, sizes);
                }
                _ => sizes.push(node.num_points),
            }
        }

        let mut sizes = Vec::new();
        rec(&self.root, 0, level, &mut sizes);
        sizes
    }
}
