use nalgebra::Vector3;
use ndarray::ArrayView1;

use std::cmp::Ordering;

const LEAF_SIZE: usize = 16;

enum KdNode {
    Leaf {
        points: Vec<Vector3<f32>>,
        indices: Vec<usize>,
    },
    NonLeaf {
        axis: usize,
        middle_value: f32,
        left: Box<KdNode>,
        right: Box<KdNode>,
    },
}

/// KdTree for exact nearest neighbor search on 3D points.
pub struct KdTree {
    root: Box<KdNode>,
    len: usize,
}

impl KdTree {
    /// Create a new KdTree from a set of points.
    ///
    /// # Arguments
    ///
    /// * points - Array of points.
    pub fn new(points: &ArrayView1<Vector3<f32>>) -> Self {
        // Recursive creation.
        fn rec(
            points: &ArrayView1<Vector3<f32>>,
            mut indices: Vec<usize>,
            depth: usize,
        ) -> KdNode {
            // Stop recursion if this should be a leaf node.
            if indices.len() <= LEAF_SIZE {
                return KdNode::Leaf {
                    points: indices.iter().map(|idx| points[*idx]).collect(),
                    indices,
                };
            }

            let axis = depth % 3;
            let mid = indices.len() / 2;
            indices.select_nth_unstable_by(mid, |idx1, idx2| {
                let a = points[*idx1][axis];
                let b = points[*idx2][axis];
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            });

            let right = indices.split_off(mid);
            KdNode::NonLeaf {
                axis,
                middle_value: points[right[0]][axis],
                left: Box::new(rec(points, indices, depth + 1)),
                right: Box::new(rec(points, right, depth + 1)),
            }
        }

        let indices = Vec::from_iter(0..points.len());
        KdTree {
            root: Box::new(rec(points, indices, 0)),
            len: points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Find the nearest neighbor to a query point.
    ///
    /// # Arguments
    ///
    /// * point - The query point.
    ///
    /// # Returns
    ///
    /// A tuple containing the index of the nearest neighbor and the squared
    /// distance to it, `None` when the tree is empty.
    pub fn nearest(&self, point: &Vector3<f32>) -> Option<(usize, f32)> {
        fn search(node: &KdNode, point: &Vector3<f32>, best: &mut (usize, f32)) {
            match node {
                KdNode::Leaf {
                    points: leaf_points,
                    indices,
                } => {
                    for (leaf_point, idx) in leaf_points.iter().zip(indices.iter()) {
                        let dist = (point - leaf_point).norm_squared();
                        if dist < best.1 {
                            *best = (*idx, dist);
                        }
                    }
                }
                KdNode::NonLeaf {
                    axis,
                    middle_value,
                    left,
                    right,
                } => {
                    let diff = point[*axis] - middle_value;
                    let (near, far) = if diff < 0.0 {
                        (left, right)
                    } else {
                        (right, left)
                    };
                    search(near, point, best);
                    if diff * diff < best.1 {
                        search(far, point, best);
                    }
                }
            }
        }

        if self.is_empty() {
            return None;
        }

        let mut best = (0, f32::INFINITY);
        search(&self.root, point, &mut best);
        Some(best)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector3;
    use ndarray::prelude::*;
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use super::KdTree;

    #[test]
    fn should_find_nearest_points() {
        let points = array![
            Vector3::new(1., 2., 3.),
            Vector3::new(2., 3., 4.),
            Vector3::new(5., 6., 7.),
            Vector3::new(8., 9., 1.)
        ];
        let tree = KdTree::new(&points.view());

        let queries = [
            Vector3::new(8., 9.1, 1.3),
            Vector3::new(5.1, 6.4, 7.),
            Vector3::new(1.5, 2.1, 3.3),
            Vector3::new(2.2, 3.1, 4.2),
        ];

        for (query, expected) in queries.iter().zip(&[3, 2, 0, 1]) {
            let (idx, _) = tree.nearest(query).unwrap();
            assert_eq!(idx, *expected);
        }
    }

    #[test]
    fn should_find_nearest_points_big() {
        let ordered_points = (0..500)
            .map(|i| {
                let i = i as f32 * 3.0;
                Vector3::new(i, i + 1.0, i + 2.0)
            })
            .collect::<Array1<_>>();

        let (random_indices, randomized_points) = {
            let mut random_indices = (0..500).collect::<Vec<usize>>();
            let seed: [u8; 32] = [5; 32];
            random_indices.shuffle(&mut SmallRng::from_seed(seed));

            let mut randomized_points = ordered_points.clone();
            for (i, random_index) in random_indices.iter().enumerate() {
                randomized_points[*random_index] = ordered_points[i];
            }
            (random_indices, randomized_points)
        };

        let tree = KdTree::new(&randomized_points.view());
        for (query, expected) in ordered_points.iter().zip(random_indices.iter()) {
            let (idx, dist) = tree.nearest(query).unwrap();
            assert_eq!(idx, *expected);
            assert_eq!(dist, 0.0);
        }
    }

    #[test]
    fn should_match_brute_force() {
        let mut rng = SmallRng::seed_from_u64(17);
        let points = (0..2000)
            .map(|_| {
                Vector3::new(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                )
            })
            .collect::<Array1<Vector3<f32>>>();
        let tree = KdTree::new(&points.view());

        for _ in 0..200 {
            let query = Vector3::new(
                rng.gen_range(-1.5..1.5),
                rng.gen_range(-1.5..1.5),
                rng.gen_range(-1.5..1.5),
            );
            let expected = points
                .iter()
                .map(|point| (query - point).norm_squared())
                .fold(f32::INFINITY, f32::min);
            let (_, found) = tree.nearest(&query).unwrap();
            assert_eq!(found, expected);
        }
    }

    #[test]
    fn should_handle_empty_tree() {
        let points = Array1::<Vector3<f32>>::from_vec(Vec::new());
        let tree = KdTree::new(&points.view());
        assert!(tree.is_empty());
        assert!(tree.nearest(&Vector3::zeros()).is_none());
    }
}
