use serde_derive::{Deserialize, Serialize};

use crate::landmark::LandmarkMode;

/// How the landmark displacement of one iteration is averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeanDistanceMode {
    /// Square root of the mean squared distance.
    Rms,
    /// Mean of the distances.
    AbsoluteValue,
}

/// Iterative Closest Point parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IcpParams {
    /// Degrees of freedom fitted at each iteration.
    pub mode: LandmarkMode,
    /// At most this many source points are matched per iteration.
    pub max_landmarks: usize,
    /// Convergence threshold on the mean landmark displacement.
    pub max_mean_distance: f32,
    pub max_iterations: usize,
    /// Translate the source centroid onto the target centroid before iterating.
    pub start_by_matching_centroids: bool,
    /// Stop as soon as the mean displacement drops to `max_mean_distance`.
    pub check_mean_distance: bool,
    pub mean_distance_mode: MeanDistanceMode,
}

impl Default for IcpParams {
    fn default() -> Self {
        Self {
            mode: LandmarkMode::RigidBody,
            max_landmarks: 100,
            max_mean_distance: 1e-5,
            max_iterations: 500,
            start_by_matching_centroids: true,
            check_mean_distance: true,
            mean_distance_mode: MeanDistanceMode::Rms,
        }
    }
}

impl IcpParams {
    pub fn mode(&'_ mut self, value: LandmarkMode) -> &'_ mut IcpParams {
        self.mode = value;
        self
    }

    pub fn max_landmarks(&'_ mut self, value: usize) -> &'_ mut IcpParams {
        self.max_landmarks = value;
        self
    }

    pub fn max_mean_distance(&'_ mut self, value: f32) -> &'_ mut IcpParams {
        self.max_mean_distance = value;
        self
    }

    pub fn max_iterations(&'_ mut self, value: usize) -> &'_ mut IcpParams {
        self.max_iterations = value;
        self
    }

    pub fn start_by_matching_centroids(&'_ mut self, value: bool) -> &'_ mut IcpParams {
        self.start_by_matching_centroids = value;
        self
    }

    pub fn check_mean_distance(&'_ mut self, value: bool) -> &'_ mut IcpParams {
        self.check_mean_distance = value;
        self
    }

    pub fn mean_distance_mode(&'_ mut self, value: MeanDistanceMode) -> &'_ mut IcpParams {
        self.mean_distance_mode = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params: IcpParams =
            serde_json::from_str(r#"{"max_iterations": 20, "mean_distance_mode": "AbsoluteValue"}"#)
                .unwrap();
        assert_eq!(params.max_iterations, 20);
        assert_eq!(params.mean_distance_mode, MeanDistanceMode::AbsoluteValue);
        assert_eq!(params.max_landmarks, 100);
        assert_eq!(params.mode, LandmarkMode::RigidBody);
    }

    #[test]
    fn test_builder() {
        let mut params = IcpParams::default();
        params.max_iterations(3).check_mean_distance(false);
        assert_eq!(params.max_iterations, 3);
        assert!(!params.check_mean_distance);
        assert!(params.start_by_matching_centroids);
    }
}
