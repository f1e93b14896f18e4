mod icp_params;
pub use icp_params::{IcpParams, MeanDistanceMode};
mod pcl_icp;
pub use pcl_icp::{Icp, IcpResult};
