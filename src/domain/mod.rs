pub mod analysis;
pub mod cbs;
pub mod network;
pub mod scenario;
pub mod utils;
