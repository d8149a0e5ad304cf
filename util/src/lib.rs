pub mod config;
pub mod http;
pub mod paths;
pub mod test_helpers;
pub mod upload;
