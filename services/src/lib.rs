pub mod error;
pub mod storage;
pub mod transfer_service;
pub mod workspace;
pub mod workspace_service;

#[cfg(test)]
mod test_support;
