pub mod delete;
pub mod download;
pub mod get;
pub mod transform;
pub mod upload;
