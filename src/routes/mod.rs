pub mod ping;
pub mod swap;
pub mod download;
