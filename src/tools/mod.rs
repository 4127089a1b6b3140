pub mod detection;
pub mod image_tools;
pub mod log;
pub mod http_tools;
