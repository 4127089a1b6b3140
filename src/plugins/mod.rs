pub mod hosting;
pub mod faceswap;
