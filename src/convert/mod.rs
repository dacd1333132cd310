// Frame conversion: planar YUV 4:2:0 to packed RGBA.

pub mod yuv;

pub use yuv::convert;
