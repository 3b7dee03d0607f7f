pub mod backend;
pub mod ffmpeg;

pub use backend::{Encoder, EncoderConfig, EncoderEvent, EncoderFactory, Segment};
pub use ffmpeg::{scale_filter, FfmpegEncoder, FfmpegEncoderFactory};
