pub mod config;
pub mod error;
pub mod harness;
pub mod postprocessing;
pub mod preprocessing;
pub mod server;
pub mod tensor;


// Re-export common types
pub use error::{Result, TransformError};
pub use postprocessing::softmax::{postprocess, Scores};
pub use preprocessing::image::preprocess;
pub use tensor::NamedTensors;
