pub mod metadata;
pub mod sample;

pub use metadata::{FrameMetadata, MetaField};
pub use sample::{LandmarkKey, LandmarkSample};
