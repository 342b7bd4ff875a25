//! Media engine boundary: the pipeline trait, probing, and the headless adapter.

pub mod headless;
pub mod pipeline;
pub mod playhead;
pub mod probe;

pub use headless::HeadlessPipeline;
pub use pipeline::{EndCallback, MediaInfo, MediaPipeline};
pub use probe::{init_engine, CatalogProbe, FfmpegProbe, Probe};
