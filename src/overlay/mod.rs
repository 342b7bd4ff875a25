//! Floating overlay (picture-in-picture) region for the secondary stream.

pub mod geometry;

pub use geometry::{OverlayGeometry, OverlayManager, ResizeHandle};
