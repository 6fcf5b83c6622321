//! fusion-pixel
pub mod build;
pub mod core;
pub mod data;
pub mod design;
pub mod dump;
pub mod logging;
pub mod pipeline;
