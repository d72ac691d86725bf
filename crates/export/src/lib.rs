//! Preview image export: capture → encode → optimize → deliver.

pub mod capture;
pub mod encode;
pub mod pipeline;

pub use capture::{CardRasterizer, PreviewCapture};
pub use encode::encode_jpeg;
pub use pipeline::{ExportPipeline, ExportedFile, PayloadSource};
