#![forbid(unsafe_code)]

//! Incremental frame-diff engine: element records, panel snapshots,
//! frame contexts, frame history, and the per-tick pipeline.
//!
//! The widget model produces a [`snapshot::PanelSnapshot`] once per
//! animation tick; [`pipeline::RenderPipeline::tick`] diffs it against
//! the previous frame and yields a [`pipeline::PaintPlan`]: whether a
//! full repaint is needed, the minimal dirty region, and the ordered
//! list of elements the drawing backend must repaint. Elements whose
//! snapshot arrived with missing attribute groups are completed by
//! replaying retained frames ([`history::FrameHistory`]).

pub mod element;
pub mod frame;
pub mod history;
pub mod pipeline;
pub mod snapshot;

pub use element::{AttrMask, ElementContent, ElementRecord, ElementStyle, MergeError};
pub use frame::{DiffOptions, FrameContext};
pub use history::FrameHistory;
pub use pipeline::{PaintPlan, PipelineConfig, PipelineError, RenderPipeline};
pub use snapshot::{BackgroundRef, PanelSnapshot, SnapshotError, SurfaceState};
