#![forbid(unsafe_code)]

//! Per-tick render pipeline.
//!
//! [`RenderPipeline`] is the stateful driver around the diff engine:
//! it keeps the previous frame context and the bounded history, and
//! turns one panel snapshot per tick into a [`PaintPlan`] for the
//! drawing backend. The pipeline performs no I/O and is designed for
//! single-threaded sequential use on the render thread; it tolerates
//! irregular tick spacing by always diffing against the last
//! successfully produced context.
//!
//! # Usage
//!
//! ```
//! use paneldiff_core::geometry::Rect;
//! use paneldiff_render::element::{ElementContent, ElementRecord, ElementStyle};
//! use paneldiff_render::pipeline::{PipelineConfig, RenderPipeline};
//! use paneldiff_render::snapshot::{PanelSnapshot, SurfaceState};
//!
//! let mut pipeline = RenderPipeline::new(PipelineConfig::default()).unwrap();
//!
//! let element = ElementRecord::complete(
//!     1,
//!     Rect::new(0, 0, 50, 50),
//!     ElementStyle::opaque(0xFF9900FF),
//!     ElementContent::new("MODE"),
//! );
//! let snapshot = PanelSnapshot::new(SurfaceState::new(800, 600), vec![element]).unwrap();
//!
//! let plan = pipeline.tick(snapshot);
//! assert!(plan.full_repaint); // first frame
//! assert_eq!(plan.elements.len(), 1);
//! ```

use std::fmt;

use paneldiff_core::geometry::Region;

use crate::element::ElementRecord;
use crate::frame::{DiffOptions, FrameContext};
use crate::history::FrameHistory;
use crate::snapshot::PanelSnapshot;

/// Configuration recognized by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Enables selective repaint and history collapse.
    pub incremental: bool,
    /// Enables dirty-region narrowing when incremental mode is on.
    pub selective_repaint: bool,
    /// Number of retained frame contexts for collapse.
    pub history_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            incremental: true,
            selective_repaint: true,
            history_capacity: 10,
        }
    }
}

impl PipelineConfig {
    /// The diff switches derived from this configuration.
    pub const fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            incremental: self.incremental,
            selective_repaint: self.selective_repaint,
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.incremental && self.history_capacity == 0 {
            return Err(PipelineError::InvalidConfig(
                "incremental mode requires a nonzero history capacity".into(),
            ));
        }
        Ok(())
    }
}

/// Errors raised by pipeline construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The configuration is unusable.
    InvalidConfig(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {}

/// The repaint decision for one tick, handed to the drawing backend.
///
/// The backend must repaint at least `dirty` (already clipped to the
/// surface) and draw every element of `elements` in order; when
/// `full_repaint` is set it may instead redraw the entire surface from
/// scratch.
#[derive(Debug)]
pub struct PaintPlan<'a> {
    /// Minimal region of the surface that must be repainted.
    pub dirty: &'a Region,
    /// Elements to draw, in paint/z-order.
    pub elements: Vec<&'a ElementRecord>,
    /// Whether the whole surface must be redrawn.
    pub full_repaint: bool,
    /// Whether the background reference changed this tick.
    pub background_changed: bool,
    /// Serials of elements that remained incomplete after history
    /// exhaustion. They were withheld from `elements` this tick; the
    /// producer should resend them in full.
    pub incomplete: Vec<u64>,
}

/// Stateful per-surface driver: previous frame plus bounded history.
#[derive(Debug)]
pub struct RenderPipeline {
    config: PipelineConfig,
    previous: Option<FrameContext>,
    history: FrameHistory,
}

impl RenderPipeline {
    /// Create a pipeline, validating the configuration.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            previous: None,
            history: FrameHistory::new(if config.incremental {
                config.history_capacity
            } else {
                0
            }),
        })
    }

    /// The active configuration.
    #[inline]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one tick: diff the snapshot against the previous frame,
    /// collapse incomplete elements against history, and produce the
    /// paint plan.
    ///
    /// Elements still incomplete after history exhaustion are withheld
    /// from the paint list and reported via [`PaintPlan::incomplete`];
    /// they are reconsidered on subsequent ticks.
    pub fn tick(&mut self, snapshot: PanelSnapshot) -> PaintPlan<'_> {
        #[cfg(feature = "tracing")]
        let _span =
            paneldiff_core::logging::debug_span!("pipeline_tick", elements = snapshot.len())
                .entered();

        let mut ctx = FrameContext::new(snapshot, self.config.diff_options());
        ctx.diff_against(self.previous.as_ref());

        // Retire the predecessor into history before collapsing, so
        // the walk sees every retained frame. Re-merging against it is
        // a no-op: merges are idempotent.
        if self.config.incremental
            && let Some(prev) = self.previous.take()
        {
            self.history.push(prev);
        }

        let incomplete = if self.history.collapse(&mut ctx) {
            Vec::new()
        } else {
            let withheld = ctx.drop_incomplete_from_paint();
            #[cfg(feature = "tracing")]
            paneldiff_core::logging::warn!(
                withheld = withheld.len(),
                "incomplete elements withheld from paint list"
            );
            withheld
        };

        let ctx = self.previous.insert(ctx);
        PaintPlan {
            dirty: ctx.dirty_area(),
            elements: ctx.elements_to_paint().collect(),
            full_repaint: ctx.full_repaint(),
            background_changed: ctx.background_changed(),
            incomplete,
        }
    }

    /// Forget the previous frame and all history.
    ///
    /// Used when the surface is recreated (e.g. after a reconnect);
    /// the next tick is a guaranteed full repaint.
    pub fn reset(&mut self) {
        self.previous = None;
        self.history.clear();
    }
}
