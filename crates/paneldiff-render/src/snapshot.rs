#![forbid(unsafe_code)]

//! Panel snapshots: the per-tick input handed to the diff engine by
//! the widget model.
//!
//! A snapshot pairs the surface-level state (size, background
//! reference) with an ordered sequence of element records. Element
//! order is the paint/z-order and is preserved exactly through the
//! diff. Snapshots are validated at construction; the engine never
//! computes a repaint decision over an invalid surface.

use std::fmt;
use std::sync::Arc;

use paneldiff_core::geometry::Rect;

use crate::element::ElementRecord;

/// Opaque, cheap-to-clone reference to a background resource.
///
/// Compared by value: two refs naming the same resource are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackgroundRef(Arc<str>);

impl BackgroundRef {
    /// Create a background reference from a resource name.
    pub fn new(resource: impl AsRef<str>) -> Self {
        Self(Arc::from(resource.as_ref()))
    }

    /// The referenced resource name.
    #[inline]
    pub fn resource(&self) -> &str {
        &self.0
    }
}

/// Surface-level state of the panel.
///
/// Any inequality between consecutive surface states forces a full
/// repaint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceState {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Background resource, if any.
    pub background: Option<BackgroundRef>,
}

impl SurfaceState {
    /// Create a surface state with no background.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: None,
        }
    }

    /// Attach a background reference.
    pub fn with_background(mut self, background: BackgroundRef) -> Self {
        self.background = Some(background);
        self
    }

    /// The whole-surface rectangle.
    ///
    /// [`PanelSnapshot::new`] guarantees both dimensions fit `i32`, so
    /// the casts here cannot wrap.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_size(self.width as i32, self.height as i32)
    }
}

/// Error raised when a snapshot cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The surface has a zero dimension, or one too large for pixel
    /// coordinate arithmetic.
    InvalidSurface {
        /// Offered width.
        width: u32,
        /// Offered height.
        height: u32,
    },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::InvalidSurface { width, height } => {
                write!(f, "invalid surface size {width}x{height}")
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

/// One tick's worth of renderable state.
///
/// Produced fresh every tick by the widget model, read-only to the
/// diff engine apart from the merge operation's in-place fill of
/// missing attribute groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSnapshot {
    surface: SurfaceState,
    elements: Vec<ElementRecord>,
}

impl PanelSnapshot {
    /// Largest accepted surface dimension. Bounds must fit the signed
    /// coordinate space of [`Rect`] without wrapping.
    pub const MAX_DIMENSION: u32 = i32::MAX as u32;

    /// Create a snapshot, validating the surface.
    ///
    /// A zero-sized surface is refused here rather than silently
    /// producing an empty repaint decision, and a dimension beyond
    /// [`Self::MAX_DIMENSION`] is refused rather than wrapping negative
    /// in rect arithmetic.
    pub fn new(surface: SurfaceState, elements: Vec<ElementRecord>) -> Result<Self, SnapshotError> {
        if surface.width == 0
            || surface.height == 0
            || surface.width > Self::MAX_DIMENSION
            || surface.height > Self::MAX_DIMENSION
        {
            return Err(SnapshotError::InvalidSurface {
                width: surface.width,
                height: surface.height,
            });
        }
        Ok(Self { surface, elements })
    }

    /// The surface-level state.
    #[inline]
    pub fn surface(&self) -> &SurfaceState {
        &self.surface
    }

    /// The elements in paint/z-order.
    #[inline]
    pub fn elements(&self) -> &[ElementRecord] {
        &self.elements
    }

    /// Number of elements in the snapshot.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the snapshot holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub(crate) fn elements_mut(&mut self) -> &mut [ElementRecord] {
        &mut self.elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementContent, ElementStyle};

    #[test]
    fn zero_sized_surface_is_refused() {
        let err = PanelSnapshot::new(SurfaceState::new(0, 600), Vec::new()).unwrap_err();
        assert_eq!(
            err,
            SnapshotError::InvalidSurface {
                width: 0,
                height: 600,
            }
        );
        assert!(PanelSnapshot::new(SurfaceState::new(800, 0), Vec::new()).is_err());
    }

    #[test]
    fn oversized_surface_is_refused() {
        // Above i32::MAX the whole-surface rect would wrap negative
        // and report an empty dirty area on a full repaint.
        let err = PanelSnapshot::new(SurfaceState::new(2_200_000_000, 600), Vec::new()).unwrap_err();
        assert_eq!(
            err,
            SnapshotError::InvalidSurface {
                width: 2_200_000_000,
                height: 600,
            }
        );
        assert!(PanelSnapshot::new(SurfaceState::new(800, u32::MAX), Vec::new()).is_err());

        // The boundary itself is usable.
        let snapshot = PanelSnapshot::new(
            SurfaceState::new(PanelSnapshot::MAX_DIMENSION, 600),
            Vec::new(),
        )
        .unwrap();
        let rect = snapshot.surface().rect();
        assert!(!rect.is_empty());
        assert_eq!(rect.width, i32::MAX);
    }

    #[test]
    fn element_order_is_preserved() {
        let elements = vec![
            ElementRecord::complete(
                3,
                Rect::new(0, 0, 10, 10),
                ElementStyle::opaque(0xFF0000FF),
                ElementContent::new("a"),
            ),
            ElementRecord::new(1).with_geometry(Rect::new(5, 5, 10, 10)),
            ElementRecord::new(2),
        ];
        let snapshot = PanelSnapshot::new(SurfaceState::new(800, 600), elements).unwrap();
        let serials: Vec<u64> = snapshot.elements().iter().map(|e| e.serial()).collect();
        assert_eq!(serials, [3, 1, 2]);
    }

    #[test]
    fn background_refs_compare_by_value() {
        let a = BackgroundRef::new("bg/starfield.png");
        let b = BackgroundRef::new("bg/starfield.png");
        let c = BackgroundRef::new("bg/grid.png");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let with_bg = SurfaceState::new(800, 600).with_background(a);
        let same_bg = SurfaceState::new(800, 600).with_background(b);
        assert_eq!(with_bg, same_bg);
    }

    #[test]
    fn surface_rect_spans_whole_surface() {
        let surface = SurfaceState::new(800, 600);
        assert_eq!(surface.rect(), Rect::new(0, 0, 800, 600));
    }
}
