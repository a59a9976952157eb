#![forbid(unsafe_code)]

//! Identity-keyed element records and the attribute-group completeness
//! model.
//!
//! An [`ElementRecord`] describes one renderable thing for one tick.
//! Its three attribute groups (geometry, style, content) are
//! `Option`-valued: `None` means the producer did not populate that
//! group this tick, e.g. because only a delta was transmitted. A record
//! with no missing groups is paint-ready; one with missing groups must
//! be completed from a predecessor or from frame history before it may
//! be painted.
//!
//! # Usage
//!
//! ```
//! use paneldiff_core::geometry::Rect;
//! use paneldiff_render::element::{AttrMask, ElementRecord, ElementStyle};
//!
//! // A delta update: only the geometry group was transmitted.
//! let mut current = ElementRecord::new(7).with_geometry(Rect::new(10, 10, 50, 20));
//! assert_eq!(current.missing(), AttrMask::STYLE | AttrMask::CONTENT);
//!
//! let pred = ElementRecord::new(7)
//!     .with_geometry(Rect::new(0, 10, 50, 20))
//!     .with_style(ElementStyle::opaque(0xFF8800FF));
//!
//! let changed = current.merge_from(&pred, false).unwrap();
//! assert_eq!(changed, AttrMask::GEOMETRY); // moved; style copied over
//! assert_eq!(current.missing(), AttrMask::CONTENT);
//! ```

use std::fmt;

use bitflags::bitflags;
use paneldiff_core::geometry::Rect;

bitflags! {
    /// The coarse-grained attribute groups of an element.
    ///
    /// Change detection and missing-data tracking operate at this
    /// granularity, not per primitive field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttrMask: u8 {
        /// On-surface bounds.
        const GEOMETRY = 0b001;
        /// Fill color, opacity, visibility.
        const STYLE    = 0b010;
        /// Opaque content payload.
        const CONTENT  = 0b100;
    }
}

impl Default for AttrMask {
    fn default() -> Self {
        Self::empty()
    }
}

/// Visual style of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementStyle {
    /// Fill color, packed 0xRRGGBBAA.
    pub fill: u32,
    /// Opacity, 0 (transparent) to 255 (opaque).
    pub opacity: u8,
    /// Whether the element is drawn at all.
    pub visible: bool,
}

impl ElementStyle {
    /// A fully opaque, visible style with the given fill color.
    #[inline]
    pub const fn opaque(fill: u32) -> Self {
        Self {
            fill,
            opacity: 255,
            visible: true,
        }
    }
}

/// Content payload of an element.
///
/// The engine treats content as opaque: it only needs equality to
/// detect change. The revision counter lets producers mark content as
/// changed without the engine inspecting the payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementContent {
    /// Display payload, opaque to the engine.
    pub text: String,
    /// Producer-side revision of the payload.
    pub revision: u64,
}

impl ElementContent {
    /// Create a content payload at revision zero.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            revision: 0,
        }
    }
}

/// Error raised when an element merge cannot proceed.
///
/// A merge failure is recovered locally by the diff: the offending
/// element is logged and skipped for the tick, never aborting the
/// frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// The predecessor record belongs to a different element.
    SerialMismatch {
        /// Serial of the record being updated.
        current: u64,
        /// Serial of the supposed predecessor.
        predecessor: u64,
    },
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeError::SerialMismatch {
                current,
                predecessor,
            } => write!(
                f,
                "serial mismatch: element #{current} merged against predecessor #{predecessor}"
            ),
        }
    }
}

impl std::error::Error for MergeError {}

/// One renderable element as captured in a panel snapshot.
///
/// The serial number is the sole key used to match an element across
/// frames; the widget model assigns it once and never reuses it while
/// the element is logically alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRecord {
    serial: u64,
    geometry: Option<Rect>,
    style: Option<ElementStyle>,
    content: Option<ElementContent>,
}

impl ElementRecord {
    /// Create a record with every attribute group missing.
    pub fn new(serial: u64) -> Self {
        Self {
            serial,
            geometry: None,
            style: None,
            content: None,
        }
    }

    /// Create a fully-populated record.
    pub fn complete(serial: u64, bounds: Rect, style: ElementStyle, content: ElementContent) -> Self {
        Self {
            serial,
            geometry: Some(bounds),
            style: Some(style),
            content: Some(content),
        }
    }

    /// Populate the geometry group.
    pub fn with_geometry(mut self, bounds: Rect) -> Self {
        self.geometry = Some(bounds);
        self
    }

    /// Populate the style group.
    pub fn with_style(mut self, style: ElementStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Populate the content group.
    pub fn with_content(mut self, content: ElementContent) -> Self {
        self.content = Some(content);
        self
    }

    /// Stable identity of the element.
    #[inline]
    pub const fn serial(&self) -> u64 {
        self.serial
    }

    /// Current on-surface bounds, if the geometry group is known.
    #[inline]
    pub const fn bounds(&self) -> Option<Rect> {
        self.geometry
    }

    /// Style, if the style group is known.
    #[inline]
    pub const fn style(&self) -> Option<&ElementStyle> {
        self.style.as_ref()
    }

    /// Content, if the content group is known.
    #[inline]
    pub const fn content(&self) -> Option<&ElementContent> {
        self.content.as_ref()
    }

    /// The attribute groups this record's snapshot did not populate.
    pub fn missing(&self) -> AttrMask {
        let mut mask = AttrMask::empty();
        if self.geometry.is_none() {
            mask |= AttrMask::GEOMETRY;
        }
        if self.style.is_none() {
            mask |= AttrMask::STYLE;
        }
        if self.content.is_none() {
            mask |= AttrMask::CONTENT;
        }
        mask
    }

    /// Check if every attribute group is populated.
    ///
    /// A complete record is paint-ready without consulting history.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Fill missing attribute groups from `pred` and report change.
    ///
    /// With `force_all` set (the full-repaint path) the returned mask is
    /// [`AttrMask::all()`] regardless of actual difference, forcing the
    /// element to be treated as fully specified and paintable.
    /// Otherwise the returned mask has a group's bit set iff the final,
    /// resolved values of that group differ between `self` and `pred`.
    ///
    /// Merging is idempotent: repeating the call against the same
    /// predecessor leaves the record unchanged and returns the same
    /// mask.
    pub fn merge_from(&mut self, pred: &ElementRecord, force_all: bool) -> Result<AttrMask, MergeError> {
        if self.serial != pred.serial {
            return Err(MergeError::SerialMismatch {
                current: self.serial,
                predecessor: pred.serial,
            });
        }

        if self.geometry.is_none() {
            self.geometry = pred.geometry;
        }
        if self.style.is_none() {
            self.style = pred.style;
        }
        if self.content.is_none() {
            self.content = pred.content.clone();
        }

        if force_all {
            return Ok(AttrMask::all());
        }

        let mut changed = AttrMask::empty();
        if self.geometry != pred.geometry {
            changed |= AttrMask::GEOMETRY;
        }
        if self.style != pred.style {
            changed |= AttrMask::STYLE;
        }
        if self.content != pred.content {
            changed |= AttrMask::CONTENT;
        }
        Ok(changed)
    }
}
