#![forbid(unsafe_code)]

//! Frame contexts and the incremental diff.
//!
//! A [`FrameContext`] wraps one panel snapshot plus the derived repaint
//! decision: whether a full repaint is required, the dirty region, and
//! the ordered list of elements to paint.
//!
//! # Algorithm
//!
//! `diff_against` evaluates these rules in order:
//!
//! 1. No predecessor: full repaint over the whole surface.
//! 2. Surface-state change, or incremental mode disabled, or selective
//!    repaint disabled: full repaint; matched elements still have their
//!    missing attribute groups filled from the predecessor so partially
//!    transmitted elements complete without consulting history.
//! 3. Selective repaint: match elements by serial number against a map
//!    of the predecessor's elements, consuming entries on match.
//!    Changed elements contribute the union of their old and new bounds
//!    to the dirty region; unmatched (new) elements contribute their
//!    bounds; entries left in the map are removals whose last bounds go
//!    dirty so the background beneath them is repainted. The region is
//!    clipped to the surface, then deferred unchanged elements whose
//!    bounds intersect the final dirty region are promoted into the
//!    paint list (an overlapping repaint would otherwise clobber them).
//!
//! The background-changed flag is computed independently of the repaint
//! mode by comparing background references.

use std::collections::HashMap;

use paneldiff_core::geometry::Region;
use smallvec::SmallVec;

use crate::snapshot::PanelSnapshot;

/// Diff behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Enables selective repaint and history collapse. When off, every
    /// tick is a full repaint and records are assumed complete.
    pub incremental: bool,
    /// Enables dirty-region narrowing when incremental mode is on.
    pub selective_repaint: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            incremental: true,
            selective_repaint: true,
        }
    }
}

/// One tick's snapshot plus the derived repaint decision.
///
/// Created once per tick and diffed exactly once against its
/// predecessor; afterwards it is either discarded or retained in the
/// frame history for collapse.
#[derive(Debug, Clone)]
pub struct FrameContext {
    options: DiffOptions,
    snapshot: PanelSnapshot,
    dirty: Region,
    paint: Vec<usize>,
    full_repaint: bool,
    background_changed: bool,
}

impl FrameContext {
    /// Wrap a snapshot in an un-diffed context.
    pub fn new(snapshot: PanelSnapshot, options: DiffOptions) -> Self {
        Self {
            options,
            snapshot,
            dirty: Region::new(),
            paint: Vec::new(),
            full_repaint: false,
            background_changed: false,
        }
    }

    /// The snapshot this context was built from.
    #[inline]
    pub fn snapshot(&self) -> &PanelSnapshot {
        &self.snapshot
    }

    /// The diff options this context was built with.
    #[inline]
    pub const fn options(&self) -> DiffOptions {
        self.options
    }

    /// The dirty region computed by the diff.
    #[inline]
    pub fn dirty_area(&self) -> &Region {
        &self.dirty
    }

    /// Whether the whole surface must be redrawn.
    #[inline]
    pub const fn full_repaint(&self) -> bool {
        self.full_repaint
    }

    /// Whether the background reference changed since the predecessor.
    #[inline]
    pub const fn background_changed(&self) -> bool {
        self.background_changed
    }

    /// The elements to paint, in snapshot (z) order.
    pub fn elements_to_paint(&self) -> impl Iterator<Item = &crate::element::ElementRecord> {
        self.paint.iter().map(|&i| &self.snapshot.elements()[i])
    }

    /// Number of elements in the paint list.
    #[inline]
    pub fn paint_len(&self) -> usize {
        self.paint.len()
    }

    /// Diff this context against its predecessor.
    ///
    /// Fills missing attribute groups of matched elements in place and
    /// computes the dirty region, the paint list, and the full-repaint
    /// and background-changed flags. A per-element merge failure is
    /// logged and the element skipped for this tick; it is never
    /// allowed to abort the frame.
    pub fn diff_against(&mut self, pred: Option<&FrameContext>) {
        #[cfg(feature = "tracing")]
        let _span = paneldiff_core::logging::debug_span!(
            "frame_diff",
            elements = self.snapshot.len(),
            incremental = self.options.incremental
        )
        .entered();

        let options = self.options;
        let surface_rect = self.snapshot.surface().rect();

        let Some(pred) = pred else {
            self.full_repaint = true;
            self.dirty = Region::from_rect(surface_rect);
            self.paint = (0..self.snapshot.len()).collect();
            self.background_changed = self.snapshot.surface().background.is_some();
            return;
        };

        self.background_changed =
            self.snapshot.surface().background != pred.snapshot.surface().background;

        self.full_repaint = self.snapshot.surface() != pred.snapshot.surface()
            || !options.incremental
            || !options.selective_repaint;

        // Serial-keyed index of the predecessor frame, rebuilt per tick.
        let mut by_serial: HashMap<u64, &crate::element::ElementRecord> = pred
            .snapshot
            .elements()
            .iter()
            .map(|el| (el.serial(), el))
            .collect();

        if self.full_repaint {
            for el in self.snapshot.elements_mut() {
                let Some(p) = by_serial.get(&el.serial()) else {
                    continue;
                };
                if let Err(err) = el.merge_from(p, false) {
                    #[cfg(feature = "tracing")]
                    paneldiff_core::logging::warn!(
                        serial = el.serial(),
                        error = %err,
                        "element update failed during full repaint"
                    );
                    #[cfg(not(feature = "tracing"))]
                    let _ = err;
                }
            }
            self.dirty = Region::from_rect(surface_rect);
            self.paint = (0..self.snapshot.len()).collect();
            return;
        }

        let mut dirty = Region::new();
        let mut paint = Vec::with_capacity(self.snapshot.len());
        let mut unchanged: SmallVec<[usize; 16]> = SmallVec::new();

        for (i, el) in self.snapshot.elements_mut().iter_mut().enumerate() {
            // Consume the entry so leftovers identify removed elements.
            match by_serial.remove(&el.serial()) {
                Some(p) => match el.merge_from(p, false) {
                    Ok(changed) if changed.is_empty() => unchanged.push(i),
                    Ok(_) => {
                        if let Some(old) = p.bounds() {
                            dirty.add(old);
                        }
                        if let Some(new) = el.bounds() {
                            dirty.add(new);
                        }
                        paint.push(i);
                    }
                    Err(err) => {
                        // Recovered locally: the element stays out of
                        // the paint list this tick and is reconsidered
                        // on the next one.
                        #[cfg(feature = "tracing")]
                        paneldiff_core::logging::warn!(
                            serial = el.serial(),
                            error = %err,
                            "element update failed; skipped this tick"
                        );
                        #[cfg(not(feature = "tracing"))]
                        let _ = err;
                    }
                },
                None => {
                    if let Some(bounds) = el.bounds() {
                        dirty.add(bounds);
                    }
                    paint.push(i);
                }
            }
        }

        // Unconsumed predecessors were removed; the background beneath
        // their last-known bounds must be repainted.
        for p in by_serial.values() {
            if let Some(bounds) = p.bounds() {
                dirty.add(bounds);
            }
        }

        dirty.clip(&surface_rect);

        // Promote deferred unchanged elements that an overlapping
        // repaint would clobber.
        for &i in &unchanged {
            if let Some(bounds) = self.snapshot.elements()[i].bounds()
                && dirty.intersects(&bounds)
            {
                paint.push(i);
            }
        }
        // Promotions were appended; restore snapshot (z) order.
        paint.sort_unstable();

        #[cfg(feature = "tracing")]
        paneldiff_core::logging::trace!(
            paint = paint.len(),
            dirty_rects = dirty.rects().len(),
            "selective diff computed"
        );

        self.dirty = dirty;
        self.paint = paint;
    }

    pub(crate) fn elements_mut(&mut self) -> &mut [crate::element::ElementRecord] {
        self.snapshot.elements_mut()
    }

    /// Drop elements that are still incomplete from the paint list,
    /// returning the serials of every incomplete element.
    pub(crate) fn drop_incomplete_from_paint(&mut self) -> Vec<u64> {
        let incomplete: Vec<u64> = self
            .snapshot
            .elements()
            .iter()
            .filter(|el| !el.is_complete())
            .map(|el| el.serial())
            .collect();
        if !incomplete.is_empty() {
            let elements = self.snapshot.elements();
            self.paint.retain(|&i| elements[i].is_complete());
        }
        incomplete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementContent, ElementRecord, ElementStyle};
    use crate::snapshot::{BackgroundRef, SurfaceState};
    use paneldiff_core::geometry::Rect;

    fn element(serial: u64, bounds: Rect) -> ElementRecord {
        ElementRecord::complete(
            serial,
            bounds,
            ElementStyle::opaque(0xCC7700FF),
            ElementContent::new(format!("el-{serial}")),
        )
    }

    fn snapshot(elements: Vec<ElementRecord>) -> PanelSnapshot {
        PanelSnapshot::new(SurfaceState::new(800, 600), elements).unwrap()
    }

    fn diffed(elements: Vec<ElementRecord>, pred: Option<&FrameContext>) -> FrameContext {
        let mut ctx = FrameContext::new(snapshot(elements), DiffOptions::default());
        ctx.diff_against(pred);
        ctx
    }

    fn painted_serials(ctx: &FrameContext) -> Vec<u64> {
        ctx.elements_to_paint().map(|el| el.serial()).collect()
    }

    #[test]
    fn no_predecessor_forces_full_repaint() {
        let ctx = diffed(
            vec![
                element(1, Rect::new(0, 0, 50, 50)),
                element(2, Rect::new(60, 0, 50, 50)),
            ],
            None,
        );

        assert!(ctx.full_repaint());
        assert_eq!(ctx.dirty_area().bounding(), Rect::new(0, 0, 800, 600));
        assert_eq!(painted_serials(&ctx), [1, 2]);
        assert!(!ctx.background_changed());
    }

    #[test]
    fn no_predecessor_with_background_sets_flag() {
        let surface =
            SurfaceState::new(800, 600).with_background(BackgroundRef::new("bg/grid.png"));
        let mut ctx = FrameContext::new(
            PanelSnapshot::new(surface, Vec::new()).unwrap(),
            DiffOptions::default(),
        );
        ctx.diff_against(None);
        assert!(ctx.background_changed());
    }

    #[test]
    fn unchanged_frame_paints_nothing() {
        let prev = diffed(vec![element(1, Rect::new(0, 0, 50, 50))], None);
        let ctx = diffed(vec![element(1, Rect::new(0, 0, 50, 50))], Some(&prev));

        assert!(!ctx.full_repaint());
        assert!(ctx.dirty_area().is_empty());
        assert_eq!(ctx.paint_len(), 0);
    }

    #[test]
    fn moved_element_dirties_old_and_new_bounds() {
        let prev = diffed(vec![element(1, Rect::new(0, 0, 50, 50))], None);
        let ctx = diffed(vec![element(1, Rect::new(100, 100, 50, 50))], Some(&prev));

        assert!(!ctx.full_repaint());
        assert!(ctx.dirty_area().intersects(&Rect::new(0, 0, 50, 50)));
        assert!(ctx.dirty_area().intersects(&Rect::new(100, 100, 50, 50)));
        assert!(!ctx.dirty_area().intersects(&Rect::new(300, 300, 10, 10)));
        assert_eq!(painted_serials(&ctx), [1]);
    }

    #[test]
    fn untouched_element_outside_dirty_area_is_elided() {
        let prev = diffed(
            vec![
                element(1, Rect::new(0, 0, 50, 50)),
                element(2, Rect::new(700, 500, 50, 50)),
            ],
            None,
        );
        let ctx = diffed(
            vec![
                element(1, Rect::new(10, 10, 50, 50)),
                element(2, Rect::new(700, 500, 50, 50)),
            ],
            Some(&prev),
        );

        assert_eq!(painted_serials(&ctx), [1]);
    }

    #[test]
    fn untouched_element_overlapping_dirty_area_is_promoted() {
        let prev = diffed(
            vec![
                element(1, Rect::new(0, 0, 50, 50)),
                element(2, Rect::new(40, 40, 50, 50)),
            ],
            None,
        );
        // Element 1 moves; its old bounds overlap element 2, which must
        // be repainted even though it did not change.
        let ctx = diffed(
            vec![
                element(1, Rect::new(200, 200, 50, 50)),
                element(2, Rect::new(40, 40, 50, 50)),
            ],
            Some(&prev),
        );

        assert_eq!(painted_serials(&ctx), [1, 2]);
    }

    #[test]
    fn promotion_preserves_z_order() {
        let prev = diffed(
            vec![
                element(1, Rect::new(40, 40, 50, 50)),
                element(2, Rect::new(0, 0, 50, 50)),
            ],
            None,
        );
        // Element 2 (painted last, on top) moves across element 1.
        let ctx = diffed(
            vec![
                element(1, Rect::new(40, 40, 50, 50)),
                element(2, Rect::new(10, 10, 50, 50)),
            ],
            Some(&prev),
        );

        // Element 1 is promoted but must still be painted before 2.
        assert_eq!(painted_serials(&ctx), [1, 2]);
    }

    #[test]
    fn removed_element_bounds_go_dirty() {
        let prev = diffed(
            vec![
                element(1, Rect::new(0, 0, 50, 50)),
                element(2, Rect::new(300, 300, 50, 50)),
            ],
            None,
        );
        let ctx = diffed(vec![element(1, Rect::new(0, 0, 50, 50))], Some(&prev));

        assert!(!ctx.full_repaint());
        assert!(ctx.dirty_area().intersects(&Rect::new(300, 300, 50, 50)));
        // Element 1 is untouched and does not overlap the removal.
        assert_eq!(ctx.paint_len(), 0);
    }

    #[test]
    fn new_element_bounds_go_dirty() {
        let prev = diffed(vec![element(1, Rect::new(0, 0, 50, 50))], None);
        let ctx = diffed(
            vec![
                element(1, Rect::new(0, 0, 50, 50)),
                element(9, Rect::new(600, 400, 50, 50)),
            ],
            Some(&prev),
        );

        assert!(ctx.dirty_area().intersects(&Rect::new(600, 400, 50, 50)));
        assert_eq!(painted_serials(&ctx), [9]);
    }

    #[test]
    fn dirty_area_is_clipped_to_surface() {
        let prev = diffed(vec![element(1, Rect::new(0, 0, 50, 50))], None);
        // Element moves partially off the bottom-right corner.
        let ctx = diffed(vec![element(1, Rect::new(780, 580, 50, 50))], Some(&prev));

        let surface = Rect::new(0, 0, 800, 600);
        assert!(surface.contains_rect(&ctx.dirty_area().bounding()));
    }

    #[test]
    fn surface_resize_forces_full_repaint() {
        let prev = diffed(vec![element(1, Rect::new(0, 0, 50, 50))], None);
        let mut ctx = FrameContext::new(
            PanelSnapshot::new(
                SurfaceState::new(1024, 768),
                vec![element(1, Rect::new(0, 0, 50, 50))],
            )
            .unwrap(),
            DiffOptions::default(),
        );
        ctx.diff_against(Some(&prev));

        assert!(ctx.full_repaint());
        assert_eq!(ctx.dirty_area().bounding(), Rect::new(0, 0, 1024, 768));
        assert_eq!(painted_serials(&ctx), [1]);
    }

    #[test]
    fn full_repaint_path_completes_partial_elements_without_history() {
        let prev = diffed(vec![element(1, Rect::new(0, 0, 50, 50))], None);
        // Partial record plus a surface resize: the full-repaint path
        // must still merge missing groups from the predecessor.
        let mut ctx = FrameContext::new(
            PanelSnapshot::new(
                SurfaceState::new(1024, 768),
                vec![ElementRecord::new(1).with_geometry(Rect::new(5, 5, 50, 50))],
            )
            .unwrap(),
            DiffOptions::default(),
        );
        ctx.diff_against(Some(&prev));

        assert!(ctx.snapshot().elements()[0].is_complete());
    }

    #[test]
    fn disabled_selective_repaint_forces_full_repaint() {
        let options = DiffOptions {
            incremental: true,
            selective_repaint: false,
        };
        let mut prev = FrameContext::new(snapshot(vec![element(1, Rect::new(0, 0, 50, 50))]), options);
        prev.diff_against(None);

        let mut ctx = FrameContext::new(snapshot(vec![element(1, Rect::new(0, 0, 50, 50))]), options);
        ctx.diff_against(Some(&prev));

        assert!(ctx.full_repaint());
        assert_eq!(painted_serials(&ctx), [1]);
    }

    #[test]
    fn background_swap_sets_flag_and_full_repaint() {
        let with_bg = |name: &str| {
            PanelSnapshot::new(
                SurfaceState::new(800, 600).with_background(BackgroundRef::new(name)),
                vec![element(1, Rect::new(0, 0, 50, 50))],
            )
            .unwrap()
        };
        let mut prev = FrameContext::new(with_bg("bg/one.png"), DiffOptions::default());
        prev.diff_against(None);

        let mut ctx = FrameContext::new(with_bg("bg/two.png"), DiffOptions::default());
        ctx.diff_against(Some(&prev));

        assert!(ctx.background_changed());
        // Background is part of the surface state, so this is also a
        // full repaint.
        assert!(ctx.full_repaint());
    }

    #[test]
    fn unchanged_background_leaves_flag_clear() {
        let prev = diffed(vec![element(1, Rect::new(0, 0, 50, 50))], None);
        let ctx = diffed(vec![element(1, Rect::new(100, 0, 50, 50))], Some(&prev));
        assert!(!ctx.background_changed());
    }

    #[test]
    fn partial_element_is_completed_from_predecessor_in_selective_mode() {
        let prev = diffed(vec![element(1, Rect::new(0, 0, 50, 50))], None);
        let ctx = diffed(
            vec![ElementRecord::new(1).with_geometry(Rect::new(100, 100, 50, 50))],
            Some(&prev),
        );

        let el = &ctx.snapshot().elements()[0];
        assert!(el.is_complete());
        assert_eq!(painted_serials(&ctx), [1]);
    }
}
