//! Pointer position → drop zone classification.
//!
//! One classifier for every surface, parameterized by axis and by whether the hovered element
//! can take children right now.

use egui::{Id, Pos2, Rect};

use super::geometry::pointer_ratio;
use super::options::{BarLeafZones, ReorderOptions};
use super::types::{SurfaceKind, Zone};

const TWO_ZONE_SPLIT: f32 = 0.5;

/// What the classifier needs to know about the hovered element.
#[derive(Clone, Copy, Debug)]
pub struct ZoneInput {
    pub pointer: Pos2,
    pub rect: Rect,
    pub surface: SurfaceKind,
    pub is_folder: bool,
    /// Folder children are rendered inline below the element (tree view only).
    pub expanded: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    pub zone: Zone,
    pub ratio: f32,
}

/// Whether a hovered element offers the `Inside` zone at this moment.
///
/// An inline-expanded tree folder does not: its children already render as the rows below it,
/// so "inside" and "after" would be indistinguishable.
pub fn accepts_inside(surface: SurfaceKind, is_folder: bool, expanded: bool) -> bool {
    if !is_folder {
        return false;
    }
    match surface {
        SurfaceKind::Tree => !expanded,
        SurfaceKind::Bar | SurfaceKind::Popover => true,
    }
}

/// Classify a pointer position. Pure: the same input always yields the same zone.
///
/// A degenerate target rect yields [`Zone::Before`] with ratio `0`.
pub fn classify(input: ZoneInput, options: &ReorderOptions) -> Classification {
    let Some(ratio) = pointer_ratio(input.rect, input.pointer, input.surface.axis()) else {
        return Classification {
            zone: Zone::Before,
            ratio: 0.0,
        };
    };

    let zone = if accepts_inside(input.surface, input.is_folder, input.expanded) {
        let (before, after) = options.three_zone_thresholds();
        if ratio < before {
            Zone::Before
        } else if ratio < after {
            Zone::Inside
        } else {
            Zone::After
        }
    } else {
        let upper_half = ratio >= TWO_ZONE_SPLIT;
        let inverted = input.surface == SurfaceKind::Bar
            && !input.is_folder
            && options.bar_leaf_zones == BarLeafZones::Inverted;
        match (upper_half, inverted) {
            (false, false) | (true, true) => Zone::Before,
            (true, false) | (false, true) => Zone::After,
        }
    };

    Classification { zone, ratio }
}

/// Answers "is `element` the same as, or nested inside, `ancestor`?" for the host's element tree.
pub trait ElementContainment {
    fn contains(&self, ancestor: Id, element: Id) -> bool;
}

impl<F> ElementContainment for F
where
    F: Fn(Id, Id) -> bool,
{
    fn contains(&self, ancestor: Id, element: Id) -> bool {
        self(ancestor, element)
    }
}

/// Whether a leave event on `target` means the pointer really left it.
///
/// Moving onto a descendant element also fires a leave on the parent; that one must be ignored.
/// `related` is the element the pointer moved onto (`None` when it left the window).
pub fn is_real_leave(
    target: Id,
    related: Option<Id>,
    containment: &dyn ElementContainment,
) -> bool {
    match related {
        None => true,
        Some(related) => !containment.contains(target, related),
    }
}
