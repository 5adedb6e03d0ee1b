use crate::formula::Expr;
use std::collections::HashMap;
use std::sync::Arc;

/// The contents of one cell as carried inside a [`RangeBundle`]: the raw
/// text plus its parsed tree (if it's a formula), so paste can translate the
/// tree without re-parsing.
#[derive(Debug, Clone)]
pub struct Contents {
    pub text: String,
    pub tree: Option<Arc<Expr>>,
}

/// A portable snapshot of a rectangular cell range, produced by
/// [`super::sheet::Sheet::copy_cells`]/[`super::sheet::Sheet::cut_cells`] and
/// consumed by exactly one [`super::sheet::Sheet::paste_cells`]. Coordinates
/// in `cells` are relative to `origin` (the range's top-left corner), so
/// pasting just re-anchors them at a new origin and translates formulas by
/// the delta between the two origins.
///
/// Deliberately not `Clone` — a bundle is meant to be moved into a single
/// paste, not fanned out to several.
#[derive(Debug)]
pub struct RangeBundle {
    pub origin: (u32, u32),
    pub cells: HashMap<(u32, u32), Contents>,
}
