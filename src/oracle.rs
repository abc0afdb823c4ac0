//! Whole-sheet feasibility checks.
//!
//! The oracle answers "do these pieces and one more fit on a single sheet?" by
//! repacking all of them from scratch with a [`SheetPacker`]. Pieces already
//! on the sheet may move; only the set of pieces on a sheet is stable.

use tracing::trace;

use crate::types::{Piece, Placement, Rect, Region};

/// A rectangle handed to a [`SheetPacker`]. `id` is chosen by the caller and
/// echoed back in the matching [`PackedItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackItem {
    pub id: usize,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedItem {
    pub id: usize,
    pub x: u32,
    pub y: u32,
}

/// Single-bin rectangle packer. Items are packed as given, never rotated;
/// items that do not fit are left out of the result.
pub trait SheetPacker: Send + Sync {
    fn pack(&self, stock: Rect, items: &[PackItem]) -> Vec<PackedItem>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::enum_variant_names)]
pub enum ScoreStrategy {
    BestAreaFit,
    #[default]
    BestShortSideFit,
    BestLongSideFit,
}

impl ScoreStrategy {
    /// Lower is better.
    fn score(self, piece: Rect, free: Rect) -> (u64, u64) {
        let dl = (free.length - piece.length) as u64;
        let dw = (free.width - piece.width) as u64;
        match self {
            ScoreStrategy::BestAreaFit => (free.area() - piece.area(), dl.min(dw)),
            ScoreStrategy::BestShortSideFit => (dl.min(dw), dl.max(dw)),
            ScoreStrategy::BestLongSideFit => (dl.max(dw), dl.min(dw)),
        }
    }
}

/// Offline maximal-rectangles packer: items go in by descending area, each to
/// the corner of the best scoring free rectangle.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxRectsPacker {
    pub score: ScoreStrategy,
}

impl MaxRectsPacker {
    pub fn new(score: ScoreStrategy) -> Self {
        Self { score }
    }

    fn find_best(&self, free: &[Region], piece: Rect) -> Option<usize> {
        free.iter()
            .enumerate()
            .filter(|(_, f)| piece.fits_in(&f.rect))
            .min_by_key(|(_, f)| self.score.score(piece, f.rect))
            .map(|(idx, _)| idx)
    }
}

impl SheetPacker for MaxRectsPacker {
    fn pack(&self, stock: Rect, items: &[PackItem]) -> Vec<PackedItem> {
        let mut order: Vec<&PackItem> = items.iter().collect();
        order.sort_by(|a, b| b.rect.area().cmp(&a.rect.area()));

        let mut free = vec![Region::new(0, 0, stock)];
        let mut packed = Vec::with_capacity(items.len());

        for item in order {
            let Some(idx) = self.find_best(&free, item.rect) else {
                continue;
            };
            let used = Region::new(free[idx].x, free[idx].y, item.rect);
            free = free.iter().flat_map(|f| f.subtract(&used)).collect();
            Region::prune(&mut free);
            packed.push(PackedItem {
                id: item.id,
                x: used.x,
                y: used.y,
            });
        }

        packed
    }
}

pub struct FeasibilityOracle {
    packer: Box<dyn SheetPacker>,
}

impl Default for FeasibilityOracle {
    fn default() -> Self {
        Self::new(MaxRectsPacker::default())
    }
}

impl FeasibilityOracle {
    pub fn new(packer: impl SheetPacker + 'static) -> Self {
        Self {
            packer: Box::new(packer),
        }
    }

    /// Repacks `committed` plus `piece` (rotated if asked) on one sheet.
    ///
    /// Returns the new layout for the whole sheet, committed pieces first in
    /// their existing order, or `None` when the packer cannot place every
    /// piece or hands back a layout that does not account for each exactly
    /// once inside the sheet.
    pub fn try_fit(
        &self,
        stock: Rect,
        committed: &[Placement],
        piece: Piece,
        rotated: bool,
    ) -> Option<Vec<Placement>> {
        let rect = if rotated { piece.rect.rotated() } else { piece.rect };

        let used: u64 = committed.iter().map(|p| p.rect.area()).sum();
        if used
            .checked_add(rect.area())
            .is_none_or(|total| total > stock.area())
        {
            trace!(piece = piece.id, %rect, "not enough free area");
            return None;
        }

        let mut items: Vec<PackItem> = committed
            .iter()
            .enumerate()
            .map(|(slot, p)| PackItem { id: slot, rect: p.rect })
            .collect();
        let candidate_slot = items.len();
        items.push(PackItem {
            id: candidate_slot,
            rect,
        });

        let packed = self.packer.pack(stock, &items);
        if packed.len() < items.len() {
            trace!(piece = piece.id, %rect, placed = packed.len(), "packer left pieces out");
            return None;
        }
        if packed.len() > items.len() {
            trace!(piece = piece.id, placed = packed.len(), "inconsistent packing: too many items");
            return None;
        }

        let mut layout: Vec<Option<Placement>> = vec![None; items.len()];
        for p in packed {
            let Some(slot) = layout.get_mut(p.id) else {
                trace!(piece = piece.id, id = p.id, "inconsistent packing: unknown item");
                return None;
            };
            if slot.is_some() {
                trace!(piece = piece.id, id = p.id, "inconsistent packing: item placed twice");
                return None;
            }
            let placement = if p.id == candidate_slot {
                Placement {
                    piece,
                    rect,
                    x: p.x,
                    y: p.y,
                    rotated,
                    oversized: false,
                }
            } else {
                Placement {
                    x: p.x,
                    y: p.y,
                    ..committed[p.id]
                }
            };
            if !placement.within(stock) {
                trace!(piece = piece.id, id = p.id, "inconsistent packing: outside the sheet");
                return None;
            }
            *slot = Some(placement);
        }

        layout.into_iter().collect()
    }
}
