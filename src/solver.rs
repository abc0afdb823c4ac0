use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{PlanError, Result};
use crate::grouping::PieceGroups;
use crate::guillotine::GuillotineSheet;
use crate::metrics::Metrics;
use crate::oracle::{FeasibilityOracle, SheetPacker};
use crate::types::{CuttingPlan, Demand, Piece, PlanOptions, Placement, Rect, Sheet, Strategy};

pub struct Solver {
    stock: Rect,
    demands: Vec<Demand>,
    options: PlanOptions,
    oracle: FeasibilityOracle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub plan: CuttingPlan,
    pub groups: PieceGroups,
    pub metrics: Metrics,
}

impl Solution {
    pub fn sheet_count(&self) -> usize {
        self.plan.sheet_count()
    }

    pub fn waste_percent(&self) -> f64 {
        self.metrics.waste_percent()
    }
}

impl Solver {
    pub fn new(stock: Rect, demands: Vec<Demand>, options: PlanOptions) -> Self {
        Self {
            stock,
            demands,
            options,
            oracle: FeasibilityOracle::default(),
        }
    }

    /// Swaps the single-sheet packer used by the feasibility strategy.
    pub fn with_packer(mut self, packer: impl SheetPacker + 'static) -> Self {
        self.oracle = FeasibilityOracle::new(packer);
        self
    }

    pub fn solve(&self) -> Result<Solution> {
        self.validate()?;

        let pieces = self.expand_demands();
        let sheets = match self.options.strategy {
            Strategy::Guillotine => self.guillotine_solve(&pieces),
            Strategy::Feasibility => self.feasibility_solve(&pieces),
        };
        let plan = CuttingPlan {
            stock: self.stock,
            sheets,
        };

        let groups = PieceGroups::assign(&plan, self.options.seed);
        let metrics = Metrics::compute(&plan);
        debug!(
            strategy = %self.options.strategy,
            pieces = pieces.len(),
            sheets = metrics.sheets_used,
            waste = %metrics.waste,
            "plan finished"
        );

        Ok(Solution {
            plan,
            groups,
            metrics,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.stock.length == 0 || self.stock.width == 0 {
            return Err(PlanError::InvalidStock {
                length: self.stock.length,
                width: self.stock.width,
            });
        }
        for (index, d) in self.demands.iter().enumerate() {
            if d.rect.length == 0 || d.rect.width == 0 {
                return Err(PlanError::InvalidPiece {
                    index,
                    length: d.rect.length,
                    width: d.rect.width,
                });
            }
            if d.qty == 0 {
                return Err(PlanError::InvalidQuantity { index });
            }
        }
        Ok(())
    }

    /// One piece per unit of quantity, ids in input order, then sorted by
    /// area descending. The sort is stable so equal areas keep input order.
    fn expand_demands(&self) -> Vec<Piece> {
        let mut pieces: Vec<Piece> = self
            .demands
            .iter()
            .flat_map(|d| std::iter::repeat_n(d.rect, d.qty as usize))
            .enumerate()
            .map(|(id, rect)| Piece::new(id, rect))
            .collect();
        pieces.sort_by(|a, b| b.rect.area().cmp(&a.rect.area()));
        pieces
    }

    fn guillotine_solve(&self, pieces: &[Piece]) -> Vec<Sheet> {
        let mut remaining = pieces.to_vec();
        let mut sheets: Vec<Sheet> = Vec::new();

        while !remaining.is_empty() {
            debug!(sheet = sheets.len() + 1, remaining = remaining.len(), "opening sheet");
            let mut sheet = GuillotineSheet::new(self.stock);

            // First remaining piece that fits any free region, restarting
            // from the top after every placement.
            loop {
                let hit = remaining
                    .iter()
                    .enumerate()
                    .find_map(|(pi, p)| sheet.find_region(p.rect).map(|ri| (pi, ri)));
                let Some((pi, ri)) = hit else {
                    break;
                };
                let piece = remaining.remove(pi);
                let (placement, _) = sheet.place(ri, piece);
                debug!(
                    piece = piece.id,
                    rect = %placement.rect,
                    x = placement.x,
                    y = placement.y,
                    "placed"
                );
            }

            // An empty sheet that takes nothing means every remaining piece
            // is larger than the stock.
            if sheet.is_empty() {
                let piece = remaining.remove(0);
                warn!(piece = piece.id, rect = %piece.rect, stock = %self.stock, "piece does not fit the stock");
                sheet.place_oversized(piece);
            }

            sheets.push(sheet.into_sheet());
        }

        sheets
    }

    fn feasibility_solve(&self, pieces: &[Piece]) -> Vec<Sheet> {
        let mut sheets: Vec<Sheet> = Vec::new();

        for &piece in pieces {
            let orientations = piece.orientations(self.options.allow_rotate);

            if let Some((si, layout)) = self.fit_existing(&sheets, piece, &orientations) {
                debug!(piece = piece.id, sheet = si + 1, "placed on open sheet");
                sheets[si].placements = layout;
                continue;
            }

            debug!(sheet = sheets.len() + 1, piece = piece.id, "opening sheet");
            let layout = orientations
                .iter()
                .find_map(|&(_, rotated)| self.oracle.try_fit(self.stock, &[], piece, rotated))
                .unwrap_or_else(|| {
                    warn!(piece = piece.id, rect = %piece.rect, stock = %self.stock, "piece does not fit the stock");
                    vec![Placement::oversized(piece)]
                });
            sheets.push(Sheet { placements: layout });
        }

        sheets
    }

    /// First open sheet, in creation order, that takes `piece` in one of its
    /// orientations. Sheets holding an oversized piece take nothing else.
    fn fit_existing(
        &self,
        sheets: &[Sheet],
        piece: Piece,
        orientations: &[(Rect, bool)],
    ) -> Option<(usize, Vec<Placement>)> {
        sheets
            .iter()
            .enumerate()
            .filter(|(_, sheet)| !sheet.placements.iter().any(|p| p.oversized))
            .find_map(|(si, sheet)| {
                orientations.iter().find_map(|&(_, rotated)| {
                    self.oracle
                        .try_fit(self.stock, &sheet.placements, piece, rotated)
                        .map(|layout| (si, layout))
                })
            })
    }
}
