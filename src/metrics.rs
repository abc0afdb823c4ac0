use serde::Serialize;

use crate::types::CuttingPlan;

/// Aggregate figures for a finished plan. Areas are in squared input units;
/// totals are `u128` since a plan may hold many sheets of `u32::MAX` sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub sheets_used: usize,
    pub total_cut_area: u128,
    pub total_material_area: u128,
    pub waste: u128,
    pub oversized_pieces: usize,
}

impl Metrics {
    /// Oversized pieces only count the part that lies on their sheet, so
    /// `waste` never goes negative.
    pub fn compute(plan: &CuttingPlan) -> Self {
        let total_cut_area: u128 = plan
            .placements()
            .map(|p| u128::from(p.area_on(plan.stock)))
            .sum();
        let total_material_area = u128::from(plan.stock.area()) * plan.sheet_count() as u128;

        Self {
            sheets_used: plan.sheet_count(),
            total_cut_area,
            total_material_area,
            waste: total_material_area - total_cut_area,
            oversized_pieces: plan.oversized().count(),
        }
    }

    pub fn waste_percent(&self) -> f64 {
        if self.total_material_area == 0 {
            return 0.0;
        }
        self.waste as f64 / self.total_material_area as f64 * 100.0
    }
}
