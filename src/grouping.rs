use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Serializer};

use crate::types::{CuttingPlan, Placement, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Deterministic color source owned by a single planning run.
pub struct ColorGenerator {
    rng: StdRng,
}

impl ColorGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_color(&mut self) -> Color {
        Color {
            r: self.rng.random(),
            g: self.rng.random(),
            b: self.rng.random(),
        }
    }
}

/// All placements of pieces with the same true size, whatever their
/// orientation or sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PieceGroup {
    pub id: u32,
    pub size: Rect,
    pub color: Color,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PieceGroups {
    groups: Vec<PieceGroup>,
    #[serde(skip)]
    by_size: HashMap<Rect, usize>,
}

impl PieceGroups {
    /// Numbers distinct piece sizes in the order they first appear in the plan,
    /// starting at 1, and gives each a color from a generator seeded with
    /// `seed`.
    pub fn assign(plan: &CuttingPlan, seed: u64) -> Self {
        let mut colors = ColorGenerator::new(seed);
        let mut out = Self::default();

        for placement in plan.placements() {
            let size = placement.piece.rect;
            match out.by_size.get(&size) {
                Some(&idx) => out.groups[idx].count += 1,
                None => {
                    out.by_size.insert(size, out.groups.len());
                    out.groups.push(PieceGroup {
                        id: out.groups.len() as u32 + 1,
                        size,
                        color: colors.next_color(),
                        count: 1,
                    });
                }
            }
        }

        out
    }

    pub fn group_of(&self, placement: &Placement) -> Option<&PieceGroup> {
        self.by_size
            .get(&placement.piece.rect)
            .map(|&idx| &self.groups[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PieceGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
