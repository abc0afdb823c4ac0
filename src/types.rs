use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub length: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
}

impl Rect {
    pub fn new(length: u32, width: u32) -> Self {
        Self { length, width }
    }

    pub fn area(&self) -> u64 {
        self.length as u64 * self.width as u64
    }

    pub fn rotated(&self) -> Self {
        Self {
            length: self.width,
            width: self.length,
        }
    }

    pub fn is_square(&self) -> bool {
        self.length == self.width
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.length <= other.length && self.width <= other.width
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.length, self.width)
    }
}

/// Accepts any JSON number with an integral value that fits in a `u32`, so
/// clients sending `1200.0` are not rejected.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct U32Visitor;

    impl Visitor<'_> for U32Visitor {
        type Value = u32;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a non-negative integer")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<u32, E> {
            if v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 {
                Ok(v as u32)
            } else {
                Err(E::custom(format!("{v} is not a non-negative integer")))
            }
        }
    }

    deserializer.deserialize_any(U32Visitor)
}

/// One requested size with its quantity, before expansion into pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Demand {
    pub rect: Rect,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub qty: u32,
}

impl Demand {
    pub fn new(rect: Rect, qty: u32) -> Self {
        Self { rect, qty }
    }
}

/// A single piece to cut. `id` is its index in the expanded input order and
/// `rect` is its true, unrotated size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Piece {
    pub id: usize,
    pub rect: Rect,
}

impl Piece {
    pub fn new(id: usize, rect: Rect) -> Self {
        Self { id, rect }
    }

    /// Orientations to try, unrotated first.
    pub fn orientations(&self, allow_rotate: bool) -> Vec<(Rect, bool)> {
        let mut out = vec![(self.rect, false)];
        if allow_rotate && !self.rect.is_square() {
            out.push((self.rect.rotated(), true));
        }
        out
    }
}

/// An axis-aligned rectangle at an offset on a sheet. `x` runs along the
/// sheet length, `y` along its width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub rect: Rect,
}

impl Region {
    pub fn new(x: u32, y: u32, rect: Rect) -> Self {
        Self { x, y, rect }
    }

    pub fn right(&self) -> u32 {
        self.x + self.rect.length
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.rect.width
    }

    pub fn intersects(&self, other: &Region) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains(&self, other: &Region) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Maximal remainders of `self` once `used` is taken out of it. The
    /// remainders overlap each other at the corners.
    pub fn subtract(&self, used: &Region) -> Vec<Region> {
        if !self.intersects(used) {
            return vec![*self];
        }

        let mut out = Vec::with_capacity(4);
        if used.x > self.x {
            out.push(Region::new(
                self.x,
                self.y,
                Rect::new(used.x - self.x, self.rect.width),
            ));
        }
        if used.right() < self.right() {
            out.push(Region::new(
                used.right(),
                self.y,
                Rect::new(self.right() - used.right(), self.rect.width),
            ));
        }
        if used.y > self.y {
            out.push(Region::new(
                self.x,
                self.y,
                Rect::new(self.rect.length, used.y - self.y),
            ));
        }
        if used.bottom() < self.bottom() {
            out.push(Region::new(
                self.x,
                used.bottom(),
                Rect::new(self.rect.length, self.bottom() - used.bottom()),
            ));
        }
        out
    }

    /// Drops every region contained in another one. Of two equal regions the
    /// first is kept; survivors stay in their original order.
    pub fn prune(regions: &mut Vec<Region>) {
        let kept: Vec<Region> = regions
            .iter()
            .enumerate()
            .filter(|&(i, r)| {
                !regions
                    .iter()
                    .enumerate()
                    .any(|(j, other)| j != i && other.contains(r) && (other != r || j < i))
            })
            .map(|(_, r)| *r)
            .collect();
        *regions = kept;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub piece: Piece,
    /// Size as placed; the piece's true size, or its rotation.
    pub rect: Rect,
    pub x: u32,
    pub y: u32,
    pub rotated: bool,
    /// Set when the piece fits the sheet in no allowed orientation and was
    /// put on a sheet of its own anyway.
    pub oversized: bool,
}

impl Placement {
    /// A piece that fits the sheet in no allowed orientation, put alone at
    /// the origin of its own sheet.
    pub fn oversized(piece: Piece) -> Self {
        Self {
            piece,
            rect: piece.rect,
            x: 0,
            y: 0,
            rotated: false,
            oversized: true,
        }
    }

    pub fn region(&self) -> Region {
        Region::new(self.x, self.y, self.rect)
    }

    pub fn within(&self, stock: Rect) -> bool {
        self.x as u64 + self.rect.length as u64 <= stock.length as u64
            && self.y as u64 + self.rect.width as u64 <= stock.width as u64
    }

    /// Area of the placement that lies on the sheet.
    pub fn area_on(&self, stock: Rect) -> u64 {
        let length = (self.x.saturating_add(self.rect.length)).min(stock.length);
        let width = (self.y.saturating_add(self.rect.width)).min(stock.width);
        length.saturating_sub(self.x) as u64 * width.saturating_sub(self.y) as u64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sheet {
    pub placements: Vec<Placement>,
}

impl Sheet {
    pub fn used_area(&self, stock: Rect) -> u64 {
        self.placements.iter().map(|p| p.area_on(stock)).sum()
    }

    pub fn waste_area(&self, stock: Rect) -> u64 {
        stock.area() - self.used_area(stock)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CuttingPlan {
    pub stock: Rect,
    pub sheets: Vec<Sheet>,
}

impl CuttingPlan {
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.sheets.iter().flat_map(|s| &s.placements)
    }

    pub fn oversized(&self) -> impl Iterator<Item = &Placement> {
        self.placements().filter(|p| p.oversized)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// First-fit into guillotine free regions, never rotating.
    Guillotine,
    /// Repack a whole sheet for every candidate, trying both orientations.
    #[default]
    Feasibility,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Guillotine => f.write_str("guillotine"),
            Strategy::Feasibility => f.write_str("feasibility"),
        }
    }
}

pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOptions {
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default = "default_true")]
    pub allow_rotate: bool,
    /// Seed for the group color generator.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_true() -> bool {
    true
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            allow_rotate: true,
            seed: DEFAULT_SEED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientations() {
        let piece = Piece::new(0, Rect::new(50, 100));
        assert_eq!(piece.orientations(false), vec![(Rect::new(50, 100), false)]);
        assert_eq!(
            piece.orientations(true),
            vec![(Rect::new(50, 100), false), (Rect::new(100, 50), true)]
        );

        let square = Piece::new(1, Rect::new(40, 40));
        assert_eq!(square.orientations(true).len(), 1);
    }

    #[test]
    fn test_subtract_disjoint() {
        let free = Region::new(0, 0, Rect::new(100, 100));
        let used = Region::new(100, 0, Rect::new(10, 10));
        assert_eq!(free.subtract(&used), vec![free]);
    }

    #[test]
    fn test_subtract_center() {
        let free = Region::new(0, 0, Rect::new(100, 100));
        let used = Region::new(40, 40, Rect::new(20, 20));
        let parts = free.subtract(&used);
        assert_eq!(
            parts,
            vec![
                Region::new(0, 0, Rect::new(40, 100)),
                Region::new(60, 0, Rect::new(40, 100)),
                Region::new(0, 0, Rect::new(100, 40)),
                Region::new(0, 60, Rect::new(100, 40)),
            ]
        );
        assert!(parts.iter().all(|p| !p.intersects(&used)));
    }

    #[test]
    fn test_subtract_whole() {
        let free = Region::new(10, 10, Rect::new(30, 30));
        assert!(free.subtract(&free).is_empty());
    }

    #[test]
    fn test_prune_keeps_order() {
        let mut regions = vec![
            Region::new(50, 50, Rect::new(10, 10)),
            Region::new(0, 0, Rect::new(100, 40)),
            Region::new(0, 0, Rect::new(100, 100)),
            Region::new(200, 0, Rect::new(10, 10)),
            Region::new(200, 0, Rect::new(10, 10)),
            Region::new(0, 0, Rect::new(100, 100)),
        ];
        Region::prune(&mut regions);
        assert_eq!(
            regions,
            vec![
                Region::new(0, 0, Rect::new(100, 100)),
                Region::new(200, 0, Rect::new(10, 10)),
            ]
        );
    }

    #[test]
    fn test_touching_regions_do_not_intersect() {
        let a = Region::new(0, 0, Rect::new(50, 50));
        let b = Region::new(50, 0, Rect::new(50, 50));
        assert!(!a.intersects(&b));
        assert!(Region::new(0, 0, Rect::new(100, 50)).contains(&b));
    }

    #[test]
    fn test_area_on_clips_oversized() {
        let p = Placement::oversized(Piece::new(0, Rect::new(3000, 3000)));
        let stock = Rect::new(2140, 1200);
        assert!(!p.within(stock));
        assert_eq!(p.area_on(stock), stock.area());
    }

    #[test]
    fn test_rect_accepts_integral_floats() {
        let r: Rect = serde_json::from_str(r#"{"length": 2140.0, "width": 1200}"#).unwrap();
        assert_eq!(r, Rect::new(2140, 1200));

        assert!(serde_json::from_str::<Rect>(r#"{"length": 10.5, "width": 1}"#).is_err());
        assert!(serde_json::from_str::<Rect>(r#"{"length": -1, "width": 1}"#).is_err());
    }

    #[test]
    fn test_plan_options_defaults() {
        let opts: PlanOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, PlanOptions::default());

        let opts: PlanOptions =
            serde_json::from_str(r#"{"strategy": "guillotine", "allow_rotate": false}"#).unwrap();
        assert_eq!(opts.strategy, Strategy::Guillotine);
        assert!(!opts.allow_rotate);
        assert_eq!(opts.seed, DEFAULT_SEED);
    }
}
