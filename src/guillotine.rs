use crate::types::{Piece, Placement, Rect, Region, Sheet};

/// Free-space bookkeeping for one sheet packed by guillotine splits.
///
/// Each placement leaves a right strip spanning the full height of the region
/// it landed in and a bottom strip spanning the full length, so the free list
/// holds overlapping regions. Regions that a later placement cuts into are
/// shrunk to their remainders, which keeps the placements themselves disjoint,
/// and regions lying inside another free region are dropped.
#[derive(Debug, Clone)]
pub struct GuillotineSheet {
    stock: Rect,
    pub free_regions: Vec<Region>,
    pub placements: Vec<Placement>,
}

impl GuillotineSheet {
    pub fn new(stock: Rect) -> Self {
        Self {
            stock,
            free_regions: vec![Region::new(0, 0, stock)],
            placements: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// First free region, in list order, that holds `piece` unrotated.
    pub fn find_region(&self, piece: Rect) -> Option<usize> {
        self.free_regions
            .iter()
            .position(|free| piece.fits_in(&free.rect))
    }

    /// Commits `piece` to the corner of region `region_idx` and returns the
    /// placement together with the strips split off that region.
    pub fn place(&mut self, region_idx: usize, piece: Piece) -> (Placement, Vec<Region>) {
        let free = self.free_regions.remove(region_idx);
        let placement = Placement {
            piece,
            rect: piece.rect,
            x: free.x,
            y: free.y,
            rotated: false,
            oversized: false,
        };

        let split = Self::split(free, piece.rect);
        self.shrink(&placement.region());
        self.free_regions.extend_from_slice(&split);
        Region::prune(&mut self.free_regions);
        self.placements.push(placement);

        (placement, split)
    }

    /// Puts a piece that fits nowhere at the origin of this sheet and leaves
    /// no free space behind it.
    pub fn place_oversized(&mut self, piece: Piece) -> Placement {
        let placement = Placement::oversized(piece);
        self.free_regions.clear();
        self.placements.push(placement);
        placement
    }

    fn split(free: Region, placed: Rect) -> Vec<Region> {
        let mut out = Vec::with_capacity(2);
        if placed.length < free.rect.length {
            out.push(Region::new(
                free.x + placed.length,
                free.y,
                Rect::new(free.rect.length - placed.length, free.rect.width),
            ));
        }
        if placed.width < free.rect.width {
            out.push(Region::new(
                free.x,
                free.y + placed.width,
                Rect::new(free.rect.length, free.rect.width - placed.width),
            ));
        }
        out
    }

    /// Replaces every free region the placed piece cuts into with what is
    /// left of it, in place.
    fn shrink(&mut self, used: &Region) {
        if !self.free_regions.iter().any(|r| r.intersects(used)) {
            return;
        }
        self.free_regions = self
            .free_regions
            .iter()
            .flat_map(|r| r.subtract(used))
            .collect();
    }

    pub fn used_area(&self) -> u64 {
        self.placements
            .iter()
            .map(|p| p.area_on(self.stock))
            .sum()
    }

    pub fn into_sheet(self) -> Sheet {
        Sheet {
            placements: self.placements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(id: usize, length: u32, width: u32) -> Piece {
        Piece::new(id, Rect::new(length, width))
    }

    #[test]
    fn test_place_single_piece() {
        let mut sheet = GuillotineSheet::new(Rect::new(100, 100));
        let idx = sheet.find_region(Rect::new(50, 30)).unwrap();
        let (p, split) = sheet.place(idx, piece(0, 50, 30));
        assert_eq!((p.x, p.y), (0, 0));
        assert_eq!(p.rect, Rect::new(50, 30));
        assert!(!p.rotated);
        assert_eq!(
            split,
            vec![
                Region::new(50, 0, Rect::new(50, 100)),
                Region::new(0, 30, Rect::new(100, 70)),
            ]
        );
        assert_eq!(sheet.free_regions, split);
    }

    #[test]
    fn test_piece_too_large() {
        let sheet = GuillotineSheet::new(Rect::new(100, 100));
        assert!(sheet.find_region(Rect::new(200, 50)).is_none());
    }

    #[test]
    fn test_no_rotation_attempted() {
        let sheet = GuillotineSheet::new(Rect::new(100, 50));
        assert!(sheet.find_region(Rect::new(50, 100)).is_none());
    }

    #[test]
    fn test_fill_exact() {
        let mut sheet = GuillotineSheet::new(Rect::new(100, 100));
        let (_, split) = sheet.place(0, piece(0, 100, 100));
        assert!(split.is_empty());
        assert!(sheet.free_regions.is_empty());
        assert_eq!(sheet.used_area(), 10_000);
    }

    #[test]
    fn test_full_length_strip_only() {
        let mut sheet = GuillotineSheet::new(Rect::new(100, 100));
        let (_, split) = sheet.place(0, piece(0, 100, 40));
        assert_eq!(split, vec![Region::new(0, 40, Rect::new(100, 60))]);
    }

    #[test]
    fn test_first_fit_uses_list_order() {
        let mut sheet = GuillotineSheet::new(Rect::new(100, 100));
        sheet.place(0, piece(0, 50, 30));
        // Both strips hold a 20x20 piece; the right strip comes first.
        assert_eq!(sheet.find_region(Rect::new(20, 20)), Some(0));
        // Only the bottom strip is long enough for 80.
        assert_eq!(sheet.find_region(Rect::new(80, 20)), Some(1));
    }

    #[test]
    fn test_overlapping_region_is_shrunk() {
        let mut sheet = GuillotineSheet::new(Rect::new(100, 100));
        sheet.place(0, piece(0, 50, 30));
        // Right strip (50,0) 50x100 overlaps the bottom strip (0,30) 100x70.
        let (p, _) = sheet.place(0, piece(1, 50, 60));
        assert_eq!((p.x, p.y), (50, 0));

        let used = p.region();
        assert!(sheet.free_regions.iter().all(|r| !r.intersects(&used)));
        // What is left of the bottom strip next to the second piece survives.
        assert!(
            sheet
                .free_regions
                .contains(&Region::new(0, 30, Rect::new(50, 70)))
        );
    }

    #[test]
    fn test_four_halves_fill_sheet() {
        let mut sheet = GuillotineSheet::new(Rect::new(1200, 600));
        for id in 0..4 {
            let idx = sheet.find_region(Rect::new(600, 300)).unwrap();
            sheet.place(idx, piece(id, 600, 300));
        }
        assert!(sheet.free_regions.is_empty());
        assert_eq!(sheet.used_area(), 1200 * 600);
        let spots: Vec<(u32, u32)> = sheet.placements.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(spots, vec![(0, 0), (600, 0), (0, 300), (600, 300)]);
    }

    #[test]
    fn test_free_list_stays_small() {
        let mut sheet = GuillotineSheet::new(Rect::new(10_000, 10_000));
        let sizes = [
            Rect::new(37, 53),
            Rect::new(91, 17),
            Rect::new(23, 77),
            Rect::new(61, 41),
        ];
        for id in 0..60 {
            let rect = sizes[id % sizes.len()];
            let idx = sheet.find_region(rect).unwrap();
            sheet.place(idx, Piece::new(id, rect));
            assert!(sheet.free_regions.len() <= 2 * sheet.placements.len() + 1);
        }

        let free = &sheet.free_regions;
        for (i, a) in free.iter().enumerate() {
            for (j, b) in free.iter().enumerate() {
                assert!(i == j || !a.contains(b), "{a:?} holds {b:?}");
            }
            assert!(sheet.placements.iter().all(|p| !p.region().intersects(a)));
        }
    }

    #[test]
    fn test_place_oversized() {
        let stock = Rect::new(2140, 1200);
        let mut sheet = GuillotineSheet::new(stock);
        let p = sheet.place_oversized(piece(0, 3000, 3000));
        assert!(p.oversized);
        assert_eq!((p.x, p.y), (0, 0));
        assert!(sheet.free_regions.is_empty());
        assert_eq!(sheet.used_area(), stock.area());
    }
}
