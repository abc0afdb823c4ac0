use crate::grouping::PieceGroups;
use crate::types::{Placement, Rect};

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

/// Character grid a sheet is drawn on. Frames that meet share `+` joints.
struct Canvas {
    cells: Vec<Vec<char>>,
}

impl Canvas {
    fn new(cols: usize, rows: usize) -> Self {
        Self {
            cells: vec![vec![' '; cols + 1]; rows + 1],
        }
    }

    fn put(&mut self, x: usize, y: usize, ch: char) {
        let Some(cell) = self.cells.get_mut(y).and_then(|row| row.get_mut(x)) else {
            return;
        };
        *cell = match (*cell, ch) {
            ('+', _) | ('-', '|') | ('|', '-') => '+',
            _ => ch,
        };
    }

    fn frame(&mut self, x: usize, y: usize, w: usize, h: usize) {
        for i in x..=x + w {
            self.put(i, y, '-');
            self.put(i, y + h, '-');
        }
        for j in y..=y + h {
            self.put(x, j, '|');
            self.put(x + w, j, '|');
        }
        for (cx, cy) in [(x, y), (x + w, y), (x, y + h), (x + w, y + h)] {
            self.put(cx, cy, '+');
        }
    }

    /// Writes `text` centered on the middle row of a frame, keeping only the
    /// characters that land strictly inside it.
    fn label(&mut self, x: usize, y: usize, w: usize, h: usize, text: &str) {
        if w <= 2 {
            return;
        }
        let row = y + h / 2;
        if row <= y || row >= y + h {
            return;
        }
        let start = (x + w / 2).saturating_sub(text.chars().count() / 2);
        let Some(line) = self.cells.get_mut(row) else {
            return;
        };
        for (col, ch) in (start..).zip(text.chars()) {
            if col > x && col < x + w && col < line.len() {
                line[col] = ch;
            }
        }
    }

    fn finish(self) -> String {
        let mut out = String::new();
        for row in self.cells {
            let line: String = row.into_iter().collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

/// ASCII drawing of one sheet, each piece labeled `group:LxW`.
pub fn render_sheet(stock: Rect, placements: &[Placement], groups: &PieceGroups) -> String {
    let scale = f64::min(
        MAX_WIDTH / stock.length as f64,
        MAX_HEIGHT / stock.width as f64,
    );
    let cells = |units: u32| (units as f64 * scale).round() as usize;

    let (cols, rows) = (cells(stock.length), cells(stock.width));
    if cols == 0 || rows == 0 {
        return String::new();
    }

    let mut canvas = Canvas::new(cols, rows);
    canvas.frame(0, 0, cols, rows);

    for p in placements {
        // Oversized pieces are drawn clipped to the sheet.
        let length = p.rect.length.min(stock.length.saturating_sub(p.x));
        let width = p.rect.width.min(stock.width.saturating_sub(p.y));
        let (x, y, w, h) = (cells(p.x), cells(p.y), cells(length), cells(width));
        if w == 0 || h == 0 {
            continue;
        }

        canvas.frame(x, y, w, h);
        let text = match groups.group_of(p) {
            Some(g) => format!("{}:{}", g.id, p.rect),
            None => p.rect.to_string(),
        };
        canvas.label(x, y, w, h, &text);
    }

    canvas.finish()
}

/// One line per group in id order: id, true size, color and count.
pub fn render_legend(groups: &PieceGroups) -> String {
    let mut result = String::new();
    for g in groups.iter() {
        result.push_str(&format!(
            "  ID {}: {}  {}  (x{})\n",
            g.id, g.size, g.color, g.count
        ));
    }
    result
}
