use std::collections::BTreeMap;
use std::io::Write;

use crossterm::{
    cursor,
    terminal::{self, ClearType},
    QueueableCommand,
};

/// Character grid made of stacked layers. Higher layers cover lower ones.
///
/// Coordinates are signed so callers can place text partially off screen;
/// cells outside the grid are silently dropped.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u16,
    height: u16,
    layers: Vec<BTreeMap<(u16, u16), char>>,
}

impl Canvas {
    pub fn new(width: u16, height: u16, layers: usize) -> Self {
        Self {
            width,
            height,
            layers: vec![BTreeMap::new(); layers.max(1)],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn set_char(&mut self, layer: usize, x: i64, y: i64, ch: char) {
        let Some(cell) = self.cell(x, y) else {
            return;
        };
        if let Some(cells) = self.layers.get_mut(layer) {
            cells.insert(cell, ch);
        }
    }

    pub fn set_string(&mut self, layer: usize, x: i64, y: i64, text: &str) {
        for (offset, ch) in text.chars().enumerate() {
            self.set_char(layer, x + offset as i64, y, ch);
        }
    }

    /// Removes `len` cells starting at `(x, y)` from one layer.
    pub fn erase(&mut self, layer: usize, x: i64, y: i64, len: usize) {
        for offset in 0..len {
            let Some(cell) = self.cell(x + offset as i64, y) else {
                continue;
            };
            if let Some(cells) = self.layers.get_mut(layer) {
                cells.remove(&cell);
            }
        }
    }

    pub fn clear_layer(&mut self, layer: usize) {
        if let Some(cells) = self.layers.get_mut(layer) {
            cells.clear();
        }
    }

    /// Flattens all layers into one string per row.
    pub fn compose(&self) -> Vec<String> {
        let mut rows = vec![vec![' '; self.width as usize]; self.height as usize];
        for cells in &self.layers {
            for (&(x, y), &ch) in cells {
                rows[y as usize][x as usize] = ch;
            }
        }
        rows.into_iter()
            .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
            .collect()
    }

    /// Writes the composed frame. With `ansi` the cursor is homed and the
    /// screen cleared first; otherwise frames are separated by a rule.
    pub fn present<W: Write>(&self, out: &mut W, ansi: bool) -> std::io::Result<()> {
        if ansi {
            out.queue(terminal::Clear(ClearType::All))?
                .queue(cursor::MoveTo(0, 0))?;
        } else {
            writeln!(out, "{}", "-".repeat(self.width as usize))?;
        }
        for row in self.compose() {
            writeln!(out, "{row}")?;
        }
        out.flush()
    }

    fn cell(&self, x: i64, y: i64) -> Option<(u16, u16)> {
        let x = u16::try_from(x).ok().filter(|x| *x < self.width)?;
        let y = u16::try_from(y).ok().filter(|y| *y < self.height)?;
        Some((x, y))
    }
}
