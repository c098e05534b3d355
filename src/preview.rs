//! The edit hook as pure planning. A host hands over a snapshot of the
//! edited range (all values read up front, never per cell); `plan`
//! returns the style writes for every cell holding a hex colour code and
//! the host applies them. Nothing here touches a file.

use log::debug;

use crate::color;

/// Row-major grid of cell values. Rows may be ragged when the source
/// sheet has trailing gaps; `col_count` is the widest row.
#[derive(Debug, Clone, Default)]
pub struct RangeSnapshot {
    values: Vec<Vec<String>>,
}

impl RangeSnapshot {
    pub fn new(values: Vec<Vec<String>>) -> Self {
        RangeSnapshot { values }
    }

    pub fn from_rows<R, V>(rows: R) -> Self
    where
        R: IntoIterator<Item = V>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        RangeSnapshot {
            values: rows
                .into_iter()
                .map(|row| row.into_iter().map(|v| v.into()).collect())
                .collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.values.len()
    }

    pub fn col_count(&self) -> usize {
        self.values.iter().map(|row| row.len()).max().unwrap_or(0)
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.values.get(row)?.get(col).map(String::as_str)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.values.iter().map(Vec::as_slice)
    }
}

/// One style mutation: set the cell at (row, col) to the given background
/// and foreground. Positions are 0-indexed; writers translate to their
/// own addressing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub row: u32,
    pub col: u32,
    pub background: String,
    pub foreground: String,
}

/// How the readable foreground is derived from the matched colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Foreground {
    /// Add a signed offset to each channel (negative darkens).
    Shaded(i32),
    /// Bitwise complement of the colour.
    Inverted,
}

/// Planner configuration. Defaults to darkening by 20; `inverted()`
/// selects the complement variant instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewRule {
    foreground: Foreground,
}

impl Default for PreviewRule {
    fn default() -> Self {
        PreviewRule {
            foreground: Foreground::Shaded(-20),
        }
    }
}

impl PreviewRule {
    pub fn new() -> Self {
        PreviewRule::default()
    }

    pub fn shade_amount(mut self, amount: i32) -> Self {
        self.foreground = Foreground::Shaded(amount);
        self
    }

    pub fn inverted(mut self) -> Self {
        self.foreground = Foreground::Inverted;
        self
    }

    /// Foreground colour for an already-validated cell value.
    pub fn foreground_for(&self, value: &str) -> String {
        match self.foreground {
            Foreground::Shaded(amount) => color::shade(value, amount),
            Foreground::Inverted => color::invert(value),
        }
    }

    /// Walk the range row-major and emit one write per cell whose value is
    /// a hex colour code. The background keeps the literal cell value;
    /// everything else is skipped silently.
    pub fn plan(&self, range: &RangeSnapshot) -> Vec<CellWrite> {
        let mut writes = Vec::new();
        for (row, cells) in range.values.iter().enumerate() {
            for (col, value) in cells.iter().enumerate() {
                if color::is_valid_hex(value) {
                    writes.push(CellWrite {
                        row: row as u32,
                        col: col as u32,
                        background: value.clone(),
                        foreground: self.foreground_for(value),
                    });
                }
            }
        }
        debug!(
            "planned {} writes over a {}x{} range",
            writes.len(),
            range.row_count(),
            range.col_count()
        );
        writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plans_matching_cells_and_skips_the_rest() {
        let range = RangeSnapshot::from_rows([["#336699", "hello"]]);
        let writes = PreviewRule::new().plan(&range);
        assert_eq!(
            writes,
            vec![CellWrite {
                row: 0,
                col: 0,
                background: "#336699".to_string(),
                foreground: "#1f5285".to_string(),
            }]
        );
    }

    #[test]
    fn walks_the_range_row_major() {
        let range = RangeSnapshot::from_rows([
            ["x", "#111111"],
            ["#222222", "y"],
            ["#333", "z"],
        ]);
        let writes = PreviewRule::new().plan(&range);
        let positions: Vec<(u32, u32)> = writes.iter().map(|w| (w.row, w.col)).collect();
        assert_eq!(positions, vec![(0, 1), (1, 0), (2, 0)]);
    }

    #[test]
    fn background_keeps_the_literal_value() {
        let range = RangeSnapshot::from_rows([["#AbC"]]);
        let writes = PreviewRule::new().plan(&range);
        assert_eq!(writes[0].background, "#AbC");
        assert_eq!(writes[0].foreground, "#96a7b8");
    }

    #[test]
    fn inverted_variant_complements_the_colour() {
        let range = RangeSnapshot::from_rows([["#000"]]);
        let writes = PreviewRule::new().inverted().plan(&range);
        assert_eq!(writes[0].foreground, "#ffffff");
    }

    #[test]
    fn custom_shade_amount_is_used() {
        let range = RangeSnapshot::from_rows([["#404040"]]);
        let writes = PreviewRule::new().shade_amount(32).plan(&range);
        assert_eq!(writes[0].foreground, "#606060");
    }

    #[test]
    fn empty_range_plans_nothing() {
        let writes = PreviewRule::new().plan(&RangeSnapshot::default());
        assert!(writes.is_empty());
    }

    #[test]
    fn ragged_rows_are_tolerated() {
        let range = RangeSnapshot::from_rows(vec![
            vec!["#112233"],
            vec!["a", "b", "#445566"],
        ]);
        assert_eq!(range.col_count(), 3);
        let writes = PreviewRule::new().plan(&range);
        assert_eq!(writes.len(), 2);
        assert_eq!((writes[1].row, writes[1].col), (1, 2));
    }
}
