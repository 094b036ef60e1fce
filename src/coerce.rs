// Best-effort numeric coercion for spreadsheet cells

use crate::data::Cell;

/// Which decoration characters are stripped before parsing.
///
/// `Lenient` removes `%`, `￥`, `$` and thousands separators. `Strict` also
/// removes the `元` suffix; it is the mode used when sanitising chart payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoercionMode {
    #[default]
    Lenient,
    Strict,
}

impl CoercionMode {
    fn strips(self, c: char) -> bool {
        match c {
            '%' | '￥' | '$' | ',' => true,
            '元' => self == CoercionMode::Strict,
            _ => false,
        }
    }
}

/// Coerce a cell to a finite number. Absent, blank, boolean and unparseable
/// cells yield `None`.
pub fn coerce(cell: &Cell, mode: CoercionMode) -> Option<f64> {
    match cell {
        Cell::Empty | Cell::Bool(_) => None,
        Cell::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Cell::Text(s) => parse_decorated(s, mode),
    }
}

/// Strip decoration characters anywhere in `raw`, trim, and parse
pub fn parse_decorated(raw: &str, mode: CoercionMode) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|&c| !mode.strips(c)).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
