// src/player.rs

/// Column names for table views and export, in display order.
pub const COLUMNS: [&str; 6] = ["Name", "Role", "Age", "Nationality", "Club", "Price"];

/// One football player as parsed from a market-value page row.
/// Plain value type; never mutated after parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub role: String,
    pub age: u32,
    pub nationality: String,
    pub club: String,
    /// Market value as rendered by the site, e.g. "€120.00m".
    pub price: String,
}

impl Player {
    /// Cell text for column `col` (0..COLUMNS.len()).
    pub fn field(&self, col: usize) -> Option<String> {
        match col {
            0 => Some(self.name.clone()),
            1 => Some(self.role.clone()),
            2 => Some(self.age.to_string()),
            3 => Some(self.nationality.clone()),
            4 => Some(self.club.clone()),
            5 => Some(self.price.clone()),
            _ => None,
        }
    }

    /// Full row in column order, for CSV/TSV export.
    pub fn to_row(&self) -> Vec<String> {
        (0..COLUMNS.len()).filter_map(|c| self.field(c)).collect()
    }
}
