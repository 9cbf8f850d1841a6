// src/source.rs
//
// The seam between the caching core and the network: anything that can
// turn (page number, sort order) into a list of players. The scheduler
// and manager depend only on this trait; tests plug in stubs.

use std::{error::Error, fmt, str::FromStr};

use crate::player::Player;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    None,
    Ascending,
    #[default]
    Descending,
}

impl FromStr for SortOrder {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(SortOrder::None),
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(format!("Unknown sort order: {}", other).into()),
        }
    }
}

/// Network or parse failure while fetching a page. Carried across the
/// worker thread, hence a concrete Send + Sync type rather than the
/// usual boxed error.
#[derive(Debug)]
pub struct FetchError {
    page_number: u32,
    message: String,
}

impl FetchError {
    pub fn new(page_number: u32, message: impl Into<String>) -> Self {
        Self { page_number, message: message.into() }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {}: {}", self.page_number, self.message)
    }
}

impl Error for FetchError {}

/// A source of player pages. `page_number` is 1-based; the returned
/// vector is one full page, in site order.
pub trait SourceFetcher: Send {
    fn fetch(&self, page_number: u32, sort: SortOrder) -> Result<Vec<Player>, FetchError>;
}
