// src/config.rs
//
// Compile-time defaults plus an optional line-oriented config file
// (`key = value`, `#` comments). Anything not set in the file keeps
// its default. Validation is fail-fast: a bad value aborts startup
// before any worker thread exists.

use std::{error::Error, fs, path::Path};

use crate::source::SortOrder;

// Net config
pub const HOST: &str = "www.transfermarkt.com";
pub const PLAYERS_PATH: &str = "/spieler-statistik/wertvollstespieler/marktwertetop";
pub const AJAX_ARG: &str = "ajax=yw1";
pub const SORT_ASC_ARG: &str = "sort=marktwert.asc";
pub const SORT_DESC_ARG: &str = "sort=marktwert.desc";

// Paging
pub const PLAYERS_ON_PAGE: u32 = 25;
pub const CACHED_PAGES: usize = 5;

// Export
pub const DEFAULT_OUT_DIR: &str = "out";
pub const DEFAULT_FILE_STEM: &str = "players";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub players_path: String,
    pub ajax_arg: String,
    pub sort_asc_arg: String,
    pub sort_desc_arg: String,
    pub players_on_page: u32,
    pub cached_pages: usize,
    pub default_sort: SortOrder,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: s!(HOST),
            players_path: s!(PLAYERS_PATH),
            ajax_arg: s!(AJAX_ARG),
            sort_asc_arg: s!(SORT_ASC_ARG),
            sort_desc_arg: s!(SORT_DESC_ARG),
            players_on_page: PLAYERS_ON_PAGE,
            cached_pages: CACHED_PAGES,
            default_sort: SortOrder::Descending,
        }
    }
}

impl AppConfig {
    /// Load from a config file. Missing file is an error; a present file
    /// only overrides the keys it names.
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
        Self::parse(&text)
    }

    /// Parse config text into a validated AppConfig.
    pub fn parse(text: &str) -> Result<Self, Box<dyn Error>> {
        let mut cfg = Self::default();

        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(format!("Config line {}: expected key = value", lineno + 1).into());
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "host" => cfg.host = s!(value),
                "players_path" => cfg.players_path = s!(value),
                "ajax_arg" => cfg.ajax_arg = s!(value),
                "sort_asc_arg" => cfg.sort_asc_arg = s!(value),
                "sort_desc_arg" => cfg.sort_desc_arg = s!(value),
                "players_on_page" => cfg.players_on_page = value.parse()?,
                "cached_pages" => cfg.cached_pages = value.parse()?,
                "sort" => cfg.default_sort = value.parse()?,
                other => return Err(format!("Unknown config key: {}", other).into()),
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.players_on_page == 0 {
            return Err("players_on_page must be positive".into());
        }
        if self.cached_pages == 0 {
            return Err("cached_pages must be positive".into());
        }
        if self.host.is_empty() {
            return Err("host must not be empty".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn parse_overrides_only_named_keys() {
        let cfg = AppConfig::parse(
            "# paging\n\
             players_on_page = 10\n\
             cached_pages = 3\n\
             sort = asc\n",
        )
        .unwrap();
        assert_eq!(cfg.players_on_page, 10);
        assert_eq!(cfg.cached_pages, 3);
        assert_eq!(cfg.default_sort, SortOrder::Ascending);
        assert_eq!(cfg.host, HOST); // untouched default
    }

    #[test]
    fn zero_page_size_rejected() {
        let err = AppConfig::parse("players_on_page = 0\n").unwrap_err();
        assert!(err.to_string().contains("players_on_page"));
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(AppConfig::parse("cached_pages = 0\n").is_err());
    }

    #[test]
    fn unknown_key_rejected() {
        let err = AppConfig::parse("colour = red\n").unwrap_err();
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn bad_sort_rejected() {
        assert!(AppConfig::parse("sort = sideways\n").is_err());
    }
}
