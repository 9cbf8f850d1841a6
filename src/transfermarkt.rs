// src/transfermarkt.rs
//
// Concrete SourceFetcher for the transfermarkt market-value table.
// Network half builds the paged/sorted URL and pulls the document;
// parsing is a pure function over the markup so it can be exercised
// offline.
//
// Assumptions (by design, mirrors the site):
// - player rows are <tr class="odd"> / <tr class="even">
// - name sits in an <a class="spielprofil_tooltip">
// - role is the second row of the nested inline-table
// - the zentriert cells are rank, age, nationality flag, club badge
// - market value is in the "rechts hauptlink" cell

use crate::config::AppConfig;
use crate::core::html::{
    attr_value_ci, find_ci, inner_after_open_tag, next_tag_block_ci, open_tag_ci, strip_tags,
};
use crate::core::net;
use crate::core::sanitize::normalize_entities;
use crate::player::Player;
use crate::source::{FetchError, SortOrder, SourceFetcher};

pub struct TransfermarktPage {
    config: AppConfig,
}

impl TransfermarktPage {
    pub fn new(config: &AppConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Path + query for one page: ajax arg, page number, sort directive.
    pub fn build_path(&self, page_number: u32, sort: SortOrder) -> String {
        let mut path = join!(&self.config.players_path, "?", &self.config.ajax_arg);
        path.push_str(&format!("&page={}", page_number));
        match sort {
            SortOrder::Ascending => {
                path.push('&');
                path.push_str(&self.config.sort_asc_arg);
            }
            SortOrder::Descending => {
                path.push('&');
                path.push_str(&self.config.sort_desc_arg);
            }
            SortOrder::None => {}
        }
        path
    }
}

impl SourceFetcher for TransfermarktPage {
    fn fetch(&self, page_number: u32, sort: SortOrder) -> Result<Vec<Player>, FetchError> {
        if page_number == 0 {
            return Err(FetchError::new(0, "page numbers are 1-based"));
        }
        let path = self.build_path(page_number, sort);
        let doc = net::http_get(&self.config.host, &path)
            .map_err(|e| FetchError::new(page_number, e.to_string()))?;

        let players = parse_players(&doc);
        if players.is_empty() {
            return Err(FetchError::new(
                page_number,
                "no player rows found (site format changed?)",
            ));
        }
        Ok(players)
    }
}

/* ---------- parsing ---------- */

/// Extract every well-formed player row from a market-value document.
/// Malformed rows are skipped (logged), never fatal.
pub fn parse_players(doc: &str) -> Vec<Player> {
    let mut out = Vec::new();
    for segment in player_row_segments(doc) {
        match parse_row(segment) {
            Some(p) => out.push(p),
            None => logd!("players parse: skipped malformed row"),
        }
    }
    out
}

/// Document slices, one per odd/even row, from its open tag up to the
/// next such row (or end of document). Nested inline-table rows carry
/// no odd/even class, so they never split a segment.
fn player_row_segments(doc: &str) -> Vec<&str> {
    let mut starts = Vec::new();
    for needle in [r#"<tr class="odd""#, r#"<tr class="even""#] {
        let mut from = 0usize;
        while let Some(i) = find_ci(doc, needle, from) {
            starts.push(i);
            from = i + needle.len();
        }
    }
    starts.sort_unstable();

    let mut segs = Vec::with_capacity(starts.len());
    for (n, &s) in starts.iter().enumerate() {
        let end = starts.get(n + 1).copied().unwrap_or(doc.len());
        segs.push(&doc[s..end]);
    }
    segs
}

fn parse_row(tr: &str) -> Option<Player> {
    let name = parse_name(tr)?;
    let role = parse_role(tr)?;

    let cells = zentriert_cells(tr);
    // rank, age, nationality, club
    if cells.len() < 4 {
        return None;
    }
    let age: u32 = strip_tags(inner_after_open_tag(cells[1])).parse().ok()?;
    let nationality = first_img_attr(cells[2], "title")?;
    let club = first_img_attr(cells[3], "alt")?;

    let price = parse_price(tr)?;

    Some(Player { name, role, age, nationality, club, price })
}

/// Text of the <a class="spielprofil_tooltip"> profile link.
fn parse_name(tr: &str) -> Option<String> {
    let marker = find_ci(tr, "spielprofil_tooltip", 0)?;
    let text_start = tr[marker..].find('>')? + marker + 1;
    let text_end = find_ci(tr, "</a>", text_start)?;
    let name = strip_tags(normalize_entities(&tr[text_start..text_end]));
    if name.is_empty() { None } else { Some(name) }
}

/// Second row of the nested inline-table holds the position.
fn parse_role(tr: &str) -> Option<String> {
    let table = find_ci(tr, "inline-table", 0)?;
    let first_row_end = find_ci(tr, "</tr>", table)?;
    let (s, e) = next_tag_block_ci(tr, "<td", "</td>", first_row_end)?;
    let role = strip_tags(normalize_entities(&inner_after_open_tag(&tr[s..e])));
    if role.is_empty() { None } else { Some(role) }
}

/// All <td> blocks whose class mentions "zentriert", in row order.
fn zentriert_cells(tr: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    while let Some((s, e)) = next_tag_block_ci(tr, "<td", "</td>", pos) {
        let block = &tr[s..e];
        if td_class(block).contains("zentriert") {
            out.push(block);
        }
        pos = e;
    }
    out
}

fn td_class(block: &str) -> String {
    let open_end = block.find('>').map(|i| i + 1).unwrap_or(block.len());
    attr_value_ci(&block[..open_end], "class").unwrap_or_default()
}

fn first_img_attr(block: &str, attr: &str) -> Option<String> {
    let (s, e) = open_tag_ci(block, "<img", 0)?;
    let value = attr_value_ci(&block[s..e], attr)?;
    let value = normalize_entities(&value).trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

/// Market value from the "rechts hauptlink" cell.
fn parse_price(tr: &str) -> Option<String> {
    let mut pos = 0usize;
    while let Some((s, e)) = next_tag_block_ci(tr, "<td", "</td>", pos) {
        let block = &tr[s..e];
        if td_class(block).contains("rechts") {
            let price = strip_tags(normalize_entities(&inner_after_open_tag(block)));
            return if price.is_empty() { None } else { Some(price) };
        }
        pos = e;
    }
    None
}
