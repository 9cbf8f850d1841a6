// src/cli.rs
use std::{env, error::Error, path::PathBuf, sync::mpsc::Receiver, time::Duration};

use crate::config::{AppConfig, DEFAULT_FILE_STEM, DEFAULT_OUT_DIR};
use crate::csv::Delim;
use crate::export;
use crate::manager::{ManagerEvent, PlayerManager};
use crate::progress::Progress;
use crate::source::SortOrder;
use crate::transfermarkt::TransfermarktPage;

/// How long to wait for one page before giving up. Fetch failures are
/// swallowed by the core (worker goes idle, no event), so the CLI's only
/// failure signal is silence.
const PAGE_WAIT_SECS: u64 = 30;

#[derive(Clone)]
pub struct Params {
    pub players: Option<u32>,        // materialize the first N players
    pub pages: Option<(u32, u32)>,   // explicit inclusive page range
    pub sort: Option<SortOrder>,     // override config default
    pub out: Option<PathBuf>,        // output path (file, or dir hint)
    pub format: Delim,
    pub include_headers: bool,
    pub config_path: Option<PathBuf>,
}

impl Params {
    pub fn new() -> Self {
        Self {
            players: None,
            pages: None,
            sort: None,
            out: None,
            format: Delim::Csv,
            include_headers: false,
            config_path: None,
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::new()
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let params = parse_cli()?;
    let written = run_params(&params, &mut ConsoleProgress)?;
    println!("Wrote {}", written.display());
    Ok(())
}

pub fn run_params(
    params: &Params,
    progress: &mut dyn Progress,
) -> Result<PathBuf, Box<dyn Error>> {
    let mut config = match &params.config_path {
        Some(p) => AppConfig::load(p)?,
        None => AppConfig::default(),
    };
    if let Some(sort) = params.sort {
        config.default_sort = sort;
    }

    let fetcher = TransfermarktPage::new(&config);
    let (manager, events) = PlayerManager::new(&config, fetcher);

    let pages = wanted_pages(params, config.players_on_page)?;
    progress.begin(pages.len());

    for &page in &pages {
        let first_index = (page - 1) * config.players_on_page + 1;
        if manager.is_cached(first_index) {
            progress.item_done(page);
            continue;
        }
        manager.get(first_index);
        wait_for_page(&events, page, config.players_on_page)?;
        progress.item_done(page);
    }
    progress.finish();

    let out_path = match &params.out {
        Some(hint) => export::resolve_out_path(hint, DEFAULT_FILE_STEM, params.format),
        None => PathBuf::from(DEFAULT_OUT_DIR)
            .join(join!(DEFAULT_FILE_STEM, ".", params.format.ext())),
    };

    let snapshot = manager.all_cached_pages();
    export::write_players(&out_path, params.format, params.include_headers, &snapshot)
}

/// Block on the event channel until the range covering `page` arrives.
fn wait_for_page(
    events: &Receiver<ManagerEvent>,
    page: u32,
    page_size: u32,
) -> Result<(), Box<dyn Error>> {
    let want_start = (page - 1) * page_size + 1;
    loop {
        match events.recv_timeout(Duration::from_secs(PAGE_WAIT_SECS)) {
            Ok(ManagerEvent::Fetching(p)) => {
                logd!("cli: page {p} pending");
            }
            Ok(ManagerEvent::RangeReady { start, end }) => {
                logf!("cli: players {start}..={end} ready");
                if start == want_start {
                    return Ok(());
                }
            }
            Err(_) => {
                return Err(format!(
                    "Page {} did not arrive within {}s; the fetch likely failed, see {}",
                    page,
                    PAGE_WAIT_SECS,
                    crate::log::log_path()
                )
                .into());
            }
        }
    }
}

/// Translate --players / --page into an ordered page list.
fn wanted_pages(params: &Params, page_size: u32) -> Result<Vec<u32>, Box<dyn Error>> {
    if let Some((a, b)) = params.pages {
        if a == 0 || b < a {
            return Err(format!("Invalid page range: {}-{}", a, b).into());
        }
        return Ok((a..=b).collect());
    }
    if let Some(n) = params.players {
        if n == 0 {
            return Err("--players must be positive".into());
        }
        let last = n.div_ceil(page_size);
        return Ok((1..=last).collect());
    }
    Ok(vec![1])
}

fn parse_cli() -> Result<Params, Box<dyn Error>> {
    let mut params = Params::new();

    let mut args = env::args().skip(1);
    while let Some(a) = args.next() {
        match a.as_str() {
            "-n" | "--players" => {
                let v: u32 = args.next().ok_or("Missing value for --players")?.parse()?;
                params.players = Some(v);
            }
            "-p" | "--page" => {
                let v = args.next().ok_or("Missing value for --page")?;
                params.pages = Some(parse_page_range(&v)?);
            }
            "--sort" => {
                let v = args.next().ok_or("Missing value for --sort")?;
                params.sort = Some(v.parse()?);
            }
            "-o" | "--out" => params.out = Some(PathBuf::from(args.next().ok_or("Missing output path")?)),
            "--format" => {
                let v = args.next().ok_or("Missing value for --format")?;
                params.format = match v.to_ascii_lowercase().as_str() {
                    "csv" => Delim::Csv,
                    "tsv" => Delim::Tsv,
                    other => return Err(format!("Unknown format: {}", other).into()),
                };
            }
            "--include-headers" => params.include_headers = true,
            "-c" | "--config" => params.config_path = Some(PathBuf::from(args.next().ok_or("Missing config path")?)),
            "-h" | "--help" => {
                eprintln!("{}", include_str!("cli_help.txt"));
                std::process::exit(0);
            }
            _ => return Err(format!("Unknown arg: {}", a).into()),
        }
    }

    Ok(params)
}

/// "3" → (3,3); "2-5" → (2,5)
fn parse_page_range(s: &str) -> Result<(u32, u32), Box<dyn Error>> {
    if let Some(dash) = s.find('-') {
        let a: u32 = s[..dash].trim().parse()?;
        let b: u32 = s[dash + 1..].trim().parse()?;
        if a == 0 || a > b {
            return Err(format!("Invalid range: {}", s).into());
        }
        Ok((a, b))
    } else {
        let v: u32 = s.trim().parse()?;
        if v == 0 {
            return Err("Page numbers are 1-based".into());
        }
        Ok((v, v))
    }
}

/// Prints one line per completed page.
struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        eprintln!("Fetching {} page(s)…", total);
    }
    fn log(&mut self, msg: &str) {
        eprintln!("{msg}");
    }
    fn item_done(&mut self, page_number: u32) {
        eprintln!("  page {} done", page_number);
    }
}
