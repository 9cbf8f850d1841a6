// src/manager.rs
//
// PlayerManager is the single surface a consumer (table view, CLI run
// loop, exporter) talks to. It addresses players by flat 1-based index,
// translates that to a page number, serves hits from the LRU cache and
// turns misses into background downloads. Completion runs on the
// download worker: it inserts the page into the shared cache and only
// then sends a RangeReady event over the channel, so a consumer that
// re-polls on receipt always observes the page.
//
// Index convention: indices are 1-based. page_number(i) = ceil(i / page
// size), with index 0 coerced to page 1; the in-page offset is
// (i - 1) % page_size. Index 0 therefore maps to a page but never to a
// player.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::cache::PageCache;
use crate::config::AppConfig;
use crate::player::Player;
use crate::scheduler::DownloadScheduler;
use crate::source::{SortOrder, SourceFetcher};

/// Events a consumer receives on its own thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManagerEvent {
    /// A download for this page was accepted; data is not available yet.
    /// The consumer can surface a busy/inactive state until the range
    /// arrives.
    Fetching(u32),
    /// Players with flat indices in `start..=end` are now in the cache.
    /// Fired exactly once per completed page, after the cache insert.
    RangeReady { start: u32, end: u32 },
}

pub struct PlayerManager {
    cache: Arc<Mutex<PageCache>>,
    scheduler: DownloadScheduler,
    events: Sender<ManagerEvent>,
    page_size: u32,
    capacity: usize,
    default_sort: SortOrder,
}

impl PlayerManager {
    /// Builds the manager and its event channel. The receiver end is
    /// handed to the consumer; every completion and pending signal
    /// arrives there.
    pub fn new<F>(config: &AppConfig, fetcher: F) -> (Self, Receiver<ManagerEvent>)
    where
        F: SourceFetcher + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let manager = Self {
            cache: Arc::new(Mutex::new(PageCache::new(config.cached_pages))),
            scheduler: DownloadScheduler::new(fetcher),
            events: tx,
            page_size: config.players_on_page,
            capacity: config.cached_pages,
            default_sort: config.default_sort,
        };
        (manager, rx)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Page that owns flat index `i`. 1-based; index 0 coerces to page 1.
    pub fn page_number(&self, index: u32) -> u32 {
        if index == 0 {
            return 1;
        }
        index.div_ceil(self.page_size)
    }

    /// In-page offset for flat index `i`, or None for the invalid index 0.
    fn offset(&self, index: u32) -> Option<usize> {
        if index == 0 {
            return None;
        }
        Some(((index - 1) % self.page_size) as usize)
    }

    pub fn is_cached(&self, index: u32) -> bool {
        let page = self.page_number(index);
        lock(&self.cache).contains(page)
    }

    /// Make the player at `index` available. Cached: nothing to do (use
    /// `get_cached`). Miss: schedule a background download of the owning
    /// page. Never blocks; while a download is pending, repeat calls are
    /// no-ops and trigger no additional fetch.
    pub fn get(&self, index: u32) {
        let page = self.page_number(index);
        if lock(&self.cache).contains(page) {
            return;
        }

        let cache = Arc::clone(&self.cache);
        let events = self.events.clone();
        let page_size = self.page_size;

        let accepted =
            self.scheduler
                .schedule_download(page, self.default_sort, move |page_number, players| {
                    // Worker thread. Insert first, notify second.
                    lock(&cache).insert(page_number, players);
                    let start = page_size * (page_number - 1) + 1;
                    let end = page_size * page_number;
                    let _ = events.send(ManagerEvent::RangeReady { start, end });
                });

        if accepted {
            let _ = self.events.send(ManagerEvent::Fetching(page));
        }
    }

    /// Player at `index` if its page is resident, else None. A lookup
    /// refreshes the page's recency.
    pub fn get_cached(&self, index: u32) -> Option<Player> {
        let page = self.page_number(index);
        let offset = self.offset(index)?;
        lock(&self.cache).get(page)?.get(offset).cloned()
    }

    /// Throw away every cached page. Downloads already in flight are not
    /// cancelled; when they complete they land in the fresh cache (their
    /// page numbers are still valid).
    pub fn drop_cache(&self) {
        let mut cache = lock(&self.cache);
        *cache = PageCache::new(self.capacity);
        logf!("player manager: cache dropped");
    }

    /// Owned snapshot of every resident page, least recently used first.
    /// Export-style read access; only cached data is visible.
    pub fn all_cached_pages(&self) -> Vec<(u32, Vec<Player>)> {
        lock(&self.cache)
            .entries()
            .map(|(k, p)| (k, p.to_vec()))
            .collect()
    }
}

fn lock(cache: &Mutex<PageCache>) -> MutexGuard<'_, PageCache> {
    cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
