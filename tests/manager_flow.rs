// tests/manager_flow.rs
//
// End-to-end flow through PlayerManager with a scripted source:
// poll → miss → background fetch → range event → re-poll hits.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Mutex;
use std::time::Duration;

use tm_scrape::config::AppConfig;
use tm_scrape::manager::{ManagerEvent, PlayerManager};
use tm_scrape::player::Player;
use tm_scrape::source::{FetchError, SortOrder, SourceFetcher};

struct ScriptedSource {
    calls: Arc<AtomicUsize>,
    sorts_seen: Arc<Mutex<Vec<SortOrder>>>,
    page_size: u32,
}

impl SourceFetcher for ScriptedSource {
    fn fetch(&self, page_number: u32, sort: SortOrder) -> Result<Vec<Player>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sorts_seen.lock().unwrap().push(sort);
        Ok((0..self.page_size)
            .map(|i| Player {
                name: format!("P{}-{}", page_number, i),
                role: "Centre-Back".into(),
                age: 18 + i,
                nationality: "Germany".into(),
                club: "Bayern Munich".into(),
                price: "€40.00m".into(),
            })
            .collect())
    }
}

fn setup(
    page_size: u32,
    capacity: usize,
) -> (PlayerManager, Receiver<ManagerEvent>, Arc<AtomicUsize>, Arc<Mutex<Vec<SortOrder>>>) {
    let config = AppConfig {
        players_on_page: page_size,
        cached_pages: capacity,
        ..AppConfig::default()
    };
    let calls = Arc::new(AtomicUsize::new(0));
    let sorts = Arc::new(Mutex::new(Vec::new()));
    let (manager, events) = PlayerManager::new(
        &config,
        ScriptedSource {
            calls: Arc::clone(&calls),
            sorts_seen: Arc::clone(&sorts),
            page_size,
        },
    );
    (manager, events, calls, sorts)
}

fn wait_ready(events: &Receiver<ManagerEvent>) -> (u32, u32) {
    loop {
        match events.recv_timeout(Duration::from_secs(5)).unwrap() {
            ManagerEvent::RangeReady { start, end } => return (start, end),
            ManagerEvent::Fetching(_) => continue,
        }
    }
}

#[test]
fn poll_miss_fetch_repoll_hit() {
    let (manager, events, calls, _) = setup(25, 3);

    // A rendering loop polls for player 42: not there yet, trigger.
    assert!(manager.get_cached(42).is_none());
    assert!(!manager.is_cached(42));
    manager.get(42);

    // Page 2 arrives with its inclusive index range.
    assert_eq!(wait_ready(&events), (26, 50));

    // The same poll now hits; index 42 is offset 16 into page 2.
    let player = manager.get_cached(42).expect("player 42 cached after fetch");
    assert_eq!(player.name, "P2-16");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn three_page_session_fills_cache_in_order() {
    let (manager, events, calls, _) = setup(10, 5);

    for page in 1..=3u32 {
        manager.get((page - 1) * 10 + 1);
        let (start, end) = wait_ready(&events);
        assert_eq!((start, end), ((page - 1) * 10 + 1, page * 10));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let keys: Vec<u32> = manager.all_cached_pages().iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![1, 2, 3]);
}

#[test]
fn default_sort_reaches_the_source() {
    let (manager, events, _, sorts) = setup(25, 2);
    manager.get(1);
    wait_ready(&events);
    assert_eq!(sorts.lock().unwrap().as_slice(), &[SortOrder::Descending]);
}

#[test]
fn drop_cache_then_refetch() {
    let (manager, events, calls, _) = setup(25, 2);

    manager.get(1);
    wait_ready(&events);
    assert!(manager.is_cached(1));

    manager.drop_cache();
    assert!(manager.get_cached(1).is_none());

    // Same index misses again and triggers a second download.
    manager.get(1);
    wait_ready(&events);
    assert!(manager.is_cached(1));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn cache_holds_at_most_capacity_pages() {
    let (manager, events, _, _) = setup(10, 2);

    for page in 1..=4u32 {
        manager.get((page - 1) * 10 + 1);
        wait_ready(&events);
    }

    let resident = manager.all_cached_pages();
    assert_eq!(resident.len(), 2);
    let keys: Vec<u32> = resident.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![3, 4]);
}
