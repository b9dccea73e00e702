//! End-to-end search behaviour against fake provider endpoints

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use websearch_rs::cache::{CacheEntry, CacheStore, Clock, MemoryStore, ResultCache, SqliteStore};
use websearch_rs::error::{Result as SearchResultOf, SearchError};
use websearch_rs::network::HttpClient;
use websearch_rs::providers::{DuckDuckGo, Google, ProviderClient};
use websearch_rs::{Search, Source};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GOOGLE_PATH: &str = "/search";
const DDG_PATH: &str = "/html/";

struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    fn new() -> Self {
        Self(Mutex::new(Utc::now()))
    }

    fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now = *now + chrono::Duration::from_std(by).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Store whose every operation fails
struct BrokenStore;

#[async_trait]
impl CacheStore for BrokenStore {
    async fn load(&self, _key: &str) -> SearchResultOf<Option<CacheEntry>> {
        Err(SearchError::CacheUnavailable("disk on fire".into()))
    }

    async fn store(&self, _entry: CacheEntry) -> SearchResultOf<()> {
        Err(SearchError::CacheUnavailable("disk on fire".into()))
    }

    async fn remove_stale(&self, _key: &str, _stale_at: DateTime<Utc>) -> SearchResultOf<()> {
        Err(SearchError::CacheUnavailable("disk on fire".into()))
    }
}

fn google_page(blocks: &[(&str, &str, Option<&str>)]) -> String {
    let body: String = blocks
        .iter()
        .map(|(title, href, snippet)| {
            let snippet = snippet
                .map(|s| format!(r#"<div class="VwiC3b">{}</div>"#, s))
                .unwrap_or_default();
            format!(
                r#"<div class="g"><a href="{}"><h3>{}</h3></a>{}</div>"#,
                href, title, snippet
            )
        })
        .collect();
    format!("<html><body><div id=\"rso\">{}</div></body></html>", body)
}

fn ddg_page(blocks: &[(&str, &str, &str)]) -> String {
    let body: String = blocks
        .iter()
        .map(|(title, href, snippet)| {
            format!(
                r#"<div class="result"><h2 class="result__title"><a class="result__a" href="{}">{}</a></h2><a class="result__snippet">{}</a></div>"#,
                href, title, snippet
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", body)
}

fn numbered_google_blocks(n: usize) -> Vec<(String, String, String)> {
    (1..=n)
        .map(|i| {
            (
                format!("Result {}", i),
                format!("https://example.com/{}", i),
                format!("Snippet {}", i),
            )
        })
        .collect()
}

fn google_page_owned(blocks: &[(String, String, String)]) -> String {
    let borrowed: Vec<(&str, &str, Option<&str>)> = blocks
        .iter()
        .map(|(t, h, s)| (t.as_str(), h.as_str(), Some(s.as_str())))
        .collect();
    google_page(&borrowed)
}

async fn mount(server: &MockServer, route: &str, template: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .expect(times)
        .mount(server)
        .await;
}

fn ok(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(body)
}

fn providers(server: &MockServer) -> Vec<ProviderClient> {
    let client = HttpClient::new().unwrap();
    let google = Google::with_base_url(&format!("{}{}", server.uri(), GOOGLE_PATH)).unwrap();
    let ddg = DuckDuckGo::with_base_url(&format!("{}{}", server.uri(), DDG_PATH)).unwrap();
    vec![
        ProviderClient::new(Arc::new(google), client.clone()),
        ProviderClient::new(Arc::new(ddg), client),
    ]
}

struct Harness {
    server: MockServer,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
}

impl Harness {
    async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(ManualClock::new()),
        }
    }

    fn search(&self) -> Search {
        let cache = ResultCache::with_clock(self.store.clone(), self.clock.clone());
        Search::new(providers(&self.server), cache)
    }
}

#[tokio::test]
async fn repeated_search_fetches_once() {
    let h = Harness::start().await;
    let page = google_page(&[("Rust", "https://www.rust-lang.org/learn", Some("Learn Rust"))]);
    mount(&h.server, GOOGLE_PATH, ok(page), 1).await;
    mount(&h.server, DDG_PATH, ok(String::new()), 0).await;
    let search = h.search();

    let first = search.search("rust", 5).await;
    let second = search.search("rust", 5).await;

    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
    assert_eq!(search.metrics().snapshot().cache_hits, 1);
}

#[tokio::test]
async fn cache_identity_ignores_case_and_padding() {
    let h = Harness::start().await;
    let page = google_page(&[("Rust", "https://www.rust-lang.org/learn", Some("Learn Rust"))]);
    mount(&h.server, GOOGLE_PATH, ok(page), 1).await;
    let search = h.search();

    let first = search.search("Rust", 5).await;
    let second = search.search("  rust ", 5).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn expired_entry_triggers_one_fresh_fetch() {
    let h = Harness::start().await;
    let page = google_page(&[("Rust", "https://www.rust-lang.org/learn", Some("Learn Rust"))]);
    mount(&h.server, GOOGLE_PATH, ok(page), 2).await;
    let search = h.search().with_ttl(Duration::from_secs(3600));

    search.search("rust", 5).await;
    h.clock.advance(Duration::from_secs(3599));
    search.search("rust", 5).await;

    h.clock.advance(Duration::from_secs(1));
    let refreshed = search.search("rust", 5).await;
    assert_eq!(refreshed.len(), 1);

    // refreshed entry is live again
    search.search("rust", 5).await;
}

#[tokio::test]
async fn primary_failure_falls_back() {
    let h = Harness::start().await;
    mount(&h.server, GOOGLE_PATH, ResponseTemplate::new(500), 1).await;
    let page = ddg_page(&[(
        "The Rust Book",
        "//duckduckgo.com/l/?uddg=https%3A%2F%2Fdoc.rust-lang.org%2Fbook%2F&amp;rut=x",
        "The Rust Programming Language",
    )]);
    mount(&h.server, DDG_PATH, ok(page), 1).await;
    let search = h.search();

    let results = search.search("rust book", 5).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source(), Source::Fallback);
    assert_eq!(results[0].url(), "https://doc.rust-lang.org/book/");

    // fallback results are cached like any other
    assert_eq!(search.search("rust book", 5).await, results);
    let snap = search.metrics().snapshot();
    assert_eq!(snap.primary.failures, 1);
    assert_eq!(snap.fallback.successes, 1);
}

#[tokio::test]
async fn total_failure_returns_empty_and_caches_nothing() {
    let h = Harness::start().await;
    mount(&h.server, GOOGLE_PATH, ResponseTemplate::new(503), 2).await;
    mount(&h.server, DDG_PATH, ResponseTemplate::new(403), 2).await;
    let search = h.search();

    assert!(search.search("rust", 5).await.is_empty());
    assert!(h.store.load("rust").await.unwrap().is_none());

    // nothing was cached, so the next call tries both providers again
    assert!(search.search("rust", 5).await.is_empty());
    assert_eq!(search.metrics().snapshot().exhausted, 2);
}

#[tokio::test]
async fn empty_successful_fetch_is_cached() {
    let h = Harness::start().await;
    mount(&h.server, GOOGLE_PATH, ok(google_page(&[])), 1).await;
    mount(&h.server, DDG_PATH, ok(String::new()), 0).await;
    let search = h.search();

    assert!(search.search("zxqv nonsense", 5).await.is_empty());
    assert!(search.search("zxqv nonsense", 5).await.is_empty());

    let entry = h.store.load("zxqv nonsense").await.unwrap().unwrap();
    assert!(entry.results.is_empty());
}

#[tokio::test]
async fn bound_is_respected_on_fresh_fetch() {
    let h = Harness::start().await;
    let page = google_page_owned(&numbered_google_blocks(8));
    mount(&h.server, GOOGLE_PATH, ok(page), 1).await;
    let search = h.search();

    let results = search.search("many", 3).await;

    let titles: Vec<_> = results.iter().map(|r| r.title()).collect();
    assert_eq!(titles, vec!["Result 1", "Result 2", "Result 3"]);
}

#[tokio::test]
async fn fewer_blocks_than_bound_returns_shorter_list() {
    let h = Harness::start().await;
    let page = google_page_owned(&numbered_google_blocks(2));
    mount(&h.server, GOOGLE_PATH, ok(page), 1).await;
    let search = h.search();

    assert_eq!(search.search("few", 5).await.len(), 2);
}

#[tokio::test]
async fn cache_hit_is_not_resliced() {
    let h = Harness::start().await;
    let page = google_page_owned(&numbered_google_blocks(5));
    mount(&h.server, GOOGLE_PATH, ok(page), 1).await;
    let search = h.search();

    assert_eq!(search.search("rust", 5).await.len(), 5);
    assert_eq!(search.search("rust", 2).await.len(), 5);
}

#[tokio::test]
async fn protocol_relative_href_is_stored_as_https() {
    let h = Harness::start().await;
    let page = google_page(&[("Example", "//example.com/x", Some("An example"))]);
    mount(&h.server, GOOGLE_PATH, ok(page), 1).await;
    let search = h.search();

    let results = search.search("example", 5).await;
    assert_eq!(results[0].url(), "https://example.com/x");

    let stored = h.store.load("example").await.unwrap().unwrap();
    assert_eq!(stored.results[0].url(), "https://example.com/x");
}

#[tokio::test]
async fn rust_ownership_scenario() {
    let h = Harness::start().await;
    let page = google_page(&[
        (
            "What is Ownership?",
            "/url?q=https://doc.rust-lang.org/book/ch04-01-what-is-ownership.html&amp;sa=U",
            Some("Ownership is a set of rules that govern how a Rust program manages memory."),
        ),
        ("Ownership in Rust", "https://example.com/no-snippet", None),
        (
            "Understanding Ownership",
            "https://doc.rust-lang.org/book/ch04-00-understanding-ownership.html",
            Some("Ownership is Rust's most unique feature."),
        ),
        ("Rust ownership video", "https://example.com/video", None),
        (
            "Ownership and moves",
            "https://doc.rust-lang.org/rust-by-example/scope/move.html",
            Some("Because variables are in charge of freeing their own resources."),
        ),
    ]);
    Mock::given(method("GET"))
        .and(path(GOOGLE_PATH))
        .and(query_param("q", "rust ownership"))
        .respond_with(ok(page))
        .expect(1)
        .mount(&h.server)
        .await;
    let search = h.search();

    let results = search.search("rust ownership", 3).await;

    let urls: Vec<_> = results.iter().map(|r| r.url()).collect();
    assert_eq!(
        urls,
        vec![
            "https://doc.rust-lang.org/book/ch04-01-what-is-ownership.html",
            "https://doc.rust-lang.org/book/ch04-00-understanding-ownership.html",
            "https://doc.rust-lang.org/rust-by-example/scope/move.html",
        ]
    );
    assert!(results.iter().all(|r| r.source() == Source::Primary));
}

#[tokio::test]
async fn hung_primary_times_out_into_fallback() {
    let server = MockServer::start().await;
    mount(
        &server,
        GOOGLE_PATH,
        ok(google_page(&[])).set_delay(Duration::from_secs(3)),
        1,
    )
    .await;
    let page = ddg_page(&[("Tokio", "https://tokio.rs/", "Async runtime")]);
    mount(&server, DDG_PATH, ok(page), 1).await;

    let mut clients = providers(&server);
    clients[0] = clients[0].clone().with_timeout(Duration::from_millis(200));
    let search = Search::new(clients, ResultCache::in_memory());

    let results = search.search("tokio", 5).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source(), Source::Fallback);
}

#[tokio::test]
async fn broken_cache_degrades_to_uncached_search() {
    let server = MockServer::start().await;
    let page = google_page(&[("Rust", "https://www.rust-lang.org/learn", Some("Learn Rust"))]);
    mount(&server, GOOGLE_PATH, ok(page), 2).await;
    let search = Search::new(providers(&server), ResultCache::new(Arc::new(BrokenStore)));

    assert_eq!(search.search("rust", 5).await.len(), 1);
    assert_eq!(search.search("rust", 5).await.len(), 1);
}

#[tokio::test]
async fn sqlite_backed_search_caches_results() {
    let server = MockServer::start().await;
    let page = google_page(&[("Rust", "https://www.rust-lang.org/learn", Some("Learn Rust"))]);
    mount(&server, GOOGLE_PATH, ok(page), 1).await;
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let search = Search::new(providers(&server), ResultCache::new(store));

    let first = search.search("Rust", 5).await;
    let second = search.search("RUST", 5).await;

    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn concurrent_searches_on_distinct_queries() {
    let h = Harness::start().await;
    let page = google_page(&[("Hit", "https://example.com/hit", Some("snippet"))]);
    mount(&h.server, GOOGLE_PATH, ok(page), 4).await;
    let search = Arc::new(h.search());

    let queries = ["alpha", "beta", "gamma", "delta"];
    let all = futures::future::join_all(queries.iter().map(|q| {
        let search = search.clone();
        async move { search.search(q, 5).await }
    }))
    .await;

    assert!(all.iter().all(|r| r.len() == 1));
    for q in queries {
        assert!(h.store.load(q).await.unwrap().is_some());
    }
}

#[tokio::test]
async fn api_key_variant_behaves_like_search() {
    let h = Harness::start().await;
    let page = google_page(&[("Rust", "https://www.rust-lang.org/learn", Some("Learn Rust"))]);
    mount(&h.server, GOOGLE_PATH, ok(page), 1).await;
    let search = h.search();

    let keyed = search.search_with_api_key("rust", 5, "secret").await;
    let plain = search.search("rust", 5).await;

    assert_eq!(keyed, plain);
}

#[tokio::test]
async fn concurrent_searches_on_the_same_query() {
    let h = Harness::start().await;
    let page = google_page(&[("Hit", "https://example.com/hit", Some("snippet"))]);
    // both callers may miss before either writes
    Mock::given(method("GET"))
        .and(path(GOOGLE_PATH))
        .respond_with(ok(page))
        .expect(1..=2)
        .mount(&h.server)
        .await;
    let search = Arc::new(h.search());

    let all = futures::future::join_all((0..2).map(|_| {
        let search = search.clone();
        async move { search.search("Same Query", 5).await }
    }))
    .await;

    assert!(all.iter().all(|r| r.len() == 1));
    assert_eq!(all[0], all[1]);
    let entry = h.store.load("same query").await.unwrap().unwrap();
    assert_eq!(entry.results, all[0]);
}

#[tokio::test]
async fn unbounded_result_limit_does_not_fail() {
    let h = Harness::start().await;
    let page = google_page_owned(&numbered_google_blocks(3));
    Mock::given(method("GET"))
        .and(path(GOOGLE_PATH))
        .and(query_param("num", "100"))
        .respond_with(ok(page))
        .expect(1)
        .mount(&h.server)
        .await;
    let search = h.search();

    assert_eq!(search.search("rust", usize::MAX).await.len(), 3);
}
