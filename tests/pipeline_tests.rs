//! Integration tests for the assembly workflow.
//!
//! These drive the identify → aggregate → fallback pipeline end to end
//! against an in-memory chapter feed.

use async_trait::async_trait;
use std::sync::Mutex;

use novelgrab::extract::ExtractError;
use novelgrab::models::{Chapter, SerialId};
use novelgrab::paginate::{
    AggregateOptions, CancelFlag, ChapterFeed, ChapterPage, FailurePolicy, FeedCapabilities,
};
use novelgrab::pipeline::{assemble, AssembleOptions, IdCache, MemoryIdCache};

/// In-memory feed with scripted listing data and call recording.
#[derive(Debug)]
struct StubFeed {
    capabilities: FeedCapabilities,
    last_page: u32,
    available: u32,
    fail_all: bool,
    page_calls: Mutex<Vec<u32>>,
    window_calls: Mutex<Vec<(u32, u32)>>,
}

impl StubFeed {
    fn paged(last_page: u32) -> Self {
        Self {
            capabilities: FeedCapabilities::PAGED,
            last_page,
            available: 0,
            fail_all: false,
            page_calls: Mutex::new(Vec::new()),
            window_calls: Mutex::new(Vec::new()),
        }
    }

    fn windowed(available: u32) -> Self {
        Self {
            capabilities: FeedCapabilities::WINDOWED,
            last_page: 0,
            available,
            fail_all: false,
            page_calls: Mutex::new(Vec::new()),
            window_calls: Mutex::new(Vec::new()),
        }
    }

    fn broken() -> Self {
        Self {
            capabilities: FeedCapabilities::PAGED | FeedCapabilities::WINDOWED,
            last_page: 1,
            available: 0,
            fail_all: true,
            page_calls: Mutex::new(Vec::new()),
            window_calls: Mutex::new(Vec::new()),
        }
    }

    fn page_calls(&self) -> Vec<u32> {
        self.page_calls.lock().unwrap().clone()
    }

    fn window_calls(&self) -> Vec<(u32, u32)> {
        self.window_calls.lock().unwrap().clone()
    }
}

fn numbered(serial: &SerialId, order: u32) -> Chapter {
    Chapter {
        name: format!("Chapter {}", order),
        path: format!("{}/chapter-{}", serial.path.trim_matches('/'), order),
        release_time: None,
        chapter_number: Some(order),
    }
}

#[async_trait]
impl ChapterFeed for StubFeed {
    fn capabilities(&self) -> FeedCapabilities {
        self.capabilities
    }

    async fn fetch_page(&self, serial: &SerialId, page: u32) -> Result<ChapterPage, ExtractError> {
        self.page_calls.lock().unwrap().push(page);

        if self.fail_all {
            return Err(ExtractError::Network("listing endpoint down".to_string()));
        }

        Ok(ChapterPage {
            chapters: vec![numbered(serial, page)],
            last_page: Some(self.last_page),
        })
    }

    async fn fetch_window(
        &self,
        serial: &SerialId,
        start: u32,
        end: u32,
    ) -> Result<Vec<Chapter>, ExtractError> {
        self.window_calls.lock().unwrap().push((start, end));

        if self.fail_all {
            return Err(ExtractError::Network("listing endpoint down".to_string()));
        }

        Ok((start..=end.min(self.available))
            .map(|order| numbered(serial, order))
            .collect())
    }
}

/// Document whose hydration blob carries the identifier; the markup fields
/// deliberately disagree so blob exclusivity is observable.
const HYDRATED_DOC: &str = r#"<html><body>
    <div class="novel-title"><h1>Markup Title</h1></div>
    <div class="novel-status"><div class="content">Dropped</div></div>
    <script id="__NEXT_DATA__" type="application/json">
        {"props":{"pageProps":{"serie":{"serie_data":{
            "raw_id": 77, "status": 0,
            "data": {"title": "Blob Title", "author": "Blob Author"}
        }}}}}
    </script>
    <div class="chapters"><div class="list-wrapper"><div class="items">
        <a class="chapter" href="/en/serie-77/azure-peak/scraped-1">
            <span class="chapter-title">Scraped 1</span>
        </a>
        <a class="chapter" href="/en/serie-77/azure-peak/scraped-2">
            <span class="chapter-title">Scraped 2</span>
        </a>
    </div></div></div>
</body></html>"#;

/// Document with no hydration blob; the identifier and chapter count come
/// from the path and the rendered detail line.
const MARKUP_DOC: &str = r#"<html><body>
    <h1 class="long-title">Azure Peak</h1>
    <div class="detail-line">600 Chapters</div>
</body></html>"#;

/// Document exposing a name but no identifier through any channel.
const ANONYMOUS_DOC: &str = r#"<html><body>
    <h1 class="long-title">Nameless Serial</h1>
</body></html>"#;

const PATH: &str = "en/serie-77/azure-peak";

#[tokio::test]
async fn hydration_identifier_wins_and_markup_never_runs() {
    let feed = StubFeed::paged(2);
    let assembly = assemble(
        HYDRATED_DOC,
        PATH,
        &feed,
        None,
        &AssembleOptions::default(),
        &CancelFlag::new(),
    )
    .await
    .unwrap();

    // Whole-record fallback: every field comes from the blob, none from markup.
    assert_eq!(assembly.novel.name, "Blob Title");
    assert_eq!(assembly.novel.author.as_deref(), Some("Blob Author"));
    assert_eq!(assembly.novel.status, novelgrab::NovelStatus::Ongoing);

    assert_eq!(feed.page_calls(), vec![1, 2]);
    assert_eq!(assembly.novel.chapters.len(), 2);
    assert!(assembly.complete);
    assert!(!assembly.fallback_scrape);
}

#[tokio::test]
async fn markup_identifier_drives_window_aggregation() {
    let feed = StubFeed::windowed(600);
    let assembly = assemble(
        MARKUP_DOC,
        PATH,
        &feed,
        None,
        &AssembleOptions::default(),
        &CancelFlag::new(),
    )
    .await
    .unwrap();

    assert_eq!(assembly.novel.name, "Azure Peak");
    assert_eq!(feed.window_calls(), vec![(1, 250), (251, 500), (501, 600)]);
    assert_eq!(assembly.novel.chapters.len(), 600);

    // Fully numbered listings come back sorted ascending.
    let orders: Vec<u32> = assembly
        .novel
        .chapters
        .iter()
        .filter_map(|c| c.chapter_number)
        .collect();
    assert!(orders.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn missing_identifier_is_terminal() {
    let feed = StubFeed::paged(1);
    let result = assemble(
        ANONYMOUS_DOC,
        "plain/nameless-serial",
        &feed,
        None,
        &AssembleOptions::default(),
        &CancelFlag::new(),
    )
    .await;

    assert!(matches!(result, Err(ExtractError::MissingIdentifier)));
    assert!(feed.page_calls().is_empty());
}

#[tokio::test]
async fn cached_identifier_rescues_anonymous_document() {
    let feed = StubFeed::paged(1);
    let cache = MemoryIdCache::new();
    cache.put(&SerialId::new("55", "plain/nameless-serial"));

    let assembly = assemble(
        ANONYMOUS_DOC,
        "plain/nameless-serial",
        &feed,
        Some(&cache),
        &AssembleOptions::default(),
        &CancelFlag::new(),
    )
    .await
    .unwrap();

    assert_eq!(assembly.novel.name, "Nameless Serial");
    assert_eq!(feed.page_calls(), vec![1]);
    assert_eq!(assembly.novel.chapters.len(), 1);
}

#[tokio::test]
async fn resolved_identifier_is_cached() {
    let feed = StubFeed::paged(1);
    let cache = MemoryIdCache::new();

    assemble(
        HYDRATED_DOC,
        PATH,
        &feed,
        Some(&cache),
        &AssembleOptions::default(),
        &CancelFlag::new(),
    )
    .await
    .unwrap();

    assert_eq!(cache.get(PATH).unwrap().id, "77");
}

#[tokio::test]
async fn fail_fast_aggregation_falls_back_to_document_scrape() {
    let feed = StubFeed::broken();
    let assembly = assemble(
        HYDRATED_DOC,
        PATH,
        &feed,
        None,
        &AssembleOptions::default(),
        &CancelFlag::new(),
    )
    .await
    .unwrap();

    assert!(assembly.fallback_scrape);
    let paths: Vec<&str> = assembly.novel.chapters.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["en/serie-77/azure-peak/scraped-1", "en/serie-77/azure-peak/scraped-2"]
    );
}

#[tokio::test]
async fn best_effort_keeps_partial_listing_without_fallback() {
    #[derive(Debug)]
    struct FlakyFeed(StubFeed);

    #[async_trait]
    impl ChapterFeed for FlakyFeed {
        fn capabilities(&self) -> FeedCapabilities {
            FeedCapabilities::PAGED
        }

        async fn fetch_page(&self, serial: &SerialId, page: u32) -> Result<ChapterPage, ExtractError> {
            if page == 2 {
                return Err(ExtractError::Network("flaky page".to_string()));
            }
            self.0.fetch_page(serial, page).await
        }

        async fn fetch_window(
            &self,
            serial: &SerialId,
            start: u32,
            end: u32,
        ) -> Result<Vec<Chapter>, ExtractError> {
            self.0.fetch_window(serial, start, end).await
        }
    }

    let feed = FlakyFeed(StubFeed::paged(3));
    let options = AssembleOptions {
        aggregate: AggregateOptions {
            policy: FailurePolicy::BestEffort,
            ..AggregateOptions::default()
        },
        ..AssembleOptions::default()
    };

    let assembly = assemble(HYDRATED_DOC, PATH, &feed, None, &options, &CancelFlag::new())
        .await
        .unwrap();

    assert!(!assembly.fallback_scrape);
    assert!(!assembly.complete);
    assert_eq!(assembly.skipped, vec![2]);
    assert_eq!(assembly.novel.chapters.len(), 2);
}

#[tokio::test]
async fn cancellation_yields_partial_assembly() {
    let feed = StubFeed::paged(50);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let assembly = assemble(HYDRATED_DOC, PATH, &feed, None, &AssembleOptions::default(), &cancel)
        .await
        .unwrap();

    assert!(!assembly.complete);
    assert!(assembly.novel.chapters.is_empty());
    assert!(feed.page_calls().is_empty());
}
