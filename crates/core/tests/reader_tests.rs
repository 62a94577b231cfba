//! Import orchestration against scripted HTTP clients and caches
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use feedscope_core::*;
use tempfile::TempDir;

const URI: &str = "http://www.example.com/feed/rss";

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(get_fixture_path(name)).unwrap()
}

/// Replays canned responses and records every request.
#[derive(Clone, Default)]
struct ScriptedClient {
    responses: Rc<RefCell<VecDeque<Response>>>,
    requests: Rc<RefCell<Vec<(String, Vec<(String, String)>)>>>,
    header_aware: bool,
}

impl ScriptedClient {
    fn new(header_aware: bool) -> Self {
        Self { header_aware, ..Default::default() }
    }

    fn respond(self, response: Response) -> Self {
        self.responses.borrow_mut().push_back(response);
        self
    }

    fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    fn last_headers(&self) -> Vec<(String, String)> {
        self.requests.borrow().last().map(|(_, headers)| headers.clone()).unwrap_or_default()
    }
}

impl HttpClient for ScriptedClient {
    fn get(&self, uri: &str, headers: &[(String, String)]) -> Result<Response> {
        self.requests.borrow_mut().push((uri.to_string(), headers.to_vec()));
        Ok(self.responses.borrow_mut().pop_front().unwrap_or_else(|| Response::new(500, "")))
    }

    fn is_header_aware(&self) -> bool {
        self.header_aware
    }
}

/// A cache shared between the test and the reader.
#[derive(Clone, Default)]
struct SharedCache(Rc<MemoryCache>);

impl FeedCache for SharedCache {
    fn get_item(&self, key: &str) -> Option<String> {
        self.0.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.0.set_item(key, value)
    }
}

fn conditional_reader(client: &ScriptedClient, cache: &SharedCache) -> Reader {
    Reader::builder()
        .config(ReaderConfig::builder().http_conditional_get(true).build())
        .http_client(client.clone())
        .cache(cache.clone())
        .build()
}

#[test]
fn test_import_string_literal() {
    let xml = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>T</title>
        <item><title>A</title></item></channel></rss>"#;
    let feed = Reader::new().import_string(xml).unwrap().into_feed().unwrap();

    assert_eq!(feed.feed_type(), FeedType::Rss20);
    assert_eq!(feed.count(), 1);
    assert_eq!(feed.entry(0).unwrap().title().as_deref(), Some("A"));
}

#[test]
fn test_doctype_rejected_by_every_entry_point() {
    let reader = Reader::new();
    assert!(matches!(reader.import_string(&fixture("doctype.xml")), Err(FeedError::InvalidInput(_))));
    assert!(matches!(reader.import_file(get_fixture_path("doctype.xml")), Err(FeedError::InvalidInput(_))));
    assert!(matches!(reader.detect_type(&fixture("doctype.xml")), Err(FeedError::InvalidInput(_))));
}

#[test]
fn test_unsupported_document() {
    assert!(matches!(
        Reader::new().import_file(get_fixture_path("not_a_feed.xml")),
        Err(FeedError::UnsupportedFeedType(FeedType::Any))
    ));
}

#[test]
fn test_import_file_missing() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.xml");

    match Reader::new().import_file(&missing) {
        Err(FeedError::FileRead { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected FileRead, got {:?}", other),
    }
}

#[test]
fn test_import_not_found_status() {
    let client = ScriptedClient::new(false).respond(Response::new(404, "Not Found"));
    let reader = Reader::new().with_http_client(client);

    match reader.import(URI) {
        Err(FeedError::HttpStatus { uri, status }) => {
            assert_eq!(uri, URI);
            assert_eq!(status, 404);
        }
        other => panic!("expected HttpStatus, got {:?}", other),
    }
}

#[test]
fn test_import_without_cache_records_source() {
    let client = ScriptedClient::new(false).respond(Response::new(200, fixture("empty_rss.xml")));
    let feed = Reader::new().with_http_client(client.clone()).import(URI).unwrap().into_feed().unwrap();

    assert_eq!(feed.original_source_uri().as_deref(), Some(URI));
    assert_eq!(feed.feed_link().as_deref(), Some(URI));
    assert_eq!(client.request_count(), 1);
}

#[test]
fn test_cache_miss_then_hit() {
    let client = ScriptedClient::new(false).respond(Response::new(200, fixture("rss20.xml")));
    let cache = SharedCache::default();
    let reader = Reader::new().with_http_client(client.clone()).with_cache(cache.clone());

    let first = reader.import(URI).unwrap().into_feed().unwrap();
    assert_eq!(client.request_count(), 1);
    assert_eq!(cache.get_item(&reader.cache_key(URI)), Some(fixture("rss20.xml")));

    let second = reader.import(URI).unwrap().into_feed().unwrap();
    assert_eq!(client.request_count(), 1);
    assert_eq!(first.title(), second.title());
}

#[test]
fn test_cache_miss_with_error_status() {
    let client = ScriptedClient::new(false).respond(Response::new(503, ""));
    let cache = SharedCache::default();
    let reader = Reader::new().with_http_client(client).with_cache(cache.clone());

    assert!(matches!(reader.import(URI), Err(FeedError::HttpStatus { status: 503, .. })));
    assert!(cache.0.is_empty());
}

#[test]
fn test_conditional_get_stores_validators() {
    let client = ScriptedClient::new(true).respond(
        Response::new(200, fixture("rss20.xml"))
            .with_header("ETag", "\"v1\"")
            .with_header("Last-Modified", "Sat, 07 Mar 2009 08:03:50 GMT"),
    );
    let cache = SharedCache::default();
    let reader = conditional_reader(&client, &cache);

    reader.import(URI).unwrap();

    let key = reader.cache_key(URI);
    assert!(client.last_headers().is_empty());
    assert_eq!(cache.get_item(&format!("{}_etag", key)).as_deref(), Some("\"v1\""));
    assert_eq!(
        cache.get_item(&format!("{}_lastmodified", key)).as_deref(),
        Some("Sat, 07 Mar 2009 08:03:50 GMT")
    );
}

#[test]
fn test_conditional_get_not_modified_uses_cache() {
    let client = ScriptedClient::new(true).respond(Response::new(304, ""));
    let cache = SharedCache::default();
    let reader = conditional_reader(&client, &cache);

    let key = reader.cache_key(URI);
    cache.set_item(&key, &fixture("rss20.xml")).unwrap();
    cache.set_item(&format!("{}_etag", key), "\"v1\"").unwrap();
    cache.set_item(&format!("{}_lastmodified", key), "Sat, 07 Mar 2009 08:03:50 GMT").unwrap();

    let feed = reader.import(URI).unwrap().into_feed().unwrap();
    assert_eq!(feed.title().as_deref(), Some("My Rss 2.0 Feed"));

    let headers = client.last_headers();
    assert!(headers.contains(&("If-None-Match".to_string(), "\"v1\"".to_string())));
    assert!(headers.contains(&("If-Modified-Since".to_string(), "Sat, 07 Mar 2009 08:03:50 GMT".to_string())));
}

#[test]
fn test_conditional_get_explicit_validators_win() {
    let client = ScriptedClient::new(true).respond(Response::new(304, ""));
    let cache = SharedCache::default();
    let reader = conditional_reader(&client, &cache);

    let key = reader.cache_key(URI);
    cache.set_item(&key, &fixture("rss20.xml")).unwrap();
    cache.set_item(&format!("{}_etag", key), "\"cached\"").unwrap();

    reader.import_with(URI, Some("\"given\""), None).unwrap();
    assert_eq!(client.last_headers(), vec![("If-None-Match".to_string(), "\"given\"".to_string())]);
}

#[test]
fn test_conditional_get_refreshes_cache() {
    let client = ScriptedClient::new(true).respond(Response::new(200, fixture("atom10.xml")));
    let cache = SharedCache::default();
    let reader = conditional_reader(&client, &cache);
    cache.set_item(&reader.cache_key(URI), &fixture("rss20.xml")).unwrap();

    let doc = reader.import(URI).unwrap();
    assert_eq!(doc.feed_type(), FeedType::Atom10);
    assert_eq!(cache.get_item(&reader.cache_key(URI)), Some(fixture("atom10.xml")));
}

#[test]
fn test_conditional_get_without_header_support() {
    let client = ScriptedClient::new(false).respond(Response::new(200, fixture("rss20.xml")));
    let cache = SharedCache::default();
    let reader = conditional_reader(&client, &cache);
    cache.set_item(&reader.cache_key(URI), &fixture("rss20.xml")).unwrap();

    reader.import_with(URI, Some("\"v1\""), None).unwrap();
    assert!(client.last_headers().is_empty());
}

#[test]
fn test_conditional_get_unexpected_status() {
    let client = ScriptedClient::new(true).respond(Response::new(500, ""));
    let cache = SharedCache::default();
    let reader = conditional_reader(&client, &cache);

    assert!(matches!(reader.import(URI), Err(FeedError::HttpStatus { status: 500, .. })));
}

#[test]
fn test_file_cache_backed_import() {
    let tmp = TempDir::new().unwrap();
    let client = ScriptedClient::new(false).respond(Response::new(200, fixture("rss10.xml")));
    let reader = Reader::new().with_http_client(client.clone()).with_cache(FileCache::new(tmp.path()));

    reader.import(URI).unwrap();
    reader.import(URI).unwrap();
    assert_eq!(client.request_count(), 1);
    assert!(tmp.path().join(reader.cache_key(URI)).exists());
}

#[test]
fn test_find_feed_links() {
    let client = ScriptedClient::new(false).respond(Response::new(200, fixture("page.html")));
    let reader = Reader::new().with_http_client(client);

    let links = reader.find_feed_links("http://www.example.com/blog/").unwrap();
    assert_eq!(links.len(), 3);
    assert_eq!(links.rss(), Some("http://www.example.com/feed.rss"));
    assert_eq!(links.atom(), Some("http://www.example.com/blog/feed.atom"));
    assert_eq!(links.rdf(), Some("http://www.example.com/index.rdf"));
    assert_eq!(links.links()[0].title.as_deref(), Some("Posts (RSS)"));
}

#[test]
fn test_find_feed_links_status() {
    let client = ScriptedClient::new(false).respond(Response::new(404, ""));
    let reader = Reader::new().with_http_client(client);
    assert!(matches!(
        reader.find_feed_links("http://www.example.com/"),
        Err(FeedError::HttpStatus { status: 404, .. })
    ));
}

#[test]
fn test_plugin_manager_reader() {
    let mut manager = ExtensionPluginManager::empty();
    manager.add_extension("Slash/Entry", |scope| {
        Extension::Entry(Box::new(feedscope_core::extension::slash::Entry::new(scope)))
    });
    let broken = manager.add_plugin("Broken/Entry", |_scope| Box::new(42_u8) as Box<dyn std::any::Any>);
    assert!(matches!(broken, Err(FeedError::InvalidArgument(_))));

    let mut reader = Reader::builder()
        .config(ReaderConfig::builder().core_extensions(["slash"]).build())
        .extension_manager(Rc::new(manager))
        .build();
    assert!(reader.is_registered("slash"));
    assert!(matches!(reader.register_extension("DublinCore"), Err(FeedError::ExtensionNotFound(_))));

    let feed = reader.import_file(get_fixture_path("rss20.xml")).unwrap().into_feed().unwrap();
    let entry = feed.entry(0).unwrap();
    assert_eq!(entry.comment_count(), Some(321));
    assert_eq!(entry.authors().map(|authors| authors.len()), Some(1));
}
