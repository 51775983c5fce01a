// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use scoutrs::domain::services::semantic::SemanticAnalyzer;
use scoutrs::infrastructure::cache::FileCache;
use scoutrs::workers::{CrawlError, CrawlOptions, Crawler};

use crate::helpers::{KeywordEmbedder, MemoryArtifactRepository, StubFetchEngine};

fn options(max_depth: i32) -> CrawlOptions {
    CrawlOptions {
        max_depth,
        worker_count: 4,
        topic: None,
        topic_threshold: 0.5,
        link_threshold: 0.6,
        request_timeout: Duration::from_secs(5),
    }
}

fn crawler(
    engine: &Arc<StubFetchEngine>,
    artifacts: &Arc<MemoryArtifactRepository>,
    semantic: Option<Arc<SemanticAnalyzer>>,
    options: CrawlOptions,
) -> Crawler {
    Crawler::new(
        engine.clone(),
        artifacts.clone(),
        None,
        semantic,
        None,
        options,
    )
}

fn quantum_semantic() -> Arc<SemanticAnalyzer> {
    Arc::new(SemanticAnalyzer::new(Arc::new(KeywordEmbedder::new(
        "quantum",
    ))))
}

fn page(body_links: &str) -> String {
    format!(
        "<html><head><title>Page</title></head><body><p>Plain content.</p>{}</body></html>",
        body_links
    )
}

#[tokio::test]
async fn test_depth_zero_fetches_only_seeds() {
    let engine = Arc::new(StubFetchEngine::new(&[
        (
            "https://site.test/a",
            &page(r#"<a href="/b">next</a><a href="/c">more</a>"#),
        ),
        ("https://site.test/b", &page("")),
    ]));
    let artifacts = Arc::new(MemoryArtifactRepository::new());
    let crawler = crawler(&engine, &artifacts, None, options(0));

    let report = crawler
        .crawl(&["https://site.test/a".to_string()])
        .await
        .unwrap();

    assert_eq!(engine.fetched_urls(), vec!["https://site.test/a"]);
    assert_eq!(report.sources_processed, 1);
    assert_eq!(report.artifacts_emitted, 1);
    assert_eq!(report.sources_skipped, 0);
}

#[tokio::test]
async fn test_cyclic_graph_terminates_with_unbounded_depth() {
    let engine = Arc::new(StubFetchEngine::new(&[
        ("https://site.test/a", &page(r#"<a href="/b">b</a>"#)),
        ("https://site.test/b", &page(r#"<a href="/a">a</a>"#)),
    ]));
    let artifacts = Arc::new(MemoryArtifactRepository::new());
    let crawler = crawler(&engine, &artifacts, None, options(-1));

    let report = crawler
        .crawl(&["https://site.test/a".to_string()])
        .await
        .unwrap();

    // The cycle back to the seed is dropped at dequeue time
    assert_eq!(engine.fetch_count("https://site.test/a"), 1);
    assert_eq!(engine.fetch_count("https://site.test/b"), 1);
    assert_eq!(report.sources_processed, 2);
    assert_eq!(report.sources_skipped, 1);
}

#[tokio::test]
async fn test_depth_bound_stops_enqueueing_children() {
    let engine = Arc::new(StubFetchEngine::new(&[
        ("https://site.test/a", &page(r#"<a href="/b">b</a>"#)),
        ("https://site.test/b", &page(r#"<a href="/c">c</a>"#)),
        ("https://site.test/c", &page("")),
    ]));
    let artifacts = Arc::new(MemoryArtifactRepository::new());
    let crawler = crawler(&engine, &artifacts, None, options(1));

    let report = crawler
        .crawl(&["https://site.test/a".to_string()])
        .await
        .unwrap();

    let mut fetched = engine.fetched_urls();
    fetched.sort();
    assert_eq!(fetched, vec!["https://site.test/a", "https://site.test/b"]);
    assert_eq!(report.sources_processed, 2);
}

#[tokio::test]
async fn test_duplicate_seeds_fetched_once() {
    let engine = Arc::new(StubFetchEngine::new(&[("https://site.test/a", &page(""))]));
    let artifacts = Arc::new(MemoryArtifactRepository::new());
    let crawler = crawler(&engine, &artifacts, None, options(0));

    let report = crawler
        .crawl(&[
            "https://site.test/a".to_string(),
            "https://site.test/a#section".to_string(),
        ])
        .await
        .unwrap();

    assert_eq!(engine.total_fetches(), 1);
    assert_eq!(report.sources_processed, 1);
    assert_eq!(report.sources_skipped, 1);
}

#[tokio::test]
async fn test_fetch_failure_is_absorbed_per_task() {
    let engine = Arc::new(StubFetchEngine::new(&[("https://site.test/ok", &page(""))]));
    let artifacts = Arc::new(MemoryArtifactRepository::new());
    let crawler = crawler(&engine, &artifacts, None, options(0));

    let report = crawler
        .crawl(&[
            "https://site.test/ok".to_string(),
            "https://site.test/missing".to_string(),
        ])
        .await
        .unwrap();

    assert_eq!(report.sources_processed, 1);
    assert_eq!(report.sources_skipped, 1);
    assert_eq!(report.artifacts_emitted, 1);
}

#[tokio::test]
async fn test_fast_mode_follows_links_without_embedding() {
    // link_threshold at 0.5 stays below the 0.8 gate: anchors are never
    // scored, every discovered link is enqueued
    let engine = Arc::new(StubFetchEngine::new(&[
        (
            "https://site.test/a",
            &page(r#"<a href="/cooking">cooking recipes</a>"#),
        ),
        ("https://site.test/cooking", &page("")),
    ]));
    let artifacts = Arc::new(MemoryArtifactRepository::new());
    let mut opts = options(1);
    opts.topic = Some("quantum computing".to_string());
    opts.topic_threshold = 0.1;
    opts.link_threshold = 0.5;
    let crawler = crawler(&engine, &artifacts, Some(quantum_semantic()), opts);

    crawler
        .crawl(&["https://site.test/a".to_string()])
        .await
        .unwrap();

    assert_eq!(engine.fetch_count("https://site.test/cooking"), 1);
}

#[tokio::test]
async fn test_low_relevance_discards_artifact_but_still_follows_links() {
    // Content scores 0.3 against the topic, far below the 0.9 threshold:
    // the artifact is discarded, the links are not
    let engine = Arc::new(StubFetchEngine::new(&[
        (
            "https://site.test/a",
            &page(r#"<a href="/b">more cooking</a>"#),
        ),
        ("https://site.test/b", &page("")),
    ]));
    let artifacts = Arc::new(MemoryArtifactRepository::new());
    let mut opts = options(1);
    opts.topic = Some("quantum computing".to_string());
    opts.topic_threshold = 0.9;
    let crawler = crawler(&engine, &artifacts, Some(quantum_semantic()), opts);

    let report = crawler
        .crawl(&["https://site.test/a".to_string()])
        .await
        .unwrap();

    assert_eq!(artifacts.count(), 0);
    assert_eq!(report.artifacts_emitted, 0);
    assert_eq!(engine.fetch_count("https://site.test/b"), 1);
    assert_eq!(report.sources_skipped, 2);
}

#[tokio::test]
async fn test_accepted_content_records_topic_relevance() {
    let engine = Arc::new(StubFetchEngine::new(&[(
        "https://site.test/q",
        "<html><head><title>Qubits</title></head><body>quantum entanglement explained</body></html>",
    )]));
    let artifacts = Arc::new(MemoryArtifactRepository::new());
    let mut opts = options(0);
    opts.topic = Some("quantum computing".to_string());
    opts.topic_threshold = 0.9;
    let crawler = crawler(&engine, &artifacts, Some(quantum_semantic()), opts);

    let report = crawler
        .crawl(&["https://site.test/q".to_string()])
        .await
        .unwrap();

    assert_eq!(report.artifacts_emitted, 1);
    let emitted = artifacts.artifacts();
    assert_eq!(emitted[0].title, "Qubits");
    assert_eq!(emitted[0].topic_relevance, Some(1.0));
}

#[tokio::test]
async fn test_advanced_link_filtering_scores_anchors() {
    let engine = Arc::new(StubFetchEngine::new(&[(
        "https://site.test/a",
        &format!(
            "<html><head><title>Quantum hub</title></head><body>quantum research index\
             {}{}{}</body></html>",
            r#"<a href="/relevant">quantum entanglement basics</a>"#,
            r#"<a href="/irrelevant">cooking recipes</a>"#,
            r#"<a href="/noanchor"><img src="x.png"/></a>"#
        ),
    )]));
    let artifacts = Arc::new(MemoryArtifactRepository::new());
    let mut opts = options(1);
    opts.topic = Some("quantum computing".to_string());
    opts.topic_threshold = 0.1;
    opts.link_threshold = 0.9;
    let crawler = crawler(&engine, &artifacts, Some(quantum_semantic()), opts);

    crawler
        .crawl(&["https://site.test/a".to_string()])
        .await
        .unwrap();

    let fetched = engine.fetched_urls();
    assert!(fetched.contains(&"https://site.test/relevant".to_string()));
    // Links without anchor text always pass the gate
    assert!(fetched.contains(&"https://site.test/noanchor".to_string()));
    assert!(!fetched.contains(&"https://site.test/irrelevant".to_string()));
}

#[tokio::test]
async fn test_invalid_worker_count_rejected() {
    let engine = Arc::new(StubFetchEngine::new(&[]));
    let artifacts = Arc::new(MemoryArtifactRepository::new());
    let mut opts = options(0);
    opts.worker_count = 0;
    let crawler = crawler(&engine, &artifacts, None, opts);

    match crawler.crawl(&["https://site.test/a".to_string()]).await {
        Err(CrawlError::Validation(_)) => {}
        other => panic!("expected Validation error, got {:?}", other),
    }
    assert_eq!(engine.total_fetches(), 0);
}

#[tokio::test]
async fn test_malformed_seed_url_rejected_before_network() {
    let engine = Arc::new(StubFetchEngine::new(&[]));
    let artifacts = Arc::new(MemoryArtifactRepository::new());
    let crawler = crawler(&engine, &artifacts, None, options(0));

    match crawler.crawl(&["http://".to_string()]).await {
        Err(CrawlError::Validation(_)) => {}
        other => panic!("expected Validation error, got {:?}", other),
    }
    assert_eq!(engine.total_fetches(), 0);
}

#[tokio::test]
async fn test_recently_cached_source_skipped_across_sessions() {
    let cache_dir = TempDir::new().unwrap();
    let cache = Arc::new(FileCache::with_defaults(cache_dir.path()).unwrap());
    let engine = Arc::new(StubFetchEngine::new(&[("https://site.test/a", &page(""))]));
    let artifacts = Arc::new(MemoryArtifactRepository::new());
    let crawler = Crawler::new(
        engine.clone(),
        artifacts.clone(),
        Some(cache),
        None,
        None,
        options(0),
    );

    let first = crawler
        .crawl(&["https://site.test/a".to_string()])
        .await
        .unwrap();
    let second = crawler
        .crawl(&["https://site.test/a".to_string()])
        .await
        .unwrap();

    assert_eq!(first.sources_processed, 1);
    assert_eq!(engine.total_fetches(), 1);
    assert_eq!(second.sources_processed, 0);
    assert_eq!(second.sources_skipped, 1);
}

#[tokio::test]
async fn test_local_file_seed_emits_artifact_without_links() {
    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join("notes.txt");
    std::fs::write(&file_path, "Local notes about quantum computing").unwrap();

    let engine = Arc::new(StubFetchEngine::new(&[]));
    let artifacts = Arc::new(MemoryArtifactRepository::new());
    let crawler = crawler(&engine, &artifacts, None, options(1));

    let report = crawler
        .crawl(&[file_path.to_str().unwrap().to_string()])
        .await
        .unwrap();

    assert_eq!(report.sources_processed, 1);
    assert_eq!(report.artifacts_emitted, 1);
    assert_eq!(engine.total_fetches(), 0);

    let emitted = artifacts.artifacts();
    assert_eq!(emitted[0].title, "notes");
    assert!(emitted[0].metadata_summary.contains("TXT document"));
}
