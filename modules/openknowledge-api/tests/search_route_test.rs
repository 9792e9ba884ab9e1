use std::sync::Arc;

use openknowledge_api::{router, routes::NDJSON};
use openknowledge_common::{SourceId, StreamEvent};
use openknowledge_engine::sources::PaperSource;
use openknowledge_engine::testing::{MockPapers, ScriptedSource};
use openknowledge_engine::{Executor, Lane, StreamCoordinator};

async fn serve(coordinator: StreamCoordinator) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router(coordinator)).await.unwrap() });
    format!("http://{addr}")
}

fn coordinator() -> StreamCoordinator {
    StreamCoordinator::new(Executor::new(2).unwrap())
        .single_shot(
            ScriptedSource::ok(SourceId::Wikipedia, 40, &["https://en.wikipedia.org/?curid=12401"]),
            Lane::Cooperative,
        )
        .single_shot(
            ScriptedSource::failing(SourceId::Reddit, 1, "forum down"),
            Lane::Cooperative,
        )
        .incremental(
            PaperSource::new(Arc::new(MockPapers::numbered(2)), 2),
            Lane::Cooperative,
        )
}

#[tokio::test]
async fn search_streams_one_json_line_per_event() {
    let base = serve(coordinator()).await;

    let resp = reqwest::get(format!("{base}/search?query=graph%20theory"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        NDJSON
    );

    let body = resp.text().await.unwrap();
    let events: Vec<StreamEvent> = body
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(events.len(), 3);
    assert_eq!(events.iter().filter(|e| e.source == "Arxiv").count(), 2);
    let wiki = events.iter().find(|e| e.source == "WikiMedia").unwrap();
    assert_eq!(
        wiki.resources,
        vec!["(untitled)\nhttps://en.wikipedia.org/?curid=12401\n(no description)"]
    );
    assert!(events.iter().all(|e| e.source != "Reddit"));
}

#[tokio::test]
async fn blank_or_missing_query_is_rejected() {
    let base = serve(coordinator()).await;

    let blank = reqwest::get(format!("{base}/search?query=%20%20")).await.unwrap();
    assert_eq!(blank.status(), 400);
    let body: serde_json::Value = blank.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("empty"));

    let missing = reqwest::get(format!("{base}/search")).await.unwrap();
    assert_eq!(missing.status(), 400);
}

#[tokio::test]
async fn health_check() {
    let base = serve(coordinator()).await;
    let resp = reqwest::get(format!("{base}/")).await.unwrap();
    assert_eq!(resp.text().await.unwrap(), "ok");
}
