//! Prober and enricher against real sockets on localhost.

use std::collections::HashSet;
use std::time::Duration;

use axum::{
    http::{Method, StatusCode},
    response::Html,
    routing::{any, get},
    Router,
};

use openknowledge_probe::{LivenessProber, MetadataEnricher, ProbeSettings};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
}

/// A port nothing listens on: bind, read the address, drop the listener.
async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/gone")
}

fn site() -> Router {
    Router::new()
        .route("/ok", get(|| async { Html("<p>fine</p>") }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/no-head",
            any(|method: Method| async move {
                if method == Method::HEAD {
                    StatusCode::METHOD_NOT_ALLOWED
                } else {
                    StatusCode::OK
                }
            }),
        )
        .route(
            "/described",
            get(|| async {
                Html(r#"<html><head><meta name="description" content="Lecture notes"></head></html>"#)
            }),
        )
}

fn settings() -> ProbeSettings {
    ProbeSettings {
        tcp_timeout: Duration::from_millis(500),
        http_timeout: Duration::from_secs(2),
        max_workers: 4,
    }
}

#[tokio::test]
async fn filters_dead_links_over_http() {
    let base = serve(site()).await;
    let closed = closed_port_url().await;

    let input: HashSet<String> = [
        format!("{base}/ok"),
        format!("{base}/missing"),
        format!("{base}/no-head"),
        closed.clone(),
    ]
    .into_iter()
    .collect();

    let prober = LivenessProber::new(settings()).unwrap();
    let live = prober.filter_live(&input).await;

    let expected: HashSet<String> = [format!("{base}/ok"), format!("{base}/no-head")]
        .into_iter()
        .collect();
    assert_eq!(live, expected);
    assert!(!live.contains(&closed));
}

#[tokio::test]
async fn single_probe_reports_result() {
    let base = serve(site()).await;
    let prober = LivenessProber::new(settings()).unwrap();

    let result = prober.probe(&format!("{base}/missing")).await;
    assert!(!result.alive);
    assert_eq!(result.url, format!("{base}/missing"));
}

#[tokio::test]
async fn enricher_degrades_failures_to_none() {
    let base = serve(site()).await;
    let closed = closed_port_url().await;
    let enricher = MetadataEnricher::new(Duration::from_secs(2), 4).unwrap();

    let input: HashSet<String> = [
        format!("{base}/described"),
        format!("{base}/ok"),
        format!("{base}/missing"),
        closed.clone(),
    ]
    .into_iter()
    .collect();
    let meta = enricher.fetch_meta(&input).await;

    assert_eq!(meta.len(), 4);
    assert_eq!(meta[&format!("{base}/described")].as_deref(), Some("Lecture notes"));
    assert_eq!(meta[&format!("{base}/ok")].as_deref(), Some("fine"));
    assert_eq!(meta[&format!("{base}/missing")], None);
    assert_eq!(meta[&closed], None);
}

#[tokio::test]
async fn ipv6_literal_urls_are_probed() {
    // hosts without an IPv6 loopback can't run this
    let Ok(listener) = tokio::net::TcpListener::bind("[::1]:0").await else {
        return;
    };
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, site()).await.unwrap() });

    let prober = LivenessProber::new(settings()).unwrap();
    let result = prober.probe(&format!("http://[::1]:{}/ok", addr.port())).await;
    assert!(result.alive);
}
