//! Fake upstream services for integration tests
//!
//! Each fake is a small axum server on an ephemeral 127.0.0.1 port that
//! records what it was asked and answers with canned bodies.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ariadne_common::config::ResolverConfig;
use ariadne_resolver::{build_router, AppState, Resolver};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};

pub const ASK_A_LIBRARIAN_URL: &str = "http://library.nyu.edu/ask/";
pub const LINK_TO_RESOURCE: &str = "http://purl.org/pnx/linkType/linktorsrc";
pub const LINK_TO_PRICE: &str = "http://purl.org/pnx/linkType/linktoprice";

/// Requests seen by a fake service
#[derive(Clone, Default)]
pub struct Recorder {
    requests: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn record(&self, request: String) {
        self.requests.lock().unwrap().push(request);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// A running fake upstream
pub struct FakeUpstream {
    pub url: String,
    pub recorder: Recorder,
}

async fn serve(app: Router, path: &str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}{path}")
}

#[derive(Clone)]
struct CoverageState {
    recorder: Recorder,
    status: StatusCode,
    body: String,
}

async fn coverage_handler(State(state): State<CoverageState>, body: String) -> (StatusCode, String) {
    state.recorder.record(body);
    (state.status, state.body.clone())
}

/// Coverage service answering every POST with `body`
pub async fn spawn_coverage(body: String) -> FakeUpstream {
    spawn_coverage_with_status(StatusCode::OK, body).await
}

pub async fn spawn_coverage_with_status(status: StatusCode, body: String) -> FakeUpstream {
    let recorder = Recorder::default();
    let state = CoverageState {
        recorder: recorder.clone(),
        status,
        body,
    };
    let app = Router::new()
        .route("/sfxlcl41", post(coverage_handler))
        .with_state(state);

    FakeUpstream {
        url: serve(app, "/sfxlcl41").await,
        recorder,
    }
}

#[derive(Clone)]
struct CatalogState {
    recorder: Recorder,
    search_body: Value,
    /// Member search bodies keyed by group id; unknown groups get a 500
    members: Arc<HashMap<String, Value>>,
}

async fn catalog_handler(
    State(state): State<CatalogState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    let mut keys: Vec<_> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    keys.sort();
    state.recorder.record(keys.join("&"));

    match params.get("multiFacets") {
        None => (StatusCode::OK, state.search_body.to_string()),
        Some(facet) => {
            let group_id = facet.trim_start_matches("facet_frbrgroupid,include,");
            match state.members.get(group_id) {
                Some(body) => (StatusCode::OK, body.to_string()),
                None => (StatusCode::INTERNAL_SERVER_ERROR, "member search failed".to_string()),
            }
        }
    }
}

/// Catalog service answering the ISBN search with `search_body` and member
/// searches from `members`
pub async fn spawn_catalog(search_body: Value, members: Vec<(&str, Value)>) -> FakeUpstream {
    let recorder = Recorder::default();
    let members = members
        .into_iter()
        .map(|(group_id, body)| (group_id.to_string(), body))
        .collect();
    let state = CatalogState {
        recorder: recorder.clone(),
        search_body,
        members: Arc::new(members),
    };
    let app = Router::new().route("/pnxs", get(catalog_handler)).with_state(state);

    FakeUpstream {
        url: serve(app, "/pnxs").await,
        recorder,
    }
}

/// Base URL nothing listens on
pub async fn unreachable_url(path: &str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}{path}")
}

pub fn config(coverage_url: &str, catalog_url: &str) -> ResolverConfig {
    ResolverConfig {
        coverage_url: coverage_url.to_string(),
        catalog_url: catalog_url.to_string(),
        upstream_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

pub fn resolver(coverage_url: &str, catalog_url: &str) -> Resolver {
    Resolver::new(&config(coverage_url, catalog_url)).unwrap()
}

pub fn app(coverage_url: &str, catalog_url: &str) -> Router {
    build_router(AppState::new(resolver(coverage_url, catalog_url)))
}

// ---------------------------------------------------------------------------
// Canned bodies
// ---------------------------------------------------------------------------

pub fn target(public_name: &str, url: &str) -> String {
    format!(
        "<target><target_name>{public_name}</target_name>\
         <target_public_name>{public_name}</target_public_name>\
         <target_url>{url}</target_url></target>"
    )
}

pub fn coverage_body(targets: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ctx_obj_set>
  <ctx_obj identifier="">
    <ctx_obj_attributes>stuff</ctx_obj_attributes>
    <ctx_obj_targets>{}</ctx_obj_targets>
  </ctx_obj>
</ctx_obj_set>"#,
        targets.join("")
    )
}

pub fn link(text: &str, url: &str, link_type: &str) -> Value {
    json!({"hyperlinkText": text, "linkURL": url, "linkType": link_type})
}

pub fn doc(links: Vec<Value>, isbns: &[&str]) -> Value {
    json!({
        "delivery": {"link": links},
        "pnx": {"facets": {}, "search": {"isbn": isbns}}
    })
}

pub fn group_doc(group_id: &str, links: Vec<Value>) -> Value {
    json!({
        "delivery": {"link": links},
        "pnx": {"facets": {"frbrtype": ["5"], "frbrgroupid": [group_id]}, "search": {"isbn": []}}
    })
}

pub fn docs(docs: Vec<Value>) -> Value {
    let total = docs.len();
    json!({"docs": docs, "info": {"total": total}})
}
