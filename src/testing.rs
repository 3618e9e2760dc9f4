//! In-memory fetch adapter shared by the unit tests.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex as TokioMutex, oneshot};

use crate::error::FetchError;
use crate::youtube::{ApiVersion, FetchAdapter, Payload};

/// Serves canned v3 payloads keyed by the `q` parameter. Gated queries block
/// until their gate is opened; failing queries answer HTTP 500; panicking
/// queries end the fetch task without any answer.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
  calls: AtomicUsize,
  urls: StdMutex<Vec<Url>>,
  responses: HashMap<String, Vec<&'static str>>,
  failing: Vec<String>,
  panicking: Vec<String>,
  gates: HashMap<String, TokioMutex<Option<oneshot::Receiver<()>>>>,
}

impl ScriptedFetcher {
  pub(crate) fn respond(mut self, query: &str, ids: Vec<&'static str>) -> Self {
    self.responses.insert(query.to_string(), ids);
    self
  }

  pub(crate) fn fail(mut self, query: &str) -> Self {
    self.failing.push(query.to_string());
    self
  }

  pub(crate) fn panic_on(mut self, query: &str) -> Self {
    self.panicking.push(query.to_string());
    self
  }

  pub(crate) fn gate(mut self, query: &str) -> (Self, oneshot::Sender<()>) {
    let (tx, rx) = oneshot::channel();
    self.gates.insert(query.to_string(), TokioMutex::new(Some(rx)));
    (self, tx)
  }

  pub(crate) fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub(crate) fn urls(&self) -> Vec<Url> {
    self.urls.lock().map(|urls| urls.clone()).unwrap_or_default()
  }
}

#[async_trait]
impl FetchAdapter for ScriptedFetcher {
  async fn fetch(&self, url: Url, _version: ApiVersion) -> Result<Payload, FetchError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut urls) = self.urls.lock() {
      urls.push(url.clone());
    }
    let q = url.query_pairs().find(|(k, _)| k == "q").map(|(_, v)| v.into_owned()).unwrap_or_default();
    let gate = match self.gates.get(&q) {
      Some(gate) => gate.lock().await.take(),
      None => None,
    };
    if let Some(rx) = gate {
      let _ = rx.await;
    }
    if self.panicking.contains(&q) {
      panic!("fetch task for {q:?} crashed");
    }
    if self.failing.contains(&q) {
      return Err(FetchError::Status(500));
    }
    let ids = self.responses.get(&q).cloned().unwrap_or_default();
    let items: Vec<_> = ids
      .iter()
      .map(|id| {
        json!({
          "id": { "kind": "youtube#video", "videoId": id },
          "snippet": { "title": format!("Video {}", id), "publishedAt": "2014-02-03T04:05:06Z", "thumbnails": {} }
        })
      })
      .collect();
    Ok(Payload::Json(json!({ "items": items })))
  }
}
