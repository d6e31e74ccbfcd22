use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use maquette_cache::{CacheConfig, CacheHandle, CacheService, ResponseOrigin};
use maquette_manifest::ModelManifest;
use maquette_net::{Headers, HttpResponse, Net, NetError};
use maquette_store::{ModelStore, StoreOptions};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Serves canned responses per URL and counts network hits.
#[derive(Clone)]
struct ServedNet {
    routes: Arc<HashMap<String, HttpResponse>>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl ServedNet {
    fn new(routes: Vec<(Url, u16, &'static [u8])>) -> Self {
        let routes = routes
            .into_iter()
            .map(|(url, status, body)| {
                (
                    url.to_string(),
                    HttpResponse {
                        status,
                        status_text: match status {
                            200 => "OK".to_string(),
                            404 => "Not Found".to_string(),
                            _ => String::new(),
                        },
                        headers: Headers::new(),
                        body: Bytes::from_static(body),
                    },
                )
            })
            .collect();
        Self {
            routes: Arc::new(routes),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Net for ServedNet {
    async fn get(&self, url: Url, _headers: Option<Headers>) -> Result<HttpResponse, NetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.routes.get(url.as_str()).cloned().unwrap_or(HttpResponse {
            status: 404,
            status_text: "Not Found".to_string(),
            headers: Headers::new(),
            body: Bytes::new(),
        }))
    }

    async fn get_bytes(&self, url: Url, headers: Option<Headers>) -> Result<Bytes, NetError> {
        let resp = self.get(url.clone(), headers).await?;
        if resp.status != 200 {
            return Err(NetError::http_status(resp.status, url.to_string()));
        }
        Ok(resp.body)
    }

    async fn head(&self, _url: Url, _headers: Option<Headers>) -> Result<Headers, NetError> {
        Ok(Headers::new())
    }
}

/// Fails every request at the transport level.
struct DeadNet;

#[async_trait]
impl Net for DeadNet {
    async fn get(&self, _url: Url, _headers: Option<Headers>) -> Result<HttpResponse, NetError> {
        Err(NetError::http("connection refused"))
    }

    async fn get_bytes(&self, _url: Url, _headers: Option<Headers>) -> Result<Bytes, NetError> {
        Err(NetError::http("connection refused"))
    }

    async fn head(&self, _url: Url, _headers: Option<Headers>) -> Result<Headers, NetError> {
        Err(NetError::http("connection refused"))
    }
}

fn test_manifest() -> Arc<ModelManifest> {
    Arc::new(
        ModelManifest::builder()
            .model("atom", "atom/models/atom.glb", 1, 2.5, "science")
            .model("neuron", "neuron/models/neuron.glb", 2, 6.4, "biology")
            .build()
            .expect("manifest builds"),
    )
}

fn site_root() -> Url {
    Url::parse("http://models.local/").unwrap()
}

fn atom_url() -> Url {
    site_root().join("atom/models/atom.glb").unwrap()
}

struct Fixture {
    handle: CacheHandle,
    store: ModelStore,
    _cancel: CancellationToken,
    _tmp: tempfile::TempDir,
}

fn spawn_worker<N: Net + 'static>(net: N) -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let store = ModelStore::open(StoreOptions::new(tmp.path())).unwrap();
    let cancel = CancellationToken::new();
    let (handle, _task) = CacheService::spawn(
        CacheConfig::new(site_root()),
        store.clone(),
        net,
        test_manifest(),
        cancel.clone(),
    );
    Fixture {
        handle,
        store,
        _cancel: cancel,
        _tmp: tmp,
    }
}

#[tokio::test]
async fn preload_fetches_and_caches_once() {
    let net = ServedNet::new(vec![(atom_url(), 200, b"glTF-atom")]);
    let fx = spawn_worker(net.clone());

    let first = fx.handle.preload(atom_url()).await.unwrap();
    assert!(first.success);
    assert!(!first.cached);
    assert_eq!(first.error, None);

    // Immediate second preload: no second network fetch, reply says cached.
    let second = fx.handle.preload(atom_url()).await.unwrap();
    assert!(second.success);
    assert!(second.cached);

    assert_eq!(net.call_count(), 1);
    assert!(fx.store.contains(&atom_url()));
}

#[tokio::test]
async fn fetch_serves_fresh_entry_without_network() {
    let net = ServedNet::new(vec![(atom_url(), 200, b"glTF-atom")]);
    let fx = spawn_worker(net.clone());

    fx.store
        .put(
            &atom_url(),
            200,
            "OK",
            &Headers::new(),
            &Bytes::from_static(b"cached-bytes"),
        )
        .unwrap();

    let resp = fx.handle.fetch(atom_url()).await.unwrap();
    assert_eq!(resp.origin, ResponseOrigin::Cache);
    assert_eq!(resp.body, Bytes::from_static(b"cached-bytes"));
    assert_eq!(net.call_count(), 0);
}

#[tokio::test]
async fn fetch_refetches_stale_entry() {
    let net = ServedNet::new(vec![(atom_url(), 200, b"fresh-bytes")]);
    let fx = spawn_worker(net.clone());

    // Stamp far in the past: stale on first access.
    fx.store
        .put_at(
            &atom_url(),
            200,
            "OK",
            &Headers::new(),
            &Bytes::from_static(b"old-bytes"),
            1,
        )
        .unwrap();

    let resp = fx.handle.fetch(atom_url()).await.unwrap();
    assert_eq!(resp.origin, ResponseOrigin::Network);
    assert_eq!(resp.body, Bytes::from_static(b"fresh-bytes"));
    assert_eq!(net.call_count(), 1);

    // The refreshed copy now serves from cache.
    let again = fx.handle.fetch(atom_url()).await.unwrap();
    assert_eq!(again.origin, ResponseOrigin::Cache);
    assert_eq!(net.call_count(), 1);
}

#[tokio::test]
async fn fetch_miss_populates_cache() {
    let net = ServedNet::new(vec![(atom_url(), 200, b"glTF-atom")]);
    let fx = spawn_worker(net.clone());

    let resp = fx.handle.fetch(atom_url()).await.unwrap();
    assert_eq!(resp.origin, ResponseOrigin::Network);
    assert!(resp.is_success());

    let entry = fx.store.get(&atom_url()).unwrap().expect("stored");
    assert!(entry.cached_at_ms().is_some(), "stored copy is stamped");

    // The served response itself carries no stamp.
    assert_eq!(resp.headers.get(maquette_store::CACHED_TIME_HEADER), None);
}

#[tokio::test]
async fn non_200_is_served_but_never_cached() {
    let net = ServedNet::new(vec![(atom_url(), 404, b"")]);
    let fx = spawn_worker(net.clone());

    let resp = fx.handle.fetch(atom_url()).await.unwrap();
    assert_eq!(resp.status, 404);
    assert_eq!(resp.origin, ResponseOrigin::Network);
    assert!(!fx.store.contains(&atom_url()));

    // Not cached: every access goes back to the network.
    let _ = fx.handle.fetch(atom_url()).await.unwrap();
    assert_eq!(net.call_count(), 2);
}

#[tokio::test]
async fn cross_origin_response_is_served_but_never_cached() {
    let other = Url::parse("http://cdn.elsewhere/atom/models/atom.glb").unwrap();
    let net = ServedNet::new(vec![(other.clone(), 200, b"opaque")]);
    let fx = spawn_worker(net.clone());

    let resp = fx.handle.fetch(other.clone()).await.unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.origin, ResponseOrigin::Network);
    assert!(!fx.store.contains(&other));
}

#[tokio::test]
async fn transport_failure_becomes_synthetic_408() {
    let fx = spawn_worker(DeadNet);

    let resp = fx.handle.fetch(atom_url()).await.unwrap();
    assert_eq!(resp.status, 408);
    assert_eq!(resp.origin, ResponseOrigin::Synthetic);

    let complete = fx.handle.preload(atom_url()).await.unwrap();
    assert!(!complete.success);
    assert!(!complete.cached);
    assert!(complete.error.is_some());
}

#[tokio::test]
async fn preload_of_missing_asset_reports_http_error() {
    let net = ServedNet::new(vec![]); // everything 404s
    let fx = spawn_worker(net);

    let complete = fx.handle.preload(atom_url()).await.unwrap();
    assert!(!complete.success);
    assert_eq!(complete.error.as_deref(), Some("HTTP 404 Not Found"));
}

#[tokio::test]
async fn non_model_path_is_passthrough() {
    let page = site_root().join("index.html").unwrap();
    let net = ServedNet::new(vec![(page.clone(), 200, b"<html>")]);
    let fx = spawn_worker(net.clone());

    let resp = fx.handle.fetch(page.clone()).await.unwrap();
    assert_eq!(resp.status, 200);
    assert!(!fx.store.contains(&page));

    let _ = fx.handle.fetch(page).await.unwrap();
    assert_eq!(net.call_count(), 2, "passthrough never caches");
}

#[tokio::test]
async fn status_reports_cached_urls_and_registry_size() {
    let neuron = site_root().join("neuron/models/neuron.glb").unwrap();
    let net = ServedNet::new(vec![
        (atom_url(), 200, b"glTF-atom"),
        (neuron.clone(), 200, b"glTF-neuron"),
    ]);
    let fx = spawn_worker(net);

    fx.handle.preload(atom_url()).await.unwrap();
    fx.handle.preload(neuron.clone()).await.unwrap();

    let report = fx.handle.status().await.unwrap();
    assert_eq!(report.total_models, 2);
    let mut cached: Vec<String> = report.cached_models.iter().map(Url::to_string).collect();
    cached.sort();
    let mut expected = vec![atom_url().to_string(), neuron.to_string()];
    expected.sort();
    assert_eq!(cached, expected);
}

#[tokio::test(start_paused = true)]
async fn abandoned_preload_still_warms_cache() {
    let net =
        ServedNet::new(vec![(atom_url(), 200, b"glTF-atom")]).with_delay(Duration::from_millis(200));
    let fx = spawn_worker(net.clone());

    // Caller gives up long before the fetch completes.
    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), fx.handle.preload(atom_url())).await;
    assert!(abandoned.is_err());

    // The worker's fetch is not cancelled; it finishes and populates the cache.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(fx.store.contains(&atom_url()));
    assert_eq!(net.call_count(), 1);
}

#[tokio::test]
async fn cancelled_worker_reports_gone() {
    let net = ServedNet::new(vec![]);
    let tmp = tempfile::tempdir().unwrap();
    let store = ModelStore::open(StoreOptions::new(tmp.path())).unwrap();
    let cancel = CancellationToken::new();
    let (handle, task) = CacheService::spawn(
        CacheConfig::new(site_root()),
        store,
        net,
        test_manifest(),
        cancel.clone(),
    );

    cancel.cancel();
    task.await.unwrap();

    assert!(handle.preload(atom_url()).await.is_err());
}
