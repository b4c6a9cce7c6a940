//! Shared fakes for module tests: a scriptable fetcher with a call
//! counter and a host that records every platform call.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use crate::config::AgentConfig;
use crate::host::Host;
use crate::models::{FetchRequest, PendingNotification, ResponseSnapshot};
use crate::net::{FetchError, Fetcher};

pub fn test_config() -> AgentConfig {
    AgentConfig {
        cache_name: "city-neuro".to_string(),
        version: "v4".to_string(),
        base_url: Url::parse("https://example.com/").unwrap(),
        precache_manifest: vec![
            "/".to_string(),
            "/index.html".to_string(),
            "/manifest.json".to_string(),
            "/app.js".to_string(),
            "/styles.css".to_string(),
            "/icons/icon-192.png".to_string(),
            "/icons/icon-512.png".to_string(),
            "/offline.html".to_string(),
        ],
        offline_document: "/offline.html".to_string(),
        skip_waiting_on_install: false,
        cache_dir: None,
        notification_icon: Some("/icons/icon-192.png".to_string()),
        sync: None,
    }
}

/// Fetcher with scripted responses, scriptable failures, and an
/// invocation counter (for the cache-first zero-network property).
#[derive(Default)]
pub struct FakeFetcher {
    responses: Mutex<HashMap<String, ResponseSnapshot>>,
    failures: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetcher pre-scripted with a 200 response for every manifest entry.
    pub fn for_manifest(config: &AgentConfig) -> Self {
        let fetcher = Self::new();
        for path in &config.precache_manifest {
            let url = config.resolve(path).unwrap();
            fetcher.respond(url.as_str(), &format!("content of {}", path));
        }
        fetcher
    }

    pub fn respond(&self, url: &str, body: &str) {
        self.respond_with(
            url,
            ResponseSnapshot::new(200, HashMap::new(), body.as_bytes().to_vec()),
        );
    }

    pub fn respond_status(&self, url: &str, status: u16) {
        self.respond_with(url, ResponseSnapshot::new(status, HashMap::new(), Vec::new()));
    }

    pub fn respond_with(&self, url: &str, snapshot: ResponseSnapshot) {
        self.responses.lock().unwrap().insert(url.to_string(), snapshot);
    }

    /// Make one URL fail at the transport level.
    pub fn fail_url(&self, url: &str) {
        self.failures.lock().unwrap().insert(url.to_string());
    }

    /// Make every fetch fail, simulating a dropped network.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let url = request.url.as_str();
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Unavailable("offline".to_string()));
        }
        if self.failures.lock().unwrap().contains(url) {
            return Err(FetchError::Unavailable(format!("scripted failure: {}", url)));
        }
        match self.responses.lock().unwrap().get(url) {
            Some(snapshot) => Ok(snapshot.clone()),
            None => Err(FetchError::Unavailable(format!("no scripted response: {}", url))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    NotificationShown(PendingNotification),
    NotificationClosed(String),
    WindowOpened(String),
    ClientsClaimed,
}

/// Host that records every platform call for assertion.
#[derive(Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<HostCall>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Host for RecordingHost {
    async fn show_notification(&self, notification: &PendingNotification) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(HostCall::NotificationShown(notification.clone()));
        Ok(())
    }

    async fn close_notification(&self, notification: &PendingNotification) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(HostCall::NotificationClosed(notification.title.clone()));
        Ok(())
    }

    async fn open_window(&self, url: &str) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(HostCall::WindowOpened(url.to_string()));
        Ok(())
    }

    async fn claim_clients(&self) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(HostCall::ClientsClaimed);
        Ok(())
    }
}
