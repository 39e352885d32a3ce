//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use audio_gateway::config::GatewayConfig;
use audio_gateway::extraction::{ExtractOptions, ExtractionError, Extractor, VideoMetadata};
use audio_gateway::http::HttpServer;
use audio_gateway::lifecycle::Shutdown;
use serde_json::Value;
use tokio::net::TcpListener;

/// Programmable stand-in for the extraction capability.
pub enum Script {
    Respond(Value),
    Fail(&'static str),
    Crash,
    Sleep(Duration),
}

pub struct FakeExtractor {
    script: Script,
    pub calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn extract_audio_formats(
        &self,
        _url: &str,
        _options: &ExtractOptions,
    ) -> Result<VideoMetadata, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Respond(value) => Ok(serde_json::from_value(value.clone())?),
            Script::Fail(message) => Err(ExtractionError::Failed(message.to_string())),
            Script::Crash => Err(ExtractionError::Exited {
                status: "exit status: 1".into(),
                stderr: "Traceback (most recent call last)".into(),
            }),
            Script::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(VideoMetadata::default())
            }
        }
    }
}

/// Fresh, unique directory under the system temp dir.
pub fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("audio-gateway-it-{}-{}", tag, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Config bound to an ephemeral port with its storage under `base`.
pub fn test_config(base: &std::path::Path) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.storage.root = base.join("static");
    config.storage.log_dir = base.join("logs");
    config
}

/// A running gateway. Dropping it stops the server and removes `base`.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub storage_root: PathBuf,
    pub client: reqwest::Client,
    base: PathBuf,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
        std::fs::remove_dir_all(&self.base).ok();
    }
}

/// Start a gateway on 127.0.0.1:0 backed by `extractor`. `base` is the
/// test's scratch directory and is deleted with the returned handle.
pub async fn start_gateway(
    base: &std::path::Path,
    config: GatewayConfig,
    extractor: Arc<dyn Extractor>,
) -> TestGateway {
    std::fs::create_dir_all(&config.storage.root).ok();
    let storage_root = config.storage.root.clone();

    let listener = TcpListener::bind(config.listener.bind_address()).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, extractor);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();

    TestGateway {
        addr,
        storage_root,
        client,
        base: base.to_path_buf(),
        shutdown,
    }
}
