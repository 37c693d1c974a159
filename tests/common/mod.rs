#![allow(dead_code)]

use async_trait::async_trait;
use autocare_client::{ClientConfig, Sleeper};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// 只記錄等待時間，不真的睡
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

pub fn config_for(base_url: &str) -> ClientConfig {
    ClientConfig::with_base_url(base_url)
}

/// 取得一個目前沒有人監聽的位址
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

struct BackendState {
    script: Mutex<VecDeque<(u16, String)>>,
    fallback: (u16, String),
    health_delay: Duration,
    api_hits: AtomicUsize,
    health_hits: AtomicUsize,
    health_active: AtomicUsize,
    health_max_concurrent: AtomicUsize,
}

/// 依序回應預先寫好的狀態碼；`/health` 永遠回 200 (可延遲)
pub struct ScriptedBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
}

impl ScriptedBackend {
    pub async fn start(script: Vec<(u16, &str)>, fallback: (u16, &str), health_delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(BackendState {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|(status, body)| (status, body.to_string()))
                    .collect(),
            ),
            fallback: (fallback.0, fallback.1.to_string()),
            health_delay,
            api_hits: AtomicUsize::new(0),
            health_hits: AtomicUsize::new(0),
            health_active: AtomicUsize::new(0),
            health_max_concurrent: AtomicUsize::new(0),
        });

        let accept_state = state.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let state = accept_state.clone();
                tokio::spawn(async move {
                    let _ = handle(stream, state).await;
                });
            }
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn api_hits(&self) -> usize {
        self.state.api_hits.load(Ordering::SeqCst)
    }

    pub fn health_hits(&self) -> usize {
        self.state.health_hits.load(Ordering::SeqCst)
    }

    pub fn health_max_concurrent(&self) -> usize {
        self.state.health_max_concurrent.load(Ordering::SeqCst)
    }
}

async fn handle(mut stream: TcpStream, state: Arc<BackendState>) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let (status, body) = if path.starts_with("/health") {
        state.health_hits.fetch_add(1, Ordering::SeqCst);
        let active = state.health_active.fetch_add(1, Ordering::SeqCst) + 1;
        state
            .health_max_concurrent
            .fetch_max(active, Ordering::SeqCst);
        tokio::time::sleep(state.health_delay).await;
        state.health_active.fetch_sub(1, Ordering::SeqCst);
        (200, r#"{"status":"UP"}"#.to_string())
    } else {
        state.api_hits.fetch_add(1, Ordering::SeqCst);
        let next = state.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| state.fallback.clone())
    };

    let response = format!(
        "HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
