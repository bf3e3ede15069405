// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use news_digest::ingest::fetch::FeedFetcher;
use news_digest::FetchError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const CV_FEED: &str = include_str!("../fixtures/cv_feed.xml");
pub const ROBOTICS_FEED: &str = include_str!("../fixtures/robotics_feed.xml");

pub const CV_URL: &str = "https://arxiv.org/rss/cs.CV";
pub const ROBOTICS_URL: &str = "https://robotics.news/feed";

/// Evaluation instant the fixtures are dated against.
pub fn eval_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

enum Page {
    Body(String, Duration),
    Fail(FetchError),
}

/// In-memory fetcher; unknown URLs time out.
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, Page>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.pages
            .insert(url.to_string(), Page::Body(body.to_string(), Duration::ZERO));
        self
    }

    pub fn slow_page(mut self, url: &str, body: &str, delay: Duration) -> Self {
        self.pages
            .insert(url.to_string(), Page::Body(body.to_string(), delay));
        self
    }

    pub fn failing(mut self, err: FetchError) -> Self {
        self.pages.insert(err.url.clone(), Page::Fail(err));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl FeedFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(Page::Body(body, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Ok(body.clone())
            }
            Some(Page::Fail(e)) => Err(e.clone()),
            None => Err(FetchError::timeout(url)),
        }
    }
}

/// One request as seen by [`serve_once`].
#[derive(Debug, Clone, Default)]
pub struct Captured {
    pub head: String,
    pub body: String,
}

/// Accept one connection, record the request and answer with `response`
/// after `delay`. Returns the bound address and a handle yielding the request.
pub async fn serve_once(
    response: String,
    delay: Duration,
) -> (SocketAddr, tokio::task::JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let captured = read_request(&mut sock).await;
        tokio::time::sleep(delay).await;
        let _ = sock.write_all(response.as_bytes()).await;
        let _ = sock.shutdown().await;
        captured
    });
    (addr, handle)
}

async fn read_request(sock: &mut tokio::net::TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = sock.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return Captured {
                head: String::from_utf8_lossy(&buf).into_owned(),
                body: String::new(),
            };
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let content_length = head
        .lines()
        .find_map(|l| {
            let (k, v) = l.split_once(':')?;
            k.eq_ignore_ascii_case("content-length")
                .then(|| v.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while buf.len() < head_end + content_length {
        let n = sock.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Captured {
        head,
        body: String::from_utf8_lossy(&buf[head_end..]).into_owned(),
    }
}

pub fn http_response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}
