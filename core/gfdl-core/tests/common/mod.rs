//! Local HTTP fixtures shared by the network tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use gfdl_core::errlog::{Failure, FailureSink};
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral loopback port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr: SocketAddr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

/// A loopback URL nothing listens on.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}/webfonts")
}

/// Request counter shared with handlers.
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sink that remembers every recorded failure.
#[derive(Default)]
pub struct MemorySink(Mutex<Vec<String>>);

impl MemorySink {
    pub fn messages(&self) -> Vec<String> {
        self.0.lock().expect("lock").clone()
    }
}

impl FailureSink for MemorySink {
    fn record_failure(&self, failure: Failure<'_>) {
        self.0
            .lock()
            .expect("lock")
            .push(format!("{}: {}", failure.message, failure.cause));
    }
}
