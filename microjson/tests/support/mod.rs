#![allow(dead_code)]
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Request,
    response::Response,
};
use microjson::{
    repositories::{Database, Transaction},
    MessagePublisher,
};
use serde_json::Value;

/// What happened to the transactions opened through a [`FakeDatabase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxEvent {
    Begin,
    Exec(String),
    Commit,
    CommitFailed,
    Rollback,
    RolledBackOnDrop,
}

#[derive(Debug, Clone, Copy, Default)]
struct Failures {
    begin: bool,
    commit: bool,
    rollback: bool,
}

/// In-memory stand-in for a connection pool that records every transaction event.
#[derive(Debug, Clone, Default)]
pub struct FakeDatabase {
    events: Arc<Mutex<Vec<TxEvent>>>,
    failures: Failures,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_begin(mut self) -> Self {
        self.failures.begin = true;
        self
    }

    pub fn failing_commit(mut self) -> Self {
        self.failures.commit = true;
        self
    }

    pub fn failing_rollback(mut self) -> Self {
        self.failures.rollback = true;
        self
    }

    pub fn events(&self) -> Vec<TxEvent> {
        self.events.lock().expect("lock events").clone()
    }

    pub fn clear(&self) {
        self.events.lock().expect("lock events").clear();
    }
}

pub struct FakeTransaction {
    events: Arc<Mutex<Vec<TxEvent>>>,
    failures: Failures,
    open: bool,
}

impl FakeTransaction {
    pub fn execute(&mut self, sql: &str) {
        self.record(TxEvent::Exec(sql.to_string()));
    }

    fn record(&self, event: TxEvent) {
        self.events.lock().expect("lock events").push(event);
    }
}

impl Drop for FakeTransaction {
    fn drop(&mut self) {
        if self.open {
            self.record(TxEvent::RolledBackOnDrop);
        }
    }
}

#[async_trait]
impl Database for FakeDatabase {
    type Transaction = FakeTransaction;

    async fn begin(&self) -> Result<FakeTransaction, sqlx::Error> {
        if self.failures.begin {
            return Err(sqlx::Error::PoolTimedOut);
        }
        self.events.lock().expect("lock events").push(TxEvent::Begin);
        Ok(FakeTransaction {
            events: self.events.clone(),
            failures: self.failures,
            open: true,
        })
    }
}

#[async_trait]
impl Transaction for FakeTransaction {
    async fn commit(mut self) -> Result<(), sqlx::Error> {
        if self.failures.commit {
            self.record(TxEvent::CommitFailed);
            return Err(sqlx::Error::Protocol("commit refused".to_string()));
        }
        self.open = false;
        self.record(TxEvent::Commit);
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), sqlx::Error> {
        self.open = false;
        self.record(TxEvent::Rollback);
        if self.failures.rollback {
            return Err(sqlx::Error::Protocol("rollback refused".to_string()));
        }
        Ok(())
    }
}

/// Publisher that always fails.
pub struct FailingPublisher;

#[async_trait]
impl MessagePublisher for FailingPublisher {
    async fn publish(&self, _message: Value) -> anyhow::Result<()> {
        Err(anyhow!("broker unavailable"))
    }
}

/// Publisher that panics on every message.
pub struct PanickingPublisher;

#[async_trait]
impl MessagePublisher for PanickingPublisher {
    async fn publish(&self, _message: Value) -> anyhow::Result<()> {
        panic!("publisher exploded")
    }
}

pub fn get(uri: &str) -> Request {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

pub async fn response_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json")
}
