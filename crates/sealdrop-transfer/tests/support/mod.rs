//! Shared test helpers: in-memory store, fault-injecting store, coordinator wiring.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use opendal::Operator;
use sealdrop_crypto::{CryptoError, CryptoResult, RandomSource};
use sealdrop_storage::{ObjectId, ObjectStore, OpendalStore, StoreError, StoreResult};
use sealdrop_transfer::{MemoryAuditSink, TransferCoordinator};

pub fn memory_operator() -> Operator {
    Operator::new(opendal::services::Memory::default())
        .expect("memory operator")
        .finish()
}

pub fn memory_coordinator() -> (TransferCoordinator, Arc<MemoryAuditSink>) {
    let audit = Arc::new(MemoryAuditSink::new());
    let store = Arc::new(OpendalStore::new(memory_operator()));
    (TransferCoordinator::new(store, audit.clone()), audit)
}

/// Store whose writes always fail; counts attempts so tests can assert no retry.
#[derive(Default)]
pub struct BrokenStore {
    pub writes: AtomicUsize,
    pub reads: AtomicUsize,
}

#[async_trait]
impl ObjectStore for BrokenStore {
    async fn write(&self, _id: &ObjectId, _bytes: Vec<u8>) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Storage("disk quota exceeded".into()))
    }

    async fn read(&self, _id: &ObjectId) -> StoreResult<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Storage("backend unreachable".into()))
    }
}

pub fn broken_coordinator() -> (TransferCoordinator, Arc<BrokenStore>, Arc<MemoryAuditSink>) {
    let audit = Arc::new(MemoryAuditSink::new());
    let store = Arc::new(BrokenStore::default());
    (
        TransferCoordinator::new(store.clone(), audit.clone()),
        store,
        audit,
    )
}

/// Random source that is always exhausted, like a failing `getrandom`.
pub struct FailingRandom;

impl RandomSource for FailingRandom {
    fn try_fill(&self, _dest: &mut [u8]) -> CryptoResult<()> {
        Err(CryptoError::RandomSource("getrandom: ENOSYS".into()))
    }
}

/// Coordinator whose randomness always fails, over a store that counts attempts.
pub fn no_entropy_coordinator() -> (TransferCoordinator, Arc<BrokenStore>, Arc<MemoryAuditSink>) {
    let (coord, store, audit) = broken_coordinator();
    (coord.with_random_source(Arc::new(FailingRandom)), store, audit)
}
