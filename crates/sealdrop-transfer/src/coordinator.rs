//! Transfer coordinator: ingest and egress
//!
//! Ingest: digest → fresh key → encrypt → write → record → hand key/iv/tag back.
//! Egress: read → decrypt + verify → digest → record → plaintext.
//!
//! Key material lives only on the stack of the call that uses it. Cipher work
//! runs synchronously between storage awaits and never spans a suspension
//! point.

use std::sync::Arc;

use sealdrop_core::{Operation, Outcome, TransferRecord};
use sealdrop_crypto::{
    self as crypto, AuthTag, ContentDigest, Iv, KeyMaterial, OsRandom, RandomSource,
};
use sealdrop_storage::{ObjectId, ObjectStore};
use tracing::{debug, info_span, warn, Instrument};

use crate::audit::AuditSink;
use crate::error::{TransferError, TransferResult};

/// Everything the uploader needs to fetch the object back.
///
/// The relay keeps none of `key`, `iv`, or `tag`.
#[derive(Debug)]
pub struct IngestReceipt {
    pub object_id: ObjectId,
    pub key: KeyMaterial,
    pub iv: Iv,
    pub tag: AuthTag,
    pub digest: ContentDigest,
    pub size: u64,
}

/// Verified plaintext returned by egress
#[derive(Debug)]
pub struct EgressPayload {
    pub plaintext: Vec<u8>,
    pub digest: ContentDigest,
}

/// Orchestrates one transfer at a time per call; holds no per-transfer state.
#[derive(Clone)]
pub struct TransferCoordinator {
    store: Arc<dyn ObjectStore>,
    audit: Arc<dyn AuditSink>,
    random: Arc<dyn RandomSource>,
}

impl TransferCoordinator {
    /// Coordinator drawing keys and IVs from the OS CSPRNG.
    pub fn new(store: Arc<dyn ObjectStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store,
            audit,
            random: Arc::new(OsRandom),
        }
    }

    /// Replace the source of key and IV bytes.
    pub fn with_random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Encrypt `plaintext` under a fresh key and store it under an identifier
    /// derived from `name_hint`.
    pub async fn ingest(&self, plaintext: &[u8], name_hint: &str) -> TransferResult<IngestReceipt> {
        let object_id = ObjectId::derive(name_hint);
        let span = info_span!("ingest", object_id = %object_id, size = plaintext.len());

        async {
            let size = plaintext.len() as u64;
            let digest = crypto::digest(plaintext);

            let random = self.random.as_ref();
            let (key, sealed) = match crypto::generate_key_from(random).and_then(|key| {
                crypto::encrypt_with(plaintext, &key, random).map(|sealed| (key, sealed))
            }) {
                Ok(pair) => pair,
                Err(e) => {
                    let err = TransferError::from(e);
                    self.emit(&object_id, Operation::Ingest, Err(&err));
                    return Err(err);
                }
            };
            debug!("encrypted");

            if let Err(e) = self.store.write(&object_id, sealed.ciphertext).await {
                let err = TransferError::from(e);
                warn!(error = %err, "ciphertext write failed");
                self.emit(&object_id, Operation::Ingest, Err(&err));
                return Err(err);
            }

            self.emit(&object_id, Operation::Ingest, Ok((size, &digest)));

            Ok(IngestReceipt {
                object_id: object_id.clone(),
                key,
                iv: sealed.iv,
                tag: sealed.tag,
                digest,
                size,
            })
        }
        .instrument(span)
        .await
    }

    /// Fetch `object_id` and decrypt it with the caller's key, IV, and tag.
    ///
    /// Any mismatch is [`TransferError::Verification`], with the same record
    /// and the same error no matter which of the inputs was wrong.
    pub async fn egress(
        &self,
        object_id: &ObjectId,
        key: &KeyMaterial,
        iv: &Iv,
        tag: &AuthTag,
    ) -> TransferResult<EgressPayload> {
        let span = info_span!("egress", object_id = %object_id);

        async {
            let ciphertext = match self.store.read(object_id).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    let err = TransferError::from(e);
                    self.emit(object_id, Operation::Egress, Err(&err));
                    return Err(err);
                }
            };

            let plaintext = match crypto::decrypt(&ciphertext, key, iv, tag) {
                Ok(plaintext) => plaintext,
                Err(_) => {
                    let err = TransferError::Verification;
                    self.emit(object_id, Operation::Egress, Err(&err));
                    return Err(err);
                }
            };

            let digest = crypto::digest(&plaintext);
            self.emit(
                object_id,
                Operation::Egress,
                Ok((plaintext.len() as u64, &digest)),
            );

            Ok(EgressPayload { plaintext, digest })
        }
        .instrument(span)
        .await
    }

    fn emit(
        &self,
        object_id: &ObjectId,
        operation: Operation,
        result: Result<(u64, &ContentDigest), &TransferError>,
    ) {
        let record = match result {
            Ok((size, digest)) => TransferRecord::new(object_id.as_str(), operation, Outcome::Success)
                .with_plaintext(size, digest.to_hex()),
            Err(err) => TransferRecord::new(object_id.as_str(), operation, err.outcome()),
        };
        self.audit.record(&record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use sealdrop_storage::OpendalStore;

    fn coordinator() -> (TransferCoordinator, Arc<MemoryAuditSink>) {
        let op = opendal::Operator::new(opendal::services::Memory::default())
            .expect("memory operator")
            .finish();
        let audit = Arc::new(MemoryAuditSink::new());
        (
            TransferCoordinator::new(Arc::new(OpendalStore::new(op)), audit.clone()),
            audit,
        )
    }

    #[tokio::test]
    async fn test_ingest_records_success_with_digest() {
        let (coord, audit) = coordinator();
        let receipt = coord.ingest(b"abc", "abc.txt").await.unwrap();

        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].operation, Operation::Ingest);
        assert_eq!(records[0].outcome, Outcome::Success);
        assert_eq!(records[0].size, Some(3));
        assert_eq!(records[0].digest.as_deref(), Some(receipt.digest.to_hex().as_str()));
        assert_eq!(records[0].object_id, receipt.object_id.as_str());
    }

    #[tokio::test]
    async fn test_stored_bytes_are_not_plaintext() {
        let op = opendal::Operator::new(opendal::services::Memory::default())
            .unwrap()
            .finish();
        let coord = TransferCoordinator::new(
            Arc::new(OpendalStore::new(op.clone())),
            Arc::new(MemoryAuditSink::new()),
        );
        let plaintext = b"attack at dawn, attack at dawn";

        let receipt = coord.ingest(plaintext, "orders.txt").await.unwrap();
        let stored = op.read(&receipt.object_id.storage_path()).await.unwrap().to_vec();

        assert_eq!(stored.len(), plaintext.len());
        assert_ne!(stored, plaintext);
    }

    #[tokio::test]
    async fn test_egress_wrong_tag_records_failure_without_digest() {
        let (coord, audit) = coordinator();
        let receipt = coord.ingest(b"payload", "p.bin").await.unwrap();

        let mut tag = *receipt.tag.as_bytes();
        tag[0] ^= 1;
        let err = coord
            .egress(&receipt.object_id, &receipt.key, &receipt.iv, &AuthTag::from_bytes(tag))
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::Verification));
        let last = audit.records().pop().unwrap();
        assert_eq!(last.outcome, Outcome::VerificationFailure);
        assert!(last.digest.is_none());
    }
}
