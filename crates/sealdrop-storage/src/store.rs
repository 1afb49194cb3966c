//! The object store capability consumed by the transfer coordinator

use async_trait::async_trait;
use opendal::Operator;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object_id::ObjectId;

/// Ciphertext persistence keyed by [`ObjectId`].
///
/// A successful `write` must be visible to every later `read` of the same id.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn write(&self, id: &ObjectId, bytes: Vec<u8>) -> StoreResult<()>;

    async fn read(&self, id: &ObjectId) -> StoreResult<Vec<u8>>;
}

/// [`ObjectStore`] backed by any OpenDAL service
#[derive(Debug, Clone)]
pub struct OpendalStore {
    op: Operator,
}

impl OpendalStore {
    pub fn new(op: Operator) -> Self {
        Self { op }
    }

    pub fn operator(&self) -> &Operator {
        &self.op
    }
}

#[async_trait]
impl ObjectStore for OpendalStore {
    async fn write(&self, id: &ObjectId, bytes: Vec<u8>) -> StoreResult<()> {
        let path = id.storage_path();
        let len = bytes.len();
        self.op
            .write(&path, bytes)
            .await
            .map_err(|e| StoreError::from_opendal(id.as_str(), e))?;
        debug!(path = %path, bytes = len, "stored ciphertext");
        Ok(())
    }

    async fn read(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        let path = id.storage_path();
        let buf = self
            .op
            .read(&path)
            .await
            .map_err(|e| StoreError::from_opendal(id.as_str(), e))?;
        Ok(buf.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> OpendalStore {
        OpendalStore::new(
            Operator::new(opendal::services::Memory::default())
                .expect("memory operator")
                .finish(),
        )
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = memory_store();
        let id = ObjectId::derive("a.bin");

        store.write(&id, vec![1, 2, 3]).await.unwrap();
        assert_eq!(store.read(&id).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_empty_object() {
        let store = memory_store();
        let id = ObjectId::derive("empty");

        store.write(&id, Vec::new()).await.unwrap();
        assert!(store.read(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let store = memory_store();
        let id = ObjectId::parse("file-0-0-never.txt").unwrap();

        let err = store.read(&id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref s) if s == "file-0-0-never.txt"));
    }

    #[tokio::test]
    async fn test_stored_under_enc_suffix() {
        let store = memory_store();
        let id = ObjectId::parse("file-1-2-x.txt").unwrap();
        store.write(&id, b"ct".to_vec()).await.unwrap();

        let raw = store.operator().read("file-1-2-x.txt.enc").await.unwrap();
        assert_eq!(raw.to_vec(), b"ct");
    }
}
