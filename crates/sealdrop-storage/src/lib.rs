//! sealdrop-storage: ciphertext object store over OpenDAL
//!
//! The relay core only needs `write(id, bytes)` and `read(id)`. Objects are
//! immutable once written and addressed by an [`ObjectId`]; no index or
//! listing is kept.

pub mod error;
pub mod health;
pub mod object_id;
pub mod operator;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use health::check_health;
pub use object_id::ObjectId;
pub use operator::build_from_core_config;
pub use store::{ObjectStore, OpendalStore};
