//! Generic replicated document store seam.
//!
//! The engine treats storage as a plain read/write/subscribe primitive over
//! named JSON documents. `update` merges top-level fields only; there are no
//! conditional or transactional writes, so concurrent writers race on
//! last-write-wins terms and the engine has to live with that. Real
//! replicated backends live behind this trait as external collaborators; the
//! in-memory backend serves tests and the simulation binary.

mod error;
pub mod memory;

use futures::future::BoxFuture;
use futures::stream::BoxStream;

pub use self::error::{StoreError, StoreResult};

/// Collection holding one game document per match.
pub const GAMES_COLLECTION: &str = "games";
/// Collection holding the question catalog.
pub const QUESTIONS_COLLECTION: &str = "questions";
/// Collection holding the category catalog.
pub const CATEGORIES_COLLECTION: &str = "categories";

/// A stored document: a JSON object with top-level fields.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Stream of successive document versions, monotonically ordered. The full
/// document is delivered on every change, including the subscriber's own
/// writes. Dropping the stream is the unsubscribe.
pub type DocumentStream = BoxStream<'static, StoreResult<Document>>;

/// Abstraction over the replicated document store.
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id, or `None` if absent.
    fn get(&self, collection: &str, id: &str)
    -> BoxFuture<'static, StoreResult<Option<Document>>>;

    /// Create a document; fails if it already exists.
    fn create(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> BoxFuture<'static, StoreResult<()>>;

    /// Merge the named top-level fields into an existing document. Absent
    /// fields are left untouched; a null value overwrites the field with
    /// null. Array-valued fields are replaced wholesale.
    fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> BoxFuture<'static, StoreResult<()>>;

    /// Fetch every document of a collection.
    fn list(&self, collection: &str) -> BoxFuture<'static, StoreResult<Vec<Document>>>;

    /// Subscribe to a document, receiving its current version immediately and
    /// every subsequent version after that.
    fn subscribe(
        &self,
        collection: &str,
        id: &str,
    ) -> BoxFuture<'static, StoreResult<DocumentStream>>;
}
