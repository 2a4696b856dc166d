//! # Shard Entities
//!
//! Every record type stored in the shards implements [`ShardEntity`]. The
//! trait carries the per-type facts the cross-shard layers need (which
//! collection, which fields a search term scans, which key identifies a
//! record across shards) and the lifecycle hooks the repository calls.

use crate::document::{field, Document, ID_FIELD};
use crate::error::ShardError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;

/// A record type that lives in exactly one shard.
///
/// # Example
///
/// ```rust
/// use geo_shard::{ShardEntity, ShardError};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Note {
///     id: String,
///     text: String,
///     #[serde(rename = "createdAt")]
///     created_at: u64,
/// }
///
/// #[derive(Debug)] struct NoteCreate { text: String }
/// #[derive(Debug, Clone)] struct NoteUpdate { text: Option<String> }
///
/// #[derive(Debug, thiserror::Error)]
/// enum NoteError {
///     #[error("empty note")]
///     Empty,
///     #[error(transparent)]
///     Shard(#[from] ShardError),
/// }
///
/// impl ShardEntity for Note {
///     type Create = NoteCreate;
///     type Update = NoteUpdate;
///     type Error = NoteError;
///
///     const COLLECTION: &'static str = "notes";
///     const SEARCH_FIELDS: &'static [&'static str] = &["text"];
///
///     fn id(&self) -> &str { &self.id }
///
///     fn from_create_params(params: NoteCreate, created_at: u64) -> Result<Self, NoteError> {
///         if params.text.is_empty() { return Err(NoteError::Empty); }
///         Ok(Self { id: String::new(), text: params.text, created_at })
///     }
///
///     fn on_update(&mut self, update: NoteUpdate) -> Result<(), NoteError> {
///         if let Some(text) = update.text { self.text = text; }
///         Ok(())
///     }
/// }
/// ```
pub trait ShardEntity: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Payload for creating a record.
    type Create: Debug + Send + Sync;

    /// Payload for updating a record. Cloned when an update has to be
    /// re-applied over a fresher read.
    type Update: Clone + Debug + Send + Sync;

    type Error: std::error::Error + From<ShardError> + Send + Sync + 'static;

    /// Store collection holding this type.
    const COLLECTION: &'static str;

    /// Fields an admin search term is matched against.
    const SEARCH_FIELDS: &'static [&'static str];

    /// Fields that must be unique across all shards combined.
    const UNIQUE_FIELDS: &'static [&'static str] = &[];

    /// Field identifying a record when merging results from several shards.
    const DEDUP_FIELD: &'static str = ID_FIELD;

    fn id(&self) -> &str;

    /// Builds a new record. The id is left empty; the store assigns it.
    fn from_create_params(params: Self::Create, created_at: u64) -> Result<Self, Self::Error>;

    /// Applies an update in place, rejecting invalid changes.
    fn on_update(&mut self, update: Self::Update) -> Result<(), Self::Error>;

    /// Identity of a stored document for cross-shard deduplication.
    ///
    /// Strings compare lower-cased and trimmed. Documents without the field
    /// have no identity and are never merged.
    fn dedup_key(doc: &Document) -> Option<String> {
        field(doc, Self::DEDUP_FIELD).map(|v| match v {
            Value::String(s) => s.trim().to_lowercase(),
            other => other.to_string(),
        })
    }

    fn to_document(&self) -> Result<Document, ShardError> {
        match serde_json::to_value(self)? {
            Value::Object(doc) => Ok(doc),
            other => Err(ShardError::Codec(format!(
                "{} serialized to {other}, expected an object",
                Self::COLLECTION
            ))),
        }
    }

    fn from_document(doc: Document) -> Result<Self, ShardError> {
        Ok(serde_json::from_value(Value::Object(doc))?)
    }
}

#[cfg(test)]
pub(crate) mod test_entity {
    //! A minimal entity shared by the crate's unit tests.

    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Account {
        pub id: String,
        pub email: String,
        pub country: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub state: Option<String>,
        pub stock: i64,
        pub created_at: u64,
    }

    #[derive(Debug)]
    pub struct AccountCreate {
        pub email: String,
        pub country: String,
        pub state: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct AccountUpdate {
        pub stock: Option<i64>,
    }

    #[derive(Debug, thiserror::Error)]
    pub enum AccountError {
        #[error("stock cannot be negative")]
        NegativeStock,
        #[error(transparent)]
        Shard(#[from] ShardError),
    }

    impl ShardEntity for Account {
        type Create = AccountCreate;
        type Update = AccountUpdate;
        type Error = AccountError;

        const COLLECTION: &'static str = "accounts";
        const SEARCH_FIELDS: &'static [&'static str] = &["email"];
        const UNIQUE_FIELDS: &'static [&'static str] = &["email"];
        const DEDUP_FIELD: &'static str = "email";

        fn id(&self) -> &str {
            &self.id
        }

        fn from_create_params(params: AccountCreate, created_at: u64) -> Result<Self, AccountError> {
            Ok(Self {
                id: String::new(),
                email: params.email,
                country: params.country,
                state: params.state,
                stock: 0,
                created_at,
            })
        }

        fn on_update(&mut self, update: AccountUpdate) -> Result<(), AccountError> {
            if let Some(stock) = update.stock {
                if stock < 0 {
                    return Err(AccountError::NegativeStock);
                }
                self.stock = stock;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_entity::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_round_trip_keeps_wire_names() {
        let account = Account::from_create_params(
            AccountCreate {
                email: "A@x.com".into(),
                country: "US".into(),
                state: None,
            },
            42,
        )
        .unwrap();
        let doc = account.to_document().unwrap();
        assert_eq!(doc["createdAt"], json!(42));
        assert!(!doc.contains_key("state"));
        assert_eq!(Account::from_document(doc).unwrap(), account);
    }

    #[test]
    fn test_dedup_key_normalizes_strings() {
        let doc = json!({"email": "  Dup@X.com "}).as_object().cloned().unwrap();
        assert_eq!(Account::dedup_key(&doc).as_deref(), Some("dup@x.com"));

        let doc = json!({"email": null}).as_object().cloned().unwrap();
        assert_eq!(Account::dedup_key(&doc), None);
    }
}
