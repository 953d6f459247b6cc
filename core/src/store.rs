//! Document store backed by sled.
//!
//! Three trees: `docs` (big-endian id -> bincode record), `urls` (url -> id) and
//! `meta` (id counter). Inserts run as one transaction over all three so URL
//! uniqueness and id allocation can't race.

use crate::DocId;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use std::path::Path;
use time::format_description::well_known::Rfc3339;

const NEXT_ID_KEY: &[u8] = b"next_doc_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub url: String,
    pub html_content: String,
    pub text_content: String,
    /// RFC 3339, UTC, assigned at insert.
    pub crawled_at: String,
}

/// Result of [`DocumentStore::insert`]. A URL that is already present is an
/// expected outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Stored(DocId),
    AlreadyExists(DocId),
}

#[derive(Serialize, Deserialize)]
struct StoredRecord {
    url: String,
    html_content: String,
    text_content: String,
    crawled_at: String,
}

#[derive(Clone)]
pub struct DocumentStore {
    db: sled::Db,
    docs: sled::Tree,
    urls: sled::Tree,
    meta: sled::Tree,
}

impl DocumentStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path).with_context(|| format!("opening document store at {}", path.display()))?;
        let docs = db.open_tree("docs")?;
        let urls = db.open_tree("urls")?;
        let meta = db.open_tree("meta")?;
        Ok(Self { db, docs, urls, meta })
    }

    /// Insert a new document. Ids are allocated sequentially inside the same
    /// transaction that claims the URL, so a rejected duplicate never burns an id.
    pub fn insert(&self, url: &str, html_content: &str, text_content: &str) -> Result<InsertOutcome> {
        let crawled_at = time::OffsetDateTime::now_utc().format(&Rfc3339)?;
        let record = StoredRecord {
            url: url.to_string(),
            html_content: html_content.to_string(),
            text_content: text_content.to_string(),
            crawled_at,
        };
        let encoded = bincode::serialize(&record)?;

        let outcome: Result<InsertOutcome, TransactionError<()>> =
            (&self.urls, &self.docs, &self.meta).transaction(|(urls, docs, meta)| {
                if let Some(existing) = urls.get(url.as_bytes())? {
                    return Ok(InsertOutcome::AlreadyExists(decode_id(&existing)));
                }
                let last = meta.get(NEXT_ID_KEY)?.map(|v| decode_id(&v)).unwrap_or(0);
                let id = last.checked_add(1).ok_or(ConflictableTransactionError::Abort(()))?;
                let key = id.to_be_bytes().to_vec();
                meta.insert(NEXT_ID_KEY, key.clone())?;
                urls.insert(url.as_bytes(), key.clone())?;
                docs.insert(key, encoded.clone())?;
                Ok(InsertOutcome::Stored(id))
            });

        match outcome {
            Ok(o) => Ok(o),
            Err(TransactionError::Abort(())) => Err(anyhow!("document id space exhausted")),
            Err(TransactionError::Storage(e)) => Err(e.into()),
        }
    }

    pub fn get(&self, id: DocId) -> Result<Option<Document>> {
        match self.docs.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode_document(id, &bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_by_url(&self, url: &str) -> Result<Option<Document>> {
        match self.urls.get(url.as_bytes())? {
            Some(id) => self.get(decode_id(&id)),
            None => Ok(None),
        }
    }

    /// All documents in ascending id order.
    pub fn documents(&self) -> impl Iterator<Item = Result<Document>> + '_ {
        self.docs.iter().map(|entry| {
            let (key, value) = entry?;
            decode_document(decode_id(&key), &value)
        })
    }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn decode_id(bytes: &[u8]) -> DocId {
    let mut buf = [0u8; 4];
    let n = bytes.len().min(4);
    buf[4 - n..].copy_from_slice(&bytes[bytes.len() - n..]);
    DocId::from_be_bytes(buf)
}

fn decode_document(id: DocId, bytes: &[u8]) -> Result<Document> {
    let record: StoredRecord = bincode::deserialize(bytes).with_context(|| format!("decoding document {id}"))?;
    Ok(Document {
        id,
        url: record.url,
        html_content: record.html_content,
        text_content: record.text_content,
        crawled_at: record.crawled_at,
    })
}
