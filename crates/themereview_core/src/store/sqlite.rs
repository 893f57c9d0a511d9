//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist documents of every collection in the `documents` table as JSON.
//! - Implement per-document atomic writes with `IMMEDIATE` transactions.
//!
//! # Invariants
//! - `doc_id` column always equals the body's `id` field.
//! - Each write transaction reads and rewrites at most one row.

use super::{
    document_id, DocId, Document, DocumentStore, Filter, StoreError, StoreResult, UpdateResult,
    UpdateSpec, ID_FIELD,
};
use crate::db::migrations::latest_version;
use log::debug;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior};
use serde_json::Value;

/// Document store over a migrated SQLite connection.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Creates a store from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` when the `documents` table is absent.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn begin(&self) -> StoreResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        Ok(load_first(self.conn, collection, filter)?.map(|(_, document)| document))
    }

    fn find_all(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        if let Filter::Id(_) = filter {
            return Ok(self.find_one(collection, filter)?.into_iter().collect());
        }

        let matches = scan(self.conn, collection, filter, usize::MAX)?;
        Ok(matches.into_iter().map(|(_, document)| document).collect())
    }

    fn insert_one(&self, collection: &str, document: Document) -> StoreResult<DocId> {
        let id = document_id(&document)?;
        let body = serde_json::to_string(&Value::Object(document))?;

        let inserted = self.conn.execute(
            "INSERT INTO documents (collection, doc_id, body) VALUES (?1, ?2, ?3);",
            params![collection, id.to_string(), body],
        );
        match inserted {
            Ok(_) => {
                debug!("event=store_insert module=store status=ok collection={collection} id={id}");
                Ok(id)
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateId {
                    collection: collection.to_string(),
                    id,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        mut document: Document,
    ) -> StoreResult<UpdateResult> {
        let tx = self.begin()?;
        let Some((doc_id, current)) = load_first(&tx, collection, filter)? else {
            return Ok(UpdateResult::default());
        };

        match document.get(ID_FIELD) {
            None => {
                document.insert(ID_FIELD.to_string(), Value::String(doc_id.clone()));
            }
            Some(Value::String(value)) if *value == doc_id => {}
            Some(other) => {
                return Err(StoreError::InvalidUpdate(format!(
                    "replacement id {other} does not match stored id {doc_id}"
                )));
            }
        }

        let modified = current != document;
        if modified {
            write_body(&tx, collection, &doc_id, document)?;
        }
        tx.commit()?;

        debug!(
            "event=store_replace module=store status=ok collection={collection} id={doc_id} modified={modified}"
        );
        Ok(UpdateResult {
            matched: 1,
            modified: u64::from(modified),
        })
    }

    fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateSpec,
    ) -> StoreResult<UpdateResult> {
        let tx = self.begin()?;
        let Some((doc_id, mut document)) = load_first(&tx, collection, filter)? else {
            debug!(
                "event=store_update module=store status=ok collection={} op={} field={} matched=0",
                collection,
                update.op_name(),
                update.field()
            );
            return Ok(UpdateResult::default());
        };

        let modified = update.apply(&mut document)?;
        if modified {
            write_body(&tx, collection, &doc_id, document)?;
        }
        tx.commit()?;

        debug!(
            "event=store_update module=store status=ok collection={} id={} op={} field={} matched=1 modified={}",
            collection,
            doc_id,
            update.op_name(),
            update.field(),
            modified
        );
        Ok(UpdateResult {
            matched: 1,
            modified: u64::from(modified),
        })
    }

    fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let deleted = match filter {
            Filter::Id(id) => self.conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                params![collection, id.to_string()],
            )?,
            _ => {
                let tx = self.begin()?;
                let deleted = match load_first(&tx, collection, filter)? {
                    Some((doc_id, _)) => tx.execute(
                        "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                        params![collection, doc_id],
                    )?,
                    None => 0,
                };
                tx.commit()?;
                deleted
            }
        };

        debug!(
            "event=store_delete module=store status=ok collection={collection} deleted={deleted}"
        );
        Ok(deleted as u64)
    }
}

fn load_first(
    conn: &Connection,
    collection: &str,
    filter: &Filter,
) -> StoreResult<Option<(String, Document)>> {
    if let Filter::Id(id) = filter {
        let doc_id = id.to_string();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                params![collection, doc_id],
                |row| row.get(0),
            )
            .optional()?;
        return match body {
            Some(body) => Ok(Some((doc_id.clone(), parse_body(collection, &doc_id, &body)?))),
            None => Ok(None),
        };
    }

    Ok(scan(conn, collection, filter, 1)?.pop())
}

/// Returns up to `limit` documents of `collection` matching `filter`, oldest
/// first.
fn scan(
    conn: &Connection,
    collection: &str,
    filter: &Filter,
    limit: usize,
) -> StoreResult<Vec<(String, Document)>> {
    let mut stmt = conn.prepare(
        "SELECT doc_id, body
         FROM documents
         WHERE collection = ?1
         ORDER BY created_at ASC, rowid ASC;",
    )?;
    let mut rows = stmt.query([collection])?;
    let mut matches = Vec::new();
    while matches.len() < limit {
        let Some(row) = rows.next()? else {
            break;
        };
        let doc_id: String = row.get("doc_id")?;
        let document = parse_body(collection, &doc_id, &row.get::<_, String>("body")?)?;
        if filter.matches(&document) {
            matches.push((doc_id, document));
        }
    }
    Ok(matches)
}

fn write_body(
    conn: &Connection,
    collection: &str,
    doc_id: &str,
    document: Document,
) -> StoreResult<()> {
    let body = serde_json::to_string(&Value::Object(document))?;
    conn.execute(
        "UPDATE documents
         SET
            body = ?3,
            updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
         WHERE collection = ?1
           AND doc_id = ?2;",
        params![collection, doc_id, body],
    )?;
    Ok(())
}

fn parse_body(collection: &str, doc_id: &str, body: &str) -> StoreResult<Document> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(document) => Ok(document),
        _ => Err(StoreError::InvalidDocument(format!(
            "body of {collection}/{doc_id} is not a JSON object"
        ))),
    }
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'documents'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(StoreError::MissingRequiredTable("documents"));
    }

    Ok(())
}
