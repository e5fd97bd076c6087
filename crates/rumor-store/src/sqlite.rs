//! SQLite-backed rumor repository

use crate::StoreError;
use parking_lot::Mutex;
use rumor_domain::traits::{Page, RumorFilter, RumorPage, RumorRepository, UpdateStatus};
use rumor_domain::{
    BelievabilityEntry, Category, EntityId, Rumor, RumorId, RumorRecord, Severity, SubjectId,
    Variant,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::collections::BTreeSet;
use std::path::Path;

const RUMOR_COLUMNS: &str = "id, original_content, categories, severity, truth_value, \
     originator_id, created_at, updated_at, version";

/// SQLite-based implementation of RumorRepository
///
/// # Thread Safety
///
/// The connection is guarded by a mutex, so one store can be shared across
/// threads. Statements run one at a time; each record write is a single
/// transaction.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database at the given path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rumor_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("rumors.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn id_to_bytes(id: SubjectId) -> Vec<u8> {
        id.to_bytes().to_vec()
    }

    fn conversion_failure<E>(idx: usize, ty: Type, e: E) -> rusqlite::Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(e))
    }

    fn read_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<SubjectId> {
        let bytes: Vec<u8> = row.get(idx)?;
        SubjectId::from_bytes(&bytes).map_err(|e| Self::conversion_failure(idx, Type::Blob, e))
    }

    fn read_entity(row: &Row<'_>, idx: usize) -> rusqlite::Result<EntityId> {
        let raw: String = row.get(idx)?;
        EntityId::new(raw).map_err(|e| Self::conversion_failure(idx, Type::Text, e))
    }

    /// Map a row selected with `RUMOR_COLUMNS`
    fn read_rumor(row: &Row<'_>) -> rusqlite::Result<(Rumor, u64)> {
        let categories_json: String = row.get(2)?;
        let categories: BTreeSet<Category> = serde_json::from_str(&categories_json)
            .map_err(|e| Self::conversion_failure(2, Type::Text, e))?;

        let severity_raw: String = row.get(3)?;
        let severity = Severity::parse(&severity_raw).ok_or_else(|| {
            Self::conversion_failure(
                3,
                Type::Text,
                StoreError::InvalidData(format!("Unknown severity: {}", severity_raw)),
            )
        })?;

        let rumor = Rumor {
            id: Self::read_id(row, 0)?,
            original_content: row.get(1)?,
            categories,
            severity,
            truth_value: row.get(4)?,
            originator_id: Self::read_entity(row, 5)?,
            created_at: row.get::<_, i64>(6)? as u64,
            updated_at: row.get::<_, i64>(7)? as u64,
        };
        let version = row.get::<_, i64>(8)? as u64;
        Ok((rumor, version))
    }

    fn read_variant(row: &Row<'_>) -> rusqlite::Result<Variant> {
        Ok(Variant {
            id: Self::read_id(row, 0)?,
            source_id: Self::read_id(row, 1)?,
            content: row.get(2)?,
            mutation_strength: row.get(3)?,
            creator_entity_id: Self::read_entity(row, 4)?,
            strategy: row.get(5)?,
            created_at: row.get::<_, i64>(6)? as u64,
        })
    }

    fn read_belief(row: &Row<'_>) -> rusqlite::Result<BelievabilityEntry> {
        let heard_from: Option<String> = row.get(3)?;
        let heard_from_entity_id = heard_from
            .map(EntityId::new)
            .transpose()
            .map_err(|e| Self::conversion_failure(3, Type::Text, e))?;

        Ok(BelievabilityEntry {
            subject_id: Self::read_id(row, 0)?,
            entity_id: Self::read_entity(row, 1)?,
            believability: row.get(2)?,
            heard_from_entity_id,
            heard_at: row.get::<_, i64>(4)? as u64,
            last_decayed_at: row.get::<_, i64>(5)? as u64,
        })
    }

    fn load_record(conn: &Connection, id: RumorId) -> Result<Option<RumorRecord>, StoreError> {
        let id_bytes = Self::id_to_bytes(id);

        let head = conn
            .query_row(
                &format!("SELECT {} FROM rumors WHERE id = ?1", RUMOR_COLUMNS),
                params![&id_bytes],
                Self::read_rumor,
            )
            .optional()?;
        let Some((rumor, version)) = head else {
            return Ok(None);
        };

        let mut stmt = conn.prepare_cached(
            "SELECT id, source_id, content, mutation_strength, creator_entity_id, strategy, created_at
             FROM variants WHERE rumor_id = ?1 ORDER BY seq",
        )?;
        let variants = stmt
            .query_map(params![&id_bytes], Self::read_variant)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare_cached(
            "SELECT subject_id, entity_id, believability, heard_from_entity_id, heard_at, last_decayed_at
             FROM beliefs WHERE rumor_id = ?1 ORDER BY seq",
        )?;
        let entries = stmt
            .query_map(params![&id_bytes], Self::read_belief)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(RumorRecord::from_parts(rumor, variants, entries, version)?))
    }

    /// Write variants and beliefs for a record
    ///
    /// Variants are immutable, so existing rows are kept. Beliefs are
    /// rewritten in ledger order.
    fn write_children(conn: &Connection, record: &RumorRecord) -> Result<(), StoreError> {
        let rumor_bytes = Self::id_to_bytes(record.id());

        let mut insert_variant = conn.prepare_cached(
            "INSERT OR IGNORE INTO variants
             (id, rumor_id, seq, source_id, content, mutation_strength, creator_entity_id, strategy, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for (seq, variant) in record.lineage.variants().iter().enumerate() {
            insert_variant.execute(params![
                Self::id_to_bytes(variant.id),
                &rumor_bytes,
                seq as i64,
                Self::id_to_bytes(variant.source_id),
                &variant.content,
                variant.mutation_strength,
                variant.creator_entity_id.as_str(),
                &variant.strategy,
                variant.created_at as i64,
            ])?;
        }

        conn.execute("DELETE FROM beliefs WHERE rumor_id = ?1", params![&rumor_bytes])?;
        let mut insert_belief = conn.prepare_cached(
            "INSERT INTO beliefs
             (rumor_id, subject_id, entity_id, seq, believability, heard_from_entity_id, heard_at, last_decayed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for (seq, entry) in record.ledger.entries().iter().enumerate() {
            insert_belief.execute(params![
                &rumor_bytes,
                Self::id_to_bytes(entry.subject_id),
                entry.entity_id.as_str(),
                seq as i64,
                entry.believability,
                entry.heard_from_entity_id.as_ref().map(|e| e.as_str()),
                entry.heard_at as i64,
                entry.last_decayed_at as i64,
            ])?;
        }

        Ok(())
    }
}

impl RumorRepository for SqliteStore {
    type Error = StoreError;

    fn create(&self, record: RumorRecord) -> Result<RumorId, Self::Error> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let id = record.id();
        let id_bytes = Self::id_to_bytes(id);

        let exists: bool = tx
            .query_row("SELECT 1 FROM rumors WHERE id = ?1", params![&id_bytes], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        if exists {
            return Err(StoreError::Duplicate(id.to_string()));
        }

        let rumor = &record.rumor;
        let categories = serde_json::to_string(&rumor.categories)?;
        tx.execute(
            "INSERT INTO rumors
             (id, original_content, categories, severity, severity_rank, truth_value, originator_id, created_at, updated_at, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &id_bytes,
                &rumor.original_content,
                categories,
                rumor.severity.as_str(),
                i64::from(rumor.severity.rank()),
                rumor.truth_value,
                rumor.originator_id.as_str(),
                rumor.created_at as i64,
                rumor.updated_at as i64,
                record.version as i64,
            ],
        )?;
        Self::write_children(&tx, &record)?;
        tx.commit()?;

        tracing::debug!(rumor_id = %id, "Stored new rumor");
        Ok(id)
    }

    fn get(&self, id: RumorId) -> Result<Option<RumorRecord>, Self::Error> {
        let conn = self.conn.lock();
        Self::load_record(&conn, id)
    }

    fn root_of(&self, subject_id: SubjectId) -> Result<Option<RumorId>, Self::Error> {
        let conn = self.conn.lock();
        let root = conn
            .query_row(
                "SELECT id FROM rumors WHERE id = ?1
                 UNION ALL
                 SELECT rumor_id FROM variants WHERE id = ?1
                 LIMIT 1",
                params![Self::id_to_bytes(subject_id)],
                |row| Self::read_id(row, 0),
            )
            .optional()?;
        Ok(root)
    }

    fn update(&self, record: &RumorRecord) -> Result<UpdateStatus, Self::Error> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let id_bytes = Self::id_to_bytes(record.id());

        let current: Option<i64> = tx
            .query_row(
                "SELECT version FROM rumors WHERE id = ?1",
                params![&id_bytes],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current) = current.map(|v| v as u64) else {
            return Err(StoreError::NotFound(record.id().to_string()));
        };
        if current != record.version {
            return Ok(UpdateStatus::Stale { current });
        }

        let version = current + 1;
        tx.execute(
            "UPDATE rumors SET updated_at = ?2, version = ?3 WHERE id = ?1",
            params![&id_bytes, record.rumor.updated_at as i64, version as i64],
        )?;
        Self::write_children(&tx, record)?;
        tx.commit()?;

        Ok(UpdateStatus::Committed { version })
    }

    fn list(&self, filter: &RumorFilter, page: Page) -> Result<RumorPage, Self::Error> {
        let mut sql = format!("SELECT {} FROM rumors WHERE 1=1", RUMOR_COLUMNS);
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(min) = filter.min_truth {
            sql.push_str(" AND truth_value >= ?");
            params.push(Box::new(min));
        }

        if let Some(max) = filter.max_truth {
            sql.push_str(" AND truth_value <= ?");
            params.push(Box::new(max));
        }

        if let Some(severity) = filter.severity {
            sql.push_str(" AND severity_rank = ?");
            params.push(Box::new(i64::from(severity.rank())));
        }

        if let Some(severity) = filter.min_severity {
            sql.push_str(" AND severity_rank >= ?");
            params.push(Box::new(i64::from(severity.rank())));
        }

        if let Some(entity) = &filter.known_by {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM beliefs b WHERE b.rumor_id = rumors.id AND b.entity_id = ?)",
            );
            params.push(Box::new(entity.as_str().to_string()));
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        // Category and text matching run in Rust to share the exact
        // semantics of RumorFilter::matches_rumor
        let matches = stmt
            .query_map(&param_refs[..], Self::read_rumor)?
            .filter_map(|row| match row {
                Ok((rumor, _)) if !filter.matches_rumor(&rumor) => None,
                Ok((rumor, _)) => Some(Ok(rumor)),
                Err(e) => Some(Err(e)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RumorPage::paginate(matches, page))
    }

    fn ids(&self) -> Result<Vec<RumorId>, Self::Error> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id FROM rumors ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| Self::read_id(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn delete(&self, id: RumorId) -> Result<bool, Self::Error> {
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM rumors WHERE id = ?1",
            params![Self::id_to_bytes(id)],
        )?;
        if removed > 0 {
            tracing::debug!(rumor_id = %id, "Deleted rumor");
        }
        Ok(removed > 0)
    }
}
