use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use tracing::{debug, warn};

use crate::config::DatabaseLocation;
use crate::domain::{DatasetId, ProteinEntity, ProteinPatch, ProvenanceRecord, SourceRow};
use crate::error::{CatalogError, ID_EXISTS, UPDATE_TARGET_MISSING};

// protein_source carries denormalized copies of id and name with no foreign
// key: provenance rows may point at entities that were never inserted.
const SCHEMA: &str = "
    DROP TABLE IF EXISTS protein_source;
    DROP TABLE IF EXISTS protein;
    CREATE TABLE protein (
        id   TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL
    );
    CREATE TABLE protein_source (
        relation_id  INTEGER PRIMARY KEY AUTOINCREMENT,
        protein_id   TEXT NOT NULL,
        protein_name TEXT NOT NULL,
        dataset_id   TEXT NOT NULL
    );
    CREATE INDEX protein_source_name ON protein_source (protein_name);
";

/// Catalog Store: canonical proteins plus their dataset provenance.
///
/// Cloning is cheap; every clone shares one connection and every operation
/// runs in its own transaction.
#[derive(Debug, Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(location: &DatabaseLocation) -> Result<Self, CatalogError> {
        let conn = match location {
            DatabaseLocation::Memory => Connection::open_in_memory(),
            DatabaseLocation::File(path) => Connection::open(path.as_std_path()),
        }
        .map_err(CatalogError::store)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, CatalogError> {
        Self::open(&DatabaseLocation::Memory)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::Store("connection lock poisoned".to_string()))
    }

    /// Drops and recreates both tables.
    pub fn reset(&self) -> Result<(), CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(CatalogError::store)?;
        tx.execute_batch(SCHEMA).map_err(CatalogError::store)?;
        tx.commit().map_err(CatalogError::store)?;
        debug!("catalog schema recreated");
        Ok(())
    }

    pub fn ping(&self) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(CatalogError::store)?;
        Ok(())
    }

    pub fn existing_names(&self) -> Result<HashSet<String>, CatalogError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached("SELECT name FROM protein")
            .map_err(CatalogError::store)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(CatalogError::store)?
            .collect::<Result<HashSet<_>, _>>()
            .map_err(CatalogError::store)?;
        Ok(names)
    }

    /// Inserts each row whose id is not catalogued yet, in order. Returns the
    /// number of rows actually inserted.
    pub fn insert_proteins(&self, rows: &[SourceRow]) -> Result<usize, CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(CatalogError::store)?;
        let mut inserted = 0;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO protein (id, name) VALUES (?1, ?2)
                     ON CONFLICT(id) DO NOTHING",
                )
                .map_err(CatalogError::store)?;
            for row in rows {
                let changed = stmt
                    .execute(params![row.id, row.name])
                    .map_err(CatalogError::store)?;
                if changed == 0 {
                    warn!(id = %row.id, name = %row.name, "protein id already catalogued, skipping");
                }
                inserted += changed;
            }
        }
        tx.commit().map_err(CatalogError::store)?;
        Ok(inserted)
    }

    pub fn append_provenance(
        &self,
        dataset: &DatasetId,
        rows: &[SourceRow],
    ) -> Result<usize, CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(CatalogError::store)?;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO protein_source (protein_id, protein_name, dataset_id)
                     VALUES (?1, ?2, ?3)",
                )
                .map_err(CatalogError::store)?;
            for row in rows {
                stmt.execute(params![row.id, row.name, dataset.as_str()])
                    .map_err(CatalogError::store)?;
            }
        }
        tx.commit().map_err(CatalogError::store)?;
        Ok(rows.len())
    }

    pub fn find_protein(&self, id: &str) -> Result<Option<ProteinEntity>, CatalogError> {
        let conn = self.lock()?;
        select_protein(&conn, id)
    }

    pub fn provenance_by_name(&self, name: &str) -> Result<Vec<ProvenanceRecord>, CatalogError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached(
                "SELECT relation_id, protein_id, protein_name, dataset_id
                 FROM protein_source WHERE protein_name = ?1 ORDER BY relation_id",
            )
            .map_err(CatalogError::store)?;
        let records = stmt
            .query_map(params![name], |row| {
                Ok(ProvenanceRecord {
                    relation_id: row.get(0)?,
                    protein_id: row.get(1)?,
                    protein_name: row.get(2)?,
                    dataset_id: row.get(3)?,
                })
            })
            .map_err(CatalogError::store)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(CatalogError::store)?;
        Ok(records)
    }

    pub fn create_protein(&self, protein: &ProteinEntity) -> Result<(), CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(CatalogError::store)?;
        if select_protein(&tx, &protein.id)?.is_some() {
            return Err(CatalogError::Conflict(ID_EXISTS.to_string()));
        }
        tx.execute(
            "INSERT INTO protein (id, name) VALUES (?1, ?2)",
            params![protein.id, protein.name],
        )
        .map_err(map_write_error)?;
        tx.commit().map_err(CatalogError::store)?;
        Ok(())
    }

    /// Applies the fields present in an already-normalized patch.
    pub fn update_protein(
        &self,
        id: &str,
        patch: &ProteinPatch,
    ) -> Result<ProteinEntity, CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(CatalogError::store)?;
        let current = select_protein(&tx, id)?
            .ok_or_else(|| CatalogError::NotFound(UPDATE_TARGET_MISSING.to_string()))?;
        let updated = ProteinEntity {
            id: patch.id.clone().unwrap_or_else(|| current.id.clone()),
            name: patch.name.clone().unwrap_or(current.name),
        };
        tx.execute(
            "UPDATE protein SET id = ?1, name = ?2 WHERE id = ?3",
            params![updated.id, updated.name, current.id],
        )
        .map_err(map_write_error)?;
        tx.commit().map_err(CatalogError::store)?;
        Ok(updated)
    }

    pub fn protein_count(&self) -> Result<usize, CatalogError> {
        self.count("SELECT COUNT(*) FROM protein")
    }

    pub fn provenance_count(&self) -> Result<usize, CatalogError> {
        self.count("SELECT COUNT(*) FROM protein_source")
    }

    fn count(&self, sql: &str) -> Result<usize, CatalogError> {
        let conn = self.lock()?;
        let count = conn
            .query_row(sql, [], |row| row.get::<_, i64>(0))
            .map_err(CatalogError::store)?;
        Ok(count as usize)
    }
}

fn select_protein(conn: &Connection, id: &str) -> Result<Option<ProteinEntity>, CatalogError> {
    conn.query_row(
        "SELECT id, name FROM protein WHERE id = ?1",
        params![id],
        |row| {
            Ok(ProteinEntity {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )
    .optional()
    .map_err(CatalogError::store)
}

fn map_write_error(err: rusqlite::Error) -> CatalogError {
    match err {
        rusqlite::Error::SqliteFailure(inner, _) if inner.code == ErrorCode::ConstraintViolation => {
            CatalogError::Conflict(ID_EXISTS.to_string())
        }
        err => CatalogError::store(err),
    }
}
