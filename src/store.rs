// 🗄️ Entity Store - SQLite persistence for the seven entity tables
//
// Table and column names follow the registry schema: abn is the parent,
// everything else hangs off it by abn_id. All writes happen inside a
// transaction owned by the caller; this module never commits.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Transaction};

use crate::entities::{
    Abn, AsicNumber, Dgr, EntityKind, Gst, LegalEntity, MainEntity, OtherEntity,
};

/// Handle on the persistent store. Passed explicitly into the loader and
/// pipeline; connection parameters are supplied by the caller.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the store at `path` and apply connection pragmas.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        Self::configure(conn)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self> {
        // WAL for crash recovery; enforced ownership between abn and children.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Store { conn })
    }

    /// Create the seven entity tables if they do not exist.
    pub fn setup(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS abn (
                abn INTEGER PRIMARY KEY,
                abn_status TEXT NOT NULL,
                abn_status_from_date TEXT NOT NULL,
                entity_type_indicator TEXT NOT NULL,
                entity_type_text TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS main_entity (
                abn_id INTEGER PRIMARY KEY REFERENCES abn(abn),
                main_entity_type TEXT NOT NULL,
                main_entity_name TEXT NOT NULL,
                address_state TEXT NOT NULL,
                address_postcode INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS legal_entity (
                abn_id INTEGER PRIMARY KEY REFERENCES abn(abn),
                legal_entity_type TEXT NOT NULL,
                legal_entity_name TEXT NOT NULL,
                address_state TEXT NOT NULL,
                address_postcode INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS asic_number (
                abn_id INTEGER PRIMARY KEY REFERENCES abn(abn),
                asic_number TEXT NOT NULL,
                asic_type TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS gst (
                abn_id INTEGER PRIMARY KEY REFERENCES abn(abn),
                status TEXT NOT NULL,
                status_from_date TEXT
            );

            CREATE TABLE IF NOT EXISTS dgr (
                abn_id INTEGER NOT NULL REFERENCES abn(abn),
                status_from_date TEXT,
                name TEXT NOT NULL,
                PRIMARY KEY (abn_id, status_from_date, name)
            );

            CREATE TABLE IF NOT EXISTS other_entity (
                abn_id INTEGER NOT NULL REFERENCES abn(abn),
                other_entity_type TEXT NOT NULL,
                other_entity_name TEXT NOT NULL,
                PRIMARY KEY (abn_id, other_entity_type, other_entity_name)
            );",
        )?;
        Ok(())
    }

    /// Begin the run transaction. Dropping it without commit rolls back.
    pub fn transaction(&mut self) -> rusqlite::Result<Transaction<'_>> {
        self.conn.transaction()
    }

    /// Row count for one entity kind.
    pub fn count(&self, kind: EntityKind) -> Result<i64> {
        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// ============================================================================
// TRANSACTION-SCOPED OPERATIONS
// ============================================================================

/// Delete every row of every table, children before parent.
pub fn purge_all(tx: &Transaction) -> rusqlite::Result<()> {
    for kind in EntityKind::ALL.iter().rev() {
        tx.execute(&format!("DELETE FROM {}", kind.table()), [])?;
    }
    Ok(())
}

pub fn insert_abns(tx: &Transaction, rows: &[Abn]) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO abn (abn, abn_status, abn_status_from_date,
                          entity_type_indicator, entity_type_text)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for row in rows {
        stmt.execute(params![
            row.abn,
            row.status,
            row.status_from_date.to_string(),
            row.entity_type_indicator,
            row.entity_type_text,
        ])?;
    }
    Ok(rows.len())
}

pub fn insert_main_entities(tx: &Transaction, rows: &[MainEntity]) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO main_entity (abn_id, main_entity_type, main_entity_name,
                                  address_state, address_postcode)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for row in rows {
        stmt.execute(params![
            row.abn,
            row.entity_type,
            row.name,
            row.state,
            row.postcode,
        ])?;
    }
    Ok(rows.len())
}

pub fn insert_legal_entities(tx: &Transaction, rows: &[LegalEntity]) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO legal_entity (abn_id, legal_entity_type, legal_entity_name,
                                   address_state, address_postcode)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for row in rows {
        stmt.execute(params![
            row.abn,
            row.entity_type,
            row.name,
            row.state,
            row.postcode,
        ])?;
    }
    Ok(rows.len())
}

pub fn insert_asic_numbers(tx: &Transaction, rows: &[AsicNumber]) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO asic_number (abn_id, asic_number, asic_type)
         VALUES (?1, ?2, ?3)",
    )?;
    for row in rows {
        stmt.execute(params![row.abn, row.number, row.asic_type])?;
    }
    Ok(rows.len())
}

pub fn insert_gst_statuses(tx: &Transaction, rows: &[Gst]) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO gst (abn_id, status, status_from_date)
         VALUES (?1, ?2, ?3)",
    )?;
    for row in rows {
        stmt.execute(params![
            row.abn,
            row.status,
            row.status_from_date.map(|d| d.to_string()),
        ])?;
    }
    Ok(rows.len())
}

pub fn insert_dgr_entries(tx: &Transaction, rows: &[Dgr]) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO dgr (abn_id, status_from_date, name)
         VALUES (?1, ?2, ?3)",
    )?;
    for row in rows {
        stmt.execute(params![
            row.abn,
            row.status_from_date.map(|d| d.to_string()),
            row.name,
        ])?;
    }
    Ok(rows.len())
}

pub fn insert_other_entities(tx: &Transaction, rows: &[OtherEntity]) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO other_entity (abn_id, other_entity_type, other_entity_name)
         VALUES (?1, ?2, ?3)",
    )?;
    for row in rows {
        stmt.execute(params![row.abn, row.entity_type, row.name])?;
    }
    Ok(rows.len())
}
