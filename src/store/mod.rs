//! SQLite extent store. The library calls [`ExtentStore::save`] after every
//! mutation and [`ExtentStore::load`] once on start.

mod extent;
mod schema;

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::Result;
use crate::library::Extents;

#[derive(Debug)]
pub struct ExtentStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl ExtentStore {
    /// Open or create the database at `path`, creating missing tables.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = schema::open_connection(path)?;
        info!(path = %path.display(), "opened extent store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// A throwaway store, mostly for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::ensure_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    /// Backing file, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn save(&mut self, extents: &Extents) -> Result<()> {
        extent::write_extents(&mut self.conn, extents)?;
        debug!(
            members = extents.members.len(),
            books = extents.books.len(),
            loans = extents.loans.len(),
            "extent dump written"
        );
        Ok(())
    }

    pub(crate) fn load(&self) -> Result<Extents> {
        extent::read_extents(&self.conn)
    }
}
