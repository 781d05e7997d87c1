//! Connections to the LODES spatial database
//!
//! The core never writes, so files are opened read-only. A `DbSource`
//! either borrows a caller-managed `LodesDb` or opens one for a single
//! operation and closes it before returning.

use crate::config::{LodesConfig, SpatialBackend};
use crate::errors::{LodesError, Result};
use crate::spatial_functions;
use rusqlite::{Connection, LoadExtensionGuard, OpenFlags};
use std::path::{Path, PathBuf};

/// How to open a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub backend: SpatialBackend,
    /// Module name or path for `load_extension`
    pub spatialite_module: String,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            backend: SpatialBackend::Spatialite,
            spatialite_module: "mod_spatialite".to_string(),
        }
    }
}

impl ConnectOptions {
    pub fn builtin() -> Self {
        Self {
            backend: SpatialBackend::Builtin,
            ..Self::default()
        }
    }
}

impl From<&LodesConfig> for ConnectOptions {
    fn from(cfg: &LodesConfig) -> Self {
        Self {
            backend: cfg.backend,
            spatialite_module: cfg.spatialite_module.clone(),
        }
    }
}

/// Open LODES database handle
pub struct LodesDb {
    conn: Connection,
    backend: SpatialBackend,
    path: Option<PathBuf>,
}

impl LodesDb {
    /// Open the database at `path` read-only and enable the spatial backend.
    pub fn open(path: &Path, options: &ConnectOptions) -> Result<Self> {
        if !path.exists() {
            return Err(LodesError::connection(format!(
                "no SQLite db at {}",
                path.display()
            )));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| {
            LodesError::connection_with_source(
                format!("failed to open db at {}", path.display()),
                e,
            )
        })?;

        let mut db = Self::from_connection(conn, options)?;
        db.path = Some(path.to_path_buf());

        tracing::info!(
            path = %path.display(),
            backend = %options.backend,
            "LODES db opened"
        );
        Ok(db)
    }

    /// Open using the config's `db_path` and backend settings.
    pub fn open_with_config(cfg: &LodesConfig) -> Result<Self> {
        let path = cfg
            .resolved_db_path()
            .ok_or_else(|| LodesError::config("no db_path configured"))?;
        Self::open(&path, &ConnectOptions::from(cfg))
    }

    /// Adopt an already-open connection, enabling the spatial backend on it.
    pub fn from_connection(conn: Connection, options: &ConnectOptions) -> Result<Self> {
        match options.backend {
            SpatialBackend::Spatialite => load_spatialite(&conn, &options.spatialite_module)?,
            SpatialBackend::Builtin => spatial_functions::register(&conn).map_err(|e| {
                LodesError::connection_with_source("failed to register spatial functions", e)
            })?,
        }
        Ok(Self {
            conn,
            backend: options.backend,
            path: None,
        })
    }

    /// Connect to an in-memory database with builtin spatial functions (for testing)
    #[cfg(test)]
    pub(crate) fn connect_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LodesError::connection_with_source("failed to open in-memory db", e))?;
        Self::from_connection(conn, &ConnectOptions::builtin())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn backend(&self) -> SpatialBackend {
        self.backend
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close the connection, surfacing any error SQLite reports.
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn.close().map_err(|(_, e)| {
            LodesError::connection_with_source("failed to close db connection", e)
        })?;
        if let Some(path) = path {
            tracing::debug!(path = %path.display(), "LODES db closed");
        }
        Ok(())
    }
}

fn load_spatialite(conn: &Connection, module: &str) -> Result<()> {
    // SAFETY: the module is the operator-configured SpatiaLite library;
    // extension loading is switched off again when the guard drops.
    unsafe {
        let _guard = LoadExtensionGuard::new(conn).map_err(|e| {
            LodesError::connection_with_source("failed to enable extension loading", e)
        })?;
        conn.load_extension(module, None::<&str>).map_err(|e| {
            LodesError::connection_with_source(
                format!("failed to load spatial extension '{module}'"),
                e,
            )
        })?;
    }
    tracing::debug!(module, "Loaded SpatiaLite extension");
    Ok(())
}

/// Where an operation gets its connection from
pub enum DbSource<'a> {
    /// Caller-managed handle, reused across calls
    Handle(&'a LodesDb),
    /// Database file opened for this operation only
    Path {
        path: &'a Path,
        options: ConnectOptions,
    },
}

impl<'a> DbSource<'a> {
    pub fn path(path: &'a Path, options: ConnectOptions) -> Self {
        Self::Path { path, options }
    }

    /// Run `op` against a connection. Path sources open a connection for the
    /// duration of `op` and close it afterwards, even when `op` fails.
    pub fn with_db<T>(self, op: impl FnOnce(&LodesDb) -> Result<T>) -> Result<T> {
        match self {
            Self::Handle(db) => op(db),
            Self::Path { path, options } => {
                let db = LodesDb::open(path, &options)?;
                let result = op(&db);
                let closed = db.close();
                let value = result?;
                closed?;
                Ok(value)
            }
        }
    }
}

impl<'a> From<&'a LodesDb> for DbSource<'a> {
    fn from(db: &'a LodesDb) -> Self {
        Self::Handle(db)
    }
}
