//! SQLite-backed store.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::StoreError;

use super::models::{
    BackendUserProfile, BackendUserRow, ClientExtensionLink, ClientExtensionRecord, ClientRow,
    ClientUpdate, CoreVersionRow, ExtensionKey, ExtensionRow, ExtensionState, NewClient,
    NewCoreVersion, NewExtension,
};
use super::queries::*;
use super::schema::SCHEMA;
use super::store::{Store, StoreTransaction};

/// Tables whose size can be queried with `SqliteStore::count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Client,
    CoreVersion,
    Extension,
    BackendUser,
    ClientExtension,
    ClientBackendUser,
}

impl Table {
    fn name(&self) -> &'static str {
        match self {
            Table::Client => "client",
            Table::CoreVersion => "core_version",
            Table::Extension => "extension",
            Table::BackendUser => "backend_user",
            Table::ClientExtension => "client_extension",
            Table::ClientBackendUser => "client_backend_user",
        }
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.bootstrap()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.bootstrap()?;
        Ok(store)
    }

    fn bootstrap(&self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn register_client(&self, new: &NewClient) -> Result<i64, StoreError> {
        self.conn.execute(
            CLIENT_INSERT,
            params![new.title, new.domain, new.secret, new.hidden],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Soft-delete a client; it is skipped by later runs.
    pub fn delete_client(&self, client_id: i64) -> Result<(), StoreError> {
        let changed = self.conn.execute(CLIENT_SOFT_DELETE, params![client_id])?;
        if changed == 0 {
            return Err(StoreError::MissingRow {
                table: "client",
                id: client_id,
            });
        }
        Ok(())
    }

    pub fn client(&self, client_id: i64) -> Result<Option<ClientRow>, StoreError> {
        let row = self
            .conn
            .query_row(&build_client_select(), params![client_id], map_client)
            .optional()?;
        Ok(row)
    }

    pub fn client_extensions(
        &self,
        client_id: i64,
    ) -> Result<Vec<ClientExtensionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(CLIENT_EXTENSIONS_SELECT)?;
        let rows = stmt.query_map(params![client_id], |row| {
            Ok(ClientExtensionRecord {
                extension_id: row.get(0)?,
                name: row.get(1)?,
                version: row.get(2)?,
                title: row.get(3)?,
                state: ExtensionState::from_i64(row.get(4)?),
                is_loaded: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn client_backend_users(&self, client_id: i64) -> Result<Vec<BackendUserRow>, StoreError> {
        select_client_backend_users(&self.conn, client_id)
    }

    pub fn count(&self, table: Table) -> Result<i64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn import_time(&self, name: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        let secs: Option<i64> = self
            .conn
            .query_row(IMPORT_TIME_SELECT, params![name], |row| row.get(0))
            .optional()?;
        Ok(to_datetime(secs))
    }
}

impl Store for SqliteStore {
    type Transaction<'a> = SqliteTransaction<'a>;

    fn eligible_clients(&self, target: Option<i64>) -> Result<Vec<ClientRow>, StoreError> {
        let mut stmt = self.conn.prepare(&build_eligible_clients_select())?;
        let rows = stmt.query_map(params![target], map_client)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn core_versions(&self) -> Result<Vec<CoreVersionRow>, StoreError> {
        let mut stmt = self.conn.prepare(CORE_VERSIONS_SELECT)?;
        let rows = stmt.query_map([], |row| {
            Ok(CoreVersionRow {
                id: row.get(0)?,
                version: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn begin(&mut self) -> Result<SqliteTransaction<'_>, StoreError> {
        Ok(SqliteTransaction {
            tx: self.conn.transaction()?,
        })
    }

    fn record_client_error(&mut self, client_id: i64, message: &str) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute(CLIENT_ERROR_UPDATE, params![client_id, message])?;
        if changed == 0 {
            return Err(StoreError::MissingRow {
                table: "client",
                id: client_id,
            });
        }
        Ok(())
    }

    fn set_import_time(&mut self, name: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn
            .execute(IMPORT_TIME_UPSERT, params![name, at.timestamp()])?;
        Ok(())
    }
}

/// One client's unit of work. Rolls back on drop unless committed.
pub struct SqliteTransaction<'a> {
    tx: rusqlite::Transaction<'a>,
}

impl StoreTransaction for SqliteTransaction<'_> {
    fn insert_core_version(
        &self,
        new: &NewCoreVersion,
        at: DateTime<Utc>,
    ) -> Result<(i64, bool), StoreError> {
        let inserted = self.tx.execute(
            CORE_VERSION_INSERT,
            params![
                new.version,
                new.version_integer,
                new.is_official,
                new.insecure,
                at.timestamp()
            ],
        )? > 0;
        let id = self
            .tx
            .query_row(CORE_VERSION_ID_SELECT, params![new.version], |row| row.get(0))?;
        Ok((id, inserted))
    }

    fn find_extensions(&self, keys: &[ExtensionKey]) -> Result<Vec<ExtensionRow>, StoreError> {
        let mut found = Vec::new();
        for chunk in keys.chunks(EXTENSION_LOOKUP_CHUNK) {
            let mut stmt = self.tx.prepare(&build_extension_lookup(chunk.len()))?;
            let values = chunk
                .iter()
                .flat_map(|key| [key.name.as_str(), key.version.as_str()]);
            let rows = stmt.query_map(params_from_iter(values), |row| {
                Ok(ExtensionRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    version: row.get(2)?,
                })
            })?;
            for row in rows {
                found.push(row?);
            }
        }
        found.sort_by_key(|row| row.id);
        Ok(found)
    }

    fn insert_extension(&self, new: &NewExtension, at: DateTime<Utc>) -> Result<i64, StoreError> {
        self.tx.execute(
            EXTENSION_INSERT,
            params![
                new.name,
                new.version,
                new.version_integer,
                new.title,
                new.description,
                new.state.as_i64(),
                new.is_official,
                at.timestamp()
            ],
        )?;
        Ok(self.tx.query_row(
            EXTENSION_ID_SELECT,
            params![new.name, new.version],
            |row| row.get(0),
        )?)
    }

    fn replace_client_extensions(
        &self,
        client_id: i64,
        links: &[ClientExtensionLink],
    ) -> Result<(), StoreError> {
        self.tx
            .execute(CLIENT_EXTENSIONS_DELETE, params![client_id])?;
        let mut stmt = self.tx.prepare_cached(CLIENT_EXTENSION_INSERT)?;
        for link in links {
            stmt.execute(params![
                client_id,
                link.extension_id,
                link.title,
                link.state.as_i64(),
                link.is_loaded
            ])?;
        }
        Ok(())
    }

    fn client_backend_users(&self, client_id: i64) -> Result<Vec<BackendUserRow>, StoreError> {
        select_client_backend_users(&self.tx, client_id)
    }

    fn backend_users_named(&self, names: &[String]) -> Result<Vec<BackendUserRow>, StoreError> {
        let mut found = Vec::new();
        for chunk in names.chunks(EXTENSION_LOOKUP_CHUNK) {
            let mut stmt = self
                .tx
                .prepare(&build_backend_users_by_name_select(chunk.len()))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), map_backend_user)?;
            for row in rows {
                found.push(row?);
            }
        }
        found.sort_by_key(|row| row.id);
        Ok(found)
    }

    fn insert_backend_user(
        &self,
        profile: &BackendUserProfile,
        at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        self.tx.execute(
            BACKEND_USER_INSERT,
            params![
                profile.user_name,
                profile.real_name,
                profile.email_address,
                profile.description,
                profile.last_login,
                at.timestamp()
            ],
        )?;
        Ok(self.tx.last_insert_rowid())
    }

    fn update_backend_user(
        &self,
        id: i64,
        profile: &BackendUserProfile,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let changed = self.tx.execute(
            BACKEND_USER_UPDATE,
            params![
                id,
                profile.real_name,
                profile.email_address,
                profile.description,
                profile.last_login,
                at.timestamp()
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::MissingRow {
                table: "backend_user",
                id,
            });
        }
        Ok(())
    }

    fn replace_client_backend_users(
        &self,
        client_id: i64,
        user_ids: &[i64],
    ) -> Result<(), StoreError> {
        self.tx
            .execute(CLIENT_BACKEND_USERS_DELETE, params![client_id])?;
        let mut stmt = self.tx.prepare_cached(CLIENT_BACKEND_USER_INSERT)?;
        for user_id in user_ids {
            stmt.execute(params![client_id, user_id])?;
        }
        Ok(())
    }

    fn update_client(
        &self,
        client_id: i64,
        update: &ClientUpdate,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let changed = self.tx.execute(
            CLIENT_SUCCESS_UPDATE,
            params![
                client_id,
                at.timestamp(),
                update.php_version,
                update.mysql_version,
                update.core,
                update.extensions,
                update.backend_users,
                update.extra_info,
                update.extra_warning,
                update.extra_danger
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::MissingRow {
                table: "client",
                id: client_id,
            });
        }
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        self.tx.commit()?;
        Ok(())
    }
}

fn select_client_backend_users(
    conn: &Connection,
    client_id: i64,
) -> Result<Vec<BackendUserRow>, StoreError> {
    let mut stmt = conn.prepare(&build_client_backend_users_select())?;
    let rows = stmt.query_map(params![client_id], map_backend_user)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn map_backend_user(row: &Row<'_>) -> rusqlite::Result<BackendUserRow> {
    Ok(BackendUserRow {
        id: row.get(0)?,
        user_name: row.get(1)?,
        real_name: row.get(2)?,
        email_address: row.get(3)?,
        description: row.get(4)?,
        last_login: row.get(5)?,
    })
}

fn map_client(row: &Row<'_>) -> rusqlite::Result<ClientRow> {
    Ok(ClientRow {
        id: row.get(0)?,
        title: row.get(1)?,
        domain: row.get(2)?,
        secret: row.get(3)?,
        tstamp: to_datetime(row.get(4)?),
        last_successful_import: to_datetime(row.get(5)?),
        error_message: row.get(6)?,
        php_version: row.get(7)?,
        mysql_version: row.get(8)?,
        core: row.get(9)?,
        extensions: row.get(10)?,
        backend_users: row.get(11)?,
        extra_info: row.get(12)?,
        extra_warning: row.get(13)?,
        extra_danger: row.get(14)?,
    })
}

fn to_datetime(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|secs| DateTime::from_timestamp(secs, 0))
}
