//! Abstract relational store.
//!
//! The import pipeline only talks to these traits. `Store` covers the
//! run-level reads and writes; `StoreTransaction` is one client's unit of
//! work and is rolled back if dropped without `commit`.

use chrono::{DateTime, Utc};

use crate::error::StoreError;

use super::models::{
    BackendUserProfile, BackendUserRow, ClientExtensionLink, ClientRow, ClientUpdate,
    CoreVersionRow, ExtensionKey, ExtensionRow, NewCoreVersion, NewExtension,
};

pub trait Store {
    type Transaction<'a>: StoreTransaction
    where
        Self: 'a;

    /// Clients that are neither deleted nor hidden, optionally restricted
    /// to one id.
    fn eligible_clients(&self, target: Option<i64>) -> Result<Vec<ClientRow>, StoreError>;

    /// All core versions, ordered by version string.
    fn core_versions(&self) -> Result<Vec<CoreVersionRow>, StoreError>;

    fn begin(&mut self) -> Result<Self::Transaction<'_>, StoreError>;

    /// Overwrite only the client's error message.
    fn record_client_error(&mut self, client_id: i64, message: &str) -> Result<(), StoreError>;

    /// Record when an import class last completed.
    fn set_import_time(&mut self, name: &str, at: DateTime<Utc>) -> Result<(), StoreError>;
}

pub trait StoreTransaction {
    /// Insert a core version unless one with the same string exists.
    /// Returns the id of the row holding `new.version` and whether this
    /// call inserted it.
    fn insert_core_version(
        &self,
        new: &NewCoreVersion,
        at: DateTime<Utc>,
    ) -> Result<(i64, bool), StoreError>;

    /// Extensions matching any of `keys`, ordered by id.
    fn find_extensions(&self, keys: &[ExtensionKey]) -> Result<Vec<ExtensionRow>, StoreError>;

    /// Insert an extension unless the (name, version) pair exists; returns
    /// the id of the row holding the pair either way.
    fn insert_extension(&self, new: &NewExtension, at: DateTime<Utc>) -> Result<i64, StoreError>;

    /// Replace every client↔extension association of `client_id`.
    fn replace_client_extensions(
        &self,
        client_id: i64,
        links: &[ClientExtensionLink],
    ) -> Result<(), StoreError>;

    /// Backend users currently associated with `client_id`.
    fn client_backend_users(&self, client_id: i64) -> Result<Vec<BackendUserRow>, StoreError>;

    /// Backend users with any of the given user names, ordered by id.
    fn backend_users_named(&self, names: &[String]) -> Result<Vec<BackendUserRow>, StoreError>;

    fn insert_backend_user(
        &self,
        profile: &BackendUserProfile,
        at: DateTime<Utc>,
    ) -> Result<i64, StoreError>;

    fn update_backend_user(
        &self,
        id: i64,
        profile: &BackendUserProfile,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Replace every client↔backend-user association of `client_id`.
    fn replace_client_backend_users(
        &self,
        client_id: i64,
        user_ids: &[i64],
    ) -> Result<(), StoreError>;

    /// Mark the client as successfully imported with the given values.
    fn update_client(
        &self,
        client_id: i64,
        update: &ClientUpdate,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;
}
