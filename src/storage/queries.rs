//! SQL query builders.
//!
//! Statement text for the import pipeline. Execution lives in `sqlite`.

/// Columns of the `client` table, in the order `map_client` reads them.
pub const CLIENT_COLUMNS: &str = "id, title, domain, secret, tstamp, last_successful_import, \
     error_message, php_version, mysql_version, core, extensions, backend_users, \
     extra_info, extra_warning, extra_danger";

/// Largest number of (name, version) pairs bound into one lookup.
/// Two parameters per pair keeps this under SQLite's 999 default.
pub const EXTENSION_LOOKUP_CHUNK: usize = 400;

/// Build SELECT for eligible (not deleted, not hidden) clients.
///
/// `?1` is an optional client id; NULL selects all eligible clients.
pub fn build_eligible_clients_select() -> String {
    format!(
        "SELECT {} FROM client WHERE deleted = 0 AND hidden = 0 AND (?1 IS NULL OR id = ?1) ORDER BY id",
        CLIENT_COLUMNS
    )
}

pub fn build_client_select() -> String {
    format!("SELECT {} FROM client WHERE id = ?1", CLIENT_COLUMNS)
}

/// Build the batched extension lookup for `pairs` (name, version) pairs.
///
/// Parameters are bound as name, version, name, version, ...
pub fn build_extension_lookup(pairs: usize) -> String {
    let conditions: Vec<String> = (0..pairs)
        .map(|i| format!("(name = ?{} AND version = ?{})", 2 * i + 1, 2 * i + 2))
        .collect();

    format!(
        "SELECT id, name, version FROM extension WHERE {} ORDER BY id",
        conditions.join(" OR ")
    )
}

pub const CLIENT_INSERT: &str =
    "INSERT INTO client (title, domain, secret, hidden) VALUES (?1, ?2, ?3, ?4)";

pub const CLIENT_SOFT_DELETE: &str = "UPDATE client SET deleted = 1 WHERE id = ?1";

pub const CLIENT_SUCCESS_UPDATE: &str = r#"
    UPDATE client SET
        tstamp = ?2, last_successful_import = ?2, error_message = '',
        php_version = ?3, mysql_version = ?4, core = ?5,
        extensions = ?6, backend_users = ?7,
        extra_info = ?8, extra_warning = ?9, extra_danger = ?10
    WHERE id = ?1
    "#;

pub const CLIENT_ERROR_UPDATE: &str = "UPDATE client SET error_message = ?2 WHERE id = ?1";

pub const CORE_VERSIONS_SELECT: &str = "SELECT id, version FROM core_version ORDER BY version";

pub const CORE_VERSION_INSERT: &str = r#"
    INSERT INTO core_version (version, version_integer, is_official, insecure, tstamp)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT (version) DO NOTHING
    "#;

pub const CORE_VERSION_ID_SELECT: &str = "SELECT id FROM core_version WHERE version = ?1";

pub const EXTENSION_INSERT: &str = r#"
    INSERT INTO extension
        (name, version, version_integer, title, description, state, is_official, tstamp)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT (name, version) DO NOTHING
    "#;

pub const EXTENSION_ID_SELECT: &str =
    "SELECT id FROM extension WHERE name = ?1 AND version = ?2 ORDER BY id LIMIT 1";

pub const CLIENT_EXTENSIONS_DELETE: &str = "DELETE FROM client_extension WHERE client_id = ?1";

pub const CLIENT_EXTENSION_INSERT: &str = r#"
    INSERT INTO client_extension (client_id, extension_id, title, state, is_loaded)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#;

pub const CLIENT_EXTENSIONS_SELECT: &str = r#"
    SELECT e.id, e.name, e.version, ce.title, ce.state, ce.is_loaded
    FROM client_extension ce
    JOIN extension e ON e.id = ce.extension_id
    WHERE ce.client_id = ?1
    ORDER BY e.name, e.version
    "#;

pub const BACKEND_USER_COLUMNS: &str =
    "u.id, u.user_name, u.real_name, u.email_address, u.description, u.last_login";

pub fn build_client_backend_users_select() -> String {
    format!(
        "SELECT {} FROM backend_user u \
         JOIN client_backend_user cb ON cb.backend_user_id = u.id \
         WHERE cb.client_id = ?1 ORDER BY u.id",
        BACKEND_USER_COLUMNS
    )
}

/// Build SELECT for backend users by name across all clients.
pub fn build_backend_users_by_name_select(names: usize) -> String {
    let placeholders: Vec<String> = (1..=names).map(|i| format!("?{}", i)).collect();
    format!(
        "SELECT {} FROM backend_user u WHERE u.user_name IN ({}) ORDER BY u.id",
        BACKEND_USER_COLUMNS,
        placeholders.join(", ")
    )
}

pub const BACKEND_USER_INSERT: &str = r#"
    INSERT INTO backend_user (user_name, real_name, email_address, description, last_login, tstamp)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#;

pub const BACKEND_USER_UPDATE: &str = r#"
    UPDATE backend_user SET
        real_name = ?2, email_address = ?3, description = ?4, last_login = ?5, tstamp = ?6
    WHERE id = ?1
    "#;

pub const CLIENT_BACKEND_USERS_DELETE: &str =
    "DELETE FROM client_backend_user WHERE client_id = ?1";

pub const CLIENT_BACKEND_USER_INSERT: &str =
    "INSERT INTO client_backend_user (client_id, backend_user_id) VALUES (?1, ?2)";

pub const IMPORT_TIME_UPSERT: &str = r#"
    INSERT INTO import_registry (name, last_run) VALUES (?1, ?2)
    ON CONFLICT (name) DO UPDATE SET last_run = excluded.last_run
    "#;

pub const IMPORT_TIME_SELECT: &str = "SELECT last_run FROM import_registry WHERE name = ?1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_lookup_query() {
        let query = build_extension_lookup(2);
        assert!(query.starts_with("SELECT id, name, version FROM extension WHERE"));
        assert!(query.contains("(name = ?1 AND version = ?2) OR (name = ?3 AND version = ?4)"));
        assert!(query.ends_with("ORDER BY id"));
    }

    #[test]
    fn test_eligible_clients_query() {
        let query = build_eligible_clients_select();
        assert!(query.contains("deleted = 0 AND hidden = 0"));
        assert!(query.contains("?1 IS NULL OR id = ?1"));
    }

    #[test]
    fn test_backend_users_by_name_query() {
        let query = build_backend_users_by_name_select(3);
        assert!(query.contains("IN (?1, ?2, ?3)"));
    }
}
