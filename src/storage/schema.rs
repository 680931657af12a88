//! Database schema.
//!
//! Applied idempotently when a store is opened.

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS core_version (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    version         TEXT    NOT NULL UNIQUE,
    version_integer INTEGER NOT NULL DEFAULT 0,
    is_official     INTEGER NOT NULL DEFAULT 0,
    insecure        INTEGER NOT NULL DEFAULT 0,
    tstamp          INTEGER
);

CREATE TABLE IF NOT EXISTS client (
    id                     INTEGER PRIMARY KEY AUTOINCREMENT,
    title                  TEXT    NOT NULL DEFAULT '',
    domain                 TEXT    NOT NULL,
    secret                 TEXT    NOT NULL DEFAULT '',
    deleted                INTEGER NOT NULL DEFAULT 0,
    hidden                 INTEGER NOT NULL DEFAULT 0,
    tstamp                 INTEGER,
    last_successful_import INTEGER,
    error_message          TEXT    NOT NULL DEFAULT '',
    php_version            TEXT    NOT NULL DEFAULT '',
    mysql_version          TEXT    NOT NULL DEFAULT '',
    core                   INTEGER REFERENCES core_version(id),
    extensions             INTEGER NOT NULL DEFAULT 0,
    backend_users          INTEGER NOT NULL DEFAULT 0,
    extra_info             TEXT    NOT NULL DEFAULT '',
    extra_warning          TEXT    NOT NULL DEFAULT '',
    extra_danger           TEXT    NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS extension (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT    NOT NULL,
    version         TEXT    NOT NULL,
    version_integer INTEGER NOT NULL DEFAULT 0,
    title           TEXT    NOT NULL DEFAULT '',
    description     TEXT    NOT NULL DEFAULT '',
    state           INTEGER NOT NULL DEFAULT 7,
    is_official     INTEGER NOT NULL DEFAULT 0,
    tstamp          INTEGER,
    UNIQUE (name, version)
);

CREATE TABLE IF NOT EXISTS backend_user (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_name     TEXT NOT NULL,
    real_name     TEXT NOT NULL DEFAULT '',
    email_address TEXT NOT NULL DEFAULT '',
    description   TEXT NOT NULL DEFAULT '',
    last_login    TEXT NOT NULL DEFAULT '',
    tstamp        INTEGER
);

CREATE INDEX IF NOT EXISTS backend_user_name ON backend_user (user_name);

CREATE TABLE IF NOT EXISTS client_extension (
    client_id    INTEGER NOT NULL REFERENCES client(id),
    extension_id INTEGER NOT NULL REFERENCES extension(id),
    title        TEXT    NOT NULL DEFAULT '',
    state        INTEGER NOT NULL DEFAULT 7,
    is_loaded    INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (client_id, extension_id)
);

CREATE TABLE IF NOT EXISTS client_backend_user (
    client_id       INTEGER NOT NULL REFERENCES client(id),
    backend_user_id INTEGER NOT NULL REFERENCES backend_user(id),
    PRIMARY KEY (client_id, backend_user_id)
);

CREATE TABLE IF NOT EXISTS import_registry (
    name     TEXT PRIMARY KEY,
    last_run INTEGER NOT NULL
);
"#;
