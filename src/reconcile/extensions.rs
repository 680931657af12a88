//! Extension reconciliation.
//!
//! Upserts the (name, version) pairs a report references and rebuilds the
//! client↔extension association set from scratch.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::logging::structured::LogContext;
use crate::report::ExtensionDetail;
use crate::storage::{ClientExtensionLink, ExtensionKey, ExtensionState, NewExtension, StoreTransaction};

use super::version_number::version_to_integer;

/// Reconcile the reported extensions of `client_id`.
///
/// Existing rows are looked up in one batched query; missing pairs are
/// inserted. All prior associations of the client are then replaced by
/// the reported set. Returns the number of extensions processed.
pub fn reconcile_extensions<T: StoreTransaction>(
    tx: &T,
    client_id: i64,
    extensions: &BTreeMap<String, ExtensionDetail>,
    at: DateTime<Utc>,
    ctx: &LogContext,
) -> Result<usize, StoreError> {
    let keys: Vec<ExtensionKey> = extensions
        .iter()
        .map(|(name, detail)| ExtensionKey {
            name: name.clone(),
            version: detail.version.clone(),
        })
        .collect();

    let existing = if keys.is_empty() {
        Vec::new()
    } else {
        tx.find_extensions(&keys)?
    };

    // Rows arrive ordered by id; the first row of a pair wins.
    let mut ids: HashMap<ExtensionKey, i64> = HashMap::with_capacity(existing.len());
    for row in existing {
        ids.entry(ExtensionKey {
            name: row.name,
            version: row.version,
        })
        .or_insert(row.id);
    }

    let mut links: Vec<ClientExtensionLink> = Vec::with_capacity(keys.len());
    let mut created = 0;

    for (key, detail) in keys.into_iter().zip(extensions.values()) {
        let state = ExtensionState::from_label(&detail.state);

        let extension_id = match ids.get(&key) {
            Some(id) => *id,
            None => {
                let id = tx.insert_extension(
                    &NewExtension {
                        name: key.name.clone(),
                        version: key.version.clone(),
                        version_integer: version_to_integer(&key.version),
                        title: detail.title.clone(),
                        description: detail.description.clone(),
                        state,
                        is_official: false,
                    },
                    at,
                )?;
                log::debug!(
                    "{} EXTENSION_CREATED name={} version={} id={}",
                    ctx,
                    key.name,
                    key.version,
                    id
                );
                created += 1;
                ids.insert(key, id);
                id
            }
        };

        links.retain(|link| link.extension_id != extension_id);
        links.push(ClientExtensionLink {
            extension_id,
            title: detail.title.clone(),
            state,
            is_loaded: detail.is_loaded,
        });
    }

    tx.replace_client_extensions(client_id, &links)?;

    log::debug!(
        "{} EXTENSIONS_RECONCILED reported={} created={} linked={}",
        ctx,
        extensions.len(),
        created,
        links.len()
    );

    Ok(extensions.len())
}
