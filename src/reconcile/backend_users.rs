//! Backend user reconciliation.
//!
//! Upserts reported backend users matched by user name and rebuilds the
//! client↔user association set from scratch. Profile fields of a matched
//! row are overwritten (last writer wins).

use chrono::{DateTime, Utc};

use crate::config::UserMatching;
use crate::error::StoreError;
use crate::logging::structured::LogContext;
use crate::report::BackendUserDetail;
use crate::storage::{BackendUserProfile, BackendUserRow, StoreTransaction};

impl From<&BackendUserDetail> for BackendUserProfile {
    fn from(detail: &BackendUserDetail) -> Self {
        Self {
            user_name: detail.user_name.clone(),
            real_name: detail.real_name.clone(),
            email_address: detail.email_address.clone(),
            description: detail.description.clone(),
            last_login: detail.last_login.clone(),
        }
    }
}

/// Reconcile the reported backend users of `client_id`.
///
/// With `UserMatching::Client` only users already associated with the
/// client are match candidates, so a name known under another client gets
/// a row of its own. `UserMatching::Global` matches by name across all
/// rows. Returns the number of users processed.
pub fn reconcile_backend_users<T: StoreTransaction>(
    tx: &T,
    client_id: i64,
    users: &[BackendUserDetail],
    matching: UserMatching,
    at: DateTime<Utc>,
    ctx: &LogContext,
) -> Result<usize, StoreError> {
    let mut candidates: Vec<BackendUserRow> = match matching {
        UserMatching::Client => tx.client_backend_users(client_id)?,
        UserMatching::Global if users.is_empty() => Vec::new(),
        UserMatching::Global => {
            let names: Vec<String> = users.iter().map(|u| u.user_name.clone()).collect();
            tx.backend_users_named(&names)?
        }
    };

    let mut linked: Vec<i64> = Vec::with_capacity(users.len());
    let mut created = 0;
    let mut updated = 0;

    for user in users {
        let profile = BackendUserProfile::from(user);

        let user_id = match candidates.iter().find(|c| c.user_name == user.user_name) {
            Some(existing) => {
                tx.update_backend_user(existing.id, &profile, at)?;
                updated += 1;
                existing.id
            }
            None => {
                let id = tx.insert_backend_user(&profile, at)?;
                log::debug!(
                    "{} BACKEND_USER_CREATED user_name={} id={}",
                    ctx,
                    profile.user_name,
                    id
                );
                candidates.push(BackendUserRow {
                    id,
                    user_name: profile.user_name,
                    real_name: profile.real_name,
                    email_address: profile.email_address,
                    description: profile.description,
                    last_login: profile.last_login,
                });
                created += 1;
                id
            }
        };

        if !linked.contains(&user_id) {
            linked.push(user_id);
        }
    }

    tx.replace_client_backend_users(client_id, &linked)?;

    log::debug!(
        "{} BACKEND_USERS_RECONCILED reported={} created={} updated={} linked={}",
        ctx,
        users.len(),
        created,
        updated,
        linked.len()
    );

    Ok(users.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{NewClient, SqliteStore, Store, Table};

    fn ctx() -> LogContext {
        LogContext::new("run-test")
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn user(name: &str, email: &str) -> BackendUserDetail {
        BackendUserDetail {
            user_name: name.to_string(),
            real_name: name.to_uppercase(),
            email_address: email.to_string(),
            description: String::new(),
            last_login: "1700000000".to_string(),
        }
    }

    fn register(store: &SqliteStore, title: &str) -> i64 {
        store
            .register_client(&NewClient {
                title: title.to_string(),
                domain: format!("{}.example.com", title),
                secret: "s".to_string(),
                hidden: false,
            })
            .unwrap()
    }

    #[test]
    fn test_overwrite_existing_user_of_same_client() {
        let mut store = SqliteStore::in_memory().unwrap();
        let a = register(&store, "a");

        let tx = store.begin().unwrap();
        reconcile_backend_users(&tx, a, &[user("alice", "old@example.com")], UserMatching::Client, now(), &ctx()).unwrap();
        reconcile_backend_users(&tx, a, &[user("alice", "new@example.com")], UserMatching::Client, now(), &ctx()).unwrap();
        tx.commit().unwrap();

        assert_eq!(store.count(Table::BackendUser).unwrap(), 1);
        let users = store.client_backend_users(a).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email_address, "new@example.com");
    }

    #[test]
    fn test_client_scoped_matching_duplicates_across_clients() {
        let mut store = SqliteStore::in_memory().unwrap();
        let a = register(&store, "a");
        let b = register(&store, "b");

        let tx = store.begin().unwrap();
        reconcile_backend_users(&tx, a, &[user("admin", "a@example.com")], UserMatching::Client, now(), &ctx()).unwrap();
        reconcile_backend_users(&tx, b, &[user("admin", "b@example.com")], UserMatching::Client, now(), &ctx()).unwrap();
        tx.commit().unwrap();

        assert_eq!(store.count(Table::BackendUser).unwrap(), 2);
        assert_eq!(store.client_backend_users(a).unwrap()[0].email_address, "a@example.com");
    }

    #[test]
    fn test_global_matching_shares_row() {
        let mut store = SqliteStore::in_memory().unwrap();
        let a = register(&store, "a");
        let b = register(&store, "b");

        let tx = store.begin().unwrap();
        reconcile_backend_users(&tx, a, &[user("admin", "a@example.com")], UserMatching::Global, now(), &ctx()).unwrap();
        reconcile_backend_users(&tx, b, &[user("admin", "b@example.com")], UserMatching::Global, now(), &ctx()).unwrap();
        tx.commit().unwrap();

        assert_eq!(store.count(Table::BackendUser).unwrap(), 1);
        let on_a = store.client_backend_users(a).unwrap();
        let on_b = store.client_backend_users(b).unwrap();
        assert_eq!(on_a[0].id, on_b[0].id);
        // Last writer wins
        assert_eq!(on_a[0].email_address, "b@example.com");
    }

    #[test]
    fn test_associations_replaced() {
        let mut store = SqliteStore::in_memory().unwrap();
        let a = register(&store, "a");

        let tx = store.begin().unwrap();
        reconcile_backend_users(&tx, a, &[user("alice", "a@x"), user("bob", "b@x")], UserMatching::Client, now(), &ctx()).unwrap();
        let count = reconcile_backend_users(&tx, a, &[user("bob", "b@x"), user("carol", "c@x")], UserMatching::Client, now(), &ctx()).unwrap();
        tx.commit().unwrap();

        assert_eq!(count, 2);
        let names: Vec<String> = store
            .client_backend_users(a)
            .unwrap()
            .into_iter()
            .map(|u| u.user_name)
            .collect();
        assert_eq!(names, vec!["bob", "carol"]);
    }

    #[test]
    fn test_repeated_name_in_one_report() {
        let mut store = SqliteStore::in_memory().unwrap();
        let a = register(&store, "a");

        let tx = store.begin().unwrap();
        let count = reconcile_backend_users(
            &tx,
            a,
            &[user("alice", "first@x"), user("alice", "second@x")],
            UserMatching::Client,
            now(),
            &ctx(),
        )
        .unwrap();
        tx.commit().unwrap();

        assert_eq!(count, 2);
        assert_eq!(store.count(Table::BackendUser).unwrap(), 1);
        let users = store.client_backend_users(a).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email_address, "second@x");
    }
}
