use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use dashmap::DashMap;
use rand::rngs::OsRng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::common::{atomic, Atomic, ReadExecutor, WriteExecutor};
use crate::errors::{ErrorKind, GeoMongoError, GeoMongoResult};
use crate::store::memory::InMemoryCollection;
use crate::store::{ConnectionParams, DocumentCollection, DocumentStoreProvider};

/// A document store living in process memory.
///
/// Collections are created on first access. Users registered with
/// [InMemoryDocumentStore::create_user] are stored as argon2 hashes and
/// checked when a connection names a user.
///
/// ```rust
/// use geomongo::doc;
/// use geomongo::store::{ConnectionParams, DocumentStoreProvider};
/// use geomongo::store::memory::InMemoryDocumentStore;
///
/// let store = InMemoryDocumentStore::new();
/// store.connect(&ConnectionParams::new("test")).unwrap();
/// let collection = store.collection("places").unwrap();
/// collection.save(&mut doc! { loc: [1, 2] }).unwrap();
/// assert_eq!(store.collection_names().unwrap(), vec!["places"]);
/// ```
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        InMemoryDocumentStore {
            inner: Arc::new(InMemoryStoreInner::new()),
        }
    }

    /// Registers a user of a database.
    pub fn create_user(&self, database: &str, user: &str, password: &str) -> GeoMongoResult<()> {
        self.inner.create_user(database, user, password)
    }

    /// Number of cursors opened and not yet closed.
    pub fn open_cursors(&self) -> usize {
        self.inner.open_cursors.load(Ordering::SeqCst)
    }

    /// Creates an empty collection unless it exists.
    pub fn create_collection(&self, name: &str) -> InMemoryCollection {
        self.inner.collection(name)
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        InMemoryDocumentStore::new()
    }
}

impl DocumentStoreProvider for InMemoryDocumentStore {
    fn connect(&self, params: &ConnectionParams) -> GeoMongoResult<()> {
        self.inner.connect(params)
    }

    fn is_connected(&self) -> bool {
        self.inner.connection.read_with(|c| c.is_some())
    }

    fn collection_names(&self) -> GeoMongoResult<Vec<String>> {
        self.inner.ensure_connected()?;
        let mut names: Vec<String> = self
            .inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }

    fn collection(&self, name: &str) -> GeoMongoResult<DocumentCollection> {
        self.inner.ensure_connected()?;
        Ok(DocumentCollection::new(self.inner.collection(name)))
    }

    fn close(&self) -> GeoMongoResult<()> {
        self.inner.connection.write_with(|c| *c = None);
        log::debug!("In-memory store disconnected");
        Ok(())
    }
}

struct InMemoryStoreInner {
    collections: DashMap<String, InMemoryCollection>,
    users: DashMap<(String, String), String>,
    connection: Atomic<Option<ConnectionParams>>,
    open_cursors: Arc<AtomicUsize>,
}

impl InMemoryStoreInner {
    fn new() -> Self {
        InMemoryStoreInner {
            collections: DashMap::new(),
            users: DashMap::new(),
            connection: atomic(None),
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn collection(&self, name: &str) -> InMemoryCollection {
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| InMemoryCollection::new(name, self.open_cursors.clone()))
            .clone()
    }

    fn ensure_connected(&self) -> GeoMongoResult<()> {
        if self.connection.read_with(|c| c.is_none()) {
            log::error!("Document store is not connected");
            return Err(GeoMongoError::new(
                "Document store is not connected",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    fn create_user(&self, database: &str, user: &str, password: &str) -> GeoMongoResult<()> {
        if user.is_empty() || password.is_empty() {
            log::error!("User name and password are required");
            return Err(GeoMongoError::new(
                "User name and password are required",
                ErrorKind::ValidationError,
            ));
        }

        let salt = SaltString::generate(&mut OsRng);
        match Argon2::default().hash_password(password.as_bytes(), &salt) {
            Ok(hash) => {
                self.users
                    .insert((database.to_string(), user.to_string()), hash.to_string());
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to create user {}: {:?}", user, e);
                Err(GeoMongoError::new(
                    &format!("Failed to create user {}", user),
                    ErrorKind::InternalError,
                ))
            }
        }
    }

    fn connect(&self, params: &ConnectionParams) -> GeoMongoResult<()> {
        if params.database().is_empty() {
            log::error!("No database given for {}", params.uri());
            return Err(GeoMongoError::new(
                "No database given",
                ErrorKind::ValidationError,
            ));
        }

        if let Some(user) = params.user() {
            self.authenticate(params.database(), user, params.password().unwrap_or(""))?;
        }

        self.connection.write_with(|c| *c = Some(params.clone()));
        log::debug!("Connected to {}", params);
        Ok(())
    }

    fn authenticate(&self, database: &str, user: &str, password: &str) -> GeoMongoResult<()> {
        let failed = |cause: Option<GeoMongoError>| {
            let message = format!(
                "Authentication of user {} failed against database {}",
                user, database
            );
            log::error!("{}", message);
            match cause {
                Some(cause) => {
                    GeoMongoError::new_with_cause(&message, ErrorKind::AuthenticationFailed, cause)
                }
                None => GeoMongoError::new(&message, ErrorKind::AuthenticationFailed),
            }
        };

        let expected_hash = self
            .users
            .get(&(database.to_string(), user.to_string()))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| failed(None))?;

        let parsed_hash = PasswordHash::new(&expected_hash).map_err(|e| {
            log::error!("Stored hash of user {} is invalid: {:?}", user, e);
            failed(Some(e.into()))
        })?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|e| failed(Some(e.into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::store::DocumentCollectionProvider;

    #[test]
    fn requires_connection() {
        let store = InMemoryDocumentStore::new();
        assert!(!store.is_connected());
        let err = store.collection_names().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        assert!(store.collection("x").is_err());
    }

    #[test]
    fn anonymous_connection() {
        let store = InMemoryDocumentStore::new();
        store.connect(&ConnectionParams::new("test")).unwrap();
        assert!(store.is_connected());
        store.close().unwrap();
        assert!(!store.is_connected());
    }

    #[test]
    fn collections_are_listed_sorted() {
        let store = InMemoryDocumentStore::new();
        store.create_collection("b");
        store.connect(&ConnectionParams::new("test")).unwrap();
        store.collection("a").unwrap().save(&mut doc! { x: 1 }).unwrap();
        assert_eq!(store.collection_names().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn collections_share_state() {
        let store = InMemoryDocumentStore::new();
        let seeded = store.create_collection("ft1");
        let mut document = doc! { "_id": "ft1.0" };
        seeded.save(&mut document).unwrap();

        store.connect(&ConnectionParams::new("test")).unwrap();
        let collection = store.collection("ft1").unwrap();
        assert_eq!(collection.count(&doc! {}).unwrap(), 1);
    }

    #[test]
    fn authentication() {
        let store = InMemoryDocumentStore::new();
        store.create_user("geotools", "geotools", "geotools").unwrap();

        let params = ConnectionParams::new("geotools").with_credentials("geotools", "geotools");
        store.connect(&params).unwrap();

        let params = ConnectionParams::new("geotools").with_credentials("geotools", "wrong");
        let err = store.connect(&params).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::AuthenticationFailed);
        assert_eq!(
            err.message(),
            "Authentication of user geotools failed against database geotools"
        );
        let cause = err.cause().unwrap();
        assert_eq!(cause.kind(), &ErrorKind::AuthenticationFailed);
        assert!(cause.message().starts_with("Password hash error"));

        let params = ConnectionParams::new("other").with_credentials("geotools", "geotools");
        let err = store.connect(&params).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::AuthenticationFailed);
        assert!(err.cause().is_none());
    }

    #[test]
    fn create_user_validation() {
        let store = InMemoryDocumentStore::new();
        let err = store.create_user("db", "", "x").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn open_cursor_count() {
        let store = InMemoryDocumentStore::new();
        store.connect(&ConnectionParams::new("test")).unwrap();
        let collection = store.collection("ft1").unwrap();
        collection.save(&mut doc! { a: 1 }).unwrap();

        let cursor = collection.find(&doc! {}, &Default::default()).unwrap();
        assert_eq!(store.open_cursors(), 1);
        drop(cursor);
        assert_eq!(store.open_cursors(), 0);
    }
}
