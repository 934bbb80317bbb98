use geomongo::errors::ErrorKind;
use geomongo::source::DataStore;
use geomongo::store::memory::InMemoryDocumentStore;
use geomongo::store::{ConnectionParams, DocumentStoreProvider, PARAM_DATABASE, PARAM_PASSWORD, PARAM_USER};
use geomongo_int_test::test_util::{populate, random_database};
use std::collections::HashMap;

fn secured_store(database: &str) -> InMemoryDocumentStore {
    let store = InMemoryDocumentStore::new();
    populate(&store).unwrap();
    store.create_user(database, "geotools", "geotools").unwrap();
    store
}

#[test]
fn test_authenticated_connection() {
    let database = random_database();
    let store = secured_store(&database);

    let mut params = HashMap::new();
    params.insert(PARAM_DATABASE.to_string(), database.clone());
    params.insert(PARAM_USER.to_string(), "geotools".to_string());
    params.insert(PARAM_PASSWORD.to_string(), "geotools".to_string());

    let datastore = DataStore::builder()
        .connection_params(&params)
        .open(store.clone())
        .unwrap();
    assert!(store.is_connected());
    assert_eq!(datastore.type_names().unwrap().len(), 3);
}

#[test]
fn test_wrong_password() {
    let database = random_database();
    let store = secured_store(&database);

    let err = DataStore::builder()
        .connection(ConnectionParams::new(&database).with_credentials("geotools", "secret"))
        .open(store.clone())
        .err()
        .unwrap();
    assert_eq!(err.kind(), &ErrorKind::AuthenticationFailed);
    assert_eq!(
        err.message(),
        format!("Authentication of user geotools failed against database {}", database)
    );
    assert!(!store.is_connected());
}

#[test]
fn test_user_of_another_database() {
    let database = random_database();
    let store = secured_store(&database);

    let err = DataStore::builder()
        .connection(ConnectionParams::new("other").with_credentials("geotools", "geotools"))
        .open(store)
        .err()
        .unwrap();
    assert_eq!(err.kind(), &ErrorKind::AuthenticationFailed);
}

#[test]
fn test_parameters_info() {
    let info = ConnectionParams::parameters_info();
    let keys: Vec<_> = info.iter().map(|p| p.key).collect();
    assert_eq!(keys, vec!["host", "port", "database", "user", "passwd"]);

    let password = info.iter().find(|p| p.key == PARAM_PASSWORD).unwrap();
    assert!(password.is_password);
    assert!(!password.required);
}

#[test]
fn test_invalid_port() {
    let mut params = HashMap::new();
    params.insert(PARAM_DATABASE.to_string(), random_database());
    params.insert("port".to_string(), "99999".to_string());

    let err = ConnectionParams::from_params(&params).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidDataType);
}
