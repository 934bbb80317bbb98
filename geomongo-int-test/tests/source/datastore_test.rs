use geomongo::errors::ErrorKind;
use geomongo::feature::AttributeType;
use geomongo::filter::FilterCapabilities;
use geomongo::mapper::{AdHocMapper, Mapper, MapperSelection};
use geomongo::source::{DataStore, Query};
use geomongo::store::memory::InMemoryDocumentStore;
use geomongo::store::{ConnectionParams, DocumentStoreProvider};
use geomongo_int_test::test_util::{
    cleanup, create_test_context, create_test_context_with, populate, random_database, run_test,
    ADHOC, FT1, GRID,
};
use std::collections::HashMap;
use std::sync::Arc;

#[test]
fn test_type_names() {
    run_test(
        create_test_context,
        |ctx| {
            let names = ctx.datastore().type_names()?;
            assert_eq!(names, vec![ADHOC, FT1, GRID]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_geojson_schema() {
    run_test(
        create_test_context,
        |ctx| {
            let schema = ctx.datastore().schema(FT1)?;
            assert_eq!(schema.type_name(), FT1);
            assert_eq!(
                schema.attribute_names().collect::<Vec<_>>(),
                vec!["geometry", "intProperty", "doubleProperty", "stringProperty"]
            );
            assert_eq!(schema.default_geometry(), Some("geometry"));
            assert!(schema.attribute("geometry").unwrap().attribute_type().is_geometry());
            assert_eq!(
                schema.attribute("intProperty").unwrap().attribute_type(),
                AttributeType::Scalar
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_adhoc_schema() {
    run_test(
        create_test_context,
        |ctx| {
            let source = ctx.datastore().feature_source(ADHOC)?;
            assert!(!source.mapper().is_geojson());
            assert_eq!(source.mapper().geometry_path(), "loc");
            assert_eq!(source.filter_capabilities(), &FilterCapabilities::document_store());
            assert!(source.capabilities().can_sort);

            let schema = source.schema()?;
            assert_eq!(
                schema.attribute_names().collect::<Vec<_>>(),
                vec!["loc", "name", "visitors"]
            );
            assert_eq!(schema.default_geometry(), Some("loc"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_feature_source_is_cached() {
    run_test(
        create_test_context,
        |ctx| {
            let datastore = ctx.datastore();
            let first = datastore.feature_source(FT1)?;
            let second = datastore.feature_source(FT1)?;
            assert!(Arc::ptr_eq(&first, &second));
            assert!(Arc::ptr_eq(&first.schema()?, &second.schema()?));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unknown_type() {
    run_test(
        create_test_context,
        |ctx| {
            let datastore = ctx.datastore();
            let err = datastore.feature_source("missing").err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::CollectionNotFound);

            let err = datastore.feature_reader(&Query::new("system.indexes")).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::CollectionNotFound);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_explicit_geojson_mapper_on_adhoc_rows() {
    run_test(
        || create_test_context_with(MapperSelection::GeoJson),
        |ctx| {
            let datastore = ctx.datastore();
            let reader = datastore.feature_reader(&Query::new(ADHOC))?;
            let kinds: Vec<ErrorKind> = reader
                .map(|feature| feature.err().map(|e| e.kind().clone()))
                .collect::<Option<Vec<_>>>()
                .unwrap();
            assert_eq!(kinds, vec![ErrorKind::MalformedDocument; 3]);

            let err = datastore
                .feature_source(ADHOC)?
                .bounds(&Query::new(ADHOC))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::MalformedDocument);
            assert_eq!(ctx.store().open_cursors(), 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_per_type_mapper() {
    let store = InMemoryDocumentStore::new();
    populate(&store).unwrap();

    let datastore = DataStore::builder()
        .mapper(MapperSelection::GeoJson)
        .mapper_for(ADHOC, MapperSelection::AdHoc(AdHocMapper::new("loc")))
        .connection(ConnectionParams::new(&random_database()))
        .open(store)
        .unwrap();

    assert!(datastore.feature_source(FT1).unwrap().mapper().is_geojson());
    let adhoc = datastore.feature_source(ADHOC).unwrap();
    assert_eq!(adhoc.mapper().geometry_path(), "loc");
    assert_eq!(adhoc.count(&Query::new(ADHOC)).unwrap(), Some(3));
}

#[test]
fn test_open_from_parameters() {
    let store = InMemoryDocumentStore::new();
    populate(&store).unwrap();

    let mut params = HashMap::new();
    params.insert("host".to_string(), "localhost".to_string());
    params.insert("port".to_string(), "27017".to_string());
    params.insert("database".to_string(), random_database());

    let datastore = DataStore::builder()
        .connection_params(&params)
        .open(store.clone())
        .unwrap();
    assert_eq!(datastore.type_names().unwrap().len(), 3);

    datastore.dispose().unwrap();
    assert!(!store.is_connected());
}

#[test]
fn test_open_without_database() {
    let mut params = HashMap::new();
    params.insert("host".to_string(), "localhost".to_string());

    let err = DataStore::builder()
        .connection_params(&params)
        .open(InMemoryDocumentStore::new())
        .err()
        .unwrap();
    assert_eq!(err.kind(), &ErrorKind::ValidationError);
}
