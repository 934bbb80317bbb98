use geomongo::common::{SortOrder, Value};
use geomongo::doc;
use geomongo::errors::ErrorKind;
use geomongo::feature::Feature;
use geomongo::filter::{id, none, property};
use geomongo::geometry::{BoundingBox, Geometry};
use geomongo::mapper::{AdHocMapper, MapperSelection};
use geomongo::source::{DataStore, Query};
use geomongo::store::memory::InMemoryDocumentStore;
use geomongo::store::{ConnectionParams, DocumentCollectionProvider};
use geomongo_int_test::test_util::{
    cleanup, create_test_context, random_database, run_test, ADHOC, FT1, GRID,
};

fn ids(features: &[Feature]) -> Vec<&str> {
    features.iter().map(|f| f.id()).collect()
}

#[test]
fn test_count_and_bounds() {
    run_test(
        create_test_context,
        |ctx| {
            let source = ctx.datastore().feature_source(FT1)?;
            assert_eq!(source.count(&Query::new(FT1))?, Some(3));

            let bounds = source.bounds(&Query::new(FT1))?;
            assert_eq!(bounds, BoundingBox::new(0.0, 0.0, 2.0, 2.0));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_read_all_features() {
    run_test(
        create_test_context,
        |ctx| {
            let reader = ctx.datastore().feature_reader(&Query::new(FT1))?;
            let features = reader.collect::<Result<Vec<_>, _>>()?;
            assert_eq!(ids(&features), vec!["ft1.0", "ft1.1", "ft1.2"]);

            for (i, feature) in features.iter().enumerate() {
                let expected = i as f64;
                assert_eq!(feature.default_geometry(), Some(&Geometry::point(expected, expected)));
                assert_eq!(feature.value("intProperty"), Some(&Value::I32(i as i32)));
            }
            assert_eq!(features[1].value("doubleProperty"), Some(&Value::F64(1.1)));
            assert_eq!(features[2].value("stringProperty"), Some(&Value::from("two")));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_pushed_down_comparisons() {
    run_test(
        create_test_context,
        |ctx| {
            let datastore = ctx.datastore();
            let source = datastore.feature_source(FT1)?;

            let query = Query::new(FT1).filter(property("intProperty").lte(1));
            assert_eq!(source.count(&query)?, Some(2));
            let plan = source.plan(&query)?;
            assert!(plan.post_filter().is_include());
            assert_eq!(
                plan.native_query().to_json_string(),
                r#"{"properties.intProperty":{"$lte":1}}"#
            );

            let query = Query::new(FT1).filter(property("doubleProperty").between(1.0, 3.0));
            let features = datastore.feature_reader(&query)?.collect::<Result<Vec<_>, _>>()?;
            assert_eq!(ids(&features), vec!["ft1.1", "ft1.2"]);

            let query = Query::new(FT1).filter(property("geometry").bbox(0.5, 0.5, 1.5, 1.5));
            let features = datastore.feature_reader(&query)?.collect::<Result<Vec<_>, _>>()?;
            assert_eq!(ids(&features), vec!["ft1.1"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_residual_filters() {
    run_test(
        create_test_context,
        |ctx| {
            let datastore = ctx.datastore();
            let source = datastore.feature_source(FT1)?;

            let filter = property("intProperty")
                .gte(1)
                .and(property("stringProperty").like("t%"));
            let query = Query::new(FT1).filter(filter);
            let plan = source.plan(&query)?;
            assert!(!plan.post_filter().is_include());
            assert_eq!(
                plan.native_query().to_json_string(),
                r#"{"properties.intProperty":{"$gte":1}}"#
            );

            // the store can not tell how many rows survive the residual part
            assert_eq!(source.count(&query)?, None);

            let features = datastore.feature_reader(&query)?.collect::<Result<Vec<_>, _>>()?;
            assert_eq!(ids(&features), vec!["ft1.2"]);

            let query = Query::new(FT1).filter(id(["ft1.0", "ft1.2"]));
            assert_eq!(source.count(&query)?, None);
            let features = datastore.feature_reader(&query)?.collect::<Result<Vec<_>, _>>()?;
            assert_eq!(ids(&features), vec!["ft1.0", "ft1.2"]);

            let query = Query::new(FT1).filter(property("intProperty").ne(1));
            let features = datastore.feature_reader(&query)?.collect::<Result<Vec<_>, _>>()?;
            assert_eq!(ids(&features), vec!["ft1.0", "ft1.2"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_exclude_short_circuits() {
    run_test(
        create_test_context,
        |ctx| {
            let datastore = ctx.datastore();
            let source = datastore.feature_source(FT1)?;
            let query = Query::new(FT1).filter(none());
            assert_eq!(source.count(&query)?, Some(0));
            assert!(source.plan(&query)?.is_empty_result());

            let mut reader = datastore.feature_reader(&query)?;
            assert!(!reader.has_next());
            assert_eq!(ctx.store().open_cursors(), 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sort_offset_limit() {
    run_test(
        create_test_context,
        |ctx| {
            let datastore = ctx.datastore();
            let source = datastore.feature_source(GRID)?;

            let query = Query::new(GRID)
                .filter(property("intProperty").lt(20))
                .sort_by("intProperty", SortOrder::Descending)
                .offset(2)
                .limit(3);
            let features = datastore.feature_reader(&query)?.collect::<Result<Vec<_>, _>>()?;
            assert_eq!(ids(&features), vec!["grid.17", "grid.16", "grid.15"]);
            assert_eq!(source.count(&query)?, Some(3));

            let query = Query::new(GRID).offset(48).limit(10);
            assert_eq!(source.count(&query)?, Some(2));
            let query = Query::new(GRID).offset(60);
            assert_eq!(source.count(&query)?, Some(0));

            // the window is applied after the residual filter
            let query = Query::new(GRID)
                .filter(property("stringProperty").like("name3"))
                .offset(1)
                .limit(2);
            let plan = source.plan(&query)?;
            assert_eq!(plan.residual_offset(), Some(1));
            assert_eq!(plan.residual_limit(), Some(2));
            let features = datastore.feature_reader(&query)?.collect::<Result<Vec<_>, _>>()?;
            assert_eq!(ids(&features), vec!["grid.10", "grid.17"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_property_selection() {
    run_test(
        create_test_context,
        |ctx| {
            let datastore = ctx.datastore();
            let query = Query::new(FT1)
                .filter(property("stringProperty").like("o%"))
                .properties(&["intProperty"]);
            let mut reader = datastore.feature_reader(&query)?;
            assert_eq!(
                reader.schema().attribute_names().collect::<Vec<_>>(),
                vec!["intProperty", "geometry", "stringProperty"]
            );

            let feature = reader.next().unwrap()?;
            assert_eq!(feature.id(), "ft1.1");
            assert_eq!(feature.value("intProperty"), Some(&Value::I32(1)));
            assert_eq!(feature.default_geometry(), Some(&Geometry::point(1.0, 1.0)));
            assert!(feature.value("doubleProperty").is_none());
            assert!(reader.next().is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_adhoc_reader() {
    run_test(
        create_test_context,
        |ctx| {
            let datastore = ctx.datastore();
            let source = datastore.feature_source(ADHOC)?;

            let query = Query::new(ADHOC).filter(property("visitors").gt(100));
            let plan = source.plan(&query)?;
            assert_eq!(plan.native_query().to_json_string(), r#"{"visitors":{"$gt":100}}"#);
            let features = datastore.feature_reader(&query)?.collect::<Result<Vec<_>, _>>()?;
            assert_eq!(ids(&features), vec!["1", "3"]);
            assert_eq!(features[0].default_geometry(), Some(&Geometry::point(5.0, 5.0)));
            assert_eq!(features[1].value("name"), Some(&Value::from("park")));

            let query = Query::new(ADHOC).filter(property("loc").bbox(0.0, 0.0, 10.0, 10.0));
            assert_eq!(source.count(&query)?, Some(2));
            assert_eq!(source.bounds(&Query::new(ADHOC))?, BoundingBox::new(-2.0, 1.5, 7.5, 5.0));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_malformed_row_surfaces_as_error() {
    run_test(
        create_test_context,
        |ctx| {
            let datastore = ctx.datastore();
            ctx.store()
                .create_collection(ADHOC)
                .save(&mut doc! { "_id": 4, name: "lost", visitors: 1 })?;

            let reader = datastore.feature_reader(&Query::new(ADHOC))?;
            let mut failures = 0;
            let mut decoded = 0;
            for feature in reader {
                match feature {
                    Ok(_) => decoded += 1,
                    Err(e) => {
                        assert_eq!(e.kind(), &ErrorKind::GeometryPathNotFound);
                        failures += 1;
                    }
                }
            }
            assert_eq!((decoded, failures), (3, 1));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_adhoc_positions_under_geometry_key() {
    let store = InMemoryDocumentStore::new();
    let collection = store.create_collection("points");
    for i in 0..3 {
        collection
            .save(&mut doc! {
                "_id": (format!("ft1.{}", i)),
                geometry: [(i as f64), (i as f64)],
                intProperty: i
            })
            .unwrap();
    }

    let datastore = DataStore::builder()
        .mapper_for("points", MapperSelection::AdHoc(AdHocMapper::new("geometry")))
        .connection(ConnectionParams::new(&random_database()))
        .open(store.clone())
        .unwrap();

    let source = datastore.feature_source("points").unwrap();
    assert_eq!(source.count(&Query::new("points")).unwrap(), Some(3));
    assert_eq!(
        source.bounds(&Query::new("points")).unwrap(),
        BoundingBox::new(0.0, 0.0, 2.0, 2.0)
    );

    let features = datastore
        .feature_reader(&Query::new("points"))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(ids(&features), vec!["ft1.0", "ft1.1", "ft1.2"]);
    for feature in &features {
        let point = feature.default_geometry().and_then(|g| g.as_point()).unwrap();
        let expected = match feature.value("intProperty") {
            Some(Value::I32(i)) => *i as f64,
            other => panic!("unexpected intProperty {:?}", other),
        };
        assert_eq!((point.x(), point.y()), (expected, expected));
    }

    datastore.dispose().unwrap();
    assert_eq!(store.open_cursors(), 0);
}
