use geomongo::common::Value;
use geomongo::errors::ErrorKind;
use geomongo::filter::{id, property};
use geomongo::geometry::Geometry;
use geomongo::source::Query;
use geomongo::store::DocumentCollectionProvider;
use geomongo_int_test::test_util::{cleanup, create_test_context, run_test, ADHOC, FT1};

#[test]
fn test_append_geojson_feature() {
    run_test(
        create_test_context,
        |ctx| {
            let datastore = ctx.datastore();
            let mut writer = datastore.feature_writer_append(FT1)?;
            assert!(!writer.has_next());

            let feature = writer.next()?;
            feature.set_attribute("geometry", Geometry::point(10.0, 10.0))?;
            feature.set_attribute("intProperty", Value::I32(10))?;
            feature.set_attribute("stringProperty", Value::from("ten"))?;
            feature.set_attribute("bom.bam", Value::from("baz"))?;
            let new_id = writer.write()?;
            writer.close()?;

            let collection = ctx.store().create_collection(FT1);
            let mut cursor = collection.find(&geomongo::doc! {}, &Default::default())?;
            let saved = cursor
                .find_map(|document| match document {
                    Ok(document) if document.id().map(|id| id.to_id_string()) == Some(new_id.clone()) => {
                        Some(document)
                    }
                    _ => None,
                })
                .unwrap();
            cursor.close()?;
            assert_eq!(saved.get("properties.bom.bam"), Some(&Value::from("baz")));
            assert_eq!(
                saved.get("geometry").map(|g| g.to_string()),
                Some(r#"{"type":"Point","coordinates":[10.0,10.0]}"#.to_string())
            );

            let source = datastore.feature_source(FT1)?;
            assert_eq!(source.count(&Query::new(FT1))?, Some(4));

            let query = Query::new(FT1).filter(id([new_id.as_str()]));
            let features = datastore.feature_reader(&query)?.collect::<Result<Vec<_>, _>>()?;
            assert_eq!(features.len(), 1);
            assert_eq!(features[0].value("intProperty"), Some(&Value::I32(10)));
            assert_eq!(features[0].default_geometry(), Some(&Geometry::point(10.0, 10.0)));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_append_adhoc_feature() {
    run_test(
        create_test_context,
        |ctx| {
            let datastore = ctx.datastore();
            let mut writer = datastore.feature_writer_append(ADHOC)?;
            let feature = writer.next()?;
            feature.set_attribute("loc", Geometry::point(1.0, 9.0))?;
            feature.set_attribute("name", Value::from("lighthouse"))?;
            feature.set_attribute("visitors", Value::I32(500))?;
            writer.write()?;

            let query = Query::new(ADHOC).filter(property("visitors").gte(300));
            let features = datastore.feature_reader(&query)?.collect::<Result<Vec<_>, _>>()?;
            let names: Vec<_> = features.iter().map(|f| f.value("name").cloned()).collect();
            assert_eq!(
                names,
                vec![Some(Value::from("park")), Some(Value::from("lighthouse"))]
            );
            assert_eq!(features[1].default_geometry(), Some(&Geometry::point(1.0, 9.0)));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_write_requires_current_feature() {
    run_test(
        create_test_context,
        |ctx| {
            let mut writer = ctx.datastore().feature_writer_append(FT1)?;
            let err = writer.write().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NoCurrentFeature);

            writer.next()?.set_attribute("intProperty", Value::I32(3))?;
            writer.write()?;
            let err = writer.write().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NoCurrentFeature);

            let err = writer.remove().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UnsupportedOperation);

            writer.close()?;
            assert_eq!(writer.next().unwrap_err().kind(), &ErrorKind::CursorClosed);
            Ok(())
        },
        cleanup,
    )
}
