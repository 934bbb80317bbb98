use geomongo::common::Value;
use geomongo::doc;
use geomongo::errors::GeoMongoResult;
use geomongo::filter::{property, Filter};
use geomongo::source::Query;
use geomongo::store::DocumentCollectionProvider;
use geomongo_int_test::test_util::{
    cleanup, create_test_context, run_test, TestContext, GRID, GRID_SIZE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_predicate(rng: &mut StdRng) -> Filter {
    let bound = rng.random_range(0..GRID_SIZE + 2 * SHAPES);
    match rng.random_range(0..8) {
        0 => property("intProperty").lt(bound),
        1 => property("intProperty").gte(bound),
        2 => property("intProperty").eq(bound),
        3 => property("doubleProperty").between(bound as f64 / 4.0, bound as f64 / 2.0),
        4 => {
            let x = rng.random_range(0..10i32) as f64 - 0.5;
            let y = rng.random_range(0..5i32) as f64 - 0.5;
            property("geometry").bbox(x, y, x + 3.0, y + 2.0)
        }
        5 => property("intProperty").ne(bound),
        6 => property("stringProperty").like(&format!("name{}", bound % 7)),
        _ => property("intProperty").is_null(),
    }
}

fn random_filter(rng: &mut StdRng) -> Filter {
    let first = random_predicate(rng);
    let second = random_predicate(rng);
    match rng.random_range(0..4) {
        0 => first,
        1 => first.and(second),
        2 => first.or(second),
        _ => first.and(second.not()),
    }
}

const SHAPES: i32 = 10;

fn position(x: f64, y: f64) -> Value {
    Value::Array(vec![Value::F64(x), Value::F64(y)])
}

/// Adds lines and squares to the grid, so bbox filters see shapes whose
/// envelope only partly overlaps the box.
fn add_shapes(ctx: &TestContext) -> GeoMongoResult<()> {
    let collection = ctx.store().create_collection(GRID);
    for k in 0..SHAPES {
        let x = (k % 8) as f64;
        let y = (k % 4) as f64;
        let size = 1.0 + (k % 3) as f64 * 0.5;
        let i = GRID_SIZE + 2 * k;

        let mut line = doc! {
            "_id": (format!("grid.line.{}", k)),
            geometry: {
                type: "LineString",
                coordinates: [(position(x, y)), (position(x + size, y + 1.0))]
            },
            properties: {
                intProperty: i,
                doubleProperty: (i as f64 * 0.5),
                stringProperty: (format!("name{}", i % 7))
            }
        };
        collection.save(&mut line)?;

        let mut square = doc! {
            "_id": (format!("grid.square.{}", k)),
            geometry: {
                type: "Polygon",
                coordinates: [[
                    (position(x, y)),
                    (position(x + size, y)),
                    (position(x + size, y + size)),
                    (position(x, y + size)),
                    (position(x, y))
                ]]
            },
            properties: {
                intProperty: (i + 1),
                doubleProperty: ((i + 1) as f64 * 0.5),
                stringProperty: (format!("name{}", (i + 1) % 7))
            }
        };
        collection.save(&mut square)?;
    }
    Ok(())
}

fn ids(reader: geomongo::source::FeatureReader) -> Vec<String> {
    reader
        .map(|feature| feature.map(|f| f.id().to_string()))
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn test_pushdown_matches_in_process_evaluation() {
    run_test(
        create_test_context,
        |ctx| {
            add_shapes(&ctx)?;
            let datastore = ctx.datastore();
            let source = datastore.feature_source(GRID)?;
            let everything = datastore
                .feature_reader(&Query::new(GRID))?
                .collect::<Result<Vec<_>, _>>()?;
            assert_eq!(everything.len(), (GRID_SIZE + 2 * SHAPES) as usize);

            let mut rng = StdRng::seed_from_u64(0x6e6f);
            for _ in 0..200 {
                let filter = random_filter(&mut rng);

                let mut expected = Vec::new();
                for feature in &everything {
                    if filter.evaluate(feature)? {
                        expected.push(feature.id().to_string());
                    }
                }

                let query = Query::new(GRID).filter(filter.clone());
                let actual = ids(datastore.feature_reader(&query)?);
                assert_eq!(actual, expected, "filter {}", filter);

                if let Some(count) = source.count(&query)? {
                    assert_eq!(count as usize, expected.len(), "count of {}", filter);
                }
            }

            assert_eq!(ctx.store().open_cursors(), 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_bbox_needs_whole_shape_inside() {
    run_test(
        create_test_context,
        |ctx| {
            add_shapes(&ctx)?;
            let datastore = ctx.datastore();
            let source = datastore.feature_source(GRID)?;

            // grid.line.0 runs from (0,0) to (1,1), grid.square.0 covers (0,0)-(1,1)
            let query = Query::new(GRID).filter(property("geometry").bbox(-0.5, -0.5, 1.2, 1.2));
            assert!(source.plan(&query)?.post_filter().is_include());
            let actual = ids(datastore.feature_reader(&query)?);
            assert_eq!(
                actual,
                vec!["grid.0", "grid.1", "grid.10", "grid.11", "grid.line.0", "grid.square.0"]
            );
            assert_eq!(source.count(&query)?, Some(6));

            // grid.line.1 starts at (1,1) but leaves the box
            let query = Query::new(GRID).filter(property("geometry").bbox(0.5, 0.5, 1.5, 1.5));
            assert_eq!(ids(datastore.feature_reader(&query)?), vec!["grid.11"]);

            let query = Query::new(GRID).filter(property("geometry").bbox(-0.5, -0.5, 1.2, 1.2).not());
            let outside = ids(datastore.feature_reader(&query)?);
            assert_eq!(outside.len(), (GRID_SIZE + 2 * SHAPES - 6) as usize);
            assert!(outside.contains(&"grid.line.8".to_string()));
            assert_eq!(source.count(&query)?, Some(outside.len() as u64));
            Ok(())
        },
        cleanup,
    )
}
