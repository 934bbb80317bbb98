use geomongo::collection::Document;
use geomongo::doc;
use geomongo::errors::GeoMongoResult;
use geomongo::mapper::MapperSelection;
use geomongo::source::DataStore;
use geomongo::store::memory::InMemoryDocumentStore;
use geomongo::store::{ConnectionParams, DocumentCollectionProvider};
use std::backtrace::Backtrace;
use std::sync::Arc;
use std::time::Instant;

pub const FT1: &str = "ft1";
pub const GRID: &str = "grid";
pub const ADHOC: &str = "adhoc";
pub const GRID_SIZE: i32 = 50;

/// Runs `test` between `before` and `after`. `after` runs even when the test
/// fails so the context is always released.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> GeoMongoResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> GeoMongoResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> GeoMongoResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();
    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => after(ctx)
                    .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    let (error, backtrace) = match result {
        Ok(Ok(_)) => return,
        Ok(Err((e, bt))) => (e, bt),
        Err(panic_err) => {
            let message = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            (format!("Panic: {}", message), Backtrace::capture().to_string())
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", start_time.elapsed());
    eprintln!("Error: {}", error);
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");

    panic!("Test failed: {}", error);
}

#[derive(Clone)]
pub struct TestContext {
    database: String,
    store: InMemoryDocumentStore,
    datastore: Arc<DataStore>,
}

impl TestContext {
    pub fn new(database: String, store: InMemoryDocumentStore, datastore: DataStore) -> Self {
        Self {
            database,
            store,
            datastore: Arc::new(datastore),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn store(&self) -> InMemoryDocumentStore {
        self.store.clone()
    }

    pub fn datastore(&self) -> Arc<DataStore> {
        self.datastore.clone()
    }
}

pub fn random_database() -> String {
    format!("geo_{}", uuid::Uuid::new_v4().simple())
}

/// Three GeoJSON features `ft1.0` .. `ft1.2`, feature `i` sitting at (i, i).
pub fn ft1_documents() -> Vec<Document> {
    let names = ["zero", "one", "two"];
    (0..3)
        .map(|i| {
            doc! {
                "_id": (format!("ft1.{}", i)),
                type: "Feature",
                geometry: { type: "Point", coordinates: [(i as f64), (i as f64)] },
                properties: {
                    intProperty: i,
                    doubleProperty: (i as f64 + i as f64 / 10.0),
                    stringProperty: (names[i as usize])
                }
            }
        })
        .collect()
}

/// A 10 by 5 grid of GeoJSON points; cell `i` sits at (i % 10, i / 10).
pub fn grid_documents() -> Vec<Document> {
    (0..GRID_SIZE)
        .map(|i| {
            doc! {
                "_id": (format!("grid.{}", i)),
                geometry: { type: "Point", coordinates: [((i % 10) as f64), ((i / 10) as f64)] },
                properties: {
                    intProperty: i,
                    doubleProperty: (i as f64 * 0.5),
                    stringProperty: (format!("name{}", i % 7))
                }
            }
        })
        .collect()
}

/// Ad-hoc documents keeping a position under `loc`.
pub fn adhoc_documents() -> Vec<Document> {
    vec![
        doc! { "_id": 1, name: "harbour", visitors: 120, loc: [5.0, 5.0] },
        doc! { "_id": 2, name: "museum", visitors: 45, loc: [7.5, 1.5] },
        doc! { "_id": 3, name: "park", visitors: 300, loc: [(-2.0), 4.0] },
    ]
}

pub fn populate(store: &InMemoryDocumentStore) -> GeoMongoResult<()> {
    for (name, documents) in [
        (FT1, ft1_documents()),
        (GRID, grid_documents()),
        (ADHOC, adhoc_documents()),
    ] {
        let collection = store.create_collection(name);
        for mut document in documents {
            collection.save(&mut document)?;
        }
    }
    store.create_collection("system.indexes");
    Ok(())
}

pub fn create_test_context() -> GeoMongoResult<TestContext> {
    create_test_context_with(MapperSelection::AutoDetect)
}

pub fn create_test_context_with(selection: MapperSelection) -> GeoMongoResult<TestContext> {
    let database = random_database();
    let store = InMemoryDocumentStore::new();
    populate(&store)?;

    let datastore = DataStore::builder()
        .mapper(selection)
        .connection(ConnectionParams::new(&database))
        .open(store.clone())?;

    Ok(TestContext::new(database, store, datastore))
}

pub fn cleanup(ctx: TestContext) -> GeoMongoResult<()> {
    let open = ctx.store().open_cursors();
    if open != 0 {
        eprintln!("Warning: {} cursors left open on {}", open, ctx.database());
    }
    ctx.datastore().dispose()
}
