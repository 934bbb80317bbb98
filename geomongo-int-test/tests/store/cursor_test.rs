use geomongo::filter::property;
use geomongo::source::Query;
use geomongo_int_test::test_util::{cleanup, create_test_context, run_test, FT1, GRID};

#[test]
fn test_cursor_released_on_close() {
    run_test(
        create_test_context,
        |ctx| {
            let datastore = ctx.datastore();
            let mut reader = datastore.feature_reader(&Query::new(GRID))?;
            assert!(reader.has_next());
            assert_eq!(ctx.store().open_cursors(), 1);

            reader.next().unwrap()?;
            reader.close()?;
            assert_eq!(ctx.store().open_cursors(), 0);

            // closing twice is harmless
            reader.close()?;
            assert!(reader.next().is_none());
            assert_eq!(ctx.store().open_cursors(), 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_cursor_released_on_drop() {
    run_test(
        create_test_context,
        |ctx| {
            let datastore = ctx.datastore();
            {
                let query = Query::new(GRID).filter(property("stringProperty").like("name%"));
                let mut reader = datastore.feature_reader(&query)?;
                reader.next().unwrap()?;
                assert_eq!(ctx.store().open_cursors(), 1);
            }
            assert_eq!(ctx.store().open_cursors(), 0);

            // readers that run to the end release their cursor too
            let count = datastore.feature_reader(&Query::new(FT1))?.count();
            assert_eq!(count, 3);
            assert_eq!(ctx.store().open_cursors(), 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_concurrent_readers() {
    run_test(
        create_test_context,
        |ctx| {
            let datastore = ctx.datastore();
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let datastore = datastore.clone();
                    std::thread::spawn(move || {
                        let query = Query::new(GRID).filter(property("intProperty").lt(10 * (i + 1)));
                        datastore.feature_reader(&query).map(|reader| reader.count())
                    })
                })
                .collect();

            for (i, handle) in handles.into_iter().enumerate() {
                let count = handle.join().unwrap()?;
                assert_eq!(count, 10 * (i + 1));
            }
            assert_eq!(ctx.store().open_cursors(), 0);
            Ok(())
        },
        cleanup,
    )
}
