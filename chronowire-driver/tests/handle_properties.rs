//! Property tests: handle caches against a simple model.

use std::sync::Arc;

use chronowire_test_utils::fixtures::{connection, repeated_rows};
use chronowire_test_utils::generators::{arb_fixed_zone, arb_instant, arb_zone};
use chronowire_test_utils::{PgType, ScriptedExecutor, SettableTimezoneProvider, Zone};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum StatementOp {
    BindInt(i32),
    BindImplicit,
    BindExplicit(Zone),
    BindNull,
    AddBatch,
    Clear,
    Execute,
    ExecuteBatch,
    ChangeDefault(Zone),
}

fn arb_statement_op() -> impl Strategy<Value = StatementOp> {
    prop_oneof![
        any::<i32>().prop_map(StatementOp::BindInt),
        Just(StatementOp::BindImplicit),
        arb_zone().prop_map(StatementOp::BindExplicit),
        Just(StatementOp::BindNull),
        Just(StatementOp::AddBatch),
        Just(StatementOp::Clear),
        Just(StatementOp::Execute),
        Just(StatementOp::ExecuteBatch),
        arb_fixed_zone().prop_map(StatementOp::ChangeDefault),
    ]
}

#[derive(Debug, Clone)]
enum CursorOp {
    Next,
    ReadImplicit,
    ReadExplicit(Zone),
    ReadNonTemporal,
    ChangeDefault(Zone),
}

fn arb_cursor_op() -> impl Strategy<Value = CursorOp> {
    prop_oneof![
        Just(CursorOp::Next),
        Just(CursorOp::ReadImplicit),
        arb_zone().prop_map(CursorOp::ReadExplicit),
        Just(CursorOp::ReadNonTemporal),
        arb_fixed_zone().prop_map(CursorOp::ChangeDefault),
    ]
}

proptest! {
    #[test]
    fn prop_statement_cache_follows_model(
        initial in arb_fixed_zone(),
        instant in arb_instant(),
        ops in prop::collection::vec(arb_statement_op(), 0..40),
    ) {
        let provider = SettableTimezoneProvider::new(initial);
        let executor = Arc::new(ScriptedExecutor::new());
        let conn = connection(&provider, &executor);
        let mut stmt = conn.prepare("INSERT INTO t VALUES ($1)");
        prop_assert_eq!(stmt.cached_zone(), None);

        let mut default = initial;
        let mut model: Option<Zone> = None;

        for op in ops {
            let samples_before = provider.sample_count();
            let cached_before = stmt.cached_zone();
            match op {
                StatementOp::BindInt(v) => stmt.set_int(1, v).unwrap(),
                StatementOp::BindImplicit => {
                    stmt.set_timestamp(1, &instant).unwrap();
                    let expected_samples = samples_before + usize::from(model.is_none());
                    prop_assert_eq!(provider.sample_count(), expected_samples);
                    model.get_or_insert(default);
                }
                StatementOp::BindExplicit(zone) => {
                    stmt.set_timestamp_in(1, &instant, &zone).unwrap();
                    prop_assert_eq!(stmt.cached_zone(), cached_before);
                    prop_assert_eq!(provider.sample_count(), samples_before);
                }
                StatementOp::BindNull => stmt.set_null(1, PgType::Timestamp).unwrap(),
                StatementOp::AddBatch => stmt.add_batch().unwrap(),
                StatementOp::Clear => stmt.clear_parameters(),
                StatementOp::Execute => {
                    stmt.execute_update().unwrap();
                    model = None;
                }
                StatementOp::ExecuteBatch => {
                    stmt.execute_batch().unwrap();
                    model = None;
                }
                StatementOp::ChangeDefault(zone) => {
                    provider.set_default(zone);
                    default = zone;
                }
            }
            prop_assert_eq!(stmt.cached_zone(), model);
        }
    }

    #[test]
    fn prop_cursor_cache_set_once(
        initial in arb_fixed_zone(),
        ops in prop::collection::vec(arb_cursor_op(), 0..40),
    ) {
        let provider = SettableTimezoneProvider::new(initial);
        let executor = Arc::new(ScriptedExecutor::with_rows(repeated_rows(64)));
        let conn = connection(&provider, &executor);
        let mut rows = conn.query("SELECT * FROM t").unwrap();
        prop_assert_eq!(rows.cached_zone(), None);
        prop_assert!(rows.next());

        let mut default = initial;
        let mut model: Option<Zone> = None;

        for op in ops {
            let samples_before = provider.sample_count();
            match op {
                CursorOp::Next => prop_assert!(rows.next()),
                CursorOp::ReadImplicit => {
                    rows.get_timestamp(1).unwrap();
                    let expected_samples = samples_before + usize::from(model.is_none());
                    prop_assert_eq!(provider.sample_count(), expected_samples);
                    model.get_or_insert(default);
                }
                CursorOp::ReadExplicit(zone) => {
                    rows.get_timestamp_in(1, &zone).unwrap();
                    prop_assert_eq!(provider.sample_count(), samples_before);
                }
                CursorOp::ReadNonTemporal => {
                    rows.get_int(5).unwrap();
                }
                CursorOp::ChangeDefault(zone) => {
                    provider.set_default(zone);
                    default = zone;
                }
            }
            prop_assert_eq!(rows.cached_zone(), model);
        }
    }
}
