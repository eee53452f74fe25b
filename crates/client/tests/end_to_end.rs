use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Int64Array, StringArray};
use arrow::datatypes::Int64Type;
use futures::TryStreamExt;
use mqe_client::{col, col_index, concat, lit, upper, DataFrame, Engine};
use mqe_common::{EngineConfig, MqeError};
use mqe_storage::MemTable;

fn engine() -> Engine {
    Engine::new(EngineConfig::default()).expect("engine")
}

fn people(engine: &Engine) -> DataFrame {
    engine
        .from_columns(vec![
            ("id", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
            (
                "first_name",
                Arc::new(StringArray::from(vec!["Niko", "Alice", "Joy"])) as ArrayRef,
            ),
            (
                "state",
                Arc::new(StringArray::from(vec!["CO", "CA", "NY"])) as ArrayRef,
            ),
        ])
        .expect("frame")
}

fn niko_query(engine: &Engine) -> DataFrame {
    people(engine)
        .filter(col("first_name").eq(lit("Niko")))
        .select(vec![
            col("id"),
            (col("id") * lit(2)).alias("new_id"),
            col("first_name"),
        ])
}

#[test]
fn niko_scenario_end_to_end() {
    let engine = engine();
    let df = niko_query(&engine);

    let result = df.collect_blocking().expect("collect");
    assert_eq!(result.num_rows(), 1);
    let names = result
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["id", "new_id", "first_name"]);

    let batch = &result.batches()[0];
    assert_eq!(batch.column(0).as_primitive::<Int64Type>().value(0), 1);
    assert_eq!(batch.column(1).as_primitive::<Int64Type>().value(0), 2);
    assert_eq!(batch.column(2).as_string::<i32>().value(0), "Niko");

    assert_eq!(
        engine.explain(df.logical_plan(), true),
        "Projection: #id, (#id * 2) AS new_id, #first_name  [id:int64, new_id:int64, first_name:string]\n\
         └── Filter: (#first_name = 'Niko')  [id:int64, first_name:string, state:string]\n    \
         └── Scan: in_memory; projection=None  [id:int64, first_name:string, state:string]"
    );
    let physical = engine.compile(df.logical_plan()).expect("compile");
    assert_eq!(
        physical.explain(true),
        "ProjectionExec: #0, (#0 * 2) AS new_id, #1  [id:int64, new_id:int64, first_name:string]\n\
         └── FilterExec: (#1 = 'Niko')  [id:int64, first_name:string, state:string]\n    \
         └── ScanExec: in_memory; projection=None  [id:int64, first_name:string, state:string]"
    );
}

#[test]
fn empty_result_is_zero_row_batches() {
    let engine = engine();
    let result = people(&engine)
        .filter(col("state").eq(lit("TX")))
        .select(vec![col("id")])
        .collect_blocking()
        .expect("collect");
    assert_eq!(result.num_rows(), 0);
    assert_eq!(result.num_batches(), 1);
    assert_eq!(result.batches()[0].num_columns(), 1);
}

#[test]
fn type_mismatch_fails_at_compile() {
    let engine = engine();
    let df = people(&engine).filter(col("id") + lit("x"));
    let err = engine.compile(df.logical_plan()).expect_err("type mismatch");
    assert!(matches!(err, MqeError::TypeMismatch { .. }));
    assert!(matches!(
        df.collect_blocking(),
        Err(MqeError::TypeMismatch { .. })
    ));
}

#[test]
fn unknown_column_fails_at_compile() {
    let engine = engine();
    let df = people(&engine).select(vec![col("age")]);
    let err = df.physical_plan().expect_err("unknown column");
    assert_eq!(
        err.to_string(),
        "unknown column 'age'; available columns: [id, first_name, state]"
    );
}

#[test]
fn compile_and_execute_stream_lazily() {
    let engine = engine();
    let physical = engine
        .compile(niko_query(&engine).logical_plan())
        .expect("compile");
    let stream = engine.execute(&physical).expect("execute");
    let batches = futures::executor::block_on(stream.try_collect::<Vec<_>>()).expect("collect");
    assert_eq!(batches.iter().map(|b| b.num_rows()).sum::<usize>(), 1);

    let df = niko_query(&engine);
    let stream = futures::executor::block_on(df.collect_stream()).expect("collect_stream");
    let batches = futures::executor::block_on(stream.try_collect::<Vec<_>>()).expect("stream");
    assert_eq!(batches.len(), 1);
}

#[test]
fn registered_tables_and_scan_projection() {
    let engine = engine();
    let source = people(&engine).collect_blocking().expect("collect");
    let table = MemTable::try_new(source.schema(), source.into_batches()).expect("table");
    engine
        .register_table("people", Arc::new(table))
        .expect("register");

    let result = engine
        .table("people")
        .expect("table")
        .select_columns(&["state", "id"])
        .filter(col("id").gt_eq(lit(2)))
        .collect_blocking()
        .expect("collect");
    assert_eq!(result.num_rows(), 2);
    assert_eq!(result.schema().field(0).name(), "state");
}

#[test]
fn results_can_be_queried_again() {
    let engine = engine();
    let first = people(&engine)
        .select(vec![
            upper(col("first_name")).alias("shout"),
            concat(vec![col("first_name"), lit("@"), col("state")]).alias("tag"),
            col("id"),
        ])
        .collect_blocking()
        .expect("first pass");

    let second = first
        .lazy()
        .expect("lazy")
        .filter(col("id").lt(lit(3)).and(col("shout").not_eq(lit("NIKO"))))
        .select_columns(&["tag"])
        .collect_blocking()
        .expect("second pass");
    assert_eq!(second.num_rows(), 1);
    let tags = second.batches()[0].column(0).as_string::<i32>();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags.value(0), "Alice@CA");
}

#[test]
fn display_renders_a_table() {
    let engine = engine();
    let result = niko_query(&engine).collect_blocking().expect("collect");
    let text = result.to_string();
    let header = "Rows:    1\n\
                  Columns: 3\n\
                  Batches: 1\n\
                  Schema:  [id:int64, new_id:int64, first_name:string]\n";
    assert!(text.starts_with(header));
    let rule = text.lines().nth(4).expect("rule line");
    assert_eq!(rule, "=".repeat(53));
    assert!(text.contains("| 1  | 2      | Niko       |"));
}

#[test]
fn results_support_eager_select_and_filter() {
    let engine = engine();
    let all = people(&engine).collect_blocking().expect("collect");

    let filtered = all.filter(col("state").not_eq(lit("NY"))).expect("filter");
    assert_eq!(filtered.num_rows(), 2);
    let same = all.where_(col("state").not_eq(lit("NY"))).expect("where");
    assert_eq!(same.batches(), filtered.batches());

    let selected = filtered
        .select(vec![(col_index(0) * lit(10)).alias("scaled"), col_index(1)])
        .expect("select");
    let batch = &selected.batches()[0];
    assert_eq!(selected.schema().field(0).name(), "scaled");
    assert_eq!(selected.schema().field(1).name(), "first_name");
    assert_eq!(batch.column(0).as_primitive::<Int64Type>().value(1), 20);
    assert_eq!(all.num_rows(), 3);
}

#[test]
fn from_batches_infers_the_schema() {
    let engine = engine();
    let batches = people(&engine).collect_blocking().expect("collect").into_batches();
    let df = engine.from_batches(batches, None).expect("frame");
    assert_eq!(df.schema().expect("schema").fields().len(), 3);
    assert!(matches!(
        engine.from_batches(vec![], None),
        Err(MqeError::InvalidConfig(_))
    ));
}

#[test]
fn config_round_trips_through_json() {
    let config = EngineConfig::default().with_batch_size_rows(2);
    let json = serde_json::to_string(&config).expect("serialize");
    let back: EngineConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, config);

    let result = people(&Engine::new(back).expect("engine"))
        .collect_blocking()
        .expect("collect");
    assert_eq!(result.num_batches(), 2);
}
