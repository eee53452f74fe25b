//! Pull-based operators.
//!
//! Each physical node becomes a lazy stream; polling the root polls children
//! only as needed to produce the next batch. Dropping a stream cancels the
//! query and releases the source's scan.

use std::sync::Arc;

use arrow::array::AsArray;
use arrow::compute::filter_record_batch;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow_schema::{Schema, SchemaRef};
use futures::{StreamExt, TryStreamExt};
use mqe_common::{schema_fields, type_name, MqeError, Result};
use mqe_planner::{FilterExec, PhysicalExpr, PhysicalPlan, ProjectionExec, ScanExec};
use mqe_storage::{projection_indices, schemas_match};
use tracing::trace;

use crate::expressions::evaluate;
use crate::stream::{stop_after_error, SendableRecordBatchStream, StreamAdapter};

/// Build the output stream of `plan`.
///
/// Nothing is read until the stream is polled. The first failing batch is
/// yielded as an `Err` and ends the stream.
pub fn execute_plan(plan: &PhysicalPlan) -> Result<SendableRecordBatchStream> {
    match plan {
        PhysicalPlan::Scan(scan) => execute_scan(scan),
        PhysicalPlan::Filter(filter) => execute_filter(filter),
        PhysicalPlan::Projection(projection) => execute_projection(projection),
    }
}

fn execute_scan(scan: &ScanExec) -> Result<SendableRecordBatchStream> {
    let source = Arc::clone(&scan.source);
    let projection = scan.projection.clone();
    let full = source.schema();
    let indices = projection
        .as_deref()
        .map(|names| projection_indices(&full, names))
        .transpose()?;
    let expected = Arc::clone(&scan.schema);
    let name = source.name().to_string();

    // The source is only asked for its batches on the first poll.
    let stream = futures::stream::once(async move { source.scan(projection.as_deref()) })
        .try_flatten()
        .map(move |batch| {
            let batch = batch?;
            trace!(source = %name, rows = batch.num_rows(), "scan batch");
            conform(batch, &expected, &full, indices.as_deref())
        });
    Ok(Box::pin(StreamAdapter::new(
        Arc::clone(&scan.schema),
        stop_after_error(stream).boxed(),
    )))
}

/// Accept a batch already in the expected shape, narrow one in the full
/// source shape, reject anything else. Accepted batches carry `expected`.
fn conform(
    batch: RecordBatch,
    expected: &SchemaRef,
    full: &Schema,
    indices: Option<&[usize]>,
) -> Result<RecordBatch> {
    if schemas_match(&batch.schema(), expected) {
        return with_plan_schema(batch, expected);
    }
    match indices {
        Some(idx) if schemas_match(&batch.schema(), full) => {
            let narrowed = batch
                .project(idx)
                .map_err(|e| MqeError::Execution(format!("batch projection failed: {e}")))?;
            with_plan_schema(narrowed, expected)
        }
        _ => Err(MqeError::SchemaMismatch(format!(
            "scan produced batch [{}], expected [{}]",
            schema_fields(&batch.schema()),
            schema_fields(expected)
        ))),
    }
}

/// Re-label `batch` with the schema the plan advertises. Columns are shared.
fn with_plan_schema(batch: RecordBatch, schema: &SchemaRef) -> Result<RecordBatch> {
    if batch.schema_ref() == schema {
        return Ok(batch);
    }
    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    RecordBatch::try_new_with_options(Arc::clone(schema), batch.columns().to_vec(), &options)
        .map_err(|e| MqeError::Execution(format!("batch does not fit plan schema: {e}")))
}

fn execute_filter(filter: &FilterExec) -> Result<SendableRecordBatchStream> {
    let input = execute_plan(&filter.input)?;
    let predicate = filter.predicate.clone();
    let out_schema = Arc::clone(&filter.schema);
    let stream = input.map(move |batch| filter_batch(&batch?, &predicate, &out_schema));
    Ok(Box::pin(StreamAdapter::new(
        Arc::clone(&filter.schema),
        stop_after_error(stream).boxed(),
    )))
}

/// Rows where the predicate is null are dropped. Empty results are still
/// returned as zero-row batches.
fn filter_batch(
    batch: &RecordBatch,
    predicate: &PhysicalExpr,
    schema: &SchemaRef,
) -> Result<RecordBatch> {
    let mask = evaluate(predicate, batch)?.into_array(batch.num_rows())?;
    let mask = mask.as_boolean_opt().ok_or_else(|| {
        MqeError::Execution(format!(
            "filter predicate evaluated to {}, expected bool",
            type_name(mask.data_type())
        ))
    })?;
    let out = filter_record_batch(batch, mask)
        .map_err(|e| MqeError::Execution(format!("filter failed: {e}")))?;
    let out = with_plan_schema(out, schema)?;
    trace!(
        input_rows = batch.num_rows(),
        output_rows = out.num_rows(),
        "filter batch"
    );
    Ok(out)
}

fn execute_projection(projection: &ProjectionExec) -> Result<SendableRecordBatchStream> {
    let input = execute_plan(&projection.input)?;
    let exprs = projection.exprs.clone();
    let schema = Arc::clone(&projection.schema);
    let out_schema = Arc::clone(&schema);
    let stream = input.map(move |batch| project_batch(&batch?, &exprs, &out_schema));
    Ok(Box::pin(StreamAdapter::new(
        schema,
        stop_after_error(stream).boxed(),
    )))
}

fn project_batch(
    batch: &RecordBatch,
    exprs: &[PhysicalExpr],
    schema: &SchemaRef,
) -> Result<RecordBatch> {
    let rows = batch.num_rows();
    let columns = exprs
        .iter()
        .map(|e| evaluate(e, batch)?.into_array(rows))
        .collect::<Result<Vec<_>>>()?;
    // Explicit row count so that an empty projection keeps the input's rows.
    let options = RecordBatchOptions::new().with_row_count(Some(rows));
    let out = RecordBatch::try_new_with_options(Arc::clone(schema), columns, &options)
        .map_err(|e| MqeError::Execution(format!("projection failed: {e}")))?;
    trace!(rows, columns = out.num_columns(), "projection batch");
    Ok(out)
}
