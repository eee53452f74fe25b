use std::sync::Arc;

use arrow_schema::{Schema, SchemaRef};
use mqe_common::{schema_fields, MqeError, Result};
use mqe_storage::{schemas_match, select_fields};
use tracing::debug;

use crate::logical_plan::LogicalPlan;
use crate::physical_expr::bind_expr;
use crate::physical_plan::{FilterExec, PhysicalPlan, ProjectionExec, ScanExec};
use crate::type_coercion::require_boolean;

/// Lower a logical plan into a bound, executable physical plan.
///
/// Contracts:
/// - children are lowered first and expressions are bound against the
///   child's physical schema;
/// - every lowered node's schema must agree with the logical schema of the
///   same node (names and types), otherwise `SchemaMismatch`;
/// - the first error aborts compilation; no partial plan is returned.
pub fn create_physical_plan(logical: &LogicalPlan) -> Result<PhysicalPlan> {
    let physical = match logical {
        LogicalPlan::Scan { source, projection } => {
            let schema = match projection {
                Some(names) => select_fields(&source.schema(), names)?,
                None => source.schema(),
            };
            debug!(source = source.name(), ?projection, "lowered Scan to ScanExec");
            PhysicalPlan::Scan(ScanExec {
                source: Arc::clone(source),
                projection: projection.clone(),
                schema,
            })
        }

        LogicalPlan::Filter { input, predicate } => {
            let child = create_physical_plan(input)?;
            let schema = child.schema();
            let predicate = bind_expr(predicate, &schema)?;
            require_boolean("filter predicate", &predicate.data_type())?;
            debug!(%predicate, "lowered Filter to FilterExec");
            PhysicalPlan::Filter(FilterExec {
                input: Box::new(child),
                predicate,
                schema,
            })
        }

        LogicalPlan::Projection { input, exprs } => {
            let child = create_physical_plan(input)?;
            let child_schema = child.schema();
            let bound = exprs
                .iter()
                .map(|e| bind_expr(e, &child_schema))
                .collect::<Result<Vec<_>>>()?;
            let fields = exprs
                .iter()
                .map(|e| e.resolve(&child_schema))
                .collect::<Result<Vec<_>>>()?;
            debug!(exprs = bound.len(), "lowered Projection to ProjectionExec");
            PhysicalPlan::Projection(ProjectionExec {
                input: Box::new(child),
                exprs: bound,
                schema: Arc::new(Schema::new(fields)),
            })
        }
    };

    check_schema(&physical.schema(), &logical.schema()?)?;
    Ok(physical)
}

fn check_schema(physical: &SchemaRef, logical: &SchemaRef) -> Result<()> {
    if schemas_match(physical, logical) {
        Ok(())
    } else {
        Err(MqeError::SchemaMismatch(format!(
            "physical schema [{}] does not match logical schema [{}]",
            schema_fields(physical),
            schema_fields(logical)
        )))
    }
}
