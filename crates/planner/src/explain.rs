//! Tree printer shared by logical and physical plans.
//!
//! Output shape:
//!
//! ```text
//! Projection: #id, (#id * 2) AS new_id  [id:int64, new_id:int64]
//! └── Filter: (#first_name = 'Niko')  [id:int64, first_name:string]
//!     └── Scan: in_memory; projection=None  [id:int64, first_name:string]
//! ```

use arrow_schema::SchemaRef;
use mqe_common::{schema_fields, Result};

/// A node the printer can walk.
pub trait PlanNode {
    /// `<Label>: <summary>` without the schema bracket.
    fn label(&self, verbose: bool) -> String;

    /// Output schema of this node.
    fn output_schema(&self) -> Result<SchemaRef>;

    /// Immediate inputs, in order.
    fn inputs(&self) -> Vec<&Self>;
}

const LAST: &str = "└── ";
const MIDDLE: &str = "├── ";
const LAST_INDENT: &str = "    ";
const MIDDLE_INDENT: &str = "│   ";

/// Render `plan` as an indented tree. Lines are joined with `\n` and the
/// result has no trailing newline.
pub fn explain<P: PlanNode>(plan: &P, verbose: bool) -> String {
    let mut lines = Vec::new();
    render(plan, verbose, "", "", &mut lines);
    lines.join("\n")
}

fn render<P: PlanNode>(
    node: &P,
    verbose: bool,
    prefix: &str,
    connector: &str,
    out: &mut Vec<String>,
) {
    let mut line = format!("{prefix}{connector}{}", node.label(verbose));
    if verbose {
        match node.output_schema() {
            Ok(schema) => line.push_str(&format!("  [{}]", schema_fields(&schema))),
            Err(e) => line.push_str(&format!("  [<error: {e}>]")),
        }
    }
    out.push(line);

    let child_prefix = match connector {
        "" => prefix.to_string(),
        LAST => format!("{prefix}{LAST_INDENT}"),
        _ => format!("{prefix}{MIDDLE_INDENT}"),
    };
    let inputs = node.inputs();
    let n = inputs.len();
    for (i, child) in inputs.into_iter().enumerate() {
        let connector = if i + 1 == n { LAST } else { MIDDLE };
        render(child, verbose, &child_prefix, connector, out);
    }
}

/// Summary shared by `Scan` and `ScanExec`.
pub(crate) fn scan_summary(source: &str, projection: Option<&[String]>, verbose: bool) -> String {
    match projection {
        Some(names) => format!("{source}; projection=[{}]", names.join(", ")),
        None if verbose => format!("{source}; projection=None"),
        None => source.to_string(),
    }
}
