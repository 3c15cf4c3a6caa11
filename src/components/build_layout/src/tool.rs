use crate::{IngestError, IngestErrorKind, ingest};
use layout::LayoutTable;

/// External analysis tool: compiles one C translation unit and produces
/// the layout dump for it. The tool may restrict the dump to the target
/// and what it references; ingestion applies the same selection either
/// way.
pub trait LayoutDumper {
    fn dump_layouts(&self, unit: &str, target: Option<&str>) -> Result<String, ToolFailure>;
}

/// Diagnostic output of a failed tool invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolFailure {
    pub output: String,
}

/// Runs the analysis tool on `unit` and ingests the dump it writes.
pub fn ingest_with(
    dumper: &impl LayoutDumper,
    unit: &str,
    target: Option<&str>,
) -> Result<LayoutTable, IngestError> {
    let dump = dumper.dump_layouts(unit, target).map_err(|failure| {
        IngestError::from(IngestErrorKind::ToolInvocationFailed {
            output: failure.output,
        })
    })?;

    ingest(&dump, target)
}

#[cfg(test)]
struct CannedTool {
    dump: &'static str,
}

#[cfg(test)]
impl LayoutDumper for CannedTool {
    fn dump_layouts(&self, _unit: &str, _target: Option<&str>) -> Result<String, ToolFailure> {
        Ok(self.dump.to_string())
    }
}

#[cfg(test)]
struct BrokenTool;

#[cfg(test)]
impl LayoutDumper for BrokenTool {
    fn dump_layouts(&self, unit: &str, _target: Option<&str>) -> Result<String, ToolFailure> {
        Err(ToolFailure {
            output: format!("error: expected declaration\n{}", unit),
        })
    }
}

#[test]
fn test_ingest_with_selects_target() {
    let tool = CannedTool {
        dump: "structs = {}\nstructs['a'] = Struct(0, {})\nstructs['b'] = Struct(0, {})\n",
    };

    let table = ingest_with(&tool, "struct a {}; struct b {};", Some("b")).unwrap();
    assert_eq!(table.names().collect::<Vec<_>>(), vec!["b"]);

    let table = ingest_with(&tool, "struct a {}; struct b {};", None).unwrap();
    assert_eq!(table.len(), 2);
}

#[test]
fn test_ingest_with_surfaces_tool_diagnostics() {
    let error = ingest_with(&BrokenTool, "struct x {", Some("x")).unwrap_err();

    assert_eq!(
        error.kind,
        IngestErrorKind::ToolInvocationFailed {
            output: "error: expected declaration\nstruct x {".into(),
        },
    );
    assert_eq!(error.location, None);
}
