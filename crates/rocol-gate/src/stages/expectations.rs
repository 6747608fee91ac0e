//! Expectation workbook checks.
//!
//! A workbook holds one sheet per check kind. Row 1 of every sheet names the
//! columns; names are matched case-insensitively. Two kinds are recognized:
//!
//! - `types`: columns `crate`, `type`, `count`. The exact number of entities
//!   carrying `type`. A `crate` of `all` (or empty) applies to every crate,
//!   anything else only to the crate whose root id it names.
//! - `properties`: columns `entity`, `property`, `count`, `value`. Either the
//!   exact number of values of `property`, or the expected first value.
//!   Entity `./` means the root dataset.
//!
//! Sheets with other names are ignored.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rocol_graph::{as_reference, CrateGraph, Entity};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{GateError, GateResult};
use crate::stage::{GateContext, GateStage, StageDecision};

// ---------------------------------------------------------------------------
// Workbook model
// ---------------------------------------------------------------------------

/// One spreadsheet cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Parse raw cell text: blank is `Empty`, numeric text is a `Number`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::Empty;
        }
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(raw.to_string()),
        }
    }

    /// Display text of the cell; empty for an empty cell.
    pub fn text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The cell as a count: `None` when empty, an error for anything that
    /// is not a non-negative whole number.
    fn as_count(&self) -> Result<Option<usize>, ()> {
        match self {
            Self::Empty => Ok(None),
            Self::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Ok(Some(*n as usize)),
            _ => Err(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// A named grid of cells. Row 0 is the header row.
#[derive(Clone, Debug, Default)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Data rows keyed by lowercased header. Rows with no values are dropped.
    pub fn records(&self) -> Vec<Record> {
        let Some((header, body)) = self.rows.split_first() else {
            return Vec::new();
        };
        let keys: Vec<String> = header
            .iter()
            .map(|c| c.text().trim().to_lowercase())
            .collect();
        body.iter()
            .filter(|row| row.iter().any(|c| !c.is_empty()))
            .map(|row| {
                let cells = keys
                    .iter()
                    .zip(row.iter())
                    .filter(|(k, _)| !k.is_empty())
                    .map(|(k, c)| (k.clone(), c.clone()))
                    .collect();
                Record { cells }
            })
            .collect()
    }
}

/// One data row with cells addressed by column name.
#[derive(Clone, Debug)]
pub struct Record {
    cells: HashMap<String, CellValue>,
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl Record {
    pub fn cell(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&EMPTY_CELL)
    }

    pub fn text(&self, column: &str) -> String {
        self.cell(column).text()
    }
}

/// Source of expectation sheets.
pub trait Workbook: Send + Sync {
    /// Where the workbook came from, for messages.
    fn location(&self) -> &str;

    fn sheets(&self) -> &[Sheet];
}

/// A directory of CSV files, one sheet per `<sheet>.csv`. A path to a single
/// CSV file is a one-sheet workbook.
#[derive(Clone, Debug)]
pub struct CsvWorkbook {
    location: String,
    sheets: Vec<Sheet>,
}

impl CsvWorkbook {
    pub fn open(location: &str) -> GateResult<Self> {
        let path = Path::new(location);
        let fail = |reason: String| GateError::Workbook {
            location: location.to_string(),
            reason,
        };

        let mut files = Vec::new();
        if path.is_dir() {
            for entry in std::fs::read_dir(path).map_err(|e| fail(e.to_string()))? {
                let p = entry.map_err(|e| fail(e.to_string()))?.path();
                if p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
                    files.push(p);
                }
            }
            files.sort();
        } else if path.is_file() {
            files.push(path.to_path_buf());
        } else {
            return Err(fail("no such file or directory".into()));
        }

        let mut sheets = Vec::with_capacity(files.len());
        for file in files {
            let name = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&file)
                .map_err(|e| fail(e.to_string()))?;
            let mut rows = Vec::new();
            for record in reader.records() {
                let record = record.map_err(|e| fail(e.to_string()))?;
                rows.push(record.iter().map(CellValue::parse).collect());
            }
            debug!(sheet = %name, rows = rows.len(), "read sheet");
            sheets.push(Sheet::new(name, rows));
        }
        Ok(Self {
            location: location.to_string(),
            sheets,
        })
    }
}

impl Workbook for CsvWorkbook {
    fn location(&self) -> &str {
        &self.location
    }

    fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }
}

/// Workbook built in code.
#[derive(Clone, Debug, Default)]
pub struct MemoryWorkbook {
    location: String,
    sheets: Vec<Sheet>,
}

impl MemoryWorkbook {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            sheets: Vec::new(),
        }
    }

    /// Add a sheet from rows of raw cell text, header first.
    pub fn with_sheet(mut self, name: &str, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|c| CellValue::parse(c)).collect())
            .collect();
        self.sheets.push(Sheet::new(name, rows));
        self
    }
}

impl Workbook for MemoryWorkbook {
    fn location(&self) -> &str {
        &self.location
    }

    fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }
}

// ---------------------------------------------------------------------------
// Sheet kinds
// ---------------------------------------------------------------------------

/// A sheet the checker does not know how to read.
#[derive(Debug)]
struct FormatError(String);

/// Recognized sheet kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SheetKind {
    Types,
    Properties,
}

impl SheetKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "types" => Some(Self::Types),
            "properties" => Some(Self::Properties),
            _ => None,
        }
    }

    fn check(
        self,
        sheet: &Sheet,
        graph: &CrateGraph,
        errors: &mut Vec<String>,
    ) -> Result<(), FormatError> {
        match self {
            Self::Types => check_types(sheet, graph, errors),
            Self::Properties => check_properties(sheet, graph, errors),
        }
    }
}

fn check_types(sheet: &Sheet, graph: &CrateGraph, errors: &mut Vec<String>) -> Result<(), FormatError> {
    let mut expected: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for row in sheet.records() {
        let ty = row.text("type");
        if ty.is_empty() {
            continue;
        }
        let mut scope = row.text("crate");
        if scope.is_empty() {
            scope = "all".into();
        }
        let count = row
            .cell("count")
            .as_count()
            .ok()
            .flatten()
            .ok_or_else(|| FormatError(format!("type {ty} has no usable count")))?;
        expected.entry(scope).or_default().insert(ty, count);
    }

    let mut actual: HashMap<&str, usize> = HashMap::new();
    for entity in graph.entities() {
        for t in entity.types() {
            *actual.entry(t.as_str()).or_default() += 1;
        }
    }

    let mut scopes = vec!["all"];
    if graph.root_id() != "all" {
        scopes.push(graph.root_id());
    }
    for scope in scopes {
        let Some(types) = expected.get(scope) else {
            continue;
        };
        for (ty, &count) in types {
            let real = actual.get(ty.as_str()).copied().unwrap_or(0);
            if real != count {
                errors.push(format!(
                    "[validation] Entities {ty} expected count is {count} but actual is {real}"
                ));
            }
        }
    }
    Ok(())
}

enum Expected {
    Count(usize),
    Value(String),
}

fn check_properties(
    sheet: &Sheet,
    graph: &CrateGraph,
    errors: &mut Vec<String>,
) -> Result<(), FormatError> {
    let mut expected: BTreeMap<String, BTreeMap<String, Expected>> = BTreeMap::new();
    for row in sheet.records() {
        let entity = row.text("entity");
        let property = row.text("property");
        if entity.is_empty() || property.is_empty() {
            continue;
        }
        let count = row
            .cell("count")
            .as_count()
            .map_err(|()| FormatError(format!("{entity}.{property} has an invalid count")))?;
        let value = row.text("value");
        let check = match count {
            Some(n) => Expected::Count(n),
            None if !value.is_empty() => Expected::Value(value),
            None => continue,
        };
        expected.entry(entity).or_default().insert(property, check);
    }

    for (entity_id, props) in &expected {
        let entity: &Entity = if entity_id == "./" {
            graph.root()
        } else {
            graph
                .get(entity_id)
                .ok_or_else(|| FormatError(format!("entity {entity_id} not found")))?
        };
        for (prop, check) in props {
            let values = entity.get(prop);
            match check {
                Expected::Count(n) => {
                    if values.len() != *n {
                        errors.push(format!(
                            "[validation][{entity_id}.{prop}] Expected value count of {n} but got {}",
                            values.len()
                        ));
                    }
                }
                Expected::Value(v) => {
                    let first = values.first().map(display_value).unwrap_or_default();
                    if &first != v {
                        errors.push(format!(
                            "[validation][{entity_id}.{prop}] Expected value '{v}' but got '{first}'"
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}

fn display_value(value: &Value) -> String {
    if let Some(id) = as_reference(value) {
        return id.to_string();
    }
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Run every recognized sheet of `workbook` against `graph` and return the
/// collected messages.
pub fn check_workbook(workbook: &dyn Workbook, graph: &CrateGraph) -> Vec<String> {
    let mut errors = Vec::new();
    for sheet in workbook.sheets() {
        let Some(kind) = SheetKind::from_name(&sheet.name) else {
            debug!(sheet = %sheet.name, "ignoring unrecognized sheet");
            continue;
        };
        if let Err(FormatError(reason)) = kind.check(sheet, graph, &mut errors) {
            warn!(sheet = %sheet.name, %reason, "worksheet format error");
            errors.push(format!(
                "[validation] Please check {} file. Format error in worksheet {}",
                workbook.location(),
                sheet.name
            ));
        }
    }
    errors
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

enum WorkbookSource {
    Location(String),
    Loaded(Arc<dyn Workbook>),
}

/// Expectation workbook stage.
pub struct ExpectationStage {
    source: WorkbookSource,
}

impl ExpectationStage {
    /// Read the workbook from `location` on every evaluation.
    pub fn from_location(location: impl Into<String>) -> Self {
        Self {
            source: WorkbookSource::Location(location.into()),
        }
    }

    pub fn from_workbook(workbook: Arc<dyn Workbook>) -> Self {
        Self {
            source: WorkbookSource::Loaded(workbook),
        }
    }
}

#[async_trait]
impl GateStage for ExpectationStage {
    fn name(&self) -> &str {
        "expectations"
    }

    async fn evaluate(&self, ctx: &GateContext<'_>) -> GateResult<StageDecision> {
        let workbook: Arc<dyn Workbook> = match &self.source {
            WorkbookSource::Location(location) => Arc::new(CsvWorkbook::open(location)?),
            WorkbookSource::Loaded(wb) => wb.clone(),
        };
        info!(workbook = workbook.location(), "validating crate against expectation workbook");

        let messages = check_workbook(workbook.as_ref(), ctx.graph);
        if messages.is_empty() {
            Ok(StageDecision::Pass)
        } else {
            Err(GateError::ExpectationMismatch {
                location: workbook.location().to_string(),
                messages,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocol_graph::FileIndex;
    use serde_json::json;

    fn graph_with_files(n: usize) -> CrateGraph {
        let mut g = CrateGraph::new();
        g.root_mut().set("name", vec![json!("Demo")]);
        let root = g.root_id().to_string();
        for i in 0..n {
            g.push_entity(&root, "hasPart", Entity::new(format!("f{i}.txt")).with_type("File"))
                .unwrap();
        }
        g
    }

    fn types_sheet(count: &str) -> MemoryWorkbook {
        MemoryWorkbook::new("checks").with_sheet(
            "types",
            &[&["Crate", "Type", "Count"], &["all", "File", count]],
        )
    }

    #[test]
    fn cell_parsing() {
        assert_eq!(CellValue::parse("  "), CellValue::Empty);
        assert_eq!(CellValue::parse("3"), CellValue::Number(3.0));
        assert_eq!(CellValue::parse("Demo"), CellValue::Text("Demo".into()));
        assert_eq!(CellValue::Number(3.0).text(), "3");
    }

    #[test]
    fn type_count_matches() {
        assert!(check_workbook(&types_sheet("3"), &graph_with_files(3)).is_empty());
    }

    #[test]
    fn type_count_is_exact() {
        let errors = check_workbook(&types_sheet("3"), &graph_with_files(2));
        assert_eq!(
            errors,
            vec!["[validation] Entities File expected count is 3 but actual is 2".to_string()]
        );
        // more than expected also fails
        assert_eq!(check_workbook(&types_sheet("3"), &graph_with_files(4)).len(), 1);
    }

    #[test]
    fn empty_scope_means_all_and_other_scopes_are_ignored() {
        let wb = MemoryWorkbook::new("checks").with_sheet(
            "types",
            &[
                &["crate", "type", "count"],
                &["", "Dataset", "1"],
                &["arcp://name,ns/other", "File", "99"],
            ],
        );
        assert!(check_workbook(&wb, &graph_with_files(1)).is_empty());
    }

    #[test]
    fn scope_for_current_root_applies() {
        let mut g = graph_with_files(1);
        g.set_root_id("arcp://name,ns/c1").unwrap();
        let wb = MemoryWorkbook::new("checks").with_sheet(
            "types",
            &[&["crate", "type", "count"], &["arcp://name,ns/c1", "File", "2"]],
        );
        assert_eq!(check_workbook(&wb, &g).len(), 1);
    }

    #[test]
    fn property_value_compares_first_element_only() {
        let mut g = graph_with_files(0);
        g.root_mut().push("name", json!("Second"));
        let wb = MemoryWorkbook::new("checks").with_sheet(
            "properties",
            &[&["Entity", "Property", "Count", "Value"], &["./", "name", "", "Demo"]],
        );
        assert!(check_workbook(&wb, &g).is_empty());

        let wb = MemoryWorkbook::new("checks").with_sheet(
            "properties",
            &[&["entity", "property", "count", "value"], &["./", "name", "", "Other"]],
        );
        assert_eq!(
            check_workbook(&wb, &g),
            vec!["[validation][./.name] Expected value 'Other' but got 'Demo'".to_string()]
        );
    }

    #[test]
    fn property_count_ignores_value() {
        let g = graph_with_files(2);
        let wb = MemoryWorkbook::new("checks").with_sheet(
            "properties",
            &[
                &["entity", "property", "count", "value"],
                &["./", "hasPart", "2", "ignored"],
                &["./", "author", "1", ""],
            ],
        );
        assert_eq!(
            check_workbook(&wb, &g),
            vec!["[validation][./.author] Expected value count of 1 but got 0".to_string()]
        );
    }

    #[test]
    fn broken_sheet_yields_one_format_error() {
        let wb = MemoryWorkbook::new("checks.xlsx")
            .with_sheet(
                "properties",
                &[&["entity", "property", "count"], &["#missing", "name", "1"]],
            )
            .with_sheet("notes", &[&["anything"], &["goes"]]);
        assert_eq!(
            check_workbook(&wb, &graph_with_files(0)),
            vec!["[validation] Please check checks.xlsx file. Format error in worksheet properties"
                .to_string()]
        );
    }

    #[test]
    fn csv_directory_is_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("types.csv"), "crate,type,count\nall,File,2\n").unwrap();
        std::fs::write(dir.path().join("README.txt"), "not a sheet").unwrap();
        let location = dir.path().to_string_lossy().into_owned();
        let wb = CsvWorkbook::open(&location).unwrap();
        assert_eq!(wb.sheets().len(), 1);
        assert_eq!(wb.sheets()[0].name, "types");
        assert!(check_workbook(&wb, &graph_with_files(2)).is_empty());
    }

    #[test]
    fn missing_workbook_is_an_error() {
        assert!(matches!(
            CsvWorkbook::open("/definitely/not/here").unwrap_err(),
            GateError::Workbook { .. }
        ));
    }

    #[tokio::test]
    async fn stage_aggregates_messages() {
        let wb = MemoryWorkbook::new("checks")
            .with_sheet("types", &[&["crate", "type", "count"], &["all", "File", "5"]])
            .with_sheet(
                "properties",
                &[&["entity", "property", "value"], &["./", "name", "Other"]],
            );
        let stage = ExpectationStage::from_workbook(Arc::new(wb));
        let g = graph_with_files(1);
        let files = FileIndex::new();
        let err = stage
            .evaluate(&GateContext::new("x", &g, &files))
            .await
            .unwrap_err();
        match err {
            GateError::ExpectationMismatch { messages, .. } => assert_eq!(messages.len(), 2),
            other => panic!("unexpected error {other}"),
        }
    }
}
