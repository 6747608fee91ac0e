//! Validation gate for rocol.
//!
//! Every crate must pass through the gate before it is committed. The gate
//! runs a configurable pipeline of stages (structural, expectation workbook,
//! mode) and stops at the first stage that rejects the crate. A rejecting
//! stage reports every problem it found, not just the first.
//!
//! # Quick Start
//!
//! ```rust
//! use rocol_gate::{GateConfig, GateContext, ValidationGate};
//! use rocol_graph::{CrateGraph, FileIndex};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let gate = ValidationGate::with_default_stages(GateConfig::default());
//! let graph = CrateGraph::new();
//! let files = FileIndex::new();
//! let report = rt
//!     .block_on(gate.evaluate(&GateContext::new("arcp://name,ns/x", &graph, &files)))
//!     .unwrap();
//! assert_eq!(report.stage_results.len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod stage;
pub mod stages;

pub use config::{GateConfig, ValidatorSetting, DEFAULT_EXPECTATIONS, DEFAULT_MODE};
pub use error::{GateError, GateResult};
pub use gate::{GateReport, ValidationGate};
pub use stage::{GateContext, GateStage, StageDecision, StageResult};
pub use stages::expectations::{
    check_workbook, CellValue, CsvWorkbook, MemoryWorkbook, Sheet, SheetKind, Workbook,
};
pub use stages::mode::{check_mode, load_mode, ModeDefinition, ModeFinding, ModeInput, ModeStage};
pub use stages::{ExpectationStage, StructuralStage};
