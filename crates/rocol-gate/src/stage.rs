use std::time::Duration;

use async_trait::async_trait;
use rocol_graph::{CrateGraph, FileIndex};

use crate::error::GateResult;

// ---------------------------------------------------------------------------
// StageDecision
// ---------------------------------------------------------------------------

/// Outcome of a stage that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageDecision {
    /// Every check ran and passed.
    Pass,
    /// The stage had nothing to check against, e.g. the mode definition was
    /// not available.
    Skipped { reason: String },
}

// ---------------------------------------------------------------------------
// StageResult
// ---------------------------------------------------------------------------

/// Recorded result from a completed stage evaluation.
#[derive(Clone, Debug)]
pub struct StageResult {
    pub stage_name: String,
    pub decision: StageDecision,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// GateContext
// ---------------------------------------------------------------------------

/// What every stage gets to look at.
pub struct GateContext<'a> {
    /// Identifier of the object being committed.
    pub object_id: &'a str,
    pub graph: &'a CrateGraph,
    /// Every file that will be part of the object, and whether it exists.
    pub files: &'a FileIndex,
}

impl<'a> GateContext<'a> {
    pub fn new(object_id: &'a str, graph: &'a CrateGraph, files: &'a FileIndex) -> Self {
        Self {
            object_id,
            graph,
            files,
        }
    }
}

// ---------------------------------------------------------------------------
// GateStage trait
// ---------------------------------------------------------------------------

/// A single evaluation stage in the gate pipeline.
///
/// A stage returns `Err` with an aggregated error when the crate must not be
/// committed. Stages are `Send + Sync` so they can be stored in a
/// `Vec<Box<dyn GateStage>>`.
#[async_trait]
pub trait GateStage: Send + Sync {
    /// Short stage name, e.g. "structural".
    fn name(&self) -> &str;

    async fn evaluate(&self, ctx: &GateContext<'_>) -> GateResult<StageDecision>;
}
