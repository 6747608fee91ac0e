use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::GateConfig;
use crate::error::GateResult;
use crate::stage::{GateContext, GateStage, StageDecision, StageResult};
use crate::stages::{ExpectationStage, ModeStage, StructuralStage};

/// Stage results of a gate run in which every stage passed or was skipped.
#[derive(Clone, Debug)]
pub struct GateReport {
    pub stage_results: Vec<StageResult>,
    pub elapsed: Duration,
}

impl GateReport {
    /// Names of the stages that were skipped.
    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.stage_results
            .iter()
            .filter(|r| matches!(r.decision, StageDecision::Skipped { .. }))
            .map(|r| r.stage_name.as_str())
    }
}

/// The validation gate: an ordered pipeline of stages every crate must pass
/// before it is committed.
pub struct ValidationGate {
    stages: Vec<Box<dyn GateStage>>,
    config: GateConfig,
}

impl ValidationGate {
    /// Create a gate with an empty pipeline.
    pub fn new(config: GateConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// Structural -> Expectations (when enabled) -> Mode (when enabled)
    pub fn with_default_stages(config: GateConfig) -> Self {
        let expectations = config.expectations_location().map(str::to_string);
        let mode = config.mode_location().map(str::to_string);
        let mut gate = Self::new(config);
        gate.add_stage(Box::new(StructuralStage));
        if let Some(location) = expectations {
            gate.add_stage(Box::new(ExpectationStage::from_location(location)));
        }
        if let Some(location) = mode {
            gate.add_stage(Box::new(ModeStage::from_location(location)));
        }
        gate
    }

    pub fn add_stage(&mut self, stage: Box<dyn GateStage>) {
        self.stages.push(stage);
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order.
    ///
    /// The pipeline is fail-fast: the first stage that returns an error stops
    /// evaluation and that error is returned as is.
    pub async fn evaluate(&self, ctx: &GateContext<'_>) -> GateResult<GateReport> {
        let pipeline_start = Instant::now();
        let mut stage_results = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let stage_start = Instant::now();
            let outcome = stage.evaluate(ctx).await;
            let elapsed = stage_start.elapsed();

            match outcome {
                Ok(decision) => {
                    match &decision {
                        StageDecision::Pass => {
                            debug!(stage = stage.name(), ?elapsed, "stage passed")
                        }
                        StageDecision::Skipped { reason } => {
                            warn!(stage = stage.name(), %reason, "stage skipped")
                        }
                    }
                    stage_results.push(StageResult {
                        stage_name: stage.name().to_string(),
                        decision,
                        elapsed,
                    });
                }
                Err(e) => {
                    info!(
                        object = ctx.object_id,
                        stage = stage.name(),
                        problems = e.messages().len(),
                        ?elapsed,
                        "stage rejected crate"
                    );
                    return Err(e);
                }
            }
        }

        Ok(GateReport {
            stage_results,
            elapsed: pipeline_start.elapsed(),
        })
    }
}
