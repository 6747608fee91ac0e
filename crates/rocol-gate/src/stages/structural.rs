use async_trait::async_trait;
use rocol_graph::validate;

use crate::error::{GateError, GateResult};
use crate::stage::{GateContext, GateStage, StageDecision};

/// Structural validation stage.
///
/// Runs the description graph's own consistency checks against the file
/// index and fails with one message per error entry.
pub struct StructuralStage;

#[async_trait]
impl GateStage for StructuralStage {
    fn name(&self) -> &str {
        "structural"
    }

    async fn evaluate(&self, ctx: &GateContext<'_>) -> GateResult<StageDecision> {
        let messages: Vec<String> = validate(ctx.graph, ctx.files)
            .iter()
            .filter(|r| r.is_error())
            .map(|r| {
                format!(
                    "Problem while adding to repository for {} error: {r}",
                    ctx.object_id
                )
            })
            .collect();

        if messages.is_empty() {
            Ok(StageDecision::Pass)
        } else {
            Err(GateError::GraphLink {
                object_id: ctx.object_id.to_string(),
                messages,
            })
        }
    }
}
