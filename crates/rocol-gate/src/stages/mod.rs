//! Built-in gate stages.

pub mod expectations;
pub mod mode;
pub mod structural;

pub use expectations::ExpectationStage;
pub use mode::ModeStage;
pub use structural::StructuralStage;
