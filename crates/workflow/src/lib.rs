//! Creative workflow orchestrator. Sequences analysis, remediation,
//! variant fan-out and preview export over one in-memory creative.

pub mod notice;
pub mod orchestrator;
pub mod state;

pub use notice::{Notice, NoticeLevel};
pub use orchestrator::{RemediationOutcome, Workflow};
pub use state::{Phase, ResultView, WorkflowSnapshot};
