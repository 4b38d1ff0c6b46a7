// Gateway module for runtime - follows the Train Station Pattern

mod non_interactive;
mod orchestrator;

pub use non_interactive::{
    format_result, ExecutionMetadata, IngestResult, NonInteractiveResult, NonInteractiveRunner,
};
pub use orchestrator::{apply_overrides, Orchestrator};
