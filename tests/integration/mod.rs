//! Integration tests for the sidekick assistant

mod config_loading;
mod context_flow;
mod end_to_end;
mod orchestrator_pipeline;
mod test_utils;
