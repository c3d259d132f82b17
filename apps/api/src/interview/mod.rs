pub mod evaluator;
pub mod events;
pub mod generator;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod store;
pub mod topic;
