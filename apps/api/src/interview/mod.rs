pub mod calibration;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod report;
pub mod sequencer;
