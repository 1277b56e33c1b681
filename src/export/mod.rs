pub(crate) mod orchestrator;
pub(crate) mod progress;
pub(crate) mod session;
