pub mod accelerator;
pub mod collector;
pub mod platform;
pub mod probe;
pub mod process;
pub mod snapshot;
