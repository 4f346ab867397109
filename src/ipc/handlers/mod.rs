pub mod core;
pub mod input;
pub mod preview;
pub mod report;
