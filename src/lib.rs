pub mod counter;
pub mod predictions;
pub mod progress;
pub mod resolve;
pub mod schedule;
