pub mod chunk;
pub mod job;
pub mod outcome;
pub mod params;
pub mod pending_state;
pub mod phase;
pub mod report;
