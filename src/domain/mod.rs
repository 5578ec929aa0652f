//! Domain types for git-seed.
//!
//! - Locations: the local, remote and temporary locations of a run
//! - SeedParams: the validated operator parameters
//! - Workflow: the step sequence and its progress

mod location;
mod params;
mod workflow;

pub use location::{local_location, remote_location, temp_location, temp_location_in, Locations};
pub use params::SeedParams;
pub use workflow::{SeedReport, SeedStep, StepState};
