//! Small helpers shared by the simulation and the CLI.

pub mod timer;
