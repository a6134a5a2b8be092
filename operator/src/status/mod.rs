//! Status computation: from a spec and workload signals to a status document.
//!
//! Everything in here is free of I/O, the controller feeds it what the store and the
//! workload probe report.
pub mod composer;
pub mod conditions;
pub mod extract;
pub mod generation;
pub mod health;
pub mod resolver;
pub mod topic_config;
