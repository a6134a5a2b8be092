//! Provides API for the operator and related tooling.
#![warn(missing_docs)]

/// Controller reconciling the status of every managed kind.
#[cfg(feature = "controller")]
pub mod controller;
pub mod crd;
/// Labels module for the labels and annotations shared with the workloads.
#[cfg(feature = "controller")]
pub(crate) mod labels;
#[cfg(feature = "controller")]
pub mod status;
#[cfg(feature = "controller")]
pub mod store;
/// Utils module for shared utility functions.
#[cfg(feature = "controller")]
pub mod utils;
#[cfg(feature = "controller")]
pub mod workload;

/// Name of the operator, used as meter name.
#[cfg(feature = "controller")]
const CONTROLLER_NAME: &str = "kafka-operator";
