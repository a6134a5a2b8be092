//! Tracks which generation of a spec a reconcile evaluates.

/// Generation captured at the start of a reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Reconcile against this generation and stamp it as `observedGeneration`.
    Current(i64),
    /// The cached object is older than the status already written.
    Stale {
        /// Generation of the cached read.
        read: i64,
        /// Generation already reported in the status.
        observed: i64,
    },
}

/// Capture the generation of a read object.
///
/// An unset generation counts as zero. The reported generation never moves backward,
/// so a read older than the previously observed generation is stale.
pub fn capture(generation: Option<i64>, observed_generation: Option<i64>) -> Capture {
    let read = generation.unwrap_or(0);
    match observed_generation {
        Some(observed) if observed > read => Capture::Stale { read, observed },
        _ => Capture::Current(read),
    }
}
