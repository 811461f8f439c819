//! Master election.
//!
//! The master is the longest stream. Durations within `tolerance` of the
//! longest count as equal and the lowest identifier among them wins. Unknown
//! durations count as 0, so they only win when nothing longer is known.
//!
//! Election is a pure function of the registry. Callers recompute it after
//! every registry mutation and compare against the previous master.

use crate::registry::StreamRegistry;
use crate::stream::StreamId;

/// Elect a master from the registry, `None` if it is empty.
pub fn select_master(registry: &StreamRegistry, tolerance: f64) -> Option<StreamId> {
    elect(registry.durations(), tolerance)
}

/// Elect a master from `(id, duration)` pairs.
pub fn elect<'a, I>(durations: I, tolerance: f64) -> Option<StreamId>
where
    I: IntoIterator<Item = (&'a StreamId, f64)>,
{
    let candidates: Vec<(&StreamId, f64)> = durations
        .into_iter()
        .map(|(id, duration)| (id, known_or_zero(duration)))
        .collect();
    let longest = candidates
        .iter()
        .map(|(_, duration)| *duration)
        .fold(0.0, f64::max);
    let tolerance = if tolerance.is_finite() { tolerance.max(0.0) } else { 0.0 };

    candidates
        .into_iter()
        .filter(|(_, duration)| longest - duration <= tolerance)
        .map(|(id, _)| id)
        .min()
        .cloned()
}

/// Every registered id except the master, in identifier order.
pub fn follower_order(registry: &StreamRegistry, master: Option<&StreamId>) -> Vec<StreamId> {
    let mut followers: Vec<StreamId> = registry
        .ids()
        .filter(|id| Some(*id) != master)
        .cloned()
        .collect();
    followers.sort();
    followers
}

fn known_or_zero(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        0.0
    }
}
