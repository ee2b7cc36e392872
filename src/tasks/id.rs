use std::fmt::Debug;
use std::hash::Hash;

/// Deduplication key for a unit of work.
///
/// Equal identifiers denote the same logical task. `Debug` is only used to
/// label events and logs. Implemented for every type meeting the bounds.
pub trait Identifier: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> Identifier for T where T: Eq + Hash + Clone + Debug + Send + Sync + 'static {}
