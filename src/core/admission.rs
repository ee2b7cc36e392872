//! # Admission outcome
//!
//! Every submission for an identifier ends in one of three outcomes.
//!
//! ## Variants
//! - `Staged`: no entry was pending for the identifier; the work now waits for the next drain.
//! - `Collapsed`: an entry is already pending; the new work is **discarded** and the pending
//!   one will run instead. This is success, not an error.
//! - `Rejected`: the staging area was full (non-blocking submission only); nothing was
//!   recorded for the identifier.
//!
//! ## Invariants
//! - At most one entry per identifier is pending at any time.
//! - A blocking submission never ends in `Rejected`.

/// Result of offering a unit of work to the staging area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Work placed into the staging area.
    Staged,

    /// Identifier already pending; work discarded.
    Collapsed,

    /// Staging area full; work discarded and identifier not marked.
    Rejected,
}

impl Admission {
    /// True for `Staged` and `Collapsed`: work for the identifier will run.
    #[inline]
    pub fn is_accepted(self) -> bool {
        !matches!(self, Admission::Rejected)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            Admission::Staged => "staged",
            Admission::Collapsed => "collapsed",
            Admission::Rejected => "rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_counts_as_accepted() {
        assert!(Admission::Staged.is_accepted());
        assert!(Admission::Collapsed.is_accepted());
        assert!(!Admission::Rejected.is_accepted());
    }
}
