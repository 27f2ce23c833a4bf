//! Overlap detection for the time periods of a schedule.
//!
//! Used by the schedule editor to flag conflicting periods. Period lists are
//! entered by hand and stay tiny, so a pairwise scan is fine.

use std::collections::BTreeSet;

use crate::time::TimeWindow;

/// Indices of every window that overlaps at least one other window.
///
/// Two windows overlap iff `start_i < end_j && start_j < end_i`. Windows whose
/// start does not strictly precede their end never overlap anything.
pub fn detect_overlaps(windows: &[TimeWindow]) -> BTreeSet<usize> {
    let mut overlapping = BTreeSet::new();

    for i in 0..windows.len() {
        if !windows[i].is_valid() {
            continue;
        }
        let (start_i, end_i) = windows[i].bounds();

        for j in (i + 1)..windows.len() {
            if !windows[j].is_valid() {
                continue;
            }
            let (start_j, end_j) = windows[j].bounds();

            if start_i < end_j && start_j < end_i {
                overlapping.insert(i);
                overlapping.insert(j);
            }
        }
    }

    overlapping
}

#[inline]
pub fn has_overlaps(windows: &[TimeWindow]) -> bool {
    !detect_overlaps(windows).is_empty()
}
