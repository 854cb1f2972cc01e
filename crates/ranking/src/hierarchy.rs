use std::collections::BTreeMap;
use tracing::debug;

use crate::RankError;
use crate::priority::{Priorities, SortKey};

/// Level 0 holds the most connected concepts. Thresholds are
/// `max_total_degree * (1 - i / num_levels)` for `i` in `0..num_levels`.
pub fn hierarchy_levels(priorities: &Priorities, num_levels: usize) -> Result<BTreeMap<String, usize>, RankError> {
    if num_levels == 0 {
        return Err(RankError::InvalidLevels);
    }

    let levels: BTreeMap<String, usize> = priorities
        .sorted_priorities(SortKey::Total)
        .into_iter()
        .map(|p| {
            let level = level_for(p.total_degree, priorities.max_total_degree, num_levels);
            debug!(concept = %p.concept, total_degree = p.total_degree, level, "Assigned hierarchy level");
            (p.concept.clone(), level)
        })
        .collect();

    Ok(levels)
}

// Integer form of `total >= max * (n - i) / n`, so boundaries are exact.
fn level_for(total_degree: usize, max_total_degree: usize, num_levels: usize) -> usize {
    (0..num_levels)
        .find(|&i| total_degree * num_levels >= max_total_degree * (num_levels - i))
        .unwrap_or(num_levels - 1)
}

impl Priorities {
    pub fn hierarchy_levels(&self, num_levels: usize) -> Result<BTreeMap<String, usize>, RankError> {
        hierarchy_levels(self, num_levels)
    }
}
