// Seed groups for slicing two result collections
//
// One "all" group with the union of seeds, then one singleton group per seed.

use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Name of the group holding every seed
pub const ALL_GROUP: &str = "all";

/// A named subset of seeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub seeds: Vec<String>,
}

/// Order seeds numerically when both are integers, otherwise as text.
/// Integer seeds sort before non-integer ones.
pub fn compare_seeds(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Build the "all" group followed by one group per seed, seeds ascending
pub fn build_groups<'a, I>(seeds: I) -> Vec<Group>
where
    I: IntoIterator<Item = &'a str>,
{
    let unique: BTreeSet<&str> = seeds.into_iter().collect();
    let mut all: Vec<String> = unique.into_iter().map(str::to_string).collect();
    all.sort_by(|a, b| compare_seeds(a, b));

    let mut groups = Vec::with_capacity(all.len() + 1);
    groups.push(Group {
        name: ALL_GROUP.to_string(),
        seeds: all.clone(),
    });
    groups.extend(all.into_iter().map(|seed| Group {
        name: seed.clone(),
        seeds: vec![seed],
    }));
    groups
}
