//! Solved-board asset files for playback.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Canonical solution strings grouped by board size, as shipped to the
/// playback path in JSON form.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolutionBank {
    by_size: BTreeMap<usize, Vec<String>>,
}

impl SolutionBank {
    pub fn new() -> Self {
        SolutionBank::default()
    }

    /// Record a solution for size `n`; duplicates are dropped.
    pub fn insert(&mut self, n: usize, solution: impl Into<String>) {
        let solution = solution.into();
        let bucket = self.by_size.entry(n).or_default();
        if !bucket.contains(&solution) {
            bucket.push(solution);
        }
    }

    /// The recorded solutions for size `n`, in insertion order.
    pub fn solutions(&self, n: usize) -> &[String] {
        self.by_size.get(&n).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Board sizes with at least one recorded solution.
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_size.keys().copied()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let mut bank = SolutionBank::new();
        bank.insert(2, "0110001110001000");
        bank.insert(2, "0110001110001000");
        bank.insert(3, "011000110010111000010100101010000001");

        assert_eq!(bank.solutions(2).len(), 1);
        assert_eq!(bank.sizes().collect::<Vec<_>>(), vec![2, 3]);

        let json = bank.to_json().unwrap();
        assert_eq!(SolutionBank::from_json(&json).unwrap(), bank);
    }

    #[test]
    fn missing_sizes_are_just_empty() {
        let bank = SolutionBank::new();
        assert!(bank.solutions(5).is_empty());
    }
}
