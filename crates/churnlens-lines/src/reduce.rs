//! Row reduction: exact-duplicate removal and max-count-per-line selection.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::extract::RawRow;

/// Drop rows whose `(line, count)` pair already appeared earlier.
///
/// The first occurrence is kept and input order is preserved.
///
/// # Examples
///
/// ```
/// use churnlens_lines::extract::RawRow;
/// use churnlens_lines::reduce::remove_duplicates;
///
/// let rows = vec![RawRow::new(1, "L2", 2), RawRow::new(2, "L2", 2)];
/// assert_eq!(remove_duplicates(rows), vec![RawRow::new(1, "L2", 2)]);
/// ```
pub fn remove_duplicates(rows: Vec<RawRow>) -> Vec<RawRow> {
    let mut seen: HashSet<(String, u64)> = HashSet::new();
    rows.into_iter()
        .filter(|r| seen.insert((r.line.clone(), r.count)))
        .collect()
}

/// Keep one row per line: the one with the highest count.
///
/// When several rows share the maximum, the earliest one in input order
/// wins. Lines appear in the order of their first occurrence.
///
/// # Examples
///
/// ```
/// use churnlens_lines::extract::RawRow;
/// use churnlens_lines::reduce::keep_max_per_key;
///
/// let rows = vec![
///     RawRow::new(1, "L1", 5),
///     RawRow::new(2, "L1", 9),
///     RawRow::new(3, "L1", 3),
/// ];
/// assert_eq!(keep_max_per_key(rows), vec![RawRow::new(2, "L1", 9)]);
/// ```
pub fn keep_max_per_key(rows: Vec<RawRow>) -> Vec<RawRow> {
    let mut slot: HashMap<String, usize> = HashMap::new();
    let mut best: Vec<RawRow> = Vec::new();

    for row in rows {
        match slot.get(&row.line) {
            Some(&idx) => {
                if row.count > best[idx].count {
                    best[idx] = row;
                }
            }
            None => {
                slot.insert(row.line.clone(), best.len());
                best.push(row);
            }
        }
    }

    best
}

/// Deduplicate, then keep the highest count per line.
///
/// Idempotent: reducing an already reduced table returns it unchanged.
pub fn reduce(rows: Vec<RawRow>) -> Vec<RawRow> {
    let before = rows.len();
    let reduced = keep_max_per_key(remove_duplicates(rows));
    debug!(before, after = reduced.len(), "reduced line rows");
    reduced
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rows(entries: &[(&str, u64)]) -> Vec<RawRow> {
        entries
            .iter()
            .enumerate()
            .map(|(i, (line, count))| RawRow::new(i + 1, *line, *count))
            .collect()
    }

    fn pairs(rows: &[RawRow]) -> Vec<(&str, u64)> {
        rows.iter().map(|r| (r.line.as_str(), r.count)).collect()
    }

    #[test]
    fn duplicates_are_removed_keeping_first() {
        let out = remove_duplicates(rows(&[("L1", 5), ("L2", 2), ("L1", 5), ("L2", 2)]));
        assert_eq!(out, vec![RawRow::new(1, "L1", 5), RawRow::new(2, "L2", 2)]);
    }

    #[test]
    fn same_line_different_count_is_not_a_duplicate() {
        let out = remove_duplicates(rows(&[("L1", 5), ("L1", 6)]));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn max_per_key_example() {
        let out = keep_max_per_key(rows(&[("L1", 5), ("L1", 9), ("L1", 3)]));
        assert_eq!(pairs(&out), vec![("L1", 9)]);
    }

    #[test]
    fn ties_keep_first_occurrence() {
        let out = keep_max_per_key(rows(&[("L1", 4), ("L1", 9), ("L2", 1), ("L1", 9)]));
        assert_eq!(out[0], RawRow::new(2, "L1", 9));
        assert_eq!(out[1], RawRow::new(3, "L2", 1));
    }

    #[test]
    fn lines_keep_first_appearance_order() {
        let out = keep_max_per_key(rows(&[("L3", 1), ("L1", 1), ("L3", 8), ("L2", 1)]));
        assert_eq!(pairs(&out), vec![("L3", 8), ("L1", 1), ("L2", 1)]);
    }

    #[test]
    fn end_to_end_example_reduces_to_three_lines() {
        let out = reduce(rows(&[
            ("L1", 5),
            ("L1", 9),
            ("L2", 2),
            ("L2", 2),
            ("L3", 100),
        ]));
        assert_eq!(pairs(&out), vec![("L1", 9), ("L2", 2), ("L3", 100)]);
    }

    #[test]
    fn empty_input_reduces_to_empty() {
        assert!(reduce(Vec::new()).is_empty());
    }

    proptest! {
        #[test]
        fn reduce_is_idempotent(entries in prop::collection::vec((0u8..8, 0u64..20), 0..80)) {
            let input: Vec<RawRow> = entries
                .iter()
                .enumerate()
                .map(|(i, (line, count))| RawRow::new(i + 1, format!("L{line}"), *count))
                .collect();
            let once = reduce(input);
            let twice = reduce(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn reduce_leaves_one_row_per_line_at_its_max(
            entries in prop::collection::vec((0u8..8, 0u64..20), 1..80),
        ) {
            let input: Vec<RawRow> = entries
                .iter()
                .enumerate()
                .map(|(i, (line, count))| RawRow::new(i + 1, format!("L{line}"), *count))
                .collect();
            let out = reduce(input.clone());
            let mut lines: Vec<&str> = out.iter().map(|r| r.line.as_str()).collect();
            lines.sort_unstable();
            lines.dedup();
            prop_assert_eq!(lines.len(), out.len());
            for r in &out {
                let max = input.iter().filter(|i| i.line == r.line).map(|i| i.count).max();
                prop_assert_eq!(Some(r.count), max);
            }
        }
    }
}
