//! Per-file change frequency.

use std::collections::HashMap;

use churnlens_core::{CountRecord, CountTable};

/// Count how often each path occurs.
///
/// Produces one record per distinct path, ordered by first occurrence.
/// Blank entries (commits that touched no files) are not counted.
///
/// # Examples
///
/// ```
/// use churnlens_gitpulse::counting::count_file_changes;
///
/// let table = count_file_changes(["b.rs", "a.rs", "", "b.rs"]);
/// assert_eq!(table.keys(), vec!["b.rs", "a.rs"]);
/// assert_eq!(table.get("b.rs"), Some(2));
/// ```
pub fn count_file_changes<I, S>(paths: I) -> CountTable
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, u64)> = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if path.trim().is_empty() {
            continue;
        }
        match index.get(path) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(path.to_string(), counts.len());
                counts.push((path.to_string(), 1));
            }
        }
    }

    counts
        .into_iter()
        .map(|(path, count)| CountRecord::new(path, count))
        .collect()
}
