use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::todo::{Todo, UNCATEGORIZED};

/// Distinct categories in use, for autocomplete suggestions.
///
/// Blank categories and the `uncategorized` sentinel are left out. Sorted
/// case-insensitively; case variants of one name put lowercase first.
pub fn category_suggestions(todos: &[Todo]) -> Vec<String> {
    let distinct: BTreeSet<&str> = todos
        .iter()
        .map(|t| t.category.trim())
        .filter(|c| !c.is_empty() && *c != UNCATEGORIZED)
        .collect();

    let mut categories: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    categories.sort_by(|a, b| compare_categories(a, b));
    categories
}

fn compare_categories(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}
