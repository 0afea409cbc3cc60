use std::collections::BTreeMap;

use super::RecordId;
use super::todo::Todo;

/// Todos sharing one category, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<'a> {
    pub category: &'a str,
    pub todos: Vec<&'a Todo>,
}

/// Todos ordered by position. Equal positions keep their list order.
pub fn sorted_by_position(todos: &[Todo]) -> Vec<&Todo> {
    let mut sorted: Vec<&Todo> = todos.iter().collect();
    sorted.sort_by_key(|t| t.position());
    sorted
}

/// Groups the position-sorted list by category. Groups appear in the order
/// their category first occurs; each group keeps position order.
pub fn group_by_category(todos: &[Todo]) -> Vec<CategoryGroup<'_>> {
    let mut groups: Vec<CategoryGroup<'_>> = Vec::new();
    for todo in sorted_by_position(todos) {
        match groups.iter_mut().find(|g| g.category == todo.category) {
            Some(group) => group.todos.push(todo),
            None => groups.push(CategoryGroup {
                category: &todo.category,
                todos: vec![todo],
            }),
        }
    }
    groups
}

/// Moves `moved` to the index currently held by `target` and renumbers every
/// todo so position equals its index.
///
/// Returns `None` when either id is unknown or both are the same todo; the
/// input is then left as it was.
pub fn reordered(todos: &[Todo], moved: &RecordId, target: &RecordId) -> Option<Vec<Todo>> {
    if moved == target {
        return None;
    }
    let mut ordered: Vec<Todo> = sorted_by_position(todos).into_iter().cloned().collect();
    let from = ordered.iter().position(|t| &t.id == moved)?;
    let to = ordered.iter().position(|t| &t.id == target)?;

    let item = ordered.remove(from);
    ordered.insert(to, item);
    renumber(&mut ordered);
    Some(ordered)
}

/// Sets each position to its index in the slice.
pub fn renumber(todos: &mut [Todo]) {
    for (index, todo) in todos.iter_mut().enumerate() {
        todo.position = Some(index as i64);
    }
}

/// How far the stored positions are from a dense `0..n` numbering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionReport {
    /// Inclusive `(from, to)` runs of positions absent between 0 (or the
    /// smallest stored position, if negative) and the largest stored one.
    pub gaps: Vec<(i64, i64)>,
    /// Positions held by more than one todo, with the ids holding them.
    pub duplicates: Vec<(i64, Vec<RecordId>)>,
    /// Todos stored without any position.
    pub missing: Vec<RecordId>,
}

impl PositionReport {
    pub fn is_dense(&self) -> bool {
        self.gaps.is_empty() && self.duplicates.is_empty() && self.missing.is_empty()
    }
}

pub fn position_report(todos: &[Todo]) -> PositionReport {
    let mut report = PositionReport::default();
    let mut holders: BTreeMap<i64, Vec<RecordId>> = BTreeMap::new();

    for todo in todos {
        match todo.position {
            Some(p) => holders.entry(p).or_default().push(todo.id.clone()),
            None => report.missing.push(todo.id.clone()),
        }
    }

    if let Some(&first) = holders.keys().next() {
        let mut expected = first.min(0);
        for &position in holders.keys() {
            if position > expected {
                report.gaps.push((expected, position - 1));
            }
            match position.checked_add(1) {
                Some(next) => expected = next,
                None => break,
            }
        }
    }

    report.duplicates = holders
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .collect();

    report
}
