use super::{Entry, ListItem};

/// Builds the visible entries for `text`.
///
/// An empty search (or a non-searchable list) shows every item. Otherwise
/// items whose search key contains `text` are kept, and a leading
/// [`Entry::Create`] is added when `creatable` and no kept item is labelled
/// exactly `text`.
pub fn visible_entries<T: ListItem + Clone>(
    items: &[T],
    text: &str,
    searchable: bool,
    creatable: bool,
) -> Vec<Entry<T>> {
    if !searchable || text.is_empty() {
        return items.iter().cloned().map(Entry::Item).collect();
    }

    let mut entries: Vec<Entry<T>> = items
        .iter()
        .filter(|item| item.search_key().contains(text))
        .cloned()
        .map(Entry::Item)
        .collect();

    if creatable && !entries.iter().any(|entry| entry.label() == text) {
        entries.insert(0, Entry::Create(text.to_string()));
    }

    entries
}
