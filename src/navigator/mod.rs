//! Windowed cursor over an ordered list, driven by discrete input events.
//!
//! [`NavigatorState::reduce`] is the only transition: it consumes the state
//! and one [`InputEvent`] and returns the next state plus an optional
//! [`Commit`]. Nothing here touches the terminal; the presentation layer
//! reads [`NavigatorState::view`] after every event.

use crate::error::ValidationError;
use std::collections::BTreeSet;

pub mod search;

/// Something that can be shown and searched in a picker.
pub trait ListItem {
    fn label(&self) -> &str;

    fn search_key(&self) -> &str {
        self.label()
    }
}

impl ListItem for String {
    fn label(&self) -> &str {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry<T> {
    Item(T),
    /// "Create new" pseudo-item carrying the search text.
    Create(String),
}

impl<T: ListItem> Entry<T> {
    pub fn label(&self) -> &str {
        match self {
            Entry::Item(item) => item.label(),
            Entry::Create(text) => text,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, Entry::Create(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Single,
    Multi { require_selection: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigatorOptions {
    pub mode: Mode,
    pub searchable: bool,
    pub creatable: bool,
    /// Rows shown at once; 0 shows everything.
    pub limit: usize,
}

impl NavigatorOptions {
    pub fn single() -> Self {
        Self {
            mode: Mode::Single,
            searchable: false,
            creatable: false,
            limit: 0,
        }
    }

    pub fn multi(require_selection: bool) -> Self {
        Self {
            mode: Mode::Multi { require_selection },
            ..Self::single()
        }
    }

    pub fn searchable(mut self, creatable: bool) -> Self {
        self.searchable = true;
        self.creatable = creatable;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent<T> {
    Up,
    Down,
    Toggle,
    ToggleAll,
    Commit,
    Input(char),
    Backspace,
    /// Swap in a freshly loaded item sequence.
    Replace(Vec<T>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit<T> {
    Item(T),
    Create(String),
    Items(Vec<T>),
    Invalid(ValidationError),
}

#[derive(Debug)]
pub struct Row<'a, T> {
    pub entry: &'a Entry<T>,
    pub highlighted: bool,
    pub selected: bool,
}

#[derive(Debug)]
pub struct View<'a, T> {
    pub rows: Vec<Row<'a, T>>,
    pub view_start: usize,
    pub highlighted_index: usize,
    pub selected_indexes: Vec<usize>,
    pub search_text: &'a str,
}

#[derive(Debug, Clone)]
pub struct NavigatorState<T> {
    options: NavigatorOptions,
    items: Vec<T>,
    entries: Vec<Entry<T>>,
    search_text: String,
    highlighted_index: usize,
    selected_indexes: BTreeSet<usize>,
}

impl<T: ListItem + Clone> NavigatorState<T> {
    pub fn new(items: Vec<T>, options: NavigatorOptions) -> Self {
        let entries = search::visible_entries(&items, "", options.searchable, options.creatable);
        Self {
            options,
            items,
            entries,
            search_text: String::new(),
            highlighted_index: 0,
            selected_indexes: BTreeSet::new(),
        }
    }

    /// Pre-selects `indexes`; out-of-range indexes are ignored.
    pub fn with_selected(mut self, indexes: impl IntoIterator<Item = usize>) -> Self {
        if matches!(self.options.mode, Mode::Multi { .. }) {
            let len = self.entries.len();
            self.selected_indexes = indexes.into_iter().filter(|&i| i < len).collect();
        }
        self
    }

    pub fn reduce(mut self, event: InputEvent<T>) -> (Self, Option<Commit<T>>) {
        match event {
            InputEvent::Up => self.move_up(),
            InputEvent::Down => self.move_down(),
            InputEvent::Toggle => self.toggle(),
            InputEvent::ToggleAll => self.toggle_all(),
            InputEvent::Commit => {
                let commit = self.commit();
                return (self, commit);
            }
            InputEvent::Input(ch) => {
                if self.options.searchable {
                    let mut text = self.search_text.clone();
                    text.push(ch);
                    self.set_search_text(text);
                }
            }
            InputEvent::Backspace => {
                if self.options.searchable && !self.search_text.is_empty() {
                    let mut text = self.search_text.clone();
                    text.pop();
                    self.set_search_text(text);
                }
            }
            InputEvent::Replace(items) => {
                self.items = items;
                let text = self.search_text.clone();
                self.set_search_text(text);
            }
        }
        (self, None)
    }

    fn move_up(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.highlighted_index = match self.highlighted_index {
            0 => self.entries.len() - 1,
            index => index - 1,
        };
    }

    fn move_down(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.highlighted_index = (self.highlighted_index + 1) % self.entries.len();
    }

    fn toggle(&mut self) {
        if !self.is_multi() || self.entries.is_empty() {
            return;
        }
        let index = self.highlighted_index;
        if self.entries.get(index).is_none_or(Entry::is_create) {
            return;
        }
        if !self.selected_indexes.remove(&index) {
            self.selected_indexes.insert(index);
        }
    }

    fn toggle_all(&mut self) {
        if !self.is_multi() || self.entries.is_empty() {
            return;
        }
        let selectable: BTreeSet<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_create())
            .map(|(index, _)| index)
            .collect();
        if self.selected_indexes == selectable {
            self.selected_indexes.clear();
        } else {
            self.selected_indexes = selectable;
        }
    }

    fn commit(&self) -> Option<Commit<T>> {
        if self.entries.is_empty() {
            return None;
        }

        match self.options.mode {
            Mode::Single => match self.entries.get(self.highlighted_index)? {
                Entry::Item(item) => Some(Commit::Item(item.clone())),
                Entry::Create(text) => Some(Commit::Create(text.clone())),
            },
            Mode::Multi { require_selection } => {
                if require_selection && self.selected_indexes.is_empty() {
                    return Some(Commit::Invalid(ValidationError::EmptySelection));
                }
                let items = self
                    .selected_indexes
                    .iter()
                    .filter_map(|&index| match self.entries.get(index) {
                        Some(Entry::Item(item)) => Some(item.clone()),
                        _ => None,
                    })
                    .collect();
                Some(Commit::Items(items))
            }
        }
    }

    fn set_search_text(&mut self, text: String) {
        self.entries = search::visible_entries(
            &self.items,
            &text,
            self.options.searchable,
            self.options.creatable,
        );
        self.search_text = text;
        self.highlighted_index = 0;
        self.selected_indexes.clear();
    }

    fn is_multi(&self) -> bool {
        matches!(self.options.mode, Mode::Multi { .. })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn options(&self) -> &NavigatorOptions {
        &self.options
    }

    pub fn view_length(&self) -> usize {
        view_length(self.options.limit, self.entries.len())
    }

    pub fn view_start(&self) -> usize {
        view_start(self.highlighted_index, self.entries.len(), self.view_length())
    }

    /// Whether the window hides some entries.
    pub fn can_scroll(&self) -> bool {
        self.view_length() < self.entries.len()
    }

    pub fn view(&self) -> View<'_, T> {
        let start = self.view_start();
        let end = start + self.view_length();
        let multi = self.is_multi();

        let rows = self.entries[start..end]
            .iter()
            .enumerate()
            .map(|(offset, entry)| {
                let index = start + offset;
                Row {
                    entry,
                    highlighted: index == self.highlighted_index,
                    selected: multi && self.selected_indexes.contains(&index),
                }
            })
            .collect();

        View {
            rows,
            view_start: start,
            highlighted_index: self.highlighted_index,
            selected_indexes: self.selected_indexes.iter().copied().collect(),
            search_text: &self.search_text,
        }
    }
}

fn view_length(limit: usize, len: usize) -> usize {
    if limit == 0 { len } else { limit.min(len) }
}

fn view_start(highlighted: usize, len: usize, view_length: usize) -> usize {
    let start = highlighted.saturating_sub(view_length / 2);
    start.min(len - view_length)
}
