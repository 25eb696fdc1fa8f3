//! Ordered set of open tabs with a single focused entry.
//!
//! The Picker is created with the stack and can never be closed. At most
//! one tab exists per series or chapter: opening an already-open target
//! only moves focus. Every focus change goes through one private method
//! that also notifies the [`PresenceHook`].

mod entry;
mod presence;

pub use entry::{CloseHandle, EntryId, Status, ViewerEntry, ViewerKind};
pub use presence::{LogPresence, PresenceHook};

#[cfg(test)]
pub use presence::recording::RecordingPresence;

pub const PRESENCE_TOP_LINE: &str = "Read me a manga";
const PRESENCE_MAX_CHARS: usize = 100;

pub struct ViewerStack {
    entries: Vec<ViewerEntry>,
    focused: usize,
    next_id: EntryId,
    presence: Box<dyn PresenceHook>,
}

impl ViewerStack {
    pub fn new(presence: Box<dyn PresenceHook>) -> Self {
        let mut stack = Self {
            entries: Vec::new(),
            focused: 0,
            next_id: 1,
            presence,
        };
        let picker = stack.wire(ViewerEntry::picker());
        stack.entries.push(picker);
        stack.focus_index(0);
        stack
    }

    pub fn entries(&self) -> &[ViewerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn focused(&self) -> &ViewerEntry {
        &self.entries[self.focused]
    }

    pub fn focused_mut(&mut self) -> &mut ViewerEntry {
        &mut self.entries[self.focused]
    }

    pub fn focused_index(&self) -> usize {
        self.focused
    }

    pub fn get(&self, id: EntryId) -> Option<&ViewerEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut ViewerEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn find(&self, kind: &ViewerKind) -> Option<&ViewerEntry> {
        self.entries.iter().find(|e| e.kind().same_target(kind))
    }

    /// Open a tab, or focus the existing tab for the same target.
    pub fn open(&mut self, entry: ViewerEntry) -> EntryId {
        if let Some(index) = self.index_of_target(entry.kind(), None) {
            self.focus_index(index);
            return self.entries[index].id;
        }

        let entry = self.wire(entry);
        let id = entry.id;
        self.entries.push(entry);
        self.focus_index(self.entries.len() - 1);
        id
    }

    /// Close the entry the handle was issued for.
    ///
    /// If it was focused, focus moves to whatever now sits at its index,
    /// or the new last entry when it was last.
    pub fn close(&mut self, handle: CloseHandle) -> bool {
        let Some(index) = self.index_of(handle.0) else {
            return false;
        };
        if !self.entries[index].closeable() {
            return false;
        }

        self.entries.remove(index);
        if index == self.focused {
            self.focus_index(index.min(self.entries.len() - 1));
        } else if index < self.focused {
            self.focused -= 1;
        }
        true
    }

    /// Close by id; false for the Picker or unknown ids.
    pub fn close_entry(&mut self, id: EntryId) -> bool {
        match self.get(id).and_then(ViewerEntry::close_handle) {
            Some(handle) => self.close(handle),
            None => false,
        }
    }

    /// Put `entry` where `old` was and focus it.
    ///
    /// When another tab already shows the new target, `old` is dropped and
    /// that tab is focused instead. The Picker is never replaced.
    pub fn replace(&mut self, old: EntryId, entry: ViewerEntry) -> Option<EntryId> {
        let index = self.index_of(old)?;
        if !self.entries[index].closeable() {
            return None;
        }

        if let Some(existing) = self.index_of_target(entry.kind(), Some(old)) {
            let existing_id = self.entries[existing].id;
            self.entries.remove(index);
            let existing = if index < existing { existing - 1 } else { existing };
            self.focus_index(existing);
            return Some(existing_id);
        }

        let entry = self.wire(entry);
        let id = entry.id;
        self.entries[index] = entry;
        self.focus_index(index);
        Some(id)
    }

    /// Focus a tab by id.
    pub fn focus(&mut self, id: EntryId) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.focus_index(index);
                true
            }
            None => false,
        }
    }

    pub fn focus_next(&mut self) {
        let next = (self.focused + 1) % self.entries.len();
        self.focus_index(next);
    }

    pub fn focus_prev(&mut self) {
        let prev = (self.focused + self.entries.len() - 1) % self.entries.len();
        self.focus_index(prev);
    }

    // The single place focus changes.
    fn focus_index(&mut self, index: usize) {
        self.focused = index;
        let title = self.entries[index].title();
        self.presence
            .update_presence(PRESENCE_TOP_LINE, &truncate_title(title));
    }

    fn wire(&mut self, mut entry: ViewerEntry) -> ViewerEntry {
        entry.id = self.next_id;
        self.next_id += 1;
        entry.close = entry.closeable().then_some(CloseHandle(entry.id));
        entry
    }

    fn index_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn index_of_target(&self, kind: &ViewerKind, except: Option<EntryId>) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| Some(e.id) != except && e.kind().same_target(kind))
    }
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > PRESENCE_MAX_CHARS {
        let head: String = title.chars().take(PRESENCE_MAX_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}
