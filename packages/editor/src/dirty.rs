use std::collections::BTreeSet;
use tessera_document::Document;

/// Shapes touched since the renderer last looked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyState {
    /// Present and in need of a redraw
    pub dirty: BTreeSet<String>,
    /// Gone from the document
    pub deleted: BTreeSet<String>,
}

impl DirtyState {
    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty() && self.deleted.is_empty()
    }

    /// Fold `ids` in, classified by whether they exist in `doc`.
    ///
    /// An id lives in at most one of the two sets.
    pub fn record<'a>(&mut self, doc: &Document, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            if doc.contains_shape(id) {
                self.deleted.remove(id);
                self.dirty.insert(id.to_string());
            } else {
                self.dirty.remove(id);
                self.deleted.insert(id.to_string());
            }
        }
    }

    pub fn mark_dirty(&mut self, id: &str) {
        self.deleted.remove(id);
        self.dirty.insert(id.to_string());
    }

    pub fn mark_deleted(&mut self, id: &str) {
        self.dirty.remove(id);
        self.deleted.insert(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_document::Shape;

    #[test]
    fn test_record_moves_ids_between_sets() {
        let mut state = DirtyState::default();
        let with_s1 = Document::from_shapes([Shape::rect("s1", 1.0, 1.0)]);
        let empty = Document::new();

        state.record(&with_s1, ["s1"]);
        assert!(state.dirty.contains("s1"));

        state.record(&empty, ["s1"]);
        assert!(!state.dirty.contains("s1"));
        assert!(state.deleted.contains("s1"));

        state.record(&with_s1, ["s1"]);
        assert!(state.dirty.contains("s1"));
        assert!(!state.deleted.contains("s1"));
    }
}
