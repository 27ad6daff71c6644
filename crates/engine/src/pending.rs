/// A correspondent proposed during this run that does not exist in the
/// catalog yet, along with the documents that proposed it.
#[derive(Debug, Clone)]
pub struct PendingSender {
    pub name: String,
    pub document_ids: Vec<u64>,
}

/// Run-scoped registry of newly proposed correspondents.
///
/// Registration order is preserved and names are deduplicated
/// case-insensitively: the first spelling seen wins, later proposals for the
/// same sender only append their document id.
#[derive(Debug, Default)]
pub struct PendingSenders {
    entries: Vec<PendingSender>,
}

impl PendingSenders {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registered spelling for `name`, if any.
    pub fn find(&self, name: &str) -> Option<&PendingSender> {
        let wanted = name.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.name.to_lowercase() == wanted)
    }

    /// Record that `document_id` proposed `name`. Returns the registered
    /// spelling.
    pub fn record(&mut self, name: &str, document_id: u64) -> &str {
        let wanted = name.to_lowercase();
        let position = self
            .entries
            .iter()
            .position(|entry| entry.name.to_lowercase() == wanted);

        let index = match position {
            Some(index) => index,
            None => {
                self.entries.push(PendingSender {
                    name: name.to_string(),
                    document_ids: Vec::new(),
                });
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[index];

        if !entry.document_ids.contains(&document_id) {
            entry.document_ids.push(document_id);
        }
        &entry.name
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.name.clone()).collect()
    }

    pub fn entries(&self) -> &[PendingSender] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
