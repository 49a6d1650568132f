//! Immutable ordered document batches.

use super::Document;
use std::sync::Arc;

/// An immutable ordered sequence of documents.
///
/// Batches are passed between modules by cheap reference-counted share;
/// cloning a batch never copies the documents. Concatenation preserves
/// order.
#[derive(Clone, Debug)]
pub struct DocumentBatch {
    docs: Arc<[Document]>,
}

impl DocumentBatch {
    /// The distinguished empty batch.
    #[must_use]
    pub fn empty() -> Self {
        Self { docs: Arc::new([]) }
    }

    /// A batch containing a single document.
    #[must_use]
    pub fn single(doc: Document) -> Self {
        Self {
            docs: Arc::new([doc]),
        }
    }

    /// The number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// The document at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Document> {
        self.docs.get(index)
    }

    /// Iterates the documents in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.docs.iter()
    }

    /// Returns a new batch with `other`'s documents appended after this
    /// batch's, preserving order.
    #[must_use]
    pub fn concat(&self, other: &DocumentBatch) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        self.iter().chain(other.iter()).cloned().collect()
    }
}

impl Default for DocumentBatch {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<Document>> for DocumentBatch {
    fn from(docs: Vec<Document>) -> Self {
        Self { docs: docs.into() }
    }
}

impl FromIterator<Document> for DocumentBatch {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self {
            docs: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DocumentBatch {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(dest: &str) -> Document {
        Document::new().with_destination(dest)
    }

    #[test]
    fn empty_batch() {
        let batch = DocumentBatch::empty();
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
        assert!(batch.get(0).is_none());
    }

    #[test]
    fn clone_shares_documents() {
        let batch = DocumentBatch::from(vec![doc("a.txt")]);
        let cloned = batch.clone();
        assert!(batch.get(0).unwrap().same_identity(cloned.get(0).unwrap()));
    }

    #[test]
    fn concat_preserves_order() {
        let first = DocumentBatch::from(vec![doc("a"), doc("b")]);
        let second = DocumentBatch::from(vec![doc("c")]);

        let combined = first.concat(&second);
        let dests: Vec<_> = combined
            .iter()
            .map(|d| d.destination().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(dests, ["a", "b", "c"]);
    }

    #[test]
    fn concat_with_empty_is_cheap_share() {
        let batch = DocumentBatch::from(vec![doc("a")]);
        let combined = batch.concat(&DocumentBatch::empty());
        assert_eq!(combined.len(), 1);
        assert!(batch.get(0).unwrap().same_identity(combined.get(0).unwrap()));
    }
}
