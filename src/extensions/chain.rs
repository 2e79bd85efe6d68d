use std::sync::Arc;

/// Ordered chain: custom entries in front (last added first), defaults at the tail.
pub(crate) struct Chain<T: ?Sized> {
    custom: Vec<Arc<T>>,
    defaults: Vec<Arc<T>>,
}

impl<T: ?Sized> Chain<T> {
    pub(crate) fn new() -> Self {
        Self {
            custom: Vec::new(),
            defaults: Vec::new(),
        }
    }

    /// Inserts ahead of every entry added so far.
    pub(crate) fn push_front(&mut self, entry: Arc<T>) {
        self.custom.insert(0, entry);
    }

    /// Appends a default entry behind all custom ones.
    pub(crate) fn push_default(&mut self, entry: Arc<T>) {
        self.defaults.push(entry);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.custom.iter().chain(self.defaults.iter())
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Arc<T>> {
        self.iter().nth(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.custom.len() + self.defaults.len()
    }
}

impl<T: ?Sized> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}
