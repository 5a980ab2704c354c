use std::fmt;

/// Fixed-capacity ring buffer. Once full, every push evicts the oldest entry.
///
/// Storage only grows until it reaches `capacity`; after that `head` marks the
/// slot holding the oldest entry, which is also the next one to be overwritten.
#[derive(Clone)]
pub struct CircularBuffer<T> {
    buffer: Vec<T>,
    head: usize,
    capacity: usize,
}

impl<T> CircularBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    fn is_full(&self) -> bool {
        self.buffer.len() >= self.capacity
    }

    pub fn push(&mut self, item: T) {
        if self.is_full() {
            self.buffer[self.head] = item;
            self.head = (self.head + 1) % self.capacity;
        } else {
            self.buffer.push(item);
        }
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (newest, oldest) = self.buffer.split_at(self.head);
        oldest.iter().chain(newest)
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&T> {
        match self.head {
            0 => self.buffer.last(),
            head => self.buffer.get(head - 1),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the capacity in place.
    ///
    /// Shrinking keeps only the newest `new_capacity` entries; growing keeps
    /// everything. Relative order is never changed.
    pub fn resize(&mut self, new_capacity: usize) {
        let new_capacity = new_capacity.max(1);
        if new_capacity == self.capacity {
            return;
        }

        // Oldest entry moves to index 0.
        self.buffer.rotate_left(self.head);
        self.head = 0;

        let excess = self.buffer.len().saturating_sub(new_capacity);
        self.buffer.drain(..excess);
        self.buffer.reserve(new_capacity.saturating_sub(self.buffer.len()));
        self.capacity = new_capacity;
    }
}

impl<T: fmt::Debug> fmt::Debug for CircularBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircularBuffer")
            .field("capacity", &self.capacity)
            .field("items", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}
