//! Local index allocation
//!
//! Every GAF resource (bearer, call, group, stream, interface) is identified by a
//! local index into a fixed-capacity table owned by its component. An index stays
//! valid until the resource is removed and may be handed out again afterwards.

/// Local index of a resource within its owning table
pub type Lid = u8;

/// Invalid local index
pub const GAF_INVALID_LID: Lid = 0xFF;

/// Largest number of slots a table can hold, `GAF_INVALID_LID` excluded
pub const LID_TABLE_MAX: usize = 0xFF;

/// Fixed-capacity slot table addressed by local index.
///
/// Allocation always returns the lowest free index, so freed indexes are reused
/// before untouched ones.
#[derive(Debug, Clone)]
pub struct LidTable<T> {
    slots: Vec<Option<T>>,
}

impl<T> LidTable<T> {
    /// Create a table with `capacity` slots (clamped to 255)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(LID_TABLE_MAX);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of free slots
    pub fn available(&self) -> usize {
        self.capacity() - self.len()
    }

    /// Index the next `insert` would use
    pub fn next_free(&self) -> Option<Lid> {
        self.slots.iter().position(|slot| slot.is_none()).map(|i| i as Lid)
    }

    /// Store `value` in the lowest free slot. Gives the value back when the table is full.
    pub fn insert(&mut self, value: T) -> Result<Lid, T> {
        match self.next_free() {
            Some(lid) => {
                self.slots[lid as usize] = Some(value);
                Ok(lid)
            }
            None => Err(value),
        }
    }

    /// Store a value built from the index it will live at
    pub fn insert_with<F: FnOnce(Lid) -> T>(&mut self, build: F) -> Option<Lid> {
        let lid = self.next_free()?;
        self.slots[lid as usize] = Some(build(lid));
        Some(lid)
    }

    pub fn get(&self, lid: Lid) -> Option<&T> {
        self.slots.get(lid as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, lid: Lid) -> Option<&mut T> {
        self.slots.get_mut(lid as usize).and_then(Option::as_mut)
    }

    pub fn contains(&self, lid: Lid) -> bool {
        self.get(lid).is_some()
    }

    /// Free a slot, returning what it held
    pub fn remove(&mut self, lid: Lid) -> Option<T> {
        self.slots.get_mut(lid as usize).and_then(Option::take)
    }

    /// Iterate over live entries
    pub fn iter(&self) -> impl Iterator<Item = (Lid, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|value| (i as Lid, value)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Lid, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|value| (i as Lid, value)))
    }

    /// Find the first live entry matching `pred`
    pub fn find<P: Fn(&T) -> bool>(&self, pred: P) -> Option<Lid> {
        self.iter().find(|(_, value)| pred(value)).map(|(lid, _)| lid)
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }
}
