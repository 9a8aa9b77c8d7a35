// Generational slot arena for recycled note objects

/// Index plus generation; stale once its slot is retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot<T> {
    value: T,
    generation: u32,
    live: bool,
}

/// Slots are never dropped: retired values stay in place and are handed back
/// by the next [`acquire`](Arena::acquire) for reuse.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a retired slot (its old value intact) or push a fresh one built
    /// by `make`.
    pub fn acquire(&mut self, make: impl FnOnce() -> T) -> (Handle, &mut T) {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    value: make(),
                    generation: 0,
                    live: false,
                });
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.live = true;
        let handle = Handle {
            index,
            generation: slot.generation,
        };
        (handle, &mut slot.value)
    }

    /// Retire the slot behind `handle`. Returns false for stale handles.
    pub fn release(&mut self, handle: Handle) -> bool {
        match self.slots.get_mut(handle.index()) {
            Some(slot) if slot.live && slot.generation == handle.generation => {
                slot.live = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(handle.index);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.live && slot.generation == handle.generation)
            .map(|slot| &slot.value)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.live && slot.generation == handle.generation)
            .map(|slot| &mut slot.value)
    }

    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Slots ever allocated, live or retired.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_then_get() {
        let mut arena = Arena::new();
        let (h, v) = arena.acquire(|| 5);
        *v += 1;
        assert_eq!(arena.get(h), Some(&6));
        assert_eq!(arena.live_count(), 1);
    }

    #[test]
    fn released_handles_go_stale() {
        let mut arena = Arena::new();
        let (h, _) = arena.acquire(|| "a");
        assert!(arena.release(h));
        assert_eq!(arena.get(h), None);
        assert!(!arena.release(h));
    }

    #[test]
    fn retired_slot_is_reused_with_old_value() {
        let mut arena = Arena::new();
        let (first, v) = arena.acquire(Vec::<i32>::new);
        v.push(1);
        arena.release(first);

        let (second, v) = arena.acquire(|| panic!("slot should be reused"));
        assert_eq!(v, &vec![1]);
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.capacity(), 1);
    }

    #[test]
    fn counts_track_live_and_free() {
        let mut arena = Arena::new();
        let handles: Vec<_> = (0..4).map(|i| arena.acquire(|| i).0).collect();
        arena.release(handles[1]);
        arena.release(handles[3]);
        assert_eq!(arena.live_count(), 2);
        assert_eq!(arena.free_count(), 2);
        assert_eq!(arena.capacity(), 4);
    }
}
