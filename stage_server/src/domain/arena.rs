//! Slot storage for short-lived stage entities.
//!
//! Ids stay valid for as long as the entity lives and never alias a later
//! entity that reuses the same slot: every reuse bumps the slot generation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Packs the id into a single integer for the wire.
    pub fn to_bits(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }
}

#[derive(Debug, Clone)]
enum Slot<T> {
    Occupied { generation: u32, value: T },
    Free { generation: u32 },
}

#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, value: T) -> EntityId {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            let generation = match slot {
                Slot::Free { generation } | Slot::Occupied { generation, .. } => {
                    generation.wrapping_add(1)
                }
            };
            *slot = Slot::Occupied { generation, value };
            return EntityId { index, generation };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot::Occupied {
            generation: 0,
            value,
        });
        EntityId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        match self.slots.get(id.index as usize)? {
            Slot::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    /// Keeps only the entities for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(EntityId, &mut T) -> bool) -> usize {
        let mut removed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Slot::Occupied { generation, value } = slot else {
                continue;
            };
            let id = EntityId {
                index: index as u32,
                generation: *generation,
            };
            if !keep(id, value) {
                *slot = Slot::Free {
                    generation: id.generation,
                };
                self.free.push(id.index);
                removed += 1;
            }
        }
        self.len -= removed;
        removed
    }

    pub fn clear(&mut self) {
        self.retain(|_, _| false);
    }

    /// Iterates live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied { generation, value } => Some((
                    EntityId {
                        index: index as u32,
                        generation: *generation,
                    },
                    value,
                )),
                Slot::Free { .. } => None,
            })
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(|slot| match slot {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Free { .. } => None,
        })
    }
}
