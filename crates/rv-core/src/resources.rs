use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Named position holding at most one live resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The user's chosen source image
    Preview,
    /// The generated video
    Result,
}

impl Slot {
    pub fn name(&self) -> &str {
        match self {
            Self::Preview => "preview",
            Self::Result => "result",
        }
    }
}

/// Process-local identifier of a registered resource, `blob:`-URL shaped so a
/// renderer can use it directly as a source reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandleId(String);

impl HandleId {
    fn generate() -> Self {
        Self(format!("blob:reverie/{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What observers get to see of a registered resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    pub id: HandleId,
    pub slot: Slot,
    pub mime_type: String,
    pub len: usize,
}

#[derive(Debug, Clone)]
pub struct ManagedResource {
    handle: ResourceHandle,
    data: Arc<[u8]>,
}

impl ManagedResource {
    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    pub fn data(&self) -> Arc<[u8]> {
        self.data.clone()
    }
}

/// Owns every locally created binary resource.
///
/// A slot never holds two live handles: registering into an occupied slot
/// releases the previous occupant first, and dropping the manager releases
/// whatever is left.
#[derive(Debug, Default)]
pub struct ResourceManager {
    slots: HashMap<Slot, ManagedResource>,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, slot: Slot, data: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> ResourceHandle {
        self.release(slot);

        let data = data.into();
        let handle = ResourceHandle {
            id: HandleId::generate(),
            slot,
            mime_type: mime_type.into(),
            len: data.len(),
        };

        debug!(slot = slot.name(), id = %handle.id, bytes = handle.len, "registered resource");

        self.slots.insert(slot, ManagedResource {
            handle: handle.clone(),
            data,
        });

        handle
    }

    /// Drop the slot's resource. Returns whether anything was live; releasing
    /// an empty slot is a no-op.
    pub fn release(&mut self, slot: Slot) -> bool {
        match self.slots.remove(&slot) {
            Some(resource) => {
                debug!(slot = slot.name(), id = %resource.handle.id, "released resource");
                true
            }
            None => false,
        }
    }

    pub fn release_all(&mut self) {
        for slot in [Slot::Preview, Slot::Result] {
            self.release(slot);
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&ManagedResource> {
        self.slots.get(&slot)
    }

    pub fn is_live(&self, id: &HandleId) -> bool {
        self.slots.values().any(|r| &r.handle.id == id)
    }

    pub fn live_count(&self) -> usize {
        self.slots.len()
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        self.release_all();
    }
}
