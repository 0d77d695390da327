// Opaque resource handles and the tables behind them
//
// Handles are slotmap keys (index + generation) tagged with the renderer that
// issued them. The default handle is the null key and never resolves.

use super::error::{RendererError, ResourceKind, Result};
use slotmap::{Key, SlotMap};
use std::sync::atomic::{AtomicU32, Ordering};

slotmap::new_key_type! {
    pub struct ShaderKey;
    pub struct PipelineKey;
    pub struct BufferKey;
}

/// Identity of one renderer instance. 0 is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RendererId(u32);

impl RendererId {
    pub fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Typed opaque handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Handle<K> {
    key: K,
    owner: RendererId,
}

pub type ShaderHandle = Handle<ShaderKey>;
pub type PipelineHandle = Handle<PipelineKey>;
pub type BufferHandle = Handle<BufferKey>;

/// Owned, append-at-creation table of backend resources
pub struct ResourceTable<K: Key, T> {
    slots: SlotMap<K, T>,
    owner: RendererId,
    kind: ResourceKind,
}

impl<K: Key, T> ResourceTable<K, T> {
    pub fn new(owner: RendererId, kind: ResourceKind) -> Self {
        Self {
            slots: SlotMap::with_key(),
            owner,
            kind,
        }
    }

    pub fn insert(&mut self, value: T) -> Handle<K> {
        Handle {
            key: self.slots.insert(value),
            owner: self.owner,
        }
    }

    pub fn get(&self, handle: Handle<K>) -> Result<&T> {
        if handle.key.is_null() {
            return Err(RendererError::UnknownHandle(self.kind));
        }
        if handle.owner != self.owner {
            return Err(RendererError::ForeignHandle(self.kind));
        }
        self.slots
            .get(handle.key)
            .ok_or(RendererError::UnknownHandle(self.kind))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remove every entry; previously issued handles stop resolving.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.slots.drain().map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn table(owner: RendererId) -> ResourceTable<ShaderKey, &'static str> {
        ResourceTable::new(owner, ResourceKind::Shader)
    }

    #[test]
    fn test_handles_are_distinct() {
        let mut shaders = table(RendererId::next());
        let handles: Vec<_> = (0..32).map(|_| shaders.insert("module")).collect();
        let unique: HashSet<_> = handles.iter().copied().collect();
        assert_eq!(unique.len(), handles.len());
        assert_eq!(shaders.len(), 32);
    }

    #[test]
    fn test_default_handle_never_resolves() {
        let mut shaders = table(RendererId::next());
        // the first real entry must not alias the zero value
        let first = shaders.insert("vertex");
        assert_ne!(first, ShaderHandle::default());
        assert!(matches!(
            shaders.get(ShaderHandle::default()),
            Err(RendererError::UnknownHandle(ResourceKind::Shader))
        ));
        assert_eq!(*shaders.get(first).unwrap(), "vertex");
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut a = table(RendererId::next());
        let mut b = table(RendererId::next());
        let from_a = a.insert("a");
        b.insert("b");
        assert!(matches!(
            b.get(from_a),
            Err(RendererError::ForeignHandle(ResourceKind::Shader))
        ));
    }

    #[test]
    fn test_drained_handles_go_stale() {
        let mut shaders = table(RendererId::next());
        let old = shaders.insert("old");
        assert_eq!(shaders.drain().count(), 1);
        assert!(shaders.is_empty());

        let new = shaders.insert("new");
        assert_ne!(old, new);
        assert!(matches!(
            shaders.get(old),
            Err(RendererError::UnknownHandle(ResourceKind::Shader))
        ));
        assert_eq!(*shaders.get(new).unwrap(), "new");
    }
}
