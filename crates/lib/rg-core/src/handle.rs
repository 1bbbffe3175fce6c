use std::marker::PhantomData;

/// Untyped arena slot reference: index plus a generation counter.
///
/// The generation is bumped whenever a slot is reused across frames so a
/// handle captured in one frame can never silently alias a different
/// resource that later lands in the same slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RawHandle {
    pub id: u32,
    pub generation: u32,
}

impl RawHandle {
    pub fn expired(self) -> Self {
        Self {
            id: self.id,
            generation: self.generation + 1,
        }
    }
}

/// A resource kind that can live in the registry: `Image` or `Buffer`.
///
/// Kept as a trait (rather than a single enum of resources) so `Handle<K>`
/// carries its resource kind in the type and two handles of different kinds
/// can never be compared or mixed up at a call site.
pub trait ResourceKind {
    type Desc: Clone + PartialEq + Eq + std::hash::Hash + std::fmt::Debug;
}

/// A type-tagged reference into the Resource Registry.
///
/// Carries its resource kind via `PhantomData` and compares by handle only,
/// so the descriptor stored alongside doesn't have to implement `Eq`.
pub struct Handle<K: ResourceKind> {
    pub(crate) raw: RawHandle,
    pub(crate) desc: K::Desc,
    _marker: PhantomData<K>,
}

impl<K: ResourceKind> Handle<K> {
    pub(crate) fn new(raw: RawHandle, desc: K::Desc) -> Self {
        Self {
            raw,
            desc,
            _marker: PhantomData,
        }
    }

    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    pub fn desc(&self) -> &K::Desc {
        &self.desc
    }

    /// Duplicate the handle without requiring `K::Desc: Clone` at every call
    /// site that merely wants to pass the reference along (e.g. into both a
    /// pass's inputs and outputs).
    pub fn clone_unchecked(&self) -> Self {
        Self {
            raw: self.raw,
            desc: self.desc.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K: ResourceKind> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}
impl<K: ResourceKind> Eq for Handle<K> {}

impl<K: ResourceKind> std::fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle").field("raw", &self.raw).finish()
    }
}

/// A handle returned from `GraphBuilder::export`, usable after the frame
/// retires to read back the resource's final access state.
pub struct ExportedHandle<K: ResourceKind> {
    pub(crate) raw: RawHandle,
    _marker: PhantomData<K>,
}

impl<K: ResourceKind> Clone for ExportedHandle<K> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<K: ResourceKind> Copy for ExportedHandle<K> {}

impl<K: ResourceKind> ExportedHandle<K> {
    pub(crate) fn new(raw: RawHandle) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    pub fn raw(&self) -> RawHandle {
        self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummyKind;
    impl ResourceKind for DummyKind {
        type Desc = u32;
    }

    #[test]
    fn handles_compare_by_raw_id_and_generation_only() {
        let raw = RawHandle { id: 3, generation: 0 };
        let a = Handle::<DummyKind>::new(raw, 42);
        let b = Handle::<DummyKind>::new(raw, 7);
        assert_eq!(a, b, "descriptors differ but the raw slot is the same");
    }

    #[test]
    fn expired_handle_bumps_generation_only() {
        let raw = RawHandle { id: 5, generation: 2 };
        let expired = raw.expired();
        assert_eq!(expired.id, raw.id);
        assert_eq!(expired.generation, raw.generation + 1);
    }
}
