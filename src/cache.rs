//! The identity → live-handle table populated during replay.
//!
//! Each actuator owns one cache; nothing else writes to it. When a record
//! whose operation returns a handle is replayed, the actuator stores the real
//! result here under the record's return identity, and later records that
//! reference the identity resolve through the same table. Entries are removed
//! when the matching delete operation *replays*, not when it is recorded,
//! so records queued between a delete call and its replay still resolve.

use std::collections::HashMap;

use crate::ident::{Identity, ResourceKind};
use crate::webgl::NativeHandle;

#[derive(Debug, Default)]
pub struct ResourceCache {
    buckets: [HashMap<u32, NativeHandle>; ResourceKind::ALL.len()],
}

impl ResourceCache {
    pub fn new() -> ResourceCache {
        ResourceCache::default()
    }

    pub fn lookup(&self, ident: Identity) -> Option<NativeHandle> {
        self.buckets[ident.kind().index()].get(&ident.serial()).copied()
    }

    pub fn insert(&mut self, ident: Identity, handle: NativeHandle) {
        self.buckets[ident.kind().index()].insert(ident.serial(), handle);
    }

    pub fn remove(&mut self, ident: Identity) -> Option<NativeHandle> {
        self.buckets[ident.kind().index()].remove(&ident.serial())
    }

    /// Number of live entries in one kind's bucket.
    pub fn bucket_len(&self, kind: ResourceKind) -> usize {
        self.buckets[kind.index()].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Stamper;

    #[test]
    fn buckets_are_keyed_by_kind_and_serial() {
        let mut stamper = Stamper::new();
        let buffer = stamper.mint(ResourceKind::Buffer);
        let texture = stamper.mint(ResourceKind::Texture);

        let mut cache = ResourceCache::new();
        cache.insert(buffer, 7);
        cache.insert(texture, 9);

        // Same serial, different kinds: no collision.
        assert_eq!(buffer.serial(), texture.serial());
        assert_eq!(cache.lookup(buffer), Some(7));
        assert_eq!(cache.lookup(texture), Some(9));

        assert_eq!(cache.remove(buffer), Some(7));
        assert_eq!(cache.lookup(buffer), None);
        assert_eq!(cache.bucket_len(ResourceKind::Texture), 1);
    }
}
