//! One captured operation call, waiting to be replayed.
//!
//! A [`Record`] is built at the moment the application issues a call against
//! the virtual context. It snapshots the operation name and its arguments,
//! remembers which argument positions are references to virtual resources,
//! and, for creation calls, which identity the eventual live handle should
//! be cached under. The actuator later resolves the reference slots and
//! overwrites them with live handles immediately before invoking the real
//! operation.

use serde::Serialize;

use crate::call::Op;
use crate::ident::Identity;
use crate::value::Value;
use crate::webgl::NativeHandle;

/// A reference slot: argument `index` names the virtual resource `ident`
/// and must be resolved to a live handle before replay.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct RefSlot {
    pub index: usize,
    pub ident: Identity,
}

/// An immutable-intent capture of one operation call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    op: Op,
    args: Vec<Value>,
    ref_slots: Vec<RefSlot>,
    return_id: Option<Identity>,
}

impl Record {
    /// Capture a call. Slice arguments must already have been snapshotted
    /// into owned [`Value`]s, so nothing here aliases caller memory.
    pub fn new(op: Op, args: Vec<Value>) -> Record {
        Record {
            op,
            args,
            ref_slots: Vec::new(),
            return_id: None,
        }
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn ref_slots(&self) -> &[RefSlot] {
        &self.ref_slots
    }

    /// The identity the replayed return value should be cached under.
    pub fn return_id(&self) -> Option<Identity> {
        self.return_id
    }

    /// Register the reference slots among `positions`.
    ///
    /// A listed position whose argument is not an identity is left alone:
    /// plain values and references share call signatures, and only the
    /// arguments that actually name a resource take part in resolution.
    pub fn mark_reference_slots(&mut self, positions: &[usize]) {
        for &index in positions {
            if let Some(ident) = self.args.get(index).and_then(Value::as_ident) {
                self.ref_slots.push(RefSlot { index, ident });
            }
        }
    }

    /// Record that replaying this operation produces the live counterpart of
    /// `ident`. The cache bucket is the identity's kind.
    pub fn set_return(&mut self, ident: Identity) {
        self.return_id = Some(ident);
    }

    /// Overwrite reference-slot arguments with their resolved live handles.
    /// Called by the actuator immediately before invocation.
    pub fn apply_resolved(&mut self, resolutions: &[(usize, NativeHandle)]) {
        for &(index, handle) in resolutions {
            self.args[index] = Value::Handle(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::{ResourceKind, Stamper};

    #[test]
    fn marking_skips_plain_values() {
        let mut stamper = Stamper::new();
        let buffer = stamper.mint(ResourceKind::Buffer);
        let mut record = Record::new(
            Op::BindBuffer,
            vec![Value::Uint(0x8892), Value::Ident(buffer)],
        );
        record.mark_reference_slots(&[0, 1]);

        // Position 0 is a plain enum, not a reference.
        assert_eq!(record.ref_slots(), &[RefSlot { index: 1, ident: buffer }]);
        assert_eq!(record.args()[1], Value::Ident(buffer));
    }

    #[test]
    fn resolution_replaces_identities_with_handles() {
        let mut stamper = Stamper::new();
        let buffer = stamper.mint(ResourceKind::Buffer);
        let mut record = Record::new(
            Op::BindBuffer,
            vec![Value::Uint(0x8892), Value::Ident(buffer)],
        );
        record.mark_reference_slots(&[1]);
        record.apply_resolved(&[(1, 17)]);

        assert_eq!(record.args()[1], Value::Handle(17));
        // The enum argument is untouched.
        assert_eq!(record.args()[0], Value::Uint(0x8892));
    }

    #[test]
    fn records_serialize_as_a_structured_trace() {
        let mut stamper = Stamper::new();
        let buffer = stamper.mint(ResourceKind::Buffer);
        let mut record = Record::new(
            Op::BindBuffer,
            vec![Value::Uint(0x8892), Value::Ident(buffer)],
        );
        record.mark_reference_slots(&[1]);

        let trace = serde_json::to_string(&vec![record]).unwrap();
        assert!(trace.contains("BindBuffer"), "{}", trace);
        assert!(trace.contains("Buffer"), "{}", trace);
    }

    #[test]
    fn return_bucket_is_the_identity_kind() {
        let mut stamper = Stamper::new();
        let texture = stamper.mint(ResourceKind::Texture);
        let mut record = Record::new(Op::CreateTexture, vec![]);
        record.set_return(texture);
        assert_eq!(record.return_id().unwrap().kind(), ResourceKind::Texture);
    }
}
