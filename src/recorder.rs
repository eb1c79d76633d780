//! The per-context queue of captured calls.
//!
//! A [`Recorder`] is a FIFO, append-only queue of [`Record`]s. Draining hands
//! the whole queue to the actuator in original order and leaves the queue
//! empty; there is no way to reorder or drop individual records. The variant
//! [`Recorder::drain_with_program_prefix`] prepends a synthesized `useProgram`
//! record, for replaying a batch on a context whose program binding is not
//! known to match: uniform uploads are program-relative, so a batch replayed
//! after foreign program bindings must re-establish its own.

use crate::call::Op;
use crate::ident::Identity;
use crate::record::Record;
use crate::value::Value;

#[derive(Debug, Default)]
pub struct Recorder {
    queue: Vec<Record>,
}

impl Recorder {
    pub fn new() -> Recorder {
        Recorder::default()
    }

    /// Append a record. Order of enqueueing is order of replay.
    pub fn enqueue(&mut self, record: Record) {
        self.queue.push(record);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// The queued records, oldest first.
    pub fn records(&self) -> &[Record] {
        &self.queue
    }

    /// Remove and return every queued record, in enqueue order.
    pub fn drain(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.queue)
    }

    /// As [`drain`](Recorder::drain), prefixed with a synthesized
    /// `useProgram` record targeting `program`.
    pub fn drain_with_program_prefix(&mut self, program: Identity) -> Vec<Record> {
        let mut prefix = Record::new(Op::UseProgram, vec![Value::Ident(program)]);
        prefix.mark_reference_slots(Op::UseProgram.descriptor().ref_args);

        let mut batch = Vec::with_capacity(self.queue.len() + 1);
        batch.push(prefix);
        batch.append(&mut self.queue);
        batch
    }
}
