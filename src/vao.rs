//! Software emulation of the vertex-array-object extension.
//!
//! The emulator shadows per-attribute vertex state for any number of virtual
//! VAOs (plus the default one) and, when the active VAO changes, re-issues
//! only the state that actually differs: the element-array binding if it
//! changed, enable/disable flips, and the pointer calls for enabled slots
//! whose buffer or pointer fingerprint moved. Minimizing those re-issues on
//! every switch is the whole point of the emulator.
//!
//! The emulator wraps the underlying operations rather than replacing them:
//! the context forwards every `bindBuffer` / `enableVertexAttribArray` /
//! `disableVertexAttribArray` / `vertexAttribPointer` into the `note_*`
//! methods here *in addition to* recording the call itself. Switch-time
//! re-issues come back out as ready-made records for the context to enqueue.

use gleam::gl::{self, GLenum, GLint, GLsizei, GLuint};
use thiserror::Error;

use crate::call::Op;
use crate::ident::Identity;
use crate::record::Record;
use crate::value::Value;

/// Fallback attribute-slot count when no live context is available to ask.
/// The GL minimum is 8; every real implementation has at least 16.
pub const DEFAULT_MAX_VERTEX_ATTRIBS: usize = 16;

/// Binding a VAO that has been deleted is an invalid operation, reported the
/// way the underlying API reports it.
#[derive(Error, Debug)]
#[error("attempt to bind deleted vertex array {0}")]
pub struct DeadVertexArray(pub Identity);

/// The pointer fingerprint: everything `vertexAttribPointer` sets besides the
/// buffer. Two slots with equal keys and equal buffers need no re-issue.
type PointerKey = (GLint, GLenum, bool, GLsizei, GLuint);

/// Shadow state for one attribute slot.
#[derive(Clone, Debug)]
pub(crate) struct VertexAttrib {
    pub enabled: bool,
    pub buffer: Option<Identity>,
    pub size: GLint,
    pub ty: GLenum,
    pub normalized: bool,
    pub stride: GLsizei,
    pub offset: GLuint,
    key: PointerKey,
}

impl Default for VertexAttrib {
    fn default() -> VertexAttrib {
        let mut attrib = VertexAttrib {
            enabled: false,
            buffer: None,
            size: 4,
            ty: gl::FLOAT,
            normalized: false,
            stride: 0,
            offset: 0,
            key: (0, 0, false, 0, 0),
        };
        attrib.recache();
        attrib
    }
}

impl VertexAttrib {
    fn recache(&mut self) {
        self.key = (self.size, self.ty, self.normalized, self.stride, self.offset);
    }
}

/// Shadow state for one vertex-array object.
#[derive(Clone, Debug)]
struct VaoState {
    ident: Option<Identity>,
    alive: bool,
    bound_once: bool,
    element_array_buffer: Option<Identity>,
    attribs: Vec<VertexAttrib>,
    /// Highest slot any call has touched; bounds the diff loop.
    max_attrib: usize,
}

impl VaoState {
    fn new(ident: Option<Identity>, max_attribs: usize) -> VaoState {
        VaoState {
            ident,
            alive: true,
            bound_once: false,
            element_array_buffer: None,
            attribs: vec![VertexAttrib::default(); max_attribs],
            max_attrib: 0,
        }
    }
}

pub struct VaoEmulation {
    /// Slot 0 is the default VAO; created VAOs live at `serial + 1`.
    arena: Vec<VaoState>,
    current: usize,
    max_attribs: usize,
}

impl VaoEmulation {
    pub fn new(max_attribs: usize) -> VaoEmulation {
        let mut default = VaoState::new(None, max_attribs);
        default.bound_once = true;
        VaoEmulation { arena: vec![default], current: 0, max_attribs }
    }

    fn index_of(&self, ident: Identity) -> usize {
        ident.serial() as usize + 1
    }

    /// Register a freshly minted VAO with all slots disabled and no element
    /// buffer.
    pub fn create(&mut self, ident: Identity) {
        debug_assert_eq!(self.index_of(ident), self.arena.len());
        self.arena.push(VaoState::new(Some(ident), self.max_attribs));
    }

    /// The identity of the current VAO, or `None` for the default.
    pub fn current_identity(&self) -> Option<Identity> {
        self.arena[self.current].ident
    }

    /// True for a live VAO that has been bound at least once.
    pub fn is_vertex_array(&self, ident: Identity) -> bool {
        match self.arena.get(self.index_of(ident)) {
            Some(state) => state.alive && state.bound_once,
            None => false,
        }
    }

    pub(crate) fn attrib(&self, index: usize) -> Option<&VertexAttrib> {
        self.arena[self.current].attribs.get(index)
    }

    /// Shadow an `enableVertexAttribArray` call.
    pub fn note_enable(&mut self, index: usize) {
        self.touch(index, |attrib| attrib.enabled = true);
    }

    /// Shadow a `disableVertexAttribArray` call.
    pub fn note_disable(&mut self, index: usize) {
        self.touch(index, |attrib| attrib.enabled = false);
    }

    /// Shadow a `vertexAttribPointer` call; `buffer` is the ARRAY_BUFFER
    /// binding in effect when the pointer was set.
    pub fn note_pointer(
        &mut self,
        index: usize,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: GLuint,
        buffer: Option<Identity>,
    ) {
        self.touch(index, |attrib| {
            attrib.buffer = buffer;
            attrib.size = size;
            attrib.ty = ty;
            attrib.normalized = normalized;
            attrib.stride = stride;
            attrib.offset = offset;
            attrib.recache();
        });
    }

    /// Shadow a `bindBuffer(ELEMENT_ARRAY_BUFFER, ..)` call, which is per-VAO
    /// state.
    pub fn note_element_binding(&mut self, buffer: Option<Identity>) {
        self.arena[self.current].element_array_buffer = buffer;
    }

    fn touch(&mut self, index: usize, update: impl FnOnce(&mut VertexAttrib)) {
        let state = &mut self.arena[self.current];
        if index >= state.attribs.len() {
            return;
        }
        state.max_attrib = state.max_attrib.max(index);
        update(&mut state.attribs[index]);
    }

    /// Switch the current VAO, returning the minimal set of underlying calls
    /// (as ready-to-enqueue records) that brings the real context's vertex
    /// state in line. `array_binding` is the context's ARRAY_BUFFER binding;
    /// if the diff has to disturb it, a final re-bind restores it.
    pub fn bind(
        &mut self,
        target: Option<Identity>,
        array_binding: Option<Identity>,
    ) -> Result<Vec<Record>, DeadVertexArray> {
        let new_index = match target {
            Some(ident) => {
                let index = self.index_of(ident);
                match self.arena.get(index) {
                    Some(state) if state.alive => index,
                    _ => return Err(DeadVertexArray(ident)),
                }
            }
            None => 0,
        };

        let old_index = self.current;
        self.current = new_index;
        self.arena[new_index].bound_once = true;
        if old_index == new_index {
            return Ok(Vec::new());
        }

        let old = self.arena[old_index].clone();
        let new = &self.arena[new_index];
        let mut records = Vec::new();

        if new.element_array_buffer != old.element_array_buffer {
            records.push(bind_buffer(gl::ELEMENT_ARRAY_BUFFER, new.element_array_buffer));
        }

        let mut binding = array_binding;
        let top = old.max_attrib.max(new.max_attrib);
        for index in 0..=top {
            let attrib = &new.attribs[index];
            let old_attrib = &old.attribs[index];

            if attrib.enabled != old_attrib.enabled {
                let op = if attrib.enabled {
                    Op::EnableVertexAttribArray
                } else {
                    Op::DisableVertexAttribArray
                };
                records.push(Record::new(op, vec![Value::Uint(index as GLuint)]));
            }

            if attrib.enabled {
                let mut buffer_changed = false;
                if attrib.buffer != old_attrib.buffer {
                    if binding != attrib.buffer {
                        records.push(bind_buffer(gl::ARRAY_BUFFER, attrib.buffer));
                        binding = attrib.buffer;
                    }
                    buffer_changed = true;
                }
                if buffer_changed || attrib.key != old_attrib.key {
                    records.push(Record::new(
                        Op::VertexAttribPointer,
                        vec![
                            Value::Uint(index as GLuint),
                            Value::Int(attrib.size),
                            Value::Uint(attrib.ty),
                            Value::Bool(attrib.normalized),
                            Value::Int(attrib.stride),
                            Value::Uint(attrib.offset),
                        ],
                    ));
                }
            }
        }

        if binding != array_binding {
            records.push(bind_buffer(gl::ARRAY_BUFFER, array_binding));
        }
        Ok(records)
    }

    /// Mark a VAO dead. If it was current, the default VAO is rebound and the
    /// resulting diff records are returned.
    pub fn delete(&mut self, ident: Identity, array_binding: Option<Identity>) -> Vec<Record> {
        let index = self.index_of(ident);
        let state = match self.arena.get_mut(index) {
            Some(state) => state,
            None => return Vec::new(),
        };
        state.alive = false;
        if self.current == index {
            // A dead VAO can't stay current; fall back to the default. The
            // bind cannot fail: the default VAO is never deleted.
            self.bind(None, array_binding).expect("default VAO is always alive")
        } else {
            Vec::new()
        }
    }
}

fn bind_buffer(target: GLenum, buffer: Option<Identity>) -> Record {
    let argument = match buffer {
        Some(ident) => Value::Ident(ident),
        None => Value::Null,
    };
    let mut record = Record::new(Op::BindBuffer, vec![Value::Uint(target), argument]);
    record.mark_reference_slots(Op::BindBuffer.descriptor().ref_args);
    record
}
