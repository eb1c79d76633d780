//! Record and replay for a virtual, handle-based GL context.
//!
//! This crate's [`VirtualContext`] accepts WebGL-shaped commands before any
//! real graphics context exists. Each call is captured as a [`Record`] on the
//! context's [`Recorder`]; resource arguments are captured as stamped
//! [`Identity`] values rather than live handles, so resources created only
//! virtually can still be referenced by later calls. Draw calls, and
//! attaching a real context, drain the queue into the [`Actuator`], which
//! resolves identities to live handles through its [`ResourceCache`], invokes
//! the real operation via the [`WebGl`] trait, and caches any handle the
//! operation returns.
//!
//! The supported operation set is the static table in [`call`]: one [`Op`]
//! per operation, annotated with whether it returns a cacheable handle, which
//! argument positions hold resource references, and whether it must
//! synchronize the active program first. The [`vao`] module layers a software
//! emulation of the `OES_vertex_array_object` extension on top of the
//! recording machinery, re-issuing only the vertex-state delta when the
//! active vertex-array object changes.
//!
//! A minimal round trip:
//!
//! ```no_run
//! use gl_defer::{BufferSource, ContextAttributes, VirtualContext};
//! use gleam::gl;
//!
//! let mut context = VirtualContext::new(ContextAttributes::default());
//! let buffer = context.create_buffer();
//! context.bind_buffer(gl::ARRAY_BUFFER, Some(&buffer));
//! context.buffer_data(gl::ARRAY_BUFFER, BufferSource::F32(&[0.0; 3]), gl::STATIC_DRAW);
//! // Queues until a real context shows up:
//! # let real_context: std::rc::Rc<dyn gl_defer::WebGl> = unimplemented!();
//! context.attach(real_context).unwrap();
//! ```

pub mod actuator;
pub mod cache;
pub mod call;
pub mod context;
pub mod ident;
pub mod record;
pub mod recorder;
pub mod resources;
pub mod value;
pub mod vao;
pub mod webgl;

#[cfg(test)]
mod testgl;

pub use actuator::{Actuator, ReplayError};
pub use cache::ResourceCache;
pub use call::{Descriptor, Op, OpKind};
pub use context::{
    BufferSource, ContextAttributes, ContextError, Extension, VirtualContext,
    OES_VERTEX_ARRAY_OBJECT,
};
pub use ident::{Identity, ResourceKind, Stamper};
pub use record::{Record, RefSlot};
pub use recorder::Recorder;
pub use resources::{
    Buffer, Framebuffer, GlObject, Program, Renderbuffer, Shader, Texture, UniformLocation,
    VertexArray,
};
pub use value::Value;
pub use vao::{DeadVertexArray, VaoEmulation, DEFAULT_MAX_VERTEX_ATTRIBS};
pub use webgl::{ActiveInfo, NativeHandle, WebGl};
