//! Placeholder handles for resources that may not be real yet.
//!
//! Creation calls on the virtual context return these immediately, before any
//! GPU object exists. A handle is nothing but its identity; all interesting
//! state (shader sources, program link metadata) lives in tables inside the
//! context, indexed by the identity's serial. That keeps the handles `Copy`
//! and lets the application thread them through subsequent calls exactly the
//! way it would thread real GL objects.

use std::collections::HashMap;

use gleam::gl::{GLenum, GLint};

use crate::ident::{Identity, ResourceKind};
use crate::webgl::ActiveInfo;

/// Capability shared by every placeholder: it knows what it stands for.
pub trait GlObject {
    fn identity(&self) -> Identity;

    fn kind(&self) -> ResourceKind {
        self.identity().kind()
    }
}

macro_rules! placeholder_types {
    ( $( $(#[$doc:meta])* $name:ident => $kind:ident, )* ) => {
        $(
            $(#[$doc])*
            #[derive(Copy, Clone, Debug, PartialEq, Eq)]
            pub struct $name(Identity);

            impl $name {
                pub(crate) fn new(ident: Identity) -> $name {
                    debug_assert_eq!(ident.kind(), ResourceKind::$kind);
                    $name(ident)
                }
            }

            impl GlObject for $name {
                fn identity(&self) -> Identity {
                    self.0
                }
            }
        )*
    }
}

placeholder_types! {
    /// A buffer object placeholder.
    Buffer => Buffer,
    /// A shader object placeholder; its source and compile state live in the
    /// context's shader table.
    Shader => Shader,
    /// A program object placeholder; attached shaders and location caches
    /// live in the context's program table.
    Program => Program,
    /// A framebuffer object placeholder.
    Framebuffer => Framebuffer,
    /// A renderbuffer object placeholder.
    Renderbuffer => Renderbuffer,
    /// A texture object placeholder.
    Texture => Texture,
    /// An emulated vertex-array object.
    VertexArray => VertexArray,
}

/// A uniform location placeholder. It remembers which program owns it, which
/// is what lets uniform uploads synchronize the active program.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UniformLocation {
    ident: Identity,
    program: Identity,
}

impl UniformLocation {
    pub(crate) fn new(ident: Identity, program: Identity) -> UniformLocation {
        debug_assert_eq!(ident.kind(), ResourceKind::Uniform);
        UniformLocation { ident, program }
    }

    /// The program this location belongs to.
    pub fn program(&self) -> Identity {
        self.program
    }
}

impl GlObject for UniformLocation {
    fn identity(&self) -> Identity {
        self.ident
    }
}

/// Per-shader state, indexed by the shader identity's serial.
#[derive(Debug)]
pub(crate) struct ShaderEntry {
    pub ty: GLenum,
    pub source: String,
    pub compiled: bool,
    pub deleted: bool,
}

impl ShaderEntry {
    pub fn new(ty: GLenum) -> ShaderEntry {
        ShaderEntry { ty, source: String::new(), compiled: false, deleted: false }
    }
}

/// Per-program state, indexed by the program identity's serial.
///
/// The location caches are empty until `link` runs; lookups before that must
/// report absence rather than invent locations.
#[derive(Debug, Default)]
pub(crate) struct ProgramEntry {
    pub vertex_shader: Option<Identity>,
    pub fragment_shader: Option<Identity>,
    pub attributes: Vec<ActiveInfo>,
    pub uniforms: Vec<ActiveInfo>,
    pub attrib_locations: HashMap<String, GLint>,
    pub uniform_locations: HashMap<String, UniformLocation>,
    pub linked: bool,
    pub deleted: bool,
}

impl ProgramEntry {
    pub fn attached_count(&self) -> GLint {
        self.vertex_shader.is_some() as GLint + self.fragment_shader.is_some() as GLint
    }
}
