//! Identities: stable labels that stand in for GPU resources that may not
//! exist yet.
//!
//! Every virtual resource is stamped with an [`Identity`] the moment it is
//! created. The identity is the *only* thing that crosses the gap between
//! recording time (when there may be no live context at all) and replay time
//! (when the actuator maps identities to live handles). Once assigned, an
//! identity never changes; handles are `Copy` wrappers around their identity,
//! so restamping an object is a non-question by construction.
//!
//! An identity is a resource-kind tag plus a per-kind serial number. The kind
//! doubles as the cache bucket during replay, and the serial doubles as the
//! index into whatever per-kind table wants to hang state off the resource.

use std::fmt;

use serde::Serialize;

/// The kinds of resource an [`Identity`] can denote.
///
/// One bucket of the replay cache exists per kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceKind {
    Program,
    Shader,
    Buffer,
    Framebuffer,
    Renderbuffer,
    Texture,
    VertexArray,
    Uniform,
}

impl ResourceKind {
    pub(crate) const ALL: [ResourceKind; 8] = [
        ResourceKind::Program,
        ResourceKind::Shader,
        ResourceKind::Buffer,
        ResourceKind::Framebuffer,
        ResourceKind::Renderbuffer,
        ResourceKind::Texture,
        ResourceKind::VertexArray,
        ResourceKind::Uniform,
    ];

    /// The tag shown in rendered identities and error messages.
    pub fn prefix(self) -> &'static str {
        match self {
            ResourceKind::Program => "PROGRAM",
            ResourceKind::Shader => "SHADER",
            ResourceKind::Buffer => "BUFFER",
            ResourceKind::Framebuffer => "FRAMEBUFFER",
            ResourceKind::Renderbuffer => "RENDERBUFFER",
            ResourceKind::Texture => "TEXTURE",
            ResourceKind::VertexArray => "VERTEXARRAYOBJECT",
            ResourceKind::Uniform => "UNIFORM",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// A globally unique label for one virtual resource.
///
/// Identities order resources within a kind by creation time, which is what
/// lets them serve as indices into per-kind state tables.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Identity {
    kind: ResourceKind,
    serial: u32,
}

impl Identity {
    pub fn kind(self) -> ResourceKind {
        self.kind
    }

    pub fn serial(self) -> u32 {
        self.serial
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}_{}", self.kind.prefix(), self.serial)
    }
}

/// Mints identities, one monotonic counter per resource kind.
///
/// Each context owns one stamper, so serial numbers line up with the
/// context's per-kind tables.
#[derive(Debug, Default)]
pub struct Stamper {
    counters: [u32; ResourceKind::ALL.len()],
}

impl Stamper {
    pub fn new() -> Stamper {
        Stamper::default()
    }

    /// Mint a fresh identity of the given kind.
    pub fn mint(&mut self, kind: ResourceKind) -> Identity {
        let counter = &mut self.counters[kind.index()];
        let serial = *counter;
        *counter += 1;
        Identity { kind, serial }
    }
}

#[test]
fn minted_identities_are_distinct_and_ordered() {
    let mut stamper = Stamper::new();
    let a = stamper.mint(ResourceKind::Buffer);
    let b = stamper.mint(ResourceKind::Buffer);
    let t = stamper.mint(ResourceKind::Texture);

    assert_ne!(a, b);
    assert_eq!(a.serial(), 0);
    assert_eq!(b.serial(), 1);
    // Counters are independent per kind.
    assert_eq!(t.serial(), 0);
    assert_ne!(a, t);
}

#[test]
fn identity_is_stable_and_prefixed() {
    let mut stamper = Stamper::new();
    let id = stamper.mint(ResourceKind::Program);
    // A copy of an identity is the identity; there is nothing to restamp.
    let again = id;
    assert_eq!(id, again);
    assert_eq!(id.to_string(), "PROGRAM_0");
    assert_eq!(stamper.mint(ResourceKind::Uniform).to_string(), "UNIFORM_0");
}
