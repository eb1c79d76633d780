//! The operation table: every call the virtual context understands, with the
//! static metadata that drives how it is captured and replayed.
//!
//! Each [`Op`] names one operation of the underlying API. Its [`Descriptor`]
//! answers the three questions the recording machinery asks:
//!
//! - does replaying it produce a live handle worth caching?
//! - which argument positions hold resource references that must be resolved
//!   against the cache at replay time?
//! - must the active program be synchronized before it is enqueued?
//!
//! The table is static and exhaustive: an operation with no variant here is
//! unsupported, and there is no method for it on the context; the failure
//! mode is a compile error at the call site, not a runtime fault.
//!
//! [`Op::kind`] collapses the descriptor into the four dispatch shapes the
//! facade implements. Operations that both return a handle and consume
//! handles (creation, link, location queries, draws) are `Eager`: they are
//! hand-written on the context because they need answers or side effects
//! immediately, not at replay time.

use std::fmt;

use serde::Serialize;

/// Static capture metadata for one operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    /// Replay produces a live handle to store under the record's return
    /// identity.
    pub returns_handle: bool,
    /// Argument positions holding resource references.
    pub ref_args: &'static [usize],
    /// The active program must match before this record is enqueued.
    pub needs_program_sync: bool,
}

const PLAIN: Descriptor = Descriptor { returns_handle: false, ref_args: &[], needs_program_sync: false };
const RET: Descriptor = Descriptor { returns_handle: true, ref_args: &[], needs_program_sync: false };
const RET_REF0: Descriptor = Descriptor { returns_handle: true, ref_args: &[0], needs_program_sync: false };
const REF0: Descriptor = Descriptor { returns_handle: false, ref_args: &[0], needs_program_sync: false };
const REF1: Descriptor = Descriptor { returns_handle: false, ref_args: &[1], needs_program_sync: false };
const REF3: Descriptor = Descriptor { returns_handle: false, ref_args: &[3], needs_program_sync: false };
const REF01: Descriptor = Descriptor { returns_handle: false, ref_args: &[0, 1], needs_program_sync: false };
const UNIFORM: Descriptor = Descriptor { returns_handle: false, ref_args: &[0], needs_program_sync: true };

/// The dispatch shape of an operation, derived from its descriptor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpKind {
    /// Enqueue a record of the plain arguments; nothing to resolve.
    PureRecord,
    /// Enqueue a record whose reference slots resolve at replay time.
    DeferredRef,
    /// As `DeferredRef`, preceded by a synthesized `useProgram` when the
    /// target program is not the tracked active one.
    ProgramSynced,
    /// Hand-written on the context: runs (at least partly) right away.
    Eager,
}

/// One operation of the virtualized API.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Op {
    // Buffers.
    CreateBuffer,
    BindBuffer,
    DeleteBuffer,
    BufferData,
    BufferSubData,

    // Framebuffers.
    CreateFramebuffer,
    BindFramebuffer,
    DeleteFramebuffer,
    FramebufferTexture2D,
    FramebufferRenderbuffer,

    // Renderbuffers.
    CreateRenderbuffer,
    BindRenderbuffer,
    DeleteRenderbuffer,
    RenderbufferStorage,

    // Textures.
    CreateTexture,
    BindTexture,
    DeleteTexture,
    TexImage2D,
    TexSubImage2D,
    TexParameterf,
    TexParameteri,
    GenerateMipmap,
    ActiveTexture,
    PixelStorei,

    // Programs and shaders.
    CreateShader,
    CreateProgram,
    ShaderSource,
    CompileShader,
    AttachShader,
    DetachShader,
    LinkProgram,
    UseProgram,
    ValidateProgram,
    BindAttribLocation,
    DeleteShader,
    DeleteProgram,
    GetUniformLocation,

    // Uniform uploads.
    Uniform1f,
    Uniform2f,
    Uniform3f,
    Uniform4f,
    Uniform1i,
    Uniform2i,
    Uniform3i,
    Uniform4i,
    Uniform1fv,
    Uniform2fv,
    Uniform3fv,
    Uniform4fv,
    Uniform1iv,
    Uniform2iv,
    Uniform3iv,
    Uniform4iv,
    UniformMatrix2fv,
    UniformMatrix3fv,
    UniformMatrix4fv,

    // Vertex attributes.
    EnableVertexAttribArray,
    DisableVertexAttribArray,
    VertexAttribPointer,
    VertexAttrib1f,
    VertexAttrib2f,
    VertexAttrib3f,
    VertexAttrib4f,
    VertexAttrib1fv,
    VertexAttrib2fv,
    VertexAttrib3fv,
    VertexAttrib4fv,

    // Drawing.
    DrawArrays,
    DrawElements,
    Clear,
    Flush,
    Finish,

    // State setting.
    Enable,
    Disable,
    BlendColor,
    BlendEquation,
    BlendEquationSeparate,
    BlendFunc,
    BlendFuncSeparate,
    ClearColor,
    ClearDepth,
    ClearStencil,
    ColorMask,
    CullFace,
    DepthFunc,
    DepthMask,
    DepthRange,
    FrontFace,
    Hint,
    LineWidth,
    PolygonOffset,
    SampleCoverage,
    Scissor,
    Viewport,
    StencilFunc,
    StencilFuncSeparate,
    StencilMask,
    StencilMaskSeparate,
    StencilOp,
    StencilOpSeparate,

    // Vertex-array-object extension (emulated in software).
    CreateVertexArrayOes,
    BindVertexArrayOes,
    DeleteVertexArrayOes,
    IsVertexArrayOes,
}

impl Op {
    /// The capture metadata for this operation.
    pub fn descriptor(self) -> Descriptor {
        use Op::*;
        match self {
            CreateBuffer | CreateFramebuffer | CreateRenderbuffer | CreateTexture
            | CreateShader | CreateProgram | CreateVertexArrayOes => RET,

            BindBuffer | BindFramebuffer | BindRenderbuffer | BindTexture => REF1,

            DeleteBuffer | DeleteFramebuffer | DeleteRenderbuffer | DeleteTexture
            | DeleteShader | DeleteProgram | DeleteVertexArrayOes => REF0,

            FramebufferTexture2D | FramebufferRenderbuffer => REF3,

            ShaderSource | CompileShader | LinkProgram | UseProgram | ValidateProgram
            | BindAttribLocation | BindVertexArrayOes => REF0,

            AttachShader | DetachShader => REF01,

            GetUniformLocation | IsVertexArrayOes => RET_REF0,

            Uniform1f | Uniform2f | Uniform3f | Uniform4f
            | Uniform1i | Uniform2i | Uniform3i | Uniform4i
            | Uniform1fv | Uniform2fv | Uniform3fv | Uniform4fv
            | Uniform1iv | Uniform2iv | Uniform3iv | Uniform4iv
            | UniformMatrix2fv | UniformMatrix3fv | UniformMatrix4fv => UNIFORM,

            _ => PLAIN,
        }
    }

    /// The dispatch shape the facade uses for this operation.
    pub fn kind(self) -> OpKind {
        use Op::*;
        match self {
            // The emulated extension surface never reaches the real context
            // as these operations; the emulator turns them into diffs of the
            // underlying bind/enable/pointer calls.
            CreateVertexArrayOes | BindVertexArrayOes | DeleteVertexArrayOes
            | IsVertexArrayOes => OpKind::Eager,
            // Draw calls are the flush points where virtual meets real.
            DrawArrays | DrawElements => OpKind::Eager,
            _ => {
                let descriptor = self.descriptor();
                if descriptor.returns_handle {
                    OpKind::Eager
                } else if descriptor.needs_program_sync {
                    OpKind::ProgramSynced
                } else if !descriptor.ref_args.is_empty() {
                    OpKind::DeferredRef
                } else {
                    OpKind::PureRecord
                }
            }
        }
    }

    /// True for operations whose replay retires a cached resource.
    pub fn retires_resource(self) -> bool {
        use Op::*;
        matches!(
            self,
            DeleteBuffer | DeleteFramebuffer | DeleteRenderbuffer | DeleteTexture
                | DeleteShader | DeleteProgram
        )
    }

    /// The canonical API name, as it appears in the debug log.
    pub fn name(self) -> &'static str {
        use Op::*;
        match self {
            CreateBuffer => "createBuffer",
            BindBuffer => "bindBuffer",
            DeleteBuffer => "deleteBuffer",
            BufferData => "bufferData",
            BufferSubData => "bufferSubData",
            CreateFramebuffer => "createFramebuffer",
            BindFramebuffer => "bindFramebuffer",
            DeleteFramebuffer => "deleteFramebuffer",
            FramebufferTexture2D => "framebufferTexture2D",
            FramebufferRenderbuffer => "framebufferRenderbuffer",
            CreateRenderbuffer => "createRenderbuffer",
            BindRenderbuffer => "bindRenderbuffer",
            DeleteRenderbuffer => "deleteRenderbuffer",
            RenderbufferStorage => "renderbufferStorage",
            CreateTexture => "createTexture",
            BindTexture => "bindTexture",
            DeleteTexture => "deleteTexture",
            TexImage2D => "texImage2D",
            TexSubImage2D => "texSubImage2D",
            TexParameterf => "texParameterf",
            TexParameteri => "texParameteri",
            GenerateMipmap => "generateMipmap",
            ActiveTexture => "activeTexture",
            PixelStorei => "pixelStorei",
            CreateShader => "createShader",
            CreateProgram => "createProgram",
            ShaderSource => "shaderSource",
            CompileShader => "compileShader",
            AttachShader => "attachShader",
            DetachShader => "detachShader",
            LinkProgram => "linkProgram",
            UseProgram => "useProgram",
            ValidateProgram => "validateProgram",
            BindAttribLocation => "bindAttribLocation",
            DeleteShader => "deleteShader",
            DeleteProgram => "deleteProgram",
            GetUniformLocation => "getUniformLocation",
            Uniform1f => "uniform1f",
            Uniform2f => "uniform2f",
            Uniform3f => "uniform3f",
            Uniform4f => "uniform4f",
            Uniform1i => "uniform1i",
            Uniform2i => "uniform2i",
            Uniform3i => "uniform3i",
            Uniform4i => "uniform4i",
            Uniform1fv => "uniform1fv",
            Uniform2fv => "uniform2fv",
            Uniform3fv => "uniform3fv",
            Uniform4fv => "uniform4fv",
            Uniform1iv => "uniform1iv",
            Uniform2iv => "uniform2iv",
            Uniform3iv => "uniform3iv",
            Uniform4iv => "uniform4iv",
            UniformMatrix2fv => "uniformMatrix2fv",
            UniformMatrix3fv => "uniformMatrix3fv",
            UniformMatrix4fv => "uniformMatrix4fv",
            EnableVertexAttribArray => "enableVertexAttribArray",
            DisableVertexAttribArray => "disableVertexAttribArray",
            VertexAttribPointer => "vertexAttribPointer",
            VertexAttrib1f => "vertexAttrib1f",
            VertexAttrib2f => "vertexAttrib2f",
            VertexAttrib3f => "vertexAttrib3f",
            VertexAttrib4f => "vertexAttrib4f",
            VertexAttrib1fv => "vertexAttrib1fv",
            VertexAttrib2fv => "vertexAttrib2fv",
            VertexAttrib3fv => "vertexAttrib3fv",
            VertexAttrib4fv => "vertexAttrib4fv",
            DrawArrays => "drawArrays",
            DrawElements => "drawElements",
            Clear => "clear",
            Flush => "flush",
            Finish => "finish",
            Enable => "enable",
            Disable => "disable",
            BlendColor => "blendColor",
            BlendEquation => "blendEquation",
            BlendEquationSeparate => "blendEquationSeparate",
            BlendFunc => "blendFunc",
            BlendFuncSeparate => "blendFuncSeparate",
            ClearColor => "clearColor",
            ClearDepth => "clearDepth",
            ClearStencil => "clearStencil",
            ColorMask => "colorMask",
            CullFace => "cullFace",
            DepthFunc => "depthFunc",
            DepthMask => "depthMask",
            DepthRange => "depthRange",
            FrontFace => "frontFace",
            Hint => "hint",
            LineWidth => "lineWidth",
            PolygonOffset => "polygonOffset",
            SampleCoverage => "sampleCoverage",
            Scissor => "scissor",
            Viewport => "viewport",
            StencilFunc => "stencilFunc",
            StencilFuncSeparate => "stencilFuncSeparate",
            StencilMask => "stencilMask",
            StencilMaskSeparate => "stencilMaskSeparate",
            StencilOp => "stencilOp",
            StencilOpSeparate => "stencilOpSeparate",
            CreateVertexArrayOes => "createVertexArrayOES",
            BindVertexArrayOes => "bindVertexArrayOES",
            DeleteVertexArrayOes => "deleteVertexArrayOES",
            IsVertexArrayOes => "isVertexArrayOES",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

#[test]
fn descriptors_match_call_signatures() {
    // Bind calls reference the object in argument 1, delete calls in
    // argument 0, attach/detach in both.
    assert_eq!(Op::BindBuffer.descriptor().ref_args, &[1]);
    assert_eq!(Op::DeleteTexture.descriptor().ref_args, &[0]);
    assert_eq!(Op::AttachShader.descriptor().ref_args, &[0, 1]);
    assert_eq!(Op::FramebufferTexture2D.descriptor().ref_args, &[3]);

    // Creation returns a handle and takes none.
    let create = Op::CreateBuffer.descriptor();
    assert!(create.returns_handle);
    assert!(create.ref_args.is_empty());

    // Uniform uploads are program-relative.
    assert!(Op::UniformMatrix4fv.descriptor().needs_program_sync);
    assert!(!Op::VertexAttribPointer.descriptor().needs_program_sync);
}

#[test]
fn kinds_derive_from_descriptors() {
    assert_eq!(Op::Viewport.kind(), OpKind::PureRecord);
    assert_eq!(Op::BindBuffer.kind(), OpKind::DeferredRef);
    assert_eq!(Op::Uniform1f.kind(), OpKind::ProgramSynced);
    assert_eq!(Op::CreateTexture.kind(), OpKind::Eager);
    assert_eq!(Op::DrawElements.kind(), OpKind::Eager);
    assert_eq!(Op::BindVertexArrayOes.kind(), OpKind::Eager);
}
