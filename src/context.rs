//! The virtual context facade.
//!
//! A [`VirtualContext`] accepts the full operation surface immediately,
//! whether or not a real context exists yet. Most calls become records on the
//! context's recorder; draw calls drain the recorder into the actuator, which
//! is where virtual execution meets real execution. Creation calls run
//! eagerly enough to hand back a placeholder handle, so the created resource
//! can be referenced by every subsequent call even though nothing real has
//! been allocated.
//!
//! Each method is one of the four shapes the operation table dictates:
//!
//! - **pure record**: state setters with no resource arguments;
//! - **deferred references**: binds, attaches, and deletes, whose resource
//!   arguments are captured as identities and resolved at replay;
//! - **program-synced**: uniform uploads; if the location's owning program
//!   is not the tracked active program, a `useProgram` record is synthesized
//!   first, so upload order matches the program that was logically active;
//! - **eager**: creation, link, queries, and draws, hand-written because
//!   they must answer or flush right now.
//!
//! Program linking is the one place the facade insists on a live context:
//! attribute and uniform locations must be known before any upload can be
//! recorded correctly, so `link_program` compiles throwaway real objects,
//! harvests the introspection metadata, and deletes them. The real program
//! that eventually serves draws is built by the recorded create/attach/link
//! operations when they replay.

use std::collections::HashMap;
use std::rc::Rc;

use gleam::gl::{self, GLbitfield, GLclampf, GLenum, GLfloat, GLint, GLsizei, GLsizeiptr, GLuint};
use log::warn;
use thiserror::Error;

use crate::actuator::{Actuator, ReplayError};
use crate::call::Op;
use crate::ident::{Identity, ResourceKind, Stamper};
use crate::record::Record;
use crate::recorder::Recorder;
use crate::resources::{
    Buffer, Framebuffer, GlObject, Program, ProgramEntry, Renderbuffer, Shader, ShaderEntry,
    Texture, UniformLocation, VertexArray,
};
use crate::value::Value;
use crate::vao::{VaoEmulation, DEFAULT_MAX_VERTEX_ATTRIBS};
use crate::webgl::{ActiveInfo, WebGl};

/// Name of the one extension the context implements itself.
pub const OES_VERTEX_ARRAY_OBJECT: &str = "OES_vertex_array_object";

/// A fault surfaced by an eager facade operation.
#[derive(Error, Debug)]
pub enum ContextError {
    /// The operation needs a live context and none is attached.
    #[error("no live context attached")]
    Detached,
    /// `linkProgram` was called on a program missing a shader stage.
    #[error("program has no {stage} shader attached")]
    MissingShader { stage: &'static str },
    /// A vertex-array call was made before `OES_vertex_array_object` was
    /// requested through [`VirtualContext::get_extension`].
    #[error("the OES_vertex_array_object extension has not been enabled")]
    ExtensionNotEnabled,
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

/// Context creation attributes, mirroring the surface the canvas layer
/// forwards. Purely informational to this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextAttributes {
    pub alpha: bool,
    pub depth: bool,
    pub stencil: bool,
    pub antialias: bool,
    pub premultiplied_alpha: bool,
    pub preserve_drawing_buffer: bool,
    pub fail_if_major_performance_caveat: bool,
}

impl Default for ContextAttributes {
    fn default() -> ContextAttributes {
        ContextAttributes {
            alpha: false,
            depth: true,
            stencil: true,
            antialias: false,
            premultiplied_alpha: true,
            preserve_drawing_buffer: false,
            fail_if_major_performance_caveat: false,
        }
    }
}

/// A typed-array argument to a buffer upload, snapshotted at record time.
#[derive(Copy, Clone, Debug)]
pub enum BufferSource<'a> {
    F32(&'a [f32]),
    U16(&'a [u16]),
    Bytes(&'a [u8]),
}

impl<'a> BufferSource<'a> {
    fn to_value(self) -> Value {
        match self {
            BufferSource::F32(data) => Value::F32s(data.to_vec()),
            BufferSource::U16(data) => Value::U16s(data.to_vec()),
            BufferSource::Bytes(data) => Value::Bytes(data.to_vec()),
        }
    }
}

/// Extensions the virtual context can vend.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Extension {
    VertexArrayObject,
}

pub struct VirtualContext {
    recorder: Recorder,
    actuator: Actuator,
    stamper: Stamper,
    shaders: Vec<ShaderEntry>,
    programs: Vec<ProgramEntry>,
    /// The ARRAY_BUFFER binding as the recording side sees it.
    bound_array_buffer: Option<Identity>,
    /// Pointer → buffer associations when the VAO emulator is not active.
    attrib_buffers: HashMap<GLuint, Identity>,
    vao: Option<VaoEmulation>,
    last_error: GLenum,
    attributes: ContextAttributes,
}

impl VirtualContext {
    /// A context with no live backend. Everything queues until
    /// [`attach`](VirtualContext::attach).
    pub fn new(attributes: ContextAttributes) -> VirtualContext {
        VirtualContext {
            recorder: Recorder::new(),
            actuator: Actuator::new(),
            stamper: Stamper::new(),
            shaders: Vec::new(),
            programs: Vec::new(),
            bound_array_buffer: None,
            attrib_buffers: HashMap::new(),
            vao: None,
            last_error: gl::NO_ERROR,
            attributes,
        }
    }

    pub fn with_gl(live: Rc<dyn WebGl>, attributes: ContextAttributes) -> VirtualContext {
        let mut context = VirtualContext::new(attributes);
        context.actuator = Actuator::with_gl(live);
        context
    }

    /// Bind (or rebind) a live context. This is a drain-and-replay point:
    /// records pending in the actuator replay first, then everything still
    /// sitting in the recorder, prefixed with a `useProgram` record when the
    /// tracked active program already has a live handle, so the batch
    /// re-establishes its own program binding on the new context.
    pub fn attach(&mut self, live: Rc<dyn WebGl>) -> Result<(), ContextError> {
        self.actuator.attach(live)?;
        let realized_program = self
            .actuator
            .current_program()
            .filter(|program| self.actuator.cache().lookup(*program).is_some());
        let batch = match realized_program {
            Some(program) => self.recorder.drain_with_program_prefix(program),
            None => self.recorder.drain(),
        };
        self.actuator.play(batch)?;
        Ok(())
    }

    pub fn actuator(&self) -> &Actuator {
        &self.actuator
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Toggle the actuator's executed-operation log.
    pub fn set_debug(&mut self, debug: bool) {
        self.actuator.set_debug(debug);
    }

    /// Names of replayed operations, in execution order.
    pub fn debug_log(&self) -> &[&'static str] {
        self.actuator.debug_log()
    }

    // ----- recording helpers -----

    fn push(&mut self, op: Op, args: Vec<Value>) {
        let mut record = Record::new(op, args);
        record.mark_reference_slots(op.descriptor().ref_args);
        self.recorder.enqueue(record);
    }

    fn push_create(&mut self, op: Op, args: Vec<Value>, ident: Identity) {
        let mut record = Record::new(op, args);
        record.set_return(ident);
        self.recorder.enqueue(record);
    }

    fn push_program_synced(&mut self, op: Op, location: &UniformLocation, args: Vec<Value>) {
        if self.actuator.current_program() != Some(location.program()) {
            self.push(Op::UseProgram, vec![Value::Ident(location.program())]);
            self.actuator.set_current_program(Some(location.program()));
        }
        self.push(op, args);
    }

    fn flush_to_actuator(&mut self) -> Result<(), ContextError> {
        let batch = self.recorder.drain();
        self.actuator.play(batch)?;
        Ok(())
    }

    fn object_arg(object: Option<Identity>) -> Value {
        match object {
            Some(ident) => Value::Ident(ident),
            None => Value::Null,
        }
    }

    // ----- buffers -----

    pub fn create_buffer(&mut self) -> Buffer {
        let ident = self.stamper.mint(ResourceKind::Buffer);
        self.push_create(Op::CreateBuffer, vec![], ident);
        Buffer::new(ident)
    }

    pub fn bind_buffer(&mut self, target: GLenum, buffer: Option<&Buffer>) {
        let ident = buffer.map(GlObject::identity);
        if target == gl::ARRAY_BUFFER {
            self.bound_array_buffer = ident;
        } else if target == gl::ELEMENT_ARRAY_BUFFER {
            if let Some(emulation) = self.vao.as_mut() {
                emulation.note_element_binding(ident);
            }
        }
        self.push(Op::BindBuffer, vec![Value::Uint(target), Self::object_arg(ident)]);
    }

    pub fn delete_buffer(&mut self, buffer: &Buffer) {
        self.push(Op::DeleteBuffer, vec![Value::Ident(buffer.identity())]);
    }

    pub fn buffer_data(&mut self, target: GLenum, data: BufferSource, usage: GLenum) {
        self.push(
            Op::BufferData,
            vec![Value::Uint(target), data.to_value(), Value::Uint(usage)],
        );
    }

    /// `bufferData` with a size and no data: allocate only.
    pub fn buffer_data_uninitialized(&mut self, target: GLenum, size: GLsizeiptr, usage: GLenum) {
        self.push(
            Op::BufferData,
            vec![Value::Uint(target), Value::Uint(size as GLuint), Value::Uint(usage)],
        );
    }

    pub fn buffer_sub_data(&mut self, target: GLenum, offset: GLuint, data: BufferSource) {
        self.push(
            Op::BufferSubData,
            vec![Value::Uint(target), Value::Uint(offset), data.to_value()],
        );
    }

    // ----- framebuffers -----

    pub fn create_framebuffer(&mut self) -> Framebuffer {
        let ident = self.stamper.mint(ResourceKind::Framebuffer);
        self.push_create(Op::CreateFramebuffer, vec![], ident);
        Framebuffer::new(ident)
    }

    pub fn bind_framebuffer(&mut self, target: GLenum, framebuffer: Option<&Framebuffer>) {
        let ident = framebuffer.map(GlObject::identity);
        self.push(Op::BindFramebuffer, vec![Value::Uint(target), Self::object_arg(ident)]);
    }

    pub fn delete_framebuffer(&mut self, framebuffer: &Framebuffer) {
        self.push(Op::DeleteFramebuffer, vec![Value::Ident(framebuffer.identity())]);
    }

    pub fn framebuffer_texture_2d(
        &mut self,
        target: GLenum,
        attachment: GLenum,
        textarget: GLenum,
        texture: &Texture,
        level: GLint,
    ) {
        self.push(
            Op::FramebufferTexture2D,
            vec![
                Value::Uint(target),
                Value::Uint(attachment),
                Value::Uint(textarget),
                Value::Ident(texture.identity()),
                Value::Int(level),
            ],
        );
    }

    pub fn framebuffer_renderbuffer(
        &mut self,
        target: GLenum,
        attachment: GLenum,
        renderbuffertarget: GLenum,
        renderbuffer: &Renderbuffer,
    ) {
        self.push(
            Op::FramebufferRenderbuffer,
            vec![
                Value::Uint(target),
                Value::Uint(attachment),
                Value::Uint(renderbuffertarget),
                Value::Ident(renderbuffer.identity()),
            ],
        );
    }

    /// Virtual framebuffers are always reported complete; real completeness
    /// is only knowable after replay.
    pub fn check_framebuffer_status(&self, _target: GLenum) -> GLenum {
        gl::FRAMEBUFFER_COMPLETE
    }

    // ----- renderbuffers -----

    pub fn create_renderbuffer(&mut self) -> Renderbuffer {
        let ident = self.stamper.mint(ResourceKind::Renderbuffer);
        self.push_create(Op::CreateRenderbuffer, vec![], ident);
        Renderbuffer::new(ident)
    }

    pub fn bind_renderbuffer(&mut self, target: GLenum, renderbuffer: Option<&Renderbuffer>) {
        let ident = renderbuffer.map(GlObject::identity);
        self.push(Op::BindRenderbuffer, vec![Value::Uint(target), Self::object_arg(ident)]);
    }

    pub fn delete_renderbuffer(&mut self, renderbuffer: &Renderbuffer) {
        self.push(Op::DeleteRenderbuffer, vec![Value::Ident(renderbuffer.identity())]);
    }

    pub fn renderbuffer_storage(
        &mut self,
        target: GLenum,
        internalformat: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        self.push(
            Op::RenderbufferStorage,
            vec![
                Value::Uint(target),
                Value::Uint(internalformat),
                Value::Int(width),
                Value::Int(height),
            ],
        );
    }

    // ----- textures -----

    pub fn create_texture(&mut self) -> Texture {
        let ident = self.stamper.mint(ResourceKind::Texture);
        self.push_create(Op::CreateTexture, vec![], ident);
        Texture::new(ident)
    }

    pub fn bind_texture(&mut self, target: GLenum, texture: Option<&Texture>) {
        let ident = texture.map(GlObject::identity);
        self.push(Op::BindTexture, vec![Value::Uint(target), Self::object_arg(ident)]);
    }

    pub fn delete_texture(&mut self, texture: &Texture) {
        self.push(Op::DeleteTexture, vec![Value::Ident(texture.identity())]);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tex_image_2d(
        &mut self,
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        format: GLenum,
        ty: GLenum,
        pixels: Option<&[u8]>,
    ) {
        let pixels = match pixels {
            Some(data) => Value::Bytes(data.to_vec()),
            None => Value::Null,
        };
        self.push(
            Op::TexImage2D,
            vec![
                Value::Uint(target),
                Value::Int(level),
                Value::Int(internal_format),
                Value::Int(width),
                Value::Int(height),
                Value::Int(border),
                Value::Uint(format),
                Value::Uint(ty),
                pixels,
            ],
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tex_sub_image_2d(
        &mut self,
        target: GLenum,
        level: GLint,
        xoffset: GLint,
        yoffset: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: &[u8],
    ) {
        self.push(
            Op::TexSubImage2D,
            vec![
                Value::Uint(target),
                Value::Int(level),
                Value::Int(xoffset),
                Value::Int(yoffset),
                Value::Int(width),
                Value::Int(height),
                Value::Uint(format),
                Value::Uint(ty),
                Value::Bytes(pixels.to_vec()),
            ],
        );
    }

    pub fn tex_parameter_f(&mut self, target: GLenum, pname: GLenum, param: GLfloat) {
        self.push(
            Op::TexParameterf,
            vec![Value::Uint(target), Value::Uint(pname), Value::Float(param)],
        );
    }

    pub fn tex_parameter_i(&mut self, target: GLenum, pname: GLenum, param: GLint) {
        self.push(
            Op::TexParameteri,
            vec![Value::Uint(target), Value::Uint(pname), Value::Int(param)],
        );
    }

    pub fn generate_mipmap(&mut self, target: GLenum) {
        self.push(Op::GenerateMipmap, vec![Value::Uint(target)]);
    }

    pub fn active_texture(&mut self, texture: GLenum) {
        self.push(Op::ActiveTexture, vec![Value::Uint(texture)]);
    }

    pub fn pixel_store_i(&mut self, pname: GLenum, param: GLint) {
        self.push(Op::PixelStorei, vec![Value::Uint(pname), Value::Int(param)]);
    }

    // ----- programs and shaders -----

    pub fn create_shader(&mut self, ty: GLenum) -> Shader {
        let ident = self.stamper.mint(ResourceKind::Shader);
        debug_assert_eq!(ident.serial() as usize, self.shaders.len());
        self.shaders.push(ShaderEntry::new(ty));
        self.push_create(Op::CreateShader, vec![Value::Uint(ty)], ident);
        Shader::new(ident)
    }

    pub fn create_program(&mut self) -> Program {
        let ident = self.stamper.mint(ResourceKind::Program);
        debug_assert_eq!(ident.serial() as usize, self.programs.len());
        self.programs.push(ProgramEntry::default());
        self.push_create(Op::CreateProgram, vec![], ident);
        Program::new(ident)
    }

    pub fn shader_source(&mut self, shader: &Shader, source: &str) {
        self.shaders[shader.identity().serial() as usize].source = source.to_string();
        self.push(
            Op::ShaderSource,
            vec![Value::Ident(shader.identity()), Value::from(source)],
        );
    }

    pub fn compile_shader(&mut self, shader: &Shader) {
        self.shaders[shader.identity().serial() as usize].compiled = true;
        self.push(Op::CompileShader, vec![Value::Ident(shader.identity())]);
    }

    pub fn attach_shader(&mut self, program: &Program, shader: &Shader) {
        let ty = self.shaders[shader.identity().serial() as usize].ty;
        let entry = &mut self.programs[program.identity().serial() as usize];
        if ty == gl::VERTEX_SHADER {
            entry.vertex_shader = Some(shader.identity());
        } else if ty == gl::FRAGMENT_SHADER {
            entry.fragment_shader = Some(shader.identity());
        }
        self.push(
            Op::AttachShader,
            vec![Value::Ident(program.identity()), Value::Ident(shader.identity())],
        );
    }

    pub fn detach_shader(&mut self, program: &Program, shader: &Shader) {
        let entry = &mut self.programs[program.identity().serial() as usize];
        if entry.vertex_shader == Some(shader.identity()) {
            entry.vertex_shader = None;
        }
        if entry.fragment_shader == Some(shader.identity()) {
            entry.fragment_shader = None;
        }
        self.push(
            Op::DetachShader,
            vec![Value::Ident(program.identity()), Value::Ident(shader.identity())],
        );
    }

    pub fn bind_attrib_location(&mut self, program: &Program, index: GLuint, name: &str) {
        self.push(
            Op::BindAttribLocation,
            vec![Value::Ident(program.identity()), Value::Uint(index), Value::from(name)],
        );
    }

    pub fn validate_program(&mut self, program: &Program) {
        self.push(Op::ValidateProgram, vec![Value::Ident(program.identity())]);
    }

    pub fn use_program(&mut self, program: &Program) {
        self.push(Op::UseProgram, vec![Value::Ident(program.identity())]);
        self.actuator.set_current_program(Some(program.identity()));
    }

    pub fn delete_shader(&mut self, shader: &Shader) {
        self.shaders[shader.identity().serial() as usize].deleted = true;
        self.push(Op::DeleteShader, vec![Value::Ident(shader.identity())]);
    }

    pub fn delete_program(&mut self, program: &Program) {
        self.programs[program.identity().serial() as usize].deleted = true;
        self.push(Op::DeleteProgram, vec![Value::Ident(program.identity())]);
    }

    /// Link `program`: record the operation for replay, and eagerly compile
    /// and link throwaway real objects to harvest the attribute and uniform
    /// metadata that later calls need immediately. Attribute locations are
    /// handed out as sequential indices; each active uniform gets a freshly
    /// stamped placeholder location. The throwaway objects are deleted
    /// before returning; only the metadata survives.
    pub fn link_program(&mut self, program: &Program) -> Result<(), ContextError> {
        self.push(Op::LinkProgram, vec![Value::Ident(program.identity())]);

        let live = self.actuator.gl().ok_or(ContextError::Detached)?;
        let serial = program.identity().serial() as usize;
        let (vs_ident, fs_ident) = {
            let entry = &self.programs[serial];
            (
                entry.vertex_shader.ok_or(ContextError::MissingShader { stage: "vertex" })?,
                entry.fragment_shader.ok_or(ContextError::MissingShader { stage: "fragment" })?,
            )
        };
        let vs = &self.shaders[vs_ident.serial() as usize];
        let fs = &self.shaders[fs_ident.serial() as usize];

        let vshader = live.create_shader(vs.ty);
        live.shader_source(vshader, &vs.source);
        live.compile_shader(vshader);
        let fshader = live.create_shader(fs.ty);
        live.shader_source(fshader, &fs.source);
        live.compile_shader(fshader);

        let linked = live.create_program();
        live.attach_shader(linked, vshader);
        live.attach_shader(linked, fshader);
        live.link_program(linked);

        let attrib_count = live.get_program_parameter(linked, gl::ACTIVE_ATTRIBUTES);
        let mut attributes = Vec::new();
        for index in 0..attrib_count {
            if let Some(info) = live.get_active_attrib(linked, index as GLuint) {
                attributes.push(info);
            }
        }
        let uniform_count = live.get_program_parameter(linked, gl::ACTIVE_UNIFORMS);
        let mut uniforms = Vec::new();
        for index in 0..uniform_count {
            if let Some(info) = live.get_active_uniform(linked, index as GLuint) {
                uniforms.push(info);
            }
        }

        live.delete_shader(vshader);
        live.delete_shader(fshader);
        live.delete_program(linked);

        let program_ident = program.identity();
        let entry = &mut self.programs[serial];
        entry.attrib_locations = attributes
            .iter()
            .enumerate()
            .map(|(index, info)| (info.name.clone(), index as GLint))
            .collect();
        entry.uniform_locations.clear();
        for info in &uniforms {
            let ident = self.stamper.mint(ResourceKind::Uniform);
            entry
                .uniform_locations
                .insert(info.name.clone(), UniformLocation::new(ident, program_ident));
        }
        entry.attributes = attributes;
        entry.uniforms = uniforms;
        entry.linked = true;
        Ok(())
    }

    /// The attribute location cache, populated by `link_program`. Absent
    /// before link, and for names the linked program does not use.
    pub fn get_attrib_location(&self, program: &Program, name: &str) -> Option<GLint> {
        let entry = self.programs.get(program.identity().serial() as usize)?;
        if !entry.linked {
            return None;
        }
        entry.attrib_locations.get(name).copied()
    }

    /// The uniform location cache, populated by `link_program`. A hit also
    /// records the lookup, so replay realizes the live location under the
    /// placeholder's identity.
    pub fn get_uniform_location(
        &mut self,
        program: &Program,
        name: &str,
    ) -> Option<UniformLocation> {
        let entry = self.programs.get(program.identity().serial() as usize)?;
        if !entry.linked {
            return None;
        }
        let location = *entry.uniform_locations.get(name)?;

        let mut record = Record::new(
            Op::GetUniformLocation,
            vec![Value::Ident(program.identity()), Value::from(name)],
        );
        record.mark_reference_slots(Op::GetUniformLocation.descriptor().ref_args);
        record.set_return(location.identity());
        self.recorder.enqueue(record);
        Some(location)
    }

    pub fn get_shader_parameter(&self, shader: &Shader, pname: GLenum) -> Option<GLint> {
        let entry = self.shaders.get(shader.identity().serial() as usize)?;
        match pname {
            gl::SHADER_TYPE => Some(entry.ty as GLint),
            gl::COMPILE_STATUS => Some(entry.compiled as GLint),
            gl::DELETE_STATUS => Some(entry.deleted as GLint),
            _ => None,
        }
    }

    pub fn get_program_parameter(&self, program: &Program, pname: GLenum) -> Option<GLint> {
        let entry = self.programs.get(program.identity().serial() as usize)?;
        match pname {
            gl::ACTIVE_ATTRIBUTES => Some(entry.attributes.len() as GLint),
            gl::ACTIVE_UNIFORMS => Some(entry.uniforms.len() as GLint),
            gl::ATTACHED_SHADERS => Some(entry.attached_count()),
            gl::LINK_STATUS => Some(entry.linked as GLint),
            gl::DELETE_STATUS => Some(entry.deleted as GLint),
            _ => None,
        }
    }

    pub fn get_active_attrib(&self, program: &Program, index: GLuint) -> Option<&ActiveInfo> {
        self.programs
            .get(program.identity().serial() as usize)?
            .attributes
            .get(index as usize)
    }

    pub fn get_active_uniform(&self, program: &Program, index: GLuint) -> Option<&ActiveInfo> {
        self.programs
            .get(program.identity().serial() as usize)?
            .uniforms
            .get(index as usize)
    }

    /// Shader diagnostics only exist on the real context; the virtual layer
    /// has nothing to report.
    pub fn get_shader_info_log(&self, _shader: &Shader) -> &'static str {
        ""
    }

    pub fn get_program_info_log(&self, _program: &Program) -> &'static str {
        ""
    }

    // ----- uniform uploads -----

    pub fn uniform_1f(&mut self, location: &UniformLocation, x: GLfloat) {
        let args = vec![Value::Ident(location.identity()), Value::Float(x)];
        self.push_program_synced(Op::Uniform1f, location, args);
    }

    pub fn uniform_2f(&mut self, location: &UniformLocation, x: GLfloat, y: GLfloat) {
        let args = vec![Value::Ident(location.identity()), Value::Float(x), Value::Float(y)];
        self.push_program_synced(Op::Uniform2f, location, args);
    }

    pub fn uniform_3f(&mut self, location: &UniformLocation, x: GLfloat, y: GLfloat, z: GLfloat) {
        let args = vec![
            Value::Ident(location.identity()),
            Value::Float(x),
            Value::Float(y),
            Value::Float(z),
        ];
        self.push_program_synced(Op::Uniform3f, location, args);
    }

    pub fn uniform_4f(
        &mut self,
        location: &UniformLocation,
        x: GLfloat,
        y: GLfloat,
        z: GLfloat,
        w: GLfloat,
    ) {
        let args = vec![
            Value::Ident(location.identity()),
            Value::Float(x),
            Value::Float(y),
            Value::Float(z),
            Value::Float(w),
        ];
        self.push_program_synced(Op::Uniform4f, location, args);
    }

    pub fn uniform_1i(&mut self, location: &UniformLocation, x: GLint) {
        let args = vec![Value::Ident(location.identity()), Value::Int(x)];
        self.push_program_synced(Op::Uniform1i, location, args);
    }

    pub fn uniform_2i(&mut self, location: &UniformLocation, x: GLint, y: GLint) {
        let args = vec![Value::Ident(location.identity()), Value::Int(x), Value::Int(y)];
        self.push_program_synced(Op::Uniform2i, location, args);
    }

    pub fn uniform_3i(&mut self, location: &UniformLocation, x: GLint, y: GLint, z: GLint) {
        let args = vec![
            Value::Ident(location.identity()),
            Value::Int(x),
            Value::Int(y),
            Value::Int(z),
        ];
        self.push_program_synced(Op::Uniform3i, location, args);
    }

    pub fn uniform_4i(
        &mut self,
        location: &UniformLocation,
        x: GLint,
        y: GLint,
        z: GLint,
        w: GLint,
    ) {
        let args = vec![
            Value::Ident(location.identity()),
            Value::Int(x),
            Value::Int(y),
            Value::Int(z),
            Value::Int(w),
        ];
        self.push_program_synced(Op::Uniform4i, location, args);
    }

    pub fn uniform_1fv(&mut self, location: &UniformLocation, values: &[f32]) {
        self.push_uniform_fv(Op::Uniform1fv, location, values);
    }

    pub fn uniform_2fv(&mut self, location: &UniformLocation, values: &[f32]) {
        self.push_uniform_fv(Op::Uniform2fv, location, values);
    }

    pub fn uniform_3fv(&mut self, location: &UniformLocation, values: &[f32]) {
        self.push_uniform_fv(Op::Uniform3fv, location, values);
    }

    pub fn uniform_4fv(&mut self, location: &UniformLocation, values: &[f32]) {
        self.push_uniform_fv(Op::Uniform4fv, location, values);
    }

    fn push_uniform_fv(&mut self, op: Op, location: &UniformLocation, values: &[f32]) {
        let args = vec![Value::Ident(location.identity()), Value::from(values)];
        self.push_program_synced(op, location, args);
    }

    pub fn uniform_1iv(&mut self, location: &UniformLocation, values: &[i32]) {
        self.push_uniform_iv(Op::Uniform1iv, location, values);
    }

    pub fn uniform_2iv(&mut self, location: &UniformLocation, values: &[i32]) {
        self.push_uniform_iv(Op::Uniform2iv, location, values);
    }

    pub fn uniform_3iv(&mut self, location: &UniformLocation, values: &[i32]) {
        self.push_uniform_iv(Op::Uniform3iv, location, values);
    }

    pub fn uniform_4iv(&mut self, location: &UniformLocation, values: &[i32]) {
        self.push_uniform_iv(Op::Uniform4iv, location, values);
    }

    fn push_uniform_iv(&mut self, op: Op, location: &UniformLocation, values: &[i32]) {
        let args = vec![Value::Ident(location.identity()), Value::from(values)];
        self.push_program_synced(op, location, args);
    }

    pub fn uniform_matrix_2fv(
        &mut self,
        location: &UniformLocation,
        transpose: bool,
        values: &[f32],
    ) {
        self.push_uniform_matrix(Op::UniformMatrix2fv, location, transpose, values);
    }

    pub fn uniform_matrix_3fv(
        &mut self,
        location: &UniformLocation,
        transpose: bool,
        values: &[f32],
    ) {
        self.push_uniform_matrix(Op::UniformMatrix3fv, location, transpose, values);
    }

    pub fn uniform_matrix_4fv(
        &mut self,
        location: &UniformLocation,
        transpose: bool,
        values: &[f32],
    ) {
        self.push_uniform_matrix(Op::UniformMatrix4fv, location, transpose, values);
    }

    fn push_uniform_matrix(
        &mut self,
        op: Op,
        location: &UniformLocation,
        transpose: bool,
        values: &[f32],
    ) {
        let args = vec![
            Value::Ident(location.identity()),
            Value::Bool(transpose),
            Value::from(values),
        ];
        self.push_program_synced(op, location, args);
    }

    // ----- vertex attributes -----

    pub fn enable_vertex_attrib_array(&mut self, index: GLuint) {
        if let Some(emulation) = self.vao.as_mut() {
            emulation.note_enable(index as usize);
        }
        self.push(Op::EnableVertexAttribArray, vec![Value::Uint(index)]);
    }

    pub fn disable_vertex_attrib_array(&mut self, index: GLuint) {
        if let Some(emulation) = self.vao.as_mut() {
            emulation.note_disable(index as usize);
        }
        self.push(Op::DisableVertexAttribArray, vec![Value::Uint(index)]);
    }

    pub fn vertex_attrib_pointer(
        &mut self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: GLuint,
    ) {
        match self.bound_array_buffer {
            Some(buffer) => {
                self.attrib_buffers.insert(index, buffer);
            }
            None => {
                self.attrib_buffers.remove(&index);
            }
        }
        let bound = self.bound_array_buffer;
        if let Some(emulation) = self.vao.as_mut() {
            emulation.note_pointer(index as usize, size, ty, normalized, stride, offset, bound);
        }
        self.push(
            Op::VertexAttribPointer,
            vec![
                Value::Uint(index),
                Value::Int(size),
                Value::Uint(ty),
                Value::Bool(normalized),
                Value::Int(stride),
                Value::Uint(offset),
            ],
        );
    }

    pub fn vertex_attrib_1f(&mut self, index: GLuint, x: GLfloat) {
        self.push(Op::VertexAttrib1f, vec![Value::Uint(index), Value::Float(x)]);
    }

    pub fn vertex_attrib_2f(&mut self, index: GLuint, x: GLfloat, y: GLfloat) {
        self.push(
            Op::VertexAttrib2f,
            vec![Value::Uint(index), Value::Float(x), Value::Float(y)],
        );
    }

    pub fn vertex_attrib_3f(&mut self, index: GLuint, x: GLfloat, y: GLfloat, z: GLfloat) {
        self.push(
            Op::VertexAttrib3f,
            vec![Value::Uint(index), Value::Float(x), Value::Float(y), Value::Float(z)],
        );
    }

    pub fn vertex_attrib_4f(
        &mut self,
        index: GLuint,
        x: GLfloat,
        y: GLfloat,
        z: GLfloat,
        w: GLfloat,
    ) {
        self.push(
            Op::VertexAttrib4f,
            vec![
                Value::Uint(index),
                Value::Float(x),
                Value::Float(y),
                Value::Float(z),
                Value::Float(w),
            ],
        );
    }

    pub fn vertex_attrib_1fv(&mut self, index: GLuint, values: &[f32]) {
        self.push(Op::VertexAttrib1fv, vec![Value::Uint(index), Value::from(values)]);
    }

    pub fn vertex_attrib_2fv(&mut self, index: GLuint, values: &[f32]) {
        self.push(Op::VertexAttrib2fv, vec![Value::Uint(index), Value::from(values)]);
    }

    pub fn vertex_attrib_3fv(&mut self, index: GLuint, values: &[f32]) {
        self.push(Op::VertexAttrib3fv, vec![Value::Uint(index), Value::from(values)]);
    }

    pub fn vertex_attrib_4fv(&mut self, index: GLuint, values: &[f32]) {
        self.push(Op::VertexAttrib4fv, vec![Value::Uint(index), Value::from(values)]);
    }

    /// Answer a vertex-attribute query from shadow state. With the VAO
    /// emulator active the full pointer state is known; without it, only the
    /// buffer binding is tracked.
    pub fn get_vertex_attrib(&self, index: GLuint, pname: GLenum) -> Option<Value> {
        if let Some(emulation) = &self.vao {
            let attrib = emulation.attrib(index as usize)?;
            return match pname {
                gl::VERTEX_ATTRIB_ARRAY_BUFFER_BINDING => {
                    Some(attrib.buffer.map_or(Value::Null, Value::Ident))
                }
                gl::VERTEX_ATTRIB_ARRAY_ENABLED => Some(Value::Bool(attrib.enabled)),
                gl::VERTEX_ATTRIB_ARRAY_SIZE => Some(Value::Int(attrib.size)),
                gl::VERTEX_ATTRIB_ARRAY_STRIDE => Some(Value::Int(attrib.stride)),
                gl::VERTEX_ATTRIB_ARRAY_TYPE => Some(Value::Uint(attrib.ty)),
                gl::VERTEX_ATTRIB_ARRAY_NORMALIZED => Some(Value::Bool(attrib.normalized)),
                _ => None,
            };
        }
        match pname {
            gl::VERTEX_ATTRIB_ARRAY_BUFFER_BINDING => Some(
                self.attrib_buffers
                    .get(&index)
                    .map_or(Value::Null, |ident| Value::Ident(*ident)),
            ),
            _ => None,
        }
    }

    // ----- drawing -----

    /// Record the draw, then drain the queue into the actuator. This is the
    /// synchronization point where virtual and real execution meet.
    pub fn draw_arrays(
        &mut self,
        mode: GLenum,
        first: GLint,
        count: GLsizei,
    ) -> Result<(), ContextError> {
        self.push(
            Op::DrawArrays,
            vec![Value::Uint(mode), Value::Int(first), Value::Int(count)],
        );
        self.flush_to_actuator()
    }

    pub fn draw_elements(
        &mut self,
        mode: GLenum,
        count: GLsizei,
        ty: GLenum,
        offset: GLuint,
    ) -> Result<(), ContextError> {
        self.push(
            Op::DrawElements,
            vec![Value::Uint(mode), Value::Int(count), Value::Uint(ty), Value::Uint(offset)],
        );
        self.flush_to_actuator()
    }

    pub fn clear(&mut self, mask: GLbitfield) {
        self.push(Op::Clear, vec![Value::Uint(mask)]);
    }

    pub fn flush(&mut self) {
        self.push(Op::Flush, vec![]);
    }

    pub fn finish(&mut self) {
        self.push(Op::Finish, vec![]);
    }

    // ----- state setting -----

    pub fn enable(&mut self, cap: GLenum) {
        self.push(Op::Enable, vec![Value::Uint(cap)]);
    }

    pub fn disable(&mut self, cap: GLenum) {
        self.push(Op::Disable, vec![Value::Uint(cap)]);
    }

    pub fn blend_color(&mut self, r: GLclampf, g: GLclampf, b: GLclampf, a: GLclampf) {
        self.push(
            Op::BlendColor,
            vec![Value::Float(r), Value::Float(g), Value::Float(b), Value::Float(a)],
        );
    }

    pub fn blend_equation(&mut self, mode: GLenum) {
        self.push(Op::BlendEquation, vec![Value::Uint(mode)]);
    }

    pub fn blend_equation_separate(&mut self, mode_rgb: GLenum, mode_alpha: GLenum) {
        self.push(
            Op::BlendEquationSeparate,
            vec![Value::Uint(mode_rgb), Value::Uint(mode_alpha)],
        );
    }

    pub fn blend_func(&mut self, src: GLenum, dst: GLenum) {
        self.push(Op::BlendFunc, vec![Value::Uint(src), Value::Uint(dst)]);
    }

    pub fn blend_func_separate(
        &mut self,
        src_rgb: GLenum,
        dst_rgb: GLenum,
        src_alpha: GLenum,
        dst_alpha: GLenum,
    ) {
        self.push(
            Op::BlendFuncSeparate,
            vec![
                Value::Uint(src_rgb),
                Value::Uint(dst_rgb),
                Value::Uint(src_alpha),
                Value::Uint(dst_alpha),
            ],
        );
    }

    pub fn clear_color(&mut self, r: GLclampf, g: GLclampf, b: GLclampf, a: GLclampf) {
        self.push(
            Op::ClearColor,
            vec![Value::Float(r), Value::Float(g), Value::Float(b), Value::Float(a)],
        );
    }

    pub fn clear_depth(&mut self, depth: GLclampf) {
        self.push(Op::ClearDepth, vec![Value::Float(depth)]);
    }

    pub fn clear_stencil(&mut self, s: GLint) {
        self.push(Op::ClearStencil, vec![Value::Int(s)]);
    }

    pub fn color_mask(&mut self, r: bool, g: bool, b: bool, a: bool) {
        self.push(
            Op::ColorMask,
            vec![Value::Bool(r), Value::Bool(g), Value::Bool(b), Value::Bool(a)],
        );
    }

    pub fn cull_face(&mut self, mode: GLenum) {
        self.push(Op::CullFace, vec![Value::Uint(mode)]);
    }

    pub fn depth_func(&mut self, func: GLenum) {
        self.push(Op::DepthFunc, vec![Value::Uint(func)]);
    }

    pub fn depth_mask(&mut self, flag: bool) {
        self.push(Op::DepthMask, vec![Value::Bool(flag)]);
    }

    pub fn depth_range(&mut self, near: GLclampf, far: GLclampf) {
        self.push(Op::DepthRange, vec![Value::Float(near), Value::Float(far)]);
    }

    pub fn front_face(&mut self, mode: GLenum) {
        self.push(Op::FrontFace, vec![Value::Uint(mode)]);
    }

    pub fn hint(&mut self, target: GLenum, mode: GLenum) {
        self.push(Op::Hint, vec![Value::Uint(target), Value::Uint(mode)]);
    }

    pub fn line_width(&mut self, width: GLfloat) {
        self.push(Op::LineWidth, vec![Value::Float(width)]);
    }

    pub fn polygon_offset(&mut self, factor: GLfloat, units: GLfloat) {
        self.push(Op::PolygonOffset, vec![Value::Float(factor), Value::Float(units)]);
    }

    pub fn sample_coverage(&mut self, value: GLclampf, invert: bool) {
        self.push(Op::SampleCoverage, vec![Value::Float(value), Value::Bool(invert)]);
    }

    pub fn scissor(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.push(
            Op::Scissor,
            vec![Value::Int(x), Value::Int(y), Value::Int(width), Value::Int(height)],
        );
    }

    pub fn viewport(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.push(
            Op::Viewport,
            vec![Value::Int(x), Value::Int(y), Value::Int(width), Value::Int(height)],
        );
    }

    pub fn stencil_func(&mut self, func: GLenum, reference: GLint, mask: GLuint) {
        self.push(
            Op::StencilFunc,
            vec![Value::Uint(func), Value::Int(reference), Value::Uint(mask)],
        );
    }

    pub fn stencil_func_separate(
        &mut self,
        face: GLenum,
        func: GLenum,
        reference: GLint,
        mask: GLuint,
    ) {
        self.push(
            Op::StencilFuncSeparate,
            vec![
                Value::Uint(face),
                Value::Uint(func),
                Value::Int(reference),
                Value::Uint(mask),
            ],
        );
    }

    pub fn stencil_mask(&mut self, mask: GLuint) {
        self.push(Op::StencilMask, vec![Value::Uint(mask)]);
    }

    pub fn stencil_mask_separate(&mut self, face: GLenum, mask: GLuint) {
        self.push(Op::StencilMaskSeparate, vec![Value::Uint(face), Value::Uint(mask)]);
    }

    pub fn stencil_op(&mut self, fail: GLenum, zfail: GLenum, zpass: GLenum) {
        self.push(
            Op::StencilOp,
            vec![Value::Uint(fail), Value::Uint(zfail), Value::Uint(zpass)],
        );
    }

    pub fn stencil_op_separate(&mut self, face: GLenum, fail: GLenum, zfail: GLenum, zpass: GLenum) {
        self.push(
            Op::StencilOpSeparate,
            vec![
                Value::Uint(face),
                Value::Uint(fail),
                Value::Uint(zfail),
                Value::Uint(zpass),
            ],
        );
    }

    // ----- context-level queries -----

    /// The last reported error, cleared by reading it.
    pub fn get_error(&mut self) -> GLenum {
        std::mem::replace(&mut self.last_error, gl::NO_ERROR)
    }

    pub fn get_context_attributes(&self) -> &ContextAttributes {
        &self.attributes
    }

    pub fn get_supported_extensions(&self) -> Vec<&'static str> {
        vec![OES_VERTEX_ARRAY_OBJECT]
    }

    /// Request an extension. `OES_vertex_array_object` switches on the VAO
    /// emulator; everything else is unsupported.
    pub fn get_extension(&mut self, name: &str) -> Option<Extension> {
        if name != OES_VERTEX_ARRAY_OBJECT {
            return None;
        }
        if self.vao.is_none() {
            let max_attribs = self
                .actuator
                .gl()
                .map(|live| live.get_parameter(gl::MAX_VERTEX_ATTRIBS))
                .filter(|&count| count > 0)
                .map_or(DEFAULT_MAX_VERTEX_ATTRIBS, |count| count as usize);
            self.vao = Some(VaoEmulation::new(max_attribs));
        }
        Some(Extension::VertexArrayObject)
    }

    /// Scalar parameter pass-through to the live context.
    pub fn get_parameter(&self, pname: GLenum) -> Result<GLint, ContextError> {
        let live = self.actuator.gl().ok_or(ContextError::Detached)?;
        Ok(live.get_parameter(pname))
    }

    // ----- vertex-array objects (emulated) -----

    /// The currently bound emulated VAO; `None` when the default is bound or
    /// the extension is off.
    pub fn current_vertex_array(&self) -> Option<VertexArray> {
        self.vao.as_ref()?.current_identity().map(VertexArray::new)
    }

    pub fn create_vertex_array_oes(&mut self) -> Result<VertexArray, ContextError> {
        let emulation = self.vao.as_mut().ok_or(ContextError::ExtensionNotEnabled)?;
        let ident = self.stamper.mint(ResourceKind::VertexArray);
        emulation.create(ident);
        Ok(VertexArray::new(ident))
    }

    /// Switch the active VAO; `None` binds the default. Binding a deleted
    /// VAO reports `INVALID_OPERATION` through
    /// [`get_error`](VirtualContext::get_error) and leaves the binding
    /// unchanged.
    pub fn bind_vertex_array_oes(&mut self, vao: Option<&VertexArray>) {
        let bound = self.bound_array_buffer;
        let emulation = match self.vao.as_mut() {
            Some(emulation) => emulation,
            None => {
                self.last_error = gl::INVALID_OPERATION;
                return;
            }
        };
        match emulation.bind(vao.map(GlObject::identity), bound) {
            Ok(records) => {
                for record in records {
                    self.recorder.enqueue(record);
                }
            }
            Err(err) => {
                warn!("bindVertexArrayOES: {}", err);
                self.last_error = gl::INVALID_OPERATION;
            }
        }
    }

    /// Delete an emulated VAO. If it was current, the default VAO is
    /// rebound.
    pub fn delete_vertex_array_oes(&mut self, vao: &VertexArray) {
        let bound = self.bound_array_buffer;
        if let Some(emulation) = self.vao.as_mut() {
            let records = emulation.delete(vao.identity(), bound);
            for record in records {
                self.recorder.enqueue(record);
            }
        }
    }

    /// True only for a live VAO that has been bound at least once.
    pub fn is_vertex_array_oes(&self, vao: &VertexArray) -> bool {
        self.vao
            .as_ref()
            .map_or(false, |emulation| emulation.is_vertex_array(vao.identity()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testgl::TestGl;

    fn linked_program(
        context: &mut VirtualContext,
    ) -> (Program, Shader, Shader) {
        let vs = context.create_shader(gl::VERTEX_SHADER);
        context.shader_source(&vs, "void main() {}");
        context.compile_shader(&vs);
        let fs = context.create_shader(gl::FRAGMENT_SHADER);
        context.shader_source(&fs, "void main() {}");
        context.compile_shader(&fs);
        let program = context.create_program();
        context.attach_shader(&program, &vs);
        context.attach_shader(&program, &fs);
        context.link_program(&program).unwrap();
        (program, vs, fs)
    }

    fn context_with_program_metadata() -> (VirtualContext, Rc<TestGl>) {
        let live = Rc::new(TestGl::with_program(
            vec![
                ActiveInfo::new("a_position", gl::FLOAT_VEC2, 1),
                ActiveInfo::new("a_uv", gl::FLOAT_VEC2, 1),
            ],
            vec![
                ActiveInfo::new("u_matrix", gl::FLOAT_MAT4, 1),
                ActiveInfo::new("u_opacity", gl::FLOAT, 1),
                ActiveInfo::new("u_sampler", gl::SAMPLER_2D, 1),
            ],
        ));
        let context = VirtualContext::with_gl(live.clone(), ContextAttributes::default());
        (context, live)
    }

    #[test]
    fn scenario_buffer_setup_then_draw() {
        let live = Rc::new(TestGl::new());
        let mut context = VirtualContext::with_gl(live.clone(), ContextAttributes::default());
        context.set_debug(true);

        let buffer = context.create_buffer();
        context.bind_buffer(gl::ARRAY_BUFFER, Some(&buffer));
        context.buffer_data(gl::ARRAY_BUFFER, BufferSource::F32(&[0.0, 0.0, 0.0]), gl::STATIC_DRAW);
        context.draw_arrays(gl::TRIANGLES, 0, 3).unwrap();

        assert_eq!(
            context.debug_log(),
            &["createBuffer", "bindBuffer", "bufferData", "drawArrays"]
        );
        let cache = context.actuator().cache();
        assert_eq!(cache.bucket_len(ResourceKind::Buffer), 1);
        assert!(cache.lookup(buffer.identity()).is_some());
    }

    #[test]
    fn calls_issued_before_a_context_exists_replay_on_attach() {
        let mut context = VirtualContext::new(ContextAttributes::default());

        let buffer = context.create_buffer();
        context.bind_buffer(gl::ARRAY_BUFFER, Some(&buffer));
        context.buffer_data(gl::ARRAY_BUFFER, BufferSource::F32(&[1.0, 2.0]), gl::STATIC_DRAW);
        // The draw flushes into the actuator, which has nowhere to play yet.
        context.draw_arrays(gl::TRIANGLES, 0, 1).unwrap();
        assert_eq!(context.actuator().pending_len(), 4);

        let live = Rc::new(TestGl::new());
        context.attach(live.clone()).unwrap();
        let calls = live.take_calls();
        assert_eq!(calls.len(), 4);
        assert!(calls[0].starts_with("createBuffer"));
        assert!(calls[3].starts_with("drawArrays"));
        assert!(context.actuator().cache().lookup(buffer.identity()).is_some());
    }

    #[test]
    fn link_populates_location_caches() {
        let (mut context, _live) = context_with_program_metadata();
        let (program, _, _) = linked_program(&mut context);

        // Two attributes, sequential indices in enumeration order.
        assert_eq!(context.get_attrib_location(&program, "a_position"), Some(0));
        assert_eq!(context.get_attrib_location(&program, "a_uv"), Some(1));
        assert_eq!(context.get_attrib_location(&program, "missing"), None);

        // Three uniforms, three distinct stamped placeholders.
        let m = context.get_uniform_location(&program, "u_matrix").unwrap();
        let o = context.get_uniform_location(&program, "u_opacity").unwrap();
        let s = context.get_uniform_location(&program, "u_sampler").unwrap();
        assert_eq!(m.identity().kind(), ResourceKind::Uniform);
        assert_ne!(m.identity(), o.identity());
        assert_ne!(o.identity(), s.identity());
        assert_ne!(m.identity(), s.identity());

        assert_eq!(
            context.get_program_parameter(&program, gl::ACTIVE_ATTRIBUTES),
            Some(2)
        );
        assert_eq!(
            context.get_program_parameter(&program, gl::ACTIVE_UNIFORMS),
            Some(3)
        );
        assert_eq!(context.get_program_parameter(&program, gl::LINK_STATUS), Some(1));
    }

    #[test]
    fn location_lookups_before_link_signal_absence() {
        let (mut context, _live) = context_with_program_metadata();
        let program = context.create_program();
        assert_eq!(context.get_attrib_location(&program, "a_position"), None);
        assert!(context.get_uniform_location(&program, "u_matrix").is_none());
        assert_eq!(context.get_program_parameter(&program, gl::LINK_STATUS), Some(0));
    }

    #[test]
    fn uniform_uploads_synthesize_exactly_one_use_program() {
        let (mut context, _live) = context_with_program_metadata();
        let (program, _, _) = linked_program(&mut context);
        let location = context.get_uniform_location(&program, "u_opacity").unwrap();

        let before = context.recorder().records().len();
        context.uniform_1f(&location, 0.5);
        context.uniform_1f(&location, 0.75);

        let records = &context.recorder().records()[before..];
        let use_program_count = records.iter().filter(|r| r.op() == Op::UseProgram).count();
        assert_eq!(use_program_count, 1);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].op(), Op::UseProgram);
    }

    #[test]
    fn uploads_replay_with_the_live_location() {
        let (mut context, live) = context_with_program_metadata();
        let (program, _, _) = linked_program(&mut context);
        let location = context.get_uniform_location(&program, "u_opacity").unwrap();
        context.uniform_1f(&location, 0.5);
        context.draw_arrays(gl::TRIANGLES, 0, 3).unwrap();

        // The upload reached the real context through a resolved location,
        // and was preceded by the synthesized program bind.
        let calls = live.take_calls();
        let use_index = calls.iter().position(|c| c.starts_with("useProgram")).unwrap();
        let upload_index = calls.iter().position(|c| c.starts_with("uniform1f")).unwrap();
        assert!(use_index < upload_index, "{:?}", calls);
    }

    #[test]
    fn reattachment_prefixes_the_active_program() {
        let (mut context, _first) = context_with_program_metadata();
        let (program, _, _) = linked_program(&mut context);
        context.use_program(&program);
        // Realize everything recorded so far.
        context.draw_arrays(gl::TRIANGLES, 0, 3).unwrap();

        // Uploads recorded but not yet flushed by a draw...
        let location = context.get_uniform_location(&program, "u_opacity").unwrap();
        context.uniform_1f(&location, 0.25);

        // ...replay on the new context behind a fresh program bind. The new
        // context serves the same program, so the replayed location lookup
        // resolves there too.
        let second = Rc::new(TestGl::with_program(
            vec![],
            vec![ActiveInfo::new("u_opacity", gl::FLOAT, 1)],
        ));
        context.attach(second.clone()).unwrap();
        let calls = second.take_calls();
        assert!(calls[0].starts_with("useProgram"), "{:?}", calls);
        assert!(calls.iter().any(|c| c.starts_with("uniform1f")), "{:?}", calls);
    }

    #[test]
    fn binding_a_deleted_vao_reports_invalid_operation() {
        let live = Rc::new(TestGl::new());
        let mut context = VirtualContext::with_gl(live, ContextAttributes::default());
        context.get_extension(OES_VERTEX_ARRAY_OBJECT).unwrap();

        let vao = context.create_vertex_array_oes().unwrap();
        context.bind_vertex_array_oes(Some(&vao));
        assert!(context.is_vertex_array_oes(&vao));
        context.bind_vertex_array_oes(None);
        context.delete_vertex_array_oes(&vao);

        assert_eq!(context.get_error(), gl::NO_ERROR);
        context.bind_vertex_array_oes(Some(&vao));
        assert_eq!(context.get_error(), gl::INVALID_OPERATION);
        // Reading the error cleared it.
        assert_eq!(context.get_error(), gl::NO_ERROR);
        assert!(!context.is_vertex_array_oes(&vao));
    }

    #[test]
    fn vao_switch_replays_only_the_state_delta() {
        let live = Rc::new(TestGl::new());
        let mut context = VirtualContext::with_gl(live.clone(), ContextAttributes::default());
        context.get_extension(OES_VERTEX_ARRAY_OBJECT).unwrap();

        let x = context.create_buffer();
        let a = context.create_vertex_array_oes().unwrap();
        let b = context.create_vertex_array_oes().unwrap();

        // Configure both VAOs identically: slot 0 enabled, buffer X.
        for vao in [&a, &b] {
            context.bind_vertex_array_oes(Some(vao));
            context.bind_buffer(gl::ARRAY_BUFFER, Some(&x));
            context.enable_vertex_attrib_array(0);
            context.vertex_attrib_pointer(0, 2, gl::FLOAT, false, 0, 0);
        }
        context.draw_arrays(gl::TRIANGLES, 0, 3).unwrap();
        live.take_calls();

        // Identical shadow state: the switch re-issues nothing.
        context.bind_vertex_array_oes(Some(&a));
        context.draw_arrays(gl::TRIANGLES, 0, 3).unwrap();
        let calls = live.take_calls();
        assert_eq!(calls.len(), 1, "{:?}", calls);
        assert!(calls[0].starts_with("drawArrays"));
    }

    #[test]
    fn buffer_uploads_replay_in_every_form() {
        let live = Rc::new(TestGl::new());
        let mut context = VirtualContext::with_gl(live.clone(), ContextAttributes::default());

        let buffer = context.create_buffer();
        context.bind_buffer(gl::ARRAY_BUFFER, Some(&buffer));
        context.buffer_data_uninitialized(gl::ARRAY_BUFFER, 64, gl::DYNAMIC_DRAW);
        context.buffer_sub_data(gl::ARRAY_BUFFER, 16, BufferSource::U16(&[1, 2, 3]));
        context.draw_arrays(gl::POINTS, 0, 1).unwrap();

        let calls = live.take_calls();
        let allocation = format!("bufferData({}, size 64, {})", gl::ARRAY_BUFFER, gl::DYNAMIC_DRAW);
        assert!(calls.contains(&allocation), "{:?}", calls);
        let upload = format!("bufferSubData({}, 16, 6 bytes)", gl::ARRAY_BUFFER);
        assert!(calls.contains(&upload), "{:?}", calls);
    }

    #[test]
    fn current_vertex_array_tracks_the_binding() {
        let live = Rc::new(TestGl::new());
        let mut context = VirtualContext::with_gl(live, ContextAttributes::default());
        context.get_extension(OES_VERTEX_ARRAY_OBJECT).unwrap();

        assert_eq!(context.current_vertex_array(), None);
        let vao = context.create_vertex_array_oes().unwrap();
        context.bind_vertex_array_oes(Some(&vao));
        assert_eq!(context.current_vertex_array(), Some(vao));
        context.bind_vertex_array_oes(None);
        assert_eq!(context.current_vertex_array(), None);
    }

    #[test]
    fn get_vertex_attrib_answers_from_shadow_state() {
        let live = Rc::new(TestGl::new());
        let mut context = VirtualContext::with_gl(live, ContextAttributes::default());
        context.get_extension(OES_VERTEX_ARRAY_OBJECT).unwrap();

        let buffer = context.create_buffer();
        context.bind_buffer(gl::ARRAY_BUFFER, Some(&buffer));
        context.enable_vertex_attrib_array(1);
        context.vertex_attrib_pointer(1, 3, gl::FLOAT, true, 12, 4);

        assert_eq!(
            context.get_vertex_attrib(1, gl::VERTEX_ATTRIB_ARRAY_BUFFER_BINDING),
            Some(Value::Ident(buffer.identity()))
        );
        assert_eq!(
            context.get_vertex_attrib(1, gl::VERTEX_ATTRIB_ARRAY_ENABLED),
            Some(Value::Bool(true))
        );
        assert_eq!(
            context.get_vertex_attrib(1, gl::VERTEX_ATTRIB_ARRAY_SIZE),
            Some(Value::Int(3))
        );
    }

    #[test]
    fn unsupported_extensions_are_refused() {
        let mut context = VirtualContext::new(ContextAttributes::default());
        assert_eq!(context.get_extension("WEBGL_depth_texture"), None);
        assert!(context.create_vertex_array_oes().is_err());
        assert_eq!(context.get_supported_extensions(), vec![OES_VERTEX_ARRAY_OBJECT]);
    }

    #[test]
    fn link_requires_a_live_context() {
        let mut context = VirtualContext::new(ContextAttributes::default());
        let vs = context.create_shader(gl::VERTEX_SHADER);
        let fs = context.create_shader(gl::FRAGMENT_SHADER);
        let program = context.create_program();
        context.attach_shader(&program, &vs);
        context.attach_shader(&program, &fs);
        assert!(matches!(
            context.link_program(&program),
            Err(ContextError::Detached)
        ));
    }
}
