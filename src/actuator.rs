//! The actuator: drains record batches and replays them against a live
//! context.
//!
//! An [`Actuator`] is bound to at most one real context at a time. Batches
//! handed to [`Actuator::play`] accumulate in a pending queue; once a context
//! is attached, every pending record is replayed in strict FIFO order:
//!
//! 1. reference slots are resolved through the actuator's [`ResourceCache`],
//! 2. the argument positions are overwritten with the live handles,
//! 3. the typed operation is invoked on the real context,
//! 4. a returned handle, if the operation produces one, is stored in the
//!    cache under the record's return identity,
//! 5. a delete operation retires its target's cache entry.
//!
//! Attaching a context replays anything already pending, which is how calls
//! issued before the real context existed finally reach the GPU.
//!
//! A reference slot with no cache entry is a replay-ordering fault, not
//! something to paper over: it fails with an error naming the missing
//! identity. The failing record is dropped and later records stay pending.

use std::collections::VecDeque;
use std::rc::Rc;

use gleam::gl::{GLintptr, GLsizeiptr};
use log::{debug, trace};
use thiserror::Error;

use crate::cache::ResourceCache;
use crate::call::Op;
use crate::ident::Identity;
use crate::record::Record;
use crate::value::Value;
use crate::webgl::{NativeHandle, WebGl};

/// A fault encountered while replaying a record batch.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// A reference slot had no live handle at replay time: the referenced
    /// resource was never realized, or its creation record has not replayed
    /// yet.
    #[error("no live handle for {ident} while replaying {op}")]
    UnresolvedReference { ident: Identity, op: Op },

    /// A record's argument list does not match its operation's signature.
    #[error("malformed argument {index} of {op}")]
    MalformedArgument { op: Op, index: usize },
}

pub struct Actuator {
    gl: Option<Rc<dyn WebGl>>,
    cache: ResourceCache,
    pending: VecDeque<Record>,
    current_program: Option<Identity>,
    debug: bool,
    log: Vec<&'static str>,
}

impl Actuator {
    /// An actuator with no live context; batches queue until one is attached.
    pub fn new() -> Actuator {
        Actuator {
            gl: None,
            cache: ResourceCache::new(),
            pending: VecDeque::new(),
            current_program: None,
            debug: false,
            log: Vec::new(),
        }
    }

    pub fn with_gl(gl: Rc<dyn WebGl>) -> Actuator {
        let mut actuator = Actuator::new();
        actuator.gl = Some(gl);
        actuator
    }

    pub fn gl(&self) -> Option<Rc<dyn WebGl>> {
        self.gl.clone()
    }

    /// Bind a live context and immediately replay whatever queued up while
    /// there was none.
    pub fn attach(&mut self, gl: Rc<dyn WebGl>) -> Result<(), ReplayError> {
        self.gl = Some(gl);
        debug!("actuator attached; {} record(s) pending", self.pending.len());
        self.play(Vec::new())
    }

    /// The program the recording side last made active. Uniform-upload
    /// synchronization compares against this.
    pub fn current_program(&self) -> Option<Identity> {
        self.current_program
    }

    pub fn set_current_program(&mut self, program: Option<Identity>) {
        self.current_program = program;
    }

    /// The identity → live-handle table. Mutated only inside
    /// [`play`](Actuator::play).
    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Toggle the executed-operation log. Disabling clears it.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
        if !debug {
            self.log.clear();
        }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Names of replayed operations, in execution order.
    pub fn debug_log(&self) -> &[&'static str] {
        &self.log
    }

    /// Append `batch` to the pending queue and, if a context is attached,
    /// replay everything pending in order.
    pub fn play(&mut self, batch: Vec<Record>) -> Result<(), ReplayError> {
        self.pending.extend(batch);
        let gl = match &self.gl {
            Some(gl) => gl.clone(),
            None => return Ok(()),
        };

        while let Some(mut record) = self.pending.pop_front() {
            let mut resolutions = Vec::with_capacity(record.ref_slots().len());
            for slot in record.ref_slots() {
                let handle = self.cache.lookup(slot.ident).ok_or(
                    ReplayError::UnresolvedReference { ident: slot.ident, op: record.op() },
                )?;
                resolutions.push((slot.index, handle));
            }
            record.apply_resolved(&resolutions);

            let returned = dispatch(gl.as_ref(), &record)?;
            trace!("replayed {}", record.op());

            if record.op().descriptor().returns_handle {
                if let (Some(ident), Some(handle)) = (record.return_id(), returned) {
                    self.cache.insert(ident, handle);
                }
            }
            if record.op().retires_resource() {
                for slot in record.ref_slots() {
                    self.cache.remove(slot.ident);
                }
            }
            if self.debug {
                self.log.push(record.op().name());
            }
        }
        Ok(())
    }
}

impl Default for Actuator {
    fn default() -> Actuator {
        Actuator::new()
    }
}

/// Typed argument accessors over a resolved record.
struct Args<'a> {
    op: Op,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    fn malformed(&self, index: usize) -> ReplayError {
        ReplayError::MalformedArgument { op: self.op, index }
    }

    fn get(&self, index: usize) -> Result<&'a Value, ReplayError> {
        self.values.get(index).ok_or_else(|| self.malformed(index))
    }

    fn uint(&self, index: usize) -> Result<u32, ReplayError> {
        match self.get(index)? {
            Value::Uint(v) => Ok(*v),
            _ => Err(self.malformed(index)),
        }
    }

    fn int(&self, index: usize) -> Result<i32, ReplayError> {
        match self.get(index)? {
            Value::Int(v) => Ok(*v),
            _ => Err(self.malformed(index)),
        }
    }

    fn float(&self, index: usize) -> Result<f32, ReplayError> {
        match self.get(index)? {
            Value::Float(v) => Ok(*v),
            _ => Err(self.malformed(index)),
        }
    }

    fn boolean(&self, index: usize) -> Result<bool, ReplayError> {
        match self.get(index)? {
            Value::Bool(v) => Ok(*v),
            _ => Err(self.malformed(index)),
        }
    }

    fn string(&self, index: usize) -> Result<&'a str, ReplayError> {
        match self.get(index)? {
            Value::Str(v) => Ok(v),
            _ => Err(self.malformed(index)),
        }
    }

    fn f32s(&self, index: usize) -> Result<&'a [f32], ReplayError> {
        match self.get(index)? {
            Value::F32s(v) => Ok(v),
            _ => Err(self.malformed(index)),
        }
    }

    fn i32s(&self, index: usize) -> Result<&'a [i32], ReplayError> {
        match self.get(index)? {
            Value::I32s(v) => Ok(v),
            _ => Err(self.malformed(index)),
        }
    }

    fn bytes(&self, index: usize) -> Result<&'a [u8], ReplayError> {
        match self.get(index)? {
            Value::Bytes(v) => Ok(v),
            _ => Err(self.malformed(index)),
        }
    }

    fn opt_bytes(&self, index: usize) -> Result<Option<&'a [u8]>, ReplayError> {
        match self.get(index)? {
            Value::Null => Ok(None),
            Value::Bytes(v) => Ok(Some(v)),
            _ => Err(self.malformed(index)),
        }
    }

    /// A resolved reference slot, or `0` for an explicit null binding.
    fn handle(&self, index: usize) -> Result<NativeHandle, ReplayError> {
        match self.get(index)? {
            Value::Handle(v) => Ok(*v),
            Value::Null => Ok(0),
            _ => Err(self.malformed(index)),
        }
    }

    /// The raw byte view of a data argument that may be any typed-array
    /// snapshot.
    fn data(&self, index: usize) -> Result<&'a [u8], ReplayError> {
        match self.get(index)? {
            Value::F32s(v) => Ok(bytemuck::cast_slice(v)),
            Value::U16s(v) => Ok(bytemuck::cast_slice(v)),
            Value::Bytes(v) => Ok(v),
            _ => Err(self.malformed(index)),
        }
    }
}

/// Invoke one resolved record on the live context. Returns the live handle
/// for operations that produce one.
fn dispatch(gl: &dyn WebGl, record: &Record) -> Result<Option<NativeHandle>, ReplayError> {
    let args = Args { op: record.op(), values: record.args() };
    match record.op() {
        // Buffers.
        Op::CreateBuffer => return Ok(Some(gl.create_buffer())),
        Op::BindBuffer => gl.bind_buffer(args.uint(0)?, args.handle(1)?),
        Op::DeleteBuffer => gl.delete_buffer(args.handle(0)?),
        Op::BufferData => match args.get(1)? {
            Value::Uint(size) => {
                gl.buffer_data_size(args.uint(0)?, *size as GLsizeiptr, args.uint(2)?)
            }
            _ => gl.buffer_data(args.uint(0)?, args.data(1)?, args.uint(2)?),
        },
        Op::BufferSubData => {
            gl.buffer_sub_data(args.uint(0)?, args.uint(1)? as GLintptr, args.data(2)?)
        }

        // Framebuffers.
        Op::CreateFramebuffer => return Ok(Some(gl.create_framebuffer())),
        Op::BindFramebuffer => gl.bind_framebuffer(args.uint(0)?, args.handle(1)?),
        Op::DeleteFramebuffer => gl.delete_framebuffer(args.handle(0)?),
        Op::FramebufferTexture2D => gl.framebuffer_texture_2d(
            args.uint(0)?,
            args.uint(1)?,
            args.uint(2)?,
            args.handle(3)?,
            args.int(4)?,
        ),
        Op::FramebufferRenderbuffer => gl.framebuffer_renderbuffer(
            args.uint(0)?,
            args.uint(1)?,
            args.uint(2)?,
            args.handle(3)?,
        ),

        // Renderbuffers.
        Op::CreateRenderbuffer => return Ok(Some(gl.create_renderbuffer())),
        Op::BindRenderbuffer => gl.bind_renderbuffer(args.uint(0)?, args.handle(1)?),
        Op::DeleteRenderbuffer => gl.delete_renderbuffer(args.handle(0)?),
        Op::RenderbufferStorage => gl.renderbuffer_storage(
            args.uint(0)?,
            args.uint(1)?,
            args.int(2)?,
            args.int(3)?,
        ),

        // Textures.
        Op::CreateTexture => return Ok(Some(gl.create_texture())),
        Op::BindTexture => gl.bind_texture(args.uint(0)?, args.handle(1)?),
        Op::DeleteTexture => gl.delete_texture(args.handle(0)?),
        Op::TexImage2D => gl.tex_image_2d(
            args.uint(0)?,
            args.int(1)?,
            args.int(2)?,
            args.int(3)?,
            args.int(4)?,
            args.int(5)?,
            args.uint(6)?,
            args.uint(7)?,
            args.opt_bytes(8)?,
        ),
        Op::TexSubImage2D => gl.tex_sub_image_2d(
            args.uint(0)?,
            args.int(1)?,
            args.int(2)?,
            args.int(3)?,
            args.int(4)?,
            args.int(5)?,
            args.uint(6)?,
            args.uint(7)?,
            args.bytes(8)?,
        ),
        Op::TexParameterf => gl.tex_parameter_f(args.uint(0)?, args.uint(1)?, args.float(2)?),
        Op::TexParameteri => gl.tex_parameter_i(args.uint(0)?, args.uint(1)?, args.int(2)?),
        Op::GenerateMipmap => gl.generate_mipmap(args.uint(0)?),
        Op::ActiveTexture => gl.active_texture(args.uint(0)?),
        Op::PixelStorei => gl.pixel_store_i(args.uint(0)?, args.int(1)?),

        // Programs and shaders.
        Op::CreateShader => return Ok(Some(gl.create_shader(args.uint(0)?))),
        Op::CreateProgram => return Ok(Some(gl.create_program())),
        Op::ShaderSource => gl.shader_source(args.handle(0)?, args.string(1)?),
        Op::CompileShader => gl.compile_shader(args.handle(0)?),
        Op::AttachShader => gl.attach_shader(args.handle(0)?, args.handle(1)?),
        Op::DetachShader => gl.detach_shader(args.handle(0)?, args.handle(1)?),
        Op::LinkProgram => gl.link_program(args.handle(0)?),
        Op::UseProgram => gl.use_program(args.handle(0)?),
        Op::ValidateProgram => gl.validate_program(args.handle(0)?),
        Op::BindAttribLocation => {
            gl.bind_attrib_location(args.handle(0)?, args.uint(1)?, args.string(2)?)
        }
        Op::DeleteShader => gl.delete_shader(args.handle(0)?),
        Op::DeleteProgram => gl.delete_program(args.handle(0)?),
        Op::GetUniformLocation => {
            return Ok(gl.get_uniform_location(args.handle(0)?, args.string(1)?));
        }

        // Uniform uploads.
        Op::Uniform1f => gl.uniform_1f(args.handle(0)?, args.float(1)?),
        Op::Uniform2f => gl.uniform_2f(args.handle(0)?, args.float(1)?, args.float(2)?),
        Op::Uniform3f => {
            gl.uniform_3f(args.handle(0)?, args.float(1)?, args.float(2)?, args.float(3)?)
        }
        Op::Uniform4f => gl.uniform_4f(
            args.handle(0)?,
            args.float(1)?,
            args.float(2)?,
            args.float(3)?,
            args.float(4)?,
        ),
        Op::Uniform1i => gl.uniform_1i(args.handle(0)?, args.int(1)?),
        Op::Uniform2i => gl.uniform_2i(args.handle(0)?, args.int(1)?, args.int(2)?),
        Op::Uniform3i => {
            gl.uniform_3i(args.handle(0)?, args.int(1)?, args.int(2)?, args.int(3)?)
        }
        Op::Uniform4i => gl.uniform_4i(
            args.handle(0)?,
            args.int(1)?,
            args.int(2)?,
            args.int(3)?,
            args.int(4)?,
        ),
        Op::Uniform1fv => gl.uniform_1fv(args.handle(0)?, args.f32s(1)?),
        Op::Uniform2fv => gl.uniform_2fv(args.handle(0)?, args.f32s(1)?),
        Op::Uniform3fv => gl.uniform_3fv(args.handle(0)?, args.f32s(1)?),
        Op::Uniform4fv => gl.uniform_4fv(args.handle(0)?, args.f32s(1)?),
        Op::Uniform1iv => gl.uniform_1iv(args.handle(0)?, args.i32s(1)?),
        Op::Uniform2iv => gl.uniform_2iv(args.handle(0)?, args.i32s(1)?),
        Op::Uniform3iv => gl.uniform_3iv(args.handle(0)?, args.i32s(1)?),
        Op::Uniform4iv => gl.uniform_4iv(args.handle(0)?, args.i32s(1)?),
        Op::UniformMatrix2fv => {
            gl.uniform_matrix_2fv(args.handle(0)?, args.boolean(1)?, args.f32s(2)?)
        }
        Op::UniformMatrix3fv => {
            gl.uniform_matrix_3fv(args.handle(0)?, args.boolean(1)?, args.f32s(2)?)
        }
        Op::UniformMatrix4fv => {
            gl.uniform_matrix_4fv(args.handle(0)?, args.boolean(1)?, args.f32s(2)?)
        }

        // Vertex attributes.
        Op::EnableVertexAttribArray => gl.enable_vertex_attrib_array(args.uint(0)?),
        Op::DisableVertexAttribArray => gl.disable_vertex_attrib_array(args.uint(0)?),
        Op::VertexAttribPointer => gl.vertex_attrib_pointer(
            args.uint(0)?,
            args.int(1)?,
            args.uint(2)?,
            args.boolean(3)?,
            args.int(4)?,
            args.uint(5)?,
        ),
        Op::VertexAttrib1f => gl.vertex_attrib_1f(args.uint(0)?, args.float(1)?),
        Op::VertexAttrib2f => {
            gl.vertex_attrib_2f(args.uint(0)?, args.float(1)?, args.float(2)?)
        }
        Op::VertexAttrib3f => gl.vertex_attrib_3f(
            args.uint(0)?,
            args.float(1)?,
            args.float(2)?,
            args.float(3)?,
        ),
        Op::VertexAttrib4f => gl.vertex_attrib_4f(
            args.uint(0)?,
            args.float(1)?,
            args.float(2)?,
            args.float(3)?,
            args.float(4)?,
        ),
        Op::VertexAttrib1fv => gl.vertex_attrib_1fv(args.uint(0)?, args.f32s(1)?),
        Op::VertexAttrib2fv => gl.vertex_attrib_2fv(args.uint(0)?, args.f32s(1)?),
        Op::VertexAttrib3fv => gl.vertex_attrib_3fv(args.uint(0)?, args.f32s(1)?),
        Op::VertexAttrib4fv => gl.vertex_attrib_4fv(args.uint(0)?, args.f32s(1)?),

        // Drawing.
        Op::DrawArrays => gl.draw_arrays(args.uint(0)?, args.int(1)?, args.int(2)?),
        Op::DrawElements => {
            gl.draw_elements(args.uint(0)?, args.int(1)?, args.uint(2)?, args.uint(3)?)
        }
        Op::Clear => gl.clear(args.uint(0)?),
        Op::Flush => gl.flush(),
        Op::Finish => gl.finish(),

        // State setting.
        Op::Enable => gl.enable(args.uint(0)?),
        Op::Disable => gl.disable(args.uint(0)?),
        Op::BlendColor => gl.blend_color(
            args.float(0)?,
            args.float(1)?,
            args.float(2)?,
            args.float(3)?,
        ),
        Op::BlendEquation => gl.blend_equation(args.uint(0)?),
        Op::BlendEquationSeparate => gl.blend_equation_separate(args.uint(0)?, args.uint(1)?),
        Op::BlendFunc => gl.blend_func(args.uint(0)?, args.uint(1)?),
        Op::BlendFuncSeparate => gl.blend_func_separate(
            args.uint(0)?,
            args.uint(1)?,
            args.uint(2)?,
            args.uint(3)?,
        ),
        Op::ClearColor => gl.clear_color(
            args.float(0)?,
            args.float(1)?,
            args.float(2)?,
            args.float(3)?,
        ),
        Op::ClearDepth => gl.clear_depth(args.float(0)?),
        Op::ClearStencil => gl.clear_stencil(args.int(0)?),
        Op::ColorMask => gl.color_mask(
            args.boolean(0)?,
            args.boolean(1)?,
            args.boolean(2)?,
            args.boolean(3)?,
        ),
        Op::CullFace => gl.cull_face(args.uint(0)?),
        Op::DepthFunc => gl.depth_func(args.uint(0)?),
        Op::DepthMask => gl.depth_mask(args.boolean(0)?),
        Op::DepthRange => gl.depth_range(args.float(0)?, args.float(1)?),
        Op::FrontFace => gl.front_face(args.uint(0)?),
        Op::Hint => gl.hint(args.uint(0)?, args.uint(1)?),
        Op::LineWidth => gl.line_width(args.float(0)?),
        Op::PolygonOffset => gl.polygon_offset(args.float(0)?, args.float(1)?),
        Op::SampleCoverage => gl.sample_coverage(args.float(0)?, args.boolean(1)?),
        Op::Scissor => gl.scissor(args.int(0)?, args.int(1)?, args.int(2)?, args.int(3)?),
        Op::Viewport => gl.viewport(args.int(0)?, args.int(1)?, args.int(2)?, args.int(3)?),
        Op::StencilFunc => gl.stencil_func(args.uint(0)?, args.int(1)?, args.uint(2)?),
        Op::StencilFuncSeparate => gl.stencil_func_separate(
            args.uint(0)?,
            args.uint(1)?,
            args.int(2)?,
            args.uint(3)?,
        ),
        Op::StencilMask => gl.stencil_mask(args.uint(0)?),
        Op::StencilMaskSeparate => gl.stencil_mask_separate(args.uint(0)?, args.uint(1)?),
        Op::StencilOp => gl.stencil_op(args.uint(0)?, args.uint(1)?, args.uint(2)?),
        Op::StencilOpSeparate => gl.stencil_op_separate(
            args.uint(0)?,
            args.uint(1)?,
            args.uint(2)?,
            args.uint(3)?,
        ),

        // The emulated extension surface never produces records.
        Op::CreateVertexArrayOes
        | Op::BindVertexArrayOes
        | Op::DeleteVertexArrayOes
        | Op::IsVertexArrayOes => return Err(args.malformed(0)),
    }
    Ok(None)
}
