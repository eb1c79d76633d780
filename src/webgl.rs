//! The trait seam between the virtual layer and a real graphics context.
//!
//! [`WebGl`] declares, synchronously and by name, every operation the replay
//! engine can invoke. A production integration implements it over whatever
//! actually owns the GPU (an FFI context, a browser binding, a software
//! rasterizer); the tests implement it with a call logger. The virtual layer
//! never touches a live handle except through this trait: handles only flow
//! in through return values and back out through resolved arguments.
//!
//! Handles are plain `GLuint`s, the currency of GL object names. Uniform
//! locations travel as handles too: implementations map the API's
//! non-negative `GLint` locations into `NativeHandle`, and report inactive
//! names as `None`.

use gleam::gl::{GLbitfield, GLclampf, GLenum, GLfloat, GLint, GLintptr, GLsizei, GLsizeiptr, GLuint};

/// A live handle minted by the real context.
pub type NativeHandle = GLuint;

/// One active attribute or uniform reported by program introspection.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveInfo {
    pub name: String,
    pub ty: GLenum,
    pub size: GLint,
}

impl ActiveInfo {
    pub fn new(name: &str, ty: GLenum, size: GLint) -> ActiveInfo {
        ActiveInfo { name: name.to_string(), ty, size }
    }
}

/// A handle-based graphics context exposing the virtualized operation set.
///
/// Binding a handle of `0` unbinds, as in GL.
pub trait WebGl {
    // Buffers.
    fn create_buffer(&self) -> NativeHandle;
    fn bind_buffer(&self, target: GLenum, buffer: NativeHandle);
    fn delete_buffer(&self, buffer: NativeHandle);
    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum);
    fn buffer_data_size(&self, target: GLenum, size: GLsizeiptr, usage: GLenum);
    fn buffer_sub_data(&self, target: GLenum, offset: GLintptr, data: &[u8]);

    // Framebuffers.
    fn create_framebuffer(&self) -> NativeHandle;
    fn bind_framebuffer(&self, target: GLenum, framebuffer: NativeHandle);
    fn delete_framebuffer(&self, framebuffer: NativeHandle);
    fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        textarget: GLenum,
        texture: NativeHandle,
        level: GLint,
    );
    fn framebuffer_renderbuffer(
        &self,
        target: GLenum,
        attachment: GLenum,
        renderbuffertarget: GLenum,
        renderbuffer: NativeHandle,
    );

    // Renderbuffers.
    fn create_renderbuffer(&self) -> NativeHandle;
    fn bind_renderbuffer(&self, target: GLenum, renderbuffer: NativeHandle);
    fn delete_renderbuffer(&self, renderbuffer: NativeHandle);
    fn renderbuffer_storage(&self, target: GLenum, internalformat: GLenum, width: GLsizei, height: GLsizei);

    // Textures.
    fn create_texture(&self) -> NativeHandle;
    fn bind_texture(&self, target: GLenum, texture: NativeHandle);
    fn delete_texture(&self, texture: NativeHandle);
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        format: GLenum,
        ty: GLenum,
        pixels: Option<&[u8]>,
    );
    #[allow(clippy::too_many_arguments)]
    fn tex_sub_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        xoffset: GLint,
        yoffset: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: &[u8],
    );
    fn tex_parameter_f(&self, target: GLenum, pname: GLenum, param: GLfloat);
    fn tex_parameter_i(&self, target: GLenum, pname: GLenum, param: GLint);
    fn generate_mipmap(&self, target: GLenum);
    fn active_texture(&self, texture: GLenum);
    fn pixel_store_i(&self, pname: GLenum, param: GLint);

    // Programs and shaders.
    fn create_shader(&self, ty: GLenum) -> NativeHandle;
    fn create_program(&self) -> NativeHandle;
    fn shader_source(&self, shader: NativeHandle, source: &str);
    fn compile_shader(&self, shader: NativeHandle);
    fn attach_shader(&self, program: NativeHandle, shader: NativeHandle);
    fn detach_shader(&self, program: NativeHandle, shader: NativeHandle);
    fn link_program(&self, program: NativeHandle);
    fn use_program(&self, program: NativeHandle);
    fn validate_program(&self, program: NativeHandle);
    fn bind_attrib_location(&self, program: NativeHandle, index: GLuint, name: &str);
    fn delete_shader(&self, shader: NativeHandle);
    fn delete_program(&self, program: NativeHandle);
    fn get_program_parameter(&self, program: NativeHandle, pname: GLenum) -> GLint;
    fn get_active_attrib(&self, program: NativeHandle, index: GLuint) -> Option<ActiveInfo>;
    fn get_active_uniform(&self, program: NativeHandle, index: GLuint) -> Option<ActiveInfo>;
    fn get_uniform_location(&self, program: NativeHandle, name: &str) -> Option<NativeHandle>;

    // Uniform uploads.
    fn uniform_1f(&self, location: NativeHandle, x: GLfloat);
    fn uniform_2f(&self, location: NativeHandle, x: GLfloat, y: GLfloat);
    fn uniform_3f(&self, location: NativeHandle, x: GLfloat, y: GLfloat, z: GLfloat);
    fn uniform_4f(&self, location: NativeHandle, x: GLfloat, y: GLfloat, z: GLfloat, w: GLfloat);
    fn uniform_1i(&self, location: NativeHandle, x: GLint);
    fn uniform_2i(&self, location: NativeHandle, x: GLint, y: GLint);
    fn uniform_3i(&self, location: NativeHandle, x: GLint, y: GLint, z: GLint);
    fn uniform_4i(&self, location: NativeHandle, x: GLint, y: GLint, z: GLint, w: GLint);
    fn uniform_1fv(&self, location: NativeHandle, values: &[f32]);
    fn uniform_2fv(&self, location: NativeHandle, values: &[f32]);
    fn uniform_3fv(&self, location: NativeHandle, values: &[f32]);
    fn uniform_4fv(&self, location: NativeHandle, values: &[f32]);
    fn uniform_1iv(&self, location: NativeHandle, values: &[i32]);
    fn uniform_2iv(&self, location: NativeHandle, values: &[i32]);
    fn uniform_3iv(&self, location: NativeHandle, values: &[i32]);
    fn uniform_4iv(&self, location: NativeHandle, values: &[i32]);
    fn uniform_matrix_2fv(&self, location: NativeHandle, transpose: bool, values: &[f32]);
    fn uniform_matrix_3fv(&self, location: NativeHandle, transpose: bool, values: &[f32]);
    fn uniform_matrix_4fv(&self, location: NativeHandle, transpose: bool, values: &[f32]);

    // Vertex attributes.
    fn enable_vertex_attrib_array(&self, index: GLuint);
    fn disable_vertex_attrib_array(&self, index: GLuint);
    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: GLuint,
    );
    fn vertex_attrib_1f(&self, index: GLuint, x: GLfloat);
    fn vertex_attrib_2f(&self, index: GLuint, x: GLfloat, y: GLfloat);
    fn vertex_attrib_3f(&self, index: GLuint, x: GLfloat, y: GLfloat, z: GLfloat);
    fn vertex_attrib_4f(&self, index: GLuint, x: GLfloat, y: GLfloat, z: GLfloat, w: GLfloat);
    fn vertex_attrib_1fv(&self, index: GLuint, values: &[f32]);
    fn vertex_attrib_2fv(&self, index: GLuint, values: &[f32]);
    fn vertex_attrib_3fv(&self, index: GLuint, values: &[f32]);
    fn vertex_attrib_4fv(&self, index: GLuint, values: &[f32]);

    // Drawing.
    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei);
    fn draw_elements(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: GLuint);
    fn clear(&self, mask: GLbitfield);
    fn flush(&self);
    fn finish(&self);

    // State setting.
    fn enable(&self, cap: GLenum);
    fn disable(&self, cap: GLenum);
    fn blend_color(&self, r: GLclampf, g: GLclampf, b: GLclampf, a: GLclampf);
    fn blend_equation(&self, mode: GLenum);
    fn blend_equation_separate(&self, mode_rgb: GLenum, mode_alpha: GLenum);
    fn blend_func(&self, src: GLenum, dst: GLenum);
    fn blend_func_separate(&self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum);
    fn clear_color(&self, r: GLclampf, g: GLclampf, b: GLclampf, a: GLclampf);
    fn clear_depth(&self, depth: GLclampf);
    fn clear_stencil(&self, s: GLint);
    fn color_mask(&self, r: bool, g: bool, b: bool, a: bool);
    fn cull_face(&self, mode: GLenum);
    fn depth_func(&self, func: GLenum);
    fn depth_mask(&self, flag: bool);
    fn depth_range(&self, near: GLclampf, far: GLclampf);
    fn front_face(&self, mode: GLenum);
    fn hint(&self, target: GLenum, mode: GLenum);
    fn line_width(&self, width: GLfloat);
    fn polygon_offset(&self, factor: GLfloat, units: GLfloat);
    fn sample_coverage(&self, value: GLclampf, invert: bool);
    fn scissor(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    fn stencil_func(&self, func: GLenum, reference: GLint, mask: GLuint);
    fn stencil_func_separate(&self, face: GLenum, func: GLenum, reference: GLint, mask: GLuint);
    fn stencil_mask(&self, mask: GLuint);
    fn stencil_mask_separate(&self, face: GLenum, mask: GLuint);
    fn stencil_op(&self, fail: GLenum, zfail: GLenum, zpass: GLenum);
    fn stencil_op_separate(&self, face: GLenum, fail: GLenum, zfail: GLenum, zpass: GLenum);

    // Queries.
    fn get_parameter(&self, pname: GLenum) -> GLint;
}
