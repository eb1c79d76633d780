//! A fake real context for tests: logs every call and vends sequential
//! handles.
//!
//! `TestGl` implements [`WebGl`] by appending a formatted line per call to an
//! internal log, which tests drain with [`TestGl::take_calls`]. Program
//! introspection (active attribute/uniform enumeration) answers from the
//! fixture lists passed to [`TestGl::with_program`].

use std::cell::RefCell;

use gleam::gl::{self, GLbitfield, GLclampf, GLenum, GLfloat, GLint, GLintptr, GLsizei, GLsizeiptr, GLuint};

use crate::webgl::{ActiveInfo, NativeHandle, WebGl};

#[derive(Default)]
struct Inner {
    calls: Vec<String>,
    next_handle: NativeHandle,
    attribs: Vec<ActiveInfo>,
    uniforms: Vec<ActiveInfo>,
}

pub struct TestGl {
    inner: RefCell<Inner>,
}

impl TestGl {
    pub fn new() -> TestGl {
        TestGl::with_program(Vec::new(), Vec::new())
    }

    /// A context whose program introspection reports the given active
    /// attributes and uniforms.
    pub fn with_program(attribs: Vec<ActiveInfo>, uniforms: Vec<ActiveInfo>) -> TestGl {
        TestGl {
            inner: RefCell::new(Inner { attribs, uniforms, ..Inner::default() }),
        }
    }

    /// Drain the formatted call log.
    pub fn take_calls(&self) -> Vec<String> {
        std::mem::take(&mut self.inner.borrow_mut().calls)
    }

    fn log(&self, line: String) {
        self.inner.borrow_mut().calls.push(line);
    }

    fn mint(&self, name: &str, detail: &str) -> NativeHandle {
        let mut inner = self.inner.borrow_mut();
        inner.next_handle += 1;
        let handle = inner.next_handle;
        inner.calls.push(format!("{}({}) -> {}", name, detail, handle));
        handle
    }
}

impl WebGl for TestGl {
    fn create_buffer(&self) -> NativeHandle {
        self.mint("createBuffer", "")
    }

    fn bind_buffer(&self, target: GLenum, buffer: NativeHandle) {
        self.log(format!("bindBuffer({}, {})", target, buffer));
    }

    fn delete_buffer(&self, buffer: NativeHandle) {
        self.log(format!("deleteBuffer({})", buffer));
    }

    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum) {
        self.log(format!("bufferData({}, {} bytes, {})", target, data.len(), usage));
    }

    fn buffer_data_size(&self, target: GLenum, size: GLsizeiptr, usage: GLenum) {
        self.log(format!("bufferData({}, size {}, {})", target, size, usage));
    }

    fn buffer_sub_data(&self, target: GLenum, offset: GLintptr, data: &[u8]) {
        self.log(format!("bufferSubData({}, {}, {} bytes)", target, offset, data.len()));
    }

    fn create_framebuffer(&self) -> NativeHandle {
        self.mint("createFramebuffer", "")
    }

    fn bind_framebuffer(&self, target: GLenum, framebuffer: NativeHandle) {
        self.log(format!("bindFramebuffer({}, {})", target, framebuffer));
    }

    fn delete_framebuffer(&self, framebuffer: NativeHandle) {
        self.log(format!("deleteFramebuffer({})", framebuffer));
    }

    fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        textarget: GLenum,
        texture: NativeHandle,
        level: GLint,
    ) {
        self.log(format!(
            "framebufferTexture2D({}, {}, {}, {}, {})",
            target, attachment, textarget, texture, level
        ));
    }

    fn framebuffer_renderbuffer(
        &self,
        target: GLenum,
        attachment: GLenum,
        renderbuffertarget: GLenum,
        renderbuffer: NativeHandle,
    ) {
        self.log(format!(
            "framebufferRenderbuffer({}, {}, {}, {})",
            target, attachment, renderbuffertarget, renderbuffer
        ));
    }

    fn create_renderbuffer(&self) -> NativeHandle {
        self.mint("createRenderbuffer", "")
    }

    fn bind_renderbuffer(&self, target: GLenum, renderbuffer: NativeHandle) {
        self.log(format!("bindRenderbuffer({}, {})", target, renderbuffer));
    }

    fn delete_renderbuffer(&self, renderbuffer: NativeHandle) {
        self.log(format!("deleteRenderbuffer({})", renderbuffer));
    }

    fn renderbuffer_storage(&self, target: GLenum, internalformat: GLenum, width: GLsizei, height: GLsizei) {
        self.log(format!(
            "renderbufferStorage({}, {}, {}, {})",
            target, internalformat, width, height
        ));
    }

    fn create_texture(&self) -> NativeHandle {
        self.mint("createTexture", "")
    }

    fn bind_texture(&self, target: GLenum, texture: NativeHandle) {
        self.log(format!("bindTexture({}, {})", target, texture));
    }

    fn delete_texture(&self, texture: NativeHandle) {
        self.log(format!("deleteTexture({})", texture));
    }

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
    ) {
        self.log(format!(
            "texImage2D({}, {}, {}, {}x{}, {}, {}, {}, {})",
            target,
            level,
            internal_format,
            width,
            height,
            border,
            format,
            ty,
            pixels.map_or("null".to_string(), |data| format!("{} bytes", data.len())),
        ));
    }

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
    ) {
        self.log(format!(
            "texSubImage2D({}, {}, {}+{}, {}x{}, {}, {}, {} bytes)",
            target, level, xoffset, yoffset, width, height, format, ty, pixels.len()
        ));
    }

    fn tex_parameter_f(&self, target: GLenum, pname: GLenum, param: GLfloat) {
        self.log(format!("texParameterf({}, {}, {})", target, pname, param));
    }

    fn tex_parameter_i(&self, target: GLenum, pname: GLenum, param: GLint) {
        self.log(format!("texParameteri({}, {}, {})", target, pname, param));
    }

    fn generate_mipmap(&self, target: GLenum) {
        self.log(format!("generateMipmap({})", target));
    }

    fn active_texture(&self, texture: GLenum) {
        self.log(format!("activeTexture({})", texture));
    }

    fn pixel_store_i(&self, pname: GLenum, param: GLint) {
        self.log(format!("pixelStorei({}, {})", pname, param));
    }

    fn create_shader(&self, ty: GLenum) -> NativeHandle {
        self.mint("createShader", &ty.to_string())
    }

    fn create_program(&self) -> NativeHandle {
        self.mint("createProgram", "")
    }

    fn shader_source(&self, shader: NativeHandle, source: &str) {
        self.log(format!("shaderSource({}, {} chars)", shader, source.len()));
    }

    fn compile_shader(&self, shader: NativeHandle) {
        self.log(format!("compileShader({})", shader));
    }

    fn attach_shader(&self, program: NativeHandle, shader: NativeHandle) {
        self.log(format!("attachShader({}, {})", program, shader));
    }

    fn detach_shader(&self, program: NativeHandle, shader: NativeHandle) {
        self.log(format!("detachShader({}, {})", program, shader));
    }

    fn link_program(&self, program: NativeHandle) {
        self.log(format!("linkProgram({})", program));
    }

    fn use_program(&self, program: NativeHandle) {
        self.log(format!("useProgram({})", program));
    }

    fn validate_program(&self, program: NativeHandle) {
        self.log(format!("validateProgram({})", program));
    }

    fn bind_attrib_location(&self, program: NativeHandle, index: GLuint, name: &str) {
        self.log(format!("bindAttribLocation({}, {}, {})", program, index, name));
    }

    fn delete_shader(&self, shader: NativeHandle) {
        self.log(format!("deleteShader({})", shader));
    }

    fn delete_program(&self, program: NativeHandle) {
        self.log(format!("deleteProgram({})", program));
    }

    fn get_program_parameter(&self, program: NativeHandle, pname: GLenum) -> GLint {
        let inner = self.inner.borrow();
        let _ = program;
        match pname {
            gl::ACTIVE_ATTRIBUTES => inner.attribs.len() as GLint,
            gl::ACTIVE_UNIFORMS => inner.uniforms.len() as GLint,
            gl::LINK_STATUS => 1,
            _ => 0,
        }
    }

    fn get_active_attrib(&self, _program: NativeHandle, index: GLuint) -> Option<ActiveInfo> {
        self.inner.borrow().attribs.get(index as usize).cloned()
    }

    fn get_active_uniform(&self, _program: NativeHandle, index: GLuint) -> Option<ActiveInfo> {
        self.inner.borrow().uniforms.get(index as usize).cloned()
    }

    fn get_uniform_location(&self, program: NativeHandle, name: &str) -> Option<NativeHandle> {
        let known = self.inner.borrow().uniforms.iter().any(|u| u.name == name);
        if !known {
            return None;
        }
        Some(self.mint("getUniformLocation", &format!("{}, {}", program, name)))
    }

    fn uniform_1f(&self, location: NativeHandle, x: GLfloat) {
        self.log(format!("uniform1f({}, {})", location, x));
    }

    fn uniform_2f(&self, location: NativeHandle, x: GLfloat, y: GLfloat) {
        self.log(format!("uniform2f({}, {}, {})", location, x, y));
    }

    fn uniform_3f(&self, location: NativeHandle, x: GLfloat, y: GLfloat, z: GLfloat) {
        self.log(format!("uniform3f({}, {}, {}, {})", location, x, y, z));
    }

    fn uniform_4f(&self, location: NativeHandle, x: GLfloat, y: GLfloat, z: GLfloat, w: GLfloat) {
        self.log(format!("uniform4f({}, {}, {}, {}, {})", location, x, y, z, w));
    }

    fn uniform_1i(&self, location: NativeHandle, x: GLint) {
        self.log(format!("uniform1i({}, {})", location, x));
    }

    fn uniform_2i(&self, location: NativeHandle, x: GLint, y: GLint) {
        self.log(format!("uniform2i({}, {}, {})", location, x, y));
    }

    fn uniform_3i(&self, location: NativeHandle, x: GLint, y: GLint, z: GLint) {
        self.log(format!("uniform3i({}, {}, {}, {})", location, x, y, z));
    }

    fn uniform_4i(&self, location: NativeHandle, x: GLint, y: GLint, z: GLint, w: GLint) {
        self.log(format!("uniform4i({}, {}, {}, {}, {})", location, x, y, z, w));
    }

    fn uniform_1fv(&self, location: NativeHandle, values: &[f32]) {
        self.log(format!("uniform1fv({}, {} values)", location, values.len()));
    }

    fn uniform_2fv(&self, location: NativeHandle, values: &[f32]) {
        self.log(format!("uniform2fv({}, {} values)", location, values.len()));
    }

    fn uniform_3fv(&self, location: NativeHandle, values: &[f32]) {
        self.log(format!("uniform3fv({}, {} values)", location, values.len()));
    }

    fn uniform_4fv(&self, location: NativeHandle, values: &[f32]) {
        self.log(format!("uniform4fv({}, {} values)", location, values.len()));
    }

    fn uniform_1iv(&self, location: NativeHandle, values: &[i32]) {
        self.log(format!("uniform1iv({}, {} values)", location, values.len()));
    }

    fn uniform_2iv(&self, location: NativeHandle, values: &[i32]) {
        self.log(format!("uniform2iv({}, {} values)", location, values.len()));
    }

    fn uniform_3iv(&self, location: NativeHandle, values: &[i32]) {
        self.log(format!("uniform3iv({}, {} values)", location, values.len()));
    }

    fn uniform_4iv(&self, location: NativeHandle, values: &[i32]) {
        self.log(format!("uniform4iv({}, {} values)", location, values.len()));
    }

    fn uniform_matrix_2fv(&self, location: NativeHandle, transpose: bool, values: &[f32]) {
        self.log(format!("uniformMatrix2fv({}, {}, {} values)", location, transpose, values.len()));
    }

    fn uniform_matrix_3fv(&self, location: NativeHandle, transpose: bool, values: &[f32]) {
        self.log(format!("uniformMatrix3fv({}, {}, {} values)", location, transpose, values.len()));
    }

    fn uniform_matrix_4fv(&self, location: NativeHandle, transpose: bool, values: &[f32]) {
        self.log(format!("uniformMatrix4fv({}, {}, {} values)", location, transpose, values.len()));
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        self.log(format!("enableVertexAttribArray({})", index));
    }

    fn disable_vertex_attrib_array(&self, index: GLuint) {
        self.log(format!("disableVertexAttribArray({})", index));
    }

    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: GLuint,
    ) {
        self.log(format!(
            "vertexAttribPointer({}, {}, {}, {}, {}, {})",
            index, size, ty, normalized, stride, offset
        ));
    }

    fn vertex_attrib_1f(&self, index: GLuint, x: GLfloat) {
        self.log(format!("vertexAttrib1f({}, {})", index, x));
    }

    fn vertex_attrib_2f(&self, index: GLuint, x: GLfloat, y: GLfloat) {
        self.log(format!("vertexAttrib2f({}, {}, {})", index, x, y));
    }

    fn vertex_attrib_3f(&self, index: GLuint, x: GLfloat, y: GLfloat, z: GLfloat) {
        self.log(format!("vertexAttrib3f({}, {}, {}, {})", index, x, y, z));
    }

    fn vertex_attrib_4f(&self, index: GLuint, x: GLfloat, y: GLfloat, z: GLfloat, w: GLfloat) {
        self.log(format!("vertexAttrib4f({}, {}, {}, {}, {})", index, x, y, z, w));
    }

    fn vertex_attrib_1fv(&self, index: GLuint, values: &[f32]) {
        self.log(format!("vertexAttrib1fv({}, {} values)", index, values.len()));
    }

    fn vertex_attrib_2fv(&self, index: GLuint, values: &[f32]) {
        self.log(format!("vertexAttrib2fv({}, {} values)", index, values.len()));
    }

    fn vertex_attrib_3fv(&self, index: GLuint, values: &[f32]) {
        self.log(format!("vertexAttrib3fv({}, {} values)", index, values.len()));
    }

    fn vertex_attrib_4fv(&self, index: GLuint, values: &[f32]) {
        self.log(format!("vertexAttrib4fv({}, {} values)", index, values.len()));
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        self.log(format!("drawArrays({}, {}, {})", mode, first, count));
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: GLuint) {
        self.log(format!("drawElements({}, {}, {}, {})", mode, count, ty, offset));
    }

    fn clear(&self, mask: GLbitfield) {
        self.log(format!("clear({})", mask));
    }

    fn flush(&self) {
        self.log("flush()".to_string());
    }

    fn finish(&self) {
        self.log("finish()".to_string());
    }

    fn enable(&self, cap: GLenum) {
        self.log(format!("enable({})", cap));
    }

    fn disable(&self, cap: GLenum) {
        self.log(format!("disable({})", cap));
    }

    fn blend_color(&self, r: GLclampf, g: GLclampf, b: GLclampf, a: GLclampf) {
        self.log(format!("blendColor({}, {}, {}, {})", r, g, b, a));
    }

    fn blend_equation(&self, mode: GLenum) {
        self.log(format!("blendEquation({})", mode));
    }

    fn blend_equation_separate(&self, mode_rgb: GLenum, mode_alpha: GLenum) {
        self.log(format!("blendEquationSeparate({}, {})", mode_rgb, mode_alpha));
    }

    fn blend_func(&self, src: GLenum, dst: GLenum) {
        self.log(format!("blendFunc({}, {})", src, dst));
    }

    fn blend_func_separate(&self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum) {
        self.log(format!(
            "blendFuncSeparate({}, {}, {}, {})",
            src_rgb, dst_rgb, src_alpha, dst_alpha
        ));
    }

    fn clear_color(&self, r: GLclampf, g: GLclampf, b: GLclampf, a: GLclampf) {
        self.log(format!("clearColor({}, {}, {}, {})", r, g, b, a));
    }

    fn clear_depth(&self, depth: GLclampf) {
        self.log(format!("clearDepth({})", depth));
    }

    fn clear_stencil(&self, s: GLint) {
        self.log(format!("clearStencil({})", s));
    }

    fn color_mask(&self, r: bool, g: bool, b: bool, a: bool) {
        self.log(format!("colorMask({}, {}, {}, {})", r, g, b, a));
    }

    fn cull_face(&self, mode: GLenum) {
        self.log(format!("cullFace({})", mode));
    }

    fn depth_func(&self, func: GLenum) {
        self.log(format!("depthFunc({})", func));
    }

    fn depth_mask(&self, flag: bool) {
        self.log(format!("depthMask({})", flag));
    }

    fn depth_range(&self, near: GLclampf, far: GLclampf) {
        self.log(format!("depthRange({}, {})", near, far));
    }

    fn front_face(&self, mode: GLenum) {
        self.log(format!("frontFace({})", mode));
    }

    fn hint(&self, target: GLenum, mode: GLenum) {
        self.log(format!("hint({}, {})", target, mode));
    }

    fn line_width(&self, width: GLfloat) {
        self.log(format!("lineWidth({})", width));
    }

    fn polygon_offset(&self, factor: GLfloat, units: GLfloat) {
        self.log(format!("polygonOffset({}, {})", factor, units));
    }

    fn sample_coverage(&self, value: GLclampf, invert: bool) {
        self.log(format!("sampleCoverage({}, {})", value, invert));
    }

    fn scissor(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.log(format!("scissor({}, {}, {}, {})", x, y, width, height));
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.log(format!("viewport({}, {}, {}, {})", x, y, width, height));
    }

    fn stencil_func(&self, func: GLenum, reference: GLint, mask: GLuint) {
        self.log(format!("stencilFunc({}, {}, {})", func, reference, mask));
    }

    fn stencil_func_separate(&self, face: GLenum, func: GLenum, reference: GLint, mask: GLuint) {
        self.log(format!("stencilFuncSeparate({}, {}, {}, {})", face, func, reference, mask));
    }

    fn stencil_mask(&self, mask: GLuint) {
        self.log(format!("stencilMask({})", mask));
    }

    fn stencil_mask_separate(&self, face: GLenum, mask: GLuint) {
        self.log(format!("stencilMaskSeparate({}, {})", face, mask));
    }

    fn stencil_op(&self, fail: GLenum, zfail: GLenum, zpass: GLenum) {
        self.log(format!("stencilOp({}, {}, {})", fail, zfail, zpass));
    }

    fn stencil_op_separate(&self, face: GLenum, fail: GLenum, zfail: GLenum, zpass: GLenum) {
        self.log(format!("stencilOpSeparate({}, {}, {}, {})", face, fail, zfail, zpass));
    }

    fn get_parameter(&self, pname: GLenum) -> GLint {
        match pname {
            gl::MAX_VERTEX_ATTRIBS => 16,
            _ => 0,
        }
    }
}
