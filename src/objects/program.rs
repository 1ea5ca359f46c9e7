// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Shaders, programs and uniform locations.

Compile and link failures do not produce errors.  The object is returned anyway, marked broken,
and the info log is written to the error log.  Drawing with a broken program renders nothing
but keeps the frame going.
*/

use crate::device::{Device, RawProgram, RawShader, RawUniformLocation, ShaderStage};
use crate::objects::{ProgramHandle, ShaderHandle, UniformLocationHandle};

/// Associates a shader-side name with a binding index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedBinding<'a> {
    pub name: &'a str,
    pub index: u32,
}

impl<'a> NamedBinding<'a> {
    pub const fn new(name: &'a str, index: u32) -> Self {
        NamedBinding { name, index }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProgramInfo<'a> {
    pub label: &'a str,
    pub vertex_shader: ShaderHandle,
    pub fragment_shader: ShaderHandle,
    /// Sampler uniforms and the texture unit each reads from.
    pub texture_bindings: &'a [NamedBinding<'a>],
    /// Uniform blocks and the buffer binding each reads from.
    pub uniform_bindings: &'a [NamedBinding<'a>],
}

#[derive(Debug)]
pub struct Shader {
    raw: RawShader,
    stage: ShaderStage,
    info_log: Option<String>,
}

impl Shader {
    pub(crate) fn create<D: Device + ?Sized>(
        device: &mut D,
        stage: ShaderStage,
        label: &str,
        source: &str,
    ) -> Shader {
        let raw = device.create_shader(stage);
        let info_log = match device.compile_shader(raw, source) {
            Ok(()) => None,
            Err(log) => {
                logwise::error_sync!(
                    "Shader {label} failed to compile: {log}",
                    label = logwise::privacy::LogIt(&label),
                    log = logwise::privacy::LogIt(&log)
                );
                Some(log)
            }
        };
        Shader {
            raw,
            stage,
            info_log,
        }
    }

    pub(crate) fn release<D: Device + ?Sized>(self, device: &mut D) {
        device.delete_shader(self.raw);
    }

    pub fn raw(&self) -> RawShader {
        self.raw
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn is_compiled(&self) -> bool {
        self.info_log.is_none()
    }

    /// Compiler output of a failed compile.
    pub fn info_log(&self) -> Option<&str> {
        self.info_log.as_deref()
    }
}

#[derive(Debug)]
pub struct Program {
    raw: RawProgram,
    info_log: Option<String>,
    uniform_locations: Vec<UniformLocationHandle>,
}

impl Program {
    pub(crate) fn create<D: Device + ?Sized>(
        device: &mut D,
        label: &str,
        shaders: &[RawShader],
        texture_bindings: &[NamedBinding<'_>],
        uniform_bindings: &[NamedBinding<'_>],
    ) -> Program {
        let raw = device.create_program();
        let info_log = match device.link_program(raw, shaders) {
            Ok(()) => None,
            Err(log) => {
                logwise::error_sync!(
                    "Program {label} failed to link: {log}",
                    label = logwise::privacy::LogIt(&label),
                    log = logwise::privacy::LogIt(&log)
                );
                Some(log)
            }
        };
        for binding in texture_bindings {
            if !device.texture_binding(raw, binding.name, binding.index) {
                logwise::trace_sync!(
                    "Program {label} has no sampler {name}",
                    label = logwise::privacy::LogIt(&label),
                    name = logwise::privacy::LogIt(&binding.name)
                );
            }
        }
        for binding in uniform_bindings {
            if !device.uniform_block_binding(raw, binding.name, binding.index) {
                logwise::trace_sync!(
                    "Program {label} has no uniform block {name}",
                    label = logwise::privacy::LogIt(&label),
                    name = logwise::privacy::LogIt(&binding.name)
                );
            }
        }
        Program {
            raw,
            info_log,
            uniform_locations: Vec::new(),
        }
    }

    pub(crate) fn track_uniform_location(&mut self, location: UniformLocationHandle) {
        self.uniform_locations.push(location);
    }

    /// Deletes the device program and hands back the uniform locations it issued.
    pub(crate) fn release<D: Device + ?Sized>(
        self,
        device: &mut D,
    ) -> Vec<UniformLocationHandle> {
        device.delete_program(self.raw);
        self.uniform_locations
    }

    pub fn raw(&self) -> RawProgram {
        self.raw
    }

    pub fn is_linked(&self) -> bool {
        self.info_log.is_none()
    }

    /// Linker output of a failed link.
    pub fn info_log(&self) -> Option<&str> {
        self.info_log.as_deref()
    }

    pub fn uniform_locations(&self) -> &[UniformLocationHandle] {
        &self.uniform_locations
    }
}

/**
A uniform of a particular program.

A name the program does not have (or optimized away) still produces a location; setting it
does nothing.
*/
#[derive(Debug)]
pub struct UniformLocation {
    raw: Option<RawUniformLocation>,
    program: ProgramHandle,
}

impl UniformLocation {
    pub(crate) fn new(raw: Option<RawUniformLocation>, program: ProgramHandle) -> Self {
        UniformLocation { raw, program }
    }

    pub fn raw(&self) -> Option<RawUniformLocation> {
        self.raw
    }

    pub fn program(&self) -> ProgramHandle {
        self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imp::{DeviceCall, RecordingDevice};

    #[test]
    fn failed_compile_keeps_a_valid_shader() {
        let mut device = RecordingDevice::new();
        device.fail_next_compile("0:1: syntax error");
        let shader = Shader::create(&mut device, ShaderStage::Fragment, "broken", "void main(");
        assert!(!shader.is_compiled());
        assert_eq!(shader.info_log(), Some("0:1: syntax error"));
        let fine = Shader::create(&mut device, ShaderStage::Vertex, "fine", "void main() {}");
        assert!(fine.is_compiled());
    }

    #[test]
    fn link_applies_bindings() {
        let mut device = RecordingDevice::new();
        let vs = Shader::create(&mut device, ShaderStage::Vertex, "vs", "");
        let fs = Shader::create(&mut device, ShaderStage::Fragment, "fs", "");
        device.clear_calls();
        device.fail_next_link("missing main");
        let program = Program::create(
            &mut device,
            "sky",
            &[vs.raw(), fs.raw()],
            &[NamedBinding::new("albedo", 0), NamedBinding::new("normals", 1)],
            &[NamedBinding::new("Camera", 0)],
        );
        assert!(!program.is_linked());
        let raw = program.raw();
        assert_eq!(
            device.calls()[1..].to_vec(),
            vec![
                DeviceCall::LinkProgram(raw, vec![vs.raw(), fs.raw()]),
                DeviceCall::TextureBinding(raw, "albedo".to_string(), 0),
                DeviceCall::TextureBinding(raw, "normals".to_string(), 1),
                DeviceCall::UniformBlockBinding(raw, "Camera".to_string(), 0),
            ]
        );
    }
}
