//! Per-call decode state
//!
//! One [`DecodeSession`] exists for each in-flight ioctl. The harness
//! creates it when the call enters, hands it back to the engine when the
//! call exits, and drops it afterwards.

use crate::ioc::Opcode;
use crate::registry::CommandDescriptor;
use crate::render::Render;

/// Raw inputs of one observed ioctl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub fd: i32,
    pub opcode: Opcode,
    /// Third syscall argument, usually a pointer to the command record.
    pub arg: u64,
}

impl CallContext {
    pub fn new(fd: i32, opcode: impl Into<Opcode>, arg: u64) -> Self {
        Self { fd, opcode: opcode.into(), arg }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Entering,
    Exiting,
}

/// How the underlying call completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success(i64),
    /// Positive errno.
    Failure(i32),
}

impl Outcome {
    /// Classify a raw syscall return register the way the kernel encodes
    /// errors: values in `[-4095, -1]` are negated errnos.
    pub fn from_return(ret: i64) -> Self {
        if (-4095..0).contains(&ret) {
            Outcome::Failure((-ret) as i32)
        } else {
            Outcome::Success(ret)
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Entering,
    Exiting,
    Decoded,
}

/// Value carried from the entering handler to the exiting handler
///
/// Each variant belongs to one command family, so a handler can only pick
/// up what its own entering half stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stash {
    /// `drm_amdgpu_ctx.in.op`, selects the `out` union member.
    AmdgpuCtxOp(u64),
    /// `drm_amdgpu_gem_metadata.op`, decides whether `data` is an output.
    AmdgpuMetadataOp(u64),
    /// `drm_i915_getparam.param`, decides how the value is printed.
    I915Param(u64),
}

#[derive(Debug, Clone)]
pub struct DecodeSession {
    pub(crate) call: CallContext,
    pub(crate) state: SessionState,
    pub(crate) outcome: Option<Outcome>,
    pub(crate) descriptor: Option<CommandDescriptor>,
    pub(crate) stash: Option<Stash>,
    pub(crate) render: Render,
}

impl DecodeSession {
    pub fn new(call: CallContext) -> Self {
        Self {
            call,
            state: SessionState::Entering,
            outcome: None,
            descriptor: None,
            stash: None,
            render: Render::new(),
        }
    }

    /// Record the call result before the exiting decode.
    pub fn exiting(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }

    pub fn call(&self) -> &CallContext {
        &self.call
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Argument text accumulated over both phases.
    pub fn text(&self) -> &str {
        self.render.as_str()
    }

    /// Name of the selected command, once dispatch has run.
    pub fn request_name(&self) -> Option<&'static str> {
        self.descriptor.as_ref().and_then(|d| d.name)
    }

    pub fn descriptor(&self) -> Option<&CommandDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn is_decoded(&self) -> bool {
        self.state == SessionState::Decoded
    }
}
