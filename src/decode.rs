//! What a command decoder sees while one phase of a call is decoded
//!
//! [`DecodeCtx`] bundles the call, its phase and outcome, the tracee
//! memory, the record layout selected for the process ABI, and the output
//! buffer. Its fetch helpers encode the read rules every decoder shares:
//! a null pointer prints `NULL`, an unreadable one prints its address, and
//! nothing is read on the way out of a failed call.

use std::sync::Arc;

use tracing::trace;

use crate::array::{elem, render_array, ArraySpec};
use crate::config::DecodeConfig;
use crate::ioc::addr;
use crate::memory::TraceeMemory;
use crate::personality::{Abi, PersonalityResolver, RecordDesc, RecordLayout, Scalar};
use crate::record::Record;
use crate::render::{quote, Render};
use crate::session::{CallContext, Outcome, Phase, Stash};

/// Whether a decoder needs the exiting half of the call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Decoded,
    AwaitExit,
}

pub struct DecodeCtx<'a> {
    pub(crate) call: CallContext,
    pub(crate) phase: Phase,
    pub(crate) outcome: Option<Outcome>,
    pub(crate) abi: Abi,
    pub(crate) mem: &'a dyn TraceeMemory,
    pub(crate) resolver: &'a PersonalityResolver,
    pub(crate) layout: Option<&'a Arc<RecordLayout>>,
    /// Bytes fetched for the command record.
    pub(crate) read_len: usize,
    pub(crate) config: &'a DecodeConfig,
    pub out: &'a mut Render,
    pub(crate) stash: &'a mut Option<Stash>,
}

impl<'a> DecodeCtx<'a> {
    pub fn exiting(&self) -> bool {
        self.phase == Phase::Exiting
    }

    /// The call has exited with an error.
    pub fn failed(&self) -> bool {
        matches!(self.outcome, Some(Outcome::Failure(_)))
    }

    pub fn arg(&self) -> u64 {
        self.call.arg
    }

    pub fn config(&self) -> &'a DecodeConfig {
        self.config
    }

    /// Print the argument as a bare pointer.
    pub fn raw_arg(&mut self) -> Step {
        self.out.raw(&addr(self.call.arg));
        Step::Decoded
    }

    /// Layout of an auxiliary record under the tracee ABI.
    pub fn layout_of(&self, desc: &RecordDesc) -> Option<Arc<RecordLayout>> {
        self.resolver.layout_for(self.abi, desc).map(Arc::new)
    }

    fn load(&mut self, at: u64, layout: Arc<RecordLayout>, len: usize) -> Option<Record> {
        if at == 0 {
            self.out.raw("NULL");
            return None;
        }
        if !self.config.verbose || (self.exiting() && self.failed()) {
            self.out.raw(&addr(at));
            return None;
        }
        match self.mem.read(at, len) {
            Ok(bytes) => Some(Record::new(layout, bytes)),
            Err(err) => {
                trace!(addr = at, len, %err, "record unreadable");
                self.out.raw(&addr(at));
                None
            }
        }
    }

    /// Fetch the command record, or print why it could not be fetched.
    pub fn fetch(&mut self) -> Option<Record> {
        let Some(layout) = self.layout.cloned() else {
            self.raw_arg();
            return None;
        };
        let len = self.read_len;
        self.load(self.call.arg, layout, len)
    }

    /// Silent re-read of the command record after a successful call.
    pub fn refetch(&self) -> Option<Record> {
        if self.failed() || self.call.arg == 0 {
            return None;
        }
        let layout = self.layout?;
        self.mem
            .read(self.call.arg, self.read_len)
            .ok()
            .map(|bytes| Record::new(Arc::clone(layout), bytes))
    }

    /// Fetch a record the command record points at.
    pub fn fetch_from(&mut self, at: u64, desc: &RecordDesc) -> Option<Record> {
        let Some(layout) = self.layout_of(desc) else {
            self.out.raw(&addr(at));
            return None;
        };
        let len = layout.size;
        self.load(at, layout, len)
    }

    /// Read one scalar without printing anything.
    pub fn read_scalar(&self, at: u64, ty: Scalar) -> Option<u64> {
        let p = self.resolver.personality(self.abi)?;
        let size = ty.size(p);
        let bytes = self.mem.read(at, size).ok()?;
        let mut buf = [0u8; 8];
        buf[..size].copy_from_slice(&bytes);
        Some(u64::from_le_bytes(buf))
    }

    /// Store the value the exiting handler needs.
    pub fn stash(&mut self, value: Stash) {
        *self.stash = Some(value);
    }

    /// Take the stashed value; a second call yields `None`.
    pub fn take_stash(&mut self) -> Option<Stash> {
        self.stash.take()
    }

    fn array_spec(&self, base: u64, count: u64, stride: usize) -> ArraySpec {
        ArraySpec {
            base,
            count,
            stride,
            cap: self.config.max_array_elements,
        }
    }

    /// `label=[...]` over elements of `stride` bytes.
    pub fn array<F>(&mut self, label: &str, base: u64, count: u64, stride: usize, f: F)
    where
        F: FnMut(&mut Render, &[u8]),
    {
        self.out.label(label);
        if !self.config.verbose {
            self.out.raw(&addr(base));
            return;
        }
        let spec = self.array_spec(base, count, stride);
        let outcome = render_array(self.mem, self.out, spec, f);
        if outcome.is_truncated() {
            trace!(label, count, printed = outcome.printed(), ?outcome, "array truncated");
        }
    }

    pub fn u16_array(&mut self, label: &str, base: u64, count: u64) {
        self.array(label, base, count, 2, elem::u16)
    }

    pub fn u32_array(&mut self, label: &str, base: u64, count: u64) {
        self.array(label, base, count, 4, elem::u32)
    }

    pub fn i32_array(&mut self, label: &str, base: u64, count: u64) {
        self.array(label, base, count, 4, elem::i32)
    }

    pub fn u64_array(&mut self, label: &str, base: u64, count: u64) {
        self.array(label, base, count, 8, elem::u64)
    }

    /// `label=[{...}, ...]` over records of `desc`.
    pub fn record_array<F>(&mut self, label: &str, base: u64, count: u64, desc: &RecordDesc, mut f: F)
    where
        F: FnMut(&mut Render, &Record),
    {
        let Some(layout) = self.layout_of(desc) else {
            self.out.label(label);
            self.out.raw(&addr(base));
            return;
        };
        let stride = layout.size;
        self.array(label, base, count, stride, |out, bytes| {
            let record = Record::new(Arc::clone(&layout), bytes.to_vec());
            f(out, &record);
        });
    }

    /// The record in braces, completed in this phase.
    pub fn whole<F>(&mut self, f: F) -> Step
    where
        F: FnOnce(&mut Self, &Record),
    {
        if let Some(r) = self.fetch() {
            self.out.open();
            f(self, &r);
            self.out.close();
        }
        Step::Decoded
    }

    /// Closed entry fields; the exit half appends ` => {...}`.
    pub fn entry<F>(&mut self, f: F) -> Step
    where
        F: FnOnce(&mut Self, &Record),
    {
        match self.fetch() {
            Some(r) => {
                self.out.open();
                f(self, &r);
                self.out.close();
                Step::AwaitExit
            }
            None => Step::Decoded,
        }
    }

    /// Entry fields of a record left open for the exit half.
    pub fn begin<F>(&mut self, f: F) -> Step
    where
        F: FnOnce(&mut Self, &Record),
    {
        match self.fetch() {
            Some(r) => {
                self.out.open();
                f(self, &r);
                Step::AwaitExit
            }
            None => Step::Decoded,
        }
    }

    /// Fields the call wrote back, if it succeeded, then the closing brace.
    pub fn finish<F>(&mut self, f: F) -> Step
    where
        F: FnOnce(&mut Self, &Record),
    {
        if let Some(r) = self.refetch() {
            f(self, &r);
        }
        self.out.close();
        Step::Decoded
    }

    /// ` => {...}` after a successful call.
    pub fn update<F>(&mut self, f: F) -> Step
    where
        F: FnOnce(&mut Self, &Record),
    {
        if let Some(r) = self.refetch() {
            self.out.arrow();
            self.out.open();
            f(self, &r);
            self.out.close();
        }
        Step::Decoded
    }

    /// `label="..."` for a counted string of `len` bytes at `at`.
    pub fn string(&mut self, label: &str, at: u64, len: u64) {
        self.out.label(label);
        if at == 0 {
            self.out.raw("NULL");
            return;
        }
        if !self.config.verbose {
            self.out.raw(&addr(at));
            return;
        }
        let limit = self.config.max_string_len as u64;
        let wanted = len.min(limit) as usize;
        match self.mem.read(at, wanted) {
            Ok(bytes) => {
                self.out.raw(&quote(&bytes));
                if len > limit {
                    self.out.raw("...");
                }
            }
            Err(err) => {
                trace!(addr = at, len = wanted, %err, "string unreadable");
                self.out.raw(&addr(at));
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Drives a single handler outside the engine.

    use super::*;
    use crate::memory::MemoryImage;
    use crate::personality::PersonalityResolver;

    pub struct Harness {
        pub mem: MemoryImage,
        pub resolver: PersonalityResolver,
        pub config: DecodeConfig,
        pub abi: Abi,
    }

    impl Harness {
        pub fn new() -> Self {
            Self {
                mem: MemoryImage::new(),
                resolver: PersonalityResolver::default(),
                config: DecodeConfig::default(),
                abi: Abi::X86_64,
            }
        }

        pub fn run<F>(
            &self,
            desc: Option<&RecordDesc>,
            arg: u64,
            phase: Phase,
            outcome: Option<Outcome>,
            f: F,
        ) -> (String, Step)
        where
            F: FnOnce(&mut DecodeCtx<'_>) -> Step,
        {
            let layout = desc.and_then(|d| self.resolver.layout_for(self.abi, d)).map(Arc::new);
            let read_len = layout.as_ref().map_or(0, |l| l.size);
            let mut out = Render::new();
            let mut stash = None;
            let mut ctx = DecodeCtx {
                call: CallContext::new(3, 0u32, arg),
                phase,
                outcome,
                abi: self.abi,
                mem: &self.mem,
                resolver: &self.resolver,
                layout: layout.as_ref(),
                read_len,
                config: &self.config,
                out: &mut out,
                stash: &mut stash,
            };
            let step = f(&mut ctx);
            (out.as_str().to_string(), step)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::Harness;
    use super::*;
    use crate::personality::Field;

    static AUTH: RecordDesc = RecordDesc::structure("drm_auth", &[Field::u32("magic")]);

    fn print_magic(ctx: &mut DecodeCtx<'_>) -> Step {
        if let Some(r) = ctx.fetch() {
            ctx.out.open();
            ctx.out.u(&r, "magic");
            ctx.out.close();
        }
        Step::Decoded
    }

    #[test]
    fn test_fetch_prints_record() {
        let mut h = Harness::new();
        h.mem.map(0x1000, 7u32.to_le_bytes().to_vec());
        let (text, _) = h.run(Some(&AUTH), 0x1000, Phase::Entering, None, print_magic);
        assert_eq!(text, "{magic=7}");
    }

    #[test]
    fn test_fetch_null_and_unreadable() {
        let h = Harness::new();
        assert_eq!(h.run(Some(&AUTH), 0, Phase::Entering, None, print_magic).0, "NULL");
        assert_eq!(h.run(Some(&AUTH), 0xbad0, Phase::Entering, None, print_magic).0, "0xbad0");
    }

    #[test]
    fn test_fetch_after_failure_does_not_read() {
        let mut h = Harness::new();
        h.mem.map(0x1000, vec![0; 4]);
        let failed = Some(Outcome::Failure(libc::EFAULT));
        let (text, _) = h.run(Some(&AUTH), 0x1000, Phase::Exiting, failed, print_magic);
        assert_eq!(text, "0x1000");
        assert!(h.mem.reads().is_empty());
    }

    #[test]
    fn test_fetch_not_verbose() {
        let mut h = Harness::new();
        h.mem.map(0x1000, vec![0; 4]);
        h.config.verbose = false;
        let (text, _) = h.run(Some(&AUTH), 0x1000, Phase::Entering, None, print_magic);
        assert_eq!(text, "0x1000");
        assert!(h.mem.reads().is_empty());
    }

    #[test]
    fn test_refetch_silent_on_failure() {
        let mut h = Harness::new();
        h.mem.map(0x1000, vec![1, 0, 0, 0]);
        let failed = Some(Outcome::Failure(libc::EINVAL));
        let (text, _) = h.run(Some(&AUTH), 0x1000, Phase::Exiting, failed, |ctx| {
            assert!(ctx.refetch().is_none());
            Step::Decoded
        });
        assert!(text.is_empty());
    }

    #[test]
    fn test_string_truncation() {
        let mut h = Harness::new();
        h.mem.map(0x2000, b"abcdefgh".to_vec());
        h.config.max_string_len = 4;
        let (text, _) = h.run(None, 0, Phase::Entering, None, |ctx| {
            ctx.out.open();
            ctx.string("name", 0x2000, 8);
            ctx.string("desc", 0x2000, 3);
            ctx.out.close();
            Step::Decoded
        });
        assert_eq!(text, "{name=\"abcd\"..., desc=\"abc\"}");
    }

    #[test]
    fn test_stash_taken_once() {
        let h = Harness::new();
        h.run(None, 0, Phase::Entering, None, |ctx| {
            ctx.stash(Stash::AmdgpuCtxOp(3));
            assert_eq!(ctx.take_stash(), Some(Stash::AmdgpuCtxOp(3)));
            assert_eq!(ctx.take_stash(), None);
            Step::Decoded
        });
    }

    #[test]
    fn test_record_array() {
        let mut h = Harness::new();
        let bytes: Vec<u8> = [5u32, 6].iter().flat_map(|v| v.to_le_bytes()).collect();
        h.mem.map(0x3000, bytes);
        let (text, _) = h.run(None, 0, Phase::Entering, None, |ctx| {
            ctx.record_array("auth", 0x3000, 2, &AUTH, |out, r| {
                out.open();
                out.u(r, "magic");
                out.close();
            });
            Step::Decoded
        });
        assert_eq!(text, "auth=[{magic=5}, {magic=6}]");
    }
}
