//! Ptrace harness around the ioctl decoder
//!
//! Stops every tracee at syscall entry and exit. `ioctl(2)` calls are run
//! through the [`Engine`] in both phases; `close`, `dup2`, `dup3`,
//! `close_range` and `execve` only invalidate the driver identity cache.
//! Everything else passes through silently.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::os::unix::process::CommandExt;
use std::process::Command;
use std::time::Instant;

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::ptrace;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};
use tracing::{debug, warn};

use crate::cli::OutputFormat;
use crate::config::DecodeConfig;
use crate::engine::{Engine, Tracee};
use crate::filter::IoctlFilter;
use crate::ioc::Opcode;
use crate::json_output::{JsonIoctl, JsonOutput};
use crate::memory::ProcessMemory;
use crate::personality::Abi;
use crate::session::{CallContext, DecodeSession, Outcome};
use crate::stats::StatsTracker;
use crate::syscalls::{self, Syscall};
use crate::vendor::{DriverIdentityCache, SysfsResolver};

/// Tracer configuration assembled from the CLI
#[derive(Debug, Clone)]
pub struct TracerConfig {
    pub decode: DecodeConfig,
    pub filter: IoctlFilter,
    pub statistics_mode: bool,
    pub timing_mode: bool,
    pub output_format: OutputFormat,
    pub follow_forks: bool,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            decode: DecodeConfig::default(),
            filter: IoctlFilter::all(),
            statistics_mode: false,
            timing_mode: false,
            output_format: OutputFormat::Text,
            follow_forks: false,
        }
    }
}

/// Attach to a running process by PID and trace its ioctls.
///
/// Returns the exit code of the traced process.
pub fn attach_to_pid(pid: i32, config: TracerConfig) -> Result<i32> {
    let pid = Pid::from_raw(pid);

    ptrace::attach(pid).context(format!("Failed to attach to PID {}", pid))?;

    // Wait for SIGSTOP from PTRACE_ATTACH
    waitpid(pid, None).context("Failed to wait for attach signal")?;

    eprintln!("[renacer-drm: Attached to process {}]", pid);

    trace_child(pid, config)
}

/// Run a command under the tracer.
///
/// Returns the exit code of the traced program.
pub fn trace_command(command: &[String], config: TracerConfig) -> Result<i32> {
    if command.is_empty() {
        anyhow::bail!("Command array is empty");
    }

    let program = &command[0];
    let args = &command[1..];

    // Fork: parent will trace, child will exec
    match unsafe { fork() }.context("Failed to fork")? {
        ForkResult::Parent { child } => {
            // Wait for the SIGTRAP raised by exec under PTRACE_TRACEME
            waitpid(child, None).context("Failed to wait for child")?;
            trace_child(child, config)
        }
        ForkResult::Child => {
            ptrace::traceme().context("Failed to PTRACE_TRACEME")?;

            let err = Command::new(program).args(args).exec();

            // If we get here, exec failed
            eprintln!("Failed to exec {}: {}", program, err);
            std::process::exit(1);
        }
    }
}

/// Syscall number and the arguments the tracer looks at
#[derive(Debug, Clone, Copy)]
struct RawSyscall {
    num: u64,
    args: [u64; 3],
}

#[cfg(target_arch = "x86_64")]
fn read_entry(pid: Pid, abi: Abi) -> Result<RawSyscall> {
    let regs = ptrace::getregs(pid).context("Failed to get registers")?;
    let args = match abi {
        // int 0x80 convention
        Abi::I386 => [regs.rbx & 0xffff_ffff, regs.rcx & 0xffff_ffff, regs.rdx & 0xffff_ffff],
        _ => [regs.rdi, regs.rsi, regs.rdx],
    };
    Ok(RawSyscall { num: regs.orig_rax, args })
}

#[cfg(target_arch = "x86_64")]
fn read_return(pid: Pid, abi: Abi) -> Result<i64> {
    let regs = ptrace::getregs(pid).context("Failed to get registers")?;
    Ok(match abi {
        Abi::I386 => regs.rax as i32 as i64,
        _ => regs.rax as i64,
    })
}

#[cfg(not(target_arch = "x86_64"))]
fn read_entry(_pid: Pid, _abi: Abi) -> Result<RawSyscall> {
    anyhow::bail!("Register access is only implemented for x86_64 hosts")
}

#[cfg(not(target_arch = "x86_64"))]
fn read_return(_pid: Pid, _abi: Abi) -> Result<i64> {
    anyhow::bail!("Register access is only implemented for x86_64 hosts")
}

/// What the exit stop has to finish
enum Pending {
    Ioctl {
        session: DecodeSession,
        request: String,
        started: Instant,
    },
    Close(i32),
    Dup(i32),
    CloseRange(i32, i32),
    Execve,
    Ignored,
}

/// Per-thread state
struct TracedProcess {
    abi: Abi,
    memory: ProcessMemory,
    /// Thread group whose descriptor table this thread uses.
    group: Pid,
    pending: Option<Pending>,
}

impl TracedProcess {
    fn new(pid: Pid, group: Pid) -> Self {
        Self {
            abi: detect_abi(pid),
            memory: ProcessMemory::new(pid),
            group,
            pending: None,
        }
    }
}

/// `Tgid:` line of `/proc/PID/status`.
fn parse_tgid(status: &str) -> Option<i32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("Tgid:"))
        .and_then(|value| value.trim().parse().ok())
}

fn thread_group(pid: Pid) -> Pid {
    fs::read_to_string(format!("/proc/{}/status", pid))
        .ok()
        .and_then(|status| parse_tgid(&status))
        .map(Pid::from_raw)
        .unwrap_or(pid)
}

/// Driver identity caches, one per thread group.
///
/// Threads of a group share one descriptor table, so a `close` observed in
/// any of them retires the identity for all of them.
#[derive(Default)]
struct DescriptorTables {
    caches: HashMap<Pid, DriverIdentityCache>,
    members: HashMap<Pid, usize>,
}

impl DescriptorTables {
    fn join<F>(&mut self, group: Pid, make: F)
    where
        F: FnOnce() -> DriverIdentityCache,
    {
        *self.members.entry(group).or_insert(0) += 1;
        self.caches.entry(group).or_insert_with(make);
    }

    /// Drop the group's cache once its last traced thread is gone.
    fn leave(&mut self, group: Pid) {
        let Some(count) = self.members.get_mut(&group) else {
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.members.remove(&group);
            self.caches.remove(&group);
        }
    }

    fn cache(&mut self, group: Pid) -> Option<&mut DriverIdentityCache> {
        self.caches.get_mut(&group)
    }
}

/// Signal to deliver when resuming a signal-delivery stop.
///
/// A new child's initial SIGSTOP comes from ptrace and is swallowed; every
/// other signal, SIGTRAP included, belongs to the tracee. Syscall and exec
/// stops arrive as their own wait statuses under `TRACESYSGOOD|TRACEEXEC`.
fn forwarded_signal(fresh: bool, sig: Signal) -> Option<Signal> {
    if fresh && sig == Signal::SIGSTOP {
        None
    } else {
        Some(sig)
    }
}

fn detect_abi(pid: Pid) -> Abi {
    match Abi::of_process(pid.as_raw()) {
        Ok(abi) => {
            debug!(pid = pid.as_raw(), %abi, "tracee ABI");
            abi
        }
        Err(err) => {
            warn!(pid = pid.as_raw(), %err, "failed to detect tracee ABI");
            Abi::Unknown
        }
    }
}

fn fd_arg(value: u64) -> i32 {
    value as u32 as i32
}

/// Clamp a `close_range` bound into the descriptor range.
fn fd_bound(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// `ioctl(...) = ...` line in strace notation.
pub fn format_line(
    pid: Option<i32>,
    fd: i32,
    request: &str,
    arg: &str,
    outcome: Outcome,
    duration_us: Option<u64>,
) -> String {
    let mut line = String::new();
    if let Some(pid) = pid {
        line.push_str(&format!("[pid {}] ", pid));
    }
    line.push_str(&format!("ioctl({}, {}, {}) = ", fd, request, arg));
    match outcome {
        Outcome::Success(value) => line.push_str(&value.to_string()),
        Outcome::Failure(errno) => {
            let errno = Errno::from_raw(errno);
            line.push_str(&format!("-1 {:?} ({})", errno, errno.desc()));
        }
    }
    if let Some(us) = duration_us {
        line.push_str(&format!(" <{:.6}>", us as f64 / 1_000_000.0));
    }
    line
}

/// Sinks for completed calls
struct Reporter {
    statistics: Option<StatsTracker>,
    json: Option<JsonOutput>,
    timing_mode: bool,
    follow_forks: bool,
}

impl Reporter {
    fn new(config: &TracerConfig) -> Self {
        Self {
            statistics: config.statistics_mode.then(StatsTracker::new),
            json: matches!(config.output_format, OutputFormat::Json).then(JsonOutput::new),
            timing_mode: config.timing_mode,
            follow_forks: config.follow_forks,
        }
    }

    fn report(&mut self, pid: Pid, session: &DecodeSession, request: &str, duration_us: u64) {
        let fd = session.call().fd;
        let outcome = session.outcome().unwrap_or(Outcome::Success(0));

        if let Some(stats) = self.statistics.as_mut() {
            stats.record(request, !outcome.is_success(), duration_us);
            return;
        }

        let duration = self.timing_mode.then_some(duration_us);
        if let Some(json) = self.json.as_mut() {
            let (result, errno) = match outcome {
                Outcome::Success(value) => (value, None),
                Outcome::Failure(errno) => {
                    (-(errno as i64), Some(format!("{:?}", Errno::from_raw(errno))))
                }
            };
            json.add_ioctl(JsonIoctl {
                pid: pid.as_raw(),
                fd,
                request: request.to_string(),
                arg: session.text().to_string(),
                result,
                errno,
                duration_us: duration,
            });
            return;
        }

        let prefix = self.follow_forks.then(|| pid.as_raw());
        let line = format_line(prefix, fd, request, session.text(), outcome, duration);
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "{}", line).ok();
        out.flush().ok();
    }

    fn finish(self, exit_code: i32) {
        if let Some(stats) = self.statistics {
            stats.print_summary();
        }
        if let Some(mut output) = self.json {
            output.set_exit_code(exit_code);
            match output.to_json() {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to serialize JSON: {}", e),
            }
        }
    }
}

struct Tracer {
    engine: Engine,
    filter: IoctlFilter,
    reporter: Reporter,
    processes: HashMap<Pid, TracedProcess>,
    descriptors: DescriptorTables,
}

impl Tracer {
    fn register(&mut self, pid: Pid) {
        if self.processes.contains_key(&pid) {
            return;
        }
        let group = thread_group(pid);
        debug!(pid = pid.as_raw(), group = group.as_raw(), "new tracee");
        self.descriptors.join(group, || {
            DriverIdentityCache::new(Box::new(SysfsResolver::new(group.as_raw())))
        });
        self.processes.insert(pid, TracedProcess::new(pid, group));
    }

    fn forget(&mut self, pid: Pid) {
        if let Some(process) = self.processes.remove(&pid) {
            self.descriptors.leave(process.group);
        }
    }

    fn syscall_entry(&mut self, pid: Pid) -> Result<()> {
        self.register(pid);
        let Some(process) = self.processes.get_mut(&pid) else {
            return Ok(());
        };
        let raw = read_entry(pid, process.abi)?;
        let call = syscalls::classify(process.abi, raw.num);
        if !matches!(call, Syscall::Ioctl | Syscall::Other(_)) {
            debug!(pid = pid.as_raw(), syscall = %syscalls::syscall_name(call), "descriptor syscall");
        }

        let pending = match call {
            Syscall::Ioctl => {
                let Some(drivers) = self.descriptors.cache(process.group) else {
                    anyhow::bail!("no descriptor table for thread group {}", process.group);
                };
                let call = CallContext::new(fd_arg(raw.args[0]), Opcode(raw.args[1] as u32), raw.args[2]);
                let mut session = DecodeSession::new(call);
                let mut tracee = Tracee {
                    abi: process.abi,
                    memory: &process.memory,
                    drivers,
                };
                self.engine.decode(&mut session, &mut tracee);
                let request = self.engine.request_name(&session);
                if self.filter.should_trace(&request) {
                    Pending::Ioctl {
                        session,
                        request,
                        started: Instant::now(),
                    }
                } else {
                    Pending::Ignored
                }
            }
            Syscall::Close => Pending::Close(fd_arg(raw.args[0])),
            Syscall::Dup2 | Syscall::Dup3 => Pending::Dup(fd_arg(raw.args[1])),
            Syscall::CloseRange => Pending::CloseRange(fd_bound(raw.args[0]), fd_bound(raw.args[1])),
            Syscall::Execve => Pending::Execve,
            Syscall::Other(_) => Pending::Ignored,
        };
        process.pending = Some(pending);
        Ok(())
    }

    fn syscall_exit(&mut self, pid: Pid) -> Result<()> {
        let Some(process) = self.processes.get_mut(&pid) else {
            return Ok(());
        };
        let Some(pending) = process.pending.take() else {
            return Ok(());
        };
        let ret = read_return(pid, process.abi)?;
        let outcome = Outcome::from_return(ret);
        let Some(drivers) = self.descriptors.cache(process.group) else {
            return Ok(());
        };

        match pending {
            Pending::Ioctl {
                mut session,
                request,
                started,
            } => {
                session.exiting(outcome);
                let mut tracee = Tracee {
                    abi: process.abi,
                    memory: &process.memory,
                    drivers,
                };
                self.engine.decode(&mut session, &mut tracee);
                let duration_us = started.elapsed().as_micros() as u64;
                self.reporter.report(pid, &session, &request, duration_us);
            }
            _ if !outcome.is_success() => {}
            Pending::Close(fd) | Pending::Dup(fd) => drivers.invalidate(fd),
            Pending::CloseRange(first, last) => drivers.invalidate_range(first, last),
            Pending::Execve => {
                drivers.clear();
                process.abi = detect_abi(pid);
            }
            Pending::Ignored => {}
        }
        Ok(())
    }

    /// Entry and exit stops alternate, so a pending call means this is the exit.
    fn syscall_stop(&mut self, pid: Pid) -> Result<()> {
        let exiting = self
            .processes
            .get(&pid)
            .is_some_and(|p| p.pending.is_some());
        if exiting {
            self.syscall_exit(pid)
        } else {
            self.syscall_entry(pid)
        }
    }
}

fn resume(pid: Pid, signal: Option<Signal>) {
    if let Err(err) = ptrace::syscall(pid, signal) {
        // the tracee may already be gone
        debug!(pid = pid.as_raw(), %err, "PTRACE_SYSCALL failed");
    }
}

fn trace_child(child: Pid, config: TracerConfig) -> Result<i32> {
    let mut options = ptrace::Options::PTRACE_O_TRACESYSGOOD
        | ptrace::Options::PTRACE_O_TRACEEXEC
        | ptrace::Options::PTRACE_O_EXITKILL;

    if config.follow_forks {
        options |= ptrace::Options::PTRACE_O_TRACEFORK
            | ptrace::Options::PTRACE_O_TRACEVFORK
            | ptrace::Options::PTRACE_O_TRACECLONE;
    }

    ptrace::setoptions(child, options).context("Failed to set ptrace options")?;

    let mut tracer = Tracer {
        engine: Engine::new(config.decode.clone()),
        filter: config.filter.clone(),
        reporter: Reporter::new(&config),
        processes: HashMap::new(),
        descriptors: DescriptorTables::default(),
    };
    tracer.register(child);

    let mut exit_code = 0;
    ptrace::syscall(child, None).context("Failed to PTRACE_SYSCALL")?;

    loop {
        let status = match waitpid(None, Some(WaitPidFlag::__WALL)) {
            Ok(status) => status,
            Err(Errno::ECHILD) => break,
            Err(err) => return Err(err).context("Failed to waitpid"),
        };

        match status {
            WaitStatus::Exited(pid, code) => {
                tracer.forget(pid);
                if pid == child {
                    exit_code = code;
                }
                if tracer.processes.is_empty() {
                    break;
                }
            }
            WaitStatus::Signaled(pid, sig, _) => {
                tracer.forget(pid);
                if pid == child {
                    eprintln!("Child killed by signal: {:?}", sig);
                    exit_code = 128 + sig as i32;
                }
                if tracer.processes.is_empty() {
                    break;
                }
            }
            WaitStatus::PtraceSyscall(pid) => {
                if let Err(err) = tracer.syscall_stop(pid) {
                    debug!(pid = pid.as_raw(), %err, "syscall stop not decoded");
                }
                resume(pid, None);
            }
            WaitStatus::PtraceEvent(pid, _, _) => resume(pid, None),
            WaitStatus::Stopped(pid, sig) => {
                let fresh = !tracer.processes.contains_key(&pid);
                tracer.register(pid);
                resume(pid, forwarded_signal(fresh, sig));
            }
            _ => {}
        }
    }

    tracer.reporter.finish(exit_code);
    Ok(exit_code)
}
