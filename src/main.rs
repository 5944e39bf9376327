use anyhow::Result;
use clap::Parser;
use renacer_drm::{cli::Cli, filter, tracer};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Execute the tracer based on PID or command arguments
fn run_tracer(
    pid: Option<i32>,
    command: Option<Vec<String>>,
    config: tracer::TracerConfig,
) -> Result<i32> {
    match (pid, command) {
        (Some(pid), None) => tracer::attach_to_pid(pid, config),
        (None, Some(command)) => tracer::trace_command(&command, config),
        (Some(_), Some(_)) => {
            anyhow::bail!("Cannot specify both -p PID and command. Choose one.");
        }
        (None, None) => {
            anyhow::bail!("Must specify either -p PID or command. Usage: renacer-drm -p PID or renacer-drm -- COMMAND [ARGS...]");
        }
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let filter = if let Some(expr) = &args.filter {
        filter::IoctlFilter::from_expr(expr)?
    } else {
        filter::IoctlFilter::all()
    };

    let config = tracer::TracerConfig {
        decode: args.decode_config()?,
        filter,
        statistics_mode: args.statistics,
        timing_mode: args.timing,
        output_format: args.format,
        follow_forks: args.follow_forks,
    };

    let exit_code = run_tracer(args.pid, args.command, config)?;

    // Exit with traced program's exit code
    std::process::exit(exit_code);
}
