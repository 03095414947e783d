//! `bxc run` — run a command inside a new container.

use std::path::PathBuf;

use clap::Args;

use boxcell_common::config::BoxcellConfig;
use boxcell_common::types::{CgroupLimits, ContainerId, ContainerSpec, IsolationLevel};

/// Arguments for the `run` command.
///
/// Options left unset fall back to the [`BoxcellConfig`] in force.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Image name, resolved to `<image-dir>/<name>.tar`.
    #[arg(short = 'i', long, default_value = "ubuntu")]
    pub image_name: String,

    /// Directory holding image archives.
    #[arg(long)]
    pub image_dir: Option<PathBuf>,

    /// Base directory for per-container state.
    #[arg(long)]
    pub container_dir: Option<PathBuf>,

    /// CPU shares (relative weight); zero or unset leaves the kernel default.
    #[arg(long)]
    pub cpu_shares: Option<u64>,

    /// Memory limit in bytes.
    #[arg(long)]
    pub memory: Option<u64>,

    /// Memory plus swap limit in bytes.
    #[arg(long)]
    pub memory_swap: Option<u64>,

    /// UID (format: `<uid>[:<gid>]`). Recorded but not applied.
    #[arg(long)]
    pub user: Option<String>,

    /// Isolation strength: full, mount, or chroot.
    #[arg(long)]
    pub isolation: Option<IsolationLevel>,

    /// Command to run inside the container, with its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Resolves `args` against `config` into a complete container spec.
/// Explicit flags win; unset options take the configured values.
fn build_spec(args: RunArgs, id: ContainerId, config: &BoxcellConfig) -> ContainerSpec {
    ContainerSpec {
        id,
        command: args.command,
        image_name: args.image_name,
        image_dir: args.image_dir.unwrap_or_else(|| config.image_dir.clone()),
        container_dir: args
            .container_dir
            .unwrap_or_else(|| config.container_dir.clone()),
        limits: CgroupLimits {
            cpu_shares: args.cpu_shares.or(config.default_limits.cpu_shares),
            memory_bytes: args.memory.or(config.default_limits.memory_bytes),
            memory_swap_bytes: args
                .memory_swap
                .or(config.default_limits.memory_swap_bytes),
        },
        isolation: args.isolation.unwrap_or(config.isolation),
        user: args.user,
    }
}

/// Executes the `run` command and returns the child's exit status.
///
/// # Errors
///
/// Returns an error if the container child cannot be spawned or awaited.
/// Setup failures inside the child surface as the distinguished
/// setup-failure exit status instead.
#[allow(clippy::print_stdout)]
pub fn execute(args: RunArgs) -> anyhow::Result<i32> {
    let id = ContainerId::generate();
    let spec = build_spec(args, id.clone(), &BoxcellConfig::default());

    tracing::info!(container = %id, isolation = %spec.isolation, "starting container");
    let report = boxcell_runtime::run(&spec)?;

    println!("{} exited with status {}", report.pid, report.status);
    Ok(report.status)
}
