use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use qknot_model::{ClosureMethod, RuntimeChannel, RuntimeSelection};

#[derive(Parser, Debug)]
#[command(
    name = "qknotctl",
    version,
    about = "Submit braid-word knot experiments and follow them to completion"
)]
pub struct Cli {
    /// TOML or JSON config file (overrides QKNOT_CONFIG_PATH)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Env file loaded before QKNOT_* variables are read
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a braid word offline and print its analysis
    Validate {
        /// Space-separated generators, e.g. "s1 s2^-1 s1 s2^-1"
        braid: String,
    },
    /// Submit a job and wait for its result (Ctrl-C cancels the job)
    Submit(SubmitArgs),
    /// Resume polling the pending job from an earlier run (Ctrl-C cancels)
    Resume,
    /// Show the pending job snapshot, if any
    Status,
    /// Forget the pending job without contacting the backend
    Discard,
    /// List execution targets available to the runtime
    Backends {
        #[command(flatten)]
        runtime: RuntimeArgs,
        /// Only show operational targets with at least this many qubits
        #[arg(long)]
        min_qubits: Option<u32>,
    },
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Target device, or `least_busy`
    #[arg(long)]
    pub backend: String,
    #[arg(long)]
    pub braid: String,
    #[arg(long, default_value_t = 1024)]
    pub shots: u32,
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub optimization_level: u8,
    #[arg(long, value_enum, default_value_t = ClosureArg::Trace)]
    pub closure: ClosureArg,
    #[command(flatten)]
    pub runtime: RuntimeArgs,
    /// Circuit signature from an earlier generation step; the job is
    /// abandoned if the service reports a different one
    #[arg(long)]
    pub expected_signature: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct RuntimeArgs {
    /// Runtime channel (`auto` lets the service pick)
    #[arg(long)]
    pub channel: Option<String>,
    /// Runtime instance (CRN or hub/group/project)
    #[arg(long)]
    pub instance: Option<String>,
}

impl RuntimeArgs {
    pub fn selection(&self) -> RuntimeSelection {
        RuntimeSelection::new(
            RuntimeChannel::parse(self.channel.as_deref().unwrap_or_default()),
            self.instance.clone(),
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ClosureArg {
    Trace,
    Plat,
}

impl From<ClosureArg> for ClosureMethod {
    fn from(arg: ClosureArg) -> Self {
        match arg {
            ClosureArg::Trace => ClosureMethod::Trace,
            ClosureArg::Plat => ClosureMethod::Plat,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn submit_defaults_apply() {
        let cli = Cli::parse_from([
            "qknotctl", "submit", "--backend", "ibm_kyiv", "--braid", "s1 s2 s1",
        ]);
        let Command::Submit(args) = cli.command else {
            panic!("expected submit");
        };
        assert_eq!(args.shots, 1024);
        assert_eq!(args.optimization_level, 2);
        assert_eq!(args.closure, ClosureArg::Trace);
        assert_eq!(args.runtime.selection(), RuntimeSelection::default());
    }

    #[test]
    fn optimization_level_is_bounded() {
        let parsed = Cli::try_parse_from([
            "qknotctl",
            "submit",
            "--backend",
            "ibm_kyiv",
            "--braid",
            "s1 s2 s1",
            "--optimization-level",
            "4",
        ]);
        assert!(parsed.is_err());
    }
}
