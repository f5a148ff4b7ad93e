//! Command-line surface. A single `clap`-derived `Args`, built with
//! `#[derive(Parser)]`, is the entire configuration model -- there is no
//! configuration file.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Simulates a CPU memory hierarchy over a stream of virtual-address
/// memory operations.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the memory-description file used to populate simulated
    /// physical memory.
    pub mem_description: PathBuf,

    /// Path to the command-script file of `R`/`W` memory operations to
    /// execute, one per line.
    pub commands: PathBuf,

    /// Which TLB organization backs address translation.
    #[arg(long, value_enum, default_value = "hierarchical")]
    pub tlb_mode: TlbModeArg,

    /// When a command halts the run on error, additionally write a full
    /// TLB/cache dump to this path.
    #[arg(long)]
    pub dump_on_halt: Option<PathBuf>,

    /// Increase logging verbosity; repeatable (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease logging verbosity; repeatable.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

/// Which TLB organization the simulator should use.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum, Debug, Default)]
#[clap(rename_all = "kebab-case")]
pub enum TlbModeArg {
    /// The direct-mapped split-L1/unified-L2 hierarchy.
    #[default]
    Hierarchical,
    /// The single fully-associative reference-mode TLB.
    FullyAssociative,
}

impl TlbModeArg {
    pub fn to_tlb_mode(self) -> crate::simulator::TlbMode {
        match self {
            TlbModeArg::Hierarchical => crate::simulator::TlbMode::hierarchical(),
            TlbModeArg::FullyAssociative => crate::simulator::TlbMode::fully_associative(),
        }
    }
}

/// Net verbosity as a `log` filter level, from `-q`/`-v` counts. The
/// default (no flags) is `Info`; each `-q` steps down, each `-v` steps up.
pub fn log_level(verbose: u8, quiet: u8) -> log::LevelFilter {
    use log::LevelFilter::*;
    const LEVELS: [log::LevelFilter; 6] = [Off, Error, Warn, Info, Debug, Trace];
    let base = 3i32; // index of Info
    let idx = (base + verbose as i32 - quiet as i32).clamp(0, LEVELS.len() as i32 - 1);
    LEVELS[idx as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_verbosity_is_info() {
        assert_eq!(log_level(0, 0), log::LevelFilter::Info);
    }

    #[test]
    fn verbose_flags_step_up_and_quiet_flags_step_down() {
        assert_eq!(log_level(1, 0), log::LevelFilter::Debug);
        assert_eq!(log_level(2, 0), log::LevelFilter::Trace);
        assert_eq!(log_level(0, 1), log::LevelFilter::Warn);
        assert_eq!(log_level(0, 3), log::LevelFilter::Off);
    }

    #[test]
    fn verbosity_clamps_at_the_extremes() {
        assert_eq!(log_level(10, 0), log::LevelFilter::Trace);
        assert_eq!(log_level(0, 10), log::LevelFilter::Off);
    }
}
