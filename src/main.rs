#[macro_use]
extern crate log;

use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};
use clap::Parser;

use memsim::cli::Args;
use memsim::command::{Command, Order};
use memsim::simulator::Simulator;
use memsim::{dump, loader, parser};

pub fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(memsim::cli::log_level(args.verbose, args.quiet))
        .parse_default_env()
        .init();

    let mem = loader::load(&args.mem_description)
        .with_context(|| format!("loading memory description {:?}", args.mem_description))?;
    info!(
        "loaded {} bytes of simulated physical memory from {:?}",
        mem.len(),
        args.mem_description
    );

    let script = File::open(&args.commands)
        .with_context(|| format!("opening command script {:?}", args.commands))?;
    let program = parser::parse_program(BufReader::new(script))
        .with_context(|| format!("parsing command script {:?}", args.commands))?;
    info!(
        "parsed {} commands from {:?}",
        program.commands.len(),
        args.commands
    );

    let mut sim = Simulator::new(mem, args.tlb_mode.to_tlb_mode());

    for (index, cmd) in program.commands.iter().enumerate() {
        match sim.execute(*cmd) {
            Ok(outcome) => {
                debug!(
                    "#{index}: {} -> {} (tlb {:?}, L1 {:?}, L2 {:?}){}",
                    describe_command(cmd),
                    dump::format_paddr(outcome.paddr),
                    outcome.tlb,
                    outcome.cache_l1,
                    outcome.cache_l2,
                    outcome
                        .read_value
                        .map(|v| format!(" = {v:#x}"))
                        .unwrap_or_default(),
                );
            }
            Err(err) => {
                error!(
                    "{} on command #{index} ({}): {err}",
                    err.code(),
                    describe_command(cmd)
                );
                if let Some(dump_path) = &args.dump_on_halt {
                    let mut out = File::create(dump_path)
                        .with_context(|| format!("creating dump file {dump_path:?}"))?;
                    dump::dump_all(&sim, &mut out)
                        .with_context(|| format!("writing dump file {dump_path:?}"))?;
                    info!("wrote halt-time dump to {dump_path:?}");
                }
                anyhow::bail!("{}: {err}", err.code());
            }
        }
    }

    info!("ran {} commands to completion", program.commands.len());
    Ok(())
}

fn describe_command(cmd: &Command) -> String {
    let order = match cmd.order {
        Order::Read => "R",
        Order::Write => "W",
    };
    format!("{order} {}", cmd.vaddr)
}
