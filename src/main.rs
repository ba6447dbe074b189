use std::process::ExitCode;

use anyhow::{Context, Error};
use clap::Parser;
use log::{error, info, warn};

use osutils::{
    evidence::{EvidenceSource, HostEvidence},
    kernel::Kernel,
};
use virtfact::{
    cli::{self, Cli, Commands},
    Virtual, VIRTFACT_VERSION,
};

fn resolve_kernel(args: &Cli) -> Kernel {
    if let Some(name) = &args.kernel {
        return Kernel::parse(name);
    }

    // Probes that depend on the kernel just come up negative
    Kernel::current().unwrap_or_else(|e| {
        warn!("Failed to determine the kernel name: {e}");
        Kernel::Other(String::new())
    })
}

fn run<E: EvidenceSource>(virt: &Virtual<E>, command: &Commands) -> Result<(), Error> {
    match command {
        Commands::Facts { format } => {
            println!("{}", virt.facts().render(*format)?);
        }
        Commands::Probe { technology } => {
            let technology = cli::to_technology(*technology);
            let detected = virt.detect(technology);
            println!("{technology} => {detected}");
            if let Some(subtype) = detected.then(|| virt.subtype(technology)).flatten() {
                println!("{technology}_type => {subtype}");
            }
        }
    }
    Ok(())
}

fn setup_logging(args: &Cli) -> Result<(), Error> {
    env_logger::builder()
        .format_timestamp(None)
        .filter_level(args.verbosity)
        .try_init()
        .context("Logger already registered")
}

fn main() -> ExitCode {
    // Parse args
    let args = Cli::parse();

    if let Err(e) = setup_logging(&args) {
        eprintln!("Failed to initialize logging: {e:?}");
        return ExitCode::from(1);
    }

    info!("virtfact version: {VIRTFACT_VERSION}");

    let kernel = resolve_kernel(&args);
    info!("Kernel: '{kernel}'");

    let evidence = match &args.root {
        Some(root) => HostEvidence::with_root(root),
        None => HostEvidence::new(),
    };

    if let Err(e) = run(&Virtual::new(evidence, kernel), &args.command) {
        error!("virtfact failed: {e:?}");
        return ExitCode::from(2);
    }
    ExitCode::SUCCESS
}
