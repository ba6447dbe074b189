use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::{virt::Technology, VIRTFACT_VERSION};

#[derive(Parser, Debug)]
#[clap(version = VIRTFACT_VERSION)]
pub struct Cli {
    /// Logging verbosity [OFF, ERROR, WARN, INFO, DEBUG, TRACE]
    #[arg(global = true, short, long, default_value_t = LevelFilter::Warn)]
    pub verbosity: LevelFilter,

    /// Kernel name to assume instead of asking `uname -s`, e.g. FreeBSD or HP-UX
    #[arg(global = true, long)]
    pub kernel: Option<String>,

    /// Inspect the host filesystem mounted at this directory instead of /
    #[arg(global = true, long)]
    pub root: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// The technologies that can be probed individually
#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProbeTarget {
    Openvz,
    Zone,
    Vserver,
    Xen,
    Kvm,
    Jail,
    Hpvm,
    Virtualbox,
}

pub fn to_technology(target: ProbeTarget) -> Technology {
    match target {
        ProbeTarget::Openvz => Technology::OpenVz,
        ProbeTarget::Zone => Technology::Zone,
        ProbeTarget::Vserver => Technology::VServer,
        ProbeTarget::Xen => Technology::Xen,
        ProbeTarget::Kvm => Technology::Kvm,
        ProbeTarget::Jail => Technology::Jail,
        ProbeTarget::Hpvm => Technology::Hpvm,
        ProbeTarget::Virtualbox => Technology::VirtualBox,
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the `virtual` and `is_virtual` facts
    Facts {
        /// Output format
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Run the detection for a single technology
    Probe {
        #[clap(index = 1, value_enum)]
        technology: ProbeTarget,
    },
}
