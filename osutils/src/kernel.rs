use std::{fmt, process::Command, str::FromStr};

use strum_macros::EnumString;

use crate::{evidence::EvidenceError, exe::RunAndCheck};

/// Kernel name as reported by `uname -s`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
pub enum Kernel {
    Linux,
    FreeBSD,
    OpenBSD,
    #[strum(serialize = "GNU/kFreeBSD")]
    GnuKFreeBSD,
    #[strum(serialize = "HP-UX")]
    HpUx,
    SunOS,
    #[strum(default)]
    Other(String),
}

impl Kernel {
    /// Grabs the kernel name of the running system using `uname -s`.
    pub fn current() -> Result<Self, EvidenceError> {
        Ok(Self::parse(
            &Command::new("uname").arg("-s").output_and_check()?,
        ))
    }

    /// Parses a kernel name. Names that are not recognized are kept as
    /// [`Kernel::Other`].
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        Self::from_str(name).unwrap_or_else(|_| Self::Other(name.into()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Linux => "Linux",
            Self::FreeBSD => "FreeBSD",
            Self::OpenBSD => "OpenBSD",
            Self::GnuKFreeBSD => "GNU/kFreeBSD",
            Self::HpUx => "HP-UX",
            Self::SunOS => "SunOS",
            Self::Other(name) => name,
        }
    }

    /// Path to the sysctl binary on this kernel.
    pub fn sysctl_path(&self) -> &'static str {
        match self {
            Self::GnuKFreeBSD => "/bin/sysctl",
            _ => "/sbin/sysctl",
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
