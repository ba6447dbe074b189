//! Detection of the virtualization technology a host is running under.
//!
//! Every probe is an independent, read-only check against an
//! [`EvidenceSource`]. A probe that cannot gather its evidence (missing file,
//! failing command, unexpected content) reports "not detected" instead of
//! failing.

use std::path::Path;

use log::debug;
use osutils::{
    evidence::{EvidenceError, EvidenceSource},
    kernel::Kernel,
};
use strum_macros::{Display, EnumIter};

use crate::facts::{VirtualFacts, VirtualType};

/// Present on CloudLinux LVE hosts, which also expose /proc/vz.
const LVE_LIST_PATH: &str = "/proc/lve/list";
const VZ_PATH: &str = "/proc/vz";
const VZ_GLOB: &str = "/proc/vz/*";
const SELF_STATUS_PATH: &str = "/proc/self/status";
const VSERVER_HOST_PATH: &str = "/proc/virtual";
const CPUINFO_PATH: &str = "/proc/cpuinfo";
const DMI_PRODUCT_NAME_PATH: &str = "/sys/devices/virtual/dmi/id/product_name";

/// Checked in this order; the first one found wins.
const XEN_PATHS: [&str; 3] = ["/proc/sys/xen", "/sys/bus/xen", "/proc/xen"];

const ZONENAME_PATH: &str = "/sbin/zonename";
const GETCONF_PATH: &str = "/usr/bin/getconf";

const GLOBAL_ZONE: &str = "global";
const QEMU_CPU_MODEL: &str = "QEMU Virtual CPU";
const HPVM_MACHINE_MODEL: &str = "Virtual Machine";
const VIRTUALBOX_PRODUCT_NAME: &str = "VirtualBox";

/// A virtualization technology that has its own probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Technology {
    OpenVz,
    Zone,
    VServer,
    Xen,
    Kvm,
    Jail,
    Hpvm,
    VirtualBox,
}

/// Classifies a host by running virtualization probes against its evidence.
pub struct Virtual<E> {
    evidence: E,
    kernel: Kernel,
}

impl<E: EvidenceSource> Virtual<E> {
    /// `kernel` selects the OS-specific commands some probes run.
    pub fn new(evidence: E, kernel: Kernel) -> Self {
        Self { evidence, kernel }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Resolves the virtualization type of the host. Probes run in priority
    /// order and stop at the first match.
    pub fn virtual_type(&self) -> VirtualType {
        let virtual_type = self.detect_virtual_type();
        debug!("Resolved virtualization type '{virtual_type}'");
        virtual_type
    }

    /// Resolves the published facts for the host.
    pub fn facts(&self) -> VirtualFacts {
        self.virtual_type().into()
    }

    fn detect_virtual_type(&self) -> VirtualType {
        if self.openvz() {
            return self.openvz_subtype().unwrap_or(VirtualType::OpenVz);
        }

        if self.zone() {
            return VirtualType::Zone;
        }

        if self.vserver() {
            return self.vserver_subtype();
        }

        let probes: [(fn(&Self) -> bool, VirtualType); 5] = [
            (Self::xen, VirtualType::Xen),
            (Self::kvm, VirtualType::Kvm),
            (Self::jail, VirtualType::Jail),
            (Self::hpvm, VirtualType::Hpvm),
            (Self::virtualbox, VirtualType::VirtualBox),
        ];

        probes
            .into_iter()
            .find(|(probe, _)| probe(self))
            .map(|(_, virtual_type)| virtual_type)
            .unwrap_or(VirtualType::Physical)
    }

    /// Runs the probe for a single technology.
    pub fn detect(&self, technology: Technology) -> bool {
        match technology {
            Technology::OpenVz => self.openvz(),
            Technology::Zone => self.zone(),
            Technology::VServer => self.vserver(),
            Technology::Xen => self.xen(),
            Technology::Kvm => self.kvm(),
            Technology::Jail => self.jail(),
            Technology::Hpvm => self.hpvm(),
            Technology::VirtualBox => self.virtualbox(),
        }
    }

    /// Returns the sub-type of a technology, if it has sub-types and was
    /// detected.
    pub fn subtype(&self, technology: Technology) -> Option<VirtualType> {
        match technology {
            Technology::OpenVz => self.openvz_type(),
            Technology::VServer => self.vserver_type(),
            _ => None,
        }
    }

    /// OpenVZ exposes a populated /proc/vz. CloudLinux LVE hosts do too, so
    /// they are excluded first.
    pub fn openvz(&self) -> bool {
        !self.evidence.is_file(Path::new(LVE_LIST_PATH))
            && self.evidence.is_dir(Path::new(VZ_PATH))
            && self
                .check(self.evidence.glob(VZ_GLOB))
                .is_some_and(|entries| !entries.is_empty())
    }

    /// Tells an OpenVZ host node from a container using the envID of the
    /// current process. `None` when not on OpenVZ or when no envID is found.
    pub fn openvz_type(&self) -> Option<VirtualType> {
        if !self.openvz() {
            return None;
        }
        self.openvz_subtype()
    }

    fn openvz_subtype(&self) -> Option<VirtualType> {
        let status_path = Path::new(SELF_STATUS_PATH);
        if !self.evidence.exists(status_path) {
            return None;
        }

        let status = self.check(self.evidence.read_to_string(status_path))?;
        let env_id = status.lines().find_map(parse_env_id)?;

        Some(if env_id == "0" {
            VirtualType::OpenVzHn
        } else {
            VirtualType::OpenVzVe
        })
    }

    /// Solaris zones: anything other than the global zone.
    pub fn zone(&self) -> bool {
        self.check(self.evidence.exec(ZONENAME_PATH, &[]))
            .is_some_and(|output| {
                let zone = output.trim();
                !zone.is_empty() && zone != GLOBAL_ZONE
            })
    }

    /// Linux-VServer adds a context ID to the status of every process: `VxID`
    /// since 2.3, `s_context` before that.
    pub fn vserver(&self) -> bool {
        let status_path = Path::new(SELF_STATUS_PATH);
        if !self.evidence.exists(status_path) {
            return false;
        }

        self.check(self.evidence.read_to_string(status_path))
            .is_some_and(|status| status.contains("VxID:") || status.contains("s_context:"))
    }

    /// `vserver_host` when /proc/virtual exists, `None` when not on VServer.
    pub fn vserver_type(&self) -> Option<VirtualType> {
        self.vserver().then(|| self.vserver_subtype())
    }

    fn vserver_subtype(&self) -> VirtualType {
        if self.evidence.exists(Path::new(VSERVER_HOST_PATH)) {
            VirtualType::VServerHost
        } else {
            VirtualType::VServer
        }
    }

    /// Xen exposes one of a few paths in /proc or /sys; the first one found wins.
    pub fn xen(&self) -> bool {
        XEN_PATHS
            .iter()
            .any(|path| self.evidence.exists(Path::new(path)))
    }

    /// KVM guests report a QEMU CPU model, through /proc/cpuinfo where it
    /// exists and through `hw.model` on the BSDs.
    pub fn kvm(&self) -> bool {
        let cpuinfo_path = Path::new(CPUINFO_PATH);
        if self.evidence.exists(cpuinfo_path) {
            return self
                .check(self.evidence.read_to_string(cpuinfo_path))
                .is_some_and(|cpuinfo| cpuinfo.contains(QEMU_CPU_MODEL));
        }

        match self.kernel {
            Kernel::FreeBSD | Kernel::OpenBSD => self
                .check(
                    self.evidence
                        .exec(self.kernel.sysctl_path(), &["-n", "hw.model"]),
                )
                .is_some_and(|model| model.contains(QEMU_CPU_MODEL)),
            _ => false,
        }
    }

    /// FreeBSD jails, via the `security.jail.jailed` sysctl.
    pub fn jail(&self) -> bool {
        if !matches!(self.kernel, Kernel::FreeBSD | Kernel::GnuKFreeBSD) {
            return false;
        }

        self.check(
            self.evidence
                .exec(self.kernel.sysctl_path(), &["-n", "security.jail.jailed"]),
        )
        .is_some_and(|jailed| jailed.trim() == "1")
    }

    /// HP-UX Integrity Virtual Machines report themselves in the machine model.
    pub fn hpvm(&self) -> bool {
        if self.kernel != Kernel::HpUx {
            return false;
        }

        self.check(self.evidence.exec(GETCONF_PATH, &["MACHINE_MODEL"]))
            .is_some_and(|model| model.contains(HPVM_MACHINE_MODEL))
    }

    /// VirtualBox sets the DMI product name to exactly `VirtualBox`.
    pub fn virtualbox(&self) -> bool {
        self.check(
            self.evidence
                .read_to_string(Path::new(DMI_PRODUCT_NAME_PATH)),
        )
        .is_some_and(|product| product.trim() == VIRTUALBOX_PRODUCT_NAME)
    }

    /// Missing evidence is not an error for a probe; log it and move on.
    fn check<T>(&self, result: Result<T, EvidenceError>) -> Option<T> {
        result
            .map_err(|e| debug!("Ignoring unavailable evidence: {e}"))
            .ok()
    }
}

/// Extracts the digits of an `envID:` line of a process status, e.g. `envID:\t101`.
/// The separator must be whitespace and the value plain ASCII digits.
fn parse_env_id(line: &str) -> Option<&str> {
    let rest = line.trim_end().strip_prefix("envID:")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let digits = rest.trim_start();
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(digits)
}
