use anyhow::{Context, Error};
use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::cli::OutputFormat;

/// Virtualization technology a host was classified as.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VirtualType {
    /// OpenVZ, host node or container could not be told apart.
    OpenVz,

    /// OpenVZ host node.
    OpenVzHn,

    /// OpenVZ virtual environment.
    OpenVzVe,

    /// Solaris non-global zone.
    Zone,

    /// Linux-VServer guest.
    VServer,

    /// Linux-VServer host.
    #[strum(serialize = "vserver_host")]
    #[serde(rename = "vserver_host")]
    VServerHost,

    Xen,
    Kvm,
    Jail,
    Hpvm,
    VirtualBox,

    /// No virtualization detected.
    Physical,
}

impl VirtualType {
    /// Whether the host is a guest. Host nodes of container technologies are
    /// not virtual.
    pub fn is_virtual(&self) -> bool {
        !matches!(
            self,
            VirtualType::Physical | VirtualType::OpenVzHn | VirtualType::VServerHost
        )
    }
}

/// Facts published about the virtualization of a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VirtualFacts {
    #[serde(rename = "virtual")]
    pub virtual_type: VirtualType,
    pub is_virtual: bool,
}

impl From<VirtualType> for VirtualFacts {
    fn from(virtual_type: VirtualType) -> Self {
        Self {
            virtual_type,
            is_virtual: virtual_type.is_virtual(),
        }
    }
}

impl VirtualFacts {
    /// Renders the facts in the requested format.
    pub fn render(&self, format: OutputFormat) -> Result<String, Error> {
        Ok(match format {
            OutputFormat::Text => format!(
                "virtual => {}\nis_virtual => {}",
                self.virtual_type, self.is_virtual
            ),
            OutputFormat::Json => {
                serde_json::to_string_pretty(self).context("Failed to serialize facts as JSON")?
            }
            OutputFormat::Yaml => serde_yaml::to_string(self)
                .context("Failed to serialize facts as YAML")?
                .trim_end()
                .to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr;

    use strum::IntoEnumIterator;

    #[test]
    fn test_labels() {
        let labels = VirtualType::iter()
            .map(|ty| ty.to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            labels,
            [
                "openvz",
                "openvzhn",
                "openvzve",
                "zone",
                "vserver",
                "vserver_host",
                "xen",
                "kvm",
                "jail",
                "hpvm",
                "virtualbox",
                "physical"
            ]
        );

        for ty in VirtualType::iter() {
            let label: &'static str = ty.into();
            assert_eq!(VirtualType::from_str(label).unwrap(), ty);
            assert_eq!(
                serde_json::to_string(&ty).unwrap(),
                format!("\"{ty}\"")
            );
        }
    }

    #[test]
    fn test_is_virtual() {
        let not_virtual = [
            VirtualType::Physical,
            VirtualType::OpenVzHn,
            VirtualType::VServerHost,
        ];
        for ty in VirtualType::iter() {
            assert_eq!(ty.is_virtual(), !not_virtual.contains(&ty), "{ty}");
        }
    }

    #[test]
    fn test_render() {
        let facts = VirtualFacts::from(VirtualType::OpenVzVe);
        assert!(facts.is_virtual);

        assert_eq!(
            facts.render(OutputFormat::Text).unwrap(),
            "virtual => openvzve\nis_virtual => true"
        );
        assert_eq!(
            facts.render(OutputFormat::Json).unwrap(),
            indoc::indoc! {r#"
                {
                  "virtual": "openvzve",
                  "is_virtual": true
                }"#}
        );
        assert_eq!(
            VirtualFacts::from(VirtualType::VServerHost)
                .render(OutputFormat::Yaml)
                .unwrap(),
            "virtual: vserver_host\nis_virtual: false"
        );
    }
}
