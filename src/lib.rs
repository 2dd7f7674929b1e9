use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::io::{self, Write};
use tracing::debug;

// Architecture sets per target family
const AWS_ARCHES: &[Arch] = &[Arch::Amd64, Arch::Arm64];
const CLOUD_ARCHES: &[Arch] = &[Arch::Amd64];
const ALL_ARCHES: &[Arch] = &[
    Arch::Amd64,
    Arch::Arm64,
    Arch::Ppc64el,
    Arch::S390x,
    Arch::Armhf,
    Arch::I386,
];

pub const DEFAULT_KERNEL: &str = "generic";

/// Command keys selecting each target. The parser names its subcommands
/// from these, so they are the only place a key is spelled out.
pub mod keys {
    pub const AWS: &str = "aws";
    pub const AWS_CHINA: &str = "aws-cn";
    pub const AWS_GOVCLOUD: &str = "aws-govcloud";
    pub const AZURE: &str = "azure";
    pub const GCE: &str = "gce";
    pub const KVM: &str = "kvm";
    pub const LXC: &str = "lxc";
    pub const MAAS_V2: &str = "maasv2";
    pub const MAAS_V3: &str = "maas";
}

// Supported clouds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Aws,
    AwsChina,
    AwsGovCloud,
    Azure,
    Gce,
    Kvm,
    Lxc,
    MaasV2,
    MaasV3,
}

impl Target {
    pub const ALL: [Target; 9] = [
        Target::Aws,
        Target::AwsChina,
        Target::AwsGovCloud,
        Target::Azure,
        Target::Gce,
        Target::Kvm,
        Target::Lxc,
        Target::MaasV2,
        Target::MaasV3,
    ];

    /// Command-line key selecting this target
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Target::Aws => keys::AWS,
            Target::AwsChina => keys::AWS_CHINA,
            Target::AwsGovCloud => keys::AWS_GOVCLOUD,
            Target::Azure => keys::AZURE,
            Target::Gce => keys::GCE,
            Target::Kvm => keys::KVM,
            Target::Lxc => keys::LXC,
            Target::MaasV2 => keys::MAAS_V2,
            Target::MaasV3 => keys::MAAS_V3,
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Target::Aws => "Amazon Web Services",
            Target::AwsChina => "Amazon Web Services China",
            Target::AwsGovCloud => "Amazon Web Services GovCloud",
            Target::Azure => "Microsoft Azure",
            Target::Gce => "Google Compute Engine",
            Target::Kvm => "Kernel-based Virtual Machine",
            Target::Lxc => "Linux Containers",
            Target::MaasV2 => "Metal as a Service (MAAS) Version 2",
            Target::MaasV3 => "Metal as a Service (MAAS) Version 3",
        }
    }

    #[must_use]
    pub fn requires_region(self) -> bool {
        matches!(
            self,
            Target::Aws | Target::AwsChina | Target::AwsGovCloud | Target::Azure | Target::Gce
        )
    }

    #[must_use]
    pub fn supports_daily(self) -> bool {
        matches!(
            self,
            Target::Aws | Target::Azure | Target::Gce | Target::Kvm | Target::Lxc | Target::MaasV2
        )
    }

    #[must_use]
    pub fn supports_minimal(self) -> bool {
        matches!(self, Target::Aws | Target::Gce | Target::Kvm | Target::Lxc)
    }

    #[must_use]
    pub fn supports_root_store(self) -> bool {
        matches!(self, Target::Aws | Target::AwsChina | Target::AwsGovCloud)
    }

    #[must_use]
    pub fn supports_kernel(self) -> bool {
        matches!(self, Target::MaasV2 | Target::MaasV3)
    }

    // Architectures published for this target
    #[must_use]
    pub fn arches(self) -> &'static [Arch] {
        match self {
            Target::Aws | Target::AwsChina | Target::AwsGovCloud => AWS_ARCHES,
            Target::Azure | Target::Gce => CLOUD_ARCHES,
            Target::Kvm | Target::Lxc | Target::MaasV2 | Target::MaasV3 => ALL_ARCHES,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// Serialized by its command key
impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    #[default]
    Amd64,
    Arm64,
    Ppc64el,
    S390x,
    Armhf,
    I386,
}

impl Arch {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
            Arch::Ppc64el => "ppc64el",
            Arch::S390x => "s390x",
            Arch::Armhf => "armhf",
            Arch::I386 => "i386",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Storage backing the root volume of an AWS image
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RootStore {
    #[default]
    Ssd,
    Instance,
}

impl fmt::Display for RootStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootStore::Ssd => f.write_str("ssd"),
            RootStore::Instance => f.write_str("instance"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    #[default]
    Released,
    Daily,
}

impl Stream {
    #[must_use]
    pub fn from_daily(daily: bool) -> Self {
        if daily {
            Stream::Daily
        } else {
            Stream::Released
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Released => f.write_str("released"),
            Stream::Daily => f.write_str("daily"),
        }
    }
}

// Options a handler is built from; the command name is not part of them
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SearchOptions {
    pub release: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub arch: Arch,
    #[serde(default)]
    pub stream: Stream,
    #[serde(default)]
    pub minimal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_store: Option<RootStore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel: Option<String>,
}

/// A per-target image search handler.
pub trait Search: fmt::Debug {
    fn target(&self) -> Target;

    /// Run the search and write its results to standard output.
    ///
    /// # Errors
    ///
    /// Returns an error if the results cannot be written.
    fn search(&self) -> Result<()>;
}

// Handler for a single target, holding validated options
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ImageSearch {
    target: Target,
    #[serde(flatten)]
    options: SearchOptions,
}

impl ImageSearch {
    /// Build a handler for `target`, filling target defaults and validating
    /// the options against what the target publishes.
    ///
    /// # Errors
    ///
    /// Returns an error if an option is empty, missing, or not supported by the target.
    pub fn new(target: Target, mut options: SearchOptions) -> Result<Self> {
        if target.supports_root_store() && options.root_store.is_none() {
            options.root_store = Some(RootStore::default());
        }
        if target.supports_kernel() && options.kernel.is_none() {
            options.kernel = Some(DEFAULT_KERNEL.to_string());
        }

        validate_options(target, &options)?;

        // Stored values match what was validated
        options.release = options.release.trim().to_lowercase();
        options.region = options.region.map(|region| region.trim().to_string());
        options.kernel = options.kernel.map(|kernel| kernel.trim().to_string());
        Ok(Self { target, options })
    }

    #[must_use]
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    // Single-line JSON rendering used for debug output
    #[must_use]
    pub fn describe(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }

    // Report lines in display order, skipping fields the target lacks
    #[must_use]
    pub fn report(&self) -> Vec<(&'static str, String)> {
        let options = &self.options;
        let mut lines = vec![
            (
                "target",
                format!("{} ({})", self.target, self.target.description()),
            ),
            ("release", options.release.clone()),
        ];

        if let Some(region) = &options.region {
            lines.push(("region", region.clone()));
        }
        lines.push(("arch", options.arch.to_string()));
        lines.push(("stream", options.stream.to_string()));
        if self.target.supports_minimal() {
            let minimal = if options.minimal { "yes" } else { "no" };
            lines.push(("minimal", minimal.to_string()));
        }
        if let Some(root_store) = options.root_store {
            lines.push(("root store", root_store.to_string()));
        }
        if let Some(kernel) = &options.kernel {
            lines.push(("kernel", kernel.clone()));
        }

        lines
    }

    /// Write the search report to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn write_report<W: Write>(&self, out: &mut W) -> Result<()> {
        let lines = self.report();

        // Align values on the longest label
        let width = lines.iter().map(|(key, _)| key.len()).max().unwrap_or(0) + 1;

        for (key, value) in lines {
            let label = format!("{key}:");
            writeln!(out, "{label:<width$} {value}")
                .with_context(|| format!("failed to write {key} to report"))?;
        }

        Ok(())
    }
}

impl Search for ImageSearch {
    fn target(&self) -> Target {
        self.target
    }

    fn search(&self) -> Result<()> {
        debug!("searching {} images for {}", self.target, self.options.release);

        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_report(&mut out)?;
        out.flush().context("failed to flush standard output")
    }
}

// Check options against the target's capabilities
fn validate_options(target: Target, options: &SearchOptions) -> Result<()> {
    if options.release.trim().is_empty() {
        bail!("release codename must not be empty");
    }

    match (&options.region, target.requires_region()) {
        (None, true) => bail!("{target} requires a region"),
        (Some(_), false) => bail!("{target} does not take a region"),
        (Some(region), true) if region.trim().is_empty() => bail!("region must not be empty"),
        _ => {}
    }

    if options.stream == Stream::Daily && !target.supports_daily() {
        bail!("{target} has no daily image stream");
    }

    if options.minimal && !target.supports_minimal() {
        bail!("{target} has no minimal images");
    }

    if !target.arches().contains(&options.arch) {
        bail!(
            "architecture {} is not available on {target} (choose from: {})",
            options.arch,
            target
                .arches()
                .iter()
                .map(|arch| arch.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    if options.root_store.is_some() && !target.supports_root_store() {
        bail!("{target} does not take a root store");
    }

    match &options.kernel {
        Some(_) if !target.supports_kernel() => bail!("{target} does not take a kernel flavor"),
        Some(kernel) if kernel.trim().is_empty() => bail!("kernel flavor must not be empty"),
        _ => {}
    }

    Ok(())
}
