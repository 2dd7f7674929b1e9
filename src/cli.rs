use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

use ubuntu_cloud_image::{keys, Arch, ImageSearch, RootStore, Search, SearchOptions, Stream, Target};

const RELEASE_HELP: &str = "Ubuntu release codename (e.g. Bionic)";

// CLI arguments parsing structure
#[derive(Parser, Debug)]
#[command(
    name = "ubuntu-cloud-image",
    author,
    version,
    about,
    long_about = None,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Additional debug output
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Amazon Web Services
    #[command(name = keys::AWS)]
    Aws(AwsArgs),
    /// Amazon Web Services China
    #[command(name = keys::AWS_CHINA)]
    AwsCn(AwsChinaArgs),
    /// Amazon Web Services GovCloud
    #[command(name = keys::AWS_GOVCLOUD)]
    AwsGovcloud(AwsGovCloudArgs),
    /// Microsoft Azure
    #[command(name = keys::AZURE)]
    Azure(AzureArgs),
    /// Google Compute Engine
    #[command(name = keys::GCE)]
    Gce(GceArgs),
    /// Kernel-based Virtual Machine
    #[command(name = keys::KVM)]
    Kvm(LocalArgs),
    /// Linux Containers
    #[command(name = keys::LXC)]
    Lxc(LocalArgs),
    /// Metal as a Service (MAAS) Version 2
    #[command(name = keys::MAAS_V2)]
    Maasv2(Maasv2Args),
    /// Metal as a Service (MAAS) Version 3
    #[command(name = keys::MAAS_V3)]
    Maas(MaasArgs),
}

// Architectures published on AWS
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwsArch {
    #[value(name = "amd64")]
    Amd64,
    #[value(name = "arm64")]
    Arm64,
}

// Architectures published on Azure and GCE
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudArch {
    #[value(name = "amd64")]
    Amd64,
}

// Architectures published for KVM, LXC and MAAS
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyArch {
    #[value(name = "amd64")]
    Amd64,
    #[value(name = "arm64")]
    Arm64,
    #[value(name = "ppc64el")]
    Ppc64el,
    #[value(name = "s390x")]
    S390x,
    #[value(name = "armhf")]
    Armhf,
    #[value(name = "i386")]
    I386,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootStoreArg {
    Ssd,
    Instance,
}

#[derive(Args, Debug, PartialEq)]
pub struct AwsArgs {
    #[arg(help = RELEASE_HELP)]
    pub release: String,
    /// Cloud region (e.g. us-west-2)
    pub region: String,
    /// Daily image
    #[arg(long)]
    pub daily: bool,
    /// Minimal image
    #[arg(long)]
    pub minimal: bool,
    /// Architecture
    #[arg(long, value_enum, default_value_t = AwsArch::Amd64)]
    pub arch: AwsArch,
    /// Image root store
    #[arg(long, value_enum, default_value_t = RootStoreArg::Ssd)]
    pub root_store: RootStoreArg,
}

#[derive(Args, Debug, PartialEq)]
pub struct AwsChinaArgs {
    #[arg(help = RELEASE_HELP)]
    pub release: String,
    /// Cloud region (e.g. cn-north-1)
    pub region: String,
    /// Architecture
    #[arg(long, value_enum, default_value_t = AwsArch::Amd64)]
    pub arch: AwsArch,
    /// Image root store
    #[arg(long, value_enum, default_value_t = RootStoreArg::Ssd)]
    pub root_store: RootStoreArg,
}

#[derive(Args, Debug, PartialEq)]
pub struct AwsGovCloudArgs {
    #[arg(help = RELEASE_HELP)]
    pub release: String,
    /// Cloud region (e.g. us-gov-west-1)
    pub region: String,
    /// Architecture
    #[arg(long, value_enum, default_value_t = AwsArch::Amd64)]
    pub arch: AwsArch,
    /// Image root store
    #[arg(long, value_enum, default_value_t = RootStoreArg::Ssd)]
    pub root_store: RootStoreArg,
}

#[derive(Args, Debug, PartialEq)]
pub struct AzureArgs {
    #[arg(help = RELEASE_HELP)]
    pub release: String,
    /// Cloud region (e.g. 'West US')
    pub region: String,
    /// Daily image
    #[arg(long)]
    pub daily: bool,
    /// Architecture
    #[arg(long, value_enum, default_value_t = CloudArch::Amd64)]
    pub arch: CloudArch,
}

#[derive(Args, Debug, PartialEq)]
pub struct GceArgs {
    #[arg(help = RELEASE_HELP)]
    pub release: String,
    /// Cloud region (e.g. us-west1)
    pub region: String,
    /// Daily image
    #[arg(long)]
    pub daily: bool,
    /// Minimal image
    #[arg(long)]
    pub minimal: bool,
    /// Architecture
    #[arg(long, value_enum, default_value_t = CloudArch::Amd64)]
    pub arch: CloudArch,
}

// Shared by KVM and LXC
#[derive(Args, Debug, PartialEq)]
pub struct LocalArgs {
    #[arg(help = RELEASE_HELP)]
    pub release: String,
    /// Daily image
    #[arg(long)]
    pub daily: bool,
    /// Minimal image
    #[arg(long)]
    pub minimal: bool,
    /// Architecture
    #[arg(long, value_enum, default_value_t = AnyArch::Amd64)]
    pub arch: AnyArch,
}

#[derive(Args, Debug, PartialEq)]
pub struct Maasv2Args {
    #[arg(help = RELEASE_HELP)]
    pub release: String,
    /// Daily image
    #[arg(long)]
    pub daily: bool,
    /// Architecture
    #[arg(long, value_enum, default_value_t = AnyArch::Amd64)]
    pub arch: AnyArch,
    /// Kernel flavor
    #[arg(long, default_value = ubuntu_cloud_image::DEFAULT_KERNEL)]
    pub kernel: String,
}

#[derive(Args, Debug, PartialEq)]
pub struct MaasArgs {
    #[arg(help = RELEASE_HELP)]
    pub release: String,
    /// Architecture
    #[arg(long, value_enum, default_value_t = AnyArch::Amd64)]
    pub arch: AnyArch,
    /// Kernel flavor
    #[arg(long, default_value = ubuntu_cloud_image::DEFAULT_KERNEL)]
    pub kernel: String,
}

impl From<AwsArch> for Arch {
    fn from(arch: AwsArch) -> Self {
        match arch {
            AwsArch::Amd64 => Arch::Amd64,
            AwsArch::Arm64 => Arch::Arm64,
        }
    }
}

impl From<CloudArch> for Arch {
    fn from(arch: CloudArch) -> Self {
        match arch {
            CloudArch::Amd64 => Arch::Amd64,
        }
    }
}

impl From<AnyArch> for Arch {
    fn from(arch: AnyArch) -> Self {
        match arch {
            AnyArch::Amd64 => Arch::Amd64,
            AnyArch::Arm64 => Arch::Arm64,
            AnyArch::Ppc64el => Arch::Ppc64el,
            AnyArch::S390x => Arch::S390x,
            AnyArch::Armhf => Arch::Armhf,
            AnyArch::I386 => Arch::I386,
        }
    }
}

impl From<RootStoreArg> for RootStore {
    fn from(root_store: RootStoreArg) -> Self {
        match root_store {
            RootStoreArg::Ssd => RootStore::Ssd,
            RootStoreArg::Instance => RootStore::Instance,
        }
    }
}

impl Commands {
    // Split the subcommand into its target and the options for the handler
    pub fn into_request(self) -> (Target, SearchOptions) {
        match self {
            Commands::Aws(args) => (
                Target::Aws,
                SearchOptions {
                    release: args.release,
                    region: Some(args.region),
                    arch: args.arch.into(),
                    stream: Stream::from_daily(args.daily),
                    minimal: args.minimal,
                    root_store: Some(args.root_store.into()),
                    kernel: None,
                },
            ),
            Commands::AwsCn(args) => (
                Target::AwsChina,
                SearchOptions {
                    release: args.release,
                    region: Some(args.region),
                    arch: args.arch.into(),
                    root_store: Some(args.root_store.into()),
                    ..SearchOptions::default()
                },
            ),
            Commands::AwsGovcloud(args) => (
                Target::AwsGovCloud,
                SearchOptions {
                    release: args.release,
                    region: Some(args.region),
                    arch: args.arch.into(),
                    root_store: Some(args.root_store.into()),
                    ..SearchOptions::default()
                },
            ),
            Commands::Azure(args) => (
                Target::Azure,
                SearchOptions {
                    release: args.release,
                    region: Some(args.region),
                    arch: args.arch.into(),
                    stream: Stream::from_daily(args.daily),
                    ..SearchOptions::default()
                },
            ),
            Commands::Gce(args) => (
                Target::Gce,
                SearchOptions {
                    release: args.release,
                    region: Some(args.region),
                    arch: args.arch.into(),
                    stream: Stream::from_daily(args.daily),
                    minimal: args.minimal,
                    ..SearchOptions::default()
                },
            ),
            Commands::Kvm(args) => (Target::Kvm, local_options(args)),
            Commands::Lxc(args) => (Target::Lxc, local_options(args)),
            Commands::Maasv2(args) => (
                Target::MaasV2,
                SearchOptions {
                    release: args.release,
                    arch: args.arch.into(),
                    stream: Stream::from_daily(args.daily),
                    kernel: Some(args.kernel),
                    ..SearchOptions::default()
                },
            ),
            Commands::Maas(args) => (
                Target::MaasV3,
                SearchOptions {
                    release: args.release,
                    arch: args.arch.into(),
                    kernel: Some(args.kernel),
                    ..SearchOptions::default()
                },
            ),
        }
    }
}

fn local_options(args: LocalArgs) -> SearchOptions {
    SearchOptions {
        release: args.release,
        arch: args.arch.into(),
        stream: Stream::from_daily(args.daily),
        minimal: args.minimal,
        ..SearchOptions::default()
    }
}

// Construct the one handler matching the selected subcommand
pub fn build_handler(command: Commands) -> Result<ImageSearch> {
    let (target, options) = command.into_request();
    ImageSearch::new(target, options)
        .with_context(|| format!("invalid search options for {target}"))
}

// Execute the selected command
pub fn execute_command(command: Commands) -> Result<()> {
    let handler = build_handler(command)?;
    debug!("{}", handler.describe());

    let target = handler.target();
    handler
        .search()
        .with_context(|| format!("image search failed for {target}"))
}
