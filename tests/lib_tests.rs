#[cfg(test)]
mod tests {
    use anyhow::Result;
    use std::fs;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use ubuntu_cloud_image::{Arch, ImageSearch, RootStore, Search, SearchOptions, Stream, Target};

    // Helper to build options for a target without a region
    fn local_options(release: &str) -> SearchOptions {
        SearchOptions {
            release: release.to_string(),
            ..SearchOptions::default()
        }
    }

    // Helper to build options for a target that needs a region
    fn regional_options(release: &str, region: &str) -> SearchOptions {
        SearchOptions {
            release: release.to_string(),
            region: Some(region.to_string()),
            ..SearchOptions::default()
        }
    }

    fn report_text(handler: &ImageSearch) -> Result<String> {
        let mut buffer = Vec::new();
        handler.write_report(&mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    // Test the key table round-trips for every target
    #[test]
    fn test_target_keys() {
        let keys: Vec<_> = Target::ALL.iter().map(|target| target.key()).collect();
        assert_eq!(
            keys,
            vec![
                "aws",
                "aws-cn",
                "aws-govcloud",
                "azure",
                "gce",
                "kvm",
                "lxc",
                "maasv2",
                "maas"
            ]
        );

        for target in Target::ALL {
            assert_eq!(target.to_string(), target.key());
        }

        assert_eq!(Target::MaasV3.description(), "Metal as a Service (MAAS) Version 3");
    }

    // Test architecture sets per target family
    #[test]
    fn test_target_arches() {
        assert_eq!(Target::Aws.arches(), &[Arch::Amd64, Arch::Arm64]);
        assert_eq!(Target::AwsGovCloud.arches(), &[Arch::Amd64, Arch::Arm64]);
        assert_eq!(Target::Azure.arches(), &[Arch::Amd64]);
        assert_eq!(Target::Gce.arches(), &[Arch::Amd64]);
        assert_eq!(Target::Kvm.arches().len(), 6);
        assert_eq!(Target::MaasV3.arches().len(), 6);
    }

    // Test defaults filled in by the handler
    #[test]
    fn test_handler_defaults() -> Result<()> {
        let aws = ImageSearch::new(Target::Aws, regional_options("bionic", "us-west-2"))?;
        assert_eq!(aws.options().arch, Arch::Amd64);
        assert_eq!(aws.options().root_store, Some(RootStore::Ssd));
        assert_eq!(aws.options().stream, Stream::Released);
        assert!(!aws.options().minimal);
        assert_eq!(aws.options().kernel, None);

        let maas = ImageSearch::new(Target::MaasV2, local_options("focal"))?;
        assert_eq!(maas.options().kernel.as_deref(), Some("generic"));
        assert_eq!(maas.options().root_store, None);

        Ok(())
    }

    // Test release codenames are normalized
    #[test]
    fn test_release_is_lowercased() -> Result<()> {
        let handler = ImageSearch::new(Target::Lxc, local_options(" Bionic "))?;
        assert_eq!(handler.options().release, "bionic");
        Ok(())
    }

    // Test region and kernel are stored as validated
    #[test]
    fn test_region_and_kernel_are_trimmed() -> Result<()> {
        let handler = ImageSearch::new(Target::Azure, regional_options("jammy", "  West US "))?;
        assert_eq!(handler.options().region.as_deref(), Some("West US"));
        assert!(report_text(&handler)?.contains("region:  West US\n"));
        assert!(handler.describe().contains(r#""region":"West US""#));

        let options = SearchOptions {
            kernel: Some(" hwe-22.04\t".to_string()),
            ..local_options("jammy")
        };
        let handler = ImageSearch::new(Target::MaasV2, options)?;
        assert_eq!(handler.options().kernel.as_deref(), Some("hwe-22.04"));

        Ok(())
    }

    // Test region presence follows the target
    #[test]
    fn test_region_rules() {
        let missing = ImageSearch::new(Target::Gce, local_options("jammy"));
        assert!(missing.unwrap_err().to_string().contains("gce requires a region"));

        let extra = ImageSearch::new(Target::Kvm, regional_options("jammy", "us-west1"));
        assert!(extra.unwrap_err().to_string().contains("kvm does not take a region"));

        let blank = ImageSearch::new(Target::Azure, regional_options("jammy", "  "));
        assert!(blank.unwrap_err().to_string().contains("region must not be empty"));
    }

    // Test stream, minimal, root store and kernel capabilities
    #[test]
    fn test_capability_rules() {
        let daily = SearchOptions {
            stream: Stream::Daily,
            ..regional_options("focal", "cn-north-1")
        };
        let err = ImageSearch::new(Target::AwsChina, daily).unwrap_err();
        assert!(err.to_string().contains("aws-cn has no daily image stream"));

        let minimal = SearchOptions {
            minimal: true,
            ..regional_options("focal", "West US")
        };
        let err = ImageSearch::new(Target::Azure, minimal).unwrap_err();
        assert!(err.to_string().contains("azure has no minimal images"));

        let root_store = SearchOptions {
            root_store: Some(RootStore::Instance),
            ..local_options("focal")
        };
        let err = ImageSearch::new(Target::Lxc, root_store).unwrap_err();
        assert!(err.to_string().contains("lxc does not take a root store"));

        let kernel = SearchOptions {
            kernel: Some("lowlatency".to_string()),
            ..local_options("focal")
        };
        let err = ImageSearch::new(Target::Kvm, kernel).unwrap_err();
        assert!(err.to_string().contains("kvm does not take a kernel flavor"));

        let blank_kernel = SearchOptions {
            kernel: Some(String::new()),
            ..local_options("focal")
        };
        let err = ImageSearch::new(Target::MaasV3, blank_kernel).unwrap_err();
        assert!(err.to_string().contains("kernel flavor must not be empty"));
    }

    // Test architectures outside the target's set are rejected
    #[test]
    fn test_arch_rules() {
        let arm = SearchOptions {
            arch: Arch::Arm64,
            ..regional_options("noble", "us-west1")
        };
        let err = ImageSearch::new(Target::Gce, arm).unwrap_err();
        assert!(err
            .to_string()
            .contains("architecture arm64 is not available on gce (choose from: amd64)"));

        let s390x = SearchOptions {
            arch: Arch::S390x,
            ..local_options("noble")
        };
        assert!(ImageSearch::new(Target::MaasV3, s390x).is_ok());
    }

    // Test the empty release edge case
    #[test]
    fn test_empty_release() {
        let err = ImageSearch::new(Target::Kvm, local_options("")).unwrap_err();
        assert_eq!(err.to_string(), "release codename must not be empty");
    }

    // Test the full report for a regional target
    #[test]
    fn test_aws_report() -> Result<()> {
        let options = SearchOptions {
            minimal: true,
            stream: Stream::Daily,
            ..regional_options("bionic", "us-west-2")
        };
        let handler = ImageSearch::new(Target::Aws, options)?;

        let expected = "\
target:     aws (Amazon Web Services)
release:    bionic
region:     us-west-2
arch:       amd64
stream:     daily
minimal:    yes
root store: ssd
";
        assert_eq!(report_text(&handler)?, expected);
        Ok(())
    }

    // Test unsupported fields are left out of the report
    #[test]
    fn test_maas_report() -> Result<()> {
        let options = SearchOptions {
            arch: Arch::Arm64,
            ..local_options("jammy")
        };
        let handler = ImageSearch::new(Target::MaasV3, options)?;

        let expected = "\
target:  maas (Metal as a Service (MAAS) Version 3)
release: jammy
arch:    arm64
stream:  released
kernel:  generic
";
        assert_eq!(report_text(&handler)?, expected);
        Ok(())
    }

    // Test writing the report to a file
    #[test]
    fn test_report_to_file() -> Result<()> {
        let handler = ImageSearch::new(Target::Kvm, local_options("focal"))?;

        let mut temp_file = NamedTempFile::new()?;
        handler.write_report(&mut temp_file)?;
        temp_file.flush()?;

        let content = fs::read_to_string(temp_file.path())?;
        assert!(content.starts_with("target:  kvm (Kernel-based Virtual Machine)\n"));
        assert!(content.contains("minimal: no\n"));
        assert!(!content.contains("region"));

        Ok(())
    }

    // Test the debug description of a handler
    #[test]
    fn test_describe() -> Result<()> {
        let options = regional_options("focal", "us-gov-west-1");
        let handler = ImageSearch::new(Target::AwsGovCloud, options)?;
        let value: serde_json::Value = serde_json::from_str(&handler.describe())?;

        assert_eq!(value["target"], "aws-govcloud");
        assert_eq!(value["release"], "focal");
        assert_eq!(value["region"], "us-gov-west-1");
        assert_eq!(value["arch"], "amd64");
        assert_eq!(value["stream"], "released");
        assert_eq!(value["root_store"], "ssd");
        assert!(value.get("kernel").is_none());
        assert!(!handler.describe().contains('\n'));
        assert_eq!(handler.target(), Target::AwsGovCloud);

        Ok(())
    }

    // Test options deserialize with defaults for omitted fields
    #[test]
    fn test_options_from_json() -> Result<()> {
        let options: SearchOptions = serde_json::from_str(r#"{"release": "noble"}"#)?;
        assert_eq!(options, local_options("noble"));

        let options: SearchOptions =
            serde_json::from_str(r#"{"release": "noble", "arch": "ppc64el", "stream": "daily"}"#)?;
        assert_eq!(options.arch, Arch::Ppc64el);
        assert_eq!(options.stream, Stream::Daily);

        Ok(())
    }
}
