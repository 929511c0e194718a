//! Configuration discovery and layering.

use std::path::{Path, PathBuf};

use figment::Jail;
use fob_dts::{DtsBundleConfig, EntrySpec, Error};

#[test]
fn discovers_json_config() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "fob-dts.config.json",
            r#"{
                "entries": ["src/index.d.ts"],
                "chunking": true,
                "sharedChunkName": "common"
            }"#,
        )?;

        let config = DtsBundleConfig::load(None).unwrap();
        assert_eq!(config.entries, vec![EntrySpec::from("src/index.d.ts")]);
        assert!(config.chunking);
        assert_eq!(config.shared_chunk_name, "common");
        assert_eq!(config.out_dir, PathBuf::from("dist"));
        assert!(config.region_markers);
        Ok(())
    });
}

#[test]
fn loads_toml_with_named_entries() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "fob-dts.toml",
            r#"
entries = ["src/a.d.ts", { name = "cli", path = "src/bin.d.ts" }]
regionMarkers = false
banner = "// generated"
"#,
        )?;

        let config = DtsBundleConfig::load(None).unwrap();
        let points = config.entry_points().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].name, "a");
        assert_eq!(points[1].name, "cli");
        assert_eq!(points[1].id.as_str(), "src/bin.d.ts");
        assert!(!config.region_markers);
        assert_eq!(config.banner.as_deref(), Some("// generated"));
        Ok(())
    });
}

#[test]
fn loads_yaml_from_explicit_path() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "dts.yml",
            "entries:\n  - src/index.d.ts\noutDir: types\n",
        )?;

        let config = DtsBundleConfig::load(Some(Path::new("dts.yml"))).unwrap();
        assert_eq!(config.out_dir, PathBuf::from("types"));
        assert_eq!(config.entries.len(), 1);
        Ok(())
    });
}

#[test]
fn json_takes_precedence_over_toml() {
    Jail::expect_with(|jail| {
        jail.create_file("fob-dts.config.json", r#"{ "entries": ["from-json.d.ts"] }"#)?;
        jail.create_file("fob-dts.toml", r#"entries = ["from-toml.d.ts"]"#)?;

        let config = DtsBundleConfig::load(None).unwrap();
        assert_eq!(config.entries, vec![EntrySpec::from("from-json.d.ts")]);
        Ok(())
    });
}

#[test]
fn environment_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "fob-dts.toml",
            r#"
entries = ["src/index.d.ts"]
outDir = "from-file"
"#,
        )?;
        jail.set_env("FOB_DTS_OUT_DIR", "from-env");
        jail.set_env("FOB_DTS_CHUNKING", "true");
        jail.set_env("FOB_DTS_SHARED_CHUNK_NAME", "common");

        let config = DtsBundleConfig::load(None).unwrap();
        assert_eq!(config.out_dir, PathBuf::from("from-env"));
        assert!(config.chunking);
        assert_eq!(config.shared_chunk_name, "common");
        Ok(())
    });
}

#[test]
fn defaults_without_any_source() {
    Jail::expect_with(|_jail| {
        let config = DtsBundleConfig::load(None).unwrap();
        assert_eq!(config, DtsBundleConfig::default());
        // Loading succeeds; using it without entries does not.
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        Ok(())
    });
}

#[test]
fn missing_explicit_path_is_an_error() {
    Jail::expect_with(|_jail| {
        let result = DtsBundleConfig::load(Some(Path::new("nope.toml")));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
        Ok(())
    });
}

#[test]
fn malformed_values_are_reported() {
    Jail::expect_with(|jail| {
        jail.create_file("fob-dts.toml", r#"chunking = "sometimes""#)?;

        let result = DtsBundleConfig::load(None);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
        Ok(())
    });
}
