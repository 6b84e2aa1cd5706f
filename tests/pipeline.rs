//! End-to-end pipeline tests against a stub compiler toolchain.
//!
//! The stub stands in for the external compiler: it answers the version
//! probe and drops a fake binary into the dist directory for each
//! invocation, so the whole compile/package/archive path runs for real.

#![cfg(unix)]

use cubepack::metadata::{self, DistributionTag};
use cubepack::pipeline::{Pipeline, ProgressSink};
use cubepack::platform::TargetPlatform;
use cubepack::{PackagerConfig, PackagerError};
use predicates::prelude::*;
use std::cell::RefCell;
use std::fs;
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const STUB_OK: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "6.0.0"
  exit 0
fi
name=""
dist="dist"
while [ $# -gt 0 ]; do
  case "$1" in
    --name) name="$2"; shift 2 ;;
    --distpath) dist="$2"; shift 2 ;;
    *) shift ;;
  esac
done
mkdir -p "$dist"
printf 'stub binary %s' "$name" > "$dist/$name"
chmod 755 "$dist/$name"
"#;

const STUB_BROKEN: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "6.0.0"
  exit 0
fi
echo "stub: synthetic compile error" >&2
exit 1
"#;

fn write_stub(dir: &Path, name: &str, script: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn descriptor(tag: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<cube>
  <publisher>AlphaPub</publisher>
  <app>widget</app>
  <name>Widget Studio</name>
  <version>1.2.3</version>
  <platform>{tag}</platform>
  <author>Jo Doe</author>
</cube>
"#
    )
}

fn fixture_project(tag: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("cube.xml"), descriptor(tag)).unwrap();
    fs::write(root.join("widget.py"), "print('widget')\n").unwrap();
    fs::write(root.join("helper.py"), "print('helper')\n").unwrap();
    fs::write(root.join("_private.py"), "pass\n").unwrap();
    fs::write(root.join("cubepack.py"), "pass\n").unwrap();
    fs::write(root.join("readme.md"), "# Widget\n").unwrap();
    fs::write(root.join("notes.tmp"), "scratch\n").unwrap();
    fs::write(root.join(".cubeignore"), "build\n*.tmp\n").unwrap();
    fs::create_dir(root.join("build")).unwrap();
    fs::write(root.join("build").join("output.bin"), "artifact").unwrap();
    fs::create_dir(root.join("data")).unwrap();
    fs::write(root.join("data").join("table.csv"), "1,2,3\n").unwrap();

    dir
}

struct Recorder(RefCell<Vec<u8>>);

impl ProgressSink for Recorder {
    fn progress(&self, percent: u8) {
        self.0.borrow_mut().push(percent);
    }
}

fn host() -> TargetPlatform {
    TargetPlatform::host().expect("tests require a Windows or Linux host")
}

#[test]
fn universal_project_produces_one_host_archive() {
    let project = fixture_project("universal");
    let root = project.path();
    let stub = write_stub(root, "stubcompiler", STUB_OK);

    let config = PackagerConfig::new(root, root.join("releases"))
        .with_toolchain_bin(stub.to_string_lossy().into_owned());
    let sink = Recorder(RefCell::new(Vec::new()));

    let archives = Pipeline::new(&config).with_progress(&sink).run().unwrap();

    let suffix = host().suffix();
    assert_eq!(archives.len(), 1);
    assert_eq!(
        archives[0],
        root.join("releases")
            .join(format!("AlphaPub.widget.1.2.3.{suffix}.cub"))
    );
    assert!(archives[0].is_file());

    // Progress is monotone, starts in the metadata band, ends complete.
    let reported = sink.0.borrow().clone();
    assert!(reported.windows(2).all(|w| w[0] < w[1]), "{reported:?}");
    assert_eq!(reported.first(), Some(&5));
    assert!(reported.contains(&10));
    assert!(reported.contains(&20));
    assert_eq!(reported.last(), Some(&100));
}

#[test]
fn archive_mirrors_staging_and_omits_excluded_paths() {
    let project = fixture_project("universal");
    let root = project.path();
    let stub = write_stub(root, "stubcompiler", STUB_OK);

    let config = PackagerConfig::new(root, root.join("releases"))
        .with_toolchain_bin(stub.to_string_lossy().into_owned());
    let archives = Pipeline::new(&config).run().unwrap();

    let suffix = host().suffix();
    let staging = root
        .join("releases")
        .join(format!("AlphaPub.widget.1.2.3.{suffix}"));
    assert!(staging.is_dir());

    let mut archive = zip::ZipArchive::new(fs::File::open(&archives[0]).unwrap()).unwrap();

    // Every staged file appears under its relative path with identical bytes.
    for entry in walkdir::WalkDir::new(&staging).min_depth(1) {
        let entry = entry.unwrap();
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(&staging)
            .unwrap()
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let mut packed = Vec::new();
        archive
            .by_name(&rel)
            .unwrap_or_else(|_| panic!("archive missing {rel}"))
            .read_to_end(&mut packed)
            .unwrap();
        assert_eq!(packed, fs::read(entry.path()).unwrap(), "{rel}");
    }

    // Package contents: binaries, kept files, data; no sources or ignored files.
    let target = host();
    for required in [
        target.binary_name("widget"),
        target.binary_name("helper"),
        "readme.md".to_string(),
        "cube.xml".to_string(),
        "data/table.csv".to_string(),
    ] {
        assert!(archive.by_name(&required).is_ok(), "missing {required}");
    }
    for absent in [
        "notes.tmp",
        "build/output.bin",
        "widget.py",
        "helper.py",
        "_private.py",
        "cubepack.py",
    ] {
        assert!(archive.by_name(absent).is_err(), "unexpected {absent}");
    }

    // The staged descriptor declares the target it was packaged for.
    let mut staged_xml = String::new();
    archive
        .by_name("cube.xml")
        .unwrap()
        .read_to_string(&mut staged_xml)
        .unwrap();
    drop(archive);
    let staged = metadata::read_descriptor(&staging.join("cube.xml")).unwrap();
    assert_eq!(staged.platform_raw, suffix);
    assert!(staged_xml.contains(&format!("<platform>{suffix}</platform>")));
}

#[test]
fn foreign_only_declaration_is_no_applicable_platform() {
    let foreign_tag = match TargetPlatform::host() {
        Some(TargetPlatform::Linux) => "windows",
        _ => "linux",
    };
    let project = fixture_project(foreign_tag);
    let root = project.path();

    let config = PackagerConfig::new(root, root.join("releases"));
    let err = Pipeline::new(&config).run().unwrap_err();
    assert!(matches!(err, PackagerError::NoApplicablePlatform));
    assert!(err.aborts_run());
}

#[test]
fn unrecognized_tag_builds_nothing() {
    let project = fixture_project("solaris");
    let root = project.path();

    let config = PackagerConfig::new(root, root.join("releases"));
    let err = Pipeline::new(&config).run().unwrap_err();
    assert!(matches!(err, PackagerError::NoApplicablePlatform));
}

#[test]
fn compile_failure_aborts_the_platform() {
    let project = fixture_project("universal");
    let root = project.path();
    let stub = write_stub(root, "stubcompiler", STUB_BROKEN);

    let config = PackagerConfig::new(root, root.join("releases"))
        .with_toolchain_bin(stub.to_string_lossy().into_owned());
    let err = Pipeline::new(&config).run().unwrap_err();

    match err {
        PackagerError::CompileFailed { script, stderr } => {
            assert_eq!(script, "widget");
            assert!(stderr.contains("synthetic compile error"));
        }
        other => panic!("expected CompileFailed, got {other}"),
    }

    let suffix = host().suffix();
    assert!(
        !root
            .join("releases")
            .join(format!("AlphaPub.widget.1.2.3.{suffix}.cub"))
            .exists()
    );
}

#[test]
fn missing_descriptor_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("widget.py"), "print('x')\n").unwrap();

    let config = PackagerConfig::new(dir.path(), dir.path().join("releases"));
    let err = Pipeline::new(&config).run().unwrap_err();
    assert!(matches!(err, PackagerError::MetadataMissing { .. }));
    assert!(!dir.path().join("releases").exists());
}

#[test]
fn cli_packages_a_project_and_reports_ok() {
    let project = fixture_project("universal");
    let root = project.path();
    let stub = write_stub(root, "stubcompiler", STUB_OK);

    assert_cmd::Command::cargo_bin("cubepack")
        .unwrap()
        .arg(root)
        .arg("--output")
        .arg(root.join("releases"))
        .arg("--toolchain")
        .arg(&stub)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));

    let suffix = host().suffix();
    assert!(
        root.join("releases")
            .join(format!("AlphaPub.widget.1.2.3.{suffix}.cub"))
            .is_file()
    );
}

#[test]
fn cli_reports_error_and_exits_nonzero_without_descriptor() {
    let dir = tempfile::tempdir().unwrap();

    assert_cmd::Command::cargo_bin("cubepack")
        .unwrap()
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("ERROR"))
        .stderr(predicate::str::contains("descriptor"));
}

#[test]
fn cli_rejects_a_missing_project_root() {
    assert_cmd::Command::cargo_bin("cubepack")
        .unwrap()
        .arg("/no/such/project/root")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("project root"));
}

#[test]
fn distribution_tag_drives_the_declared_set() {
    // The policy matrix is unit-tested in the library; here just pin the
    // descriptor literals end to end.
    let project = fixture_project("both");
    let meta = metadata::read_descriptor(&project.path().join("cube.xml")).unwrap();
    assert_eq!(meta.distribution, DistributionTag::Universal);
}
