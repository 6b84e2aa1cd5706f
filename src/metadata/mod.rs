//! Descriptor parsing and rewriting (`cube.xml`).
//!
//! The descriptor is a single-root XML document describing publisher, app,
//! version, and declared distribution targets. Reading tolerates missing or
//! empty elements by substituting an explicit default table; rewriting emits a
//! fresh document with the platform element overwritten for the staged target.

use crate::error::{PackagerError, Result};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::path::Path;

/// Root element tag of a valid descriptor.
pub const ROOT_ELEMENT: &str = "cube";

const DEFAULT_PUBLISHER: &str = "AlphaCube";
const DEFAULT_APP: &str = "Unknown";
const DEFAULT_NAME: &str = "Unknown";
const DEFAULT_VERSION: &str = "v1.0";
const DEFAULT_AUTHOR: &str = "Unknown";

/// Declared distribution targets of a project.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistributionTag {
    /// Build for Windows and Linux.
    Universal,
    /// Build for Windows only.
    WindowsOnly,
    /// Build for Linux only.
    LinuxOnly,
    /// Unknown literal; nothing is built.
    Unrecognized,
}

impl DistributionTag {
    /// Parses a platform element value, accepting the legacy literals.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "universal" | "both" => Self::Universal,
            "windows" | "win" => Self::WindowsOnly,
            "linux" | "lin" => Self::LinuxOnly,
            _ => Self::Unrecognized,
        }
    }

    /// Canonical literal for this tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Universal => "universal",
            Self::WindowsOnly => "windows",
            Self::LinuxOnly => "linux",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Project metadata extracted from the descriptor.
#[derive(Clone, Debug)]
pub struct ProjectMetadata {
    /// Publishing organization.
    pub publisher: String,

    /// Short identifier, used as the main script and package name stem.
    pub app: String,

    /// Display title.
    pub name: String,

    /// Version string, packaged verbatim.
    pub version: String,

    /// Declared distribution targets.
    pub distribution: DistributionTag,

    /// Raw platform element value as read, for diagnostics.
    pub platform_raw: String,

    /// Author name.
    pub author: String,
}

impl ProjectMetadata {
    /// Package name stem for one target platform: `{publisher}.{app}.{version}.{suffix}`.
    pub fn package_stem(&self, suffix: &str) -> String {
        format!("{}.{}.{}.{}", self.publisher, self.app, self.version, suffix)
    }
}

/// Reads and validates the descriptor at `path`.
///
/// Fails with [`PackagerError::MetadataMissing`] if the file does not exist and
/// [`PackagerError::MetadataMalformed`] if it cannot be parsed or violates the
/// `app` token invariant. Both are hard stops for the pipeline.
pub fn read_descriptor(path: &Path) -> Result<ProjectMetadata> {
    if !path.exists() {
        return Err(PackagerError::MetadataMissing {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path)?;
    let raw = parse_descriptor(&content).map_err(|reason| PackagerError::MetadataMalformed {
        path: path.to_path_buf(),
        reason,
    })?;

    let app = or_default(raw.app, DEFAULT_APP);
    if !is_safe_token(&app) {
        return Err(PackagerError::MetadataMalformed {
            path: path.to_path_buf(),
            reason: format!("app '{app}' is not a filesystem-safe token"),
        });
    }

    let platform_raw = raw.platform.map(|s| s.trim().to_string()).unwrap_or_default();
    let distribution = DistributionTag::parse(&platform_raw);

    Ok(ProjectMetadata {
        publisher: or_default(raw.publisher, DEFAULT_PUBLISHER),
        app,
        name: or_default(raw.name, DEFAULT_NAME),
        version: or_default(raw.version, DEFAULT_VERSION),
        distribution,
        platform_raw,
        author: or_default(raw.author, DEFAULT_AUTHOR),
    })
}

/// Writes a descriptor for a staged package, with the platform element set to
/// `platform` (the target's package suffix). All other fields come from `meta`.
pub fn write_descriptor(path: &Path, meta: &ProjectMetadata, platform: &str) -> Result<()> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(xml_write_err)?;
    writer
        .write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))
        .map_err(xml_write_err)?;

    write_element(&mut writer, "publisher", &meta.publisher)?;
    write_element(&mut writer, "app", &meta.app)?;
    write_element(&mut writer, "name", &meta.name)?;
    write_element(&mut writer, "version", &meta.version)?;
    write_element(&mut writer, "platform", platform)?;
    write_element(&mut writer, "author", &meta.author)?;

    writer
        .write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))
        .map_err(xml_write_err)?;

    std::fs::write(path, writer.into_inner())?;
    Ok(())
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, tag: &str, value: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(tag)))
        .map_err(xml_write_err)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(xml_write_err)?;
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(xml_write_err)?;
    Ok(())
}

fn xml_write_err<E: std::fmt::Display>(e: E) -> PackagerError {
    PackagerError::Anyhow(anyhow::anyhow!("descriptor serialization failed: {e}"))
}

#[derive(Default)]
struct RawDescriptor {
    publisher: Option<String>,
    app: Option<String>,
    name: Option<String>,
    version: Option<String>,
    platform: Option<String>,
    author: Option<String>,
}

/// Event-walks the document, collecting the text of known depth-1 children.
/// Unknown elements (including `rate` and `correlationid`) are skipped.
fn parse_descriptor(content: &str) -> std::result::Result<RawDescriptor, String> {
    let mut reader = Reader::from_str(content);

    let mut raw = RawDescriptor::default();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if depth == 0 {
                    if tag != ROOT_ELEMENT {
                        return Err(format!(
                            "root element must be <{ROOT_ELEMENT}>, found <{tag}>"
                        ));
                    }
                    saw_root = true;
                } else if depth == 1 {
                    current = Some(tag);
                }
                depth += 1;
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                if depth <= 1 {
                    current = None;
                }
            }
            Ok(Event::Text(t)) => {
                if depth == 2 {
                    if let Some(tag) = &current {
                        let text = t.unescape().map_err(|e| e.to_string())?.into_owned();
                        store_field(&mut raw, tag, text);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            Ok(_) => {}
        }
    }

    if !saw_root {
        return Err(format!("missing <{ROOT_ELEMENT}> root element"));
    }
    Ok(raw)
}

fn store_field(raw: &mut RawDescriptor, tag: &str, text: String) {
    let slot = match tag {
        "publisher" => &mut raw.publisher,
        "app" => &mut raw.app,
        "name" => &mut raw.name,
        "version" => &mut raw.version,
        "platform" => &mut raw.platform,
        "author" => &mut raw.author,
        _ => return,
    };
    *slot = Some(text);
}

fn or_default(value: Option<String>, default: &str) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => default.to_string(),
    }
}

fn is_safe_token(app: &str) -> bool {
    !app.is_empty()
        && app
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<cube>
  <publisher>AlphaPub</publisher>
  <app>widget</app>
  <name>Widget Studio</name>
  <version>1.2.3</version>
  <platform>universal</platform>
  <author>Jo Doe</author>
  <rate>5</rate>
  <correlationid>abc-123</correlationid>
</cube>"#;

    fn write_temp(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.xml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn reads_all_fields() {
        let (_dir, path) = write_temp(FULL);
        let meta = read_descriptor(&path).unwrap();
        assert_eq!(meta.publisher, "AlphaPub");
        assert_eq!(meta.app, "widget");
        assert_eq!(meta.name, "Widget Studio");
        assert_eq!(meta.version, "1.2.3");
        assert_eq!(meta.distribution, DistributionTag::Universal);
        assert_eq!(meta.author, "Jo Doe");
    }

    #[test]
    fn missing_and_empty_elements_take_defaults() {
        let (_dir, path) = write_temp("<cube><app>tool</app><version>  </version></cube>");
        let meta = read_descriptor(&path).unwrap();
        assert_eq!(meta.publisher, "AlphaPub");
        assert_eq!(meta.app, "tool");
        assert_eq!(meta.name, "Unknown");
        assert_eq!(meta.version, "v1.0");
        assert_eq!(meta.author, "Unknown");
        assert_eq!(meta.distribution, DistributionTag::Unrecognized);
    }

    #[test]
    fn missing_file_is_metadata_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_descriptor(&dir.path().join("cube.xml")).unwrap_err();
        assert!(matches!(err, PackagerError::MetadataMissing { .. }));
        assert!(err.aborts_run());
    }

    #[test]
    fn unparseable_markup_is_malformed() {
        let (_dir, path) = write_temp("<cube><app>x</cube>");
        let err = read_descriptor(&path).unwrap_err();
        assert!(matches!(err, PackagerError::MetadataMalformed { .. }));
    }

    #[test]
    fn wrong_root_element_is_malformed() {
        let (_dir, path) = write_temp("<bundle><app>x</app></bundle>");
        let err = read_descriptor(&path).unwrap_err();
        assert!(matches!(err, PackagerError::MetadataMalformed { .. }));
    }

    #[test]
    fn unsafe_app_token_is_malformed() {
        let (_dir, path) = write_temp("<cube><app>wid/get</app></cube>");
        let err = read_descriptor(&path).unwrap_err();
        assert!(matches!(err, PackagerError::MetadataMalformed { .. }));
    }

    #[test]
    fn legacy_tag_literals_parse() {
        assert_eq!(DistributionTag::parse("both"), DistributionTag::Universal);
        assert_eq!(DistributionTag::parse("WIN"), DistributionTag::WindowsOnly);
        assert_eq!(DistributionTag::parse(" lin "), DistributionTag::LinuxOnly);
        assert_eq!(
            DistributionTag::parse("macos"),
            DistributionTag::Unrecognized
        );
    }

    #[test]
    fn platform_rewrite_round_trips() {
        let (_dir, path) = write_temp(FULL);
        let meta = read_descriptor(&path).unwrap();

        let out = path.parent().unwrap().join("staged.xml");
        write_descriptor(&out, &meta, "linux").unwrap();

        let staged = read_descriptor(&out).unwrap();
        assert_eq!(staged.platform_raw, "linux");
        assert_eq!(staged.distribution, DistributionTag::LinuxOnly);
        assert_eq!(staged.publisher, meta.publisher);
        assert_eq!(staged.app, meta.app);
        assert_eq!(staged.version, meta.version);
        assert_eq!(staged.author, meta.author);
    }

    #[test]
    fn written_descriptor_escapes_markup_text() {
        let (_dir, path) = write_temp(FULL);
        let mut meta = read_descriptor(&path).unwrap();
        meta.name = "Widget <Pro> & Co".to_string();

        let out = path.parent().unwrap().join("staged.xml");
        write_descriptor(&out, &meta, "win").unwrap();

        let staged = read_descriptor(&out).unwrap();
        assert_eq!(staged.name, "Widget <Pro> & Co");
    }
}
