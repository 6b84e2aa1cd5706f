//! Target platform model and distribution policy.
//!
//! Every component consumes [`TargetPlatform`] rather than raw platform
//! strings; host detection happens in exactly one place.

use crate::metadata::DistributionTag;
use std::fmt;

/// A build target's operating system class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetPlatform {
    /// Windows hosts and packages.
    Windows,
    /// Linux hosts and packages.
    Linux,
}

impl TargetPlatform {
    /// Package-name suffix for this platform.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Windows => "win",
            Self::Linux => "linux",
        }
    }

    /// Separator used in the compiler's data-bundling flags.
    pub fn data_separator(self) -> char {
        match self {
            Self::Windows => ';',
            Self::Linux => ':',
        }
    }

    /// Compiled binary filename for a script stem.
    pub fn binary_name(self, stem: &str) -> String {
        match self {
            Self::Windows => format!("{stem}.exe"),
            Self::Linux => stem.to_string(),
        }
    }

    /// OS class of the machine the packager is running on.
    ///
    /// `None` on hosts that are neither Windows nor Linux; no platform is
    /// buildable there.
    pub fn host() -> Option<Self> {
        if cfg!(target_os = "windows") {
            Some(Self::Windows)
        } else if cfg!(target_os = "linux") {
            Some(Self::Linux)
        } else {
            None
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => write!(f, "Windows"),
            Self::Linux => write!(f, "Linux"),
        }
    }
}

/// Platforms a distribution tag declares. Pure mapping, no side effects.
pub fn required_targets(tag: DistributionTag) -> &'static [TargetPlatform] {
    match tag {
        DistributionTag::Universal => &[TargetPlatform::Windows, TargetPlatform::Linux],
        DistributionTag::WindowsOnly => &[TargetPlatform::Windows],
        DistributionTag::LinuxOnly => &[TargetPlatform::Linux],
        DistributionTag::Unrecognized => &[],
    }
}

/// Declared targets that can actually be built on this host.
///
/// A declared target whose OS class differs from the host is skipped, never
/// failed; cross-compilation is not supported.
pub fn applicable_targets(tag: DistributionTag) -> Vec<TargetPlatform> {
    let host = TargetPlatform::host();
    required_targets(tag)
        .iter()
        .copied()
        .filter(|t| Some(*t) == host)
        .collect()
}
