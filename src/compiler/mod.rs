//! Compiler toolchain detection, provisioning, and invocation.
//!
//! The external ahead-of-time compiler turns each discovered script into a
//! single-file native executable. Presence is probed with a bounded version
//! query; on Linux hosts a missing toolchain is provisioned into an isolated
//! virtualenv, on any other host absence is a hard failure with remediation
//! text. All invocations are synchronous and block until completion; only the
//! version probe has a timeout.

use crate::config::PackagerConfig;
use crate::error::{PackagerError, Result};
use crate::platform::TargetPlatform;
use crate::scripts::ScriptEntry;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Timeout for the toolchain version probe. The probe is near-instant when the
/// toolchain works; anything longer means a broken installation.
pub const TOOLCHAIN_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Locates a working compiler toolchain, provisioning one on Linux hosts when
/// none is installed.
///
/// Resolution order: the configured binary on `PATH`, then the binary inside a
/// previously provisioned virtualenv, then (Linux only) a fresh provisioning
/// run. Everything else is [`PackagerError::ToolchainUnavailable`].
pub fn ensure_toolchain(config: &PackagerConfig) -> Result<PathBuf> {
    if let Ok(path) = which::which(config.toolchain_bin()) {
        if probe_toolchain(&path)? {
            log::info!("✓ toolchain available: {}", path.display());
            return Ok(path);
        }
        log::warn!(
            "{} found at {} but its version probe failed",
            config.toolchain_bin(),
            path.display()
        );
    }

    if let Some(venv_bin) = venv_toolchain_path(config) {
        if venv_bin.is_file() && probe_toolchain(&venv_bin)? {
            log::info!("✓ toolchain available: {}", venv_bin.display());
            return Ok(venv_bin);
        }
    }

    if TargetPlatform::host() == Some(TargetPlatform::Linux) {
        install_toolchain(config)
    } else {
        Err(PackagerError::ToolchainUnavailable {
            reason: format!(
                "'{}' is not installed. Install it with: pip install {}",
                config.toolchain_bin(),
                config.toolchain_bin()
            ),
        })
    }
}

/// Runs the version query with a short timeout. A spawn failure or timeout
/// counts as absence, not an error.
fn probe_toolchain(bin: &Path) -> Result<bool> {
    let mut child = match Command::new(bin)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            log::debug!("cannot execute {}: {e}", bin.display());
            return Ok(false);
        }
    };

    match child.wait_timeout(TOOLCHAIN_PROBE_TIMEOUT)? {
        Some(status) => Ok(status.success()),
        None => {
            log::warn!("version probe of {} timed out", bin.display());
            child.kill().ok();
            child.wait().ok();
            Ok(false)
        }
    }
}

/// The toolchain location inside the provisioned virtualenv, if a home
/// directory can be determined.
fn venv_toolchain_path(config: &PackagerConfig) -> Option<PathBuf> {
    Some(venv_dir()?.join("bin").join(config.toolchain_bin()))
}

fn venv_dir() -> Option<PathBuf> {
    Some(dirs::home_dir()?.join(".cubepack").join("venv"))
}

/// Provisions the toolchain into an isolated virtualenv (Linux hosts only).
///
/// Each step is a structured argument list, never an interpolated shell string.
fn install_toolchain(config: &PackagerConfig) -> Result<PathBuf> {
    let venv = venv_dir().ok_or_else(|| PackagerError::ToolchainUnavailable {
        reason: "cannot determine the home directory for the toolchain virtualenv".to_string(),
    })?;
    log::info!("provisioning compiler toolchain in {}", venv.display());

    let mut ensure_venv_pkg = Command::new("sudo");
    ensure_venv_pkg.args(["apt-get", "install", "-y", "python3-venv"]);
    run_install_step(ensure_venv_pkg, "installing python3-venv")?;

    let mut create_venv = Command::new("python3");
    create_venv.arg("-m").arg("venv").arg(&venv);
    run_install_step(create_venv, "creating the toolchain virtualenv")?;

    let mut pip_install = Command::new(venv.join("bin").join("pip"));
    pip_install.arg("install").arg(config.toolchain_bin());
    run_install_step(pip_install, "installing the compiler")?;

    let bin = venv.join("bin").join(config.toolchain_bin());
    if probe_toolchain(&bin)? {
        log::info!("✓ toolchain provisioned: {}", bin.display());
        Ok(bin)
    } else {
        Err(PackagerError::ToolchainUnavailable {
            reason: format!(
                "provisioning finished but {} does not answer its version query",
                bin.display()
            ),
        })
    }
}

fn run_install_step(mut cmd: Command, what: &str) -> Result<()> {
    log::debug!("{what}: {cmd:?}");
    let output = cmd
        .output()
        .map_err(|e| PackagerError::ToolchainUnavailable {
            reason: format!("{what} failed to start: {e}"),
        })?;
    if !output.status.success() {
        return Err(PackagerError::ToolchainUnavailable {
            reason: format!(
                "{what} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(())
}

/// Builds the compiler invocation for one script. Pure; no side effects.
///
/// Windows targets are built windowed (every entry is treated as a GUI app)
/// and data directories use the target's path-separator convention.
pub fn compiler_args(
    config: &PackagerConfig,
    script: &ScriptEntry,
    target: TargetPlatform,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--onefile".into(), "--noconfirm".into()];

    if target == TargetPlatform::Windows {
        args.push("--windowed".into());
    }

    args.push("--name".into());
    args.push(script.name.clone().into());

    if let Some(icon) = &script.icon {
        args.push("--icon".into());
        args.push(icon.clone().into_os_string());
    }

    args.push("--distpath".into());
    args.push(config.dist_path().into_os_string());
    args.push("--workpath".into());
    args.push(config.work_path().into_os_string());
    args.push("--specpath".into());
    args.push(config.work_path().into_os_string());

    for dir in config.data_dirs() {
        if config.project_root().join(dir).is_dir() {
            args.push("--add-data".into());
            args.push(format!("{dir}{}{dir}", target.data_separator()).into());
        }
    }

    args.push(script.source.clone().into_os_string());
    args
}

/// Compiles every script for `target`, sequentially.
///
/// A no-op when the host OS class differs from the target; cross-compilation
/// is not supported and the platform is skipped upstream. On a non-zero exit
/// the remaining scripts are not attempted and binaries already produced in
/// this run are left in place.
pub fn compile_scripts(
    config: &PackagerConfig,
    toolchain: &Path,
    scripts: &[ScriptEntry],
    target: TargetPlatform,
) -> Result<()> {
    if TargetPlatform::host() != Some(target) {
        log::debug!("host cannot build {target} binaries; skipping compilation");
        return Ok(());
    }

    for script in scripts {
        log::info!("compiling {} for {target}", script.name);
        let output = Command::new(toolchain)
            .args(compiler_args(config, script, target))
            .current_dir(config.project_root())
            .output()?;

        if !output.status.success() {
            let mut diagnostics = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if diagnostics.is_empty() {
                diagnostics = String::from_utf8_lossy(&output.stdout).trim().to_string();
            }
            return Err(PackagerError::CompileFailed {
                script: script.name.clone(),
                stderr: diagnostics,
            });
        }
        log::info!("✓ compiled {}", target.binary_name(&script.name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(icon: Option<PathBuf>) -> ScriptEntry {
        ScriptEntry {
            name: "widget".to_string(),
            source: PathBuf::from("/proj/widget.py"),
            icon,
            is_main: true,
        }
    }

    fn to_strings(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn windows_invocation_is_windowed_with_semicolon_data() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        let config = PackagerConfig::new(dir.path(), dir.path().join("releases"));

        let args = to_strings(&compiler_args(
            &config,
            &script(None),
            TargetPlatform::Windows,
        ));
        assert!(args.contains(&"--onefile".to_string()));
        assert!(args.contains(&"--windowed".to_string()));
        assert!(args.contains(&"assets;assets".to_string()));
        assert!(!args.iter().any(|a| a == "--icon"));
        assert_eq!(args.last().unwrap(), "/proj/widget.py");
    }

    #[test]
    fn linux_invocation_is_console_with_colon_data() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        let config = PackagerConfig::new(dir.path(), dir.path().join("releases"));

        let args = to_strings(&compiler_args(&config, &script(None), TargetPlatform::Linux));
        assert!(!args.contains(&"--windowed".to_string()));
        assert!(args.contains(&"data:data".to_string()));
        // Absent directories contribute no bundling flags.
        assert!(!args.contains(&"assets:assets".to_string()));
    }

    #[test]
    fn icon_flag_is_emitted_when_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let config = PackagerConfig::new(dir.path(), dir.path().join("releases"));
        let icon = PathBuf::from("/proj/assets/app-icon.ico");

        let args = to_strings(&compiler_args(
            &config,
            &script(Some(icon)),
            TargetPlatform::Windows,
        ));
        let pos = args.iter().position(|a| a == "--icon").unwrap();
        assert_eq!(args[pos + 1], "/proj/assets/app-icon.ico");
    }

    #[test]
    fn output_name_follows_logical_name() {
        let dir = tempfile::tempdir().unwrap();
        let config = PackagerConfig::new(dir.path(), dir.path().join("releases"));

        let args = to_strings(&compiler_args(&config, &script(None), TargetPlatform::Linux));
        let pos = args.iter().position(|a| a == "--name").unwrap();
        assert_eq!(args[pos + 1], "widget");
    }
}
