//! [`Bridge`] implementation backed by the `adb` executable.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::parse::{self, Badging, ListedPackage};
use super::{Bridge, InstalledPackage};
use crate::config::AppConfig;
use crate::error::BridgeError;
use crate::package::PACKAGE_EXTENSION;

/// Where the on-device aapt build lives.
const DEVICE_TMP_DIR: &str = "/data/local/tmp/";
const DEVICE_AAPT_NAME: &str = "aapt-arm-pie";
const DEVICE_AAPT_PATH: &str = "/data/local/tmp/aapt-arm-pie";

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Knobs for [`AdbBridge`].
#[derive(Debug, Clone)]
pub struct AdbSettings {
    pub adb_path: PathBuf,
    pub aapt_path: PathBuf,
    pub device_aapt_source: Option<PathBuf>,
    pub install_timeout: Duration,
    pub command_timeout: Duration,
    pub skip_installed: bool,
}

impl Default for AdbSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl AdbSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            adb_path: config.adb_path.clone(),
            aapt_path: config.aapt_path.clone(),
            device_aapt_source: config.device_aapt_source.clone(),
            install_timeout: config.install_timeout(),
            command_timeout: config.command_timeout(),
            skip_installed: config.skip_installed,
        }
    }
}

#[derive(Debug)]
struct CommandOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

/// Talks to the target through `adb` (and host-side `aapt` for metadata).
#[derive(Debug, Clone, Default)]
pub struct AdbBridge {
    settings: AdbSettings,
}

impl AdbBridge {
    pub fn new(settings: AdbSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AdbSettings {
        &self.settings
    }

    async fn run<I, S>(
        &self,
        program: &Path,
        args: I,
        timeout: Duration,
    ) -> Result<CommandOutput, BridgeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        let description = describe(program, &args);
        tracing::debug!(command = %description, "Running bridge command");

        let mut cmd = Command::new(program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(BridgeError::Spawn {
                    command: description,
                    source,
                });
            }
            Err(_) => {
                tracing::warn!(command = %description, "Bridge command timed out");
                return Err(BridgeError::Timeout {
                    command: description,
                    after: timeout,
                });
            }
        };

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run adb and fail on a non-zero exit, carrying stderr (or stdout when
    /// stderr is empty) as the error text.
    async fn adb<I, S>(&self, args: I, timeout: Duration) -> Result<String, BridgeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        let output = self.run(&self.settings.adb_path, &args, timeout).await?;
        if output.success {
            return Ok(output.stdout);
        }
        let stderr = if output.stderr.trim().is_empty() {
            output.stdout
        } else {
            output.stderr
        };
        let command = describe(&self.settings.adb_path, &args);
        tracing::warn!(command = %command, stderr = %stderr.trim(), "Bridge command failed");
        Err(BridgeError::CommandFailed {
            command,
            stderr: stderr.trim().to_string(),
        })
    }

    async fn shell(&self, args: &[&str]) -> Result<String, BridgeError> {
        let full: Vec<&str> = std::iter::once("shell").chain(args.iter().copied()).collect();
        self.adb(full, self.settings.command_timeout).await
    }

    /// Message to report instead of installing when the device already has
    /// this exact version. Lookup failures mean "not installed".
    async fn already_installed(&self, path: &Path) -> Option<String> {
        let badging = match self.host_badging(path).await {
            Ok(Some(badging)) if !badging.version_name.is_empty() => badging,
            Ok(_) => return None,
            Err(err) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %err,
                    "aapt lookup failed; installing anyway"
                );
                return None;
            }
        };

        let listed = self
            .shell(&["pm", "list", "packages", &badging.package_name])
            .await
            .ok()?;
        if !parse::package_listed(&listed, &badging.package_name) {
            return None;
        }

        let dump = self
            .shell(&["dumpsys", "package", &badging.package_name])
            .await
            .ok()?;
        let (installed_version, _) = parse::parse_dumpsys_versions(&dump);
        tracing::debug!(
            package = %badging.package_name,
            installed = ?installed_version,
            expected = %badging.version_name,
            "Compared installed version"
        );
        (installed_version.as_deref() == Some(badging.version_name.as_str())).then(|| {
            format!(
                "Package already installed: {} version: {}",
                badging.package_name, badging.version_name
            )
        })
    }

    async fn host_badging(&self, path: &Path) -> Result<Option<Badging>, BridgeError> {
        let args = [OsStr::new("dump"), OsStr::new("badging"), path.as_os_str()];
        let output = self
            .run(&self.settings.aapt_path, args, self.settings.command_timeout)
            .await?;
        if !output.success {
            return Ok(None);
        }
        Ok(parse::parse_badging(&output.stdout))
    }

    /// Make sure the device has an aapt build. Pushes the configured local
    /// copy when missing; `false` when none is available.
    async fn ensure_device_aapt(&self) -> bool {
        match self.shell(&["ls", DEVICE_TMP_DIR]).await {
            Ok(listing) if parse::listing_contains(&listing, DEVICE_AAPT_NAME) => return true,
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(error = %err, "Could not inspect device tmp dir");
                return false;
            }
        }

        let Some(source) = self.settings.device_aapt_source.as_deref() else {
            return false;
        };
        let result = async {
            self.adb(
                [OsStr::new("push"), source.as_os_str(), OsStr::new(DEVICE_AAPT_PATH)],
                self.settings.install_timeout,
            )
            .await?;
            self.shell(&["chmod", "0755", DEVICE_AAPT_PATH]).await?;
            Ok::<(), BridgeError>(())
        }
        .await;
        match result {
            Ok(()) => {
                tracing::info!(source = %source.display(), "Pushed aapt to device");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to push aapt to device");
                false
            }
        }
    }

    async fn installed_info(
        &self,
        entry: &ListedPackage,
        device_aapt: bool,
    ) -> Result<InstalledPackage, BridgeError> {
        let mut package_name = entry.package_name.clone();

        if device_aapt {
            let output = self
                .shell(&[DEVICE_AAPT_PATH, "d", "badging", &entry.apk_path])
                .await?;
            if let Some(badging) = parse::parse_badging(&output) {
                if is_complete(&badging) {
                    return Ok(InstalledPackage {
                        package_name: badging.package_name,
                        version_name: badging.version_name,
                        version_code: badging.version_code,
                        display_label: badging.label,
                    });
                }
                package_name.get_or_insert(badging.package_name);
            }
        }

        let Some(package_name) = package_name else {
            return Err(BridgeError::CommandFailed {
                command: "aapt d badging".to_string(),
                stderr: format!("Package info not found for: {}", entry.apk_path),
            });
        };
        let dump = self.shell(&["dumpsys", "package", &package_name]).await?;
        let (version_name, version_code) = parse::parse_dumpsys_versions(&dump);
        Ok(InstalledPackage {
            display_label: package_name.clone(),
            package_name,
            version_name: version_name.unwrap_or_default(),
            version_code: version_code.unwrap_or_default(),
        })
    }
}

impl Bridge for AdbBridge {
    async fn connect(&self, address: &str) -> Result<String, BridgeError> {
        let address = address.trim();
        if self.is_reachable(address).await? {
            tracing::debug!(address, "Already connected");
            return Ok(String::new());
        }
        let output = self
            .adb(["connect", address], self.settings.command_timeout)
            .await?;
        if parse::connect_failed(&output) {
            return Err(BridgeError::CommandFailed {
                command: format!("adb connect {address}"),
                stderr: output.trim().to_string(),
            });
        }
        tracing::info!(address, "Connected to target");
        Ok(output)
    }

    async fn install(&self, path: &Path) -> Result<String, BridgeError> {
        if self.settings.skip_installed
            && let Some(message) = self.already_installed(path).await
        {
            tracing::info!(path = %path.display(), "{message}");
            return Ok(message);
        }

        let args = [OsStr::new("install"), path.as_os_str()];
        let output = self.adb(args, self.settings.install_timeout).await?;
        // Older adb releases exit 0 and report the failure on stdout.
        if let Some(failure) = output.lines().find(|line| line.starts_with("Failure [")) {
            return Err(BridgeError::CommandFailed {
                command: format!("adb install {}", path.display()),
                stderr: failure.trim().to_string(),
            });
        }
        tracing::info!(path = %path.display(), "Installed package");
        Ok(output)
    }

    async fn list_package_files(&self, dir: &Path) -> Result<Vec<PathBuf>, BridgeError> {
        let io_err = |source| BridgeError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            let is_package = path
                .extension()
                .and_then(OsStr::to_str)
                .is_some_and(|ext| ext.eq_ignore_ascii_case(PACKAGE_EXTENSION));
            if is_package && entry.file_type().await.map_err(io_err)?.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    async fn list_installed_packages(&self) -> Result<Vec<InstalledPackage>, BridgeError> {
        let output = self.shell(&["pm", "list", "packages", "-3", "-f"]).await?;
        let listed = parse::parse_listed_packages(&output);
        let device_aapt = self.ensure_device_aapt().await;

        let mut packages = Vec::with_capacity(listed.len());
        for entry in &listed {
            match self.installed_info(entry, device_aapt).await {
                Ok(info) => packages.push(info),
                Err(err) => {
                    tracing::warn!(apk = %entry.apk_path, error = %err, "Skipping package");
                }
            }
        }
        Ok(packages)
    }

    async fn is_reachable(&self, address: &str) -> Result<bool, BridgeError> {
        let output = self.adb(["devices"], self.settings.command_timeout).await?;
        Ok(parse::device_is_online(&output, address))
    }
}

fn is_complete(badging: &Badging) -> bool {
    !badging.package_name.is_empty()
        && !badging.version_code.is_empty()
        && !badging.version_name.is_empty()
        && !badging.label.is_empty()
}

fn describe(program: &Path, args: &[std::ffi::OsString]) -> String {
    let mut description = program.display().to_string();
    for arg in args {
        description.push(' ');
        description.push_str(&arg.to_string_lossy());
    }
    description
}
