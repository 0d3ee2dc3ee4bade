//! Parsers for adb and aapt text output.

use std::sync::OnceLock;

use regex::Regex;

/// Package metadata as printed by `aapt dump badging`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Badging {
    pub package_name: String,
    pub version_code: String,
    pub version_name: String,
    pub label: String,
}

/// An entry of `pm list packages -f`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedPackage {
    pub apk_path: String,
    pub package_name: Option<String>,
}

/// Whether `adb devices` lists `address` in the `device` (online) state.
pub fn device_is_online(devices_output: &str, address: &str) -> bool {
    let address = address.trim();
    devices_output.lines().any(|line| {
        let mut fields = line.split_whitespace();
        fields.next() == Some(address) && fields.next() == Some("device")
    })
}

/// `adb connect` exits 0 even when it could not connect; the verdict is in
/// the text.
pub fn connect_failed(output: &str) -> bool {
    let output = output.to_lowercase();
    ["failed to connect", "cannot connect", "unable to connect"]
        .iter()
        .any(|needle| output.contains(needle))
}

pub fn parse_listed_packages(output: &str) -> Vec<ListedPackage> {
    static LINE: OnceLock<Regex> = OnceLock::new();
    let re = LINE.get_or_init(|| {
        Regex::new(r"package:(.+?/base\.apk)(?:=(\S+))?").expect("valid package list regex")
    });

    re.captures_iter(output)
        .map(|caps| ListedPackage {
            apk_path: caps[1].trim().to_string(),
            package_name: caps.get(2).map(|m| m.as_str().trim().to_string()),
        })
        .collect()
}

/// Whether `pm list packages <name>` output contains exactly `name`.
pub fn package_listed(output: &str, package_name: &str) -> bool {
    let expected = format!("package:{package_name}");
    output.lines().any(|line| line.trim() == expected)
}

/// Returns `None` unless a `package: name='…'` line is present.
pub fn parse_badging(output: &str) -> Option<Badging> {
    let mut badging: Option<Badging> = None;
    let mut label = String::new();

    for line in output.lines() {
        if line.starts_with("package:") {
            let package_name = quoted_attr(line, "name")?;
            badging = Some(Badging {
                package_name,
                version_code: quoted_attr(line, "versionCode").unwrap_or_default(),
                version_name: quoted_attr(line, "versionName").unwrap_or_default(),
                label: String::new(),
            });
        } else if let Some(rest) = line.strip_prefix("application-label:") {
            // Localized `application-label-xx:` lines are ignored on purpose.
            label = rest.trim().trim_matches('\'').to_string();
        }
    }

    badging.map(|b| Badging { label, ..b })
}

/// `versionName` and `versionCode` from `dumpsys package <name>`.
pub fn parse_dumpsys_versions(output: &str) -> (Option<String>, Option<String>) {
    let mut version_name = None;
    let mut version_code = None;
    for line in output.lines() {
        let line = line.trim();
        if version_name.is_none()
            && let Some(rest) = line.strip_prefix("versionName=")
        {
            version_name = Some(rest.trim().to_string());
        }
        if version_code.is_none()
            && let Some(rest) = line.strip_prefix("versionCode=")
        {
            version_code = rest.split_whitespace().next().map(str::to_string);
        }
    }
    (version_name, version_code)
}

/// Whether `ls` output names `file_name` on a line of its own.
pub fn listing_contains(output: &str, file_name: &str) -> bool {
    output.lines().any(|line| line.trim() == file_name)
}

fn quoted_attr(line: &str, key: &str) -> Option<String> {
    let marker = format!(" {key}='");
    let start = line.find(&marker)? + marker.len();
    let end = line[start..].find('\'')? + start;
    Some(line[start..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICES: &str = "List of devices attached\n\
        127.0.0.1:58526\tdevice\n\
        192.168.1.20:5555\toffline\n\
        emulator-5554\tunauthorized\n";

    #[test]
    fn online_device_is_detected() {
        assert!(device_is_online(DEVICES, "127.0.0.1:58526"));
        assert!(device_is_online(DEVICES, " 127.0.0.1:58526 "));
    }

    #[test]
    fn offline_or_missing_device_is_not_online() {
        assert!(!device_is_online(DEVICES, "192.168.1.20:5555"));
        assert!(!device_is_online(DEVICES, "emulator-5554"));
        assert!(!device_is_online(DEVICES, "127.0.0.1"));
        assert!(!device_is_online("", "127.0.0.1:58526"));
    }

    #[test]
    fn connect_failure_text_is_recognized() {
        assert!(connect_failed(
            "failed to connect to '127.0.0.1:58526': Connection refused"
        ));
        assert!(connect_failed("cannot connect to 10.0.0.2:5555: No route to host"));
        assert!(!connect_failed("connected to 127.0.0.1:58526"));
        assert!(!connect_failed("already connected to 127.0.0.1:58526"));
    }

    #[test]
    fn listed_packages_with_and_without_names() {
        let output = "package:/data/app/~~abc==/org.mozilla.firefox-xyz==/base.apk=org.mozilla.firefox\n\
            package:/data/app/com.termux-1/base.apk\n\
            package:/system/priv-app/Foo/Foo.apk=com.foo\n";
        let listed = parse_listed_packages(output);
        assert_eq!(listed.len(), 2);
        assert_eq!(
            listed[0].apk_path,
            "/data/app/~~abc==/org.mozilla.firefox-xyz==/base.apk"
        );
        assert_eq!(listed[0].package_name.as_deref(), Some("org.mozilla.firefox"));
        assert_eq!(listed[1].apk_path, "/data/app/com.termux-1/base.apk");
        assert_eq!(listed[1].package_name, None);
    }

    #[test]
    fn package_listed_requires_exact_match() {
        let output = "package:com.example.app\npackage:com.example.app.debug\n";
        assert!(package_listed(output, "com.example.app"));
        assert!(!package_listed(output, "com.example"));
    }

    #[test]
    fn badging_extracts_identity_and_label() {
        let output = "package: name='org.example.notes' versionCode='42' versionName='2.1.0' platformBuildVersionName='13'\n\
            sdkVersion:'24'\n\
            application-label:'Notes'\n\
            application-label-de:'Notizen'\n";
        let badging = parse_badging(output).unwrap();
        assert_eq!(badging.package_name, "org.example.notes");
        assert_eq!(badging.version_code, "42");
        assert_eq!(badging.version_name, "2.1.0");
        assert_eq!(badging.label, "Notes");
    }

    #[test]
    fn badging_without_package_line_is_none() {
        assert_eq!(parse_badging("ERROR: dump failed because no AndroidManifest.xml found"), None);
    }

    #[test]
    fn dumpsys_versions() {
        let output = "Packages:\n  Package [org.example.notes] (1a2b3c):\n    versionCode=42 minSdk=24 targetSdk=33\n    versionName=2.1.0\n";
        let (name, code) = parse_dumpsys_versions(output);
        assert_eq!(name.as_deref(), Some("2.1.0"));
        assert_eq!(code.as_deref(), Some("42"));
    }

    #[test]
    fn listing_contains_whole_lines_only() {
        let output = "aapt-arm-pie\nsomething-else\n";
        assert!(listing_contains(output, "aapt-arm-pie"));
        assert!(!listing_contains(output, "aapt"));
    }
}
