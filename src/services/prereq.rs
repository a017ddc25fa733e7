//! Checks that git, npm and node are available before anything is asked.

use regex::Regex;
use semver::{Version, VersionReq};
use std::process::Command;
use std::sync::LazyLock;
use thiserror::Error;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v?(\d+\.\d+\.\d+)").expect("Invalid version regex"));

/// An external program the installer shells out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tool {
    pub name: &'static str,
    /// `semver` requirement, or `None` when any version will do.
    pub requirement: Option<&'static str>,
}

pub const REQUIRED_TOOLS: &[Tool] = &[
    Tool {
        name: "git",
        requirement: None,
    },
    Tool {
        name: "npm",
        requirement: Some(">=5.7.1"),
    },
    Tool {
        name: "node",
        requirement: Some(">=8.9.4"),
    },
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PrereqError {
    #[error("`{tool}` was not found. Make sure it is installed and on your $PATH")]
    Missing { tool: &'static str },

    #[error("Could not read a version from `{tool} --version` output: {output:?}")]
    UnknownVersion { tool: &'static str, output: String },

    #[error("`{tool}` {found} is too old, {required} is required. Check your $PATH")]
    TooOld {
        tool: &'static str,
        found: Version,
        required: VersionReq,
    },
}

/// First `X.Y.Z` in a version banner, with or without a leading `v`.
///
/// `"git version 2.34.1"` gives `2.34.1`, `"v8.9.4"` gives `8.9.4`.
pub fn extract_version(output: &str) -> Option<Version> {
    VERSION_RE
        .captures(output)
        .and_then(|cap| cap.get(1))
        .and_then(|m| Version::parse(m.as_str()).ok())
}

/// Judge a tool from its `--version` output; `None` means it couldn't run.
pub fn evaluate(tool: &Tool, output: Option<&str>) -> Result<Option<Version>, PrereqError> {
    let output = output.ok_or(PrereqError::Missing { tool: tool.name })?;

    let Some(requirement) = tool.requirement else {
        return Ok(extract_version(output));
    };

    let found = extract_version(output).ok_or_else(|| PrereqError::UnknownVersion {
        tool: tool.name,
        output: output.trim().to_string(),
    })?;

    // Requirements are constants, covered by test_requirements_parse
    let required = VersionReq::parse(requirement).unwrap_or(VersionReq::STAR);
    if required.matches(&found) {
        Ok(Some(found))
    } else {
        Err(PrereqError::TooOld {
            tool: tool.name,
            found,
            required,
        })
    }
}

fn version_output(name: &str) -> Option<String> {
    let output = Command::new(name).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

/// Run `--version` for every required tool. Stops at the first failure.
pub fn check_prerequisites() -> Result<(), PrereqError> {
    for tool in REQUIRED_TOOLS {
        let output = version_output(tool.name);
        let version = evaluate(tool, output.as_deref())?;
        tracing::info!("Found {} {:?}", tool.name, version.map(|v| v.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str) -> &'static Tool {
        REQUIRED_TOOLS.iter().find(|t| t.name == name).unwrap()
    }

    #[test]
    fn test_requirements_parse() {
        for tool in REQUIRED_TOOLS {
            if let Some(requirement) = tool.requirement {
                assert!(VersionReq::parse(requirement).is_ok(), "{}", requirement);
            }
        }
    }

    #[test]
    fn test_extract_version() {
        assert_eq!(extract_version("git version 2.34.1\n"), Some(Version::new(2, 34, 1)));
        assert_eq!(extract_version("v8.9.4\n"), Some(Version::new(8, 9, 4)));
        assert_eq!(extract_version("no digits"), None);
    }

    #[test]
    fn test_node_version_gate() {
        assert!(evaluate(tool("node"), Some("v8.9.4")).is_ok());
        assert!(evaluate(tool("node"), Some("v20.11.0")).is_ok());

        let err = evaluate(tool("node"), Some("v8.9.3")).unwrap_err();
        assert!(matches!(err, PrereqError::TooOld { tool: "node", .. }));
        assert!(err.to_string().contains("8.9.3"));
    }

    #[test]
    fn test_npm_version_gate() {
        assert!(evaluate(tool("npm"), Some("5.7.1\n")).is_ok());
        assert!(evaluate(tool("npm"), Some("5.6.0\n")).is_err());
    }

    #[test]
    fn test_git_needs_only_presence() {
        assert!(evaluate(tool("git"), Some("git version 2.39.2.windows.1")).is_ok());
        assert_eq!(
            evaluate(tool("git"), None),
            Err(PrereqError::Missing { tool: "git" })
        );
    }

    #[test]
    fn test_unreadable_version() {
        let err = evaluate(tool("npm"), Some("garbage")).unwrap_err();
        assert!(matches!(err, PrereqError::UnknownVersion { .. }));
    }
}
