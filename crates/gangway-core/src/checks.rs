//! The individual compliance checks.
//!
//! Each check is a pure function over already-fetched data, returning either a
//! reportable pass or a `ValidationFailure`. The pipeline decides how a
//! failure affects the remaining steps; the checks themselves only classify.

use crate::manifest::{ManifestDocument, VersionEntry, MANIFEST_FILE};
use crate::schema::{ManifestSchema, SchemaIssue};
use crate::types::{ChangedFile, CheckOutcome, CheckResult, FailureKind, ValidationFailure};

/// Check names as published to the hosting platform, in pipeline order.
pub const FOLDER_CHECK: &str = "Folder";
pub const MAINTAINER_CHECK: &str = "Maintainer";
pub const MANIFEST_CHECK: &str = "Manifest";
pub const FILES_CHECK: &str = "Files";

/// Parent folder of a repository-relative path, `None` at the root.
fn parent_folder(path: &str) -> Option<&str> {
    match path.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => Some(dir),
        _ => None,
    }
}

/// Verify every changed file resolves to one shared plugin folder and return
/// that folder.
///
/// A pull request touching the repository root, multiple folders, or no files
/// at all is rejected with a cancel failure: every downstream check depends
/// on a single folder.
pub fn check_folder(files: &[ChangedFile]) -> Result<(String, CheckResult), ValidationFailure> {
    let first = match files.first() {
        Some(file) => file,
        None => {
            return Err(ValidationFailure::fatal(
                FailureKind::FolderViolation,
                "Pull request not allowed",
                "Pull request does not change any files.",
            ))
        }
    };

    let folder = match parent_folder(&first.path) {
        Some(folder) => folder,
        None => {
            return Err(ValidationFailure::fatal(
                FailureKind::FolderViolation,
                "Pull request not allowed",
                "You are not allowed to create a pull request in this directory.",
            ))
        }
    };

    for file in files {
        if parent_folder(&file.path) != Some(folder) {
            return Err(ValidationFailure::fatal(
                FailureKind::FolderViolation,
                "Pull request not allowed",
                "You are not allowed to create a pull request in different folders at the same time.",
            ));
        }
    }

    Ok((
        folder.to_string(),
        CheckResult::success(FOLDER_CHECK, "Plugin folder is correct"),
    ))
}

/// Verify the pull request author matches the plugin's declared maintainer.
///
/// A plugin without a pre-existing manifest has no maintainer to enforce, so
/// authorization always passes for new plugins.
pub fn check_maintainer(existing: Option<&ManifestDocument>, author_login: &str) -> CheckOutcome {
    if let Some(manifest) = existing {
        if manifest.maintainer != author_login {
            return Err(ValidationFailure::fatal(
                FailureKind::MaintainerViolation,
                "Pull request not allowed",
                "You are not allowed to create a pull request for this plugin.",
            ));
        }
    }

    Ok(CheckResult::success(MAINTAINER_CHECK, "Pull request allowed"))
}

/// Validate the proposed manifest against the fixed schema, collecting every
/// violation rather than stopping at the first.
pub fn check_manifest_schema(schema: &ManifestSchema, manifest: &serde_json::Value) -> CheckOutcome {
    let issues = schema.validate(manifest);
    if issues.is_empty() {
        return Ok(CheckResult::success(MANIFEST_CHECK, "Manifest file is valid"));
    }

    Err(ValidationFailure::advisory(
        FailureKind::SchemaViolation,
        format!("{} issues found", issues.len()),
        format_issues(&issues),
    ))
}

fn format_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(|issue| {
            let path = if issue.path.is_empty() {
                "/"
            } else {
                issue.path.as_str()
            };
            format!("- {}: {}", path, issue.message)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reconcile the manifest's declared readme/image assets against the files
/// actually present in the plugin folder.
///
/// Only declared-but-absent assets are reported. Extra files the manifest
/// does not reference are out of scope for this check.
pub fn check_folder_files(versions: &[VersionEntry], folder_files: &[String]) -> CheckOutcome {
    let mut readmes: Vec<&str> = Vec::new();
    let mut images: Vec<&str> = Vec::new();

    for entry in versions {
        if let Some(readme) = entry.readme.as_deref() {
            if !readmes.contains(&readme) {
                readmes.push(readme);
            }
        }
        if let Some(image) = entry.image.as_deref() {
            if !images.contains(&image) {
                images.push(image);
            }
        }
    }

    for name in folder_files {
        if name == MANIFEST_FILE {
            continue;
        }
        if let Some(i) = readmes.iter().position(|candidate| candidate == name) {
            readmes.remove(i);
            continue;
        }
        if let Some(i) = images.iter().position(|candidate| candidate == name) {
            images.remove(i);
        }
    }

    if readmes.is_empty() && images.is_empty() {
        return Ok(CheckResult::success(FILES_CHECK, "All files ok"));
    }

    let missing: Vec<&str> = readmes.into_iter().chain(images).collect();
    Err(ValidationFailure::advisory(
        FailureKind::AssetMissing,
        "Undefined files found",
        missing.join(", "),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(paths: &[&str]) -> Vec<ChangedFile> {
        paths.iter().map(|path| ChangedFile::new(*path)).collect()
    }

    fn entry(readme: Option<&str>, image: Option<&str>) -> VersionEntry {
        VersionEntry {
            version: "1.0.0".to_string(),
            readme: readme.map(str::to_string),
            image: image.map(str::to_string),
            hash: None,
        }
    }

    fn names(files: &[&str]) -> Vec<String> {
        files.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_folder_single_folder_passes() {
        let files = changed(&["acme/widget/manifest.json", "acme/widget/README.md"]);
        let (folder, result) = check_folder(&files).expect("check failed");
        assert_eq!(folder, "acme/widget");
        assert!(result.passed());
    }

    #[test]
    fn test_folder_root_file_rejected() {
        let failure = check_folder(&changed(&["README.md"])).unwrap_err();
        assert_eq!(failure.kind, FailureKind::FolderViolation);
        assert!(failure.cancel);
    }

    #[test]
    fn test_folder_multiple_folders_rejected() {
        let files = changed(&["acme/widget/manifest.json", "acme/other/manifest.json"]);
        let failure = check_folder(&files).unwrap_err();
        assert_eq!(failure.kind, FailureKind::FolderViolation);
        assert!(failure.cancel);
    }

    #[test]
    fn test_folder_nested_subfolder_rejected() {
        let files = changed(&["acme/widget/manifest.json", "acme/widget/docs/guide.md"]);
        assert!(check_folder(&files).is_err());
    }

    #[test]
    fn test_folder_empty_change_set_rejected() {
        let failure = check_folder(&[]).unwrap_err();
        assert_eq!(failure.kind, FailureKind::FolderViolation);
        assert!(failure.cancel);
    }

    #[test]
    fn test_maintainer_new_plugin_always_allowed() {
        let result = check_maintainer(None, "anyone").expect("check failed");
        assert!(result.passed());
    }

    #[test]
    fn test_maintainer_match_allowed() {
        let manifest = ManifestDocument {
            maintainer: "acme-dev".to_string(),
            versions: Vec::new(),
        };
        assert!(check_maintainer(Some(&manifest), "acme-dev").is_ok());
    }

    #[test]
    fn test_maintainer_mismatch_cancels() {
        let manifest = ManifestDocument {
            maintainer: "alice".to_string(),
            versions: Vec::new(),
        };
        let failure = check_maintainer(Some(&manifest), "bob").unwrap_err();
        assert_eq!(failure.kind, FailureKind::MaintainerViolation);
        assert!(failure.cancel);
    }

    #[test]
    fn test_schema_violations_all_listed() {
        let schema = ManifestSchema::compile().expect("schema must compile");
        let manifest = serde_json::json!({
            "maintainer": 42,
            "versions": [{ "readme": "README.md" }],
            "homepage": "nope"
        });
        let failure = check_manifest_schema(&schema, &manifest).unwrap_err();
        assert_eq!(failure.kind, FailureKind::SchemaViolation);
        assert!(!failure.cancel);
        assert!(failure.title.ends_with("issues found"));
        assert!(failure.summary.lines().count() >= 3);
    }

    #[test]
    fn test_schema_valid_manifest_passes() {
        let schema = ManifestSchema::compile().expect("schema must compile");
        let manifest = serde_json::json!({
            "maintainer": "acme-dev",
            "versions": [{ "version": "1.0.0" }]
        });
        let result = check_manifest_schema(&schema, &manifest).expect("check failed");
        assert_eq!(result.title, "Manifest file is valid");
    }

    #[test]
    fn test_files_all_declared_assets_present() {
        let versions = vec![entry(Some("README.md"), Some("logo.png"))];
        let files = names(&["manifest.json", "README.md", "logo.png"]);
        let result = check_folder_files(&versions, &files).expect("check failed");
        assert_eq!(result.title, "All files ok");
    }

    #[test]
    fn test_files_missing_asset_reported() {
        let versions = vec![entry(Some("README.md"), Some("logo.png"))];
        let files = names(&["manifest.json", "README.md"]);
        let failure = check_folder_files(&versions, &files).unwrap_err();
        assert_eq!(failure.kind, FailureKind::AssetMissing);
        assert!(!failure.cancel);
        assert_eq!(failure.summary, "logo.png");
    }

    #[test]
    fn test_files_missing_readme_reported() {
        let versions = vec![entry(Some("README.md"), None)];
        let failure = check_folder_files(&versions, &names(&["manifest.json"])).unwrap_err();
        assert_eq!(failure.summary, "README.md");
    }

    #[test]
    fn test_files_duplicate_declarations_deduplicated() {
        // Two versions sharing one readme need a single physical file.
        let versions = vec![
            entry(Some("README.md"), None),
            entry(Some("README.md"), None),
        ];
        let files = names(&["manifest.json", "README.md"]);
        assert!(check_folder_files(&versions, &files).is_ok());
    }

    #[test]
    fn test_files_extra_untracked_files_ignored() {
        let versions = vec![entry(Some("README.md"), None)];
        let files = names(&["manifest.json", "README.md", "CHANGELOG.md"]);
        assert!(check_folder_files(&versions, &files).is_ok());
    }

    #[test]
    fn test_files_manifest_itself_never_counts_as_asset() {
        let versions = vec![entry(Some("manifest.json"), None)];
        let failure = check_folder_files(&versions, &names(&["manifest.json"])).unwrap_err();
        assert_eq!(failure.summary, "manifest.json");
    }

    #[test]
    fn test_files_no_versions_trivially_ok() {
        assert!(check_folder_files(&[], &names(&["manifest.json"])).is_ok());
    }
}
