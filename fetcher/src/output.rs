//! Output formatting for module listings.
//!
//! Renders modules as a two-column table for people or as a JSON array for
//! scripts, plus the summary and download messages printed by the CLI.

use serde::Serialize;
use std::path::Path;

use crate::manifest::Module;

/// Format modules as a `kernel` / `path` table, one row per module.
///
/// Column widths follow the longest cell so rows stay aligned.
///
/// # Examples
///
/// ```
/// use limefetch::output::format_table;
///
/// assert_eq!(format_table(&[]), "");
/// ```
#[must_use]
pub fn format_table(modules: &[Module]) -> String {
    let rows: Vec<(String, String)> = modules
        .iter()
        .map(|module| {
            (
                format!("kernel: {}", module.version),
                format!("path: /modules/{}", module.name),
            )
        })
        .collect();
    let width = rows.iter().map(|(kernel, _)| kernel.len()).max().unwrap_or(0);

    rows.iter()
        .map(|(kernel, path)| format!("{kernel:<width$}  {path}\n"))
        .collect()
}

/// Summary line printed after `list`.
#[must_use]
pub fn list_summary(count: usize, base_url: &str) -> String {
    format!("Found {count} LiME modules in {base_url}")
}

/// Summary line printed after `find`.
#[must_use]
pub fn find_summary(count: usize, query: &str, base_url: &str) -> String {
    format!("Matched {count} LiME modules for '{query}' in {base_url}")
}

/// Message printed after a successful `fetch`.
#[must_use]
pub fn download_message(path: &Path) -> String {
    format!("module downloaded to {}", path.display())
}

/// Format modules as a pretty-printed JSON array.
///
/// # Examples
///
/// ```
/// use limefetch::output::format_json;
///
/// assert_eq!(format_json(&[]), "[]");
/// ```
#[must_use]
pub fn format_json(modules: &[Module]) -> String {
    let entries: Vec<ModuleJson<'_>> = modules.iter().map(ModuleJson::from).collect();
    serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_owned())
}

/// JSON view of a module record.
#[derive(Debug, Serialize)]
pub struct ModuleJson<'a> {
    /// Module file name.
    pub name: &'a str,
    /// Kernel version.
    pub version: &'a str,
    /// Target architecture.
    pub arch: &'a str,
    /// Platform tag.
    pub platform: &'a str,
    /// Declared SHA-256 of the artifact.
    pub checksum: &'a str,
    /// Repository-relative artifact location.
    pub location: &'a str,
}

impl<'a> From<&'a Module> for ModuleJson<'a> {
    fn from(module: &'a Module) -> Self {
        Self {
            name: &module.name,
            version: &module.version,
            arch: &module.arch,
            platform: &module.platform,
            checksum: &module.checksum,
            location: &module.location.href,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Location;

    fn module(version: &str) -> Module {
        Module {
            kind: "lime".to_owned(),
            name: format!("lime-{version}.ko"),
            arch: "x86_64".to_owned(),
            checksum: "8fd9d9c765bac68763d4741d4726e9b120bffe1aaa7df7949aa94b37f7a6b6f8".to_owned(),
            version: version.to_owned(),
            packager: "lime-compiler".to_owned(),
            location: Location::new(format!("modules/lime-{version}.ko")),
            signature: Location::new(format!("modules/lime-{version}.ko.sig")),
            platform: "linux".to_owned(),
        }
    }

    #[test]
    fn table_aligns_path_column() {
        let table = format_table(&[module("4.2.0-17-generic"), module("4.4.10-22.54.amzn1.x86_64")]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(
            lines,
            [
                "kernel: 4.2.0-17-generic           path: /modules/lime-4.2.0-17-generic.ko",
                "kernel: 4.4.10-22.54.amzn1.x86_64  path: /modules/lime-4.4.10-22.54.amzn1.x86_64.ko",
            ]
        );
    }

    #[test]
    fn summaries_name_count_and_repository() {
        assert_eq!(
            list_summary(2, "http://repo.test/"),
            "Found 2 LiME modules in http://repo.test/"
        );
        assert_eq!(
            find_summary(1, "4.2.0*", "http://repo.test/"),
            "Matched 1 LiME modules for '4.2.0*' in http://repo.test/"
        );
    }

    #[test]
    fn download_message_names_path() {
        assert_eq!(
            download_message(Path::new("/tmp/lime-4.2.0-17-generic.ko")),
            "module downloaded to /tmp/lime-4.2.0-17-generic.ko"
        );
    }

    #[test]
    fn json_lists_module_fields() {
        let json = format_json(&[module("4.2.0-17-generic")]);
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
        let entry = parsed.get(0).expect("one entry");
        assert_eq!(entry["version"], "4.2.0-17-generic");
        assert_eq!(entry["name"], "lime-4.2.0-17-generic.ko");
        assert_eq!(entry["location"], "modules/lime-4.2.0-17-generic.ko");
    }
}
