//! TOML fixture loading for token snapshot tests.
//!
//! A fixture file holds any number of `[[case]]` tables:
//!
//! ```toml
//! [[case]]
//! name = "entity-in-text"
//! input = "a &amp; b"
//! tokens = ['CHAR kind=data raw="a &amp; b"']
//! parsed = ['CHAR text="a & b"']
//! ```
//!
//! `scripting` defaults to `false`, `status` to `active`. `parsed` is
//! optional; when absent only the raw snapshot is checked.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum FixtureStatus {
    #[default]
    Active,
    Xfail,
    Skip,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureCase {
    pub name: String,
    pub input: String,
    #[serde(default)]
    pub scripting: bool,
    #[serde(default)]
    pub status: FixtureStatus,
    #[serde(default)]
    pub reason: Option<String>,
    pub tokens: Vec<String>,
    #[serde(default)]
    pub parsed: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureFile {
    #[serde(default)]
    case: Vec<FixtureCase>,
}

/// A case together with the file it came from.
#[derive(Clone, Debug)]
pub struct LoadedFixture {
    /// `<file stem>/<case name>`.
    pub id: String,
    pub path: PathBuf,
    pub case: FixtureCase,
}

/// Load every `*.toml` file in `dir`, in file name order.
///
/// Panics on unreadable files, malformed TOML, duplicate ids, and xfail cases
/// without a reason.
pub fn load_fixture_dir(dir: &Path) -> Vec<LoadedFixture> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap_or_else(|err| panic!("failed to read fixture dir {dir:?}: {err}"))
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    let mut out: Vec<LoadedFixture> = Vec::new();
    for path in paths {
        for case in parse_fixture_file(&path) {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let id = format!("{stem}/{}", case.name);
            if out.iter().any(|f| f.id == id) {
                panic!("duplicate fixture id '{id}' in {path:?}");
            }
            if case.status == FixtureStatus::Xfail && case.reason.is_none() {
                panic!("fixture '{id}' is xfail without a reason");
            }
            out.push(LoadedFixture {
                id,
                path: path.clone(),
                case,
            });
        }
    }
    out
}

pub fn parse_fixture_file(path: &Path) -> Vec<FixtureCase> {
    let text = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read fixture {path:?}: {err}"));
    parse_fixture_str(&text).unwrap_or_else(|err| panic!("invalid fixture {path:?}: {err}"))
}

pub fn parse_fixture_str(text: &str) -> Result<Vec<FixtureCase>, toml::de::Error> {
    let file: FixtureFile = toml::from_str(text)?;
    Ok(file.case)
}
