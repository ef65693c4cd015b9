//! Harness tree and CMake listings
//!
//! Layout: `<out>/<style dir>/<group>/<stem>.cpp`, one `CMakeLists.txt` per
//! directory. The style level adds each group with `add_subdirectory`, each group
//! registers its harnesses with `add_<style dir>_fuzz_target`.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hf_engine::TargetStyle;
use hf_engine::names::unique_name;
use serde::Serialize;

use crate::batch::GeneratedHarness;

const LISTING: &str = "CMakeLists.txt";
const UNGROUPED: &str = "misc";

/// A harness file on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenHarness {
    pub api: String,
    pub group: String,
    pub path: PathBuf,
    pub slots: usize,
}

/// Writer for one style's subtree
pub struct OutputTree {
    root: PathBuf,
    style: TargetStyle,
}

impl OutputTree {
    pub fn new(out: &Path, style: TargetStyle) -> Self {
        Self {
            root: out.join(style.dir_name()),
            style,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write every harness plus the listings of this style
    pub fn write(&self, harnesses: &[GeneratedHarness]) -> Result<Vec<WrittenHarness>> {
        fs::create_dir_all(&self.root).with_context(|| format!("Failed to create {}", self.root.display()))?;

        let mut seen = HashSet::new();
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut written = Vec::with_capacity(harnesses.len());

        for harness in harnesses {
            let group = group_dir(&harness.group);
            let stem = unique_name(&file_stem(self.style, &group, &harness.api), &mut seen);

            let dir = self.root.join(&group);
            fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
            let path = dir.join(format!("{stem}.cpp"));
            fs::write(&path, &harness.text).with_context(|| format!("Failed to write {}", path.display()))?;
            log::debug!("Wrote {}", path.display());

            groups.entry(group.clone()).or_default().push(stem);
            written.push(WrittenHarness {
                api: harness.api.clone(),
                group,
                path,
                slots: harness.slots,
            });
        }

        for (group, stems) in &groups {
            write_listing(&self.root.join(group), &target_listing(self.style, stems))?;
        }
        write_listing(&self.root, &subdirectory_listing(groups.keys()))?;

        Ok(written)
    }
}

/// Top-level listing adding one subdirectory per style
pub fn write_root_listing(out: &Path, styles: &[TargetStyle]) -> Result<()> {
    write_listing(out, &subdirectory_listing(styles.iter().map(|s| s.dir_name())))
}

fn write_listing(dir: &Path, content: &str) -> Result<()> {
    let path = dir.join(LISTING);
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
}

fn subdirectory_listing<I, S>(dirs: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    dirs.into_iter()
        .map(|d| format!("add_subdirectory({})\n", d.as_ref()))
        .collect()
}

fn target_listing(style: TargetStyle, stems: &[String]) -> String {
    stems
        .iter()
        .map(|stem| format!("add_{}_fuzz_target({stem})\n", style.dir_name()))
        .collect()
}

/// Identifier-safe form of a qualified name
pub fn sanitize(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn group_dir(group: &str) -> String {
    match sanitize(group) {
        s if s.is_empty() => UNGROUPED.to_string(),
        s => s,
    }
}

/// Target names are global in CMake, so the stem carries style and group
fn file_stem(style: TargetStyle, group: &str, api: &str) -> String {
    sanitize(&format!("{}_{group}_{api}", style.dir_name()))
}
