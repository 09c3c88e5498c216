//! Asset location and copying.
//!
//! Every lookup here is an ordered list of candidate names; the first one that
//! exists wins:
//!
//! | asset  | candidates                                                              |
//! |--------|-------------------------------------------------------------------------|
//! | icon   | `{cn}_icon_{color}.png`, `{cn}_icon.png`                                |
//! | render | `{cn}_dir_{d}_{color}_no_sd`, `{cn}_dir_{d}_no_sd` (keys of the table) |
//!
//! Editor rotation slots `0..4` map to raw directions through
//! [`EDITOR_ROTATION_MAP`]. A slot with no resolvable render is left out.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::merge::{ColorVariantId, MergeError, RawItem, RenderOffset, RenderTable};

/// Raw direction id for each editor rotation slot.
pub const EDITOR_ROTATION_MAP: [u8; 4] = [2, 4, 6, 0];

/// Bundle subfolder for icons.
pub const ICONS_DIR: &str = "icons";

/// Bundle subfolder for renders.
pub const RENDERS_DIR: &str = "renders";

/// What to do when a copy destination already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CopyPolicy {
    /// Keep the existing file (first writer wins)
    #[default]
    SkipExisting,
    /// Replace the existing file when its SHA-256 differs from the source
    Checksum,
    /// Always copy
    Overwrite,
}

/// Icon file names for a color, in lookup order.
pub fn icon_candidates(classname: &str, color: &ColorVariantId) -> [String; 2] {
    [format!("{}_icon_{}.png", classname, color), format!("{}_icon.png", classname)]
}

/// Locate the icon for a color variant.
pub fn resolve_icon(item: &RawItem, color: &ColorVariantId) -> Option<PathBuf> {
    icon_candidates(&item.classname, color)
        .into_iter()
        .map(|name| item.dir.join(name))
        .find(|path| path.is_file())
}

/// Render keys for a direction and color, in lookup order.
pub fn render_key_candidates(classname: &str, direction: u8, color: &ColorVariantId) -> [String; 2] {
    [
        format!("{}_dir_{}_{}_no_sd", classname, direction, color),
        format!("{}_dir_{}_no_sd", classname, direction),
    ]
}

/// First render key for a direction and color present in the offset table.
pub fn resolve_render_key(
    table: &RenderTable,
    classname: &str,
    direction: u8,
    color: &ColorVariantId,
) -> Option<String> {
    render_key_candidates(classname, direction, color)
        .into_iter()
        .find(|key| table.contains(key))
}

/// A render located on disk for one rotation slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRender {
    /// Editor rotation slot (0-3)
    pub rotation: u8,
    /// Raw render key
    pub render_key: String,
    /// Source image
    pub source: PathBuf,
    /// Offset copied verbatim from the table
    pub offset: RenderOffset,
}

impl ResolvedRender {
    /// Destination path relative to the bundle root.
    pub fn relative_path(&self) -> String {
        format!("{}/{}.png", RENDERS_DIR, self.render_key)
    }
}

/// Resolve every rotation slot of a color variant.
///
/// Slots whose key is missing from the table, or whose image is missing on
/// disk, are omitted.
pub fn resolve_renders(
    item: &RawItem,
    table: &RenderTable,
    color: &ColorVariantId,
) -> Vec<ResolvedRender> {
    let mut renders = Vec::new();
    for (rotation, direction) in EDITOR_ROTATION_MAP.iter().enumerate() {
        let Some(render_key) = resolve_render_key(table, &item.classname, *direction, color) else {
            continue;
        };
        let Some(offset) = table.get(&render_key) else {
            continue;
        };
        let source = item.render_image(&render_key);
        if !source.is_file() {
            log::debug!("Render image missing for {}: {}", item.classname, source.display());
            continue;
        }
        renders.push(ResolvedRender { rotation: rotation as u8, render_key, source, offset });
    }
    renders
}

/// One planned file copy into a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCopy {
    /// Source file
    pub source: PathBuf,
    /// Destination relative to the bundle root (`icons/...` or `renders/...`)
    pub relative: String,
}

/// Result of copying one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    /// The destination did not exist, or the policy forced a copy
    Copied,
    /// The destination was kept as is
    Unchanged,
    /// A stale destination was replaced
    Replaced,
}

/// Copy an asset into a bundle directory according to `policy`.
pub fn copy_asset(
    copy: &AssetCopy,
    bundle_dir: &Path,
    policy: CopyPolicy,
) -> Result<CopyStatus, MergeError> {
    let dest = bundle_dir.join(&copy.relative);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| MergeError::io(parent, e))?;
    }

    let status = if dest.exists() {
        match policy {
            CopyPolicy::SkipExisting => return Ok(CopyStatus::Unchanged),
            CopyPolicy::Checksum => {
                let source_digest =
                    file_digest(&copy.source).map_err(|e| MergeError::io(&copy.source, e))?;
                let dest_digest = file_digest(&dest).map_err(|e| MergeError::io(&dest, e))?;
                if source_digest == dest_digest {
                    return Ok(CopyStatus::Unchanged);
                }
                CopyStatus::Replaced
            }
            CopyPolicy::Overwrite => CopyStatus::Copied,
        }
    } else {
        CopyStatus::Copied
    };

    fs::copy(&copy.source, &dest).map_err(|e| MergeError::io(&copy.source, e))?;
    Ok(status)
}

/// SHA-256 digest of a file's contents.
pub fn file_digest(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilesConfig;
    use tempfile::TempDir;

    fn color(raw: &str) -> ColorVariantId {
        ColorVariantId::parse(raw).unwrap()
    }

    fn raw_item(temp: &TempDir, classname: &str) -> RawItem {
        let dir = temp.path().join(classname);
        fs::create_dir_all(dir.join("rendered")).unwrap();
        RawItem::new(dir, FilesConfig::default()).unwrap()
    }

    fn touch(path: &Path, contents: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn table(keys: &[(&str, i64, i64)]) -> RenderTable {
        keys.iter().map(|(k, x, y)| (k.to_string(), RenderOffset { x: *x, y: *y })).collect()
    }

    #[test]
    fn test_icon_prefers_colored() {
        let temp = TempDir::new().unwrap();
        let item = raw_item(&temp, "lamp");
        touch(&item.dir.join("lamp_icon.png"), b"generic");
        touch(&item.dir.join("lamp_icon_2.png"), b"blue");

        assert!(resolve_icon(&item, &color("2")).unwrap().ends_with("lamp_icon_2.png"));
        assert!(resolve_icon(&item, &color("3")).unwrap().ends_with("lamp_icon.png"));
    }

    #[test]
    fn test_icon_missing() {
        let temp = TempDir::new().unwrap();
        let item = raw_item(&temp, "lamp");
        assert!(resolve_icon(&item, &color("0")).is_none());
    }

    #[test]
    fn test_render_key_fallback() {
        let t = table(&[("lamp_dir_2_1_no_sd", 0, 0), ("lamp_dir_4_no_sd", 0, 0)]);

        assert_eq!(resolve_render_key(&t, "lamp", 2, &color("1")).unwrap(), "lamp_dir_2_1_no_sd");
        assert_eq!(resolve_render_key(&t, "lamp", 4, &color("1")).unwrap(), "lamp_dir_4_no_sd");
        assert!(resolve_render_key(&t, "lamp", 6, &color("1")).is_none());
        // Colored key of another color is never used
        assert!(resolve_render_key(&t, "lamp", 2, &color("0")).is_none());
    }

    #[test]
    fn test_rotation_mapping_with_colorless_fallback() {
        let temp = TempDir::new().unwrap();
        let item = raw_item(&temp, "lamp");
        let t = table(&[("lamp_dir_2_no_sd", 10, 20), ("lamp_dir_0_no_sd", -5, 7)]);
        touch(&item.render_image("lamp_dir_2_no_sd"), b"a");
        touch(&item.render_image("lamp_dir_0_no_sd"), b"b");

        let renders = resolve_renders(&item, &t, &color("0"));
        let rotations: Vec<u8> = renders.iter().map(|r| r.rotation).collect();
        assert_eq!(rotations, vec![0, 3]);
        assert_eq!(renders[0].offset, RenderOffset { x: 10, y: 20 });
        assert_eq!(renders[1].offset, RenderOffset { x: -5, y: 7 });
        assert_eq!(renders[1].relative_path(), "renders/lamp_dir_0_no_sd.png");
    }

    #[test]
    fn test_render_omitted_when_image_missing() {
        let temp = TempDir::new().unwrap();
        let item = raw_item(&temp, "lamp");
        let t = table(&[("lamp_dir_2_0_no_sd", 1, 1), ("lamp_dir_4_0_no_sd", 2, 2)]);
        touch(&item.render_image("lamp_dir_4_0_no_sd"), b"x");

        let renders = resolve_renders(&item, &t, &color("0"));
        assert_eq!(renders.len(), 1);
        assert_eq!(renders[0].rotation, 1);
    }

    #[test]
    fn test_copy_skip_existing_keeps_first_writer() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src.png");
        touch(&source, b"new");
        let bundle = temp.path().join("bundle");
        touch(&bundle.join("icons/src.png"), b"old");

        let copy = AssetCopy { source, relative: "icons/src.png".to_string() };
        let status = copy_asset(&copy, &bundle, CopyPolicy::SkipExisting).unwrap();

        assert_eq!(status, CopyStatus::Unchanged);
        assert_eq!(fs::read(bundle.join("icons/src.png")).unwrap(), b"old");
    }

    #[test]
    fn test_copy_creates_destination() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src.png");
        touch(&source, b"data");
        let bundle = temp.path().join("bundle");

        let copy = AssetCopy { source, relative: "renders/a.png".to_string() };
        assert_eq!(copy_asset(&copy, &bundle, CopyPolicy::SkipExisting).unwrap(), CopyStatus::Copied);
        assert_eq!(fs::read(bundle.join("renders/a.png")).unwrap(), b"data");
    }

    #[test]
    fn test_copy_checksum_policy() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src.png");
        touch(&source, b"same");
        let bundle = temp.path().join("bundle");
        touch(&bundle.join("renders/a.png"), b"same");

        let copy = AssetCopy { source: source.clone(), relative: "renders/a.png".to_string() };
        assert_eq!(copy_asset(&copy, &bundle, CopyPolicy::Checksum).unwrap(), CopyStatus::Unchanged);

        touch(&source, b"changed");
        assert_eq!(copy_asset(&copy, &bundle, CopyPolicy::Checksum).unwrap(), CopyStatus::Replaced);
        assert_eq!(fs::read(bundle.join("renders/a.png")).unwrap(), b"changed");
    }

    #[test]
    fn test_copy_overwrite_policy() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src.png");
        touch(&source, b"new");
        let bundle = temp.path().join("bundle");
        touch(&bundle.join("icons/a.png"), b"old");

        let copy = AssetCopy { source, relative: "icons/a.png".to_string() };
        assert_eq!(copy_asset(&copy, &bundle, CopyPolicy::Overwrite).unwrap(), CopyStatus::Copied);
        assert_eq!(fs::read(bundle.join("icons/a.png")).unwrap(), b"new");
    }

    #[test]
    fn test_file_digest_differs() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        touch(&a, b"one");
        touch(&b, b"two");
        assert_ne!(file_digest(&a).unwrap(), file_digest(&b).unwrap());
        assert_eq!(file_digest(&a).unwrap().len(), 32);
    }
}
