//! Per-item merge: planning and writing.
//!
//! [`plan_item`] does every read, match and resolution step for one item
//! without touching the output tree. [`write_plan`] then copies the planned
//! assets and writes the bundle document. The batch driver runs the claim pass
//! for duplicate base ids between the two.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use crate::merge::assets::ICONS_DIR;
use crate::merge::record::non_empty;
use crate::merge::{
    copy_asset, load_color_ids, match_variant, resolve_icon, resolve_renders, select_base,
    variant_id, AssetCopy, BatchError, CopyPolicy, CopyStatus, MatchedVariant, MergeContext,
    MergeError, MergedItemBundle, MetadataIndex, MetadataRecord, RawItem, RenderRef, RenderTable,
    SkipReason, VariantEntry,
};

/// Everything needed to write one bundle.
#[derive(Debug, Clone)]
pub struct ItemPlan {
    /// Raw classname of the item
    pub classname: String,
    /// The assembled bundle document
    pub bundle: MergedItemBundle,
    /// Files to copy, unique by destination
    pub copies: Vec<AssetCopy>,
    /// Warnings collected while planning
    pub warnings: Vec<String>,
}

impl ItemPlan {
    /// Base id of the planned bundle.
    pub fn base_id(&self) -> &str {
        &self.bundle.base_id
    }
}

/// Outcome of planning one item.
#[derive(Debug, Clone)]
pub enum Planned {
    /// A bundle is ready to write
    Ready(ItemPlan),
    /// No bundle for this item
    Skipped {
        reason: SkipReason,
        base_id: Option<String>,
        warnings: Vec<String>,
    },
}

impl Planned {
    fn skipped(reason: SkipReason) -> Self {
        Planned::Skipped { reason, base_id: None, warnings: Vec::new() }
    }
}

/// Plan the bundle for one raw item.
///
/// Checks run in a fixed order: metadata candidates, rendered images, render
/// table. Expected absences become [`Planned::Skipped`]; malformed inputs are
/// returned as errors.
pub fn plan_item(index: &MetadataIndex, item: &RawItem) -> Result<Planned, MergeError> {
    let classname = item.classname.as_str();

    if !index.has_candidates(classname) {
        return Ok(Planned::skipped(SkipReason::NoMetadata));
    }
    if !item.has_renders() {
        return Ok(Planned::skipped(SkipReason::NoRenders));
    }
    let render_data = item.render_data_path();
    if !render_data.is_file() {
        return Ok(Planned::skipped(SkipReason::NoRenderData));
    }
    let table = RenderTable::load(&render_data)?;

    let colors = load_color_ids(&item.visualization_path());
    log::debug!(
        "{}: colors [{}]",
        classname,
        colors.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ")
    );

    let mut warnings = Vec::new();
    let mut matched = Vec::new();
    let mut unusable = 0;
    for color in colors {
        let Some(source) = match_variant(index, classname, &color) else {
            log::debug!("{}: no metadata for color {}", classname, color);
            continue;
        };
        match MetadataRecord::load(source)? {
            Some(record) => {
                matched.push(MatchedVariant { color, record, source: source.to_path_buf() })
            }
            None => {
                unusable += 1;
                warnings.push(format!("{} has no usable hotelData object", source.display()));
            }
        }
    }

    if matched.is_empty() {
        let reason =
            if unusable > 0 { SkipReason::BadMetadata } else { SkipReason::NoValidVariants };
        return Ok(Planned::Skipped { reason, base_id: None, warnings });
    }

    let Some(base) = select_base(classname, &matched) else {
        return Ok(Planned::Skipped { reason: SkipReason::NoValidVariants, base_id: None, warnings });
    };
    if !is_plain_dir_name(&base.base_id) {
        let source = matched.first().map(|m| m.source.clone()).unwrap_or_default();
        return Err(MergeError::InvalidBaseId { base_id: base.base_id, path: source });
    }

    let mut bundle = MergedItemBundle::new(&base);
    let mut copies = Vec::new();
    let mut planned_dests = BTreeSet::new();

    for variant in &matched {
        let renders = resolve_renders(item, &table, &variant.color);
        if renders.is_empty() {
            log::debug!("{}: color {} has no resolvable renders", classname, variant.color);
            continue;
        }

        let icon = resolve_icon(item, &variant.color).and_then(|path| {
            let name = path.file_name()?.to_str()?.to_string();
            Some(AssetCopy { relative: format!("{}/{}", ICONS_DIR, name), source: path })
        });
        let icon_ref = icon.as_ref().map(|copy| copy.relative.clone());

        let mut variant_copies: Vec<AssetCopy> = icon.into_iter().collect();
        let mut refs = BTreeMap::new();
        for render in renders {
            let relative = render.relative_path();
            refs.insert(render.rotation, RenderRef { path: relative.clone(), offset: render.offset });
            variant_copies.push(AssetCopy { source: render.source, relative });
        }

        let entry = VariantEntry {
            id: variant_id(&base.base_id, &variant.color),
            name: non_empty(variant.record.name.as_deref())
                .unwrap_or_else(|| variant.record.declared_classname(classname))
                .to_string(),
            description: variant.record.description.clone().unwrap_or_default(),
            icon: icon_ref,
            renders: refs,
        };

        if bundle.add_variant(variant.color.clone(), entry) {
            for copy in variant_copies {
                if planned_dests.insert(copy.relative.clone()) {
                    copies.push(copy);
                }
            }
        }
    }

    if !bundle.is_emittable() {
        return Ok(Planned::Skipped {
            reason: SkipReason::NoValidVariants,
            base_id: Some(base.base_id),
            warnings,
        });
    }

    Ok(Planned::Ready(ItemPlan { classname: classname.to_string(), bundle, copies, warnings }))
}

/// Copy a plan's assets and write its `data.json`.
///
/// Returns warnings raised while writing (stale assets replaced).
pub fn write_plan(
    plan: &ItemPlan,
    bundle_dir: &Path,
    policy: CopyPolicy,
) -> Result<Vec<String>, MergeError> {
    let mut warnings = Vec::new();
    for copy in &plan.copies {
        if copy_asset(copy, bundle_dir, policy)? == CopyStatus::Replaced {
            warnings.push(format!("replaced stale asset {}", copy.relative));
        }
    }
    let path = plan.bundle.write(bundle_dir)?;
    log::debug!("{}: wrote {}", plan.classname, path.display());
    Ok(warnings)
}

/// Plan a single item by classname, without writing anything.
///
/// Checks the same preconditions as a batch run.
pub fn inspect_item(ctx: &MergeContext, classname: &str) -> Result<Planned, BatchError> {
    let raw_dir = ctx.raw_dir();
    if !raw_dir.is_dir() {
        return Err(BatchError::MissingRawRoot(raw_dir));
    }
    let index = MetadataIndex::build(&ctx.metadata_dir(), &ctx.files().metadata)?;
    let item = find_raw_item(ctx, classname)
        .ok_or_else(|| BatchError::UnknownItem(classname.to_string()))?;
    plan_item(&index, &item)
        .map_err(|source| BatchError::Item { classname: classname.to_string(), source })
}

/// Locate the raw item directory for `classname` under the raw root.
pub fn find_raw_item(ctx: &MergeContext, classname: &str) -> Option<RawItem> {
    if !is_plain_dir_name(classname) {
        return None;
    }
    let dir: PathBuf = ctx.raw_dir().join(classname);
    if dir.is_dir() {
        RawItem::new(dir, ctx.files().clone())
    } else {
        None
    }
}

fn is_plain_dir_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}
