//! Cascading option lists for the region and surface selectors.

use std::collections::BTreeSet;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::types::{Dimension, Selection, SelectionCriteria, ALL};

/// Sorted distinct values of `target`, optionally restricted to rows where the fixed
/// dimension equals the fixed value. `"all"` always comes first so a selector can be
/// reset even when nothing else is available.
pub fn resolve_options(
    dataset: &Dataset,
    target: Dimension,
    fixed: Option<(Dimension, &Selection)>,
) -> Result<Vec<String>> {
    dataset.require(target.column())?;
    let constraint = match fixed {
        Some((dim, Selection::Only(value))) => {
            dataset.require(dim.column())?;
            Some((dim, value.as_str()))
        }
        _ => None,
    };

    let values: BTreeSet<&str> = dataset
        .rows()
        .iter()
        .filter(|row| match constraint {
            Some((dim, value)) => dim.value(row) == Some(value),
            None => true,
        })
        .filter_map(|row| target.value(row))
        .collect();

    let mut out = Vec::with_capacity(values.len() + 1);
    out.push(ALL.to_string());
    out.extend(values.into_iter().map(str::to_string));
    Ok(out)
}

/// Option lists for all four selectors given the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeOptions {
    pub province_regions: Vec<String>,
    pub sub_regions: Vec<String>,
    pub villages: Vec<String>,
    pub surface_types: Vec<String>,
}

/// Each level is constrained by its parent's selection only; surface type is an
/// independent axis.
pub fn cascade_options(dataset: &Dataset, criteria: &SelectionCriteria) -> Result<CascadeOptions> {
    Ok(CascadeOptions {
        province_regions: resolve_options(dataset, Dimension::ProvinceRegion, None)?,
        sub_regions: resolve_options(
            dataset,
            Dimension::SubRegion,
            Some((Dimension::ProvinceRegion, &criteria.province_region)),
        )?,
        villages: resolve_options(
            dataset,
            Dimension::Village,
            Some((Dimension::SubRegion, &criteria.sub_region)),
        )?,
        surface_types: resolve_options(dataset, Dimension::SurfaceType, None)?,
    })
}
