//! Selection of rows by exact-match criteria.

use tracing::debug;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::types::SelectionCriteria;

/// Rows matching every active constraint of `criteria`, in source order.
///
/// Constraints are independent per-column equality predicates. A value that does not
/// occur in the data matches nothing. A constraint on a column the dataset does not
/// carry is a schema error.
pub fn apply_filter(dataset: &Dataset, criteria: &SelectionCriteria) -> Result<Dataset> {
    let constraints = criteria.constraints();
    for (dim, _) in &constraints {
        dataset.require(dim.column())?;
    }

    let rows = dataset
        .rows()
        .iter()
        .filter(|row| {
            constraints
                .iter()
                .all(|(dim, value)| dim.value(row) == Some(*value))
        })
        .cloned()
        .collect::<Vec<_>>();

    debug!(
        criteria = %criteria,
        matched = rows.len(),
        of = dataset.len(),
        "applied filter"
    );
    Ok(dataset.derive(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, RoadSegment, Selection};

    fn seg(kab: &str, kec: &str, desa: &str, surface: &str) -> RoadSegment {
        RoadSegment {
            province_region: Some(kab.into()),
            sub_region: Some(kec.into()),
            village: Some(desa.into()),
            surface_type: Some(surface.into()),
            ..Default::default()
        }
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            seg("Bogor", "Ciawi", "Bendungan", "Aspal"),
            seg("Bogor", "Ciawi", "Citapen", "Beton"),
            seg("Bogor", "Cisarua", "Tugu", "Aspal"),
            seg("Garut", "Cibatu", "Wanakerta", "Aspal"),
        ])
    }

    #[test]
    fn unconstrained_keeps_everything() {
        let ds = sample();
        let out = apply_filter(&ds, &SelectionCriteria::all()).unwrap();
        assert_eq!(out.rows(), ds.rows());
    }

    #[test]
    fn constraints_are_conjunctive_and_ordered() {
        let ds = sample();
        let criteria = SelectionCriteria {
            province_region: Selection::parse("Bogor"),
            surface_type: Selection::parse("Aspal"),
            ..Default::default()
        };
        let out = apply_filter(&ds, &criteria).unwrap();
        let villages: Vec<_> = out.rows().iter().map(|r| r.village.clone().unwrap()).collect();
        assert_eq!(villages, vec!["Bendungan", "Tugu"]);
    }

    #[test]
    fn stale_value_matches_nothing() {
        let ds = sample();
        let criteria = SelectionCriteria {
            sub_region: Selection::parse("Nowhere"),
            ..Default::default()
        };
        assert!(apply_filter(&ds, &criteria).unwrap().is_empty());
    }

    #[test]
    fn does_not_mutate_source() {
        let ds = sample();
        let before = ds.rows().to_vec();
        let criteria = SelectionCriteria {
            village: Selection::parse("Tugu"),
            ..Default::default()
        };
        let _ = apply_filter(&ds, &criteria).unwrap();
        assert_eq!(ds.rows(), before.as_slice());
    }

    #[test]
    fn missing_column_fails_loudly() {
        let ds = sample().project(&[Column::ProvinceRegion, Column::Village]).unwrap();
        let criteria = SelectionCriteria {
            surface_type: Selection::parse("Aspal"),
            ..Default::default()
        };
        let err = apply_filter(&ds, &criteria).unwrap_err();
        assert!(err.is_schema_error());

        // Inactive constraints on absent columns are fine.
        assert_eq!(apply_filter(&ds, &SelectionCriteria::all()).unwrap().len(), 4);
    }
}
