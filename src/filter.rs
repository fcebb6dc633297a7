//! Segment and manufacturer selection.
//!
//! Each criterion is an equality set over one categorical column. A criterion
//! left as `None` accepts every row; an empty set accepts none. Criteria are
//! AND-combined.

use std::collections::BTreeSet;

use crate::{
    dataset::Dataset,
    error::PipelineResult,
    schema::CanonicalField,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionFilter {
    pub segments: Option<BTreeSet<String>>,
    pub manufacturers: Option<BTreeSet<String>>,
}

fn value_set(values: &[String]) -> Option<BTreeSet<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().map(|v| v.trim().to_string()).collect())
    }
}

impl SelectionFilter {
    /// Builds a filter from repeated CLI values; no values means no
    /// restriction on that column.
    pub fn from_values(segments: &[String], manufacturers: &[String]) -> Self {
        Self {
            segments: value_set(segments),
            manufacturers: value_set(manufacturers),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.segments.is_none() && self.manufacturers.is_none()
    }

    /// Row mask for `dataset`. Both filter columns must exist even when the
    /// filter is unrestricted, since every downstream view groups by them.
    pub fn mask(&self, dataset: &Dataset) -> PipelineResult<Vec<bool>> {
        let criteria = [
            (CanonicalField::Segment, &self.segments),
            (CanonicalField::Manufacturer, &self.manufacturers),
        ];
        let mut mask = vec![true; dataset.row_count()];
        for (field, accepted) in criteria {
            let column = dataset.require(field.name())?;
            let Some(accepted) = accepted else {
                continue;
            };
            for (row, keep) in mask.iter_mut().enumerate() {
                if *keep {
                    *keep = accepted.contains(&*column.data.render(row));
                }
            }
        }
        Ok(mask)
    }

    pub fn apply(&self, dataset: &Dataset) -> PipelineResult<Dataset> {
        let mask = self.mask(dataset)?;
        Ok(dataset.select_rows(&mask))
    }
}

/// Distinct, sorted values of a categorical column.
pub fn distinct_values(dataset: &Dataset, field: CanonicalField) -> PipelineResult<Vec<String>> {
    let column = dataset.require(field.name())?;
    let values = (0..dataset.row_count())
        .map(|row| column.data.render(row).into_owned())
        .collect::<BTreeSet<_>>();
    Ok(values.into_iter().collect())
}
