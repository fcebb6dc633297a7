//! Header normalization.
//!
//! Renames recognized headers to their canonical labels using an injected
//! [`SynonymTable`]. Unrecognized headers are left alone. When several
//! headers resolve to the same canonical field, the last one in column order
//! takes the canonical label and the earlier ones keep their original names.

use std::collections::HashMap;

use log::{debug, warn};

use crate::{
    dataset::Dataset,
    schema::{CanonicalField, SynonymTable},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: String,
    pub to: CanonicalField,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub field: CanonicalField,
    /// Header that received the canonical label.
    pub winner: String,
    /// Headers left under their original names.
    pub shadowed: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReport {
    pub renames: Vec<Rename>,
    pub collisions: Vec<Collision>,
    pub unrecognized: Vec<String>,
}

pub struct HeaderNormalizer<'a> {
    synonyms: &'a SynonymTable,
}

impl<'a> HeaderNormalizer<'a> {
    pub fn new(synonyms: &'a SynonymTable) -> Self {
        Self { synonyms }
    }

    /// Computes the output header for every input header without touching
    /// the dataset.
    pub fn plan(&self, headers: &[String]) -> (Vec<String>, RenameReport) {
        let mut claimed: HashMap<CanonicalField, Vec<usize>> = HashMap::new();
        let mut report = RenameReport::default();
        for (idx, header) in headers.iter().enumerate() {
            match self.synonyms.resolve(header) {
                Some(field) => claimed.entry(field).or_default().push(idx),
                None => report.unrecognized.push(header.clone()),
            }
        }

        let mut output = headers.to_vec();
        let mut fields = claimed.into_iter().collect::<Vec<_>>();
        fields.sort_by_key(|(field, _)| *field);
        for (field, positions) in fields {
            let Some((&winner, shadowed)) = positions.split_last() else {
                continue;
            };
            output[winner] = field.name().to_string();
            if headers[winner] != field.name() {
                report.renames.push(Rename {
                    from: headers[winner].clone(),
                    to: field,
                });
            }
            if !shadowed.is_empty() {
                let shadowed = shadowed
                    .iter()
                    .map(|idx| headers[*idx].clone())
                    .collect::<Vec<_>>();
                warn!(
                    "Columns {:?} and '{}' all map to '{}'; keeping the last one",
                    shadowed, headers[winner], field
                );
                report.collisions.push(Collision {
                    field,
                    winner: headers[winner].clone(),
                    shadowed,
                });
            }
        }
        report.renames.sort_by_key(|rename| {
            headers
                .iter()
                .position(|h| *h == rename.from)
                .unwrap_or(usize::MAX)
        });
        (output, report)
    }

    /// Renames recognized columns of `dataset` in place.
    pub fn map_columns(&self, dataset: &mut Dataset) -> RenameReport {
        let (output, report) = self.plan(&dataset.headers());
        for (column, name) in dataset.columns_mut().iter_mut().zip(output) {
            if column.name != name {
                debug!("Renaming column '{}' -> '{}'", column.name, name);
                column.name = name;
            }
        }
        report
    }
}
