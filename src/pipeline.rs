use log::info;

use crate::{
    clean::{self, CleanOptions, CleanReport},
    dataset::Dataset,
    error::PipelineResult,
    normalize::{HeaderNormalizer, RenameReport},
    schema::SynonymTable,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub rename: RenameReport,
    pub clean: CleanReport,
}

/// Normalizes headers, then cleans. Cleaning relies on canonical labels, so
/// the order is fixed here rather than left to callers.
pub struct Pipeline<'a> {
    normalizer: HeaderNormalizer<'a>,
    options: CleanOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(synonyms: &'a SynonymTable, options: CleanOptions) -> Self {
        Self {
            normalizer: HeaderNormalizer::new(synonyms),
            options,
        }
    }

    pub fn run(&self, mut dataset: Dataset) -> PipelineResult<(Dataset, PipelineReport)> {
        let rename = self.normalizer.map_columns(&mut dataset);
        info!(
            "Normalized {} header(s), {} unrecognized, {} collision(s)",
            rename.renames.len(),
            rename.unrecognized.len(),
            rename.collisions.len()
        );
        let clean = clean::clean_data(&mut dataset, &self.options)?;
        info!(
            "Cleaned {} row(s): {} cell(s) filled, profit {}",
            dataset.row_count(),
            clean.cells_filled(),
            if clean.profit_derived {
                "derived"
            } else {
                "not derived"
            }
        );
        Ok((dataset, PipelineReport { rename, clean }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, ColumnData};

    #[test]
    fn run_normalizes_before_cleaning() {
        let synonyms = SynonymTable::builtin().expect("table");
        let pipeline = Pipeline::new(&synonyms, CleanOptions::default());
        let dataset = Dataset::new(vec![
            Column::text("brand", vec![Some("Tata"), None]),
            Column::number("revenue", vec![Some(100.0), Some(200.0)]),
            Column::number("cost", vec![Some(30.0), None]),
        ])
        .expect("dataset");

        let (cleaned, report) = pipeline.run(dataset).expect("run");
        assert_eq!(
            cleaned.headers(),
            vec!["Manufacturer", "RevenueINR", "OperatingCostINR", "ProfitINR"]
        );
        assert_eq!(cleaned.render_row(1), vec!["Unknown", "200", "30", "170"]);
        assert!(report.clean.profit_derived);
        assert_eq!(report.rename.renames.len(), 3);
    }

    #[test]
    fn run_reports_malformed_declared_numbers() {
        let synonyms = SynonymTable::builtin().expect("table");
        let pipeline = Pipeline::new(&synonyms, CleanOptions::default());
        let dataset = Dataset::new(vec![Column::new(
            "Battery",
            ColumnData::Text(vec![Some("large".into())]),
        )])
        .expect("dataset");
        assert!(pipeline.run(dataset).is_err());
    }

    #[test]
    fn run_rejects_infinite_battery_values() {
        let synonyms = SynonymTable::builtin().expect("table");
        let pipeline = Pipeline::new(&synonyms, CleanOptions::default());
        let dataset = Dataset::from_records(
            &["battery".to_string()],
            &[vec!["40".into()], vec!["inf".into()], vec!["".into()]],
        )
        .expect("dataset");
        let err = pipeline.run(dataset).unwrap_err();
        assert!(matches!(
            err,
            crate::error::PipelineError::MalformedNumber { ref column, row: 3, .. }
                if column == "BatterykWh"
        ));
    }
}
