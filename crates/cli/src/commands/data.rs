//! Test data generation and fixture listing

use anyhow::Result;
use bookprobe_common::generate::{consistent_record, random_record};
use bookprobe_common::validate::precheck;
use bookprobe_common::{valid_record, CaseTable, FormRecord};
use clap::Args;
use serde::Serialize;

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args, Debug)]
pub struct DataArgs {
    /// Seed for reproducible records
    #[arg(long)]
    pub seed: Option<String>,

    /// Number of records
    #[arg(short, long, default_value = "1")]
    pub count: usize,

    /// List the fixture cases (optionally one group) instead
    #[arg(long, value_name = "GROUP", num_args = 0..=1, default_missing_value = "all")]
    pub cases: Option<String>,
}

#[derive(Serialize)]
pub struct RecordRow {
    #[serde(flatten)]
    pub record: FormRecord,
    pub locally_valid: bool,
}

impl From<FormRecord> for RecordRow {
    fn from(record: FormRecord) -> Self {
        let locally_valid = precheck(&record).iter().all(|c| c.valid);
        Self {
            record,
            locally_valid,
        }
    }
}

impl TableDisplay for RecordRow {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Phone", "Plate", "Mileage", "VIN", "Valid"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.record.name.clone(),
            self.record.phone.clone(),
            self.record.plate.clone(),
            self.record.mileage.clone(),
            self.record.vin.clone(),
            if self.locally_valid { "✓" } else { "✗" }.to_string(),
        ]
    }
}

#[derive(Serialize)]
pub struct CaseRow {
    pub group: String,
    pub name: String,
    pub expected: String,
}

impl TableDisplay for CaseRow {
    fn headers() -> Vec<&'static str> {
        vec!["Group", "Case", "Expected"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.group.clone(), self.name.clone(), self.expected.clone()]
    }
}

/// `count` records; seeded ones use `seed`, `seed-1`, `seed-2`, ...
pub fn records(seed: Option<&str>, count: usize) -> Vec<FormRecord> {
    (0..count)
        .map(|i| match seed {
            Some(seed) if i == 0 => consistent_record(seed),
            Some(seed) => consistent_record(&format!("{}-{}", seed, i)),
            None => random_record(&valid_record()),
        })
        .collect()
}

fn case_rows(table: &CaseTable, group: &str) -> Result<Vec<CaseRow>> {
    let cases: Vec<(&str, &bookprobe_common::TestCase)> = if group == "all" {
        table.all()
    } else {
        let name = CaseTable::GROUPS
            .into_iter()
            .find(|g| *g == group)
            .unwrap_or("unknown");
        table.group(group)?.iter().map(|c| (name, c)).collect()
    };
    Ok(cases
        .into_iter()
        .map(|(group, case)| CaseRow {
            group: group.to_string(),
            name: case.name.clone(),
            expected: case.expected.to_string(),
        })
        .collect())
}

pub fn execute(args: DataArgs, format: OutputFormat) -> Result<bool> {
    if let Some(group) = &args.cases {
        let rows = case_rows(&CaseTable::builtin(), group)?;
        print_list(&rows, format);
        return Ok(true);
    }

    let rows: Vec<RecordRow> = records(args.seed.as_deref(), args.count)
        .into_iter()
        .map(RecordRow::from)
        .collect();
    print_list(&rows, format);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_records_repeat() {
        assert_eq!(records(Some("test"), 3), records(Some("test"), 3));
        let seeded = records(Some("test"), 2);
        assert_ne!(seeded[0], seeded[1]);
    }

    #[test]
    fn test_random_records_locally_valid() {
        for record in records(None, 5) {
            assert!(RecordRow::from(record).locally_valid);
        }
    }

    #[test]
    fn test_case_rows_by_group() {
        let table = CaseTable::builtin();
        let all = case_rows(&table, "all").unwrap();
        assert_eq!(all.len(), table.len());

        let plates = case_rows(&table, "invalid_plates").unwrap();
        assert!(!plates.is_empty());
        assert!(plates.iter().all(|r| r.group == "invalid_plates"));

        assert!(case_rows(&table, "nope").is_err());
    }
}
