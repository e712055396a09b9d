use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::requirements::{RequirementScope, StaffingRequirement};

#[derive(Debug)]
pub enum RequirementsImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { row: usize, detail: String },
}

impl std::fmt::Display for RequirementsImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequirementsImportError::Io(err) => {
                write!(f, "failed to read requirements export: {}", err)
            }
            RequirementsImportError::Csv(err) => write!(f, "invalid requirements CSV data: {}", err),
            RequirementsImportError::InvalidRow { row, detail } => {
                write!(f, "requirements row {} rejected: {}", row, detail)
            }
        }
    }
}

impl std::error::Error for RequirementsImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequirementsImportError::Io(err) => Some(err),
            RequirementsImportError::Csv(err) => Some(err),
            RequirementsImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for RequirementsImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RequirementsImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Imports weekly staffing-requirement rows from a manager-exported CSV
/// (`Scope,Date,Min Staff,Max Staff`). Rows are validated up front; a bad
/// row rejects the whole file so a partial import never reaches the store.
pub struct RequirementsCsvImporter;

impl RequirementsCsvImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<StaffingRequirement>, RequirementsImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<StaffingRequirement>, RequirementsImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut requirements = Vec::new();

        for (index, record) in csv_reader.deserialize::<RequirementRow>().enumerate() {
            let row_number = index + 2;
            let row = record?;
            requirements.push(row.into_requirement(row_number)?);
        }

        Ok(requirements)
    }
}

#[derive(Debug, Deserialize)]
struct RequirementRow {
    #[serde(rename = "Scope")]
    scope: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Min Staff")]
    min_staff: String,
    #[serde(rename = "Max Staff", default, deserialize_with = "empty_string_as_none")]
    max_staff: Option<String>,
}

impl RequirementRow {
    fn into_requirement(self, row: usize) -> Result<StaffingRequirement, RequirementsImportError> {
        let invalid = |detail: String| RequirementsImportError::InvalidRow { row, detail };

        if self.scope.is_empty() {
            return Err(invalid("scope must not be empty".to_string()));
        }
        let scope = RequirementScope::from_name(&self.scope);

        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|err| invalid(format!("date '{}' is not YYYY-MM-DD ({err})", self.date)))?;

        let min_staff: u32 = self
            .min_staff
            .parse()
            .map_err(|_| invalid(format!("min staff '{}' is not a count", self.min_staff)))?;

        let max_staff = self
            .max_staff
            .as_deref()
            .map(|raw| {
                raw.parse::<u32>()
                    .map_err(|_| invalid(format!("max staff '{raw}' is not a count")))
            })
            .transpose()?;

        if let Some(max) = max_staff {
            if max < min_staff {
                return Err(invalid(format!(
                    "max staff {max} is below min staff {min_staff}"
                )));
            }
        }

        Ok(StaffingRequirement {
            scope,
            date,
            min_staff,
            max_staff,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::rota::domain::StaffRole;
    use std::io::Cursor;

    #[test]
    fn importer_parses_scopes_and_optional_max() {
        let csv = "Scope,Date,Min Staff,Max Staff\n\
bartender,2024-06-01,3,5\n\
all_staff,2024-06-01,8,\n";
        let rows = RequirementsCsvImporter::from_reader(Cursor::new(csv)).expect("import succeeds");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].scope, RequirementScope::Role(StaffRole::Bartender));
        assert_eq!(rows[0].max_staff, Some(5));
        assert_eq!(rows[1].scope, RequirementScope::AllStaff);
        assert_eq!(rows[1].max_staff, None);
    }

    #[test]
    fn importer_rejects_inverted_range_with_row_number() {
        let csv = "Scope,Date,Min Staff,Max Staff\nbartender,2024-06-01,3,2\n";
        let error =
            RequirementsCsvImporter::from_reader(Cursor::new(csv)).expect_err("range rejected");

        match error {
            RequirementsImportError::InvalidRow { row, .. } => assert_eq!(row, 2),
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn importer_rejects_unparseable_dates() {
        let csv = "Scope,Date,Min Staff,Max Staff\nwaiter,June 1st,2,\n";
        let error =
            RequirementsCsvImporter::from_reader(Cursor::new(csv)).expect_err("date rejected");
        assert!(matches!(
            error,
            RequirementsImportError::InvalidRow { row: 2, .. }
        ));
    }

    #[test]
    fn importer_from_path_propagates_io_errors() {
        let error = RequirementsCsvImporter::from_path("./does-not-exist.csv")
            .expect_err("expected io error");
        assert!(matches!(error, RequirementsImportError::Io(_)));
    }
}
