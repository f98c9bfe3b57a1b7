use cli_table::{print_stdout, Table, WithTitle};

use crate::types::CliError;

#[derive(Table, Clone)]
pub(crate) struct FieldRow {
    #[table(title = "Field")]
    field: String,
    #[table(title = "Value")]
    value: String,
}

impl FieldRow {
    pub(crate) fn new(field: &str, value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn optional(field: &str, value: Option<&str>) -> Self {
        Self::new(field, value.unwrap_or("-"))
    }
}

pub(crate) fn print_rows(rows: Vec<FieldRow>) -> Result<(), CliError> {
    print_stdout(rows.with_title()).map_err(|err| CliError::OutputError(err.to_string()))
}
