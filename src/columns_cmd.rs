//! The `columns` command: prints the parsed column declarations.

use anyhow::Result;
use log::info;

use crate::{cli::ColumnsArgs, columns::ColumnSet, config::Settings, table};

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let settings = Settings::load(&args.hints)?;
    let columns = settings.column_set()?;
    if columns.is_empty() {
        info!("No column declarations given");
        return Ok(());
    }
    table::print_table(&["#", "sheet", "name", "type"], &declaration_rows(&columns));
    Ok(())
}

fn declaration_rows(columns: &ColumnSet) -> Vec<Vec<String>> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            vec![
                (idx + 1).to_string(),
                if column.sheet.is_empty() {
                    "*".to_string()
                } else {
                    column.sheet.clone()
                },
                column.name.clone(),
                column.datatype.to_string(),
            ]
        })
        .collect()
}
