// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ds_core::{Database, SyncOp};

use crate::cli::OutputFormat;
use crate::display::format_op_line;
use crate::error::Result;

use super::show::OpJson;
use super::{open_db, print_json};

pub fn run(output: OutputFormat) -> Result<()> {
    let (db, _, _) = open_db()?;
    let ops = run_impl(&db)?;

    match output {
        OutputFormat::Text => {
            if ops.is_empty() {
                println!("Queue is empty");
            }
            for op in &ops {
                println!("{}", format_op_line(op));
            }
        }
        OutputFormat::Id => {
            for op in &ops {
                println!("{}", op.id);
            }
        }
        OutputFormat::Json => {
            let ops: Vec<OpJson> = ops.iter().map(OpJson::from).collect();
            print_json(&ops)?;
        }
    }
    Ok(())
}

pub(crate) fn run_impl(db: &Database) -> Result<Vec<SyncOp>> {
    Ok(db.list_pending()?)
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
