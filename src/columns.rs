//! Canonical column listing.
//!
//! Renders every canonical field with its kind and the normalized header
//! spellings that resolve to it.

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::{
    cli::ColumnsArgs,
    schema::{CanonicalField, FieldKind, SynonymTable},
    table::{self, Align},
};

#[derive(Debug, Serialize)]
struct ColumnEntry<'a> {
    name: &'static str,
    kind: FieldKind,
    aliases: Vec<&'a str>,
}

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let synonyms = SynonymTable::builtin().context("Building synonym table")?;
    let entries = CanonicalField::ALL
        .into_iter()
        .map(|field| ColumnEntry {
            name: field.name(),
            kind: field.kind(),
            aliases: synonyms.aliases_for(field),
        })
        .collect::<Vec<_>>();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("Serializing schema")?
        );
    } else {
        let rows = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                vec![
                    (idx + 1).to_string(),
                    entry.name.to_string(),
                    entry.kind.to_string(),
                    entry.aliases.join(", "),
                ]
            })
            .collect::<Vec<_>>();
        let headers = vec![
            "#".to_string(),
            "name".to_string(),
            "kind".to_string(),
            "aliases".to_string(),
        ];
        table::print_table(
            &headers,
            &rows,
            &[Align::Right, Align::Left, Align::Left, Align::Left],
        );
    }
    info!(
        "Listed {} canonical column(s) and {} alias(es)",
        entries.len(),
        synonyms.len()
    );
    Ok(())
}
