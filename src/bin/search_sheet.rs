// src/bin/search_sheet.rs
//
// Fetch the live sheets and show how each strategy sees an identifier.
//
//   search_sheet <id> [technical|highschool]

use anyhow::{bail, Context, Result};
use diploma_verify::{
    config::Config,
    fetch::{HttpSheetSource, SheetSource},
    normalize_identifier,
    sheet::{parse_sheet, HeaderMap},
    DegreeType,
};
use tracing_subscriber::{fmt, EnvFilter};

const PREVIEW_LINES: usize = 5;

fn parse_degree(arg: &str) -> Result<DegreeType> {
    match arg.to_ascii_lowercase().as_str() {
        "technical" | "tecnicos" => Ok(DegreeType::Technical),
        "highschool" | "high_school" | "bachilleres" => Ok(DegreeType::HighSchool),
        other => bail!("unknown sheet '{}', expected technical or highschool", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(raw_id) = args.next() else {
        bail!("usage: search_sheet <id> [technical|highschool]");
    };
    let only = args.next().as_deref().map(parse_degree).transpose()?;

    let target = normalize_identifier(&raw_id)?;
    let config = Config::load()?;
    let source = HttpSheetSource::new(&config).context("building HTTP client")?;

    println!("searching for {}", target);

    for sheet_config in &config.sheets {
        if only.is_some_and(|d| d != sheet_config.degree_type) {
            continue;
        }
        println!("\n=== {} (gid {}) ===", sheet_config.name, sheet_config.gid);

        let text = match source.fetch(sheet_config).await {
            Ok(text) => text,
            Err(e) => {
                println!("fetch failed: {}", e);
                continue;
            }
        };
        println!("{} bytes", text.len());
        for line in text.lines().take(PREVIEW_LINES) {
            println!("  | {}", line);
        }

        let sheet = parse_sheet(&text);
        println!("{} rows after tokenizing", sheet.len());

        match HeaderMap::build(&sheet, sheet_config) {
            Some(map) => println!("header at row {}: {:?}", map.row_index(), map.headers()),
            None => println!("no header row found"),
        }

        for &strategy in &config.strategies {
            let Some(candidates) = strategy.classifier().candidates(&sheet, sheet_config) else {
                println!("[{}] not applicable", strategy);
                continue;
            };
            let hit = candidates.iter().find(|c| c.document_number == target);
            println!(
                "[{}] {} candidate rows, match: {}",
                strategy,
                candidates.len(),
                hit.map_or("none".to_string(), |c| format!("{:?}", c))
            );

            // rows whose document merely contains the target are a common confusion
            let near: Vec<_> = candidates
                .iter()
                .filter(|c| c.document_number != target && c.document_number.contains(&target))
                .map(|c| (c.row, c.document_number.as_str()))
                .take(PREVIEW_LINES)
                .collect();
            if !near.is_empty() {
                println!("[{}] partial (ignored): {:?}", strategy, near);
            }
        }
    }

    Ok(())
}
