use shared_types::*;
use std::fs;
use std::path::PathBuf;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for the dashboard
    let mut types = Vec::new();

    // Customer types
    types.push(clean_type(CustomerRecord::export_to_string()?));
    types.push(clean_type(CustomerStatus::export_to_string()?));
    types.push(clean_type(CallStatus::export_to_string()?));
    types.push(clean_type(BulkCreateResponse::export_to_string()?));

    // Roster page types
    types.push(clean_type(RosterPage::export_to_string()?));
    types.push(clean_type(TotalCount::export_to_string()?));
    types.push(clean_type(CountConfidence::export_to_string()?));
    types.push(clean_type(ImportSummary::export_to_string()?));

    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("../dashboard/src/api-types"));
    fs::create_dir_all(&output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    // Everything lands in one file, so cross-type imports are dropped along with the banner.
    let filtered: Vec<&str> = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
