//! Markdown summary generation
//!
//! This module generates a human-readable markdown report of the stored
//! catalog: the latest run and product counts per make and category.

use crate::output::summary::{CatalogReport, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generates a markdown summary from a catalog report
///
/// # Arguments
///
/// * `report` - The catalog report data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(report: &CatalogReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a catalog report as markdown
pub fn format_markdown_summary(report: &CatalogReport) -> String {
    let mut md = String::new();
    let stats = &report.statistics;

    md.push_str("# Parts-Crawler Catalog Summary\n\n");

    if let Some(run) = &report.run {
        md.push_str("## Latest Run\n\n");
        md.push_str(&format!("- **Run ID**: {}\n", run.id));
        md.push_str(&format!("- **Started**: {}\n", run.started_at));
        if let Some(finished) = &run.finished_at {
            md.push_str(&format!("- **Finished**: {}\n", finished));
        }
        if let Some(duration) = report.duration_seconds {
            md.push_str(&format!(
                "- **Duration**: {} seconds ({:.2} minutes)\n",
                duration,
                duration as f64 / 60.0
            ));
        }
        md.push_str(&format!("- **Status**: {}\n", run.status.to_db_string()));
        if let Some(reason) = &run.close_reason {
            md.push_str(&format!("- **Close Reason**: {}\n", reason));
        }
        md.push_str(&format!("- **Items Scraped**: {}\n", run.items_scraped));
        md.push_str(&format!("- **Config Hash**: {}\n\n", run.config_hash));
    }

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Total Products**: {}\n", stats.total_products));
    md.push_str(&format!("- **Makes**: {}\n", stats.products_by_make.len()));
    md.push_str(&format!(
        "- **Categories**: {}\n\n",
        stats.products_by_category.len()
    ));

    push_count_table(&mut md, "Products per Make", "Make", &stats.products_by_make);
    push_count_table(
        &mut md,
        "Products per Category",
        "Category",
        &stats.products_by_category,
    );

    md
}

fn push_count_table(md: &mut String, title: &str, column: &str, counts: &[(String, u64)]) {
    if counts.is_empty() {
        return;
    }

    md.push_str(&format!("## {}\n\n", title));
    md.push_str(&format!("| {} | Products |\n", column));
    md.push_str("|------|----------|\n");
    for (name, count) in counts {
        md.push_str(&format!("| {} | {} |\n", name, count));
    }
    md.push('\n');
}
