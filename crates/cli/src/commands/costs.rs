//! Cost-related CLI commands

use std::path::PathBuf;

use analyzer_lib::{AnalyzerConfig, AnalyzerMetrics};
use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use super::analyze_in_background;
use crate::output::{format_usd, print_heading, print_json, print_table, OutputFormat};

/// Row for cost by endpoint table
#[derive(Tabled)]
struct EndpointCostRow {
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Requests")]
    requests: u64,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Per Request")]
    per_request: String,
}

/// Show the cost breakdown of one log file
pub async fn show_costs(
    input: PathBuf,
    config: &AnalyzerConfig,
    metrics: Option<AnalyzerMetrics>,
    format: OutputFormat,
) -> Result<()> {
    let report = analyze_in_background(input, config.clone(), metrics).await?;
    let costs = report.cost_analysis;

    match format {
        OutputFormat::Json => print_json(&costs)?,
        OutputFormat::Table => {
            print_heading("Cost Analysis");
            println!("Requests:               {}", report.summary.total_requests);
            println!(
                "{}  {}",
                "Total Cost:".bold(),
                format_usd(costs.total_cost_usd).cyan().bold()
            );
            println!();

            println!("{}", "Breakdown".bold());
            println!("{}", "-".repeat(50));
            let breakdown = costs.cost_breakdown;
            println!("Requests:               {}", format_usd(breakdown.request_costs));
            println!("Execution:              {}", format_usd(breakdown.execution_costs));
            println!("Memory:                 {}", format_usd(breakdown.memory_costs));
            println!();

            println!(
                "{} {}",
                "Optimization Potential:".bold(),
                format_usd(costs.optimization_potential_usd).green().bold()
            );
            println!();

            println!("{}", "Cost by Endpoint".bold());
            println!("{}", "-".repeat(50));
            let rows = costs
                .cost_by_endpoint
                .iter()
                .map(|c| EndpointCostRow {
                    endpoint: c.endpoint.clone(),
                    requests: c.request_count,
                    total: format_usd(c.total_cost),
                    per_request: format!("${:.6}", c.cost_per_request),
                })
                .collect();
            print_table(rows, "No endpoints found");
        }
    }

    Ok(())
}
