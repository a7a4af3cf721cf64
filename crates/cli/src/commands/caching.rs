//! Caching opportunity listing

use std::path::PathBuf;

use analyzer_lib::caching::CachingOpportunity;
use analyzer_lib::{AnalyzerConfig, AnalyzerMetrics};
use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use super::analyze_in_background;
use crate::output::{
    format_ms, format_percent, format_usd, print_heading, print_json, print_table, OutputFormat,
};

#[derive(Tabled)]
struct OpportunityRow {
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Requests")]
    requests: u64,
    #[tabled(rename = "Hit Rate")]
    hit_rate: String,
    #[tabled(rename = "Saved")]
    saved: u64,
    #[tabled(rename = "Cost Savings")]
    cost_savings: String,
    #[tabled(rename = "Time Saved")]
    time_saved: String,
    #[tabled(rename = "TTL")]
    ttl: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

impl From<&CachingOpportunity> for OpportunityRow {
    fn from(o: &CachingOpportunity) -> Self {
        Self {
            endpoint: o.endpoint.clone(),
            requests: o.current_requests,
            hit_rate: format_percent(o.potential_cache_hit_rate),
            saved: o.potential_requests_saved,
            cost_savings: format_usd(o.estimated_cost_savings_usd),
            time_saved: format_ms(o.estimated_time_saved_ms),
            ttl: format!("{}m", o.recommended_ttl_minutes),
            confidence: o.recommendation_confidence.to_string(),
        }
    }
}

/// Show caching opportunities for one log file
pub async fn show_caching(
    input: PathBuf,
    config: &AnalyzerConfig,
    metrics: Option<AnalyzerMetrics>,
    format: OutputFormat,
) -> Result<()> {
    let report = analyze_in_background(input, config.clone(), metrics).await?;
    let caching = report.caching_opportunities;

    match format {
        OutputFormat::Json => print_json(&caching)?,
        OutputFormat::Table => {
            print_heading("Caching Opportunities");
            print_table(
                caching
                    .caching_opportunities
                    .iter()
                    .map(OpportunityRow::from)
                    .collect(),
                "No caching opportunities found",
            );

            let totals = caching.total_potential_savings;
            if totals.requests_eliminated > 0 {
                println!();
                println!(
                    "{} {} requests, {}, {}",
                    "Potential Savings:".bold(),
                    totals.requests_eliminated,
                    format_usd(totals.cost_savings_usd).green().bold(),
                    format_ms(totals.performance_improvement_ms)
                );
            }
        }
    }

    Ok(())
}
