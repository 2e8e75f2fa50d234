use super::ui;
use crate::core::{FundAggregator, FundComposition, FundReturnSeries, PriceSource, price};
use anyhow::Result;
use comfy_table::Cell;
use tracing::info;

/// Prints the daily and cumulative fund returns, optionally only the last
/// `tail` days.
pub fn run(
    fund_name: &str,
    composition: FundComposition,
    prices: &dyn PriceSource,
    tail: Option<usize>,
) -> Result<FundReturnSeries> {
    info!("Calculating daily returns for {fund_name}...");

    let aggregator = FundAggregator::new(composition);
    let pb = ui::new_progress_bar(aggregator.composition().len() as u64);
    let fund = aggregator.load_and_aggregate(prices, &|symbol| {
        pb.set_message(symbol.to_string());
        pb.inc(1);
    });
    pb.finish_and_clear();
    let fund = fund?;

    if fund.is_empty() {
        println!("No prices found for {fund_name}.");
        return Ok(fund);
    }

    println!(
        "\nFund: {}",
        ui::style_text(fund_name, ui::StyleType::Title)
    );
    println!("{}", display_returns(&fund, tail));
    Ok(fund)
}

fn display_returns(fund: &FundReturnSeries, tail: Option<usize>) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Daily"),
        ui::header_cell("Cumulative"),
    ]);

    let days = fund.days();
    let skip = tail.map_or(0, |n| days.len().saturating_sub(n));
    for day in &days[skip..] {
        table.add_row(vec![
            Cell::new(price::format_date(&day.date)),
            day.percent_return
                .map_or_else(|| ui::na_cell(false), ui::change_cell),
            ui::change_cell(day.cumulative_return),
        ]);
    }
    table.to_string()
}
