use super::ui;
use crate::core::{
    FundAggregator, FundComposition, Ledger, LedgerSink, LedgerSource, LookupPolicy, PriceSource,
    RefundCalculator, RefundSummary,
};
use anyhow::{Context, Result};
use comfy_table::Cell;
use tracing::info;

/// Builds the fund series, applies refunds to the ledger and hands the
/// result to `sink`.
pub fn run(
    fund_name: &str,
    composition: FundComposition,
    prices: &dyn PriceSource,
    ledger_source: &dyn LedgerSource,
    sink: &dyn LedgerSink,
    policy: LookupPolicy,
    show_details: bool,
) -> Result<RefundSummary> {
    info!("Computing refunds for {fund_name}...");

    let aggregator = FundAggregator::new(composition);
    let pb = ui::new_progress_bar(aggregator.composition().len() as u64);
    let fund = aggregator.load_and_aggregate(prices, &|symbol| {
        pb.set_message(symbol.to_string());
        pb.inc(1);
    });
    pb.finish_and_clear();
    let fund = fund?;

    let mut ledger = ledger_source.load_ledger()?;
    let summary = RefundCalculator::new(&fund, policy)
        .apply(&mut ledger)
        .context("Failed to compute refunds")?;
    sink.write_ledger(&ledger)?;

    if show_details {
        println!("{}", display_refunds(&ledger));
    }
    println!("{}", display_summary(fund_name, &summary));
    Ok(summary)
}

fn display_refunds(ledger: &Ledger) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Row"),
        ui::header_cell("Opened"),
        ui::header_cell("Closed"),
        ui::header_cell("Invested"),
        ui::header_cell("Refund"),
        ui::header_cell("Return"),
    ]);

    for record in &ledger.records {
        let gain = record
            .amount_refund
            .zip(record.amount_invested)
            .filter(|(_, invested)| *invested != 0.0)
            .map(|(refund, invested)| (refund / invested - 1.0) * 100.0);
        table.add_row(vec![
            Cell::new(record.row),
            Cell::new(record.open_date.display()),
            Cell::new(record.close_date.display()),
            ui::format_optional_cell(record.amount_invested, |v| format!("{v:.2}")),
            ui::format_optional_cell(record.amount_refund, |v| format!("{v:.2}")),
            gain.map_or_else(|| ui::na_cell(record.amount_refund.is_none()), ui::change_cell),
        ]);
    }
    table.to_string()
}

fn display_summary(fund_name: &str, summary: &RefundSummary) -> String {
    let mut output = format!(
        "Fund: {}\n\n",
        ui::style_text(fund_name, ui::StyleType::Title)
    );

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Investors"),
        ui::header_cell("Resolved"),
        ui::header_cell("Unresolved"),
        ui::header_cell("Invested"),
        ui::header_cell("Refunded"),
    ]);
    let unresolved = if summary.unresolved > 0 {
        Cell::new(ui::style_text(
            &summary.unresolved.to_string(),
            ui::StyleType::Error,
        ))
    } else {
        Cell::new(summary.unresolved)
    };
    table.add_row(vec![
        Cell::new(summary.rows),
        Cell::new(summary.resolved),
        unresolved,
        ui::amount_cell(summary.total_invested),
        ui::amount_cell(summary.total_refund),
    ]);
    output.push_str(&table.to_string());

    if summary.unresolved > 0 {
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(
                "Rows without a matching fund date have an empty amount_refund.",
                ui::StyleType::Subtle
            )
        ));
    }
    output
}
