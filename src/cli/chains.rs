use super::ui;
use crate::core::chain::ChainRegistry;
use comfy_table::Cell;

pub fn display_chains(chains: &ChainRegistry) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Name"),
        ui::header_cell("Price feed"),
    ]);

    for chain in chains.iter() {
        table.add_row(vec![
            Cell::new(chain.symbol.to_uppercase()),
            Cell::new(&chain.display_name),
            Cell::new(&chain.price_feed_id),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Supported chains", ui::StyleType::Title),
        table
    )
}
