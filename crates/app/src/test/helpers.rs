//! Test Helpers

use std::{sync::Arc, time::Duration};

use trolley::{
    identity::Identity,
    lines::{CartLine, CartProduct, LineId, LineOption, Quantity},
};

use crate::{
    api::CartApi,
    snapshot::MemorySnapshotStore,
    sync::{CartSync, SyncSettings},
};

pub(crate) const QUIET_PERIOD: Duration = Duration::from_millis(250);

pub(crate) fn product(product_id: u64, stock: u32) -> CartProduct {
    CartProduct {
        product_id,
        product_name: format!("Product {product_id}"),
        sell_price: 12_000,
        stock,
        main_image: Some(format!("https://img.example.com/{product_id}.png")),
    }
}

pub(crate) fn option(option_id: u64) -> LineOption {
    LineOption {
        option_id,
        option_type: "SIZE".to_string(),
        option_title: Some("Size".to_string()),
        option_value: Some(format!("Option {option_id}")),
    }
}

pub(crate) fn server_line(
    line_id: u64,
    product_id: u64,
    option_id: Option<u64>,
    quantity: i64,
) -> CartLine {
    CartLine {
        line_id: LineId::Server(line_id),
        product_id,
        product_name: format!("Product {product_id}"),
        thumbnail_url: format!("https://img.example.com/{product_id}.png"),
        quantity: Quantity::clamped(quantity),
        unit_price: 12_000,
        stock_available: 20,
        sold_out: false,
        option: option_id.map(option),
    }
}

pub(crate) fn customer() -> Identity {
    Identity::customer(1)
}

pub(crate) fn engine(api: Arc<dyn CartApi>) -> (CartSync, Arc<MemorySnapshotStore>) {
    let snapshots = Arc::new(MemorySnapshotStore::new());

    let sync = CartSync::new(
        api,
        snapshots.clone(),
        SyncSettings {
            quiet_period: QUIET_PERIOD,
        },
    );

    (sync, snapshots)
}

pub(crate) fn quantities(sync: &CartSync) -> Vec<(LineId, u32)> {
    sync.lines()
        .iter()
        .map(|line| (line.line_id, line.quantity.get()))
        .collect()
}
