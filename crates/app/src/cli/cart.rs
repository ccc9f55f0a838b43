use std::{io, sync::Arc, time::Duration};

use clap::Args;
use rusty_money::iso::Currency;
use tokio::time::timeout;
use tracing::warn;
use trolley::{
    identity::Identity,
    lines::{CartProduct, LineId},
};
use trolley_app::{
    config::ClientConfig,
    report,
    sync::{CartSync, CartSyncError, IgnoreReason, Outcome, SyncState},
};

/// Extra time allowed for the reload after the quiet period.
const RELOAD_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Args)]
pub(crate) struct AddArgs {
    /// Product id
    #[arg(long)]
    product_id: u64,

    /// Option id, for products with options
    #[arg(long)]
    option_id: Option<u64>,

    /// Units to add
    #[arg(long, default_value_t = 1)]
    quantity: i64,

    /// Product name shown until the cart reloads
    #[arg(long)]
    name: Option<String>,

    /// Unit price shown until the cart reloads
    #[arg(long, default_value_t = 0)]
    price: i64,

    /// Stock shown until the cart reloads
    #[arg(long, default_value_t = 1)]
    stock: u32,
}

impl AddArgs {
    fn product(&self) -> CartProduct {
        CartProduct {
            product_id: self.product_id,
            product_name: self
                .name
                .clone()
                .unwrap_or_else(|| format!("Product {}", self.product_id)),
            sell_price: self.price,
            stock: self.stock,
            main_image: None,
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct SetQuantityArgs {
    /// Line id
    #[arg(long)]
    line_id: u64,

    /// New quantity; values below one become one
    #[arg(long, allow_negative_numbers = true)]
    quantity: i64,
}

#[derive(Debug, Args)]
pub(crate) struct ChangeOptionArgs {
    /// Line id
    #[arg(long)]
    line_id: u64,

    /// New option id
    #[arg(long)]
    option_id: u64,
}

#[derive(Debug, Args)]
pub(crate) struct DeleteArgs {
    /// Line id
    #[arg(long)]
    line_id: u64,
}

/// A sync engine bound to one identity for the lifetime of a command.
pub(crate) struct Session {
    sync: CartSync,
    currency: &'static Currency,
    quiet_period: Duration,
}

impl Session {
    pub(crate) async fn open(
        config: &ClientConfig,
        identity: Option<Identity>,
    ) -> Result<Self, String> {
        let currency = config.currency().map_err(|error| error.to_string())?;
        let api = config
            .api()
            .map_err(|error| format!("failed to configure cart client: {error}"))?;
        let snapshots = config
            .snapshot_store()
            .map_err(|error| format!("failed to open snapshots: {error}"))?;

        let settings = config.settings();
        let sync = CartSync::new(Arc::new(api), snapshots, settings);

        sync.set_identity(identity)
            .await
            .map_err(|error| format!("failed to load cart: {error}"))?;

        if sync.state() == SyncState::Disabled {
            return Err("cart is unavailable: sign in with a customer account".to_string());
        }

        Ok(Self {
            sync,
            currency,
            quiet_period: settings.quiet_period,
        })
    }

    pub(crate) fn show(&self) -> Result<(), String> {
        let view = self.sync.subscribe().borrow().clone();

        report::write_cart(io::stdout().lock(), &view, self.currency)
            .map_err(|error| format!("failed to print cart: {error}"))
    }

    pub(crate) async fn add(&self, args: AddArgs) -> Result<(), String> {
        let outcome = self
            .sync
            .add_to_cart(args.product(), args.option_id, args.quantity)
            .await;

        self.finish(outcome, None).await
    }

    pub(crate) async fn set_quantity(&self, args: SetQuantityArgs) -> Result<(), String> {
        let outcome = self
            .sync
            .update_quantity(LineId::Server(args.line_id), args.quantity)
            .await;

        self.finish(outcome, Some(args.line_id)).await
    }

    pub(crate) async fn change_option(&self, args: ChangeOptionArgs) -> Result<(), String> {
        let outcome = self
            .sync
            .change_option(LineId::Server(args.line_id), args.option_id)
            .await;

        self.finish(outcome, Some(args.line_id)).await
    }

    pub(crate) async fn delete(&self, args: DeleteArgs) -> Result<(), String> {
        let outcome = self.sync.delete_item(LineId::Server(args.line_id)).await;

        self.finish(outcome, Some(args.line_id)).await
    }

    pub(crate) async fn clear(&self) -> Result<(), String> {
        if let Outcome::Ignored(reason) = self.sync.clear_cart() {
            return Err(format!("cart was not cleared: {reason:?}"));
        }

        // Settles once the remote clear is answered and the cart has reloaded.
        self.settle().await;
        self.show()
    }

    async fn finish(
        &self,
        outcome: Result<Outcome, CartSyncError>,
        line_id: Option<u64>,
    ) -> Result<(), String> {
        match outcome.map_err(|error| format!("cart change failed: {error}"))? {
            Outcome::Applied => {}
            Outcome::Ignored(IgnoreReason::LineVanished) => {
                if let Some(line_id) = line_id {
                    #[expect(clippy::print_stdout, reason = "command output")]
                    {
                        println!("line {line_id} is no longer in the cart");
                    }
                }
            }
            Outcome::Ignored(reason) => {
                return Err(format!("cart change ignored: {reason:?}"));
            }
        }

        self.settle().await;
        self.show()
    }

    async fn settle(&self) {
        let mut views = self.sync.subscribe();

        let settled = timeout(
            self.quiet_period + RELOAD_GRACE,
            views.wait_for(|view| matches!(view.state, SyncState::Idle | SyncState::Disabled)),
        )
        .await
        .is_ok_and(|changed| changed.is_ok());

        if !settled {
            warn!("cart did not reload in time; showing last known state");
        }
    }
}
