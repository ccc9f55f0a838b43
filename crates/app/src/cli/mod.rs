use clap::{Args, Parser, Subcommand};
use trolley::identity::{Identity, Role};
use trolley_app::config::{ClientConfig, LoggingConfig};

mod cart;

#[derive(Debug, Parser)]
#[command(name = "trolley", about = "Storefront cart client", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) client: ClientConfig,

    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(flatten)]
    identity: IdentityArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct IdentityArgs {
    /// Signed-in account id; anonymous when omitted
    #[arg(long, env = "CART_USER_ID", global = true)]
    user_id: Option<u64>,

    /// Role of the signed-in account (USER, ADMIN)
    #[arg(long, env = "CART_ROLE", default_value = "USER", global = true)]
    role: Role,
}

impl IdentityArgs {
    fn identity(&self) -> Option<Identity> {
        self.user_id.map(|id| Identity::new(id, self.role.clone()))
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the cart
    Show,

    /// Add a product to the cart
    Add(cart::AddArgs),

    /// Set the quantity of a line
    SetQuantity(cart::SetQuantityArgs),

    /// Move a line to another option
    ChangeOption(cart::ChangeOptionArgs),

    /// Remove a line
    Delete(cart::DeleteArgs),

    /// Remove every line
    Clear,
}

impl Cli {
    /// Parse arguments after loading `.env`, if present.
    pub(crate) fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let session = cart::Session::open(&self.client, self.identity.identity()).await?;

        match self.command {
            Commands::Show => session.show(),
            Commands::Add(args) => session.add(args).await,
            Commands::SetQuantity(args) => session.set_quantity(args).await,
            Commands::ChangeOption(args) => session.change_option(args).await,
            Commands::Delete(args) => session.delete(args).await,
            Commands::Clear => session.clear().await,
        }
    }
}
