//! CLI parser.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "groupme-bot")]
#[command(about = "GroupMe webhook bot", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the webhook (config from env; --bot-id overrides GROUPME_BOT_ID).
    Run {
        #[arg(short, long)]
        bot_id: Option<String>,
        /// Listen address, overrides BIND_ADDR.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Post one message and exit.
    Send {
        text: String,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(short, long)]
        bot_id: Option<String>,
    },
    /// Print recently stored messages of GROUPME_GROUP_ID.
    Recent {
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
}
