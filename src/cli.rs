use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to a yaml config file
    #[clap(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate api docs in markdown format
    #[cfg(feature = "markdown-docs")]
    #[clap(hide = true)]
    MarkdownDocs {},

    /// Start the cover service.
    Serve {
        /// Interface to bind to
        #[clap(long)]
        host: Option<String>,

        /// Port to listen on
        #[clap(short, long)]
        port: Option<u16>,
    },

    /// Print a random comic cover from Comic Vine.
    /// Requires COMIC_VINE_API_KEY.
    Comic {},

    /// Print a random anime cover from MyAnimeList.
    Anime {},
}
