use anyhow::bail;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod covers;
#[cfg(test)]
mod tests;
mod web;

use cli::Command;
use config::Config;
use covers::{find_random_cover_item, ComicVineClient, CoverSource, Discovery, JikanClient};

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// One discovery against the live upstream, printed to stdout.
fn print_random(source: &dyn CoverSource, config: &Config) -> anyhow::Result<()> {
    let kind = source.kind();

    match find_random_cover_item(source, &config.retry_policy()) {
        Ok(Discovery::Found(cover)) => {
            match cover.year {
                Some(year) => println!("{} ({year})", cover.title),
                None => println!("{}", cover.title),
            }
            println!("Cover: {}", cover.cover_url);
            if let Some(url) = cover.detail_url() {
                println!("Details: {url}");
            }
            Ok(())
        }
        Ok(Discovery::NotFound) => {
            println!("No {kind} found. Try again!");
            Ok(())
        }
        Err(err) => bail!("Error fetching {kind}: {err}"),
    }
}

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    init_logging(&config.log_level);

    match args.command {
        #[cfg(feature = "markdown-docs")]
        Command::MarkdownDocs {} => {
            clap_markdown::print_help_markdown::<cli::Args>();
            Ok(())
        }

        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            log::info!(
                "starting cover service (comic mode: {}, max attempts: {})",
                if config.has_comic_key() { "enabled" } else { "disabled" },
                config.max_attempts
            );
            web::start_daemon(&config)
        }

        Command::Comic {} => {
            let client = ComicVineClient::new(
                config.comic_vine_api_key.clone(),
                &config.comicvine_base_url,
                config.request_timeout(),
                config.max_random_offset,
            )?;
            if client.ensure_configured().is_err() {
                bail!(
                    "COMIC_VINE_API_KEY environment variable is required. \
                     Get your API key from: https://comicvine.gamespot.com/api/"
                );
            }
            print_random(&client, &config)
        }

        Command::Anime {} => {
            let client = JikanClient::new(&config.jikan_base_url, config.request_timeout())?;
            print_random(&client, &config)
        }
    }
}
