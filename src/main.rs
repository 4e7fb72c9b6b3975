use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

mod cli;
mod counter;
mod directory;
mod error;
mod fetch;
mod model;
mod render;
mod retry;
mod util;
mod window;

use crate::cli::{Cli, EffectiveConfig, normalize};
use crate::counter::PushCounter;
use crate::directory::RepositoryDirectory;
use crate::fetch::Fetcher;

fn main() -> ExitCode {
  let _log_guard = tracing::subscriber::set_default(util::log_subscriber());
  let cli = Cli::parse();

  if cli.gen_man {
    return match util::render_man_page::<Cli>() {
      Ok(page) => {
        print!("{}", page);
        ExitCode::SUCCESS
      }
      Err(e) => {
        tracing::error!("rendering man page: {:#}", e);
        ExitCode::FAILURE
      }
    };
  }

  // Phase 1: normalize CLI
  let cfg = match normalize(cli) {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!("{:#}", e);
      return ExitCode::FAILURE;
    }
  };

  // Phase 2: load the repository directory; failure here aborts before any output
  let fetcher = Fetcher::http(cfg.backoff.clone());
  let directory = match RepositoryDirectory::load(&fetcher, &cfg.treeherder) {
    Ok(d) => d,
    Err(e) => {
      tracing::error!("Initializing treeherder: {}", e);
      return ExitCode::FAILURE;
    }
  };

  // Phase 3: list or count
  match run(&cfg, &fetcher, &directory) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      tracing::error!("{:#}", e);
      ExitCode::FAILURE
    }
  }
}

fn run(cfg: &EffectiveConfig, fetcher: &Fetcher, directory: &RepositoryDirectory) -> Result<()> {
  let stdout = std::io::stdout();
  let mut out = stdout.lock();

  if cfg.list_repos {
    for (name, url) in directory.list() {
      writeln!(out, "{}", render::repo_listing_line(name, url))?;
    }
    return Ok(());
  }

  let counter = PushCounter::new(fetcher, directory);
  counter.output_headers(&mut out, &cfg.count)?;

  for repo in cfg.repos.iter() {
    counter.output_counts(&mut out, repo, &cfg.count, cfg.start, cfg.end)?;
    out.flush()?;
  }

  Ok(())
}
