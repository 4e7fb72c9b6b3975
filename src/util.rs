use std::io::IsTerminal;

use clap::CommandFactory;
use tracing_subscriber::EnvFilter;

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> anyhow::Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}

/// Stderr subscriber honoring `RUST_LOG`, defaulting to `warn`.
///
/// Callers install it with `tracing::subscriber::set_default` so the
/// configuration stays scoped to the guard's lifetime.
pub fn log_subscriber() -> impl tracing::Subscriber + Send + Sync {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_ansi(std::io::stderr().is_terminal())
    .finish()
}
