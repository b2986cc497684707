use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use jfzf::cli::Cli;
use jfzf::jellyfin::JellyfinClient;
use jfzf::navigator::{Navigator, RunOutcome};
use jfzf::picker::FzfPicker;
use jfzf::player::ProcessLauncher;
use jfzf::prompt;
use jfzf::registry::ServerRegistry;

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  if let Err(err) = jfzf::logging::init() {
    eprintln!("Warning: logging disabled: {}", err);
  }
  tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting jfzf");

  let registry_path = cli.config.clone().unwrap_or_else(ServerRegistry::default_path);
  let mut registry = ServerRegistry::load(registry_path)?;

  if let Some(name) = &cli.forget {
    if !registry.remove(name) {
      bail!("no server named '{}' is configured", name);
    }
    registry.save()?;
    println!("Removed server '{}'.", name);
    return Ok(());
  }

  if cli.list_servers {
    if registry.is_empty() {
      println!("No servers configured. Run `jfzf --add` to register one.");
    }
    for server in registry.list() {
      println!("{}\t{}\t{}", server.name, server.url, server.username);
    }
    return Ok(());
  }

  if cli.add {
    let server = prompt::add_server().context("server registration aborted")?;
    println!("Registered '{}'.", server.name);
    registry.add_or_update(server);
    registry.save()?;
  }

  if let Err(err) = registry.get_active() {
    // First run: offer registration right away instead of giving up.
    println!("No servers configured; let's add one.");
    match prompt::add_server() {
      Ok(server) => {
        registry.add_or_update(server);
        registry.save()?;
      }
      Err(prompt_err) => {
        tracing::debug!(error = %prompt_err, "interactive registration unavailable");
        return Err(err).context("run `jfzf --add` to register a server");
      }
    }
  }

  if let Some(name) = &cli.server {
    if registry.find(name).is_none() {
      let known: Vec<&str> = registry.list().iter().map(|s| s.name.as_str()).collect();
      bail!("unknown server '{}'; configured: {}", name, known.join(", "));
    }
  }

  let cancel = CancellationToken::new();
  {
    let cancel = cancel.clone();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("interrupt received");
        cancel.cancel();
      }
    });
  }

  let picker = FzfPicker::new()?;
  let launcher = ProcessLauncher::new(cli.player.clone(), cli.player_args.clone(), cancel.clone());
  let client = JellyfinClient::new();

  let mut preselect = cli.server.clone();
  loop {
    let navigator = Navigator::new(
      &client,
      &picker,
      &launcher,
      registry.list().to_vec(),
      cancel.clone(),
    )
    .with_filter(cli.filter.clone())
    .with_preselect(preselect.take());

    match navigator.run().await? {
      RunOutcome::Quit => break,
      RunOutcome::AddServer => {
        let server = prompt::add_server().context("server registration aborted")?;
        println!("Registered '{}'.", server.name);
        registry.add_or_update(server);
        registry.save()?;
      }
    }
  }

  Ok(())
}
