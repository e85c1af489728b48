use color_eyre::eyre::{
    Result,
    eyre,
};
use std::path::PathBuf;
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

mod client;
mod ui;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // Stdout belongs to the TUI; logs go to a rolling file instead.
    let file = tracing_appender::rolling::daily("logs", "raffle-client.log");
    let (writer, _guard) = tracing_appender::non_blocking(file);
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    let opts = parse_args()?;
    client::run_app(opts).await
}

fn parse_args() -> Result<client::RunOptions> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut chain_id = None;
    let mut addresses_path = None;
    let mut contract_bin = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--chain" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| eyre!("--chain requires a chain id"))?;
                chain_id = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| eyre!("invalid chain id: {value}"))?,
                );
                i += 2;
            }
            "--addresses" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| eyre!("--addresses requires a file path"))?;
                addresses_path = Some(PathBuf::from(value));
                i += 2;
            }
            "--contract" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| eyre!("--contract requires a file path"))?;
                contract_bin = Some(PathBuf::from(value));
                i += 2;
            }
            other => return Err(eyre!("unknown argument: {other}")),
        }
    }
    Ok(client::RunOptions {
        chain_id,
        addresses_path,
        contract_bin,
        session_root: PathBuf::from(raffle_client::session::SESSION_ROOT),
    })
}
