use std::rc::Rc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use navigate::{
    Interaction, Navigator, NavigatorConfig, PendingDispatch, ReqwestTransport, Transport,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "commands: click <sel> | submit <sel> | change <sel> | back | forward | \
                     reload | html [sel] | quit";

fn main() -> Result<()> {
    let location = std::env::args()
        .nth(1)
        .context("usage: navigate <page-url>")?;

    let subscriber_result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();
    if subscriber_result.is_err() {
        // tracing was already initialised; continue silently
    }

    let config = NavigatorConfig::from_env().unwrap_or_else(|err| {
        eprintln!("Failed to load navigator configuration: {err}. Using defaults.");
        NavigatorConfig::default()
    });

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    rt.block_on(run(location, config))
}

async fn run(location: String, config: NavigatorConfig) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()?;
    let html = client
        .get(&location)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
        .with_context(|| format!("failed to load {location}"))?;

    let transport: Rc<dyn Transport> = Rc::new(ReqwestTransport::with_client(client));
    let navigator = Navigator::builder(html, location)
        .with_config(config)
        .with_transport(transport)
        .build()?;
    info!(base_url = %navigator.base_url(), "page loaded");
    settle(navigator.initial_load()).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("{USAGE}");
    while let Some(line) = lines.next_line().await? {
        navigator.pump_timers(Instant::now());
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match execute(&navigator, line).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => warn!(command = %line, error = %err, "command failed"),
        }
        navigator.pump_timers(Instant::now());
    }
    Ok(())
}

/// Run one driver command. Returns `false` when the driver should exit.
async fn execute(navigator: &Navigator, line: &str) -> Result<bool> {
    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, Some(rest.trim())),
        None => (line, None),
    };

    match (command, argument) {
        ("click", Some(selector)) => report(navigator.click(selector)?).await,
        ("submit", Some(selector)) => report(navigator.submit(selector)?).await,
        ("change", Some(selector)) => report(navigator.change(selector)?).await,
        ("back", None) => settle(navigator.back()).await,
        ("forward", None) => settle(navigator.forward()).await,
        ("reload", None) => settle(navigator.reload()).await,
        ("html", None) => println!("{}", navigator.document().to_html()),
        ("html", Some(selector)) => match navigator.document().inner_html(selector) {
            Some(markup) => println!("{markup}"),
            None => bail!("no element matches {selector:?}"),
        },
        ("quit", None) => return Ok(false),
        _ => bail!("unrecognised command; {USAGE}"),
    }
    println!("{}", navigator.window().href());
    Ok(true)
}

async fn report(interaction: Interaction) {
    if !interaction.is_handled() {
        info!("event not handled by the navigator");
    }
    if let Some(outcome) = interaction.settle().await {
        info!(?outcome, "dispatch settled");
    }
}

async fn settle(pending: Option<PendingDispatch>) {
    if let Some(pending) = pending {
        let outcome = pending.await;
        info!(?outcome, "dispatch settled");
    }
}
