mod config;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dripfile_client::{HttpResourceClient, InMemoryResourceApi, ResourceApi};
use dripfile_console::{ConsoleContext, Page, View};
use dripfile_contract::Resource;
use dripfile_query::MutationState;
use futures::StreamExt;
use tracing::{info, warn};

use crate::config::{Backend, RuntimeConfig};

#[derive(Debug, Parser)]
#[command(author, version, about = "Dripfile file transfer console")]
struct Cli {
    /// TOML runtime config. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides `api.base_url`.
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the page at a console path once it has loaded.
    Open { path: String },
    /// Print the page on every change, refreshing it periodically.
    Watch {
        path: String,
        #[arg(long, default_value_t = 5)]
        interval_secs: u64,
    },
    /// Fill in a form page and submit it.
    Submit {
        path: String,
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Delete a location or an itinerary.
    Delete { target: DeleteTarget, id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DeleteTarget {
    Location,
    Itinerary,
}

impl From<DeleteTarget> for Resource {
    fn from(target: DeleteTarget) -> Self {
        match target {
            DeleteTarget::Location => Resource::Location,
            DeleteTarget::Itinerary => Resource::Itinerary,
        }
    }
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }

    let default_filter = config.log.filter.clone().unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let ctx = ConsoleContext::new(connect(&config)?);
    let outcome = match cli.command {
        Command::Open { path } => open(&ctx, &path).await,
        Command::Watch {
            path,
            interval_secs,
        } => watch(&ctx, &path, Duration::from_secs(interval_secs.max(1))).await,
        Command::Submit { path, fields } => submit(&ctx, &path, &fields).await,
        Command::Delete { target, id } => delete(&ctx, target.into(), id).await,
    };
    ctx.shutdown();
    outcome
}

fn connect(config: &RuntimeConfig) -> Result<Arc<dyn ResourceApi>> {
    match config.api.backend {
        Backend::Memory => {
            info!("using in-memory backend with demo data");
            Ok(Arc::new(InMemoryResourceApi::with_demo_data()))
        }
        Backend::Http => {
            let client = HttpResourceClient::new(&config.api.http_config())
                .with_context(|| format!("invalid api.base_url {}", config.api.base_url))?;
            info!(base_url = %client.base_url(), "using http backend");
            Ok(Arc::new(client))
        }
    }
}

fn mount(ctx: &ConsoleContext, path: &str) -> Result<Page> {
    ctx.open(path).ok_or_else(|| anyhow!("no route for {path}"))
}

fn print(view: &View) {
    print!("{view}");
}

async fn open(ctx: &ConsoleContext, path: &str) -> Result<()> {
    let mut page = mount(ctx, path)?;
    page.settled().await;
    print(&page.render());
    Ok(())
}

async fn follow(ctx: &ConsoleContext) -> Result<()> {
    let path = ctx.navigator().current();
    open(ctx, &path).await
}

async fn watch(ctx: &ConsoleContext, path: &str, every: Duration) -> Result<()> {
    let page = mount(ctx, path)?;
    let Some(mut updates) = page.updates() else {
        print(&page.render());
        return Ok(());
    };

    let mut refresh = tokio::time::interval(every);
    refresh.tick().await;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                info!("stopping watch");
                return Ok(());
            }
            _ = refresh.tick() => {
                page.refresh(ctx);
            }
            update = updates.next() => {
                if update.is_none() {
                    return Ok(());
                }
                print(&page.render());
                println!("---");
            }
        }
    }
}

async fn submit(ctx: &ConsoleContext, path: &str, fields: &[(String, String)]) -> Result<()> {
    let mut page = mount(ctx, path)?;
    // forms that offer choices need their options loaded first
    page.settled().await;
    for (name, value) in fields {
        page.set_field(name, value)?;
    }
    page.submit().with_context(|| format!("cannot submit {path}"))?;

    match page.submission_settled().await {
        Some(Ok(())) => follow(ctx).await,
        Some(Err(error)) => {
            print(&page.render());
            Err(error).context("submission failed")
        }
        None => Err(anyhow!("{path} did not submit")),
    }
}

async fn delete(ctx: &ConsoleContext, resource: Resource, id: String) -> Result<()> {
    let mutation = ctx
        .delete_mutation(resource)
        .ok_or_else(|| anyhow!("{resource} cannot be deleted"))?;
    mutation.submit(id.clone());

    match mutation.settled().await {
        MutationState::Success(_) => {
            info!(resource = %resource, id = %id, "deleted");
            follow(ctx).await
        }
        MutationState::Error(error) => {
            warn!(resource = %resource, id = %id, "delete failed");
            Err(error).with_context(|| format!("failed to delete {resource} {id}"))
        }
        MutationState::Idle | MutationState::Pending => Err(anyhow!("delete did not run")),
    }
}
