use anyhow::Context;
use clap::{Parser, Subcommand};
use graph_builder::config::Config;
use graph_builder::engine::graph::GraphProcessor;
use graph_builder::engine::session::EditorSession;
use graph_builder::engine::types::{ArchitectureType, LayerConfig};
use graph_builder::schemas::architecture::DatasetUpload;
use graph_builder::{ApiClient, SyncGateway};

#[derive(Parser, Debug)]
#[command(name = "graph-builder", about = "Author and manage network architectures")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stored architectures.
    List,
    /// Print an architecture's layers in data-flow order.
    Show { id: String },
    /// Create an architecture, optionally seeded from a template.
    New {
        #[arg(long)]
        name: String,
        /// cnn, rnn, feedforward or transformer
        #[arg(long = "type")]
        kind: ArchitectureType,
        /// Start from the family's template instead of a blank graph.
        #[arg(long)]
        template: bool,
    },
    /// Delete an architecture.
    Delete { id: String },
    /// Ask the remote validator about an architecture.
    Validate { id: String },
    /// Generate code for an architecture.
    Generate { id: String },
    /// Attach dataset metadata to an architecture.
    AttachDataset {
        id: String,
        #[arg(long)]
        filename: String,
        #[arg(long)]
        size: String,
        #[arg(long)]
        display_name: Option<String>,
    },
    /// Print the JSON schema of layer configurations.
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let client = ApiClient::new(&cli.config).context("Error building the HTTP client")?;
    log::debug!("Using model service at {}", client.base_url());
    let gateway = SyncGateway::new(client);

    match cli.command {
        Command::List => {
            for summary in gateway.list().await.context("Error listing architectures")? {
                println!(
                    "{}\t{}\t{}{}",
                    summary.id,
                    summary.kind,
                    summary.name,
                    if summary.has_dataset { "\t[dataset]" } else { "" }
                );
            }
        }
        Command::Show { id } => {
            let session = gateway
                .open(&id, Some(cli.config.history_limit))
                .await
                .with_context(|| format!("Error fetching architecture {}", id))?;
            print_session(&session)?;
        }
        Command::New {
            name,
            kind,
            template,
        } => {
            let id = if template {
                let session = gateway
                    .create_from_template(&name, kind, Some(cli.config.history_limit))
                    .await
                    .context("Error creating architecture from template")?;
                session.architecture().map(|info| info.id.clone()).unwrap_or_default()
            } else {
                gateway
                    .create(&name, kind)
                    .await
                    .context("Error creating architecture")?
                    .id
            };
            println!("{}", id);
        }
        Command::Delete { id } => {
            let message = gateway
                .delete(&id)
                .await
                .with_context(|| format!("Error deleting architecture {}", id))?;
            println!("{}", message);
        }
        Command::Validate { id } => {
            let architecture = gateway.fetch(&id).await.context("Error fetching architecture")?;
            let verdict = gateway
                .validate(architecture.nodes, architecture.edges, &id)
                .await
                .context("Error validating architecture")?;
            let explanation = verdict.value.into_result()?;
            println!("valid: {}", explanation);
        }
        Command::Generate { id } => {
            let code = gateway
                .generate(&id)
                .await
                .with_context(|| format!("Error generating code for {}", id))?;
            println!("{}", code);
        }
        Command::AttachDataset {
            id,
            filename,
            size,
            display_name,
        } => {
            let mut session = gateway
                .open(&id, Some(cli.config.history_limit))
                .await
                .context("Error fetching architecture")?;
            let upload = DatasetUpload {
                display_name: display_name.unwrap_or_else(|| filename.clone()),
                filename,
                size,
            };
            let dataset = gateway
                .attach_dataset(&id, &upload, &mut session)
                .await
                .context("Error attaching dataset")?;
            println!("{}", serde_json::to_string_pretty(&dataset)?);
        }
        Command::Schema => {
            let schema = schemars::schema_for!(LayerConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

fn print_session(session: &EditorSession) -> anyhow::Result<()> {
    if let Some(info) = session.architecture() {
        println!("{} ({}, {})", info.name, info.kind, info.id);
        if let Some(dataset) = &info.dataset {
            let name = dataset.display_name.as_deref().or(dataset.name.as_deref());
            println!("dataset: {}", name.unwrap_or("unnamed"));
        }
    }

    let processor = GraphProcessor::new(session.nodes(), session.edges());
    let order = processor
        .validate_and_sort()
        .context("Stored graph is not acyclic")?;
    let incoming = processor.get_incoming_map();
    for (id, kind) in order {
        let label = session.graph().node(&id).map_or("", |node| node.label.as_str());
        let parents = incoming.get(&id).map(|p| p.join(", ")).unwrap_or_default();
        if parents.is_empty() {
            println!("  {:<12} {:<10} {}", id, kind, label);
        } else {
            println!("  {:<12} {:<10} {} <- {}", id, kind, label, parents);
        }
    }
    for conn in session.connections() {
        let state = if conn.is_valid { "pending" } else { "invalid" };
        println!("  {} -> {} ({})", conn.source, conn.target, state);
    }
    Ok(())
}
