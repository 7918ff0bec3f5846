// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lumo host - runs a node graph project headless.
//!
//! Usage: `lumo_host [PROJECT.ron] [FRAMES]`
//!
//! Without a project the built-in demo graph is used and written to
//! `demo.ron` next to the working directory. Logging follows `RUST_LOG`.

mod app;
mod project;

use app::{demo_graph, HostApp};
use lumo_editor_graph::{create_core_registry, PluginManager};
use project::ProjectFile;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lumo_editor_host=debug,lumo_editor_graph=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lumo host v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run() {
        tracing::error!("Host failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> project::Result<()> {
    let mut args = std::env::args().skip(1);
    let path = args.next().map(PathBuf::from);
    let frames = args.next().and_then(|f| f.parse::<u32>().ok());

    let mut project = match &path {
        Some(path) => {
            tracing::info!("Loading project {}", path.display());
            ProjectFile::load(path)?
        }
        None => {
            let project = ProjectFile::new(demo_graph(&create_core_registry()).to_document());
            project.save(&PathBuf::from("demo.ron"))?;
            tracing::info!("No project given, running the demo graph (saved to demo.ron)");
            project
        }
    };
    if let Some(frames) = frames {
        project.settings.frames = frames;
    }

    let mut app = HostApp::new(&project, PluginManager::new());
    tracing::debug!(
        "{} node types, {} plugins",
        app.registry().len(),
        app.plugins().len()
    );

    let reports = app.run();
    let executed: usize = reports.iter().map(|r| r.executed.len()).sum();
    tracing::info!("Ran {} frames, {executed} node executions", reports.len());
    tracing::debug!("Last frame recorded {} commands", app.last_commands().len());
    {
        let graph = app.graph();
        let graph = graph.borrow();
        tracing::info!("Graph {}: {} nodes, {} links", graph.name, graph.node_count(), graph.link_count());
    }

    if let Some(path) = path {
        app.to_project().save(&path)?;
    }
    Ok(())
}
