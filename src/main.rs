// src/main.rs
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use circuitsvis::ui::routes::{run_server, AppState, DEFAULT_TITLE};
use circuitsvis::{RenderConfig, Renderer, VisError};

#[derive(Parser, Debug)]
#[command(author, version, about = "Render CircuitsVis visualizations to HTML", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a component from a JSON props file.
    Render {
        /// Component exported by the bundle, e.g. AttentionPatterns
        #[arg(long)]
        component: String,
        /// JSON file holding the component props
        #[arg(long)]
        props: PathBuf,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Emit a full HTML page instead of a fragment
        #[arg(long)]
        standalone: bool,
        #[arg(long, default_value = DEFAULT_TITLE)]
        title: String,
        /// Fixed element id instead of a random one
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Serve visualizations on a local preview server.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Component to show on the index page
        #[arg(long, requires = "props")]
        component: Option<String>,
        #[arg(long, requires = "component")]
        props: Option<PathBuf>,
        #[arg(long, default_value = DEFAULT_TITLE)]
        title: String,
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// JSON render configuration file
    #[arg(long)]
    config: Option<String>,
    /// Inline this locally built bundle instead of importing from the CDN
    #[arg(long)]
    local_bundle: Option<PathBuf>,
}

impl ConfigArgs {
    fn build_renderer(&self) -> Result<Renderer, VisError> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::load(path)?,
            None => RenderConfig::default(),
        }
        .with_env_overrides();
        if let Some(bundle) = &self.local_bundle {
            config.local_bundle_path = Some(bundle.clone());
        }
        Renderer::new(config)
    }
}

fn read_props(path: &Path) -> Result<Value, VisError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        VisError::Config(format!("Failed to read props file {}: {}", path.display(), e))
    })?;
    let props = serde_json::from_str(&contents)?;
    Ok(props)
}

async fn run(cli: Cli) -> Result<(), VisError> {
    match cli.command {
        Command::Render {
            component,
            props,
            output,
            standalone,
            title,
            id,
            config,
        } => {
            let renderer = config.build_renderer()?;
            let props = read_props(&props)?;
            let html = match id {
                Some(id) => renderer.render_with_id(&component, &props, &id)?,
                None => renderer.render(&component, &props)?,
            };
            let text = if standalone {
                html.to_document(&title)
            } else {
                html.notebook_html().to_string()
            };
            match output {
                Some(path) => {
                    fs::write(&path, text)?;
                    log::info!("Wrote {} to {}", component, path.display());
                }
                None => println!("{}", text),
            }
            Ok(())
        }
        Command::Serve {
            bind,
            port,
            component,
            props,
            title,
            config,
        } => {
            let renderer = config.build_renderer()?;
            let initial = match (component, props) {
                (Some(component), Some(props)) => {
                    Some(renderer.render(&component, &read_props(&props)?)?)
                }
                _ => None,
            };
            let mut state = AppState::new(renderer, initial);
            state.title = title;
            run_server(state, &bind, port).await?;
            Ok(())
        }
    }
}

#[actix_web::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Application error: {}", e);
        let mut current_err: Option<&(dyn Error + 'static)> = e.source();
        while let Some(source) = current_err {
            eprintln!("Caused by: {}", source);
            current_err = source.source();
        }
        std::process::exit(1);
    }
}
