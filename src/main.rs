use anyhow::Context;
use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::info;

use css_variables_language_server::config::DEFAULT_LIBRARY;
use css_variables_language_server::logging::init_logger;
use css_variables_language_server::lsp::backend::CssVariablesBackend;

#[derive(Parser, Debug)]
#[command(name = "css-variables-language-server", version, about = "CSS custom property completions for Svelte projects")]
struct Args {
    /// Log level for stderr (falls back to RUST_LOG, then "info")
    #[arg(long)]
    log_level: Option<String>,

    /// Disable ANSI colors in stderr output
    #[arg(long)]
    no_color: bool,

    /// Write a per-session debug log under the user cache directory
    #[arg(long)]
    log_file: bool,

    /// UI library whose dependency activates the server
    #[arg(long, default_value = DEFAULT_LIBRARY)]
    library: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _guard = init_logger(args.no_color, args.log_level.as_deref(), args.log_file)
        .context("failed to initialize logging")?;
    info!("Starting {} v{} for library {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), args.library);

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let library = args.library;
    let (service, socket) = LspService::new(move |client| CssVariablesBackend::new(client, library));
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("Language server stopped");
    Ok(())
}
