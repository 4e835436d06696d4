//! arith-mcp — entry point.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tokio::io::{AsyncBufRead, BufReader};

use arith_mcp::config::{self, CliOverrides, Config, ServerMode};
use arith_mcp::protocol::{Dispatcher, ReinitializePolicy};
use arith_mcp::tools::ToolRegistry;
use arith_mcp::transport::{input_ready, StdioExit, StdioMode, StdioTransport};
use arith_mcp::types::{SERVER_NAME, SERVER_VERSION};

/// How long `serve-auto` waits for input on a non-terminal stdin.
const STDIN_PROBE_WAIT: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(
    name = "arith-mcp",
    about = "MCP calculator server over stdio, HTTP, and WebSocket",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// What a second `initialize` on an initialized session does.
    #[arg(long, global = true, value_enum)]
    reinitialize: Option<ReinitializePolicy>,

    /// Close WebSocket connections idle for this many seconds.
    #[arg(long, global = true)]
    idle_timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server in the mode selected by MCP_STDIO_MODE / MCP_HTTP_MODE (default).
    Serve {
        /// Listen address (host:port) for HTTP and WebSocket.
        #[arg(long)]
        addr: Option<String>,
    },

    /// Serve over stdio only; exits on `shutdown` or end of input.
    ServeStdio,

    /// Serve over HTTP and WebSocket only.
    #[cfg(feature = "http")]
    ServeHttp {
        /// Listen address (host:port).
        #[arg(long)]
        addr: Option<String>,
    },

    /// Serve over HTTP and WebSocket with stdio alongside.
    #[cfg(feature = "http")]
    ServeDual {
        /// Listen address (host:port).
        #[arg(long)]
        addr: Option<String>,
    },

    /// Serve over stdio if stdin is a terminal or has input waiting, HTTP otherwise.
    #[cfg(feature = "http")]
    ServeAuto {
        /// Listen address (host:port) used on HTTP fallback.
        #[arg(long)]
        addr: Option<String>,
    },

    /// Report the mode the environment selects.
    ///
    /// Exits with status 1 unless MCP_STDIO_MODE=1 alone is set.
    CheckMode,

    /// Print server name, version, and tool descriptors as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   arith-mcp completions bash > ~/.local/share/bash-completion/completions/arith-mcp
    ///   arith-mcp completions zsh > ~/.zfunc/_arith-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Launch interactive REPL mode.
    Repl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    arith_mcp::logging::init(&cli.log_level);

    let idle_timeout_secs = cli.idle_timeout;
    let reinitialize = cli.reinitialize;
    let overrides = |addr: Option<String>| CliOverrides {
        addr,
        idle_timeout_secs,
        reinitialize,
    };

    let dispatcher = Dispatcher::new(Arc::new(ToolRegistry::with_builtin_tools()));

    match cli.command.unwrap_or(Commands::Serve { addr: None }) {
        Commands::Serve { addr } => {
            let config = Config::from_env(&overrides(addr))?;
            tracing::info!("Starting {SERVER_NAME} v{SERVER_VERSION} in {} mode", config.mode);
            match config.mode {
                ServerMode::Stdio => serve_stdio(dispatcher, &config).await?,
                #[cfg(feature = "http")]
                ServerMode::Http => serve_http(dispatcher, &config).await?,
                #[cfg(feature = "http")]
                ServerMode::Dual => serve_dual(dispatcher, &config).await?,
                #[cfg(not(feature = "http"))]
                ServerMode::Http | ServerMode::Dual => {
                    anyhow::bail!("{} mode needs the `http` feature", config.mode)
                }
            }
        }

        Commands::ServeStdio => {
            let mut config = Config::from_env(&overrides(None))?;
            config.mode = ServerMode::Stdio;
            serve_stdio(dispatcher, &config).await?;
        }

        #[cfg(feature = "http")]
        Commands::ServeHttp { addr } => {
            let mut config = Config::from_env(&overrides(addr))?;
            config.mode = ServerMode::Http;
            serve_http(dispatcher, &config).await?;
        }

        #[cfg(feature = "http")]
        Commands::ServeDual { addr } => {
            let mut config = Config::from_env(&overrides(addr))?;
            config.mode = ServerMode::Dual;
            serve_dual(dispatcher, &config).await?;
        }

        #[cfg(feature = "http")]
        Commands::ServeAuto { addr } => {
            let mut config = Config::from_env(&overrides(addr))?;
            let is_terminal = std::io::stdin().is_terminal();
            let mut reader = BufReader::new(tokio::io::stdin());
            let probe = &mut reader;
            config.mode =
                config::auto_mode(is_terminal, move || input_ready(probe, STDIN_PROBE_WAIT)).await;

            match config.mode {
                ServerMode::Stdio => {
                    tracing::info!("Stdin detected, serving exclusive stdio");
                    serve_stdio_from(dispatcher, &config, reader).await?;
                }
                _ => {
                    tracing::info!("No stdin detected, serving HTTP");
                    serve_http(dispatcher, &config).await?;
                }
            }
        }

        Commands::CheckMode => {
            if !check_mode() {
                std::process::exit(1);
            }
        }

        Commands::Info => {
            let info = serde_json::json!({
                "name": SERVER_NAME,
                "version": SERVER_VERSION,
                "tools": dispatcher.registry().describe_all(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "arith-mcp", &mut std::io::stdout());
        }

        Commands::Repl => {
            arith_mcp::repl::run()?;
        }
    }

    Ok(())
}

async fn serve_stdio(dispatcher: Dispatcher, config: &Config) -> anyhow::Result<()> {
    serve_stdio_from(dispatcher, config, BufReader::new(tokio::io::stdin())).await
}

async fn serve_stdio_from<R>(dispatcher: Dispatcher, config: &Config, reader: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let transport = StdioTransport::with_options(dispatcher, StdioMode::Exclusive, config.transport);
    let exit = transport.serve(reader, tokio::io::stdout()).await?;
    tracing::info!("stdio transport finished: {exit:?}");

    // The runtime would otherwise wait on the blocking stdin reader.
    if exit == StdioExit::ShutdownRequested {
        std::process::exit(0);
    }
    Ok(())
}

#[cfg(feature = "http")]
async fn serve_http(dispatcher: Dispatcher, config: &Config) -> anyhow::Result<()> {
    let transport = arith_mcp::HttpTransport::with_options(dispatcher, config.transport);
    transport.run(&config.addr).await?;
    Ok(())
}

#[cfg(feature = "http")]
async fn serve_dual(dispatcher: Dispatcher, config: &Config) -> anyhow::Result<()> {
    let http = arith_mcp::HttpTransport::with_options(dispatcher.clone(), config.transport);
    let stdio = StdioTransport::with_options(dispatcher, StdioMode::Shared, config.transport);

    let server = http.run(&config.addr);
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        exit = stdio.run() => {
            match exit {
                Ok(exit) => tracing::info!("stdio transport finished ({exit:?}); HTTP keeps serving"),
                Err(e) => tracing::warn!("stdio transport failed: {e}; HTTP keeps serving"),
            }
            server.await?;
        }
    }

    std::process::exit(0);
}

fn check_mode() -> bool {
    println!("Checking server mode configuration...");

    let ok = match config::mode_from_env() {
        Err(e) => {
            println!("WARNING: {e}");
            false
        }
        Ok(ServerMode::Stdio) => {
            println!("Server is configured to run in stdio mode (MCP_STDIO_MODE=1).");
            true
        }
        Ok(ServerMode::Http) => {
            println!("Server is configured to run in HTTP mode (MCP_HTTP_MODE=1).");
            println!("Local tool integrations should use stdio mode instead.");
            false
        }
        Ok(ServerMode::Dual) => {
            println!("No mode is explicitly set. The server will run in dual mode.");
            println!("Dual mode is not recommended for local tool integrations.");
            false
        }
    };

    if ok {
        println!("Mode configuration is correct.");
    } else {
        println!();
        println!("To run in stdio mode:");
        println!("  MCP_STDIO_MODE=1 arith-mcp serve");
        println!("or");
        println!("  arith-mcp serve-stdio");
    }
    ok
}
