use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gomoku_client::game::{parse_command, InputCommand, HELP_TEXT};
use gomoku_client::{ClientSettings, LogLevel, Session, SessionEnd, SessionHandle, TerminalView};
use protocol::{Connection, Connector, TcpConnector};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 五子棋终端客户端
#[derive(Parser, Debug)]
#[command(name = "gomoku-client", version, about = "Terminal client for the gomoku line protocol")]
struct Cli {
    /// Server host
    #[arg(long)]
    host: Option<String>,

    /// Server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Board edge length
    #[arg(long)]
    board_size: Option<usize>,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    /// 命令行参数覆盖文件设置
    fn apply(&self, settings: &mut ClientSettings) {
        if let Some(host) = &self.host {
            settings.server_host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server_port = port;
        }
        if let Some(size) = self.board_size {
            settings.board_size = size;
        }
        if let Some(level) = self.log_level {
            settings.log_level = level;
        }
    }
}

fn init_tracing(level: LogLevel) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter())))
        .init();
}

/// 标准输入放在独立线程，避免阻塞读拖住运行时退出
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn handle_input(line: &str, handle: &SessionHandle, board_size: usize) {
    match parse_command(line, board_size) {
        Ok(Some(InputCommand::Play(index))) => {
            handle.play(index);
        }
        Ok(Some(InputCommand::Forfeit)) => {
            handle.forfeit();
        }
        Ok(Some(InputCommand::Help)) => println!("{HELP_TEXT}"),
        Ok(None) => {}
        Err(e) => println!("{e}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => ClientSettings::load_from(path),
        None => ClientSettings::load(),
    };
    cli.apply(&mut settings);
    init_tracing(settings.log_level);
    settings.validate().context("invalid settings")?;

    if cli.save_config {
        let path = cli
            .config
            .clone()
            .or_else(ClientSettings::settings_path)
            .context("no config directory available")?;
        settings.save_to(&path)?;
    }

    let addr = settings.network_config().address();
    info!("Connecting to {}", addr);
    let conn = TcpConnector
        .connect(&addr)
        .await
        .with_context(|| format!("connecting to {addr}"))?;
    info!("Connected to {}", conn.peer_addr().unwrap_or_else(|| addr.clone()));

    let board_size = settings.board_size;
    let (reader, writer) = conn.split();
    let view = TerminalView::new(std::io::stdout(), board_size);
    let (mut session, handle) =
        Session::new(board_size, reader, writer, view).context("creating session")?;
    let mut session_task = tokio::spawn(async move { session.run().await });

    println!("Connected to {addr}. Type `help` for commands.");
    let mut input = spawn_stdin_reader();

    let end = loop {
        tokio::select! {
            end = &mut session_task => break end.context("session task failed")?,
            line = input.recv() => match line {
                Some(line) => handle_input(&line, &handle, board_size),
                None => {
                    info!("Stdin closed, forfeiting");
                    handle.forfeit();
                    break (&mut session_task).await.context("session task failed")?;
                }
            },
        }
    };

    match end {
        SessionEnd::Closed => println!("Connection closed."),
        SessionEnd::Forfeited => println!("You left the game."),
        SessionEnd::Failed(reason) => anyhow::bail!("session failed: {reason}"),
    }
    Ok(())
}
