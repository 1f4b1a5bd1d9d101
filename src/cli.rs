use anyhow::{Context, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use crate::command::{Command, PROMPT};
use crate::drone::DroneController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Shutdown,
    Signal,
    InputClosed,
}

/// Flips the returned flag to `true` on the first Ctrl-C. The listener lives
/// for the whole session, so a signal raised while a command runs is kept.
pub fn spawn_signal_listener() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received...");
                let _ = tx.send(true);
            }
            Err(err) => {
                error!("Failed to listen for shutdown signal: {}", err);
                tx.closed().await;
            }
        }
    });
    rx
}

/// Reads stdin on a plain thread so a pending read never holds the runtime open at exit.
pub fn spawn_stdin_reader() -> Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(8);
    std::thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        })
        .context("Failed to spawn stdin reader")?;
    Ok(rx)
}

pub async fn run_command_loop<W>(
    drone: &DroneController,
    mut input: mpsc::Receiver<String>,
    mut output: W,
    mut shutdown: watch::Receiver<bool>,
) -> Result<LoopExit>
where
    W: AsyncWrite + Unpin,
{
    loop {
        if *shutdown.borrow() {
            return Ok(LoopExit::Signal);
        }
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let line = tokio::select! {
            line = input.recv() => line,
            Ok(()) = shutdown.changed() => continue,
        };
        let Some(line) = line else {
            info!("Input closed, shutting down...");
            return Ok(LoopExit::InputClosed);
        };

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                error!("{}", e);
                continue;
            }
        };
        if command == Command::Shutdown {
            return Ok(LoopExit::Shutdown);
        }
        if let Err(e) = drone.handle_command(command).await {
            error!("{:#}", e);
        }
    }
}
