// Terminal dashboard: renders the view state and reacts to typed commands.

pub mod commands;
pub mod render;

use crate::client::{ApiClient, DashboardHook};
use commands::{handle_command, CommandOutcome};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

fn redraw(screen: &str) {
    // clear screen, cursor home
    print!("\x1b[2J\x1b[H");
    println!("{}", screen);
    println!("Type /help for commands.");
}

/// Runs until `/quit` or end of input. Polls the API every `poll_interval`.
pub async fn run_dashboard(api: ApiClient, technology: &str, poll_interval: Duration) -> anyhow::Result<()> {
    info!("🖥 Starting dashboard against {}", api.base_url());
    if let Err(e) = api.health().await {
        warn!("⚠️ API at {} is not healthy yet: {}", api.base_url(), e);
    }
    let hook = DashboardHook::new(Arc::new(api.clone()), technology);

    let mut tick = interval(poll_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let current = hook.technology().await;
                hook.select(&current).await;
                redraw(&render::render_dashboard(&hook.state().await));
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("Input closed, leaving dashboard");
                        break;
                    }
                    Err(e) => {
                        warn!("⚠️ Failed to read input: {}", e);
                        break;
                    }
                };
                match handle_command(&line, &hook, &api).await {
                    CommandOutcome::Redraw => redraw(&render::render_dashboard(&hook.state().await)),
                    CommandOutcome::Print(text) => println!("{}", text),
                    CommandOutcome::Quit => break,
                }
            }
        }
    }
    Ok(())
}
