// dashboard/commands.rs

use crate::client::{ApiClient, COMPARE_ERROR, DashboardHook};
use crate::dashboard::render;
use tracing::{info, warn};

pub const HELP: &str = "📋 Available commands:\n\
    /refresh: recompute the current technology\n\
    /tech <name>: switch technology\n\
    /techs: list tracked technologies\n\
    /compare <a> <b> ...: compare current scores\n\
    /analyze <text>: classify a single text\n\
    /stats: server cache and uptime\n\
    /model: model information\n\
    /help: command list\n\
    /quit: exit";

#[derive(Debug, PartialEq)]
pub enum CommandOutcome {
    /// The view state changed; redraw the dashboard.
    Redraw,
    Print(String),
    Quit,
}

/// Handles one line typed into the dashboard.
pub async fn handle_command(command_text: &str, hook: &DashboardHook, api: &ApiClient) -> CommandOutcome {
    let command_text = command_text.trim();
    let (command, args) = command_text.split_once(' ').unwrap_or((command_text, ""));
    let args = args.trim();
    info!("Handling command: {}", command);

    match command {
        "/refresh" => {
            info!("/refresh command received, forcing recomputation...");
            hook.refresh().await;
            CommandOutcome::Redraw
        }
        "/tech" => {
            if args.is_empty() {
                return CommandOutcome::Print("⚠️ Usage: /tech <name>".into());
            }
            hook.select(args).await;
            CommandOutcome::Redraw
        }
        "/techs" => match api.get_technologies().await {
            Ok(technologies) => {
                CommandOutcome::Print(format!("⚙️ Tracked technologies: {}", technologies.join(", ")))
            }
            Err(e) => {
                warn!("/techs error: {}", e);
                CommandOutcome::Print("❌ Failed to fetch technologies".into())
            }
        },
        "/compare" => {
            let technologies: Vec<String> = args.split_whitespace().map(str::to_string).collect();
            if technologies.is_empty() {
                return CommandOutcome::Print("⚠️ Usage: /compare <a> <b> ...".into());
            }
            match api.post_compare(&technologies).await {
                Ok(response) => CommandOutcome::Print(render::render_comparison(&response)),
                Err(e) => {
                    warn!("/compare error: {}", e);
                    CommandOutcome::Print(format!("❌ {}", COMPARE_ERROR))
                }
            }
        }
        "/analyze" => {
            if args.is_empty() {
                return CommandOutcome::Print("⚠️ Usage: /analyze <text>".into());
            }
            match api.post_analyze(args).await {
                Ok(result) => CommandOutcome::Print(render::render_classification(&result)),
                Err(e) => {
                    warn!("/analyze error: {}", e);
                    CommandOutcome::Print("❌ Failed to analyze text".into())
                }
            }
        }
        "/stats" => match api.get_stats().await {
            Ok(stats) => CommandOutcome::Print(render::render_stats(&stats)),
            Err(e) => {
                warn!("/stats error: {}", e);
                CommandOutcome::Print("❌ Failed to fetch stats".into())
            }
        },
        "/model" => CommandOutcome::Print(render::render_model_info(api.get_model_info().await.as_ref())),
        "/help" => CommandOutcome::Print(HELP.into()),
        "/quit" | "/exit" => CommandOutcome::Quit,
        "" => CommandOutcome::Redraw,
        _ => CommandOutcome::Print(format!("❓ Unknown command: {}. Type /help", command)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;
    use crate::server::{AppState, build_router};
    use crate::test_support::{FakeCollector, spawn_router, test_service};
    use std::sync::Arc;
    use std::time::Duration;

    async fn setup() -> (DashboardHook, ApiClient) {
        let service = test_service(vec![FakeCollector::new(Source::Github, 6)], None);
        let base = spawn_router(build_router(AppState { service: Arc::new(service) })).await;
        let api = ApiClient::new(&base, Duration::from_secs(5)).unwrap();
        (DashboardHook::new(Arc::new(api.clone()), "react"), api)
    }

    #[tokio::test]
    async fn switching_and_refreshing_redraw() {
        let (hook, api) = setup().await;
        assert_eq!(handle_command("/tech Vue", &hook, &api).await, CommandOutcome::Redraw);
        let state = hook.state().await;
        assert_eq!(state.technology, "vue");
        assert!(state.sentiment.is_some());

        assert_eq!(handle_command("/refresh", &hook, &api).await, CommandOutcome::Redraw);
        assert_eq!(handle_command("/quit", &hook, &api).await, CommandOutcome::Quit);
    }

    #[tokio::test]
    async fn informational_commands_print() {
        let (hook, api) = setup().await;

        let CommandOutcome::Print(comparison) = handle_command("/compare react cobol", &hook, &api).await else {
            panic!("expected printed comparison");
        };
        assert!(comparison.contains("react"));
        assert!(comparison.contains("No data: cobol"));

        let CommandOutcome::Print(model) = handle_command("/model", &hook, &api).await else {
            panic!("expected printed model info");
        };
        assert!(model.contains("lexicon"));

        assert_eq!(
            handle_command("/dance", &hook, &api).await,
            CommandOutcome::Print("❓ Unknown command: /dance. Type /help".into())
        );
        assert_eq!(
            handle_command("/tech", &hook, &api).await,
            CommandOutcome::Print("⚠️ Usage: /tech <name>".into())
        );
    }
}
