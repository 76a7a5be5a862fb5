//! Streams channel events to stdout as JSON lines.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use resolvinator_core::events::{ClientEvent, DomainEvent, EventCategory, LifecycleEvent};
use resolvinator_core::traits::PlaintextCipher;
use resolvinator_core::types::{ProjectId, StreamChannel, UserId};
use resolvinator_gateway::channel::{ChannelClient, EventStream};
use resolvinator_gateway::messaging::MessagingClient;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::settings::Settings;

/// Arguments for the listen command
#[derive(Parser)]
pub struct ListenArgs {
    /// Project to follow (risks and metadata), repeatable
    #[arg(short, long = "project")]
    pub projects: Vec<ProjectId>,

    /// Broadcast stream to join (news, events, system), repeatable
    #[arg(short, long = "stream")]
    pub streams: Vec<StreamChannel>,

    /// Join every broadcast stream
    #[arg(long, conflicts_with = "streams")]
    pub all_streams: bool,

    /// Join the private channel of this user and decode chat messages
    #[arg(short, long)]
    pub user: Option<UserId>,

    /// Only print events of these categories, repeatable
    #[arg(long = "category", value_parser = parse_category)]
    pub categories: Vec<EventCategory>,

    /// Exit after this many printed events
    #[arg(short = 'n', long)]
    pub count: Option<usize>,
}

impl ListenArgs {
    fn wants(&self, category: EventCategory) -> bool {
        self.categories.is_empty() || self.categories.contains(&category)
    }
}

fn parse_category(value: &str) -> Result<EventCategory, String> {
    serde_json::from_value(Value::String(value.to_ascii_lowercase()))
        .map_err(|_| format!("unknown category '{value}'"))
}

/// Connects, subscribes and prints events until interrupted.
pub async fn run(args: ListenArgs, settings: Settings) -> Result<()> {
    let client = ChannelClient::builder(settings.channel)
        .spawn()
        .context("Invalid channel configuration")?;

    let mut events = client.events();
    if !args.categories.is_empty() {
        // Lifecycle events drive the exit conditions below.
        let mut categories = args.categories.clone();
        categories.push(EventCategory::Connection);
        events = events.filtered(categories);
    }

    for project in &args.projects {
        client.subscribe_project(*project).await?;
    }
    if args.all_streams {
        client.subscribe_all().await?;
    } else {
        for stream in &args.streams {
            client.subscribe_channel(*stream, json!({})).await?;
        }
    }

    let messaging = args
        .user
        .map(|user| MessagingClient::new(client.clone(), user, Arc::new(PlaintextCipher)));
    if let Some(messaging) = &messaging {
        messaging.join_user_channel().await?;
    }

    info!(
        projects = args.projects.len(),
        streams = args.streams.len(),
        all_streams = args.all_streams,
        "Connecting"
    );
    client.connect().await?;

    let outcome = tokio::select! {
        result = pump(&args, &mut events, messaging.as_ref()) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
    };

    if let Err(e) = client.shutdown().await {
        warn!(error = %e, "Client task already stopped");
    }
    outcome
}

async fn pump(
    args: &ListenArgs,
    events: &mut EventStream,
    messaging: Option<&MessagingClient>,
) -> Result<()> {
    let mut printed = 0usize;

    while let Some(event) = events.recv().await {
        if let ClientEvent::Lifecycle(lifecycle) = &event {
            match lifecycle {
                LifecycleEvent::ReconnectExhausted { attempts } => {
                    bail!("Gave up reconnecting after {attempts} attempts");
                }
                LifecycleEvent::AuthenticationFailed { reason } => {
                    warn!(reason = %reason, "Authentication failed");
                }
                _ => {}
            }
        }

        if !args.wants(event.category()) {
            continue;
        }

        println!("{}", render(&event, messaging)?);
        printed += 1;
        if args.count.is_some_and(|limit| printed >= limit) {
            return Ok(());
        }
    }

    info!("Event stream closed");
    Ok(())
}

fn render(event: &ClientEvent, messaging: Option<&MessagingClient>) -> Result<String> {
    if let (Some(messaging), Some(domain @ DomainEvent::Message { .. })) =
        (messaging, event.as_domain())
    {
        match messaging.decode(domain) {
            Ok(Some(message)) => return Ok(serde_json::to_string(&json!({ "chat": message }))?),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not decode chat message"),
        }
    }
    Ok(serde_json::to_string(event)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ListenArgs,
    }

    fn parse(argv: &[&str]) -> ListenArgs {
        let mut full = vec!["listen"];
        full.extend_from_slice(argv);
        Wrapper::try_parse_from(full).unwrap().args
    }

    #[test]
    fn test_parse_repeatable_flags() {
        let args = parse(&["-p", "1", "-p", "2", "--stream", "News", "--category", "task"]);
        assert_eq!(args.projects, vec![ProjectId::new(1), ProjectId::new(2)]);
        assert_eq!(args.streams, vec![StreamChannel::News]);
        assert_eq!(args.categories, vec![EventCategory::Task]);
        assert!(args.wants(EventCategory::Task));
        assert!(!args.wants(EventCategory::News));
    }

    #[test]
    fn test_rejects_unknown_values() {
        assert!(Wrapper::try_parse_from(["listen", "--category", "weather"]).is_err());
        assert!(Wrapper::try_parse_from(["listen", "--stream", "weather"]).is_err());
        assert!(Wrapper::try_parse_from(["listen", "--all-streams", "--stream", "news"]).is_err());
    }

    #[test]
    fn test_no_filter_wants_everything() {
        let args = parse(&[]);
        assert!(args.wants(EventCategory::Connection));
        assert!(args.wants(EventCategory::Presence));
    }

    #[test]
    fn test_render_plain_event() {
        let event = ClientEvent::from(DomainEvent::ResourceDeleted { id: 4 });
        let line = render(&event, None).unwrap();
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["kind"], "domain");
        assert_eq!(value["event"]["type"], "resource_deleted");
        assert_eq!(value["event"]["id"], 4);
    }
}
