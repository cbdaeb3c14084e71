//! Replays a recorded event stream through a channel-backed source.
//!
//! Demonstrates:
//! - Building a source with a custom method, headers and a JSON body
//! - Serving the request from a task that plays the HTTP client
//! - Delivering the body in small cumulative chunks
//! - Listeners, primary handlers and a restart carrying `Last-Event-ID`
//!
//! Usage:
//!   cargo run --example replay
//!   cargo run --example replay -- --debug
//!   cargo run --example replay -- --chunk 3

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use sse_source::{
    ChannelTransport, EventSource, Listener, Notification, NotificationPump, Payload, PumpHandle,
    TransportRequest,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const RECORDED: &str = "\
: replay of a price feed\n\
\n\
id: 1\n\
event: price\n\
data: {\"symbol\":\"ABC\",\"bid\":101.5}\n\
\n\
id: 2\n\
event: price\n\
data: {\"symbol\":\"ABC\",\"bid\":101.7}\n\
\n\
retry: 3000\n\
data: heartbeat\n\
\n\
id: 3\n\
event: halt\n\
data: trading paused\n\
data: resumes at 10:00";

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    chunk: usize,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let chunk = args
            .iter()
            .position(|a| a == "--chunk")
            .and_then(|i| args.get(i + 1))
            .and_then(|v| v.parse().ok())
            .unwrap_or(7);

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            chunk: chunk.max(1),
        }
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== Replay ===\n");

    let (transport, requests) = ChannelTransport::new();

    let source = EventSource::builder()
        .url("https://example.com/prices")
        .method("REPORT")
        .header("Accept", "text/event-stream")
        .payload(Payload::json(&json!({ "symbols": ["ABC"] }))?)
        .debug(args.debug)
        .start(false)
        .build(Arc::new(transport))?;

    source.add_event_listener(
        "price",
        &Listener::new(|event| {
            println!("[price]   id={:?} {}", event.id(), event.data().unwrap_or_default());
        }),
    );
    source.add_event_listener(
        "halt",
        &Listener::new(|event| {
            println!("[halt]    {:?}", event.data().unwrap_or_default());
        }),
    );
    source.set_on_message(Some(Listener::new(|event| {
        println!(
            "[message] {} (retry {:?})",
            event.data().unwrap_or_default(),
            event.retry()
        );
    })));
    source.set_on_ready_state_change(Some(Listener::new(|event| {
        if let Some(state) = event.ready_state() {
            println!("[state]   {state}");
        }
    })));

    let (pump, handle) = NotificationPump::new(source.clone());
    let pump_task = tokio::spawn(pump.run());
    let server_task = tokio::spawn(serve(requests, handle, args.chunk));

    // ========================================================================
    // First attempt
    // ========================================================================

    source.stream()?;
    while source.is_live() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    println!("\n        ✓ Stream complete, last id {:?}\n", source.last_event_id());

    // ========================================================================
    // Restart
    // ========================================================================

    source.stream()?;
    tokio::time::sleep(Duration::from_millis(20)).await;
    source.close();

    drop(source);
    let served = server_task.await?;
    let applied = pump_task.await?;
    println!("\n        ✓ {served} requests served, {applied} notifications applied");

    Ok(())
}

// ============================================================================
// Functions
// ============================================================================

/// Plays the HTTP client: answers every request with the recorded body.
async fn serve(
    mut requests: mpsc::UnboundedReceiver<TransportRequest>,
    handle: PumpHandle,
    chunk: usize,
) -> usize {
    let mut served = 0;

    while let Some(request) = requests.recv().await {
        match request {
            TransportRequest::Open { method, url } => println!("[request] {method} {url}"),
            TransportRequest::Header { name, value } => println!("[request] {name}: {value}"),
            TransportRequest::Credentials(_) => {}
            TransportRequest::Send(payload) => {
                served += 1;
                if served > 1 {
                    // Restarted attempts get an empty stream that stays open.
                    let _ = handle.progress("", 200);
                    continue;
                }

                if let Some(bytes) = payload.and_then(|p| p.to_bytes().ok()) {
                    println!("[request] body {}\n", String::from_utf8_lossy(&bytes));
                }

                let mut end = 0;
                while end < RECORDED.len() {
                    end = (end + chunk).min(RECORDED.len());
                    while !RECORDED.is_char_boundary(end) {
                        end += 1;
                    }
                    let _ = handle.progress(&RECORDED[..end], 200);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                let _ = handle.load(RECORDED);
            }
            TransportRequest::Abort => {
                println!("[request] abort");
                let _ = handle.notify(Notification::Abort);
                break;
            }
        }
    }

    handle.shutdown();
    served
}

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "sse_source=debug"
    } else {
        "sse_source=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
