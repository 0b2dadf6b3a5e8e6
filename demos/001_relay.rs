//! Intercepting client demonstration.
//!
//! Connects to a WebSocket server, prints every frame after inbound
//! rewriting and reports what the engine observed. Configuration comes from
//! the `WS_INTERCEPTOR_*` environment variables.
//!
//! Usage:
//!   cargo run --example 001_relay -- ws://127.0.0.1:9000/socket
//!   cargo run --example 001_relay -- ws://host/socket --download-base=https://host
//!   cargo run --example 001_relay -- ws://host/socket --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use anyhow::Context;
use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message;

use common::Args;
use ws_interceptor::transport::connect;
use ws_interceptor::{InterceptEvent, InterceptorBuilder};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== 001: Intercepting Relay ===\n");

    // ========================================================================
    // Setup
    // ========================================================================

    let interceptor = InterceptorBuilder::from_env()
        .context("reading WS_INTERCEPTOR_* variables")?
        .observer(|event| match event {
            InterceptEvent::ParamsExtracted(params) => {
                println!("[Params] report {} ({})", params.report_id, params.report_type);
            }
            InterceptEvent::WriteFileEnd { direction, .. } => {
                println!("[WriteEnd] {direction:?}");
            }
            InterceptEvent::FrameBlocked { pattern } => {
                println!("[Blocked] matched {pattern:?}");
            }
        })
        .build();

    println!("[Config] {:?}", interceptor.config().snapshot());

    let mut stream = connect(&args.url, &interceptor)
        .await
        .with_context(|| format!("connecting to {}", args.url))?;

    println!("[Connected] {}\n", args.url);

    // ========================================================================
    // Relay
    // ========================================================================

    while let Some(frame) = stream.next().await {
        match frame.context("reading frame")? {
            Message::Text(text) => println!("[Text] {}", text.as_str()),
            Message::Binary(bytes) => println!("[Binary] {} bytes", bytes.len()),
            Message::Close(_) => break,
            _ => {}
        }

        if let (Some(base), Some(params)) = (&args.download_base, interceptor.params().take()) {
            println!("[Download] {}", params.download_url(base)?);
        }
    }

    println!("\n=== Done ===");
    Ok(())
}
