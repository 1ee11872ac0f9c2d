//! TixBee HTTP API server
//! Serves the booking conversation to web front ends; see `tixbee_agent::http`
//! for the routes.

use anyhow::{Context, Result};
use std::sync::Arc;

use tixbee_agent::http::{SessionLimits, SessionRegistry};
use tixbee_agent::{http, init_tracing, Agent, AgentConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    init_tracing("info");

    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║              TixBee - HTTP API Server                      ║");
    println!("║      Session-based booking conversations (Claude)          ║");
    println!("╚════════════════════════════════════════════════════════════╝\n");

    let config = AgentConfig::from_env()?;
    println!("[INIT] Server configuration:");
    println!("  Port: {}", config.http_port);
    println!("  Model: {}", config.llm.model);
    println!("  Payee: {}", config.upi_id);
    println!("  Payment window: {}s", config.payment_window.as_secs());
    println!("  Turn logs: {}", config.log_dir.display());
    println!(
        "  Sessions: up to {}, idle timeout {}s",
        config.max_sessions,
        config.session_idle_ttl.as_secs()
    );
    if config.mail.is_none() {
        println!("  Email: disabled (EMAIL_* not set)");
    }

    let agent = Arc::new(Agent::from_config(&config)?);
    let sessions = SessionRegistry::new(SessionLimits {
        idle_ttl: config.session_idle_ttl,
        max_sessions: config.max_sessions,
        ..SessionLimits::default()
    });
    let app = http::router(agent, sessions);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.http_port))?;

    println!("\n[STARTUP] ✓ TixBee HTTP Server running on http://0.0.0.0:{}", config.http_port);
    println!("  POST /chat                          — Send a message");
    println!("  GET  /sessions/:id                  — Conversation and mail status");
    println!("  POST /sessions/:id/payment/confirm  — Payment done, send confirmation now");
    println!("  POST /sessions/:id/payment/cancel   — Abandon the booking");
    println!("  GET  /health                        — Check server health\n");

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
