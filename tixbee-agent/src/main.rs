//! TixBee terminal chat
//!
//! Talks to the booking assistant over stdin/stdout. When the assistant asks
//! for payment, the UPI QR is written next to the binary as a PNG, and the
//! confirmation email goes out once the payment window has elapsed.
//!
//! Requires: ANTHROPIC_API_KEY (or in .env); EMAIL_* to actually send mail
//! Usage: tixbee

use anyhow::Result;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use tixbee_agent::prompt::FAREWELL_MESSAGE;
use tixbee_agent::{
    init_tracing, payment_window, Agent, AgentConfig, ConfirmationJob, ConversationSession,
    MailStatus, TurnOutcome,
};
use tixbee_core::PAYMENT_MARKER;

fn qr_file_name(outcome: &TurnOutcome) -> PathBuf {
    match &outcome.booking {
        Some(booking) => PathBuf::from(format!("payment_qr_{}.png", booking.booking_id)),
        None => PathBuf::from("payment_qr.png"),
    }
}

/// Waits out the payment window with a visible countdown, then mails.
async fn wait_and_send(agent: &Agent, job: ConfirmationJob) -> Option<MailStatus> {
    // The handle stays alive so the window elapses rather than cancels.
    let (_handle, window) = payment_window::open(agent.payment_window);
    let mut remaining = window.duration().as_secs();
    let run = job.run(window, &agent.mailer);
    tokio::pin!(run);

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            status = &mut run => {
                println!();
                return status;
            }
            _ = ticker.tick() => {
                print!("\r⏳ Sending your confirmation email in {:>2}s ", remaining);
                io::stdout().flush().ok();
                remaining = remaining.saturating_sub(1);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    init_tracing("warn");

    let config = AgentConfig::from_env()?;
    let agent = Agent::from_config(&config)?;

    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║          TixBee - Bengaluru Attraction Tickets 🐝          ║");
    println!("╚════════════════════════════════════════════════════════════╝\n");
    if !agent.mailer.is_enabled() {
        println!("(EMAIL_* not set: confirmation emails will not be sent)\n");
    }
    println!("Type 'exit' or 'quit' to end.\n");

    let session_id = format!("sess_{}", uuid::Uuid::new_v4());
    let mut session = ConversationSession::new(session_id, &agent.services);
    if let Some(greeting) = session.turns().last() {
        println!("TixBee: {}", greeting.text);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nYou: ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "exit" | "quit") {
            println!("\n{}", FAREWELL_MESSAGE);
            break;
        }

        let outcome = session.handle_user_turn(input, &agent.services).await;
        if outcome.generation_failed {
            println!("\n✗ {}", outcome.reply);
            continue;
        }

        let mut reply = outcome.reply.clone();
        if let Some(png) = &outcome.payment_qr {
            let path = qr_file_name(&outcome);
            match tokio::fs::write(&path, png).await {
                Ok(()) => {
                    reply = reply.replace(PAYMENT_MARKER, &format!("(QR saved to {})", path.display()))
                }
                Err(e) => eprintln!("✗ Could not save payment QR: {}", e),
            }
        }
        println!("\nTixBee: {}", reply);

        if let Some(e) = &outcome.extraction_error {
            println!("\n⚠ Could not complete the booking ({}). No confirmation email will be sent.", e);
        }

        if let Some(job) = outcome.confirmation {
            match wait_and_send(&agent, job).await {
                Some(status) if status.success => println!("✅ {}", status.message),
                Some(status) => println!("✗ Failed to send email: {}", status.message),
                None => println!("Payment window cancelled."),
            }
            println!("\n{}", FAREWELL_MESSAGE);
            break;
        }
    }

    Ok(())
}
