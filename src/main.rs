//! Terminal front end for the guard attendance client.
//!
//! Stdin stands in for the device: a typed line is the scanned QR payload,
//! the configured image file is the camera, and the configured coordinates
//! are the location fix.

use anyhow::Result;
use guard_attendance::{
    create_app, AppConfig, AppState, MetricsType, PostSubmitAction, ScanOutcome, SubmitOutcome,
    WorkflowError, WorkflowState,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;
use tracing_subscriber::EnvFilter;

type Input = Lines<BufReader<Stdin>>;

/// A line of user input, with the global commands split out.
enum Command {
    Line(String),
    Logout,
    Quit,
}

/// How a workflow run ended.
enum RunEnd {
    /// Guard asked to log out.
    Logout,

    /// Server invalidated the session; it is already cleared.
    Invalidated,

    /// Successful submission acknowledged with `PostSubmitAction::Exit`.
    Exit,

    Quit,
}

async fn read_command(input: &mut Input, label: &str) -> Result<Command> {
    // ---
    print!("{label}");
    std::io::stdout().flush()?;

    let Some(line) = input.next_line().await? else {
        return Ok(Command::Quit);
    };

    let line = line.trim().to_string();
    Ok(match line.to_ascii_lowercase().as_str() {
        "logout" => Command::Logout,
        "quit" | "exit" => Command::Quit,
        _ => Command::Line(line),
    })
}

/// Login gate. Returns `false` if the user quit instead of logging in.
async fn gate(app: &AppState, input: &mut Input) -> Result<bool> {
    // ---
    loop {
        let candidate = match read_command(input, "Enter your ID (e.g., guard1): ").await? {
            Command::Line(line) => line,
            Command::Logout => continue,
            Command::Quit => return Ok(false),
        };

        match app.session().login(&candidate).await {
            Ok(()) => return Ok(true),
            Err(e) => println!("{}", e.notice()),
        }
    }
}

async fn run_workflow(app: &AppState, input: &mut Input) -> Result<RunEnd> {
    // ---
    let workflow = app.start_workflow()?;
    let user_name = app.session().user_name().unwrap_or_default();

    println!();
    println!("Guard: {user_name}   (type 'logout' or 'quit' at any prompt)");

    loop {
        match workflow.state() {
            WorkflowState::AwaitingScan => {
                println!("== Scan Checkpost ==");
                let payload = match read_command(input, "QR payload: ").await? {
                    Command::Line(line) => line,
                    Command::Logout => return Ok(RunEnd::Logout),
                    Command::Quit => return Ok(RunEnd::Quit),
                };

                match workflow.on_scan(&payload).await {
                    ScanOutcome::Verified { checkpoint } => {
                        println!("Checkpoint {checkpoint} verified.");
                    }
                    ScanOutcome::Ignored => {}
                    outcome => {
                        if let Some(notice) = outcome.notice() {
                            println!("{notice}");
                        }
                    }
                }
            }

            WorkflowState::ScanFailed { .. } => {
                match read_command(input, "Press enter to scan again: ").await? {
                    Command::Line(_) => workflow.rescan()?,
                    Command::Logout => return Ok(RunEnd::Logout),
                    Command::Quit => return Ok(RunEnd::Quit),
                }
            }

            WorkflowState::ReadyToCapture { .. } => {
                println!("== Capture Selfie ==");
                match read_command(input, "[c]apture: ").await? {
                    Command::Line(line) if line == "c" => capture(&workflow).await?,
                    Command::Line(_) => {}
                    Command::Logout => return Ok(RunEnd::Logout),
                    Command::Quit => return Ok(RunEnd::Quit),
                }
            }

            WorkflowState::PhotoCaptured { photo, .. } => {
                println!("Photo ready ({} bytes, {}).", photo.bytes.len(), photo.content_type);
                let choice =
                    match read_command(input, "[c]apture again, [r]etake, [s]ubmit attendance: ")
                        .await?
                    {
                        Command::Line(line) => line,
                        Command::Logout => return Ok(RunEnd::Logout),
                        Command::Quit => return Ok(RunEnd::Quit),
                    };

                match choice.as_str() {
                    "c" => capture(&workflow).await?,
                    "r" => workflow.retake()?,
                    "s" => {
                        println!("Submitting attendance...");
                        if let Some(end) = submit(&workflow, input).await? {
                            return Ok(end);
                        }
                    }
                    _ => {}
                }
            }

            WorkflowState::Abandoned => return Ok(RunEnd::Invalidated),

            other => {
                // Submit and scan are awaited inline, so busy states never reach here.
                tracing::error!("Unexpected workflow state: {}", other.name());
                return Ok(RunEnd::Logout);
            }
        }
    }
}

async fn capture(workflow: &guard_attendance::AttendanceWorkflow) -> Result<()> {
    // ---
    match workflow.capture().await {
        Ok(()) => Ok(()),
        Err(WorkflowError::Camera(message)) => {
            println!("Camera error: {message}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Runs a submission. `Some` ends the run; `None` stays on the selfie screen.
async fn submit(
    workflow: &guard_attendance::AttendanceWorkflow,
    input: &mut Input,
) -> Result<Option<RunEnd>> {
    // ---
    match workflow.submit().await {
        SubmitOutcome::Submitted(notice) => {
            println!("{notice}");
            if let Command::Quit = read_command(input, "[OK] ").await? {
                return Ok(Some(RunEnd::Quit));
            }
            match workflow.acknowledge()? {
                PostSubmitAction::Exit => Ok(Some(RunEnd::Exit)),
                PostSubmitAction::Continue => Ok(None),
            }
        }
        SubmitOutcome::SessionInvalidated(notice) => {
            println!("{notice}");
            let _ = read_command(input, "[Re-login] ").await?;
            Ok(Some(RunEnd::Invalidated))
        }
        SubmitOutcome::Ignored => Ok(None),
        outcome => {
            if let Some(notice) = outcome.notice() {
                println!("{notice}");
            }
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenvy::dotenv().ok();

    // Logs go to stderr so they do not interleave with prompts.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Guard Attendance client v{}...", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::from_env()?;
    let app = create_app(&config)?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    app.session().initialize().await;

    loop {
        if !app.session().is_logged_in() && !gate(&app, &mut input).await? {
            break;
        }

        match run_workflow(&app, &mut input).await? {
            RunEnd::Logout => app.session().logout().await,
            RunEnd::Invalidated => {}
            RunEnd::Exit => {
                info!("Attendance submitted; exiting");
                break;
            }
            RunEnd::Quit => break,
        }
    }

    if config.metrics.kind == MetricsType::Prometheus {
        eprintln!("{}", app.metrics().render());
    }

    Ok(())
}
