//! Prompt builder - chat with an assistant to craft generation prompts
//!
//! An interactive terminal client for the prompt-builder backend. The user
//! refines an image, storyboard or outline prompt through conversation and
//! then generates the artifact from the assistant's final prompt.

mod api;
mod cli;
mod config;
mod reference;
mod render;
mod runtime;
mod state_machine;

use api::{HttpApi, HttpImageService, LoggingApi};
use clap::Parser;
use cli::Command;
use config::ClientConfig;
use runtime::SessionHandle;
use state_machine::{ClientState, Event, Message, NoticeLevel, Role, UiEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::parse();
    init_tracing(config.log_json);

    let image_service = HttpImageService::new(config.image_service_url())?;
    let api = LoggingApi::new(HttpApi::new(&config.api_url)?);
    let images = LoggingApi::new(image_service.clone());

    tracing::info!(
        api_url = %config.api_url,
        image_url = %config.image_service_url(),
        mode = %config.mode,
        authenticated = config.token.is_some(),
        "Starting prompt builder"
    );

    let handle = runtime::start_session(api, images, config.auth(), config.mode);
    let mut ui_rx = handle.subscribe();
    tracing::debug!(session_id = %handle.session_id, "Session started");

    println!("{}", cli::HELP);
    print_transcript(&handle.state());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Ok(Command::Quit) => {
                        if !handle.state().is_quiescent() {
                            println!("Abandoning requests still in flight.");
                        }
                        break;
                    }
                    Ok(command) => run_command(command, &handle, &image_service, &config).await?,
                    Err(e) => println!("{e}"),
                }
            }
            ui_event = ui_rx.recv() => match ui_event {
                Ok(UiEvent::AuthExpired) => {
                    println!("Your session has expired. Please sign in again.");
                    break;
                }
                Ok(event) => print_ui_event(&event, &handle.state()),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Terminal fell behind session events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "prompt_builder=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run_command(
    command: Command,
    handle: &SessionHandle,
    image_service: &HttpImageService,
    config: &ClientConfig,
) -> Result<(), runtime::RuntimeError> {
    let event = match command {
        Command::Send(text) => Event::UserMessage { text },
        Command::Mode(mode) => Event::ModeSelected { mode },
        Command::Clear => Event::ClearRequested,
        Command::Generate(message_index) => Event::GenerateRequested { message_index },
        Command::ReferenceOpen => {
            print_reference(&handle.state());
            Event::ReferencePanelOpened
        }
        Command::ReferenceClose => Event::ReferencePanelClosed,
        Command::ReferenceText(text) => Event::ReferenceTextSubmitted { text },
        Command::Upload(path) => match reference::load_document(&path).await {
            Ok(document) => Event::DocumentSelected { document },
            Err(e) => {
                println!("{e}");
                return Ok(());
            }
        },
        Command::Show => {
            print_transcript(&handle.state());
            return Ok(());
        }
        Command::Download(dir) => {
            let dir = dir.unwrap_or_else(|| config.download_dir.clone());
            download_image(&handle.state(), image_service, &dir).await;
            return Ok(());
        }
        Command::Help => {
            println!("{}", cli::HELP);
            return Ok(());
        }
        Command::Quit => return Ok(()),
    };
    handle.send(event).await
}

/// Save the generated image, or failing that the latest image embedded in
/// an assistant message
async fn download_image(state: &ClientState, service: &HttpImageService, dir: &std::path::Path) {
    let url = Some(state.session.generated_image_url.clone())
        .filter(|url| !url.is_empty())
        .or_else(|| {
            state
                .messages()
                .iter()
                .rev()
                .filter(|m| m.role == Role::Assistant)
                .find_map(|m| render::embedded_image_url(&m.content))
        });

    let Some(url) = url else {
        println!("No generated image to download");
        return;
    };
    match service.download(&url, dir).await {
        Ok(path) => println!("Saved {}", path.display()),
        Err(e) => println!("Download failed: {e}"),
    }
}

fn print_transcript(state: &ClientState) {
    println!("=== {} ===", state.mode().label());
    for (index, message) in state.messages().iter().enumerate() {
        print_message(index, message, state);
    }
}

fn print_message(index: usize, message: &Message, state: &ClientState) {
    let speaker = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    println!("[{index}] {speaker}:");
    println!("{}", render::render_markdown(&message.content));

    if message.qualifies_for_generation() {
        let kind = state.mode().generation_kind();
        let flight = state.generation_flight(kind);
        if flight.owner() == Some(index) {
            println!("    ({})", kind.progress_text());
        } else {
            println!("    > {} (/generate {index})", kind.button_text());
        }
    }
    println!();
}

fn print_reference(state: &ClientState) {
    if !state.mode().uses_reference() {
        println!("Reference content is only used in e-learning mode.");
    }
    println!("{}", state.session.reference_status);
    if !state.session.reference_content.is_empty() {
        println!("{}", state.session.reference_content);
    }
    println!("Use /ref text <content> or /upload <file.docx>, /ref close to close.");
}

fn print_ui_event(event: &UiEvent, state: &ClientState) {
    match event {
        UiEvent::SessionReset { .. } => print_transcript(state),
        UiEvent::MessageAppended { index, message } => print_message(*index, message, state),
        UiEvent::ChatPending => println!("..."),
        UiEvent::GenerationStarted { kind, .. } => println!("{}", kind.progress_text()),
        // The artifact itself arrives as a transcript message
        UiEvent::ImageReady { url } => println!("Image ready at {url}. Use /download to save it."),
        UiEvent::ContentReady { kind, content } => {
            println!("{kind} ready ({} characters).", content.chars().count());
        }
        UiEvent::UploadStarted => println!("Uploading document..."),
        UiEvent::ReferenceUpdated { status } => println!("{status}"),
        UiEvent::ReferencePanel { open } => {
            if !open {
                println!("Reference panel closed.");
            }
        }
        UiEvent::AuthExpired => println!("Your session has expired."),
        UiEvent::Notice(notice) => match notice.level {
            NoticeLevel::Success => println!("{}", notice.text),
            NoticeLevel::Error => println!("error: {}", notice.text),
            NoticeLevel::Alert => println!("! {}", notice.text),
        },
    }
}
