use colored::*;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use trip_assistant::TripApp;
use trip_assistant::assistant::{Session, resolve_mode};
use trip_assistant::config::Config;
use trip_assistant::error::{AssistantError, Result};
use trip_assistant::format::{render_itinerary, render_route_failure, separator};
use trip_assistant::llm::BackendId;
use trip_assistant::models::VehicleMode;

/// Line-oriented console input; `None` means stdin was closed
struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{prompt}");
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?.map(|l| l.trim().to_string()))
    }

    /// Re-prompt with `retry` until something non-empty is typed
    async fn ask_non_empty(&mut self, prompt: &str, retry: &str) -> Result<Option<String>> {
        let mut answer = self.ask(prompt).await?;
        while let Some(text) = &answer {
            if !text.is_empty() {
                break;
            }
            answer = self.ask(retry).await?;
        }
        Ok(answer)
    }
}

enum Flow {
    Continue,
    Exit,
}

fn display_header(message: &str, ch: char) {
    println!("{}", separator(ch));
    println!("{}", message.bright_cyan());
    println!("{}", separator(ch));
}

fn report(err: &AssistantError) {
    match err {
        AssistantError::Route {
            start,
            end,
            mode,
            source,
        } => print!(
            "{}",
            render_route_failure(start, end, *mode, &source.display_message())
        ),
        AssistantError::NoRoute | AssistantError::Incomplete(_) | AssistantError::EmptyInput(_) => {
            println!("{}", err.to_string().yellow())
        }
        other => println!("{}", other.to_string().red()),
    }
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("{}", warning.yellow());
    }
}

async fn plan_route(app: &TripApp, session: &mut Session, console: &mut Console) -> Result<Flow> {
    display_header("Vehicle profiles available on Graphhopper:", '+');
    println!("{}", VehicleMode::profile_list());
    println!("{}", separator('+'));

    let Some(vehicle) = console
        .ask("Enter a vehicle profile from the list above: ")
        .await?
    else {
        return Ok(Flow::Exit);
    };
    if matches!(vehicle.to_lowercase().as_str(), "q" | "quit") {
        return Ok(Flow::Exit);
    }

    let (mode, warning) = resolve_mode(&vehicle);
    if let Some(warning) = warning {
        println!("{}", warning.yellow());
    }

    let Some(start) = console
        .ask_non_empty("Starting Location: ", "Enter location again: ")
        .await?
    else {
        return Ok(Flow::Exit);
    };
    let origin = match app.assistant.resolve_start(&start).await {
        Ok(place) => place,
        Err(e) => {
            report(&e);
            return Ok(Flow::Continue);
        }
    };

    let Some(end) = console
        .ask_non_empty("Destination: ", "Enter destination again: ")
        .await?
    else {
        return Ok(Flow::Exit);
    };
    let destination = match app.assistant.resolve_destination(&end).await {
        Ok(place) => place,
        Err(e) => {
            report(&e);
            return Ok(Flow::Continue);
        }
    };

    match app
        .assistant
        .route_between(session, origin, destination, mode)
        .await
    {
        Ok(trip) => print!("{}", render_itinerary(&trip)),
        Err(e) => report(&e),
    }
    Ok(Flow::Continue)
}

async fn llm_menu(
    app: &TripApp,
    session: &mut Session,
    console: &mut Console,
    backend: &mut BackendId,
) -> Result<Flow> {
    loop {
        display_header(&format!("LLM features (backend: {})", backend.label()), '=');
        println!("1. Parse a trip request");
        println!("2. Plan a new trip from a request");
        println!("3. Summarize the current route");
        println!("4. Suggest points of interest");
        println!("5. Ask a question about the route");
        println!("6. Switch text generation backend");
        println!("7. Back to main menu");

        let Some(choice) = console.ask("Choose an option: ").await? else {
            return Ok(Flow::Exit);
        };

        let result = match choice.as_str() {
            "1" => {
                let Some(text) = console.ask("Describe your trip: ").await? else {
                    return Ok(Flow::Exit);
                };
                app.assistant
                    .parse_natural_language(&text, *backend)
                    .await
                    .map(|query| {
                        println!("Start: {}", query.start_location);
                        println!("Destination: {}", query.end_location);
                        println!("Vehicle: {}", query.vehicle_preference);
                    })
            }
            "2" => {
                if !session.has_route() {
                    report(&AssistantError::NoRoute);
                    continue;
                }
                let Some(text) = console.ask("Describe your trip: ").await? else {
                    return Ok(Flow::Exit);
                };
                app.assistant
                    .plan_from_natural_language(session, &text, *backend)
                    .await
                    .map(|(_, outcome)| {
                        print_warnings(&outcome.warnings);
                        print!("{}", render_itinerary(&outcome.trip));
                    })
            }
            "3" => app
                .assistant
                .summarize_route(session, *backend)
                .await
                .map(|text| println!("{text}")),
            "4" => app
                .assistant
                .suggest_points_of_interest(session, *backend)
                .await
                .map(|text| println!("{text}")),
            "5" => {
                if !session.has_route() {
                    report(&AssistantError::NoRoute);
                    continue;
                }
                let Some(question) = console.ask("Your question: ").await? else {
                    return Ok(Flow::Exit);
                };
                app.assistant
                    .answer_question(session, &question, *backend)
                    .await
                    .map(|text| println!("{text}"))
            }
            "6" => {
                let names: Vec<&str> = BackendId::ALL.iter().map(|b| b.as_str()).collect();
                let Some(name) = console
                    .ask(&format!("Backend ({}): ", names.join(", ")))
                    .await?
                else {
                    return Ok(Flow::Exit);
                };
                let selected = app.select_backend(&name);
                if name.parse::<BackendId>().is_err() {
                    println!(
                        "{}",
                        format!("Unknown backend '{name}', using {}", selected.label()).yellow()
                    );
                }
                *backend = selected;
                Ok(())
            }
            "7" => return Ok(Flow::Continue),
            other => {
                println!("Invalid option: {other}");
                Ok(())
            }
        };

        if let Err(e) = result {
            report(&e);
        }
    }
}

async fn run(app: TripApp) -> Result<()> {
    let mut session = Session::new();
    let mut console = Console::new();
    let mut backend = app.default_backend();

    loop {
        display_header("Trip Assistant", '=');
        println!("1. Plan a route");
        println!("2. LLM features");
        println!("3. Exit");

        let Some(choice) = console.ask("Choose an option: ").await? else {
            break;
        };

        let flow = match choice.as_str() {
            "1" => plan_route(&app, &mut session, &mut console).await,
            "2" => llm_menu(&app, &mut session, &mut console, &mut backend).await,
            "3" | "q" | "quit" => Ok(Flow::Exit),
            other => {
                println!("Invalid option: {other}");
                Ok(Flow::Continue)
            }
        };

        match flow {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(e) => println!("{}", format!("An unexpected error occurred: {e}").red()),
        }
    }

    println!("Exiting program.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,trip_assistant=info")),
        )
        .init();

    let config = Config::load();
    let app = TripApp::new(&config)?;

    tokio::select! {
        res = run(app) => Ok(res?),
        _ = tokio::signal::ctrl_c() => {
            println!("\nProgram terminated by user.");
            // stdin is read on a blocking thread the runtime would otherwise wait for
            std::process::exit(0);
        }
    }
}
