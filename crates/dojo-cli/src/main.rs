//! `dojo` - play Review Dojo missions from the terminal
//!
//! Each invocation loads progress from the state file, performs one action
//! and saves.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dojo_core::{Catalog, Certificate, EngineConfig, MissionId, MissionState, Rank};
use dojo_session::{JsonFileStore, NextStep, Session, SessionHandle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_STATE: &str = "dojo-progress.json";

type Handle = SessionHandle<JsonFileStore>;

fn cli() -> Command {
    Command::new("dojo")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Review Dojo: fix flawed snippets, earn points, unlock missions")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration (TOML)"),
        )
        .arg(
            Arg::new("state")
                .long("state")
                .global(true)
                .default_value(DEFAULT_STATE)
                .value_parser(value_parser!(PathBuf))
                .help("Progress file"),
        )
        .arg(
            Arg::new("catalog")
                .long("catalog")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Mission catalog (.toml or .json); defaults to the built-in course"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(Command::new("missions").about("List missions and their state"))
        .subcommand(
            Command::new("show")
                .about("Show a mission's objective, hint and starting snippet")
                .arg(mission_arg()),
        )
        .subcommand(
            Command::new("submit")
                .about("Submit an edited snippet for a mission")
                .arg(mission_arg())
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("File holding the edited snippet"),
                ),
        )
        .subcommand(
            Command::new("reveal")
                .about("Show the reference answer; unlocks the next mission without points")
                .arg(mission_arg()),
        )
        .subcommand(Command::new("status").about("Show score, rank and progress"))
        .subcommand(Command::new("reset").about("Clear all progress"))
        .subcommand(
            Command::new("check-catalog")
                .about("Validate a mission catalog file")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

fn mission_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_parser(value_parser!(u32))
        .help("Mission number")
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("json"));

    match run(&matches).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

async fn run(matches: &ArgMatches) -> Result<ExitCode> {
    if let Some(("check-catalog", args)) = matches.subcommand() {
        let path = args
            .get_one::<PathBuf>("path")
            .context("missing catalog path")?;
        return check_catalog(path);
    }

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let catalog = match matches.get_one::<PathBuf>("catalog") {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => Catalog::builtin().context("built-in catalog is invalid")?,
    };
    let state = matches
        .get_one::<PathBuf>("state")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE));
    tracing::debug!(state = %state.display(), missions = catalog.len(), "opening session");

    let handle = SessionHandle::new(Session::open(catalog, JsonFileStore::new(state), config));
    welcome(&handle)?;

    match matches.subcommand() {
        Some(("missions", _)) => Ok(list_missions(&handle)),
        Some(("show", args)) => show(&handle, mission_id(args)?),
        Some(("submit", args)) => {
            let file = args.get_one::<PathBuf>("file").context("missing file")?;
            submit(&handle, mission_id(args)?, file).await
        }
        Some(("reveal", args)) => reveal(&handle, mission_id(args)?),
        Some(("status", _)) => Ok(status(&handle)),
        Some(("reset", _)) => {
            handle.reset().context("failed to reset progress")?;
            println!("Progress cleared. Mission 1 is waiting.");
            Ok(ExitCode::SUCCESS)
        }
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("no command given"),
    }
}

fn mission_id(args: &ArgMatches) -> Result<MissionId> {
    args.get_one::<u32>("id")
        .copied()
        .map(MissionId)
        .context("missing mission id")
}

fn welcome(handle: &Handle) -> Result<()> {
    let snapshot = handle.snapshot();
    if snapshot.progress.onboarding_seen {
        return Ok(());
    }
    println!("Welcome to Review Dojo.");
    println!("Each mission hands you a flawed snippet. Fix it, save it to a file,");
    println!("and run `dojo submit <id> <file>`. Stuck? `dojo reveal <id>` shows the");
    println!("answer and unlocks the next mission, but earns no points.");
    println!();
    handle
        .mark_onboarding_seen()
        .context("failed to save onboarding flag")?;
    Ok(())
}

fn list_missions(handle: &Handle) -> ExitCode {
    handle.with_session(|session| {
        for (id, state) in session.mission_states() {
            let marker = match state {
                MissionState::Completed => "done",
                MissionState::Unlocked => "open",
                MissionState::Locked => "locked",
            };
            let title = session
                .catalog()
                .get(id)
                .map_or("", |m| m.title.as_str());
            println!("{id:>3}  [{marker:<6}]  {title}");
        }
    });
    ExitCode::SUCCESS
}

fn show(handle: &Handle, id: MissionId) -> Result<ExitCode> {
    handle.select_mission(id)?;
    handle.with_session(|session| -> Result<()> {
        let mission = session.current_mission()?;
        println!("Mission {}: {}", mission.id, mission.title);
        if session.progress().is_completed(mission.id) {
            println!("(completed)");
        }
        if !mission.objective.is_empty() {
            println!();
            println!("{}", mission.objective);
        }
        println!();
        println!("{}", mission.starting_snippet);
        if !mission.hint.is_empty() {
            println!();
            println!("Hint: {}", mission.hint);
        }
        Ok(())
    })?;
    Ok(ExitCode::SUCCESS)
}

async fn submit(handle: &Handle, id: MissionId, file: &Path) -> Result<ExitCode> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    handle.select_mission(id)?;

    println!("Checking...");
    let snapshot = handle.submit(&text).await?;
    let outcome = snapshot.result.outcome;

    if let Some(message) = outcome.message() {
        println!("{message}");
        let report = &snapshot.result.report;
        if !report.missing_required.is_empty() {
            println!("  {} required change(s) not found", report.missing_required.len());
        }
        if !report.forbidden_present.is_empty() {
            println!("  {} problem(s) still present", report.forbidden_present.len());
        }
        let hint = handle.with_session(|s| s.current_mission().map(|m| m.hint.clone()))?;
        if !hint.is_empty() {
            println!("Hint: {hint}");
        }
        println!("Accuracy: {}", snapshot.accuracy);
        return Ok(ExitCode::FAILURE);
    }

    if snapshot.score_delta > 0 {
        println!(
            "Accepted! +{} points (total {})",
            snapshot.score_delta, snapshot.progress.score
        );
    } else {
        println!("Accepted. (already completed, no points)");
    }
    let explanation =
        handle.with_session(|s| s.current_mission().map(|m| m.explanation.clone()))?;
    if !explanation.is_empty() {
        println!();
        println!("{explanation}");
    }
    announce_next(handle)?;
    Ok(ExitCode::SUCCESS)
}

fn reveal(handle: &Handle, id: MissionId) -> Result<ExitCode> {
    handle.select_mission(id)?;
    let disclosure = handle.reveal()?;
    println!("Reference answer for mission {}:", disclosure.mission_id);
    println!();
    println!("{}", disclosure.reference_snippet);
    if !disclosure.explanation.is_empty() {
        println!();
        println!("{}", disclosure.explanation);
    }
    announce_next(handle)?;
    Ok(ExitCode::SUCCESS)
}

fn announce_next(handle: &Handle) -> Result<()> {
    match handle.next_mission()? {
        NextStep::Mission { id } => println!("\nMission {id} is unlocked."),
        NextStep::CourseComplete { certificate } => print_certificate(&certificate),
    }
    Ok(())
}

fn status(handle: &Handle) -> ExitCode {
    let snapshot = handle.snapshot();
    let progress = &snapshot.progress;
    println!("Score:     {} ({})", progress.score, Rank::from_score(progress.score));
    println!(
        "Completed: {}/{}",
        progress.completed.len(),
        snapshot.total_missions
    );
    println!("Unlocked:  up to mission {}", progress.furthest_reached);
    if progress.completed.len() == snapshot.total_missions {
        print_certificate(&Certificate::issue(progress, snapshot.total_missions));
    }
    ExitCode::SUCCESS
}

fn print_certificate(certificate: &Certificate) {
    println!();
    println!("=== Certificate of Completion ===");
    println!("Points: {}", certificate.points);
    println!("Rank:   {}", certificate.rank);
    println!(
        "Missions completed without help: {}/{}",
        certificate.completed_count, certificate.total_missions
    );
}

fn check_catalog(path: &Path) -> Result<ExitCode> {
    let catalog = Catalog::load(path)
        .with_context(|| format!("catalog {} is invalid", path.display()))?;
    println!("{}: {} missions OK", path.display(), catalog.len());
    for mission in &catalog {
        if mission.has_empty_rule() {
            println!(
                "  warning: mission {} has no keywords; any edit is accepted",
                mission.id
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}
