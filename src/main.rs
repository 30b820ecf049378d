//! NEO - Entry Point
//!
//! Interactive text mode: type a command, review the plan the model
//! produced, and run it. `--command` runs a single turn and exits.

use clap::Parser;
use neo_agent::agent::{Agent, PlanSource, PlannedCommand};
use neo_agent::control::{DesktopControl, PcControl, RecordingControl};
use neo_agent::core::config::{AgentConfig, ControlBackend};
use neo_agent::core::error::Result;
use neo_agent::llm::client::{LlmBackend, OllamaProcess};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// NEO desktop assistant
#[derive(Parser, Debug)]
#[command(name = "neo")]
#[command(about = "Turn spoken or typed commands into desktop actions")]
struct Args {
    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Record actions instead of performing them
    #[arg(long)]
    dry_run: bool,

    /// Run model plans without asking for confirmation
    #[arg(long, short = 'y')]
    yes: bool,

    /// Override the model name
    #[arg(long)]
    model: Option<String>,

    /// Run one command and exit
    #[arg(long, short = 'c')]
    command: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("neo_agent=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AgentConfig::load(args.config.as_deref())?;
    if let Some(model) = &args.model {
        config.llm.model = model.clone();
    }
    if args.dry_run {
        config.control.backend = ControlBackend::DryRun;
    }

    let backend = OllamaProcess::new(&config.llm)?;
    let mut control: Box<dyn PcControl> = match config.control.backend {
        ControlBackend::Desktop => Box::new(DesktopControl::new(&config.control)),
        ControlBackend::DryRun => Box::new(RecordingControl::new()),
    };
    tracing::info!(
        "NEO starting (model {}, backend {:?})",
        config.llm.model,
        config.control.backend
    );

    let agent = Agent::new(config, backend)?;

    if let Some(command) = &args.command {
        let outcome = agent.handle(command, None, control.as_mut());
        println!("{}", outcome.message());
        std::process::exit(if outcome.is_success() { 0 } else { 1 });
    }

    run_interactive(&agent, control.as_mut(), args.yes)
}

fn run_interactive<B: LlmBackend>(
    agent: &Agent<B>,
    control: &mut dyn PcControl,
    auto_confirm: bool,
) -> Result<()> {
    println!("\n=== NEO ===");
    println!("Escribe un comando (por ejemplo: 'abre chrome', 'sube volumen 5 veces')");
    println!();
    println!("  :contexto   - Mostrar el contexto actual");
    println!("  :historial  - Mostrar los últimos comandos");
    println!("  :reset      - Borrar el contexto");
    println!("  salir       - Terminar");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "salir" | "exit" | "quit" | "adios" | "adiós" => break,
            ":contexto" => {
                println!("{}", agent.context().read(|c| c.summary()));
                continue;
            }
            ":historial" => {
                let turns = agent
                    .context()
                    .read(|c| c.recent_turns_summary(agent.config().context.history_limit));
                println!("{}", turns.unwrap_or_else(|| "Sin historial".into()));
                continue;
            }
            ":reset" => {
                agent.context().reset();
                println!("Contexto borrado");
                continue;
            }
            _ => {}
        }

        let planned = match agent.plan(input, None) {
            Ok(planned) => planned,
            Err(e) => {
                tracing::warn!("{}", e);
                println!("{}", e.user_message());
                continue;
            }
        };

        if planned.effective != planned.original {
            println!("(entendido como: '{}')", planned.effective);
        }
        if planned.plan.is_empty() {
            println!("{}", planned.plan.explanation);
            if planned.source != PlanSource::Memory {
                agent.execute(&planned, control);
            }
            continue;
        }

        println!("{} ({} acciones)", planned.plan.explanation, planned.plan.len());
        if planned.source == PlanSource::Llm && !auto_confirm && !confirm(&planned)? {
            println!("Cancelado");
            continue;
        }

        let report = agent.execute(&planned, control);
        match &report.failure {
            None => println!("Listo"),
            Some(failure) => println!(
                "Falló la acción {} de {} ({}): {}",
                failure.index, report.total, failure.function, failure.source
            ),
        }
    }

    println!("Hasta luego");
    Ok(())
}

/// Ask before running a model plan; `ver` shows the plan first
fn confirm(planned: &PlannedCommand) -> Result<bool> {
    loop {
        print!("¿Ejecutar? (si/no/ver) ");
        io::stdout().flush()?;

        let mut answer = String::new();
        if io::stdin().read_line(&mut answer)? == 0 {
            return Ok(false);
        }
        match answer.trim().to_lowercase().as_str() {
            "si" | "sí" | "s" | "yes" | "y" => return Ok(true),
            "no" | "n" => return Ok(false),
            "ver" | "v" => {
                println!("{}", serde_json::to_string_pretty(&planned.plan)?);
                for (i, action) in planned.plan.actions.iter().enumerate() {
                    println!("  {}. {}", i + 1, action);
                }
            }
            _ => println!("Responde 'si', 'no' o 'ver'"),
        }
    }
}
