use clap::Parser;
use termcolor::StandardStream;

use taipo::candidates::ShellExecutables;
use taipo::config::{self, RunContext};
use taipo::error::EXIT_CANCELLED;
use taipo::executor::{self, CommandExecutor};
use taipo::hook::{generate_hook_script, HookShell};
use taipo::openai::OpenAIClient;
use taipo::pipeline::{Pipeline, RunReport};
use taipo::ui::{Console, TerminalPrompter};

#[derive(Parser)]
#[command(name = "taipo")]
#[command(about = "Suggests and runs a fix for a shell command that was not found")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Echo the failed command and raw OpenAI response (same as TAIPO_DEBUG=1)
    #[arg(short, long)]
    debug: bool,

    /// Print the command-not-found hook for SHELL and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    hook: Option<HookShell>,

    /// The command that was not found, with its arguments
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.hook {
        print!("{}", generate_hook_script(shell));
        return;
    }

    setup_error_handlers();

    let debug = config::debug_enabled(cli.debug);
    if let Err(e) = init_logging(debug) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let ctx = RunContext::from_env(&cli.command, debug);
    log::debug!("Mode {} (config {})", ctx.mode, ctx.config.config_path.display());

    std::process::exit(run(&ctx).await);
}

async fn run(ctx: &RunContext) -> i32 {
    let mut console = Console::stdout();

    match correct(ctx, &mut console).await {
        Ok(report) => report.exit_code(),
        Err(e) if e.is_cancellation() => {
            println!("\n👋 Cancelled.");
            EXIT_CANCELLED
        }
        Err(e) => {
            let _ = console.error(&e.user_message());
            e.exit_code()
        }
    }
}

async fn correct(ctx: &RunContext, console: &mut Console<StandardStream>) -> taipo::Result<RunReport> {
    let client = OpenAIClient::new(&ctx.config, ctx.api_key.clone())?;
    let pipeline = Pipeline::new(ShellExecutables::new(), client, CommandExecutor::new());
    let mut prompter = TerminalPrompter::new();
    pipeline.run(ctx, &mut prompter, console).await
}

fn setup_error_handlers() {
    // Handle panics gracefully
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s
        } else {
            "Unknown panic occurred"
        };

        eprintln!("❌ Internal error: {}", msg);

        if let Some(location) = panic_info.location() {
            eprintln!("   at {}:{}:{}", location.file(), location.line(), location.column());
        }

        std::process::exit(1);
    }));

    // Ctrl+C while waiting on OpenAI. A running corrected command gets the
    // signal from the terminal itself and its exit status is reported.
    if let Err(e) = ctrlc::set_handler(move || {
        if executor::child_in_foreground() {
            return;
        }
        println!("\n👋 Cancelled.");
        std::process::exit(EXIT_CANCELLED);
    }) {
        eprintln!("Warning: Failed to set Ctrl+C handler: {}", e);
    }
}

fn init_logging(debug: bool) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let default_filter = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .try_init()?;
    Ok(())
}
