use clap::{CommandFactory, Parser, Subcommand};
use git_addp::{ColorChoice, Config, FileOutcome, GitRepo, Stager};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "git-addp")]
#[command(about = "Interactive hunk-by-hunk git staging")]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', global = true, default_value = ".")]
    repo: String,

    /// When to color hunks and prompts
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Log git invocations and parse results to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick hunks of unstaged changes to stage (e.g., `git-addp patch src/`)
    Patch {
        /// Limit the diff to these paths
        pathspec: Vec<String>,
    },
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Print a roff man page
    Man,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "git_addp=debug" } else { "git_addp=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Patch { pathspec } => {
            let git = GitRepo::new(&cli.repo);
            let config = Config::load(&git, cli.color);

            let reports = Stager::new(git, &config).run(
                &pathspec,
                std::io::stdin().lock(),
                std::io::stdout().lock(),
            )?;

            let failed = reports
                .iter()
                .filter(|report| matches!(report.outcome, FileOutcome::ApplyFailed { .. }))
                .count();
            if failed > 0 {
                return Err(format!("{failed} file(s) could not be staged").into());
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "git-addp", &mut std::io::stdout());
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut std::io::stdout())?;
        }
    }

    Ok(())
}
