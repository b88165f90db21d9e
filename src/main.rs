use clap::Parser;
use miette::Result;
use dossier::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    if global.verbose {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("dossier=debug"));
        // A subscriber may already be installed when embedded; ignore that case
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
        tracing::debug!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Check(args) => dossier::cli::commands::check::run(args, &global),
        Commands::Manifest(args) => dossier::cli::commands::manifest::run(args, &global),
        Commands::Rules(args) => dossier::cli::commands::rules::run(args, &global),
        Commands::Completions(args) => dossier::cli::commands::completions::run(args),
    }
}
