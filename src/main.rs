use anyhow::{Context, Result};
use testverdict::cli::{parse_args, Commands};
use testverdict::commands::{self, AnalyzeConfig, MutationsConfig};
use testverdict::observability::{init_tracing, install_panic_hook};

fn main() -> Result<()> {
    install_panic_hook();
    let cli = parse_args();

    match cli.command {
        Commands::Analyze {
            paths,
            format,
            output,
            no_ai,
            min_confidence,
            run_tests,
            detailed,
            exclude,
            config,
            verbosity,
        } => {
            init_tracing(verbosity);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("starting async runtime")?;
            runtime.block_on(commands::handle_analyze(AnalyzeConfig {
                paths,
                format,
                output,
                no_ai,
                min_confidence,
                run_tests,
                detailed,
                exclude,
                config,
            }))
        }
        Commands::Mutations {
            paths,
            format,
            output,
            min_confidence,
            exclude,
            config,
            verbosity,
        } => {
            init_tracing(verbosity);
            commands::handle_mutations(MutationsConfig {
                paths,
                format,
                output,
                min_confidence,
                exclude,
                config,
            })
        }
        Commands::Init { force } => {
            init_tracing(0);
            let cwd = std::env::current_dir().context("reading current directory")?;
            commands::init_config(&cwd, force)
        }
    }
}
