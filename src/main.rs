use clap::Parser;

use painel::cli::{self, Cli, Commands};

fn main() {
    painel::init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import { file } => cli::import::run(&file),
        Commands::Show {
            filters,
            sort,
            desc,
            page,
        } => cli::report::show(&filters, sort.as_deref(), desc, page),
        Commands::Summary { filters, json } => cli::report::summary(&filters, json),
        Commands::Charts { filters } => cli::report::charts(&filters),
        Commands::Options { filters } => cli::report::options(&filters),
        #[cfg(feature = "pdf")]
        Commands::Export {
            kind,
            filters,
            output,
        } => cli::export::run(&kind, &filters, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
