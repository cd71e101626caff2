mod cli;
mod commands;

use cli::{
    CheckParams, FmtParams, GlobalParams, NewParams, SchemaParams, TreeParams, build_cli,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let matches = build_cli().get_matches();
    let Some((name, m)) = matches.subcommand() else {
        unreachable!("clap should have caught this")
    };

    let global = GlobalParams::from_matches(m);
    init_tracing(global.verbose);

    let config = match commands::document_loader::load_config(global.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    match name {
        "check" => {
            let params = CheckParams::from_matches(m);
            commands::check::run(params.into(), &config);
        }
        "fmt" => {
            let params = FmtParams::from_matches(m);
            commands::fmt::run(params.into(), &config);
        }
        "tree" => {
            let params = TreeParams::from_matches(m);
            commands::tree::run(params.into(), &config);
        }
        "new" => {
            let _params = NewParams::from_matches(m);
            commands::new::run(&config);
        }
        "schema" => {
            let params = SchemaParams::from_matches(m);
            commands::schema::run(params.into());
        }
        _ => unreachable!("clap should have caught this"),
    }
}

/// Logs go to stderr so they never mix with formatted markup on stdout.
/// `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "fetchkit=debug,fetchkit_lib=debug",
        _ => "fetchkit=trace,fetchkit_lib=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
