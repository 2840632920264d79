use app::App;
use clap::Parser;
use cli::Args;
use context::{load_config, Context};
use env_logger::Env;
use log::debug;

mod app;
mod cli;
mod context;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let config = load_config(args.config.as_deref())?;
    debug!("running {:?} with {:?}", args.command, config);

    let mut app = App::new(Context::new(args.session), config);
    app.handle_command(args.command)
}
