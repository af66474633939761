use anyhow::Result;
use clap::Parser;

mod cli;
mod handler;
mod request;
mod response;
mod server;
mod status;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    pretty_env_logger::init();
    let root = handler::ServerRoot::new(cli.root_dir()?)?;
    let handler = handler::StaticHandler::new(root);
    let server = server::Server::new(handler, cli.port)?;
    server.run()
}
