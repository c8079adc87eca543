#[macro_use]
extern crate tracing;

use clap::Parser;
use eyre::Result;

mod args;
mod cmd;
mod handler;
mod utils;

use args::{Vellum, VellumSubcommand};

fn main() -> Result<()> {
    handler::install();
    utils::subscriber();
    let args = Vellum::parse();
    run(args)
}

#[tokio::main]
async fn run(args: Vellum) -> Result<()> {
    match args.cmd {
        VellumSubcommand::Compile(cmd) => cmd.run().await,
        VellumSubcommand::Deploy(cmd) => cmd.run().await,
        VellumSubcommand::Functions(cmd) => cmd.run(),
        VellumSubcommand::Call(cmd) => cmd.run().await,
        VellumSubcommand::List(cmd) => cmd.run().await,
        VellumSubcommand::Delete(cmd) => cmd.run().await,
        VellumSubcommand::Serve(cmd) => cmd.run().await,
    }
}
