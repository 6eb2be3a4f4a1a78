use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod init;
pub mod serve;

#[derive(Subcommand)]
enum Command {
    /// Initialize the database schema
    Init {},
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "2222")]
        port: String,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Init {}) => {
            init::run().await?;
        }
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await;
        }
        None => {}
    }

    Ok(())
}
