use clap::Parser;
use eyre::{Context, Result};
use std::net::IpAddr;
use tokio::net::TcpListener;
use vellum_backend::cloud::{self, MemoryStore};

use crate::args::ConfigOpts;

/// CLI arguments for `vellum serve`.
#[derive(Clone, Debug, Parser)]
pub struct ServeArgs {
    /// Interface to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(long, short, default_value_t = 8080)]
    port: u16,

    /// Origin browsers may call the endpoint from. Repeat for several, `*` allows any.
    ///
    /// Defaults to `allowed_origins` from the config.
    #[arg(long = "allow-origin", value_name = "ORIGIN")]
    allow_origins: Vec<String>,

    #[command(flatten)]
    config: ConfigOpts,
}

impl ServeArgs {
    pub async fn run(self) -> Result<()> {
        let origins = if self.allow_origins.is_empty() {
            self.config.load_config()?.allowed_origins
        } else {
            self.allow_origins
        };
        let listener = TcpListener::bind((self.host, self.port))
            .await
            .wrap_err_with(|| format!("failed to bind {}:{}", self.host, self.port))?;
        println!("Listening on http://{}", listener.local_addr()?);

        tokio::select! {
            res = cloud::serve(listener, MemoryStore::new(), &origins) => res?,
            _ = tokio::signal::ctrl_c() => info!("shutting down"),
        }
        Ok(())
    }
}
