//! # vellum-config
//!
//! Vellum configuration.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

use figment::{
    Figment, Metadata, Profile, Provider,
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Map},
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use vellum_common::{Network, network::UnknownNetwork};

pub mod error;
pub use error::ExtractConfigError;

// reexport so cli types can implement `figment::Provider` to easily merge arguments
pub use figment;

/// Vellum configuration
///
/// # Defaults
///
/// All configuration values have a default, documented in the [fields](#fields)
/// section below. [`Config::load()`] starts with the defaults and merges the config file and the
/// environment on top, same for [`Config::load_with_root()`], but there the config file is looked
/// up relative to the given directory.
///
/// # Provider Details
///
/// `Config` is a Figment [`Provider`] with the following characteristics:
///
///   * **Metadata**
///
///     This provider is named `Vellum Config`. It does not specify a
///     [`Source`](figment::Source) and uses default interpolation.
///
///   * **Data**
///
///     The data emitted by this provider are the keys and values corresponding
///     to the fields and values of the structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// JSON-RPC endpoint used for read calls and confirmation waits.
    pub rpc_url: Option<String>,
    /// Base URL of the persistence backend.
    pub backend_url: String,
    /// Base URL of the compiler microservice. The local `solc` binary is used when unset.
    pub compiler_url: Option<String>,
    /// Path to the local `solc` binary.
    pub solc: PathBuf,
    /// Network deployments and writes are expected to target.
    pub network: String,
    /// Confirmations required before a transaction counts as final.
    pub confirmations: u64,
    /// Port of the local browser wallet bridge. `0` picks a free port.
    pub browser_port: u16,
    /// Seconds the browser bridge waits for the wallet to answer a request.
    pub browser_timeout: u64,
    /// Origins browsers may call `vellum serve` from. `*` allows any origin.
    pub allowed_origins: Vec<String>,
    /// The root directory the config was loaded from.
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// The name of the config file.
    pub const FILE_NAME: &'static str = "vellum.toml";

    /// Environment variable that overrides the config file path.
    pub const CONFIG_ENV: &'static str = "VELLUM_CONFIG";

    /// Prefix of the environment variables merged into the config.
    pub const ENV_PREFIX: &'static str = "VELLUM_";

    /// Returns the current `Config`
    ///
    /// See [`figment`](Self::figment) for more details.
    pub fn load() -> Result<Self, ExtractConfigError> {
        Self::try_from(Self::figment())
    }

    /// Returns the `Config` rooted at `root`.
    ///
    /// See [`figment_with_root`](Self::figment_with_root) for more details.
    pub fn load_with_root(root: impl AsRef<Path>) -> Result<Self, ExtractConfigError> {
        let root = root.as_ref();
        let mut config = Self::try_from(Self::figment_with_root(root))?;
        config.root = root.to_path_buf();
        Ok(config)
    }

    /// Attempts to extract a `Config` from `provider`, returning the result.
    ///
    /// # Example
    ///
    /// ```rust
    /// use figment::providers::{Format, Toml};
    /// use vellum_config::Config;
    ///
    /// // Use vellum's default `Figment`, but allow values from `other.toml`
    /// // to supersede its values.
    /// let figment = Config::figment().merge(Toml::file("other.toml"));
    ///
    /// let config = Config::try_from(figment);
    /// ```
    pub fn try_from<T: Provider>(provider: T) -> Result<Self, ExtractConfigError> {
        trace!("load config with provider: {:?}", provider.metadata());
        let figment = Figment::from(provider);
        figment.extract::<Self>().map_err(ExtractConfigError::new)
    }

    /// Returns the default figment
    ///
    /// The default figment reads from the following sources, in ascending
    /// priority order:
    ///
    ///   1. [`Config::default()`] (see [defaults](#defaults))
    ///   2. `vellum.toml` _or_ filename in `VELLUM_CONFIG` environment variable
    ///   3. `VELLUM_` prefixed environment variables
    pub fn figment() -> Figment {
        Self::figment_with_root(".")
    }

    /// Returns the default figment rooted at `root`.
    ///
    /// A relative `VELLUM_CONFIG` path is resolved against `root`.
    pub fn figment_with_root(root: impl AsRef<Path>) -> Figment {
        let root = root.as_ref();
        let file = Env::var_or(Self::CONFIG_ENV, Self::FILE_NAME);
        Figment::from(Self::default())
            .merge(Toml::file(root.join(file)))
            .merge(Env::prefixed(Self::ENV_PREFIX).ignore(&["CONFIG", "PRIVATE_KEY"]))
    }

    /// Resolves the configured [`network`](Self::network) name.
    pub fn network(&self) -> Result<Network, UnknownNetwork> {
        self.network.parse()
    }

    /// How long the browser bridge waits for the wallet.
    pub fn browser_timeout(&self) -> Duration {
        Duration::from_secs(self.browser_timeout)
    }
}

impl Provider for Config {
    fn metadata(&self) -> Metadata {
        Metadata::named("Vellum Config")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: None,
            backend_url: "http://localhost:3000".to_string(),
            compiler_url: None,
            solc: PathBuf::from("solc"),
            network: "sepolia".to_string(),
            confirmations: 1,
            browser_port: 9545,
            browser_timeout: 300,
            allowed_origins: vec!["http://localhost:4200".to_string()],
            root: PathBuf::from("."),
        }
    }
}
