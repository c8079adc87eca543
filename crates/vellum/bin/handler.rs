use eyre::EyreHandler;
use itertools::Itertools;
use std::{error::Error, fmt, panic::Location};
use vellum_common::errors::dedup_chain;

/// Environment variable that switches error reports to the full `color-eyre` output.
const DEBUG_ENV: &str = "VELLUM_DEBUG";

/// How `vellum` prints the errors a command returns.
pub enum Handler {
    /// The error and its distinct causes, without backtraces.
    Concise,
    /// Delegates to a verbose report.
    Verbose(Box<dyn EyreHandler>),
}

impl EyreHandler for Handler {
    fn display(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", dedup_chain(error).into_iter().format("; "))
    }

    fn debug(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Self::Verbose(report) = self {
            return report.debug(error, f);
        }
        if f.alternate() {
            return fmt::Debug::fmt(error, f);
        }

        let chain = dedup_chain(error);
        let mut messages = chain.iter();
        if let Some(message) = messages.next() {
            write!(f, "{message}")?;
        }
        if chain.len() > 1 {
            write!(f, "\n\nCaused by:")?;
            for (depth, cause) in messages.enumerate() {
                write!(f, "\n  {}: {cause}", depth + 1)?;
            }
        }
        Ok(())
    }

    fn track_caller(&mut self, location: &'static Location<'static>) {
        if let Self::Verbose(report) = self {
            report.track_caller(location);
        }
    }
}

/// Installs the [`eyre`] and panic hooks for the binary.
pub fn install() {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .panic_section("This is a bug in vellum. Please report it with the command you ran.")
        .into_hooks();
    panic_hook.install();

    let verbose = std::env::var_os(DEBUG_ENV).is_some();
    let eyre_hook = eyre_hook.into_eyre_hook();
    let installed = eyre::set_hook(Box::new(move |error| {
        Box::new(if verbose { Handler::Verbose(eyre_hook(error)) } else { Handler::Concise })
    }));
    if let Err(err) = installed {
        debug!(%err, "eyre hook already installed");
    }
}
