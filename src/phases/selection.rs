//! Library selection for a `generate` run.

use log::debug;

use crate::config::{Library, WorkspaceConfig};
use crate::error::{Error, Result};
use crate::resolve::{find_library, resolve, ResolvedLibrary};

/// Which libraries a run targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every library without `skip_generate`
    All,
    /// A single library by name
    Named(String),
}

impl Selection {
    /// Build a selection from the command-line arguments.
    ///
    /// Exactly one of `name` and `all` must be given. This performs no I/O.
    pub fn from_args(name: Option<&str>, all: bool) -> Result<Self> {
        match (name.filter(|n| !n.is_empty()), all) {
            (None, false) => Err(Error::MissingLibraryOrAll),
            (Some(_), true) => Err(Error::BothLibraryAndAll),
            (Some(name), false) => Ok(Selection::Named(name.to_string())),
            (None, true) => Ok(Selection::All),
        }
    }
}

/// Resolve the libraries selected for generation, in declaration order.
pub fn select_libraries(
    config: &WorkspaceConfig,
    selection: &Selection,
) -> Result<Vec<ResolvedLibrary>> {
    let resolve_one =
        |library: &Library| resolve(&config.language, library, config.default.as_ref());

    let selected = match selection {
        Selection::Named(name) => {
            let library = find_library(config, name)?;
            if library.skip_generate {
                return Err(Error::SkipGenerate { name: name.clone() });
            }
            vec![resolve_one(library)?]
        }
        Selection::All => {
            let selected = config
                .libraries
                .iter()
                .filter(|library| !library.skip_generate)
                .map(resolve_one)
                .collect::<Result<Vec<_>>>()?;
            if selected.is_empty() {
                return Err(Error::NoLibrariesToGenerate);
            }
            selected
        }
    };
    debug!("Selected {} libraries", selected.len());
    Ok(selected)
}
