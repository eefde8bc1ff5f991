//! Export command.
//!
//! Writes the loaded secrets of a scope to a file or stdout.

use std::path::Path;

use tracing::info;

use crate::cli::context::{layered_scopes, load_config, write_private};
use crate::cli::output;
use crate::core::format::Format;
use crate::core::store::open_store;
use crate::core::transfer::export_mapping;
use crate::error::{Error, Result};

/// Export secrets.
///
/// Missing required secrets are reported and left out. A read failure
/// fails the export without writing anything.
pub fn execute(
    config: &Path,
    env: &str,
    project: Option<&str>,
    output_path: Option<&Path>,
    format: Option<Format>,
) -> Result<()> {
    let config = load_config(config)?;
    let scopes = layered_scopes(&config, env, project)?;
    let store = open_store(scopes[0].environment())?;
    let loaded = export_mapping(&scopes, store.as_ref());

    for key in &loaded.missing {
        output::hint(&format!("{} is required but not set", key));
    }
    for (key, reason) in &loaded.failed {
        output::error(&format!("{}: {}", key, reason));
    }
    if !loaded.failed.is_empty() {
        return Err(Error::ExportFailed {
            failed: loaded.failed.len(),
        });
    }

    let format = format.unwrap_or_else(|| match output_path {
        Some(path) => Format::from_path(path),
        None => Format::Dotenv,
    });
    let rendered = format.render(&loaded.mapping)?;

    match output_path {
        Some(path) => {
            write_private(path, &rendered)?;
            info!(path = %path.display(), %format, keys = loaded.mapping.len(), "exported");
            output::success(&format!(
                "exported {} secret(s) to {} ({})",
                loaded.mapping.len(),
                path.display(),
                format
            ));
        }
        None => output::raw(&rendered),
    }
    Ok(())
}
