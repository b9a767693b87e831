use anyhow::{anyhow, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};

use crate::cmds::App;
use crate::interactors::is_not_found;
use crate::storage::{content_type_of, Upload};

pub const BIN_NAME: &str = "snapfeed";

#[derive(Debug)]
pub enum LineCommand {
    Command(Box<App>),
    /// help, version, or a usage error. printed as is.
    Showing(String),
}

/// `None` for blank lines.
pub fn parse_line(line: &str) -> Option<LineCommand> {
    let splitted = match shell_words::split(line) {
        Ok(o) => o,
        Err(e) => return Some(LineCommand::Showing(format!("cannot split line: {}", e))),
    };

    if splitted.is_empty() {
        return None;
    }

    // a leading binary name is optional.
    let args = ::std::iter::once(BIN_NAME.to_string())
        .chain(splitted.into_iter().skip_while(|s| s == BIN_NAME));

    match App::try_parse_from(args) {
        Ok(o) => Some(LineCommand::Command(Box::new(o))),
        Err(e) => Some(LineCommand::Showing(e.to_string())),
    }
}

pub async fn read_upload(path: &str) -> Result<Upload> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| anyhow!("cannot read {}: {}", path, e))?;

    let name = ::std::path::Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());

    Ok(Upload {
        name,
        content_type: content_type_of(path).to_string(),
        bytes,
    })
}

pub fn to_json(data: impl Serialize) -> Result<Value> { Ok(serde_json::to_value(data)?) }

pub fn error_json(e: &anyhow::Error) -> Value {
    json!({
        "error": format!("{:#}", e),
        "not_found": is_not_found(e),
    })
}
