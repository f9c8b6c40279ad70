pub mod market;
pub mod pricing;

use serde::de::DeserializeOwned;

use crate::input;

/// Load a typed input from `--input <file>` or piped stdin.
pub(crate) fn load_input<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_input(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err(format!("--input <file.json|file.yaml> or stdin required for {what}").into())
    }
}
