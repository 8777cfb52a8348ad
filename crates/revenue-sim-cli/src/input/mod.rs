pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Load a request from `--input <file>` or, failing that, piped stdin.
pub fn read_request<T: DeserializeOwned>(
    path: Option<&str>,
    command: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_input(path);
    }
    match stdin::read_stdin()? {
        Some(request) => Ok(request),
        None => Err(format!("--input <file.json|file.yaml> or stdin required for {}", command).into()),
    }
}
