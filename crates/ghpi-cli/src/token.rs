//! Forge token resolution.

use std::io::BufRead;

use ghpi_core::ConfigError;

/// Environment variable consulted when no token flag is given.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Pick the forge token: `--token`, then the first line of `stdin` when
/// `--token-stdin` is set, then `env` (the value of [`TOKEN_ENV`]).
///
/// Blank values are treated as absent.
///
/// # Errors
///
/// Returns [`ConfigError::MissingToken`] if no source yields a token.
pub fn resolve_token(
    flag: Option<String>,
    from_stdin: bool,
    stdin: impl BufRead,
    env: Option<String>,
) -> Result<String, ConfigError> {
    if let Some(token) = non_blank(flag) {
        return Ok(token);
    }
    if from_stdin {
        let first_line = stdin.lines().next().and_then(Result::ok);
        if let Some(token) = non_blank(first_line) {
            return Ok(token);
        }
        tracing::debug!("no token on stdin");
    }
    non_blank(env).ok_or(ConfigError::MissingToken)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
