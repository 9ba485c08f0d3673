//! Vault token resolution.
//!
//! A token is either given literally or produced by an external command
//! (e.g. `vault print token`). Command output is trimmed and must look like a
//! Vault token. Resolution runs once per endpoint at startup.

use crate::error::{SyncError, TokenCommandError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// Prefixes of modern Vault service (`hvs.`) and batch (`hvb.`) tokens.
pub const VAULT_TOKEN_PREFIXES: &[&str] = &["hvs.", "hvb."];

/// Maximum execution time for token commands.
const TOKEN_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Maximum stdout read from a token command (1 MB). Reading stops past it.
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Maximum stderr read from a token command.
const MAX_STDERR_BYTES: usize = 64 * 1024;

/// Characters of stderr kept for logs and errors.
const STDERR_SUMMARY_CHARS: usize = 200;

/// An authentication token. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn redacted(&self) -> String {
        redact_secret(&self.0)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Token").field(&self.redacted()).finish()
    }
}

/// Where an endpoint's token comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Literal(String),
    Command(String),
}

impl TokenSource {
    /// Build from the two mutually exclusive config fields. Empty strings
    /// count as unset.
    pub fn from_parts(
        endpoint: &str,
        token: Option<&str>,
        command: Option<&str>,
    ) -> Result<Self, SyncError> {
        let token = token.filter(|t| !t.is_empty());
        let command = command.filter(|c| !c.trim().is_empty());
        match (token, command) {
            (Some(_), Some(_)) => Err(SyncError::TokenSourceConflict {
                endpoint: endpoint.to_string(),
            }),
            (Some(token), None) => Ok(TokenSource::Literal(token.to_string())),
            (None, Some(command)) => Ok(TokenSource::Command(command.to_string())),
            (None, None) => Err(SyncError::TokenSourceMissing {
                endpoint: endpoint.to_string(),
            }),
        }
    }
}

/// Turns a [`TokenSource`] into a [`Token`].
pub struct TokenResolver {
    timeout: Duration,
}

impl TokenResolver {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(TOKEN_COMMAND_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn resolve(&self, source: &TokenSource) -> Result<Token, SyncError> {
        match source {
            TokenSource::Literal(value) => Ok(Token::new(value.clone())),
            TokenSource::Command(command) => {
                let output = self.run_command(command).await.map_err(|source| {
                    SyncError::TokenCommandFailed {
                        command: command.clone(),
                        source,
                    }
                })?;

                if !is_vault_token(&output) {
                    return Err(SyncError::TokenFormatInvalid {
                        command: command.clone(),
                    });
                }

                let token = Token::new(output);
                debug!("Resolved token {} from command", token.redacted());
                Ok(token)
            }
        }
    }

    /// Run `command` and return its trimmed stdout.
    async fn run_command(&self, command: &str) -> Result<String, TokenCommandError> {
        // Explicit arg splitting, not shell interpretation.
        let parts: Vec<&str> = command.split_whitespace().collect();
        let (program, args) = parts.split_first().ok_or(TokenCommandError::Empty)?;

        let mut cmd = Command::new(program);
        cmd.args(args);

        // Don't inherit stdin, so interactive commands can't hang the run.
        cmd.stdin(std::process::Stdio::null());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn()?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Dropping `child` on any early return kills the process.
        let collect = async {
            let (stdout, stderr) = tokio::try_join!(
                read_capped(stdout, MAX_OUTPUT_BYTES),
                read_capped(stderr, MAX_STDERR_BYTES),
            )?;
            let status = child.wait().await?;
            Ok::<_, TokenCommandError>((status, stdout, stderr))
        };

        let (status, stdout, stderr) = tokio::time::timeout(self.timeout, collect)
            .await
            .map_err(|_| TokenCommandError::TimedOut(self.timeout.as_secs()))??;

        if !status.success() {
            let stderr = summarize_stderr(&String::from_utf8_lossy(&stderr));
            warn!(
                "Token command '{}' failed with status {}: {}",
                program, status, stderr
            );
            return Err(TokenCommandError::Exit {
                status: status.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }
}

/// Read at most `limit` bytes; anything longer is `OutputTooLarge`.
async fn read_capped<R>(reader: Option<R>, limit: usize) -> Result<Vec<u8>, TokenCommandError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(reader) = reader {
        reader.take(limit as u64 + 1).read_to_end(&mut buf).await?;
    }
    if buf.len() > limit {
        return Err(TokenCommandError::OutputTooLarge(limit));
    }
    Ok(buf)
}

/// First line of stderr, shortened, with token-looking words masked.
fn summarize_stderr(stderr: &str) -> String {
    let line = stderr.trim().lines().next().unwrap_or_default();
    let mut summary: String = line
        .split_whitespace()
        .map(|word| {
            if VAULT_TOKEN_PREFIXES.iter().any(|p| word.contains(p)) {
                redact_secret(word)
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    if summary.chars().count() > STDERR_SUMMARY_CHARS {
        summary = summary.chars().take(STDERR_SUMMARY_CHARS).collect();
        summary.push('…');
    }
    summary
}

impl Default for TokenResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn is_vault_token(value: &str) -> bool {
    VAULT_TOKEN_PREFIXES
        .iter()
        .any(|prefix| value.len() > prefix.len() && value.starts_with(prefix))
}

/// Redact a secret value for display (show first 2 and last 2 chars).
pub fn redact_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 6 {
        return "***".to_string();
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}…{tail}")
}
