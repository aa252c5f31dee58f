//! Shell completion scripts.

use anyhow::Result;
use clap::Command;
use clap_complete::{Shell, generate};
use mcp_toolbox_core::cli::ExitCode;
use std::io::Write;

/// Writes the completion script for `shell` to `out`.
///
/// # Examples
///
/// ```
/// use clap::Command;
/// use clap_complete::Shell;
/// use mcp_toolbox_cli::commands::completions::write_completions;
///
/// let mut cmd = Command::new("mcp-toolbox").subcommand(Command::new("sync"));
/// let mut script = Vec::new();
/// write_completions(Shell::Bash, &mut cmd, &mut script);
/// assert!(String::from_utf8(script).unwrap().contains("mcp-toolbox"));
/// ```
pub fn write_completions(shell: Shell, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(shell, cmd, name, out);
}

/// Prints the completion script for `shell` to stdout.
pub async fn run(shell: Shell, cmd: &mut Command) -> Result<ExitCode> {
    tracing::debug!("Generating {shell} completions");
    write_completions(shell, cmd, &mut std::io::stdout());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> Command {
        Command::new("mcp-toolbox")
            .subcommand(Command::new("sync"))
            .subcommand(Command::new("call"))
    }

    #[test]
    fn test_every_shell_mentions_subcommands() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell, Shell::Elvish] {
            let mut script = Vec::new();
            write_completions(shell, &mut command(), &mut script);
            let script = String::from_utf8(script).unwrap();
            assert!(script.contains("sync"), "{shell} script lacks subcommands");
        }
    }

    #[tokio::test]
    async fn test_run_succeeds() {
        let result = run(Shell::Fish, &mut command()).await.unwrap();
        assert_eq!(result, ExitCode::SUCCESS);
    }
}
