//! Shell completion generation.

use {
    crate::{Cli, CliError},
    anyhow::Result,
    clap::CommandFactory,
    clap_complete::{Shell, generate},
    std::{env, io, path::Path},
};

/// Generate shell completions to stdout.
///
/// Without an explicit shell, the one named by `$SHELL` is used.
pub(crate) fn cmd_completions(shell: Option<Shell>) -> Result<()> {
    let Some(shell) = shell.or_else(detect_shell_type) else {
        return Err(CliError::Usage(
            "specify a shell type, e.g.: srwp completions bash".to_string(),
        )
        .into());
    };

    let mut cmd = Cli::command();
    let name = cmd
        .get_name()
        .to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

/// Detect the user's current shell from environment.
fn detect_shell_type() -> Option<Shell> {
    env::var("SHELL")
        .ok()
        .and_then(|path| shell_from_path(&path))
}

/// Parse a shell binary path into its `Shell` enum.
fn shell_from_path(shell_path: &str) -> Option<Shell> {
    let shell_name = Path::new(shell_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    match shell_name {
        "bash" => Some(Shell::Bash),
        "zsh" => Some(Shell::Zsh),
        "fish" => Some(Shell::Fish),
        "elvish" => Some(Shell::Elvish),
        "pwsh" | "powershell" => Some(Shell::PowerShell),
        _ => None,
    }
}
