// Shell command gate.
use crate::config::SafetyConfig;

/// Why a shell command was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellRefusal {
    Disabled,
    Blocked(String),
}

impl std::fmt::Display for ShellRefusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellRefusal::Disabled => write!(f, "Shell commands are disabled by configuration"),
            ShellRefusal::Blocked(entry) => {
                write!(f, "Shell command refused: contains blocked pattern '{entry}'")
            }
        }
    }
}

/// Returns `Err` with the refusal reason if `command` may not run.
pub fn check_shell_command(command: &str, cfg: &SafetyConfig) -> Result<(), ShellRefusal> {
    if !cfg.allow_terminal_commands {
        return Err(ShellRefusal::Disabled);
    }
    let lower = command.to_lowercase();
    match cfg
        .blocked_commands
        .iter()
        .find(|b| !b.trim().is_empty() && lower.contains(&b.to_lowercase()))
    {
        Some(entry) => Err(ShellRefusal::Blocked(entry.clone())),
        None => Ok(()),
    }
}
