use clap::ValueEnum;

/// Shells `taipo --hook` can generate a not-found handler for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HookShell {
    Zsh,
    Bash,
}

impl HookShell {
    fn handler_name(&self) -> &'static str {
        match self {
            HookShell::Zsh => "command_not_found_handler",
            HookShell::Bash => "command_not_found_handle",
        }
    }

    fn rc_file(&self) -> &'static str {
        match self {
            HookShell::Zsh => "~/.zshrc",
            HookShell::Bash => "~/.bashrc",
        }
    }

    fn not_found_message(&self) -> &'static str {
        match self {
            HookShell::Zsh => r#"echo "zsh: command not found: $1" >&2"#,
            HookShell::Bash => r#"echo "bash: $1: command not found" >&2"#,
        }
    }
}

/// Shell snippet that hands unknown commands to taipo via `TAIPO_ORIGINAL_COMMAND`.
pub fn generate_hook_script(shell: HookShell) -> String {
    let name = match shell {
        HookShell::Zsh => "zsh",
        HookShell::Bash => "bash",
    };

    format!(r#"# taipo shell hook for {name}
# Generated by taipo v{version}
# Add this line to your {rc_file}:
#   eval "$(taipo --hook {name})"

export TAIPO_HOOK_ENABLED="${{TAIPO_HOOK_ENABLED:-true}}"

{handler}() {{
    # Never recurse, and stay out of the way when disabled or not installed
    if [[ "$TAIPO_HOOK_ACTIVE" == "true" || "$TAIPO_HOOK_ENABLED" != "true" ]] \
        || ! command -v taipo >/dev/null 2>&1; then
        {not_found}
        return 127
    fi

    TAIPO_HOOK_ACTIVE=true TAIPO_ORIGINAL_COMMAND="$*" taipo
}}

alias taipo-on='export TAIPO_HOOK_ENABLED=true && echo "✅ taipo hook enabled"'
alias taipo-off='export TAIPO_HOOK_ENABLED=false && echo "❌ taipo hook disabled"'
"#,
        name = name,
        version = env!("CARGO_PKG_VERSION"),
        rc_file = shell.rc_file(),
        handler = shell.handler_name(),
        not_found = shell.not_found_message(),
    )
}
