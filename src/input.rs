use crate::error::{Result, TaipoError};

/// The command line the shell failed to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedInvocation {
    raw: String,
    base_token: String,
    argument_tail: String,
}

impl FailedInvocation {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TaipoError::InputError {
                message: "taipo <command> [args...] (no command given)".to_string(),
                source: None,
            });
        }

        let (base, tail) = match raw.split_once(char::is_whitespace) {
            Some((base, tail)) => (base, tail.trim()),
            None => (raw, ""),
        };

        Ok(Self {
            raw: raw.to_string(),
            base_token: base.to_string(),
            argument_tail: tail.to_string(),
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn base_token(&self) -> &str {
        &self.base_token
    }

    pub fn argument_tail(&self) -> &str {
        &self.argument_tail
    }

    /// Appends the original arguments when the suggestion is a bare command name.
    pub fn complete_command_line(&self, corrected: &str) -> String {
        let corrected = corrected.trim();
        if corrected.is_empty()
            || self.argument_tail.is_empty()
            || corrected.contains(char::is_whitespace)
        {
            return corrected.to_string();
        }
        format!("{} {}", corrected, self.argument_tail)
    }
}

/// The hook-supplied command wins over process arguments when it is non-blank.
pub fn resolve_raw_input(inherited: Option<String>, args: &[String]) -> String {
    match inherited {
        Some(command) if !command.trim().is_empty() => command.trim().to_string(),
        _ => args.join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_base_and_tail() {
        let inv = FailedInvocation::parse("gti  status --short").unwrap();
        assert_eq!(inv.base_token(), "gti");
        assert_eq!(inv.argument_tail(), "status --short");
        assert_eq!(inv.raw(), "gti  status --short");
    }

    #[test]
    fn test_single_token() {
        let inv = FailedInvocation::parse("  dockr\n").unwrap();
        assert_eq!(inv.base_token(), "dockr");
        assert_eq!(inv.argument_tail(), "");
    }

    #[test]
    fn test_empty_input_is_usage_error() {
        for raw in ["", "   ", "\t\n"] {
            let err = FailedInvocation::parse(raw).unwrap_err();
            assert_eq!(err.exit_code(), 2);
        }
    }

    #[test]
    fn test_inherited_command_takes_precedence() {
        let args = vec!["lsl".to_string(), "-la".to_string()];
        assert_eq!(resolve_raw_input(Some(" gti status ".into()), &args), "gti status");
        assert_eq!(resolve_raw_input(Some("   ".into()), &args), "lsl -la");
        assert_eq!(resolve_raw_input(None, &args), "lsl -la");
        assert_eq!(resolve_raw_input(None, &[]), "");
    }

    #[test]
    fn test_complete_command_line() {
        let inv = FailedInvocation::parse("gti status").unwrap();
        assert_eq!(inv.complete_command_line("git"), "git status");
        assert_eq!(inv.complete_command_line("git status"), "git status");
        assert_eq!(inv.complete_command_line(""), "");

        let bare = FailedInvocation::parse("gti").unwrap();
        assert_eq!(bare.complete_command_line("git"), "git");
    }
}
