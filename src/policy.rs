use termcolor::WriteColor;

use crate::config::AutomationMode;
use crate::error::Result;
use crate::executor::{CommandRunner, ExecutionOutcome};
use crate::extract::Suggestion;
use crate::ui::Console;

/// Smart mode runs a suggestion without asking at or above this confidence.
pub const AUTO_RUN_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Ran,
    NotRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyState {
    Idle,
    Suggested,
    Confirming,
    AutoRunning,
    Skipped,
    Terminal(Terminal),
}

/// Asks the user one yes/no question. `None` means end of input.
pub trait Prompter {
    fn ask(&mut self, question: &str) -> Result<Option<String>>;
}

/// First transition out of `Suggested`.
pub fn route(mode: AutomationMode, suggestion: &Suggestion) -> PolicyState {
    if suggestion.is_empty() {
        return PolicyState::Skipped;
    }

    match mode {
        AutomationMode::Manual => PolicyState::Confirming,
        AutomationMode::Autonomous => PolicyState::AutoRunning,
        AutomationMode::Smart if suggestion.confidence >= AUTO_RUN_THRESHOLD => PolicyState::AutoRunning,
        AutomationMode::Smart => PolicyState::Confirming,
    }
}

/// Transition out of `Confirming`: only "y" runs the command.
pub fn confirm(answer: Option<&str>) -> PolicyState {
    match answer {
        Some(answer) if answer.trim().eq_ignore_ascii_case("y") => PolicyState::AutoRunning,
        _ => PolicyState::Skipped,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyReport {
    pub path: Vec<PolicyState>,
    pub outcome: ExecutionOutcome,
}

impl PolicyReport {
    pub fn prompted(&self) -> bool {
        self.path.contains(&PolicyState::Confirming)
    }
}

pub struct PolicyEngine {
    mode: AutomationMode,
}

impl PolicyEngine {
    pub fn new(mode: AutomationMode) -> Self {
        Self { mode }
    }

    /// Drives one suggestion to a terminal state, prompting and running as the mode requires.
    pub async fn apply<P, R, W>(
        &self,
        command_line: &str,
        suggestion: &Suggestion,
        prompter: &mut P,
        runner: &R,
        console: &mut Console<W>,
    ) -> Result<PolicyReport>
    where
        P: Prompter,
        R: CommandRunner,
        W: WriteColor,
    {
        let mut path = vec![PolicyState::Idle, PolicyState::Suggested];

        let mut state = route(self.mode, suggestion);
        path.push(state);
        let automatic = state == PolicyState::AutoRunning;

        if state == PolicyState::Confirming {
            let answer = prompter.ask(&format!("\n⚡ Run `{}`? (y/N): ", command_line))?;
            state = confirm(answer.as_deref());
            path.push(state);
        }

        let outcome = match state {
            PolicyState::AutoRunning => {
                console.running(command_line, automatic)?;
                let outcome = runner.run(command_line).await?;
                if !outcome.succeeded {
                    console.failed(outcome.exit_code)?;
                }
                path.push(PolicyState::Terminal(Terminal::Ran));
                outcome
            }
            _ => {
                if suggestion.is_empty() {
                    console.no_suggestion()?;
                } else {
                    console.skipped()?;
                }
                path.push(PolicyState::Terminal(Terminal::NotRun));
                ExecutionOutcome::not_run()
            }
        };

        log::debug!("Policy path ({}): {:?}", self.mode, path);
        Ok(PolicyReport { path, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaipoError;
    use crate::extract::ParseOutcome;
    use std::cell::RefCell;
    use termcolor::Buffer;

    fn suggestion(command: &str, confidence: f64) -> Suggestion {
        Suggestion {
            command: command.to_string(),
            confidence,
            raw_text: command.to_string(),
            outcome: ParseOutcome::Structured,
        }
    }

    struct ScriptedPrompter {
        answer: Option<&'static str>,
        asked: Vec<String>,
    }

    impl ScriptedPrompter {
        fn answering(answer: Option<&'static str>) -> Self {
            Self { answer, asked: Vec::new() }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn ask(&mut self, question: &str) -> Result<Option<String>> {
            self.asked.push(question.to_string());
            Ok(self.answer.map(String::from))
        }
    }

    struct CancellingPrompter;

    impl Prompter for CancellingPrompter {
        fn ask(&mut self, _question: &str) -> Result<Option<String>> {
            Err(TaipoError::Cancelled)
        }
    }

    #[derive(Default)]
    struct RecordingRunner {
        exit_code: i32,
        commands: RefCell<Vec<String>>,
    }

    impl CommandRunner for RecordingRunner {
        async fn run(&self, command_line: &str) -> Result<ExecutionOutcome> {
            self.commands.borrow_mut().push(command_line.to_string());
            Ok(ExecutionOutcome::from_exit_code(self.exit_code))
        }
    }

    const CONFIDENCES: [f64; 6] = [0.0, 0.3, 0.5, 0.89999, 0.9, 1.0];

    #[test]
    fn test_autonomous_always_auto_runs() {
        for confidence in CONFIDENCES {
            let state = route(AutomationMode::Autonomous, &suggestion("ls", confidence));
            assert_eq!(state, PolicyState::AutoRunning, "confidence {}", confidence);
        }
    }

    #[test]
    fn test_manual_always_confirms() {
        for confidence in CONFIDENCES {
            let state = route(AutomationMode::Manual, &suggestion("ls", confidence));
            assert_eq!(state, PolicyState::Confirming, "confidence {}", confidence);
        }
    }

    #[test]
    fn test_smart_threshold_boundary() {
        let smart = |c| route(AutomationMode::Smart, &suggestion("ls", c));
        assert_eq!(smart(1.0), PolicyState::AutoRunning);
        assert_eq!(smart(AUTO_RUN_THRESHOLD), PolicyState::AutoRunning);
        assert_eq!(smart(0.89999), PolicyState::Confirming);
        assert_eq!(smart(0.0), PolicyState::Confirming);
    }

    #[test]
    fn test_empty_suggestion_is_skipped() {
        for mode in [AutomationMode::Manual, AutomationMode::Autonomous, AutomationMode::Smart] {
            assert_eq!(route(mode, &suggestion("", 1.0)), PolicyState::Skipped);
        }
    }

    #[test]
    fn test_confirm_answers() {
        assert_eq!(confirm(Some("y")), PolicyState::AutoRunning);
        assert_eq!(confirm(Some(" Y \n")), PolicyState::AutoRunning);
        assert_eq!(confirm(Some("yes")), PolicyState::Skipped);
        assert_eq!(confirm(Some("n")), PolicyState::Skipped);
        assert_eq!(confirm(Some("")), PolicyState::Skipped);
        assert_eq!(confirm(None), PolicyState::Skipped);
    }

    #[tokio::test]
    async fn test_autonomous_runs_without_prompt() {
        let engine = PolicyEngine::new(AutomationMode::Autonomous);
        let mut prompter = ScriptedPrompter::answering(Some("n"));
        let runner = RecordingRunner::default();
        let mut console = Console::new(Buffer::no_color());

        let report = engine
            .apply("docker ps", &suggestion("docker ps", 0.1), &mut prompter, &runner, &mut console)
            .await
            .unwrap();

        assert!(prompter.asked.is_empty());
        assert!(!report.prompted());
        assert_eq!(runner.commands.borrow().as_slice(), ["docker ps"]);
        assert_eq!(report.outcome, ExecutionOutcome::from_exit_code(0));
        assert_eq!(
            report.path,
            vec![
                PolicyState::Idle,
                PolicyState::Suggested,
                PolicyState::AutoRunning,
                PolicyState::Terminal(Terminal::Ran),
            ]
        );
    }

    #[tokio::test]
    async fn test_confirmed_run_propagates_failure() {
        let engine = PolicyEngine::new(AutomationMode::Manual);
        let mut prompter = ScriptedPrompter::answering(Some("y"));
        let runner = RecordingRunner { exit_code: 2, ..Default::default() };
        let mut console = Console::new(Buffer::no_color());

        let report = engine
            .apply("git status", &suggestion("git status", 1.0), &mut prompter, &runner, &mut console)
            .await
            .unwrap();

        assert_eq!(prompter.asked.len(), 1);
        assert!(prompter.asked[0].contains("`git status`"));
        assert!(report.outcome.ran);
        assert_eq!(report.outcome.process_exit_code(), 2);

        let text = String::from_utf8(console.into_inner().into_inner()).unwrap();
        assert!(text.contains("exit code 2"));
    }

    #[tokio::test]
    async fn test_declined_confirmation_does_not_run() {
        let engine = PolicyEngine::new(AutomationMode::Smart);
        let mut prompter = ScriptedPrompter::answering(Some("n"));
        let runner = RecordingRunner::default();
        let mut console = Console::new(Buffer::no_color());

        let report = engine
            .apply("ls -la", &suggestion("ls -la", 0.4), &mut prompter, &runner, &mut console)
            .await
            .unwrap();

        assert!(report.prompted());
        assert!(runner.commands.borrow().is_empty());
        assert!(!report.outcome.ran);
        assert_eq!(report.outcome.process_exit_code(), 127);
        assert_eq!(report.path.last(), Some(&PolicyState::Terminal(Terminal::NotRun)));
    }

    #[tokio::test]
    async fn test_cancelled_prompt_propagates() {
        let engine = PolicyEngine::new(AutomationMode::Manual);
        let runner = RecordingRunner::default();
        let mut console = Console::new(Buffer::no_color());

        let err = engine
            .apply("ls", &suggestion("ls", 1.0), &mut CancellingPrompter, &runner, &mut console)
            .await
            .unwrap_err();

        assert!(err.is_cancellation());
        assert!(runner.commands.borrow().is_empty());
    }

    #[test]
    fn test_empty_suggestion_never_runs() {
        let engine = PolicyEngine::new(AutomationMode::Autonomous);
        let mut prompter = ScriptedPrompter::answering(Some("y"));
        let runner = RecordingRunner::default();
        let mut console = Console::new(Buffer::no_color());

        let report = tokio_test::block_on(engine.apply(
            "",
            &suggestion("", 0.0),
            &mut prompter,
            &runner,
            &mut console,
        ))
        .unwrap();

        assert!(prompter.asked.is_empty());
        assert!(runner.commands.borrow().is_empty());
        assert_eq!(report.outcome, ExecutionOutcome::not_run());
    }
}
