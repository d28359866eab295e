use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::config::AutomationMode;
use crate::error::{Result, TaipoError};
use crate::extract::Suggestion;
use crate::policy::Prompter;

/// Human-readable status output.
pub struct Console<W: WriteColor> {
    out: W,
}

impl Console<StandardStream> {
    pub fn stdout() -> Self {
        Self::new(StandardStream::stdout(ColorChoice::Auto))
    }
}

impl<W: WriteColor> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn colored(&mut self, color: Color, bold: bool, text: &str) -> Result<()> {
        self.out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold))?;
        writeln!(self.out, "{}", text)?;
        self.out.reset()?;
        Ok(())
    }

    pub fn greet(&mut self, base_token: &str) -> Result<()> {
        writeln!(self.out, "taipo 🤖: Hmm… `{}`? Let me see...", base_token)?;
        Ok(())
    }

    pub fn debug(&mut self, label: &str, body: &str) -> Result<()> {
        self.colored(Color::Blue, false, &format!("🐛 [TAIPO_DEBUG] {}:\n{}", label, body))
    }

    pub fn thinking(&mut self) -> Result<()> {
        self.out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        write!(self.out, "🤔 Thinking...")?;
        self.out.reset()?;
        self.out.flush()?;
        Ok(())
    }

    pub fn clear_thinking(&mut self) -> Result<()> {
        if self.out.supports_color() {
            write!(self.out, "\r\x1b[K")?;
        } else {
            writeln!(self.out)?;
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn suggestion(&mut self, suggestion: &Suggestion, mode: AutomationMode) -> Result<()> {
        self.colored(Color::Cyan, true, "\n💡 Suggestion:")?;
        self.colored(Color::Green, false, suggestion.raw_text.trim())?;
        if mode == AutomationMode::Smart {
            writeln!(self.out, "   confidence: {:.2}", suggestion.confidence)?;
        }
        Ok(())
    }

    pub fn no_suggestion(&mut self) -> Result<()> {
        self.colored(Color::Yellow, false, "🤷 No suggestion came back.")
    }

    pub fn running(&mut self, command_line: &str, automatic: bool) -> Result<()> {
        let label = if automatic { "Auto-running" } else { "Running" };
        self.colored(Color::Blue, false, &format!("\n🚀 {}: {}", label, command_line))
    }

    pub fn failed(&mut self, exit_code: i32) -> Result<()> {
        self.colored(Color::Red, false, &format!("❌ That didn't work (exit code {}).", exit_code))
    }

    pub fn skipped(&mut self) -> Result<()> {
        writeln!(self.out, "👍 Skipped. Hope the suggestion helped!")?;
        Ok(())
    }

    pub fn error(&mut self, message: &str) -> Result<()> {
        self.colored(Color::Red, true, &format!("❌ {}", message))
    }
}

/// Reads the confirmation answer from the terminal. The editor is only opened on the first question.
#[derive(Default)]
pub struct TerminalPrompter {
    editor: Option<DefaultEditor>,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    fn editor(&mut self) -> Result<&mut DefaultEditor> {
        if self.editor.is_none() {
            let editor = DefaultEditor::new()
                .map_err(|e| terminal_error("Failed to open terminal for confirmation", e))?;
            self.editor = Some(editor);
        }
        self.editor.as_mut().ok_or_else(|| TaipoError::SystemError {
            message: "terminal editor unavailable".to_string(),
            source: None,
        })
    }
}

impl Prompter for TerminalPrompter {
    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        match self.editor()?.readline(question) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) => Err(TaipoError::Cancelled),
            Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(terminal_error("Failed to read confirmation", e)),
        }
    }
}

/// Terminal trouble is a system fault, not a usage error.
fn terminal_error(context: &str, error: ReadlineError) -> TaipoError {
    TaipoError::SystemError {
        message: format!("{}: {}", context, error),
        source: None,
    }
}
