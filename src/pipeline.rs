use std::time::Duration;
use termcolor::WriteColor;

use crate::candidates::{find_candidates, CandidateSet, ExecutableSource};
use crate::config::RunContext;
use crate::context::ContextBuilder;
use crate::error::Result;
use crate::executor::CommandRunner;
use crate::extract::{parse_response, Sanitizer, Suggestion};
use crate::input::FailedInvocation;
use crate::openai::SuggestionProvider;
use crate::policy::{PolicyEngine, PolicyReport, Prompter};
use crate::ui::Console;

/// Everything one run produced, in pipeline order.
#[derive(Debug)]
pub struct RunReport {
    pub invocation: FailedInvocation,
    pub candidates: CandidateSet,
    pub suggestion: Suggestion,
    pub command_line: String,
    pub policy: PolicyReport,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.policy.outcome.process_exit_code()
    }
}

/// Normalize, ground, ask, parse, decide, run.
pub struct Pipeline<S, P, R> {
    executables: S,
    provider: P,
    runner: R,
    sanitizer: Sanitizer,
}

impl<S, P, R> Pipeline<S, P, R>
where
    S: ExecutableSource,
    P: SuggestionProvider,
    R: CommandRunner,
{
    pub fn new(executables: S, provider: P, runner: R) -> Self {
        Self {
            executables,
            provider,
            runner,
            sanitizer: Sanitizer::new(),
        }
    }

    pub async fn run<Q, W>(
        &self,
        ctx: &RunContext,
        prompter: &mut Q,
        console: &mut Console<W>,
    ) -> Result<RunReport>
    where
        Q: Prompter,
        W: WriteColor,
    {
        let invocation = FailedInvocation::parse(&ctx.raw_input)?;
        if ctx.debug {
            console.debug("Failed command", invocation.raw())?;
        }

        console.greet(invocation.base_token())?;
        ctx.require_api_key()?;

        let candidates = find_candidates(&self.executables, invocation.base_token()).await;
        if ctx.debug && !candidates.is_empty() {
            console.debug("Local candidates", &candidates.names().join(", "))?;
        }

        let messages = ContextBuilder::new(ctx.smart()).build_payload(&invocation, &candidates);
        let timeout = Duration::from_secs(ctx.config.timeout_seconds);

        console.thinking()?;
        let response = self.provider.complete(&messages, timeout).await;
        console.clear_thinking()?;
        let raw = response?;

        if ctx.debug {
            console.debug("OpenAI response", &raw)?;
        }

        let suggestion = parse_response(&raw, ctx.smart(), &self.sanitizer);
        log::debug!(
            "Suggestion {:?} ({:?}, confidence {})",
            suggestion.command,
            suggestion.outcome,
            suggestion.confidence
        );
        if !suggestion.is_empty() {
            console.suggestion(&suggestion, ctx.mode)?;
        }

        let command_line = invocation.complete_command_line(&suggestion.command);
        let policy = PolicyEngine::new(ctx.mode)
            .apply(&command_line, &suggestion, prompter, &self.runner, console)
            .await?;

        Ok(RunReport {
            invocation,
            candidates,
            suggestion,
            command_line,
            policy,
        })
    }
}
