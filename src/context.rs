use crate::candidates::CandidateSet;
use crate::input::FailedInvocation;
use crate::openai::ChatMessage;

const SYSTEM_PROMPT: &str = "You fix shell commands that a Unix shell did not recognize. \
You answer with a command, never with an explanation.";

/// Builds the chat payload for one correction request.
pub struct ContextBuilder {
    smart: bool,
}

impl ContextBuilder {
    pub fn new(smart: bool) -> Self {
        Self { smart }
    }

    pub fn build_payload(
        &self,
        invocation: &FailedInvocation,
        candidates: &CandidateSet,
    ) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: self.build_user_message(invocation, candidates),
            },
        ]
    }

    fn build_user_message(&self, invocation: &FailedInvocation, candidates: &CandidateSet) -> String {
        let mut content = format!(
            "The command `{}` was entered in a Unix shell but is not recognized.\n",
            invocation.raw()
        );

        if !candidates.is_empty() {
            content.push_str(&format!(
                "Commands available on this machine with similar names: {}.\n\
                 Prefer one of them if it matches what the user meant.\n",
                candidates.names().join(", ")
            ));
        }

        if self.smart {
            content.push_str(
                "Respond with a single JSON object and nothing else, in this exact format:\n\
                 {\"command\": \"the corrected command\", \"confidence\": 0.0}\n\
                 where confidence is a number between 0 and 1 estimating how sure you are \
                 that the command is what the user intended.",
            );
        } else {
            content.push_str(
                "If it's a typo, respond only with the corrected command in backticks. \
                 If it cannot be confidently fixed, respond with a general suggestion. \
                 No explanations or extra text, just a corrected command or helpful suggestion.",
            );
        }

        content
    }
}
