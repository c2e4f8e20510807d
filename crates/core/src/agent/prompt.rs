use crate::tool::Catalog;
use crate::turn::{ACTION, ACTION_INPUT, FINAL_ANSWER, OBSERVATION};

const PREAMBLE: &str = "\
You are a research assistant. Answer the user's latest question as best \
you can, using the conversation so far as context. You have access to the \
following tools:";

/// Renders the system prompt that teaches the model the tool catalog and
/// the reply grammar.
pub fn render_system_prompt(catalog: &Catalog) -> String {
    let mut prompt = String::from(PREAMBLE);
    prompt.push_str("\n\n");

    let mut names = Vec::new();
    for tool in catalog.iter() {
        let name = tool.kind().name();
        names.push(name);
        prompt.push_str(&format!("{name}: {}\n", tool.description().trim()));
    }

    prompt.push_str(&format!(
        "\n\
Always reply in exactly one of the two formats below.

To use a tool:

Thought: think about what to do next
{ACTION} the tool to use, one of [{names}]
{ACTION_INPUT} the search query, on a single line

You will then receive the tool's result as \"{OBSERVATION} ...\". \
You may use tools several times before answering.

When you know the answer:

Thought: I now know the final answer
{FINAL_ANSWER} the answer to the user's question
",
        names = names.join(", "),
    ));
    prompt
}
