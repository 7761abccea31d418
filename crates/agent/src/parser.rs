//! Parser for ReAct-formatted model output.
//!
//! The model answers in one of two shapes:
//!
//! ```text
//! Thought: I need the ticket first.
//! Action: ticket_context
//! Action Input: c3oi15w89jl52t3
//! ```
//!
//! ```text
//! Thought: I now know the final answer.
//! Final Answer: ...
//! ```
//!
//! Output carrying neither marker is taken as a final answer verbatim.

const FINAL_MARKER: &str = "final answer:";
const ACTION_MARKER: &str = "action:";
const INPUT_MARKER: &str = "action input:";
const OBSERVATION_MARKER: &str = "observation:";
const THOUGHT_PREFIX: &str = "thought:";

/// One parsed model turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactOutput {
    Final { thought: String, answer: String },
    Action { thought: String, tool: String, input: String },
}

/// Parse one completion.
///
/// When both an action and a final answer are present, whichever appears
/// later wins.
pub fn parse(text: &str) -> ReactOutput {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();

    let final_at = lower.find(FINAL_MARKER);
    let action_at = line_marker(&lower, ACTION_MARKER);

    match (final_at, action_at) {
        (Some(f), Some(a)) if f > a => final_output(text, f),
        (Some(f), None) => final_output(text, f),
        (_, Some(a)) => action_output(text, &lower, a),
        (None, None) => ReactOutput::Final {
            thought: String::new(),
            answer: text.trim().to_string(),
        },
    }
}

/// Byte offset of the first line that starts with `marker`.
fn line_marker(lower: &str, marker: &str) -> Option<usize> {
    let mut offset = 0;
    for line in lower.split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        if line[indent..].starts_with(marker) {
            return Some(offset + indent);
        }
        offset += line.len();
    }
    None
}

fn thought_before(text: &str, end: usize) -> String {
    let head = text[..end].trim();
    if head
        .get(..THOUGHT_PREFIX.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(THOUGHT_PREFIX))
    {
        head[THOUGHT_PREFIX.len()..].trim().to_string()
    } else {
        head.to_string()
    }
}

fn final_output(text: &str, at: usize) -> ReactOutput {
    ReactOutput::Final {
        thought: thought_before(text, at),
        answer: text[at + FINAL_MARKER.len()..].trim().to_string(),
    }
}

fn action_output(text: &str, lower: &str, at: usize) -> ReactOutput {
    let after = at + ACTION_MARKER.len();
    let line_end = text[after..].find('\n').map_or(text.len(), |i| after + i);
    let tool = text[after..line_end]
        .trim()
        .trim_matches(|c| c == '`' || c == '"' || c == '\'')
        .trim()
        .to_string();

    let input = line_marker(&lower[line_end..], INPUT_MARKER)
        .map(|rel| {
            let start = line_end + rel + INPUT_MARKER.len();
            let end = line_marker(&lower[start..], OBSERVATION_MARKER)
                .map_or(text.len(), |rel| start + rel);
            text[start..end].trim().to_string()
        })
        .unwrap_or_default();

    ReactOutput::Action {
        thought: thought_before(text, at),
        tool,
        input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action() {
        let out = parse(
            "Thought: I should read the ticket.\nAction: ticket_context\nAction Input: c3oi15w89jl52t3",
        );
        assert_eq!(
            out,
            ReactOutput::Action {
                thought: "I should read the ticket.".into(),
                tool: "ticket_context".into(),
                input: "c3oi15w89jl52t3".into(),
            }
        );
    }

    #[test]
    fn parses_final_answer() {
        let out = parse("Thought: I now know the final answer\nFinal Answer: ## Summary\n\nAll good.");
        assert_eq!(
            out,
            ReactOutput::Final {
                thought: "I now know the final answer".into(),
                answer: "## Summary\n\nAll good.".into(),
            }
        );
    }

    #[test]
    fn unmarked_text_is_final() {
        let out = parse("  Just an answer.  ");
        assert_eq!(
            out,
            ReactOutput::Final {
                thought: String::new(),
                answer: "Just an answer.".into(),
            }
        );
    }

    #[test]
    fn later_final_answer_wins() {
        let out = parse("Action: ticket_details\nAction Input: t1\nFinal Answer: done");
        assert!(matches!(out, ReactOutput::Final { ref answer, .. } if answer == "done"));
    }

    #[test]
    fn later_action_wins() {
        let out = parse("Final Answer: maybe\nAction: ticket_details\nAction Input: t1");
        assert!(matches!(out, ReactOutput::Action { ref tool, .. } if tool == "ticket_details"));
    }

    #[test]
    fn hallucinated_observation_is_cut() {
        let out = parse("Action: ticket_messages\nAction Input: \"t1\"\nObservation: made up");
        match out {
            ReactOutput::Action { input, .. } => assert_eq!(input, "\"t1\""),
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn backticked_tool_name_and_missing_input() {
        let out = parse("Action: `ticket_details`");
        assert_eq!(
            out,
            ReactOutput::Action {
                thought: String::new(),
                tool: "ticket_details".into(),
                input: String::new(),
            }
        );
    }

    #[test]
    fn word_containing_action_is_not_a_marker() {
        let out = parse("The transaction: failed twice.");
        assert!(matches!(out, ReactOutput::Final { .. }));
    }

    #[test]
    fn markers_are_case_insensitive() {
        let out = parse("ACTION: ticket_context\naction input: t2");
        assert!(matches!(out, ReactOutput::Action { ref input, .. } if input == "t2"));
    }
}
