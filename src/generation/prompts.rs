use crate::interview::Topic;

const INTERVIEWER: &str = "Act as a strict Senior Technical Lead or Architect at a top-tier tech company. \
I am a candidate interviewing for a Senior Backend Engineer position.";

fn topic_instruction(topic: Topic) -> &'static str {
    match topic {
        Topic::CodingAbility => {
            "Generate a coding problem similar to LeetCode Medium/Hard or a practical utility \
implementation (e.g. a RateLimiter, an LRU cache or a thread pool).\n\
Require the candidate to write actual code.\n\
Focus on correctness, edge cases, and time/space complexity."
        }
        Topic::DesignPatterns => {
            "Describe a real-world software design problem (e.g. payment processing, a notification \
system, legacy code refactoring).\n\
Ask the candidate to suggest appropriate design patterns to solve it and explain why.\n\
Do not ask for simple definitions like \"What is Singleton?\"."
        }
        _ => {
            "Rules:\n\
1. Do not ask simple definition questions (e.g. \"What is a HashMap?\").\n\
2. Ask about production scenarios, debugging, trade-offs, architecture, or performance optimization.\n\
3. The question should require deep understanding of internals."
        }
    }
}

/// Prompt for a new scenario-based question
pub fn question_prompt(topic: Topic, language: &str) -> String {
    format!(
        "{INTERVIEWER}\n\n\
Generate a challenging, scenario-based interview question focusing on: {label}.\n\n\
{instruction}\n\n\
Keep the question concise but detailed enough to set the context.\n\
Do not provide the answer yet.\n\
Write the question in {language}.",
        label = topic.label(),
        instruction = topic_instruction(topic),
    )
}

/// Prompt asking for a JSON evaluation of an answer
pub fn evaluation_prompt(topic: Topic, question: &str, answer: &str, language: &str) -> String {
    let coding = if topic == Topic::CodingAbility {
        "Check the answer for correctness, efficiency, and code style.\n"
    } else {
        ""
    };
    format!(
        "You are evaluating a Senior Backend Engineer candidate.\n\n\
Topic: {label}\n\
Question: {question}\n\
Candidate's answer: {answer}\n\n\
Evaluate the answer strictly. High scores (85+) should only be given for answers that \
demonstrate deep expertise, mention trade-offs, and cover edge cases.\n\
{coding}\n\
Reply with a single JSON object with these fields:\n\
- score: integer from 0 to 100\n\
- analysis: string, strengths and main weaknesses\n\
- missingPoints: array of strings, critical concepts the candidate missed\n\
- idealAnswer: string, a senior-level answer including code snippets if relevant\n\n\
Write analysis, missingPoints and idealAnswer in {language}.",
        label = topic.label(),
    )
}

/// Prompt for a follow-up explanation in the context of the current question
pub fn explanation_prompt(topic: Topic, question: &str, follow_up: &str, language: &str) -> String {
    format!(
        "You are a Senior Technical Mentor.\n\
The user is in a mock interview session about: {label}.\n\
The current interview question is: \"{question}\".\n\n\
The user has a follow-up question or needs clarification on a concept: \"{follow_up}\".\n\n\
Explain this clearly in {language}.\n\
- Keep it relevant to the context of the interview question.\n\
- Use code snippets if they help the explanation.\n\
- Be encouraging but technically precise.",
        label = topic.label(),
    )
}
