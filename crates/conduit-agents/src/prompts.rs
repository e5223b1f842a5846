use conduit_models::routing::ChoiceSchema;
use conduit_tools::CapabilitySet;

use crate::parser::ReactFormatError;

pub fn decision_system_prompt() -> String {
    "You are an AI assistant responsible for deciding whether a task needs a web search.\n\n\
     You will receive a message from the user. Decide whether answering it requires \
     external or current information that you cannot know on your own: news, prices, \
     weather, schedules, recent events, or anything that changes over time.\n\n\
     Reminders, greetings, instructions and general knowledge do NOT need a search.\n\n\
     If the task needs a web search answer only \"sim\", otherwise answer only \"nao\"."
        .to_string()
}

pub fn direct_system_prompt() -> String {
    "You are an AI assistant responsible for helping users with their tasks.\n\n\
     Tasks may be simple reminders, such as:\n\
     - Remember to take out the trash\n\
     - Remember to drink water\n\
     - Remember to exercise\n\n\
     For these tasks just inform the user, for example:\n\
     \"Remember to take out the trash\"\n\
     \"Remember to drink water\"\n\
     \"Remember to exercise\"\n\n\
     For anything else, answer briefly and directly from what you know.\n\
     Keep a polite and helpful tone in your responses."
        .to_string()
}

/// Appended to the system prompt when a backend emulates structured output.
pub fn structured_output_instruction(schema: &ChoiceSchema) -> String {
    let mut example = serde_json::Map::new();
    example.insert(
        schema.field.clone(),
        serde_json::Value::String(schema.options[0].clone()),
    );
    format!(
        "You MUST respond with ONLY a JSON object matching this schema:\n\
         {}\n\n\
         The \"{}\" field must be exactly one of: \"{}\" or \"{}\". No other text.",
        serde_json::to_string_pretty(&example).unwrap_or_default(),
        schema.field,
        schema.options[0],
        schema.options[1]
    )
}

pub fn react_system_prompt() -> String {
    "You are an AI assistant responsible for helping users with their tasks. \
     Use the tools available to you to gather the information you need, then answer. \
     Keep a polite and helpful tone in your responses."
        .to_string()
}

/// The ReAct transcript prompt: tool list, format rules, question, scratchpad.
pub fn react_user_prompt(capabilities: &CapabilitySet, question: &str, scratchpad: &str) -> String {
    format!(
        "Answer the following questions as best you can. You have access to the following tools:\n\n\
         {tools}\n\n\
         Use the following format:\n\n\
         Question: the input question you must answer\n\
         Thought: you should always think about what to do\n\
         Action: the action to take, should be one of [{names}]\n\
         Action Input: the input to the action\n\
         Observation: the result of the action\n\
         ... (this Thought/Action/Action Input/Observation can repeat N times)\n\
         Thought: I now know the final answer\n\
         Final Answer: the final answer to the original input question\n\n\
         Begin!\n\n\
         Question: {question}\n\
         Thought: {scratchpad}",
        tools = capabilities.describe(),
        names = capabilities.names().join(", "),
    )
}

/// Observation fed back when the model's output could not be parsed.
pub fn format_correction(error: &ReactFormatError) -> String {
    format!(
        "Invalid Format: {error}. Your output could not be parsed, follow the format: \
         either an 'Action:' line followed by an 'Action Input:' line, or a single \
         'Final Answer:' line."
    )
}

/// Observation fed back when the model names a tool that is not registered.
pub fn invalid_tool_observation(tool: &str, capabilities: &CapabilitySet) -> String {
    format!(
        "{tool} is not a valid tool, try one of [{}].",
        capabilities.names().join(", ")
    )
}

/// Observation fed back when a tool rejects its argument.
pub fn tool_error_observation(error: &conduit_tools::CapabilityError) -> String {
    format!("Tool error: {error}. Check the Action Input and try again.")
}
