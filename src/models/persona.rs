use serde::{Deserialize, Serialize};

/// An assistant persona configuration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub description: String,
    pub system_instruction: String,
    pub tone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl Persona {
    fn preset(id: &str, name: &str, description: &str, system_instruction: &str, tone: &str, theme: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            system_instruction: system_instruction.to_string(),
            tone: tone.to_string(),
            theme: Some(theme.to_string()),
        }
    }
}

/// Personas every fresh workspace starts with
pub fn default_personas() -> Vec<Persona> {
    vec![
        Persona::preset(
            "agent-1",
            "Nexus Assistant",
            "A helpful, general-purpose project assistant.",
            "You are Nexus, a smart collaborative project assistant. You help the team manage tasks, schedule events, and answer questions based on the provided knowledge base. Always distinguish between different users.",
            "Professional, friendly, and concise.",
            "blue",
        ),
        Persona::preset(
            "agent-2",
            "Creative Director",
            "Focuses on ideation, design feedback, and creative writing.",
            "You are a Creative Director. Critique ideas, offer bold suggestions, and focus on aesthetics and user experience.",
            "Inspirational, critical, and visionary.",
            "rose",
        ),
        Persona::preset(
            "agent-3",
            "Tech Lead",
            "Helps with technical architecture and code.",
            "You are a Senior Tech Lead. Focus on scalability, security, and code quality. Provide technical solutions.",
            "Technical, precise, and direct.",
            "cyan",
        ),
        Persona::preset(
            "agent-4",
            "Mediator",
            "Helps resolve conflicts and formalize agreements.",
            "You are a skilled Mediator. Listen to all parties, identify common ground, and help users formalize their consensus into clear, written agreements.",
            "Diplomatic, neutral, and clear.",
            "indigo",
        ),
    ]
}
