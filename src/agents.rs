//! Agent personas and their registry
//!
//! An agent is a plain value describing a persona (role, goal, backstory)
//! and the tools it works with. There is no inheritance hierarchy and no
//! global registry: constructors live in an explicit map built at startup
//! and handed to whoever needs it.

use std::collections::HashMap;

use crate::error::CrewError;

/// A crew member's persona and tool set.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Registry name
    pub name: &'static str,
    /// Role headline, optionally contextualized with a location or domain
    pub role: String,
    /// What the agent is trying to accomplish
    pub goal: &'static str,
    /// Persona background, used verbatim in verbose output
    pub backstory: &'static str,
    /// Names of the tools this agent uses
    pub tools: Vec<&'static str>,
}

/// Builds the weather reporter persona.
pub fn weather_agent(location: Option<&str>) -> Agent {
    let mut role = "Weather Reporter".to_string();
    if let Some(location) = location {
        role.push_str(&format!(" for {}", location));
    }
    Agent {
        name: "weather",
        role,
        goal: "Provide accurate and concise temperature information",
        backstory: "An expert meteorologist with years of experience in weather reporting, \
                    with a talent for presenting weather information in a clear and \
                    accessible way.",
        tools: vec!["weather"],
    }
}

/// Builds the SEO analyst persona.
pub fn seo_agent(domain: Option<&str>) -> Agent {
    let mut role = "SEO Analyst".to_string();
    if let Some(domain) = domain {
        role.push_str(&format!(" for {}", domain));
    }
    Agent {
        name: "seo",
        role,
        goal: "Analyze Google Search Console data and verify keyword rankings",
        backstory: "An expert SEO analyst with deep knowledge of search engine \
                    optimization and keyword research, quick to assess a website's \
                    search presence.",
        tools: vec!["gsc", "keyword_search"],
    }
}

/// Constructor held in the agent registry.
pub type AgentCtor = fn() -> Agent;

/// Builds the agent registry.
///
/// The map is constructed here and passed explicitly; nothing registers
/// itself behind the scenes.
pub fn build_agent_registry() -> HashMap<&'static str, AgentCtor> {
    let mut registry: HashMap<&'static str, AgentCtor> = HashMap::new();
    registry.insert("weather", || weather_agent(None));
    registry.insert("seo", || seo_agent(None));
    registry
}

/// Resolves an agent by registry name.
pub fn create_agent(
    registry: &HashMap<&'static str, AgentCtor>,
    name: &str,
) -> Result<Agent, CrewError> {
    registry
        .get(name)
        .map(|ctor| ctor())
        .ok_or_else(|| CrewError::UnknownAgent(name.to_string()))
}
