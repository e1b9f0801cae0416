//! Prompt context built from session state

use chef_core::Session;

/// Preferences, pantry and the request, separated by blank lines.
pub fn inject_context(session: &Session, input: &str) -> String {
    [
        session.preferences.summary(),
        session.pantry.list_items(),
        format!("📝 User Request: {}", input),
    ]
    .join("\n\n")
}

/// Whether the request asks for a meal plan
pub fn wants_plan(input: &str) -> bool {
    let lower = input.to_lowercase();
    lower.contains("meal plan")
        || lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == "plan" || word == "generate")
}
