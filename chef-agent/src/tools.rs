//! Pantry tools offered to the model during the pantry step

use chef_core::{Pantry, ToolCall, ToolDefinition};
use chef_error::Error;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

pub const ADD_TO_PANTRY: &str = "add_to_pantry";
pub const LIST_PANTRY: &str = "list_pantry";
pub const REMOVE_FROM_PANTRY: &str = "remove_from_pantry";

#[derive(Debug, Deserialize)]
struct AddArgs {
    items: Vec<String>,
    #[serde(default)]
    quantities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RemoveArgs {
    items: Vec<String>,
}

pub fn pantry_tools() -> Vec<ToolDefinition> {
    let string_list = |description: &str| {
        json!({
            "type": "array",
            "items": { "type": "string" },
            "description": description
        })
    };

    vec![
        ToolDefinition::new(ADD_TO_PANTRY, "Add food items to the user's pantry inventory")
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "items": string_list("List of food items to add"),
                    "quantities": string_list("Optional quantities for each item")
                },
                "required": ["items"]
            })),
        ToolDefinition::new(LIST_PANTRY, "List all items currently in the pantry"),
        ToolDefinition::new(REMOVE_FROM_PANTRY, "Remove items from the pantry").with_parameters(
            json!({
                "type": "object",
                "properties": {
                    "items": string_list("List of food items to remove")
                },
                "required": ["items"]
            }),
        ),
    ]
}

/// Run one tool call against the pantry. Every outcome, including bad
/// arguments and unknown tools, is a message for the model.
pub fn execute_tool(pantry: &mut Pantry, call: &ToolCall) -> String {
    debug!(tool = %call.name, arguments = %call.arguments, "executing pantry tool");

    let result = match call.name.as_str() {
        ADD_TO_PANTRY => call.parse_arguments::<AddArgs>().map(|args| {
            pantry
                .add_items(args.items.as_slice(), args.quantities.as_deref())
                .to_string()
        }),
        REMOVE_FROM_PANTRY => call
            .parse_arguments::<RemoveArgs>()
            .map(|args| pantry.remove_items(args.items.as_slice()).to_string()),
        LIST_PANTRY => Ok(pantry.list_items()),
        other => return format!("Unknown function: {}", other),
    };

    result.unwrap_or_else(|e| {
        let err = Error::tool_failed(&call.name, format!("invalid arguments: {}", e));
        warn!(error = %err, "pantry tool rejected");
        format!("Error: {}", err.message())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: name.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    #[test]
    fn test_tool_declarations() {
        let tools = pantry_tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec![ADD_TO_PANTRY, LIST_PANTRY, REMOVE_FROM_PANTRY]);
        assert_eq!(tools[0].parameters["required"], json!(["items"]));
    }

    #[test]
    fn test_add_and_list() {
        let mut pantry = Pantry::new();
        let reply = execute_tool(
            &mut pantry,
            &call(ADD_TO_PANTRY, r#"{"items": ["Rice", "Beans"], "quantities": ["2 kg"]}"#),
        );
        assert_eq!(reply, "✅ Added 2 items to pantry: Rice, Beans");
        assert_eq!(pantry.get("rice").unwrap().quantity, "2 kg");
        assert_eq!(pantry.get("beans").unwrap().quantity, "1");

        let listing = execute_tool(&mut pantry, &call(LIST_PANTRY, "{}"));
        assert_eq!(listing, "📦 Your Pantry (2 items):\n  • beans: 1\n  • rice: 2 kg");
    }

    #[test]
    fn test_remove() {
        let mut pantry = Pantry::new();
        pantry.add_items(&["rice"], None);

        let reply = execute_tool(&mut pantry, &call(REMOVE_FROM_PANTRY, r#"{"items": ["saffron"]}"#));
        assert_eq!(reply, "⚠️ No matching items found in pantry");
        assert!(pantry.contains("rice"));

        let reply = execute_tool(&mut pantry, &call(REMOVE_FROM_PANTRY, r#"{"items": ["rice"]}"#));
        assert_eq!(reply, "✅ Removed from pantry: rice");
        assert!(pantry.is_empty());
    }

    #[test]
    fn test_unknown_tool() {
        let mut pantry = Pantry::new();
        assert_eq!(
            execute_tool(&mut pantry, &call("buy_groceries", "{}")),
            "Unknown function: buy_groceries"
        );
    }

    #[test]
    fn test_malformed_arguments() {
        let mut pantry = Pantry::new();
        let reply = execute_tool(&mut pantry, &call(ADD_TO_PANTRY, r#"{"items": "rice"}"#));
        assert!(reply.starts_with("Error: invalid arguments"));
        assert!(pantry.is_empty());
    }
}
