//! System prompt for tool-calling models.

use crate::primitives::PoiCategory;
use crate::tools::list_tools;

/// Prompt listing every tool with its parameters and the valid categories.
pub fn system_prompt() -> String {
    let categories: Vec<&str> = PoiCategory::ALL.iter().map(|c| c.as_str()).collect();

    let mut prompt = String::from("Select ONE tool. Output JSON only, as {\"name\": <tool>, \"arguments\": {...}}.\n\n");
    prompt.push_str("Valid poi_type values: ");
    prompt.push_str(&categories.join(", "));
    prompt.push_str("\n\nCoordinates written as (lat X, lon Y) in the question are exact; copy them.\n\nTools:\n");

    for tool in list_tools() {
        let params: Vec<String> = tool.input_schema["properties"]
            .as_object()
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default();
        prompt.push_str(&format!("- {}({}) - {}\n", tool.name, params.join(","), tool.description));
    }
    prompt
}
