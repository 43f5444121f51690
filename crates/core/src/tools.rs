//! Static catalogue of the AI tools that read and write entries.
//!
//! Transports register these descriptors explicitly; there is no runtime
//! registration. Each `log_*` tool takes a [`LogEntryRequest`] and each
//! `get_*` tool takes optional `from`/`to` days resolved with
//! [`TimeWindow::for_days`].
//!
//! [`LogEntryRequest`]: crate::entry::LogEntryRequest
//! [`TimeWindow::for_days`]: crate::storage::TimeWindow::for_days

use serde::Serialize;

use crate::entry::EntryType;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolParam {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub required: bool,
}

/// What a tool does with its entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolAction {
    Log,
    Get,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub entry_type: EntryType,
    pub action: ToolAction,
    pub params: &'static [ToolParam],
}

const fn param(
    name: &'static str,
    kind: ParamKind,
    description: &'static str,
    required: bool,
) -> ToolParam {
    ToolParam {
        name,
        kind,
        description,
        required,
    }
}

const TIMESTAMP: ToolParam = param(
    "timestamp",
    ParamKind::String,
    "ISO 8601 timestamp; defaults to now",
    false,
);
const NOTES: ToolParam = param("notes", ParamKind::String, "Optional notes", false);

const RANGE_PARAMS: &[ToolParam] = &[
    param(
        "from",
        ParamKind::String,
        "Start date, ISO 8601 (e.g. 2026-02-05)",
        false,
    ),
    param(
        "to",
        ParamKind::String,
        "End date, ISO 8601 (e.g. 2026-02-05)",
        false,
    ),
];

const LOG_FOOD_PARAMS: &[ToolParam] = &[
    param(
        "description",
        ParamKind::String,
        "What was eaten, e.g. '2 eggs and toast'",
        true,
    ),
    param("calories", ParamKind::Number, "Total calories", false),
    param("protein", ParamKind::Number, "Protein in grams", false),
    param("carbs", ParamKind::Number, "Carbohydrates in grams", false),
    param("fat", ParamKind::Number, "Fat in grams", false),
    param("fiber", ParamKind::Number, "Fiber in grams", false),
    param("caffeine", ParamKind::Number, "Caffeine in milligrams", false),
    param(
        "cholesterol",
        ParamKind::Number,
        "Cholesterol in milligrams",
        false,
    ),
    NOTES,
    TIMESTAMP,
];

const LOG_EXERCISE_PARAMS: &[ToolParam] = &[
    param(
        "description",
        ParamKind::String,
        "What exercise was done, e.g. '30 min run'",
        true,
    ),
    param(
        "calories_burned",
        ParamKind::Number,
        "Estimated calories burned",
        false,
    ),
    param(
        "duration_minutes",
        ParamKind::Number,
        "Duration in minutes",
        false,
    ),
    NOTES,
    TIMESTAMP,
];

const LOG_WEIGHT_PARAMS: &[ToolParam] = &[
    param("weight", ParamKind::Number, "Body weight", true),
    param("unit", ParamKind::String, "Unit, e.g. 'kg' or 'lb'", false),
    NOTES,
    TIMESTAMP,
];

/// Every tool, in registration order.
pub const TOOLS: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: "log_food",
        description: "Log a food entry with nutritional info. Use this when the user tells you what they ate.",
        entry_type: EntryType::Food,
        action: ToolAction::Log,
        params: LOG_FOOD_PARAMS,
    },
    ToolDescriptor {
        name: "get_food",
        description: "Get food entries for a date range. Defaults to today.",
        entry_type: EntryType::Food,
        action: ToolAction::Get,
        params: RANGE_PARAMS,
    },
    ToolDescriptor {
        name: "log_exercise",
        description: "Log an exercise entry. Use this when the user tells you about a workout or physical activity.",
        entry_type: EntryType::Exercise,
        action: ToolAction::Log,
        params: LOG_EXERCISE_PARAMS,
    },
    ToolDescriptor {
        name: "get_exercise",
        description: "Get exercise entries for a date range. Defaults to today.",
        entry_type: EntryType::Exercise,
        action: ToolAction::Get,
        params: RANGE_PARAMS,
    },
    ToolDescriptor {
        name: "log_weight",
        description: "Log a body weight measurement.",
        entry_type: EntryType::Weight,
        action: ToolAction::Log,
        params: LOG_WEIGHT_PARAMS,
    },
    ToolDescriptor {
        name: "get_weight",
        description: "Get weight entries for a date range. Defaults to today.",
        entry_type: EntryType::Weight,
        action: ToolAction::Get,
        params: RANGE_PARAMS,
    },
];

/// Find a tool by name.
pub fn find_tool(name: &str) -> Option<&'static ToolDescriptor> {
    TOOLS.iter().find(|tool| tool.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tool_names_are_unique() {
        let names: HashSet<_> = TOOLS.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), TOOLS.len());
    }

    #[test]
    fn every_entry_type_can_be_logged_and_read() {
        for entry_type in EntryType::ALL {
            for action in [ToolAction::Log, ToolAction::Get] {
                assert!(
                    TOOLS
                        .iter()
                        .any(|t| t.entry_type == entry_type && t.action == action),
                    "missing {action:?} tool for {entry_type}"
                );
            }
        }
    }

    #[test]
    fn log_tools_accept_a_timestamp() {
        for tool in TOOLS.iter().filter(|t| t.action == ToolAction::Log) {
            assert!(tool.params.iter().any(|p| p.name == "timestamp"));
        }
    }

    #[test]
    fn find_tool_by_name() {
        let tool = find_tool("get_exercise").unwrap();
        assert_eq!(tool.entry_type, EntryType::Exercise);
        assert_eq!(tool.action, ToolAction::Get);
        assert!(find_tool("update_profile").is_none());
    }

    #[test]
    fn descriptors_serialize_for_transports() {
        let json = serde_json::to_value(find_tool("log_weight").unwrap()).unwrap();
        assert_eq!(json["entry_type"], "weight");
        assert_eq!(json["action"], "log");
        assert_eq!(json["params"][0]["kind"], "number");
    }
}
