//! Result helpers for MCP tool responses

use std::fmt::Display;

use rmcp::model::{CallToolResult, Content};

/// Successful plain text response
pub fn text_success(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

/// Failed tool result (`is_error = true`) with the error message as text.
///
/// The client sees the message and the server keeps serving.
pub fn tool_failure(err: impl Display) -> CallToolResult {
    CallToolResult::error(vec![Content::text(err.to_string())])
}

/// Concatenate the text items of a result, one per line.
pub fn result_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| c.as_text().map(|t| t.text.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_text_joins_items() {
        let result = CallToolResult::success(vec![Content::text("a"), Content::text("b")]);
        assert_eq!(result_text(&result), "a\nb");
    }

    #[test]
    fn test_text_success() {
        let result = text_success("hello world");
        assert!(!result.is_error.unwrap_or(false));
        assert_eq!(result_text(&result), "hello world");
    }

    #[test]
    fn test_tool_failure_sets_error_flag() {
        let result = tool_failure("Query error: syntax error at or near \"SELEC\"");
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).starts_with("Query error"));
    }
}
