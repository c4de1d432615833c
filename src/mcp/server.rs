/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests from stdin
/// 2. Processes tool calls against the active learner's progress
/// 3. Sends JSON-RPC responses to stdout

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::domain::DomainError;
use crate::mcp::protocol::*;
use crate::tools::{self, input_schema, parse_params};
use crate::{LearningProgressServer, ServerError};

/// MCP server that handles communication with the client
pub struct McpServer {
    /// The underlying learning progress server
    progress_server: LearningProgressServer,
    /// Whether the client finished initialization
    initialized: bool,
}

/// Encode a protocol value, logging instead of panicking on failure
fn to_json<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        error!("Failed to encode response: {}", e);
        Value::Null
    })
}

/// Turn a tool response into a result: its `message` as text plus the rest as JSON
fn reply<T: Serialize>(result: Result<T, DomainError>) -> ToolCallResult {
    let response = match result {
        Ok(response) => response,
        Err(e) => return ToolCallResult::error(e.to_string()),
    };
    match serde_json::to_value(response) {
        Ok(mut data) => {
            let message = data
                .as_object_mut()
                .and_then(|fields| fields.remove("message"))
                .and_then(|m| m.as_str().map(str::to_string))
                .unwrap_or_default();
            ToolCallResult::with_data(message, &data)
        }
        Err(e) => ToolCallResult::error(e.to_string()),
    }
}

fn tool<P: schemars::JsonSchema>(name: &str, description: &str) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: input_schema::<P>(),
    }
}

/// Every tool the server exposes
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        tool::<tools::LessonCompleteParams>(
            "lesson_complete",
            "Mark a lesson completed for today (lesson ids are 1-based and count plain lessons only)",
        ),
        tool::<tools::ItemCompleteParams>(
            "item_complete",
            "Record a finished personalized practice, unit review or skip quiz",
        ),
        tool::<tools::XpParams>("xp_award", "Award XP for today"),
        tool::<tools::XpRevokeParams>(
            "xp_revoke",
            "Take back provisional XP when a lesson is left before completion",
        ),
        tool::<tools::StatusParams>(
            "progress_status",
            "Check the current streak, today's lessons and XP, and this week's progress",
        ),
        tool::<tools::QuestsParams>("quests_today", "List today's daily quests and their progress"),
        tool::<tools::RoadmapParams>(
            "roadmap",
            "Show every roadmap entry as locked, available or completed",
        ),
        tool::<tools::SessionSwitchParams>(
            "session_switch",
            "Switch the active identity (omit user_id for guest); data is never merged",
        ),
        tool::<tools::LogoutParams>("session_logout", "Sign out and remove the user's stored progress"),
        tool::<tools::ConsentGetParams>("consent_get", "Show cookie and analytics consent"),
        tool::<tools::ConsentSetParams>(
            "consent_set",
            "Update analytics/marketing consent and the learner's age",
        ),
        tool::<tools::PreferencesParams>("preferences_set", "Update display preferences"),
        tool::<tools::QuestionFlagParams>(
            "question_flag",
            "Report a confusing or wrong question in a lesson",
        ),
    ]
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(progress_server: LearningProgressServer) -> Self {
        Self {
            progress_server,
            initialized: false,
        }
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line) {
                        let response_str = serde_json::to_string(&response)?;

                        stdout.write_all(response_str.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    pub fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    json!(null),
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        self.handle_request(request)
    }

    /// Handle a JSON-RPC request; notifications get no response
    fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "initialized" | "notifications/initialized" => {
                self.initialized = true;
                if request.is_notification() {
                    return None;
                }
                JsonRpcResponse::success(request.id, json!(null))
            }
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request),
            _ if request.is_notification() => return None,
            _ => JsonRpcResponse::error(
                request.id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        };
        Some(response)
    }

    /// Handle MCP initialization request
    fn handle_initialize(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        info!("MCP client connected");

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: "Learning Progress MCP".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        JsonRpcResponse::success(request.id, to_json(result))
    }

    /// Handle tools/list request
    fn handle_tools_list(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(request.id, json!({ "tools": tool_definitions() }))
    }

    /// Handle tools/call request
    fn handle_tools_call(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tool_params: ToolCallParams = match request.params {
            Some(params) => match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        request.id,
                        error_codes::INVALID_PARAMS,
                        format!("Invalid parameters: {}", e),
                        None,
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    error_codes::INVALID_PARAMS,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        if !self.initialized {
            debug!("Tool call '{}' before initialization", tool_params.name);
        }

        let today = self.progress_server.today();
        let result = self.call_tool(&tool_params.name, tool_params.arguments, today);

        let handled = self.progress_server.process_events(today);
        if handled > 0 {
            debug!("Re-derived progress for {} events", handled);
        }

        JsonRpcResponse::success(request.id, to_json(result))
    }

    /// Dispatch one tool call
    fn call_tool(&mut self, name: &str, args: HashMap<String, Value>, today: NaiveDate) -> ToolCallResult {
        let server = &self.progress_server;
        let progress = server.progress();
        let curriculum = server.engine().curriculum();

        match name {
            "lesson_complete" => reply(parse_params(args).and_then(|p| {
                tools::complete_lesson(&progress, curriculum, server.bus(), p, today)
            })),
            "item_complete" => reply(parse_params(args).and_then(|p| {
                tools::complete_item(&progress, curriculum, server.bus(), p, today)
            })),
            "xp_award" => reply(
                parse_params(args).and_then(|p| tools::award_xp(&progress, server.bus(), p, today)),
            ),
            "xp_revoke" => reply(parse_params(args).and_then(|p| {
                tools::revoke_xp(&progress, &server.analytics(), server.bus(), p, today)
            })),
            "progress_status" => reply(parse_params(args).and_then(|p| {
                tools::get_progress_status(&progress, server.engine(), &server.analytics(), p, today)
            })),
            "quests_today" => reply(parse_params(args).and_then(|p| {
                tools::get_daily_quests(
                    &progress,
                    server.engine(),
                    &mut rand::thread_rng(),
                    p,
                    today,
                    Utc::now().timestamp_millis(),
                )
            })),
            "roadmap" => reply(
                parse_params(args).and_then(|p| tools::get_roadmap(&progress, server.engine(), p, today)),
            ),
            "consent_get" => {
                reply(parse_params(args).and_then(|p| tools::get_consent(&server.analytics(), p)))
            }
            "consent_set" => {
                reply(parse_params(args).and_then(|p| tools::set_consent(&server.analytics(), p)))
            }
            "question_flag" => {
                reply(parse_params(args).and_then(|p| tools::flag_question(&server.analytics(), p)))
            }
            "preferences_set" => {
                reply(parse_params(args).and_then(|p| tools::set_preferences(&progress, p)))
            }
            "session_switch" => match parse_params(args).and_then(tools::switch_session) {
                Ok((session, response)) => {
                    drop(progress);
                    self.progress_server.set_session(session);
                    reply(Ok(response))
                }
                Err(e) => ToolCallResult::error(e.to_string()),
            },
            "session_logout" => match parse_params::<tools::LogoutParams>(args) {
                Ok(_) => {
                    let (session, response) = tools::logout(server.store(), &progress);
                    drop(progress);
                    self.progress_server.set_session(session);
                    reply(Ok(response))
                }
                Err(e) => ToolCallResult::error(e.to_string()),
            },
            _ => ToolCallResult::error(format!("Unknown tool: {}", name)),
        }
    }
}
