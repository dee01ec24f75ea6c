//! MCP server implementation

use serde_json::{json, Value};
use spyglass_engine::{EngineConfig, SourceManager};
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, error, info};

use crate::error::McpError;
use crate::protocol::*;
use crate::tools;

/// MCP Server
///
/// Handles Model Context Protocol requests via stdio transport.
pub struct McpServer {
    manager: Arc<SourceManager>,
    runtime: Runtime,
}

impl McpServer {
    /// Create a new MCP server around a freshly constructed source manager.
    pub fn new(config: EngineConfig) -> Result<Self, McpError> {
        let runtime = Runtime::new()?;
        let manager = Arc::new(SourceManager::new(config));

        Ok(Self { manager, runtime })
    }

    /// Run the MCP server (stdio transport).
    ///
    /// Reads JSON-RPC requests from stdin and writes responses to stdout.
    pub fn run(&mut self) -> Result<(), McpError> {
        info!("Spyglass MCP server started");

        let stdin = std::io::stdin();
        let reader = BufReader::new(stdin);
        let mut stdout = std::io::stdout();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            debug!("Received request: {}", line);

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(req) => req,
                Err(e) => {
                    error!("Failed to parse request: {}", e);
                    let error_response =
                        JsonRpcError::new(None, -32700, format!("Parse error: {}", e));
                    let error_value = serde_json::to_value(&error_response).unwrap();
                    self.write_response(&mut stdout, &error_value)?;
                    continue;
                }
            };

            let response = self.handle_request(request);
            self.write_response(&mut stdout, &response)?;
        }

        info!("Spyglass MCP server stopped");
        Ok(())
    }

    /// Handle a JSON-RPC request. Transport-independent entry point.
    pub fn handle_request(&self, request: JsonRpcRequest) -> Value {
        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tool_call(id, request.params),
            _ => {
                let error = JsonRpcError::new(
                    id,
                    -32601,
                    format!("Method not found: {}", request.method),
                );
                serde_json::to_value(error).unwrap()
            }
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, id: Option<Value>) -> Value {
        let response = InitializeResponse {
            protocol_version: "0.1.0".to_string(),
            server_info: ServerInfo {
                name: "spyglass-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: Capabilities {
                tools: ToolsCapability { supported: true },
            },
        };

        let json_response = JsonRpcResponse::new(id, serde_json::to_value(response).unwrap());
        serde_json::to_value(json_response).unwrap()
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, id: Option<Value>) -> Value {
        let tools = vec![
            self.tool_definition_status(),
            self.tool_definition_search(),
            self.tool_definition_get(),
            self.tool_definition_health(),
            self.tool_definition_queue(),
            self.tool_definition_artifacts(),
            self.tool_definition_ledger(),
        ];

        let response = ToolListResponse { tools };
        let json_response = JsonRpcResponse::new(id, serde_json::to_value(response).unwrap());
        serde_json::to_value(json_response).unwrap()
    }

    /// Handle tools/call request
    fn handle_tool_call(&self, id: Option<Value>, params: Value) -> Value {
        let tool_name = match params.get("name").and_then(|v| v.as_str()) {
            Some(name) => name,
            None => {
                let error = JsonRpcError::new(id, -32602, "Missing tool name".to_string());
                return serde_json::to_value(error).unwrap();
            }
        };

        let tool_params = match params.get("arguments") {
            Some(args) => args.clone(),
            None => json!({}),
        };

        let result = match tool_name {
            "spyglass_status" => self.call_status_tool(tool_params),
            "spyglass_search_receipts" => self.call_search_tool(tool_params),
            "spyglass_get_receipt" => self.call_get_tool(tool_params),
            "spyglass_component_health" => self.call_health_tool(tool_params),
            "spyglass_queue_diagnostics" => self.call_queue_tool(tool_params),
            "spyglass_artifact_inventory" => self.call_artifacts_tool(tool_params),
            "spyglass_global_ledger" => self.call_ledger_tool(tool_params),
            _ => {
                let error =
                    JsonRpcError::new(id, -32601, format!("Tool not found: {}", tool_name));
                return serde_json::to_value(error).unwrap();
            }
        };

        match result {
            Ok(value) => {
                let response = JsonRpcResponse::new(id, value);
                serde_json::to_value(response).unwrap()
            }
            Err(e) => {
                let error = JsonRpcError::new(id, e.error_code(), e.to_string());
                serde_json::to_value(error).unwrap()
            }
        }
    }

    /// Call status tool
    fn call_status_tool(&self, params: Value) -> Result<Value, McpError> {
        let params: tools::StatusParams = serde_json::from_value(params)?;
        let result = self
            .runtime
            .block_on(tools::handle_status(&self.manager, params))?;
        Ok(serde_json::to_value(result)?)
    }

    /// Call search tool
    fn call_search_tool(&self, params: Value) -> Result<Value, McpError> {
        let params = serde_json::from_value(params)?;
        let result = self
            .runtime
            .block_on(tools::handle_search_receipts(&self.manager, params))?;
        Ok(serde_json::to_value(result)?)
    }

    /// Call get tool
    fn call_get_tool(&self, params: Value) -> Result<Value, McpError> {
        let params: tools::GetReceiptParams = serde_json::from_value(params)?;
        let result = self
            .runtime
            .block_on(tools::handle_get_receipt(&self.manager, params))?;
        Ok(serde_json::to_value(result)?)
    }

    /// Call health tool
    fn call_health_tool(&self, params: Value) -> Result<Value, McpError> {
        let params: tools::ComponentHealthParams = serde_json::from_value(params)?;
        let result = self
            .runtime
            .block_on(tools::handle_component_health(&self.manager, params))?;
        Ok(serde_json::to_value(result)?)
    }

    /// Call queue tool
    fn call_queue_tool(&self, params: Value) -> Result<Value, McpError> {
        let params: tools::QueueDiagnosticsParams = serde_json::from_value(params)?;
        let result = self
            .runtime
            .block_on(tools::handle_queue_diagnostics(&self.manager, params))?;
        Ok(serde_json::to_value(result)?)
    }

    /// Call artifacts tool
    fn call_artifacts_tool(&self, params: Value) -> Result<Value, McpError> {
        let params: tools::ArtifactInventoryParams = serde_json::from_value(params)?;
        let result = self
            .runtime
            .block_on(tools::handle_artifact_inventory(&self.manager, params))?;
        Ok(serde_json::to_value(result)?)
    }

    /// Call global ledger tool
    fn call_ledger_tool(&self, params: Value) -> Result<Value, McpError> {
        let params: tools::GlobalLedgerParams = serde_json::from_value(params)?;
        let result = self
            .runtime
            .block_on(tools::handle_global_ledger(&self.manager, params))?;
        Ok(serde_json::to_value(result)?)
    }

    /// Write response to stdout
    fn write_response<W: Write>(&self, writer: &mut W, response: &Value) -> Result<(), McpError> {
        let response_str = serde_json::to_string(response)?;
        writeln!(writer, "{}", response_str)?;
        writer.flush()?;
        debug!("Sent response: {}", response_str);
        Ok(())
    }

    // Tool definitions for tools/list response

    fn tool_definition_status(&self) -> ToolDefinition {
        ToolDefinition {
            name: "spyglass_status".to_string(),
            description: "Derived status for a task lineage (cheap, cache-first)".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tenant_id": {"type": "string", "description": "Tenant identifier"},
                    "task_id": {"type": "string", "description": "Task ID (alias for root_task_id)"},
                    "root_task_id": {"type": "string", "description": "Root task ID of the lineage"}
                },
                "required": ["tenant_id"]
            }),
        }
    }

    fn tool_definition_search(&self) -> ToolDefinition {
        ToolDefinition {
            name: "spyglass_search_receipts".to_string(),
            description: "Search receipt headers for a lineage with strict bounds".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tenant_id": {"type": "string", "description": "Tenant identifier"},
                    "root_task_id": {"type": "string", "description": "Root task ID of the lineage"},
                    "phase": {"type": "string", "description": "Filter by receipt phase"},
                    "recipient_ai": {"type": "string", "description": "Filter by recipient"},
                    "controls": {
                        "type": "object",
                        "properties": {
                            "limit": {"type": "integer", "minimum": 1},
                            "since": {"type": "string", "format": "date-time"},
                            "time_window_hours": {"type": "integer", "minimum": 1},
                            "freshness": {"type": "string", "enum": ["cache_ok", "prefer_fresh", "force_fresh"]}
                        }
                    }
                },
                "required": ["tenant_id", "root_task_id"]
            }),
        }
    }

    fn tool_definition_get(&self) -> ToolDefinition {
        ToolDefinition {
            name: "spyglass_get_receipt".to_string(),
            description: "Retrieve a single receipt by ID".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tenant_id": {"type": "string", "description": "Tenant identifier"},
                    "receipt_id": {"type": "string", "description": "Receipt identifier"}
                },
                "required": ["tenant_id", "receipt_id"]
            }),
        }
    }

    fn tool_definition_health(&self) -> ToolDefinition {
        ToolDefinition {
            name: "spyglass_component_health".to_string(),
            description: "Live health snapshot of the task gate (rate-limited)".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tenant_id": {"type": "string", "description": "Tenant identifier"},
                    "verbose": {"type": "boolean", "description": "Include verbose metrics", "default": false}
                },
                "required": ["tenant_id"]
            }),
        }
    }

    fn tool_definition_queue(&self) -> ToolDefinition {
        ToolDefinition {
            name: "spyglass_queue_diagnostics".to_string(),
            description: "Live queue diagnostics, bounded item headers only".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tenant_id": {"type": "string", "description": "Tenant identifier"},
                    "queue_id": {"type": "string", "description": "Specific queue to inspect"},
                    "limit": {"type": "integer", "description": "Max item headers (capped at 50)", "minimum": 1, "maximum": 50},
                    "include_examples": {"type": "boolean", "description": "Include example item headers", "default": false}
                },
                "required": ["tenant_id"]
            }),
        }
    }

    fn tool_definition_artifacts(&self) -> ToolDefinition {
        ToolDefinition {
            name: "spyglass_artifact_inventory".to_string(),
            description: "List staged artifact pointers for a lineage or deliverable (never blob bytes)".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tenant_id": {"type": "string", "description": "Tenant identifier"},
                    "root_task_id": {"type": "string", "description": "Lineage to inventory"},
                    "deliverable_id": {"type": "string", "description": "Deliverable to inventory"},
                    "controls": {"type": "object", "properties": {"limit": {"type": "integer", "minimum": 1}}}
                },
                "required": ["tenant_id"]
            }),
        }
    }

    fn tool_definition_ledger(&self) -> ToolDefinition {
        ToolDefinition {
            name: "spyglass_global_ledger".to_string(),
            description: "Query the authoritative global ledger (disabled by default, operator opt-in)".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tenant_id": {"type": "string", "description": "Tenant identifier"},
                    "root_task_id": {"type": "string", "description": "Lineage to query"}
                },
                "required": ["tenant_id", "root_task_id"]
            }),
        }
    }
}
