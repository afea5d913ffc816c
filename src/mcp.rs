//! MCP (Model Context Protocol) server for dataset inference.
//!
//! Exposes every operation in `ops` as an MCP tool so that AI assistants
//! (Claude Desktop, Cursor, etc.) can invoke them over stdio JSON-RPC.
//!
//! Start with: `dataset --mcp`

use std::sync::{Arc, Mutex};

use rmcp::{
    handler::server::tool::{ToolCallContext, ToolRouter},
    handler::server::wrapper::Parameters,
    model::*,
    service::RequestContext,
    tool, tool_router, ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::algo::cache::DatasetCache;
use crate::config::DatasetConfig;
use crate::ops;

// ── Parameter structs ───────────────────────────────────────────────────────
// Each struct maps 1:1 with a CLI subcommand. `JsonSchema` is required by
// rmcp so that the tool's input schema is auto-generated for the AI client.

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DatasetParams {
    /// JSON array of documents. MongoDB Extended JSON wrappers
    /// (`$oid`, `$date`, `$numberLong`, ...) are decoded.
    pub records: Vec<serde_json::Value>,
    /// Flatten policy: "shallow" (default) or "deep".
    pub flatten: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NormalizeParams {
    /// JSON array of documents to normalize.
    pub records: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ThresholdParams {
    /// JSON array of documents.
    pub records: Vec<serde_json::Value>,
    /// Flatten policy: "shallow" (default) or "deep".
    pub flatten: Option<String>,
    /// Distinct-value cutoff for categorical string fields (default: 50).
    pub threshold: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PreviewParams {
    /// JSON array of documents.
    pub records: Vec<serde_json::Value>,
    /// Flatten policy: "shallow" (default) or "deep".
    pub flatten: Option<String>,
    /// Number of rows to show (default: 20).
    pub limit: Option<usize>,
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn json_text(v: &serde_json::Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

fn join_error(e: tokio::task::JoinError) -> McpError {
    McpError::internal_error(format!("task join error: {e}"), None)
}

// ── MCP Server ──────────────────────────────────────────────────────────────

/// The MCP server. Owns its settings and the dataset cache used by `infer`.
#[derive(Clone)]
pub struct DatasetMcp {
    #[allow(dead_code)] // accessed at runtime by the #[tool_router] macro
    tool_router: ToolRouter<Self>,
    config: DatasetConfig,
    cache: Arc<Mutex<DatasetCache>>,
}

#[tool_router]
impl DatasetMcp {
    pub fn new(config: DatasetConfig) -> Self {
        let cache = DatasetCache::new(config.cache_capacity);
        Self {
            tool_router: Self::tool_router(),
            config,
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    /// Settings for one call: the server config with per-call overrides.
    fn call_config(
        &self,
        flatten: Option<&str>,
        threshold: Option<usize>,
    ) -> Result<DatasetConfig, McpError> {
        let mut config = self.config.clone();
        if let Some(name) = flatten {
            config.flatten =
                ops::parse_flatten_depth(name).map_err(|e| McpError::invalid_params(e, None))?;
        }
        if let Some(t) = threshold {
            config.cardinality_threshold = t;
        }
        Ok(config)
    }

    // ── infer ───────────────────────────────────────────────────────────

    #[tool(
        name = "infer",
        description = "Convert a JSON array of documents into a flat dataset: `schema.fields` (name + type: string, number, boolean, date, null, array, object, mixed), `rows` with dotted keys for nested objects, and `sampleRows` (first 5-10 rows, for prompting). Results are cached per input and settings."
    )]
    async fn infer(&self, params: Parameters<DatasetParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let config = self.call_config(p.flatten.as_deref(), None)?;
        let cache = Arc::clone(&self.cache);
        let result = tokio::task::spawn_blocking(move || {
            let mut cache = cache
                .lock()
                .map_err(|_| McpError::internal_error("dataset cache poisoned", None))?;
            Ok::<_, McpError>(ops::op_infer_cached(&mut cache, &p.records, &config))
        })
        .await
        .map_err(join_error)??;
        Ok(CallToolResult::success(vec![Content::text(json_text(
            &result,
        ))]))
    }

    // ── normalize ───────────────────────────────────────────────────────

    #[tool(
        name = "normalize",
        description = "Replace BSON wrapper values (ObjectId, dates, Decimal128, Int64, Int32, Double) with plain JSON: hex strings, ISO-8601 UTC strings, and numbers. Structure is left unflattened."
    )]
    async fn normalize(
        &self,
        params: Parameters<NormalizeParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let result = tokio::task::spawn_blocking(move || ops::op_normalize(&p.records))
            .await
            .map_err(join_error)?;
        Ok(CallToolResult::success(vec![Content::text(json_text(
            &result,
        ))]))
    }

    // ── flatten ─────────────────────────────────────────────────────────

    #[tool(
        name = "flatten",
        description = "Flatten nested objects into dotted keys (`profile.age`). Shallow (default) pulls up one level only; deep recurses to the leaves. Arrays are never expanded."
    )]
    async fn flatten(&self, params: Parameters<DatasetParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let config = self.call_config(p.flatten.as_deref(), None)?;
        let result =
            tokio::task::spawn_blocking(move || ops::op_flatten(&p.records, config.flatten))
                .await
                .map_err(join_error)?;
        Ok(CallToolResult::success(vec![Content::text(json_text(
            &result,
        ))]))
    }

    // ── schema ──────────────────────────────────────────────────────────

    #[tool(
        name = "schema",
        description = "Infer only the schema (field names and types) of a JSON array of documents, with the total row count."
    )]
    async fn schema(&self, params: Parameters<DatasetParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let config = self.call_config(p.flatten.as_deref(), None)?;
        let result = tokio::task::spawn_blocking(move || ops::op_schema(&p.records, &config))
            .await
            .map_err(join_error)?;
        Ok(CallToolResult::success(vec![Content::text(json_text(
            &result,
        ))]))
    }

    // ── profile ─────────────────────────────────────────────────────────

    #[tool(
        name = "profile",
        description = "Per-field statistics: inferred type, non-null/null/missing counts, cardinality, uniqueness, categorical flag, and top-5 most frequent values."
    )]
    async fn profile(&self, params: Parameters<ThresholdParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let config = self.call_config(p.flatten.as_deref(), p.threshold)?;
        let result = tokio::task::spawn_blocking(move || ops::op_profile(&p.records, &config))
            .await
            .map_err(join_error)?;
        Ok(CallToolResult::success(vec![Content::text(json_text(
            &result,
        ))]))
    }

    // ── preview ─────────────────────────────────────────────────────────

    #[tool(
        name = "preview",
        description = "Tabular preview: column names (union of all fields) and the first rows as cell lists aligned to those columns."
    )]
    async fn preview(&self, params: Parameters<PreviewParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let config = self.call_config(p.flatten.as_deref(), None)?;
        let result =
            tokio::task::spawn_blocking(move || ops::op_preview(&p.records, &config, p.limit))
                .await
                .map_err(join_error)?;
        Ok(CallToolResult::success(vec![Content::text(json_text(
            &result,
        ))]))
    }

    // ── prompt ──────────────────────────────────────────────────────────

    #[tool(
        name = "prompt",
        description = "Render a compact text block (row count, typed field list, sample rows as JSON lines) for inclusion in an LLM prompt."
    )]
    async fn prompt(&self, params: Parameters<DatasetParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let config = self.call_config(p.flatten.as_deref(), None)?;
        let text = tokio::task::spawn_blocking(move || ops::op_prompt(&p.records, &config))
            .await
            .map_err(join_error)?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    // ── chart_fields ────────────────────────────────────────────────────

    #[tool(
        name = "chart_fields",
        description = "Pick chart axis candidates: categorical (string fields under the cardinality threshold), numeric, and temporal fields, plus string fields excluded for high cardinality."
    )]
    async fn chart_fields(
        &self,
        params: Parameters<ThresholdParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let config = self.call_config(p.flatten.as_deref(), p.threshold)?;
        let result =
            tokio::task::spawn_blocking(move || ops::op_chart_fields(&p.records, &config))
                .await
                .map_err(join_error)?;
        Ok(CallToolResult::success(vec![Content::text(json_text(
            &result,
        ))]))
    }
}

// ── ServerHandler glue ──────────────────────────────────────────────────────

impl ServerHandler for DatasetMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Dataset shape engine. Tools: infer, normalize, flatten, schema, profile, \
                 preview, prompt, chart_fields. Pass JSON documents (MongoDB Extended \
                 JSON accepted) as `records`."
                    .into(),
            ),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "dataset".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("Dataset Engine".into()),
                description: Some(
                    "Schema inference and flattening of semi-structured documents".into(),
                ),
                icons: None,
                website_url: None,
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: Default::default(),
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let tool_context = ToolCallContext::new(self, request, context);
        async move { self.tool_router.call(tool_context).await }
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tool_router.get(name).cloned()
    }
}

// ── Entry point ─────────────────────────────────────────────────────────────

/// Start the MCP server on stdio. Called from `cli.rs` when `--mcp` is passed.
pub async fn serve_stdio(config: DatasetConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        flatten = config.flatten.as_str(),
        cache_capacity = config.cache_capacity,
        "starting MCP server"
    );
    let server = DatasetMcp::new(config);
    let transport = rmcp::transport::io::stdio();
    let service = server.serve(transport).await.inspect_err(|e| {
        tracing::error!(error = %e, "MCP serve error");
    })?;
    service.waiting().await?;
    Ok(())
}
