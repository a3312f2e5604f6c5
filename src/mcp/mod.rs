//! MCP server implementation for mizan.
//!
//! Exposes collection search as MCP tools for AI editors.

use std::borrow::Cow;
use std::fmt::Write;
use std::sync::{Arc, Mutex};

use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, ErrorCode, ErrorData as McpError, ServerCapabilities, ServerInfo,
    },
    schemars, tool, tool_handler, tool_router,
    transport::stdio,
};
use serde::Deserialize;
use tracing::info;

use crate::commands::{self, SearchRequest};
use crate::config::Config;
use crate::search::Searcher;
use crate::search::dispatch::CategoryItems;

/// Parameters for `search_collections` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchParams {
    #[schemars(description = "The search query")]
    pub query: String,
    #[schemars(description = "Search only this category (e.g. 'surahs', 'hadiths')")]
    pub category: Option<String>,
    #[schemars(description = "Results per category (default: the category's own limit)")]
    pub limit: Option<usize>,
    #[schemars(description = "Number of ranked results to skip (default: 0)")]
    pub offset: Option<usize>,
}

struct ServerState {
    config: Config,
    items: CategoryItems,
    searcher: Searcher,
}

/// MCP server exposing mizan tools.
#[derive(Clone)]
pub struct MizanServer {
    tool_router: ToolRouter<Self>,
    state: Arc<Mutex<ServerState>>,
}

fn internal_error(message: String) -> McpError {
    McpError {
        code: ErrorCode::INTERNAL_ERROR,
        message: Cow::from(message),
        data: None,
    }
}

#[tool_router]
impl MizanServer {
    /// Create a server over collections loaded once at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if no collection loads.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let items = commands::load_items(&config)?;
        let searcher = Searcher::with_settings(config.cache_settings());

        Ok(Self {
            tool_router: Self::tool_router(),
            state: Arc::new(Mutex::new(ServerState {
                config,
                items,
                searcher,
            })),
        })
    }

    #[tool(description = "Fuzzy search surahs, juzs, pages, hadith books and podcast episodes")]
    async fn search_collections(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = SearchRequest {
            query: params.query.clone(),
            category: params.category,
            limit: params.limit,
            offset: params.offset.unwrap_or(0),
            min_score: None,
        };

        let mut state = self
            .state
            .lock()
            .map_err(|_| internal_error("Search state is unavailable".to_string()))?;
        let ServerState {
            config,
            items,
            searcher,
        } = &mut *state;

        match commands::search_loaded(config, searcher, items, &request) {
            Ok(results) => {
                let text = commands::render_text(&params.query, &results);
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Err(internal_error(format!("Search failed: {e}"))),
        }
    }

    #[tool(description = "List the searchable categories and their fields")]
    async fn list_categories(&self) -> Result<CallToolResult, McpError> {
        let state = self
            .state
            .lock()
            .map_err(|_| internal_error("Search state is unavailable".to_string()))?;

        let mut output = String::new();
        for category in &state.config.categories {
            let records = state.items.get(&category.name).map_or(0, |c| c.len());
            let _ = writeln!(
                output,
                "- **{}**: {} record(s), fields: {}, limit {}",
                category.name,
                records,
                category.search_fields.join(", "),
                category.limit
            );
        }

        Ok(CallToolResult::success(vec![Content::text(output)]))
    }
}

#[tool_handler]
impl ServerHandler for MizanServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "mizan provides fuzzy search over Quran surahs, juzs and pages, hadith books \
                and podcast episodes. Use search_collections to find entries and \
                list_categories to see what can be searched."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Start the MCP server with stdio transport.
///
/// # Errors
///
/// Returns an error if the server fails to start or encounters a fatal error.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let server = MizanServer::new(config)?;
    info!("Starting MCP server on stdio");
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
