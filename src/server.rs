//! MCP server exposing the migration as tools over stdio.

use crate::migration::operator::NonInteractive;
use crate::tools;
use rmcp::{
    handler::server::ServerHandler,
    model::{CallToolResult, Content},
    tool, tool_handler, tool_router,
    transport::stdio,
    ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct MigrateParams {
    /// Astarte v1alpha2 resource as YAML
    resource: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct ValidateParams {
    /// Migrated v1alpha3 YAML manifest to validate
    config: String,
}

#[derive(Clone)]
struct MigrationMcpService {
    tool_router: rmcp::handler::server::tool::ToolRouter<Self>,
}

#[tool_router]
impl MigrationMcpService {
    fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Migrate an Astarte v1alpha2 resource to a v1alpha3 YAML manifest with migration notes")]
    async fn migrate_astarte_resource(
        &self,
        params: rmcp::handler::server::wrapper::Parameters<MigrateParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        // No terminal behind the transport: values that need an operator stay unset
        // and show up in the notes.
        match tools::migrate::migrate_astarte_resource(&params.0.resource, &mut NonInteractive) {
            Ok(out) => Ok(CallToolResult::success(vec![Content::text(out)])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e)])),
        }
    }

    #[tool(description = "Validate a migrated Astarte v1alpha3 YAML manifest")]
    async fn validate_astarte_manifest(
        &self,
        params: rmcp::handler::server::wrapper::Parameters<ValidateParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        match tools::manifest::validate_astarte_manifest(&params.0.config) {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text("Manifest is valid.")])),
            Err(errors) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Validation errors:\n{}",
                errors.join("\n")
            ))])),
        }
    }

    #[tool(description = "List how v1alpha2 fields map to v1alpha3")]
    async fn list_field_mappings(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        let out = tools::reference::list_field_mappings_json();
        Ok(CallToolResult::success(vec![Content::text(out)]))
    }
}

#[tool_handler]
impl ServerHandler for MigrationMcpService {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo::new(
            rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
        )
        .with_instructions(
            "Migrate Astarte custom resources from v1alpha2 to v1alpha3 and validate the result.",
        )
    }
}

pub async fn serve() -> anyhow::Result<()> {
    tracing::info!("serving migration tools over stdio");
    let service = MigrationMcpService::new();
    let transport = stdio();
    let server = service.serve(transport).await?;
    server.waiting().await?;
    Ok(())
}
