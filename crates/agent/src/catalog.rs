//! Tool catalog
//!
//! Built once per session from the server's listing and shared read-only by
//! every query afterwards.

use tracing::{debug, info};

use toolbridge_mcp::{RemoteTool, ToolServer};
use toolbridge_provider::FunctionDeclaration;

use crate::schema::{normalize, NormalizedSchema};

/// Normalized description of one remote tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: NormalizedSchema,
}

impl ToolDescriptor {
    pub fn from_remote(tool: &RemoteTool) -> Self {
        Self {
            name: tool.name.clone(),
            description: tool.description.clone().unwrap_or_default(),
            parameters: normalize(&tool.input_schema),
        }
    }

    /// Declaration handed to the model; `parameters` is left out when the
    /// tool takes none
    pub fn declaration(&self) -> FunctionDeclaration {
        if self.parameters.is_empty() {
            return FunctionDeclaration::without_parameters(&self.name, &self.description);
        }
        FunctionDeclaration::new(&self.name, &self.description, self.parameters.to_value())
    }
}

/// Ordered set of tool descriptors, in listing order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools }
    }

    /// List the server's tools and normalize them. A failing listing call
    /// is returned as-is; there is no retry.
    pub async fn load<S: ToolServer + ?Sized>(server: &S) -> crate::Result<Self> {
        let listing = server.list_tools().await?;
        let catalog = build_catalog(&listing);
        info!("tool catalog ready: {} tool(s)", catalog.len());
        Ok(catalog)
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Function declarations in catalog order
    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.tools.iter().map(ToolDescriptor::declaration).collect()
    }

    /// Declarations exactly as they go on the wire
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(&self.declarations())?)
    }
}

/// One descriptor per listing entry, order preserved
pub fn build_catalog(listing: &[RemoteTool]) -> ToolCatalog {
    let tools = listing
        .iter()
        .map(|tool| {
            let descriptor = ToolDescriptor::from_remote(tool);
            debug!(
                "catalog entry {}: {} parameter(s), {} required",
                descriptor.name,
                descriptor.parameters.properties().len(),
                descriptor.parameters.required().len()
            );
            descriptor
        })
        .collect();

    ToolCatalog::new(tools)
}
