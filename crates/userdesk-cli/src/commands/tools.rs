//! `userdesk tools` - print the tool definitions the server exposes.

use anyhow::Result;
use userdesk_mcp::ToolRegistry;

pub fn execute() -> Result<()> {
    let registry = ToolRegistry::with_builtin_tools();
    let tools: Vec<_> = registry.list().into_iter().cloned().collect();
    println!("{}", serde_json::to_string_pretty(&tools)?);
    Ok(())
}
