//! The bundled core tools, always present regardless of configured tool
//! repos: `ping` and `list_tools_available`.

mod discovery;
mod system;

use crate::error::Result;
use crate::server::registry::ToolRegistry;

/// Seeds a freshly constructed registry with the bundled core tools. Called
/// by the loader ahead of any dynamic-plugin directory scan.
pub fn seed_native_tools(registry: &mut ToolRegistry) -> Result<()> {
    registry.register(system::ping_tool())?;
    registry.register(discovery::list_tools_available_tool())?;
    Ok(())
}
