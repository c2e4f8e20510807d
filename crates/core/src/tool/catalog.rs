use super::{ToolKind, ToolObject};

/// The fixed set of tools offered to the model, one slot per [`ToolKind`].
#[derive(Default)]
pub struct Catalog {
    tools: [Option<Box<dyn ToolObject>>; ToolKind::ALL.len()],
}

impl Catalog {
    /// Registers a tool, replacing the one of the same kind if any.
    pub fn insert(&mut self, tool: Box<dyn ToolObject>) {
        let kind = tool.kind();
        if self.tools[kind.index()].replace(tool).is_some() {
            warn!("tool `{kind}` registered twice, keeping the last one");
        }
    }

    /// Resolves a tool name written by the model.
    pub fn resolve(&self, name: &str) -> Option<&dyn ToolObject> {
        let kind = ToolKind::from_name(name)?;
        self.tools[kind.index()].as_deref()
    }

    /// Iterates registered tools in presentation order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn ToolObject> {
        self.tools.iter().filter_map(|tool| tool.as_deref())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.iter().all(Option::is_none)
    }
}
