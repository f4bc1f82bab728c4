//! Component roles for descriptor self-description.

use crate::proto::{ComponentDescriptor, Target};

/// The role a component plays in the fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentRole {
    Aggregate,
    Saga,
    ProcessManager,
    Projector,
    Upcaster,
}

impl ComponentRole {
    /// Wire string used in descriptors.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentRole::Aggregate => "aggregate",
            ComponentRole::Saga => "saga",
            ComponentRole::ProcessManager => "process_manager",
            ComponentRole::Projector => "projector",
            ComponentRole::Upcaster => "upcaster",
        }
    }
}

impl std::fmt::Display for ComponentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assemble a descriptor from a component's derived subscriptions.
pub fn descriptor(
    name: impl Into<String>,
    role: ComponentRole,
    inputs: Vec<(String, Vec<String>)>,
) -> ComponentDescriptor {
    ComponentDescriptor {
        name: name.into(),
        role: role.as_str().to_string(),
        inputs: inputs
            .into_iter()
            .map(|(domain, types)| Target { domain, types })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_render_wire_strings() {
        assert_eq!(ComponentRole::Aggregate.as_str(), "aggregate");
        assert_eq!(ComponentRole::ProcessManager.as_str(), "process_manager");
        assert_eq!(ComponentRole::Upcaster.to_string(), "upcaster");
    }

    #[test]
    fn descriptor_preserves_input_order() {
        let desc = descriptor(
            "pm-flow",
            ComponentRole::ProcessManager,
            vec![
                ("order".to_string(), vec!["OrderCreated".to_string()]),
                ("inventory".to_string(), vec!["StockReserved".to_string()]),
            ],
        );
        assert_eq!(desc.role, "process_manager");
        assert_eq!(desc.inputs.len(), 2);
        assert_eq!(desc.inputs[0].domain, "order");
        assert_eq!(desc.inputs[1].domain, "inventory");
    }
}
