use crate::nova::models::Server;

/// Labels identifying the instance a diagnostic sample came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceIdentity {
    pub id: String,
    pub status: String,
    pub name: String,
    pub tenant_id: String,
    pub hypervisor: String,
}

impl InstanceIdentity {
    pub const LABELS: [&'static str; 5] = ["id", "status", "name", "tenant_id", "hypervisor"];

    pub fn label_values(&self) -> [&str; 5] {
        [
            self.id.as_str(),
            self.status.as_str(),
            self.name.as_str(),
            self.tenant_id.as_str(),
            self.hypervisor.as_str(),
        ]
    }
}

impl From<&Server> for InstanceIdentity {
    fn from(server: &Server) -> Self {
        Self {
            id: server.id.clone(),
            status: server.status.clone(),
            name: server.name.clone(),
            tenant_id: server.tenant_id.clone(),
            hypervisor: server.hypervisor_hostname.clone().unwrap_or_default(),
        }
    }
}
