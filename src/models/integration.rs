use serde::{Deserialize, Serialize};

/// Provider that every user has without an explicit connect step.
pub const ZERO_CONFIG_PROVIDER: &str = "daily_video";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Conferencing,
    Payment,
    Calendar,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Conferencing, Category::Payment, Category::Calendar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Conferencing => "conferencing",
            Category::Payment => "payment",
            Category::Calendar => "calendar",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationDescriptor {
    pub title: String,
    #[serde(rename = "type")]
    pub provider_type: String,
    pub description: String,
    pub image_src: String,
    pub credential_ids: Vec<i64>,
    pub installed: bool,
}

/// Resolved once per descriptor; the variants are mutually exclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", content = "credentialIds", rename_all = "snake_case")]
pub enum ConnectionState {
    Connected(Vec<i64>),
    NotInstalled,
    ZeroConfigInstalled,
    Connectable,
}

/// What the single action slot next to a descriptor offers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PrimaryAction {
    Disconnect { credential_id: i64 },
    NotInstalledWarning,
    InstalledLabel,
    Connect { provider_type: String },
}

impl IntegrationDescriptor {
    pub fn connection_state(&self) -> ConnectionState {
        if !self.credential_ids.is_empty() {
            ConnectionState::Connected(self.credential_ids.clone())
        } else if !self.installed {
            ConnectionState::NotInstalled
        } else if self.provider_type == ZERO_CONFIG_PROVIDER {
            ConnectionState::ZeroConfigInstalled
        } else {
            ConnectionState::Connectable
        }
    }

    pub fn is_active(&self) -> bool {
        !self.credential_ids.is_empty()
    }

    pub fn primary_action(&self) -> PrimaryAction {
        match self.connection_state() {
            // Only the first credential is reachable from the primary action.
            ConnectionState::Connected(ids) => PrimaryAction::Disconnect {
                credential_id: ids[0],
            },
            ConnectionState::NotInstalled => PrimaryAction::NotInstalledWarning,
            ConnectionState::ZeroConfigInstalled => PrimaryAction::InstalledLabel,
            ConnectionState::Connectable => PrimaryAction::Connect {
                provider_type: self.provider_type.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationCategory {
    pub items: Vec<IntegrationDescriptor>,
    pub num_active: usize,
}

impl IntegrationCategory {
    pub fn from_items(items: Vec<IntegrationDescriptor>) -> Self {
        let num_active = items.iter().filter(|i| i.is_active()).count();
        Self { items, num_active }
    }
}

/// The `viewer.integrations` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Integrations {
    pub conferencing: IntegrationCategory,
    pub payment: IntegrationCategory,
    pub calendar: IntegrationCategory,
}

impl Integrations {
    pub fn category(&self, category: Category) -> &IntegrationCategory {
        match category {
            Category::Conferencing => &self.conferencing,
            Category::Payment => &self.payment,
            Category::Calendar => &self.calendar,
        }
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &IntegrationDescriptor> {
        Category::ALL
            .into_iter()
            .flat_map(move |c| self.category(c).items.iter())
    }

    pub fn descriptor(&self, provider_type: &str) -> Option<&IntegrationDescriptor> {
        self.descriptors().find(|d| d.provider_type == provider_type)
    }

    pub fn descriptor_for_credential(&self, credential_id: i64) -> Option<&IntegrationDescriptor> {
        self.descriptors()
            .find(|d| d.credential_ids.contains(&credential_id))
    }
}
