pub mod credential;
pub mod integration;
pub mod user;

pub use credential::{ConnectState, Credential};
pub use integration::{
    Category, ConnectionState, IntegrationCategory, IntegrationDescriptor, Integrations,
    PrimaryAction, ZERO_CONFIG_PROVIDER,
};
pub use user::{AvailabilityRule, NewUser, SelectedCalendar, User, ViewerRecord};
