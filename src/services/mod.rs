pub mod catalog;
pub mod connections;
pub mod integrations;
pub mod onboarding;
pub mod session;
pub mod telemetry;
pub mod viewer;
