//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories and external systems.

pub mod context;
pub mod dispatcher;
pub mod environment;
pub mod orchestrator;
pub mod push;
pub mod reset;
pub mod supplements;
pub mod tracking;
pub mod triggers;
pub mod water;

pub use context::RunContext;
pub use dispatcher::Dispatcher;
pub use environment::{EnvironmentProvider, FallbackEnvironment, OpenMeteoClient};
pub use orchestrator::{DailyResetFailure, Orchestrator};
pub use push::{DisabledPush, FcmClient, PushDelivery, PushError, PushMessage};
pub use reset::ResetService;
pub use supplements::SupplementService;
pub use tracking::TrackingService;
pub use triggers::TriggerService;
pub use water::WaterService;
