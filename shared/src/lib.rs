//! Wellness Tracker Shared Library
//!
//! Document models, scheduling algorithms and trigger evaluation used by the
//! backend jobs. Everything here is pure: instants are passed in, nothing
//! touches the store or the network.

pub mod environment;
pub mod errors;
pub mod health_metrics;
pub mod interval;
pub mod messages;
pub mod models;
pub mod reset;
pub mod supplement_schedule;
pub mod time;
pub mod triggers;
pub mod types;
pub mod validation;
pub mod water_schedule;
pub mod window;

// Re-export commonly used items
pub use environment::{EnvironmentalForecast, EnvironmentalSignal};
pub use errors::*;
pub use health_metrics::{ActivityLevel, HealthProfile, UserProfile};
pub use messages::NotificationContent;
pub use models::*;
pub use reset::{plan_reset, ResetPlan};
pub use supplement_schedule::{PlanReason, SupplementPlan, SupplementReminderScheduler};
pub use time::{Clock, ClockTime, ManualClock, SchedulerSettings, SystemClock, TimeContext};
pub use triggers::{DueNotification, SupplementDue, TriggerCategory, TriggerEvaluator};
pub use types::*;
pub use water_schedule::{WaterPlan, WaterPlanInput, WaterReminderScheduler};
pub use window::{NotificationWindow, ResolvedWindow};
