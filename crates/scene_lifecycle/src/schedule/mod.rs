//! Generic lifecycle scheduling
//!
//! Both the world's entity collection and every entity's component
//! collection are a [`Scheduler`]; they differ only in member type and
//! membership hooks.

pub mod error;
pub mod member;
mod queue;
pub mod scheduler;
mod view;

pub use error::SchedulerError;
pub use member::{AsAnyRc, Capabilities, Member, RenderState, Renderable, Schedulable, ScheduleState};
pub use scheduler::{FlushSummary, MembershipHooks, NoHooks, Scheduler, TraversalStats};
