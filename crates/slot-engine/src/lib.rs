//! # slot-engine
//!
//! Specialist availability aggregation for Calendly rosters.
//!
//! Fetches start-time options for many specialists concurrently, drops the
//! ones that violate notice and working-day rules, and reduces the rest to
//! the number of non-overlapping appointments that can actually be booked,
//! per specialist, language and day.
//!
//! ## Modules
//!
//! - [`roster`]: Validated specialist roster
//! - [`client`]: Calendly HTTP client and the [`AvailabilitySource`] seam
//! - [`records`]: Upstream record types and wire formatting
//! - [`fetcher`]: Span splitting, fail-open windows, TTL memoization
//! - [`collector`]: Bounded concurrent fan-out across specialists
//! - [`notice`]: Notice cutoff, working days, horizon, cycle window
//! - [`reducer`]: Greedy packing of fixed-length appointments
//! - [`aggregate`]: Per-specialist and per-language day tables
//! - [`service`]: Language, admin and aggregate views for one cycle
//! - [`booked`]: Booked appointment counts per specialist
//! - [`settings`]: Business-rule settings
//! - [`error`]: Error types

pub mod aggregate;
pub mod booked;
pub mod client;
pub mod collector;
pub mod error;
pub mod fetcher;
pub mod notice;
pub mod records;
pub mod reducer;
pub mod roster;
pub mod service;
pub mod settings;

pub use client::{AvailabilitySource, CalendlyClient, Credential, EventOwner, DEFAULT_BASE_URL};
pub use collector::{Collector, TaggedSlot};
pub use error::SlotError;
pub use fetcher::{AvailabilityFetcher, FetchOutcome};
pub use notice::{admissible, is_working_day, local_date, Cycle, FetchWindow};
pub use reducer::count_bookable_slots;
pub use roster::{Roster, Specialist};
pub use service::AvailabilityService;
pub use settings::Settings;
