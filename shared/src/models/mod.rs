//! Domain Models
//!
//! Entity structs map 1:1 to database rows (`sqlx::FromRow` behind the `db`
//! feature); `*Create` / `*Update` structs are the API payloads.

pub mod announcement;
pub mod auth;
pub mod bill;
pub mod billing_cycle;
pub mod contract;
pub mod meter;
pub mod room;
pub mod tenant;
pub mod utility;

pub use announcement::{Announcement, AnnouncementCreate, AnnouncementUpdate};
pub use auth::{LoginRequest, LoginResponse, Role};
pub use bill::{Bill, BillDetail, BillStatus, BillStatusUpdate, BillingRunSummary, UtilityLine};
pub use billing_cycle::{BillingCycle, BillingCycleResolve, CycleStatus};
pub use contract::{Contract, ContractCreate, ContractStatus, ContractWithNames};
pub use meter::{MeterPhoto, MeterPhotoUpdate, MeterReading, ReadingOutcome};
pub use room::{Room, RoomCreate, RoomUpdate, RoomWithOccupancy};
pub use tenant::{Tenant, TenantCreate, TenantUpdate};
pub use utility::{UtilityKind, UtilityRate, UtilityRateCreate, UtilityType};
