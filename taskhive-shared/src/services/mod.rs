/// Domain services
///
/// Each service owns a clone of the `PgPool` handed to it at construction
/// and opens a connection or transaction per operation.
///
/// - `membership`: group lifecycle, invitations, leave/promotion, the gate
/// - `tasks`: task CRUD gated by group membership
/// - `licenses`: single-use license redemption and issuance
/// - `accounts`: signup

pub mod accounts;
pub mod licenses;
pub mod membership;
pub mod tasks;

pub use accounts::AccountService;
pub use licenses::{LicenseError, LicenseLedger};
pub use membership::{LeaveOutcome, MembershipEngine};
pub use tasks::TaskStore;
