// zpa-core: State reconciliation between declared ZPA resources and the
// management API (expand/flatten mapping, diagnostics, lifecycle).

pub mod config;
pub mod detach;
pub mod diag;
pub mod error;
pub mod field;
pub mod lifecycle;
pub mod mapper;
pub mod provider;
pub mod reconcile;
pub mod remote;
pub mod resources;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ProviderConfig;
pub use detach::{
    DetachReport, DetachTarget, PolicyType, detach_from_policy_rules, detach_from_segment_group,
};
pub use diag::{Diagnostic, DiagnosticKind, Diagnostics, Operation, Severity};
pub use error::CoreError;
pub use field::Field;
pub use lifecycle::{Outcome, Reconciled, ResourceService};
pub use mapper::{Mapper, Phase, ResourceKind};
pub use provider::Provider;
pub use reconcile::{Identified, reconcile_identities};
pub use remote::Remote;

// Declared resource shapes at the crate root for ergonomics.
pub use resources::{
    // Segment groups
    SegmentGroupResource, SegmentGroupSpec,
    // Application segments
    ApplicationSegmentResource, ApplicationSegmentSpec, IdSet, PortRange, SegmentSpec,
    // Browser access
    BrowserAccessResource, BrowserAccessSpec, ClientlessAppSpec,
    // Inspection
    AppsConfigSpec, CommonAppsSpec, InspectionAppState, InspectionResource, InspectionSpec,
    // Lifecycle hooks
    Resource,
};
