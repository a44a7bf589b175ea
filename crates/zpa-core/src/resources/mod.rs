// ── Resource definitions ──
//
// Each resource pairs its pure mapping (`Mapper`) with the remote calls
// and hooks the lifecycle drives. The lifecycle itself is written once,
// generically, in `crate::lifecycle`.

pub mod application_segment;
pub mod browser_access;
pub mod common;
pub mod inspection;
pub mod segment_group;

use std::future::Future;

use crate::diag::Diagnostics;
use crate::mapper::Mapper;
use crate::remote::Remote;

pub use application_segment::{ApplicationSegmentResource, ApplicationSegmentSpec};
pub use browser_access::{BrowserAccessResource, BrowserAccessSpec, ClientlessAppSpec};
pub use common::{IdSet, PortRange, SegmentSpec};
pub use inspection::{AppsConfigSpec, CommonAppsSpec, InspectionAppState, InspectionResource, InspectionSpec};
pub use segment_group::{SegmentGroupResource, SegmentGroupSpec};

type ApiResult<T> = Result<T, zpa_api::Error>;

/// A mapper plus the remote calls that persist it.
///
/// Every call receives a handle already scoped to the record's microtenant.
pub trait Resource: Mapper {
    /// The remote id a declared record refers to, if known.
    fn declared_id(declared: &Self::Declared) -> Option<&str>;

    /// The microtenant a declared record belongs to, if any.
    fn microtenant(declared: &Self::Declared) -> Option<&str>;

    fn remote_id(remote: &Self::Remote) -> &str;

    fn fetch<R: Remote>(
        remote: &R,
        id: &str,
    ) -> impl Future<Output = ApiResult<Self::Remote>> + Send;

    fn fetch_by_name<R: Remote>(
        remote: &R,
        name: &str,
    ) -> impl Future<Output = ApiResult<Self::Remote>> + Send;

    fn create<R: Remote>(
        remote: &R,
        body: &Self::Remote,
    ) -> impl Future<Output = ApiResult<Self::Remote>> + Send;

    fn update<R: Remote>(
        remote: &R,
        id: &str,
        body: &Self::Remote,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    fn delete<R: Remote>(remote: &R, id: &str) -> impl Future<Output = ApiResult<()>> + Send;

    /// Runs after a successful create or update.
    fn after_write<R: Remote>(
        remote: &R,
        id: &str,
        declared: &Self::Declared,
    ) -> impl Future<Output = Diagnostics> + Send {
        let _ = (remote, id, declared);
        async { Diagnostics::new() }
    }

    /// Runs before delete. Any error diagnostic cancels the delete.
    fn before_delete<R: Remote>(
        remote: &R,
        id: &str,
        state: &Self::Declared,
    ) -> impl Future<Output = Diagnostics> + Send {
        let _ = (remote, id, state);
        async { Diagnostics::new() }
    }
}
