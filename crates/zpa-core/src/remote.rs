// ── Remote seam ──
//
// Everything zpa-core needs from the management API, as a trait so the
// lifecycle and detachment logic can run against an in-memory double.
// `ZpaClient` is the production implementation.

use std::future::Future;

use zpa_api::ZpaClient;
use zpa_api::models::{
    AppSegmentInspection, ApplicationSegment, BrowserAccess, PolicyRule, PolicySet, SegmentGroup,
    ShareRequest,
};

type ApiResult<T> = Result<T, zpa_api::Error>;

/// Access to the ZPA management API.
///
/// Handles are cheap to clone. [`scoped`](Self::scoped) returns a handle
/// whose calls all target one microtenant.
pub trait Remote: Clone + Send + Sync + 'static {
    /// A handle scoped to `microtenant_id` (`None` or blank: unscoped).
    fn scoped(&self, microtenant_id: Option<&str>) -> Self;

    // ── Segment groups ───────────────────────────────────────────────
    fn get_segment_group(&self, id: &str) -> impl Future<Output = ApiResult<SegmentGroup>> + Send;
    fn get_segment_group_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = ApiResult<SegmentGroup>> + Send;
    fn create_segment_group(
        &self,
        group: &SegmentGroup,
    ) -> impl Future<Output = ApiResult<SegmentGroup>> + Send;
    fn update_segment_group(
        &self,
        id: &str,
        group: &SegmentGroup,
    ) -> impl Future<Output = ApiResult<()>> + Send;
    fn delete_segment_group(&self, id: &str) -> impl Future<Output = ApiResult<()>> + Send;

    // ── Application segments (all flavours) ──────────────────────────
    fn get_application_segment(
        &self,
        id: &str,
    ) -> impl Future<Output = ApiResult<ApplicationSegment>> + Send;
    fn get_application_segment_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = ApiResult<ApplicationSegment>> + Send;
    fn create_application_segment(
        &self,
        segment: &ApplicationSegment,
    ) -> impl Future<Output = ApiResult<ApplicationSegment>> + Send;
    fn update_application_segment(
        &self,
        id: &str,
        segment: &ApplicationSegment,
    ) -> impl Future<Output = ApiResult<()>> + Send;
    fn share_application_segment(
        &self,
        id: &str,
        request: &ShareRequest,
    ) -> impl Future<Output = ApiResult<()>> + Send;
    fn delete_application_segment(&self, id: &str) -> impl Future<Output = ApiResult<()>> + Send;

    fn get_browser_access(&self, id: &str) -> impl Future<Output = ApiResult<BrowserAccess>> + Send;
    fn get_browser_access_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = ApiResult<BrowserAccess>> + Send;
    fn create_browser_access(
        &self,
        app: &BrowserAccess,
    ) -> impl Future<Output = ApiResult<BrowserAccess>> + Send;
    fn update_browser_access(
        &self,
        id: &str,
        app: &BrowserAccess,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    fn get_inspection_segment(
        &self,
        id: &str,
    ) -> impl Future<Output = ApiResult<AppSegmentInspection>> + Send;
    fn get_inspection_segment_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = ApiResult<AppSegmentInspection>> + Send;
    fn create_inspection_segment(
        &self,
        segment: &AppSegmentInspection,
    ) -> impl Future<Output = ApiResult<AppSegmentInspection>> + Send;
    fn update_inspection_segment(
        &self,
        id: &str,
        segment: &AppSegmentInspection,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    // ── Policy ───────────────────────────────────────────────────────
    fn get_policy_set(&self, policy_type: &str)
    -> impl Future<Output = ApiResult<PolicySet>> + Send;
    fn list_policy_rules(
        &self,
        policy_type: &str,
    ) -> impl Future<Output = ApiResult<Vec<PolicyRule>>> + Send;
    fn update_policy_rule(
        &self,
        policy_set_id: &str,
        rule_id: &str,
        rule: &PolicyRule,
    ) -> impl Future<Output = ApiResult<()>> + Send;
}

// The inherent async methods already have the right shape; these only
// forward. Inherent methods take precedence over trait methods, so
// `ZpaClient::get_segment_group(self, ..)` below is not recursive.
impl Remote for ZpaClient {
    fn scoped(&self, microtenant_id: Option<&str>) -> Self {
        ZpaClient::scoped(self, microtenant_id)
    }

    async fn get_segment_group(&self, id: &str) -> ApiResult<SegmentGroup> {
        ZpaClient::get_segment_group(self, id).await
    }

    async fn get_segment_group_by_name(&self, name: &str) -> ApiResult<SegmentGroup> {
        ZpaClient::get_segment_group_by_name(self, name).await
    }

    async fn create_segment_group(&self, group: &SegmentGroup) -> ApiResult<SegmentGroup> {
        ZpaClient::create_segment_group(self, group).await
    }

    async fn update_segment_group(&self, id: &str, group: &SegmentGroup) -> ApiResult<()> {
        ZpaClient::update_segment_group(self, id, group).await
    }

    async fn delete_segment_group(&self, id: &str) -> ApiResult<()> {
        ZpaClient::delete_segment_group(self, id).await
    }

    async fn get_application_segment(&self, id: &str) -> ApiResult<ApplicationSegment> {
        ZpaClient::get_application_segment(self, id).await
    }

    async fn get_application_segment_by_name(&self, name: &str) -> ApiResult<ApplicationSegment> {
        ZpaClient::get_application_segment_by_name(self, name).await
    }

    async fn create_application_segment(
        &self,
        segment: &ApplicationSegment,
    ) -> ApiResult<ApplicationSegment> {
        ZpaClient::create_application_segment(self, segment).await
    }

    async fn update_application_segment(
        &self,
        id: &str,
        segment: &ApplicationSegment,
    ) -> ApiResult<()> {
        ZpaClient::update_application_segment(self, id, segment).await
    }

    async fn share_application_segment(&self, id: &str, request: &ShareRequest) -> ApiResult<()> {
        ZpaClient::share_application_segment(self, id, request).await
    }

    async fn delete_application_segment(&self, id: &str) -> ApiResult<()> {
        ZpaClient::delete_application_segment(self, id).await
    }

    async fn get_browser_access(&self, id: &str) -> ApiResult<BrowserAccess> {
        ZpaClient::get_browser_access(self, id).await
    }

    async fn get_browser_access_by_name(&self, name: &str) -> ApiResult<BrowserAccess> {
        ZpaClient::get_browser_access_by_name(self, name).await
    }

    async fn create_browser_access(&self, app: &BrowserAccess) -> ApiResult<BrowserAccess> {
        ZpaClient::create_browser_access(self, app).await
    }

    async fn update_browser_access(&self, id: &str, app: &BrowserAccess) -> ApiResult<()> {
        ZpaClient::update_browser_access(self, id, app).await
    }

    async fn get_inspection_segment(&self, id: &str) -> ApiResult<AppSegmentInspection> {
        ZpaClient::get_inspection_segment(self, id).await
    }

    async fn get_inspection_segment_by_name(&self, name: &str) -> ApiResult<AppSegmentInspection> {
        ZpaClient::get_inspection_segment_by_name(self, name).await
    }

    async fn create_inspection_segment(
        &self,
        segment: &AppSegmentInspection,
    ) -> ApiResult<AppSegmentInspection> {
        ZpaClient::create_inspection_segment(self, segment).await
    }

    async fn update_inspection_segment(
        &self,
        id: &str,
        segment: &AppSegmentInspection,
    ) -> ApiResult<()> {
        ZpaClient::update_inspection_segment(self, id, segment).await
    }

    async fn get_policy_set(&self, policy_type: &str) -> ApiResult<PolicySet> {
        ZpaClient::get_policy_set(self, policy_type).await
    }

    async fn list_policy_rules(&self, policy_type: &str) -> ApiResult<Vec<PolicyRule>> {
        ZpaClient::list_policy_rules(self, policy_type).await
    }

    async fn update_policy_rule(
        &self,
        policy_set_id: &str,
        rule_id: &str,
        rule: &PolicyRule,
    ) -> ApiResult<()> {
        ZpaClient::update_policy_rule(self, policy_set_id, rule_id, rule).await
    }
}
