// In-memory `Remote` double shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use zpa_api::error::RESOURCE_NOT_FOUND_CODE;
use zpa_api::models::{
    AppRef, AppSegmentInspection, ApplicationSegment, BrowserAccess, PolicyRule, PolicySet,
    SegmentGroup, ShareRequest,
};
use zpa_core::Remote;

type ApiResult<T> = Result<T, zpa_api::Error>;

pub fn not_found(what: &str) -> zpa_api::Error {
    zpa_api::Error::Api {
        message: format!("{what} does not exist"),
        code: Some(RESOURCE_NOT_FOUND_CODE.into()),
        status: 404,
    }
}

pub fn server_error(what: &str) -> zpa_api::Error {
    zpa_api::Error::Api {
        message: format!("{what} failed"),
        code: None,
        status: 500,
    }
}

#[derive(Debug, Default)]
pub struct State {
    next_id: u64,
    pub groups: BTreeMap<String, SegmentGroup>,
    pub segments: BTreeMap<String, ApplicationSegment>,
    pub browser: BTreeMap<String, BrowserAccess>,
    pub inspection: BTreeMap<String, AppSegmentInspection>,
    /// Policy sets by policy type, rules included.
    pub policies: BTreeMap<String, PolicySet>,
    pub shares: Vec<ShareRequest>,
    /// Every call, as `"<verb> <what> <id>@<microtenant>"`.
    pub calls: Vec<String>,

    pub unreadable_policies: HashSet<String>,
    pub failing_rule_updates: HashSet<String>,
    pub fail_share: bool,
    pub fail_group_update: bool,
}

impl State {
    fn allocate(&mut self) -> String {
        self.next_id += 1;
        (1000 + self.next_id).to_string()
    }

    /// Number of calls whose description starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn add_rule(&mut self, policy_type: &str, rule: PolicyRule) {
        self.policies
            .entry(policy_type.to_owned())
            .or_insert_with(|| PolicySet {
                id: format!("set-{}", policy_type.to_lowercase()),
                policy_type: policy_type.to_owned(),
                ..Default::default()
            })
            .rules
            .push(rule);
    }

    pub fn rule(&self, policy_type: &str, rule_id: &str) -> Option<&PolicyRule> {
        self.policies
            .get(policy_type)?
            .rules
            .iter()
            .find(|r| r.id == rule_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeRemote {
    state: Arc<Mutex<State>>,
    microtenant: Option<String>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: String) -> MutexGuard<'_, State> {
        let mut state = self.state();
        let scope = self.microtenant.as_deref().unwrap_or("-");
        state.calls.push(format!("{call}@{scope}"));
        state
    }
}

fn by_name<'a, T>(
    items: impl IntoIterator<Item = &'a T>,
    name: &str,
    name_of: impl Fn(&T) -> &str,
) -> Option<T>
where
    T: Clone + 'a,
{
    items
        .into_iter()
        .find(|item| name_of(item).eq_ignore_ascii_case(name))
        .cloned()
}

impl Remote for FakeRemote {
    fn scoped(&self, microtenant_id: Option<&str>) -> Self {
        Self {
            state: Arc::clone(&self.state),
            microtenant: microtenant_id
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from),
        }
    }

    // ── Segment groups ───────────────────────────────────────────────

    async fn get_segment_group(&self, id: &str) -> ApiResult<SegmentGroup> {
        let state = self.record(format!("get segment_group {id}"));
        state.groups.get(id).cloned().ok_or_else(|| not_found(id))
    }

    async fn get_segment_group_by_name(&self, name: &str) -> ApiResult<SegmentGroup> {
        let state = self.record(format!("find segment_group {name}"));
        by_name(state.groups.values(), name, |g| g.name.as_str()).ok_or_else(|| not_found(name))
    }

    async fn create_segment_group(&self, group: &SegmentGroup) -> ApiResult<SegmentGroup> {
        let mut state = self.record("create segment_group".into());
        let mut created = group.clone();
        created.id = state.allocate();
        state.groups.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn update_segment_group(&self, id: &str, group: &SegmentGroup) -> ApiResult<()> {
        let mut state = self.record(format!("update segment_group {id}"));
        if state.fail_group_update {
            return Err(server_error("segment group update"));
        }
        let slot = state.groups.get_mut(id).ok_or_else(|| not_found(id))?;
        *slot = group.clone();
        slot.id = id.to_owned();
        Ok(())
    }

    async fn delete_segment_group(&self, id: &str) -> ApiResult<()> {
        let mut state = self.record(format!("delete segment_group {id}"));
        state.groups.remove(id).map(|_| ()).ok_or_else(|| not_found(id))
    }

    // ── Application segments ─────────────────────────────────────────

    async fn get_application_segment(&self, id: &str) -> ApiResult<ApplicationSegment> {
        let state = self.record(format!("get application_segment {id}"));
        state.segments.get(id).cloned().ok_or_else(|| not_found(id))
    }

    async fn get_application_segment_by_name(&self, name: &str) -> ApiResult<ApplicationSegment> {
        let state = self.record(format!("find application_segment {name}"));
        by_name(state.segments.values(), name, |s| s.base.name.as_str()).ok_or_else(|| not_found(name))
    }

    async fn create_application_segment(
        &self,
        segment: &ApplicationSegment,
    ) -> ApiResult<ApplicationSegment> {
        let mut state = self.record("create application_segment".into());
        let mut created = segment.clone();
        created.base.id = state.allocate();
        let group_id = created.base.segment_group_id.clone();
        if let Some(group) = state.groups.get_mut(&group_id) {
            group.applications.push(AppRef {
                id: created.base.id.clone(),
                name: created.base.name.clone(),
            });
        }
        state.segments.insert(created.base.id.clone(), created.clone());
        Ok(created)
    }

    async fn update_application_segment(
        &self,
        id: &str,
        segment: &ApplicationSegment,
    ) -> ApiResult<()> {
        let mut state = self.record(format!("update application_segment {id}"));
        let slot = state.segments.get_mut(id).ok_or_else(|| not_found(id))?;
        let shared = slot.shared_microtenant_details.clone();
        *slot = segment.clone();
        slot.base.id = id.to_owned();
        slot.shared_microtenant_details = shared;
        Ok(())
    }

    async fn share_application_segment(&self, id: &str, request: &ShareRequest) -> ApiResult<()> {
        let mut state = self.record(format!("share application_segment {id}"));
        if state.fail_share {
            return Err(server_error("share"));
        }
        state.shares.push(request.clone());
        if let Some(segment) = state.segments.get_mut(id) {
            segment.shared_microtenant_details.shared_to_microtenants = request
                .share_to_microtenants
                .iter()
                .map(|m| zpa_api::models::MicrotenantRef {
                    id: m.clone(),
                    name: String::new(),
                })
                .collect();
        }
        Ok(())
    }

    async fn delete_application_segment(&self, id: &str) -> ApiResult<()> {
        let mut state = self.record(format!("delete application_segment {id}"));
        let removed = state.segments.remove(id).is_some()
            | state.browser.remove(id).is_some()
            | state.inspection.remove(id).is_some();
        if removed { Ok(()) } else { Err(not_found(id)) }
    }

    async fn get_browser_access(&self, id: &str) -> ApiResult<BrowserAccess> {
        let state = self.record(format!("get browser_access {id}"));
        state.browser.get(id).cloned().ok_or_else(|| not_found(id))
    }

    async fn get_browser_access_by_name(&self, name: &str) -> ApiResult<BrowserAccess> {
        let state = self.record(format!("find browser_access {name}"));
        by_name(state.browser.values(), name, |s| s.base.name.as_str()).ok_or_else(|| not_found(name))
    }

    async fn create_browser_access(&self, app: &BrowserAccess) -> ApiResult<BrowserAccess> {
        let mut state = self.record("create browser_access".into());
        let mut created = app.clone();
        created.base.id = state.allocate();
        for clientless in &mut created.clientless_apps {
            if clientless.id.is_empty() {
                clientless.id = state.allocate();
            }
            clientless.app_id.clone_from(&created.base.id);
        }
        state.browser.insert(created.base.id.clone(), created.clone());
        Ok(created)
    }

    async fn update_browser_access(&self, id: &str, app: &BrowserAccess) -> ApiResult<()> {
        let mut state = self.record(format!("update browser_access {id}"));
        if !state.browser.contains_key(id) {
            return Err(not_found(id));
        }
        let mut updated = app.clone();
        updated.base.id = id.to_owned();
        for clientless in &mut updated.clientless_apps {
            if clientless.id.is_empty() {
                clientless.id = state.allocate();
            }
            clientless.app_id = id.to_owned();
        }
        state.browser.insert(id.to_owned(), updated);
        Ok(())
    }

    async fn get_inspection_segment(&self, id: &str) -> ApiResult<AppSegmentInspection> {
        let state = self.record(format!("get inspection {id}"));
        state.inspection.get(id).cloned().ok_or_else(|| not_found(id))
    }

    async fn get_inspection_segment_by_name(&self, name: &str) -> ApiResult<AppSegmentInspection> {
        let state = self.record(format!("find inspection {name}"));
        by_name(state.inspection.values(), name, |s| s.base.name.as_str()).ok_or_else(|| not_found(name))
    }

    async fn create_inspection_segment(
        &self,
        segment: &AppSegmentInspection,
    ) -> ApiResult<AppSegmentInspection> {
        let mut state = self.record("create inspection".into());
        let mut created = segment.clone();
        created.base.id = state.allocate();
        let mut inspection_apps = Vec::new();
        for config in &created.common_apps_dto.apps_config {
            inspection_apps.push(zpa_api::models::InspectionApp {
                id: state.allocate(),
                app_id: created.base.id.clone(),
                name: config.name.clone(),
                description: config.description.clone(),
                domain: config.domain.clone(),
                application_port: config.application_port.clone(),
                application_protocol: config.application_protocol.clone(),
                certificate_id: config.certificate_id.clone(),
                enabled: config.enabled,
                ..Default::default()
            });
        }
        created.inspection_apps = inspection_apps;
        // The API does not echo the request shape.
        created.common_apps_dto = zpa_api::models::CommonAppsDto::default();
        let group_id = created.base.segment_group_id.clone();
        if let Some(group) = state.groups.get_mut(&group_id) {
            group.applications.push(AppRef {
                id: created.base.id.clone(),
                name: created.base.name.clone(),
            });
        }
        state.inspection.insert(created.base.id.clone(), created.clone());
        Ok(created)
    }

    async fn update_inspection_segment(
        &self,
        id: &str,
        segment: &AppSegmentInspection,
    ) -> ApiResult<()> {
        let mut state = self.record(format!("update inspection {id}"));
        let slot = state.inspection.get_mut(id).ok_or_else(|| not_found(id))?;
        let apps = std::mem::take(&mut slot.inspection_apps);
        *slot = segment.clone();
        slot.base.id = id.to_owned();
        slot.common_apps_dto = zpa_api::models::CommonAppsDto::default();
        let deleted = &segment.common_apps_dto.deleted_inspect_apps;
        slot.inspection_apps = apps.into_iter().filter(|a| !deleted.contains(&a.id)).collect();
        Ok(())
    }

    // ── Policy ───────────────────────────────────────────────────────

    async fn get_policy_set(&self, policy_type: &str) -> ApiResult<PolicySet> {
        let state = self.record(format!("get policy_set {policy_type}"));
        if state.unreadable_policies.contains(policy_type) {
            return Err(server_error(policy_type));
        }
        Ok(state.policies.get(policy_type).cloned().unwrap_or_else(|| PolicySet {
            id: format!("set-{}", policy_type.to_lowercase()),
            policy_type: policy_type.to_owned(),
            ..Default::default()
        }))
    }

    async fn list_policy_rules(&self, policy_type: &str) -> ApiResult<Vec<PolicyRule>> {
        let state = self.record(format!("list policy_rules {policy_type}"));
        Ok(state
            .policies
            .get(policy_type)
            .map(|set| set.rules.clone())
            .unwrap_or_default())
    }

    async fn update_policy_rule(
        &self,
        policy_set_id: &str,
        rule_id: &str,
        rule: &PolicyRule,
    ) -> ApiResult<()> {
        let mut state = self.record(format!("update policy_rule {rule_id}"));
        if state.failing_rule_updates.contains(rule_id) {
            return Err(server_error(rule_id));
        }
        let set = state
            .policies
            .values_mut()
            .find(|set| set.id == policy_set_id)
            .ok_or_else(|| not_found(policy_set_id))?;
        let slot = set
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| not_found(rule_id))?;
        *slot = rule.clone();
        Ok(())
    }
}
