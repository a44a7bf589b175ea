// Inspection application segment.
//
// The request describes inspected apps in `common_apps_dto.apps_config`;
// the response reports them back as `inspection_apps` with their ids.
// Flatten keeps the planned `common_apps_dto` and copies those ids into it,
// since the API does not echo the request shape reliably.

use serde::{Deserialize, Serialize};
use tracing::debug;

use zpa_api::models::{AppSegmentInspection, AppsConfig, CommonAppsDto, InspectionApp};

use super::Resource;
use super::common::{
    SegmentSpec, expand_segment, flatten_segment, validate_request, validate_segment,
};
use crate::detach::{DetachTarget, detach_from_policy_rules, detach_from_segment_group};
use crate::diag::Diagnostics;
use crate::field::Field;
use crate::mapper::{Mapper, Phase, ResourceKind};
use crate::reconcile::{Identified, carry_identity, reconcile_identities};
use crate::remote::Remote;

/// One declared inspected app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppsConfigSpec {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub app_id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub inspect_app_id: Field<String>,
    /// Defaults to `domain` when blank.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub app_types: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub application_port: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub application_protocol: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub certificate_id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub domain: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub enabled: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub trust_untrusted_cert: Field<bool>,
}

impl AppsConfigSpec {
    fn effective_name(&self) -> Option<&str> {
        self.name.non_blank().or_else(|| self.domain.non_blank())
    }
}

impl Identified for AppsConfigSpec {
    fn natural_key(&self) -> Option<&str> {
        self.effective_name()
    }

    fn identity(&self) -> Option<&str> {
        self.inspect_app_id.as_value().map(String::as_str)
    }
}

impl Identified for InspectionApp {
    fn natural_key(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn identity(&self) -> Option<&str> {
        Some(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonAppsSpec {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub apps_config: Field<Vec<AppsConfigSpec>>,
}

/// Computed view of an inspected app, as reported by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionAppState {
    pub id: String,
    pub app_id: String,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub application_port: String,
    pub application_protocol: String,
    pub certificate_id: String,
    pub certificate_name: String,
    pub domain: String,
    pub protocols: Vec<String>,
    pub trust_untrusted_cert: bool,
    pub microtenant_id: String,
    pub microtenant_name: String,
}

impl From<&InspectionApp> for InspectionAppState {
    fn from(app: &InspectionApp) -> Self {
        Self {
            id: app.id.clone(),
            app_id: app.app_id.clone(),
            name: app.name.clone(),
            description: app.description.clone(),
            enabled: app.enabled,
            application_port: app.application_port.clone(),
            application_protocol: app.application_protocol.clone(),
            certificate_id: app.certificate_id.clone(),
            certificate_name: app.certificate_name.clone(),
            domain: app.domain.clone(),
            protocols: app.protocols.clone(),
            trust_untrusted_cert: app.trust_untrusted_cert,
            microtenant_id: app.microtenant_id.clone(),
            microtenant_name: app.microtenant_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionSpec {
    #[serde(flatten)]
    pub segment: SegmentSpec,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub adp_enabled: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub auto_app_protect_enabled: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub tcp_protocols: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub udp_protocols: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub common_apps_dto: Field<Vec<CommonAppsSpec>>,
    /// Computed.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub inspection_apps: Field<Vec<InspectionAppState>>,
}

impl InspectionSpec {
    /// Declared apps of the first `common_apps_dto` block.
    fn apps_config(&self) -> &[AppsConfigSpec] {
        self.common_apps_dto
            .items()
            .first()
            .map(|block| block.apps_config.items())
            .unwrap_or_default()
    }
}

pub struct InspectionResource;

// ── Expand ───────────────────────────────────────────────────────────

fn expand_common_apps(
    field: &Field<Vec<CommonAppsSpec>>,
    declared: &[AppsConfigSpec],
    prior: Option<&AppSegmentInspection>,
) -> CommonAppsDto {
    match field {
        Field::Unset => return prior.map(|p| p.common_apps_dto.clone()).unwrap_or_default(),
        Field::Null => return CommonAppsDto::default(),
        Field::Value(_) => {}
    }

    let known = prior
        .map(|p| p.inspection_apps.as_slice())
        .unwrap_or_default();
    let matches = reconcile_identities(declared, known);

    let apps_config = declared
        .iter()
        .zip(&matches)
        .map(|(app, matched)| {
            let p = matched.and_then(|j| known.get(j));
            let text = |value: &Field<String>, fallback: Option<&String>| {
                value.resolve(fallback, String::new).trim().to_owned()
            };

            let domain = text(&app.domain, p.map(|p| &p.domain));
            let name = match text(&app.name, p.map(|p| &p.name)) {
                name if name.is_empty() => domain.clone(),
                name => name,
            };
            AppsConfig {
                app_id: carry_identity(&app.app_id, p.map(|p| &p.app_id)),
                inspect_app_id: carry_identity(&app.inspect_app_id, p.map(|p| &p.id)),
                name,
                description: text(&app.description, p.map(|p| &p.description)),
                app_types: app.app_types.resolve_collection(None),
                application_port: text(&app.application_port, p.map(|p| &p.application_port)),
                application_protocol: text(
                    &app.application_protocol,
                    p.map(|p| &p.application_protocol),
                ),
                certificate_id: text(&app.certificate_id, p.map(|p| &p.certificate_id)),
                domain,
                enabled: app.enabled.resolve(p.map(|p| &p.enabled), || true),
                trust_untrusted_cert: app
                    .trust_untrusted_cert
                    .resolve(p.map(|p| &p.trust_untrusted_cert), || false),
            }
        })
        .collect();

    // Known apps nobody continues are removed server-side.
    let deleted_inspect_apps = known
        .iter()
        .enumerate()
        .filter(|(j, app)| !app.id.is_empty() && !matches.contains(&Some(*j)))
        .map(|(_, app)| app.id.clone())
        .collect();

    CommonAppsDto {
        apps_config,
        deleted_inspect_apps,
    }
}

// ── Flatten ──────────────────────────────────────────────────────────

fn flatten_apps_config(app: &AppsConfig) -> AppsConfigSpec {
    AppsConfigSpec {
        app_id: Field::Value(app.app_id.clone()),
        inspect_app_id: Field::Value(app.inspect_app_id.clone()),
        name: Field::Value(app.name.clone()),
        description: Field::Value(app.description.clone()),
        app_types: Field::Value(app.app_types.clone()),
        application_port: Field::Value(app.application_port.clone()),
        application_protocol: Field::Value(app.application_protocol.clone()),
        certificate_id: Field::Value(app.certificate_id.clone()),
        domain: Field::Value(app.domain.clone()),
        enabled: Field::Value(app.enabled),
        trust_untrusted_cert: Field::Value(app.trust_untrusted_cert),
    }
}

fn apps_config_from_inspection_app(app: &InspectionApp) -> AppsConfigSpec {
    AppsConfigSpec {
        app_id: Field::Value(app.app_id.clone()),
        inspect_app_id: Field::Value(app.id.clone()),
        name: Field::Value(app.name.clone()),
        description: Field::Value(app.description.clone()),
        app_types: Field::empty(),
        application_port: Field::Value(app.application_port.clone()),
        application_protocol: Field::Value(app.application_protocol.clone()),
        certificate_id: Field::Value(app.certificate_id.clone()),
        domain: Field::Value(app.domain.clone()),
        enabled: Field::Value(app.enabled),
        trust_untrusted_cert: Field::Value(app.trust_untrusted_cert),
    }
}

/// Keep the planned blocks, filling in the ids the API assigned.
///
/// Name and description are only taken from the API where the plan left
/// them unset.
fn backfill_common_apps(
    planned: &[CommonAppsSpec],
    inspection_apps: &[InspectionApp],
) -> Vec<CommonAppsSpec> {
    let mut blocks = planned.to_vec();
    let Some(Field::Value(entries)) = blocks.first_mut().map(|b| &mut b.apps_config) else {
        return blocks;
    };

    let matches = reconcile_identities(entries.as_slice(), inspection_apps);
    for (entry, matched) in entries.iter_mut().zip(matches) {
        let Some(app) = matched.and_then(|j| inspection_apps.get(j)) else {
            continue;
        };
        entry.app_id = Field::Value(app.app_id.clone());
        entry.inspect_app_id = Field::Value(app.id.clone());
        if entry.name.is_absent() {
            entry.name = Field::Value(app.name.clone());
        }
        if entry.description.is_absent() {
            entry.description = Field::Value(app.description.clone());
        }
    }
    blocks
}

fn flatten_common_apps(
    remote: &AppSegmentInspection,
    prior: Option<&InspectionSpec>,
) -> Field<Vec<CommonAppsSpec>> {
    if let Some(Field::Value(planned)) = prior.map(|p| &p.common_apps_dto) {
        return Field::Value(backfill_common_apps(planned, &remote.inspection_apps));
    }

    let apps: Vec<AppsConfigSpec> = if remote.common_apps_dto.apps_config.is_empty() {
        remote
            .inspection_apps
            .iter()
            .map(apps_config_from_inspection_app)
            .collect()
    } else {
        remote
            .common_apps_dto
            .apps_config
            .iter()
            .map(flatten_apps_config)
            .collect()
    };
    if apps.is_empty() {
        return Field::empty();
    }
    Field::Value(vec![CommonAppsSpec {
        apps_config: Field::Value(apps),
    }])
}

impl Mapper for InspectionResource {
    type Declared = InspectionSpec;
    type Remote = AppSegmentInspection;

    const KIND: ResourceKind = ResourceKind::InspectionSegment;

    fn validate(declared: &InspectionSpec, phase: Phase) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validate_segment(&declared.segment, phase, &mut diags);

        if declared.adp_enabled.as_value() == Some(&true)
            && declared.auto_app_protect_enabled.as_value() == Some(&true)
        {
            diags.add_validation(
                "If 'adp_enabled' is set to true, 'auto_app_protect_enabled' must be false.",
            );
        }

        let apps = declared.apps_config();
        if phase == Phase::Create && apps.is_empty() {
            diags.add_validation("common_apps_dto.apps_config must contain at least one application");
        }
        for (i, app) in apps.iter().enumerate() {
            let http = app
                .application_protocol
                .non_blank()
                .is_some_and(|p| p.eq_ignore_ascii_case("HTTP"));
            if http && app.certificate_id.non_blank().is_some() {
                diags.add_validation(format!(
                    "common_apps_dto.apps_config[{i}]: certificate_id must not be set when application_protocol is HTTP"
                ));
            }
        }
        diags
    }

    fn expand(
        declared: &InspectionSpec,
        prior: Option<&AppSegmentInspection>,
    ) -> (AppSegmentInspection, Diagnostics) {
        let mut diags = Self::validate(declared, Phase::of(prior));

        let base = expand_segment(&declared.segment, prior.map(|p| &p.base), &mut diags);
        validate_request(&base, &mut diags);

        let segment = AppSegmentInspection {
            base,
            adp_enabled: declared
                .adp_enabled
                .resolve(prior.map(|p| &p.adp_enabled), || false),
            auto_app_protect_enabled: declared
                .auto_app_protect_enabled
                .resolve(prior.map(|p| &p.auto_app_protect_enabled), || false),
            tcp_protocols: declared
                .tcp_protocols
                .resolve_collection(prior.map(|p| p.tcp_protocols.as_slice())),
            udp_protocols: declared
                .udp_protocols
                .resolve_collection(prior.map(|p| p.udp_protocols.as_slice())),
            common_apps_dto: expand_common_apps(
                &declared.common_apps_dto,
                declared.apps_config(),
                prior,
            ),
            inspection_apps: Vec::new(),
        };
        (segment, diags)
    }

    fn flatten(
        remote: &AppSegmentInspection,
        prior: Option<&InspectionSpec>,
    ) -> (InspectionSpec, Diagnostics) {
        let spec = InspectionSpec {
            segment: flatten_segment(&remote.base),
            adp_enabled: Field::Value(remote.adp_enabled),
            auto_app_protect_enabled: Field::Value(remote.auto_app_protect_enabled),
            tcp_protocols: Field::Value(remote.tcp_protocols.clone()),
            udp_protocols: Field::Value(remote.udp_protocols.clone()),
            common_apps_dto: flatten_common_apps(remote, prior),
            inspection_apps: Field::Value(
                remote
                    .inspection_apps
                    .iter()
                    .map(InspectionAppState::from)
                    .collect(),
            ),
        };
        (spec, Diagnostics::new())
    }
}

impl Resource for InspectionResource {
    fn declared_id(declared: &InspectionSpec) -> Option<&str> {
        declared.segment.remote_id()
    }

    fn microtenant(declared: &InspectionSpec) -> Option<&str> {
        declared.segment.microtenant()
    }

    fn remote_id(remote: &AppSegmentInspection) -> &str {
        &remote.base.id
    }

    async fn fetch<R: Remote>(
        remote: &R,
        id: &str,
    ) -> Result<AppSegmentInspection, zpa_api::Error> {
        remote.get_inspection_segment(id).await
    }

    async fn fetch_by_name<R: Remote>(
        remote: &R,
        name: &str,
    ) -> Result<AppSegmentInspection, zpa_api::Error> {
        remote.get_inspection_segment_by_name(name).await
    }

    async fn create<R: Remote>(
        remote: &R,
        body: &AppSegmentInspection,
    ) -> Result<AppSegmentInspection, zpa_api::Error> {
        remote.create_inspection_segment(body).await
    }

    async fn update<R: Remote>(
        remote: &R,
        id: &str,
        body: &AppSegmentInspection,
    ) -> Result<(), zpa_api::Error> {
        remote.update_inspection_segment(id, body).await
    }

    async fn delete<R: Remote>(remote: &R, id: &str) -> Result<(), zpa_api::Error> {
        remote.delete_application_segment(id).await
    }

    /// Leave the segment group first, then strip policy references.
    async fn before_delete<R: Remote>(
        remote: &R,
        id: &str,
        state: &InspectionSpec,
    ) -> Diagnostics {
        let mut diags = Diagnostics::new();

        let group_id = match state.segment.segment_group_id.non_blank() {
            Some(group_id) => Some(group_id.to_owned()),
            None => match remote.get_inspection_segment(id).await {
                Ok(current) => Some(current.base.segment_group_id).filter(|g| !g.is_empty()),
                Err(e) => {
                    debug!(id, error = %e, "cannot resolve segment group before delete");
                    None
                }
            },
        };
        if let Some(group_id) = group_id {
            diags.append(detach_from_segment_group(remote, &group_id, id).await);
            if diags.has_error() {
                return diags;
            }
        }

        let target = DetachTarget::Application(id.to_owned());
        let (_report, detached) = detach_from_policy_rules(remote, &target).await;
        diags.append(detached);
        diags
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use zpa_api::models::SegmentBase;

    use super::*;

    fn plan(apps: serde_json::Value) -> InspectionSpec {
        serde_json::from_value(json!({
            "name": "inspect-crm",
            "segment_group_id": "100",
            "domain_names": ["crm.example.com"],
            "common_apps_dto": [{"apps_config": apps}]
        }))
        .unwrap()
    }

    fn inspection_app(id: &str, app_id: &str, name: &str) -> InspectionApp {
        InspectionApp {
            id: id.into(),
            app_id: app_id.into(),
            name: name.into(),
            description: format!("{name} (from api)"),
            domain: "crm.example.com".into(),
            application_protocol: "HTTPS".into(),
            ..Default::default()
        }
    }

    #[test]
    fn adp_and_auto_protect_are_exclusive() {
        let mut spec = plan(json!([{"domain": "crm.example.com"}]));
        spec.adp_enabled = Field::Value(true);
        spec.auto_app_protect_enabled = Field::Value(true);
        let diags = InspectionResource::validate(&spec, Phase::Create);
        assert_eq!(
            diags.errors().map(|d| d.detail.as_str()).collect::<Vec<_>>(),
            ["If 'adp_enabled' is set to true, 'auto_app_protect_enabled' must be false."]
        );
    }

    #[test]
    fn http_apps_cannot_carry_a_certificate() {
        let spec = plan(json!([
            {"domain": "a.example.com", "application_protocol": "HTTPS", "certificate_id": "c1"},
            {"domain": "b.example.com", "application_protocol": "http", "certificate_id": "c2"}
        ]));
        let diags = InspectionResource::validate(&spec, Phase::Create);
        assert_eq!(
            diags.errors().map(|d| d.detail.as_str()).collect::<Vec<_>>(),
            ["common_apps_dto.apps_config[1]: certificate_id must not be set when application_protocol is HTTP"]
        );
    }

    #[test]
    fn blank_name_defaults_to_domain() {
        let spec = plan(json!([{"domain": "crm.example.com", "name": " "}]));
        let (payload, diags) = InspectionResource::expand(&spec, None);
        assert!(!diags.has_error(), "{diags}");
        assert_eq!(payload.common_apps_dto.apps_config[0].name, "crm.example.com");
        assert!(payload.common_apps_dto.apps_config[0].enabled);
    }

    #[test]
    fn update_carries_inspect_app_ids_and_drops_stale_apps() {
        let prior = AppSegmentInspection {
            base: SegmentBase {
                id: "900".into(),
                ..Default::default()
            },
            inspection_apps: vec![
                inspection_app("ia-1", "app-1", "crm.example.com"),
                inspection_app("ia-2", "app-2", "old.example.com"),
            ],
            ..Default::default()
        };
        let spec = plan(json!([{"domain": "crm.example.com"}]));

        let (payload, diags) = InspectionResource::expand(&spec, Some(&prior));
        assert!(!diags.has_error(), "{diags}");
        let app = &payload.common_apps_dto.apps_config[0];
        assert_eq!(app.inspect_app_id, "ia-1");
        assert_eq!(app.app_id, "app-1");
        assert_eq!(payload.common_apps_dto.deleted_inspect_apps, ["ia-2"]);
        assert!(payload.inspection_apps.is_empty());
    }

    #[test]
    fn blank_declared_ids_keep_the_matched_ids() {
        let prior = AppSegmentInspection {
            base: SegmentBase {
                id: "900".into(),
                ..Default::default()
            },
            inspection_apps: vec![
                inspection_app("ia-1", "app-1", "crm.example.com"),
                inspection_app("ia-2", "app-2", "wiki.example.com"),
            ],
            ..Default::default()
        };
        let spec = plan(json!([
            {"domain": "wiki.example.com", "app_id": "", "inspect_app_id": ""},
            {"domain": "crm.example.com", "app_id": "", "inspect_app_id": " "}
        ]));

        let (payload, diags) = InspectionResource::expand(&spec, Some(&prior));
        assert!(!diags.has_error(), "{diags}");
        let ids: Vec<(&str, &str)> = payload
            .common_apps_dto
            .apps_config
            .iter()
            .map(|a| (a.inspect_app_id.as_str(), a.app_id.as_str()))
            .collect();
        assert_eq!(ids, [("ia-2", "app-2"), ("ia-1", "app-1")]);
        assert!(payload.common_apps_dto.deleted_inspect_apps.is_empty());
    }

    #[test]
    fn flatten_backfills_ids_and_respects_planned_names() {
        let remote = AppSegmentInspection {
            inspection_apps: vec![inspection_app("ia-1", "app-1", "crm-inspected")],
            ..Default::default()
        };
        let planned = plan(json!([{
            "domain": "crm.example.com",
            "name": "my-crm",
            "application_protocol": "HTTPS"
        }]));

        let (state, _) = InspectionResource::flatten(&remote, Some(&planned));
        let entry = &state.common_apps_dto.items()[0].apps_config.items()[0];
        assert_eq!(entry.app_id, Field::Value("app-1".into()));
        assert_eq!(entry.inspect_app_id, Field::Value("ia-1".into()));
        assert_eq!(entry.name, Field::Value("my-crm".into()));
        // Description was not planned: taken from the API.
        assert_eq!(entry.description, Field::Value("crm-inspected (from api)".into()));
        assert_eq!(entry.application_protocol, Field::Value("HTTPS".into()));

        let computed = state.inspection_apps.items();
        assert_eq!(computed.len(), 1);
        assert_eq!(computed[0].id, "ia-1");
    }

    #[test]
    fn flatten_without_plan_rebuilds_from_inspection_apps() {
        let remote = AppSegmentInspection {
            inspection_apps: vec![inspection_app("ia-1", "app-1", "crm.example.com")],
            ..Default::default()
        };
        let (state, _) = InspectionResource::flatten(&remote, None);
        let entry = &state.common_apps_dto.items()[0].apps_config.items()[0];
        assert_eq!(entry.inspect_app_id, Field::Value("ia-1".into()));

        let (state, _) = InspectionResource::flatten(&AppSegmentInspection::default(), None);
        assert_eq!(state.common_apps_dto, Field::empty());
        assert_eq!(state.inspection_apps, Field::empty());
    }

    #[test]
    fn flatten_then_expand_round_trips() {
        let remote = AppSegmentInspection {
            base: SegmentBase {
                id: "900".into(),
                name: "inspect-crm".into(),
                segment_group_id: "100".into(),
                bypass_type: "NEVER".into(),
                config_space: "DEFAULT".into(),
                icmp_access_type: "NONE".into(),
                domain_names: vec!["crm.example.com".into()],
                ..Default::default()
            },
            tcp_protocols: vec!["HTTPS".into()],
            common_apps_dto: CommonAppsDto {
                apps_config: vec![AppsConfig {
                    app_id: "app-1".into(),
                    inspect_app_id: "ia-1".into(),
                    name: "crm.example.com".into(),
                    app_types: vec!["INSPECT".into()],
                    application_port: "443".into(),
                    application_protocol: "HTTPS".into(),
                    certificate_id: "cert-1".into(),
                    domain: "crm.example.com".into(),
                    enabled: true,
                    ..Default::default()
                }],
                deleted_inspect_apps: Vec::new(),
            },
            ..Default::default()
        };
        let (state, _) = InspectionResource::flatten(&remote, None);
        let (again, diags) = InspectionResource::expand(&state, None);
        assert!(!diags.has_error(), "{diags}");
        assert_eq!(again, remote);
    }
}
