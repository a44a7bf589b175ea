// Browser access segment: an application segment publishing clientless
// (browser-only) apps. Clientless apps carry server-assigned ids that the
// declared list omits, so updates reconcile them against the fetched
// record.

use serde::{Deserialize, Serialize};

use zpa_api::models::{BrowserAccess, ClientlessApp};

use super::Resource;
use super::common::{
    IdSet, SegmentSpec, expand_segment, expand_zpn_er_id, flatten_segment, flatten_zpn_er_id,
    validate_request, validate_segment,
};
use crate::detach::{DetachTarget, detach_from_policy_rules};
use crate::diag::Diagnostics;
use crate::field::Field;
use crate::mapper::{Mapper, Phase, ResourceKind};
use crate::reconcile::{Identified, carry_identity, reconcile_identities};
use crate::remote::Remote;

/// One declared clientless app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientlessAppSpec {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub app_id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub allow_options: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub application_port: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub application_protocol: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub certificate_id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub certificate_name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub cname: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub domain: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub enabled: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub hidden: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub local_domain: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub path: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub trust_untrusted_cert: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub ext_label: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub ext_domain: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub microtenant_id: Field<String>,
    /// Computed.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub microtenant_name: Field<String>,
}

impl Identified for ClientlessAppSpec {
    fn natural_key(&self) -> Option<&str> {
        self.name.as_value().map(String::as_str)
    }

    fn identity(&self) -> Option<&str> {
        self.id.as_value().map(String::as_str)
    }
}

impl Identified for ClientlessApp {
    fn natural_key(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn identity(&self) -> Option<&str> {
        Some(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserAccessSpec {
    #[serde(flatten)]
    pub segment: SegmentSpec,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub fqdn_dns_check: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub api_protection_enabled: Field<bool>,
    /// Computed.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub match_style: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub zpn_er_id: Field<Vec<IdSet>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub clientless_apps: Field<Vec<ClientlessAppSpec>>,
}

pub struct BrowserAccessResource;

fn validate_clientless_apps(declared: &BrowserAccessSpec, phase: Phase, diags: &mut Diagnostics) {
    let apps = &declared.clientless_apps;
    let required = phase == Phase::Create || !apps.is_unset();
    if required && apps.items().is_empty() {
        diags.add_validation("At least one clientless application must be specified.");
    }

    for (i, app) in apps.items().iter().enumerate() {
        if app.name.non_blank().is_none() {
            diags.add_validation(format!("clientless_apps[{i}]: name must be specified"));
        }
        let external = app.ext_label.non_blank().is_some() || app.ext_domain.non_blank().is_some();
        if external && app.certificate_id.non_blank().is_some() {
            diags.add_validation(format!(
                "clientless_apps[{i}]: certificate_id cannot be set when ext_label or ext_domain is specified"
            ));
        }
    }
}

/// Declared apps with ids carried over from the matching prior app.
fn expand_clientless_apps(
    field: &Field<Vec<ClientlessAppSpec>>,
    prior: &[ClientlessApp],
) -> Vec<ClientlessApp> {
    let declared = match field {
        Field::Unset => return prior.to_vec(),
        Field::Null => return Vec::new(),
        Field::Value(apps) => apps,
    };

    let matches = reconcile_identities(declared, prior);
    declared
        .iter()
        .zip(matches)
        .map(|(app, matched)| {
            let p = matched.and_then(|j| prior.get(j));
            let text = |value: &Field<String>, fallback: Option<&String>| {
                value.resolve(fallback, String::new).trim().to_owned()
            };
            let flag = |value: &Field<bool>, fallback: Option<&bool>| {
                value.resolve(fallback, || false)
            };

            ClientlessApp {
                id: carry_identity(&app.id, p.map(|p| &p.id)),
                app_id: carry_identity(&app.app_id, p.map(|p| &p.app_id)),
                name: text(&app.name, p.map(|p| &p.name)),
                description: text(&app.description, p.map(|p| &p.description)),
                allow_options: flag(&app.allow_options, p.map(|p| &p.allow_options)),
                application_port: text(&app.application_port, p.map(|p| &p.application_port)),
                application_protocol: text(
                    &app.application_protocol,
                    p.map(|p| &p.application_protocol),
                ),
                certificate_id: text(&app.certificate_id, p.map(|p| &p.certificate_id)),
                certificate_name: text(&app.certificate_name, p.map(|p| &p.certificate_name)),
                cname: text(&app.cname, p.map(|p| &p.cname)),
                domain: text(&app.domain, p.map(|p| &p.domain)),
                enabled: flag(&app.enabled, p.map(|p| &p.enabled)),
                hidden: flag(&app.hidden, p.map(|p| &p.hidden)),
                local_domain: text(&app.local_domain, p.map(|p| &p.local_domain)),
                path: text(&app.path, p.map(|p| &p.path)),
                trust_untrusted_cert: flag(
                    &app.trust_untrusted_cert,
                    p.map(|p| &p.trust_untrusted_cert),
                ),
                ext_label: text(&app.ext_label, p.map(|p| &p.ext_label)),
                ext_domain: text(&app.ext_domain, p.map(|p| &p.ext_domain)),
                microtenant_id: text(&app.microtenant_id, p.map(|p| &p.microtenant_id)),
                microtenant_name: text(&app.microtenant_name, p.map(|p| &p.microtenant_name)),
            }
        })
        .collect()
}

fn flatten_clientless_app(app: &ClientlessApp) -> ClientlessAppSpec {
    ClientlessAppSpec {
        id: Field::Value(app.id.clone()),
        app_id: Field::Value(app.app_id.clone()),
        name: Field::Value(app.name.clone()),
        description: Field::Value(app.description.clone()),
        allow_options: Field::Value(app.allow_options),
        application_port: Field::Value(app.application_port.clone()),
        application_protocol: Field::Value(app.application_protocol.clone()),
        certificate_id: Field::Value(app.certificate_id.clone()),
        certificate_name: Field::Value(app.certificate_name.clone()),
        cname: Field::Value(app.cname.clone()),
        domain: Field::Value(app.domain.clone()),
        enabled: Field::Value(app.enabled),
        hidden: Field::Value(app.hidden),
        local_domain: Field::Value(app.local_domain.clone()),
        path: Field::Value(app.path.clone()),
        trust_untrusted_cert: Field::Value(app.trust_untrusted_cert),
        ext_label: Field::Value(app.ext_label.clone()),
        ext_domain: Field::Value(app.ext_domain.clone()),
        microtenant_id: Field::Value(app.microtenant_id.clone()),
        microtenant_name: Field::Value(app.microtenant_name.clone()),
    }
}

/// Flattened apps in the order the plan declared them; apps the plan does
/// not mention keep their response order at the end.
fn flatten_clientless_apps(
    apps: &[ClientlessApp],
    prior: Option<&Field<Vec<ClientlessAppSpec>>>,
) -> Vec<ClientlessAppSpec> {
    let mut flattened: Vec<ClientlessAppSpec> = apps.iter().map(flatten_clientless_app).collect();
    if let Some(planned) = prior.map(Field::items).filter(|p| !p.is_empty()) {
        let position = |app: &ClientlessAppSpec| {
            planned
                .iter()
                .position(|p| {
                    p.name
                        .non_blank()
                        .zip(app.name.non_blank())
                        .is_some_and(|(a, b)| a.eq_ignore_ascii_case(b))
                })
                .unwrap_or(usize::MAX)
        };
        flattened.sort_by_key(position);
    }
    flattened
}

impl Mapper for BrowserAccessResource {
    type Declared = BrowserAccessSpec;
    type Remote = BrowserAccess;

    const KIND: ResourceKind = ResourceKind::BrowserAccess;

    fn validate(declared: &BrowserAccessSpec, phase: Phase) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validate_segment(&declared.segment, phase, &mut diags);
        validate_clientless_apps(declared, phase, &mut diags);
        diags
    }

    fn expand(
        declared: &BrowserAccessSpec,
        prior: Option<&BrowserAccess>,
    ) -> (BrowserAccess, Diagnostics) {
        let mut diags = Self::validate(declared, Phase::of(prior));

        let base = expand_segment(&declared.segment, prior.map(|p| &p.base), &mut diags);
        validate_request(&base, &mut diags);

        let app = BrowserAccess {
            base,
            fqdn_dns_check: declared
                .fqdn_dns_check
                .resolve(prior.map(|p| &p.fqdn_dns_check), || false),
            api_protection_enabled: declared
                .api_protection_enabled
                .resolve(prior.map(|p| &p.api_protection_enabled), || false),
            match_style: declared
                .match_style
                .resolve(prior.map(|p| &p.match_style), String::new),
            zpn_er_id: expand_zpn_er_id(
                &declared.zpn_er_id,
                prior.and_then(|p| p.zpn_er_id.as_ref()),
            ),
            clientless_apps: expand_clientless_apps(
                &declared.clientless_apps,
                prior
                    .map(|p| p.clientless_apps.as_slice())
                    .unwrap_or_default(),
            ),
        };
        (app, diags)
    }

    fn flatten(
        remote: &BrowserAccess,
        prior: Option<&BrowserAccessSpec>,
    ) -> (BrowserAccessSpec, Diagnostics) {
        let spec = BrowserAccessSpec {
            segment: flatten_segment(&remote.base),
            fqdn_dns_check: Field::Value(remote.fqdn_dns_check),
            api_protection_enabled: Field::Value(remote.api_protection_enabled),
            match_style: Field::Value(remote.match_style.clone()),
            zpn_er_id: flatten_zpn_er_id(remote.zpn_er_id.as_ref()),
            clientless_apps: Field::Value(flatten_clientless_apps(
                &remote.clientless_apps,
                prior.map(|p| &p.clientless_apps),
            )),
        };
        (spec, Diagnostics::new())
    }
}

impl Resource for BrowserAccessResource {
    fn declared_id(declared: &BrowserAccessSpec) -> Option<&str> {
        declared.segment.remote_id()
    }

    fn microtenant(declared: &BrowserAccessSpec) -> Option<&str> {
        declared.segment.microtenant()
    }

    fn remote_id(remote: &BrowserAccess) -> &str {
        &remote.base.id
    }

    async fn fetch<R: Remote>(remote: &R, id: &str) -> Result<BrowserAccess, zpa_api::Error> {
        remote.get_browser_access(id).await
    }

    async fn fetch_by_name<R: Remote>(
        remote: &R,
        name: &str,
    ) -> Result<BrowserAccess, zpa_api::Error> {
        remote.get_browser_access_by_name(name).await
    }

    async fn create<R: Remote>(
        remote: &R,
        body: &BrowserAccess,
    ) -> Result<BrowserAccess, zpa_api::Error> {
        remote.create_browser_access(body).await
    }

    async fn update<R: Remote>(
        remote: &R,
        id: &str,
        body: &BrowserAccess,
    ) -> Result<(), zpa_api::Error> {
        remote.update_browser_access(id, body).await
    }

    async fn delete<R: Remote>(remote: &R, id: &str) -> Result<(), zpa_api::Error> {
        remote.delete_application_segment(id).await
    }

    async fn before_delete<R: Remote>(
        remote: &R,
        id: &str,
        _state: &BrowserAccessSpec,
    ) -> Diagnostics {
        let target = DetachTarget::Application(id.to_owned());
        let (_report, diags) = detach_from_policy_rules(remote, &target).await;
        diags
    }
}
