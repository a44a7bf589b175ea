// Standard application segment.

use serde::{Deserialize, Serialize};
use tracing::info;

use zpa_api::models::{ApplicationSegment, ShareRequest};

use super::Resource;
use super::common::{
    IdSet, SegmentSpec, expand_segment, expand_zpn_er_id, flatten_segment, flatten_zpn_er_id,
    validate_request, validate_segment,
};
use crate::detach::{DetachTarget, detach_from_policy_rules};
use crate::diag::{Diagnostics, Operation};
use crate::error::CoreError;
use crate::field::Field;
use crate::mapper::{Mapper, Phase, ResourceKind};
use crate::remote::Remote;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSegmentSpec {
    #[serde(flatten)]
    pub segment: SegmentSpec,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub fqdn_dns_check: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub inspect_traffic_with_zia: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub api_protection_enabled: Field<bool>,
    /// Computed.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub match_style: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub zpn_er_id: Field<Vec<IdSet>>,
    /// Microtenants the segment is shared with after each write.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub share_to_microtenants: Field<Vec<String>>,
}

pub struct ApplicationSegmentResource;

impl Mapper for ApplicationSegmentResource {
    type Declared = ApplicationSegmentSpec;
    type Remote = ApplicationSegment;

    const KIND: ResourceKind = ResourceKind::ApplicationSegment;

    fn validate(declared: &ApplicationSegmentSpec, phase: Phase) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validate_segment(&declared.segment, phase, &mut diags);
        diags
    }

    fn expand(
        declared: &ApplicationSegmentSpec,
        prior: Option<&ApplicationSegment>,
    ) -> (ApplicationSegment, Diagnostics) {
        let mut diags = Self::validate(declared, Phase::of(prior));

        let base = expand_segment(&declared.segment, prior.map(|p| &p.base), &mut diags);
        validate_request(&base, &mut diags);

        let segment = ApplicationSegment {
            base,
            fqdn_dns_check: declared
                .fqdn_dns_check
                .resolve(prior.map(|p| &p.fqdn_dns_check), || false),
            inspect_traffic_with_zia: declared
                .inspect_traffic_with_zia
                .resolve(prior.map(|p| &p.inspect_traffic_with_zia), || false),
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
            shared_microtenant_details: prior
                .map(|p| p.shared_microtenant_details.clone())
                .unwrap_or_default(),
        };
        (segment, diags)
    }

    fn flatten(
        remote: &ApplicationSegment,
        _prior: Option<&ApplicationSegmentSpec>,
    ) -> (ApplicationSegmentSpec, Diagnostics) {
        let spec = ApplicationSegmentSpec {
            segment: flatten_segment(&remote.base),
            fqdn_dns_check: Field::Value(remote.fqdn_dns_check),
            inspect_traffic_with_zia: Field::Value(remote.inspect_traffic_with_zia),
            api_protection_enabled: Field::Value(remote.api_protection_enabled),
            match_style: Field::Value(remote.match_style.clone()),
            zpn_er_id: flatten_zpn_er_id(remote.zpn_er_id.as_ref()),
            share_to_microtenants: Field::Value(
                remote
                    .shared_microtenant_details
                    .shared_to_microtenants
                    .iter()
                    .map(|m| m.id.clone())
                    .collect(),
            ),
        };
        (spec, Diagnostics::new())
    }
}

impl Resource for ApplicationSegmentResource {
    fn declared_id(declared: &ApplicationSegmentSpec) -> Option<&str> {
        declared.segment.remote_id()
    }

    fn microtenant(declared: &ApplicationSegmentSpec) -> Option<&str> {
        declared.segment.microtenant()
    }

    fn remote_id(remote: &ApplicationSegment) -> &str {
        &remote.base.id
    }

    async fn fetch<R: Remote>(remote: &R, id: &str) -> Result<ApplicationSegment, zpa_api::Error> {
        remote.get_application_segment(id).await
    }

    async fn fetch_by_name<R: Remote>(
        remote: &R,
        name: &str,
    ) -> Result<ApplicationSegment, zpa_api::Error> {
        remote.get_application_segment_by_name(name).await
    }

    async fn create<R: Remote>(
        remote: &R,
        body: &ApplicationSegment,
    ) -> Result<ApplicationSegment, zpa_api::Error> {
        remote.create_application_segment(body).await
    }

    async fn update<R: Remote>(
        remote: &R,
        id: &str,
        body: &ApplicationSegment,
    ) -> Result<(), zpa_api::Error> {
        remote.update_application_segment(id, body).await
    }

    async fn delete<R: Remote>(remote: &R, id: &str) -> Result<(), zpa_api::Error> {
        remote.delete_application_segment(id).await
    }

    async fn after_write<R: Remote>(
        remote: &R,
        id: &str,
        declared: &ApplicationSegmentSpec,
    ) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let targets: Vec<String> = declared
            .share_to_microtenants
            .items()
            .iter()
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty())
            .collect();
        if targets.is_empty() {
            return diags;
        }

        let request = ShareRequest {
            application_id: id.to_owned(),
            share_to_microtenants: targets,
            microtenant_id: declared
                .segment
                .microtenant()
                .unwrap_or_default()
                .to_owned(),
        };
        match remote.share_application_segment(id, &request).await {
            Ok(()) => info!(
                id,
                microtenants = request.share_to_microtenants.len(),
                "shared application segment"
            ),
            Err(e) => diags.add_client_error(
                Operation::Share,
                Self::KIND,
                id,
                &CoreError::from(e),
            ),
        }
        diags
    }

    async fn before_delete<R: Remote>(
        remote: &R,
        id: &str,
        _state: &ApplicationSegmentSpec,
    ) -> Diagnostics {
        let target = DetachTarget::Application(id.to_owned());
        let (_report, diags) = detach_from_policy_rules(remote, &target).await;
        diags
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use zpa_api::models::{
        MicrotenantRef, NetworkPort, SegmentBase, ServerGroupRef, SharedMicrotenantDetails,
        ZpnErId,
    };

    use super::*;

    fn remote() -> ApplicationSegment {
        ApplicationSegment {
            base: SegmentBase {
                id: "216196257331291896".into(),
                name: "crm".into(),
                description: "CRM portal".into(),
                segment_group_id: "216196257331291800".into(),
                bypass_type: "NEVER".into(),
                config_space: "DEFAULT".into(),
                domain_names: vec!["crm.example.com".into(), "crm2.example.com".into()],
                enabled: true,
                health_reporting: "ON_ACCESS".into(),
                icmp_access_type: "NONE".into(),
                tcp_keep_alive: "1".into(),
                tcp_port_ranges: vec!["443".into(), "443".into()],
                tcp_port_range: vec![NetworkPort {
                    from: "443".into(),
                    to: "443".into(),
                }],
                server_groups: vec![ServerGroupRef {
                    id: "216196257331291700".into(),
                    name: String::new(),
                }],
                ..Default::default()
            },
            fqdn_dns_check: true,
            match_style: "EXCLUSIVE".into(),
            zpn_er_id: Some(ZpnErId {
                id: "77".into(),
                name: String::new(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn flatten_then_expand_reproduces_the_request() {
        let original = remote();
        let (declared, diags) = ApplicationSegmentResource::flatten(&original, None);
        assert!(diags.is_empty());

        let (again, diags) = ApplicationSegmentResource::expand(&declared, None);
        assert!(!diags.has_error(), "{diags}");
        assert_eq!(again, original);
    }

    #[test]
    fn empty_remote_lists_flatten_to_explicit_empty() {
        let mut original = remote();
        original.base.server_groups.clear();
        original.zpn_er_id = None;

        let (declared, _) = ApplicationSegmentResource::flatten(&original, None);
        assert_eq!(declared.segment.server_groups, Field::empty());
        assert_eq!(declared.zpn_er_id, Field::empty());
        assert_eq!(declared.share_to_microtenants, Field::empty());
        assert!(!declared.segment.udp_port_range.is_absent());
    }

    #[test]
    fn update_keeps_prior_ports_when_unset() {
        let prior = remote();
        let declared: ApplicationSegmentSpec = serde_json::from_value(json!({
            "name": "crm",
            "segment_group_id": "216196257331291800",
            "domain_names": ["crm.example.com"]
        }))
        .unwrap();

        let (payload, diags) = ApplicationSegmentResource::expand(&declared, Some(&prior));
        assert!(!diags.has_error(), "{diags}");
        assert_eq!(payload.base.id, prior.base.id);
        assert_eq!(payload.base.tcp_port_ranges, prior.base.tcp_port_ranges);
        assert_eq!(payload.base.tcp_port_range, prior.base.tcp_port_range);
        assert_eq!(payload.base.domain_names, ["crm.example.com"]);
        assert_eq!(payload.zpn_er_id, prior.zpn_er_id);
    }

    #[test]
    fn closest_connector_rejects_fallback_udp_ports() {
        let mut prior = remote();
        prior.base.udp_port_ranges = vec!["53".into(), "53".into()];
        let declared = ApplicationSegmentSpec {
            segment: SegmentSpec {
                select_connector_close_to_app: Field::Value(true),
                ..Default::default()
            },
            ..Default::default()
        };

        let (_, diags) = ApplicationSegmentResource::expand(&declared, Some(&prior));
        assert!(
            diags
                .errors()
                .any(|d| d.detail == "App Connector Closest to App supports only TCP applications")
        );
    }

    #[test]
    fn create_without_segment_group_fails_validation() {
        let declared: ApplicationSegmentSpec = serde_json::from_value(json!({
            "name": "crm",
            "domain_names": ["crm.example.com"],
            "segment_group_id": null
        }))
        .unwrap();
        let diags = ApplicationSegmentResource::validate(&declared, Phase::Create);
        assert_eq!(diags.errors().count(), 1);
    }

    #[test]
    fn shared_microtenants_flatten_to_ids() {
        let mut original = remote();
        original.shared_microtenant_details = SharedMicrotenantDetails {
            shared_to_microtenants: vec![
                MicrotenantRef {
                    id: "mt-2".into(),
                    name: "finance".into(),
                },
                MicrotenantRef {
                    id: "mt-3".into(),
                    name: String::new(),
                },
            ],
        };
        let (declared, _) = ApplicationSegmentResource::flatten(&original, None);
        assert_eq!(
            declared.share_to_microtenants,
            Field::Value(vec!["mt-2".to_string(), "mt-3".to_string()])
        );
    }
}
