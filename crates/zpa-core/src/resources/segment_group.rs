// Segment group: bundles application segments for policy purposes.

use serde::{Deserialize, Serialize};

use zpa_api::models::SegmentGroup;

use super::Resource;
use crate::detach::{DetachTarget, detach_from_policy_rules};
use crate::diag::Diagnostics;
use crate::field::Field;
use crate::mapper::{Mapper, Phase, ResourceKind};
use crate::remote::Remote;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentGroupSpec {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub enabled: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub microtenant_id: Field<String>,
}

pub struct SegmentGroupResource;

impl Mapper for SegmentGroupResource {
    type Declared = SegmentGroupSpec;
    type Remote = SegmentGroup;

    const KIND: ResourceKind = ResourceKind::SegmentGroup;

    fn validate(declared: &SegmentGroupSpec, phase: Phase) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let blank_name = declared.name.non_blank().is_none();
        match phase {
            Phase::Create if blank_name => diags.add_validation("name must be specified"),
            Phase::Update if blank_name && !declared.name.is_unset() => {
                diags.add_validation("name must not be empty");
            }
            _ => {}
        }
        diags
    }

    fn expand(
        declared: &SegmentGroupSpec,
        prior: Option<&SegmentGroup>,
    ) -> (SegmentGroup, Diagnostics) {
        let diags = Self::validate(declared, Phase::of(prior));

        // Membership, config space and migration state are owned by other
        // resources; an update must send them back unchanged.
        let mut group = prior.cloned().unwrap_or_default();
        if group.id.is_empty() {
            group.id = declared.id.non_blank().unwrap_or_default().to_owned();
        }
        group.name = declared
            .name
            .resolve(prior.map(|p| &p.name), String::new)
            .trim()
            .to_owned();
        group.description = declared
            .description
            .resolve(prior.map(|p| &p.description), String::new);
        group.enabled = declared.enabled.resolve(prior.map(|p| &p.enabled), || false);
        group.microtenant_id = declared
            .microtenant_id
            .resolve(prior.map(|p| &p.microtenant_id), String::new)
            .trim()
            .to_owned();

        (group, diags)
    }

    fn flatten(
        remote: &SegmentGroup,
        _prior: Option<&SegmentGroupSpec>,
    ) -> (SegmentGroupSpec, Diagnostics) {
        let spec = SegmentGroupSpec {
            id: Field::Value(remote.id.clone()),
            name: Field::Value(remote.name.clone()),
            description: Field::Value(remote.description.clone()),
            enabled: Field::Value(remote.enabled),
            microtenant_id: Field::Value(remote.microtenant_id.clone()),
        };
        (spec, Diagnostics::new())
    }
}

impl Resource for SegmentGroupResource {
    fn declared_id(declared: &SegmentGroupSpec) -> Option<&str> {
        declared.id.non_blank()
    }

    fn microtenant(declared: &SegmentGroupSpec) -> Option<&str> {
        declared.microtenant_id.non_blank()
    }

    fn remote_id(remote: &SegmentGroup) -> &str {
        &remote.id
    }

    async fn fetch<R: Remote>(remote: &R, id: &str) -> Result<SegmentGroup, zpa_api::Error> {
        remote.get_segment_group(id).await
    }

    async fn fetch_by_name<R: Remote>(
        remote: &R,
        name: &str,
    ) -> Result<SegmentGroup, zpa_api::Error> {
        remote.get_segment_group_by_name(name).await
    }

    async fn create<R: Remote>(
        remote: &R,
        body: &SegmentGroup,
    ) -> Result<SegmentGroup, zpa_api::Error> {
        remote.create_segment_group(body).await
    }

    async fn update<R: Remote>(
        remote: &R,
        id: &str,
        body: &SegmentGroup,
    ) -> Result<(), zpa_api::Error> {
        remote.update_segment_group(id, body).await
    }

    async fn delete<R: Remote>(remote: &R, id: &str) -> Result<(), zpa_api::Error> {
        remote.delete_segment_group(id).await
    }

    async fn before_delete<R: Remote>(
        remote: &R,
        id: &str,
        _state: &SegmentGroupSpec,
    ) -> Diagnostics {
        let target = DetachTarget::SegmentGroup(id.to_owned());
        let (_report, diags) = detach_from_policy_rules(remote, &target).await;
        diags
    }
}
