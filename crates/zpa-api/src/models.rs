// Wire types for the ZPA management API.
//
// Field names follow the API's camelCase JSON. Collections are always
// serialized (an empty list is meaningful); optional strings are dropped
// when blank so the API applies its own defaults.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ── Pagination envelope ─────────────────────────────────────────────

/// One page of a list endpoint: `{ "totalPages": "3", "list": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListPage<T> {
    #[serde(default, deserialize_with = "de_page_count")]
    pub total_pages: u32,
    #[serde(default)]
    pub list: Vec<T>,
}

/// `totalPages` arrives as a string on most endpoints and as a number on a few.
fn de_page_count<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Num(u32),
        Text(String),
        Missing(()),
    }

    match Count::deserialize(d)? {
        Count::Num(n) => Ok(n),
        Count::Text(s) if s.trim().is_empty() => Ok(0),
        Count::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Count::Missing(()) => Ok(0),
    }
}

// ── Shared references ───────────────────────────────────────────────

/// A `{from, to}` port range block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPort {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

/// Reference to a server group by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerGroupRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// Reference to an extranet resource (`zpnErId`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZpnErId {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// Application listed as a member of a segment group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicrotenantRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedMicrotenantDetails {
    #[serde(default)]
    pub shared_to_microtenants: Vec<MicrotenantRef>,
}

// ── Segment group ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentGroup {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub config_space: String,
    #[serde(default)]
    pub applications: Vec<AppRef>,
    #[serde(default)]
    pub policy_migrated: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tcp_keep_alive_enabled: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub microtenant_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub microtenant_name: String,
}

// ── Application segments ────────────────────────────────────────────

/// Fields shared by every application segment flavour.
///
/// Embedded with `#[serde(flatten)]` in [`ApplicationSegment`],
/// [`BrowserAccess`] and [`AppSegmentInspection`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentBase {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub segment_group_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub segment_group_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bypass_type: String,
    #[serde(default)]
    pub bypass_on_reauth: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub config_space: String,
    #[serde(default)]
    pub domain_names: Vec<String>,
    #[serde(default)]
    pub double_encrypt: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub passive_health_enabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub health_check_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub health_reporting: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icmp_access_type: String,
    #[serde(default)]
    pub ip_anchored: bool,
    #[serde(default)]
    pub is_cname_enabled: bool,
    #[serde(default)]
    pub select_connector_close_to_app: bool,
    #[serde(default)]
    pub use_in_dr_mode: bool,
    #[serde(default, rename = "isIncompleteDRConfig")]
    pub is_incomplete_dr_config: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tcp_keep_alive: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub microtenant_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub microtenant_name: String,
    #[serde(default)]
    pub tcp_port_ranges: Vec<String>,
    #[serde(default)]
    pub udp_port_ranges: Vec<String>,
    #[serde(default)]
    pub tcp_port_range: Vec<NetworkPort>,
    #[serde(default)]
    pub udp_port_range: Vec<NetworkPort>,
    #[serde(default)]
    pub server_groups: Vec<ServerGroupRef>,
}

/// A standard application segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSegment {
    #[serde(flatten)]
    pub base: SegmentBase,
    #[serde(default)]
    pub fqdn_dns_check: bool,
    #[serde(default)]
    pub inspect_traffic_with_zia: bool,
    #[serde(default)]
    pub api_protection_enabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub match_style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zpn_er_id: Option<ZpnErId>,
    #[serde(default, skip_serializing)]
    pub shared_microtenant_details: SharedMicrotenantDetails,
}

/// Body of `PUT application/{id}/share`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub application_id: String,
    pub share_to_microtenants: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub microtenant_id: String,
}

// ── Browser access ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserAccess {
    #[serde(flatten)]
    pub base: SegmentBase,
    #[serde(default)]
    pub fqdn_dns_check: bool,
    #[serde(default)]
    pub api_protection_enabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub match_style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zpn_er_id: Option<ZpnErId>,
    #[serde(default)]
    pub clientless_apps: Vec<ClientlessApp>,
}

/// An app published through browser access, nested in [`BrowserAccess`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientlessApp {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub allow_options: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub application_port: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub application_protocol: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub certificate_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub certificate_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cname: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub local_domain: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default)]
    pub trust_untrusted_cert: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ext_label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ext_domain: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub microtenant_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub microtenant_name: String,
}

// ── Inspection ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSegmentInspection {
    #[serde(flatten)]
    pub base: SegmentBase,
    #[serde(default)]
    pub adp_enabled: bool,
    #[serde(default)]
    pub auto_app_protect_enabled: bool,
    #[serde(default)]
    pub tcp_protocols: Vec<String>,
    #[serde(default)]
    pub udp_protocols: Vec<String>,
    #[serde(default)]
    pub common_apps_dto: CommonAppsDto,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inspection_apps: Vec<InspectionApp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonAppsDto {
    #[serde(default)]
    pub apps_config: Vec<AppsConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deleted_inspect_apps: Vec<String>,
}

/// Request-side description of an inspected app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppsConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub inspect_app_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub app_types: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub application_port: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub application_protocol: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub certificate_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub trust_untrusted_cert: bool,
}

/// Response-side view of an inspected app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionApp {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub application_port: String,
    #[serde(default)]
    pub application_protocol: String,
    #[serde(default)]
    pub certificate_id: String,
    #[serde(default)]
    pub certificate_name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub protocols: Vec<String>,
    #[serde(default)]
    pub trust_untrusted_cert: bool,
    #[serde(default)]
    pub microtenant_id: String,
    #[serde(default)]
    pub microtenant_name: String,
}

// ── Policy sets ─────────────────────────────────────────────────────
//
// Rules are pushed back verbatim after operands are stripped, so every
// policy type keeps the fields it does not model in `extra`.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySet {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub policy_type: String,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub policy_set_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub policy_type: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub operator: String,
    #[serde(default)]
    pub operands: Vec<Operand>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operand {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub object_type: String,
    #[serde(default)]
    pub lhs: String,
    #[serde(default)]
    pub rhs: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Referenced ids on rules written in the multi-value shape.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
