// ── Fields shared by every application segment flavour ──
//
// Standard, browser-access and inspection segments carry the same base
// block. It is declared once here, expanded into `SegmentBase` and
// flattened back, so each flavour only handles its own extras.

use serde::{Deserialize, Serialize};

use zpa_api::models::{NetworkPort, SegmentBase, ServerGroupRef, ZpnErId};

use crate::diag::Diagnostics;
use crate::field::Field;
use crate::mapper::Phase;

pub const DEFAULT_BYPASS_TYPE: &str = "NEVER";
pub const DEFAULT_CONFIG_SPACE: &str = "DEFAULT";
pub const DEFAULT_ICMP_ACCESS_TYPE: &str = "NONE";

/// A declared `{ from, to }` port block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub from: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub to: Field<String>,
}

impl PortRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: Field::Value(from.into()),
            to: Field::Value(to.into()),
        }
    }
}

/// A block holding a set of referenced ids (`server_groups`, `zpn_er_id`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSet {
    #[serde(default)]
    pub id: Vec<String>,
}

impl IdSet {
    pub fn of<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Declared base attributes of an application segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSpec {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub segment_group_id: Field<String>,
    /// Computed.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub segment_group_name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub bypass_type: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub bypass_on_reauth: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub config_space: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub domain_names: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub double_encrypt: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub enabled: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub passive_health_enabled: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub health_check_type: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub health_reporting: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub icmp_access_type: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub ip_anchored: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub is_cname_enabled: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub select_connector_close_to_app: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub use_in_dr_mode: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub is_incomplete_dr_config: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub tcp_keep_alive: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub microtenant_id: Field<String>,
    /// Computed.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub microtenant_name: Field<String>,
    /// Flat `from, to, from, to, ...` list.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub tcp_port_ranges: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub udp_port_ranges: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub tcp_port_range: Field<Vec<PortRange>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub udp_port_range: Field<Vec<PortRange>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub server_groups: Field<Vec<IdSet>>,
}

impl SegmentSpec {
    /// The known remote id, if any.
    pub fn remote_id(&self) -> Option<&str> {
        self.id.non_blank()
    }

    pub fn microtenant(&self) -> Option<&str> {
        self.microtenant_id.non_blank()
    }
}

// ── Validation ───────────────────────────────────────────────────────

pub(crate) fn validate_segment(spec: &SegmentSpec, phase: Phase, diags: &mut Diagnostics) {
    match phase {
        Phase::Create => {
            if spec.name.non_blank().is_none() {
                diags.add_validation("name must be specified");
            }
            if spec.segment_group_id.non_blank().is_none() {
                diags.add_validation(
                    "segment_group_id must be specified when creating an application segment",
                );
            }
            if spec.domain_names.items().is_empty() {
                diags.add_validation("domain_names must contain at least one domain");
            }
        }
        Phase::Update => {
            if !spec.name.is_unset() && spec.name.non_blank().is_none() {
                diags.add_validation("name must not be empty");
            }
            if !spec.segment_group_id.is_unset() && spec.segment_group_id.non_blank().is_none() {
                diags.add_validation(
                    "segment_group_id must not be empty when updating an application segment",
                );
            }
        }
    }
}

/// Rules that hold on the request body, after update fallbacks applied.
pub(crate) fn validate_request(base: &SegmentBase, diags: &mut Diagnostics) {
    let has_udp = !base.udp_port_ranges.is_empty() || !base.udp_port_range.is_empty();
    if base.select_connector_close_to_app && has_udp {
        diags.add_validation("App Connector Closest to App supports only TCP applications");
    }
}

// ── Expand ───────────────────────────────────────────────────────────

fn text(field: &Field<String>, prior: Option<&String>, default: &str) -> String {
    field
        .resolve(prior, || default.to_owned())
        .trim()
        .to_owned()
}

fn flag(field: &Field<bool>, prior: Option<&bool>) -> bool {
    field.resolve(prior, || false)
}

/// Build the shared base of a request body.
pub(crate) fn expand_segment(
    spec: &SegmentSpec,
    prior: Option<&SegmentBase>,
    diags: &mut Diagnostics,
) -> SegmentBase {
    let id = prior
        .map(|p| p.id.clone())
        .filter(|id| !id.is_empty())
        .or_else(|| spec.remote_id().map(String::from))
        .unwrap_or_default();

    let (tcp_port_ranges, tcp_port_range) = expand_ports(
        &spec.tcp_port_ranges,
        &spec.tcp_port_range,
        prior.map(|p| (p.tcp_port_ranges.as_slice(), p.tcp_port_range.as_slice())),
        "tcp",
        diags,
    );
    let (udp_port_ranges, udp_port_range) = expand_ports(
        &spec.udp_port_ranges,
        &spec.udp_port_range,
        prior.map(|p| (p.udp_port_ranges.as_slice(), p.udp_port_range.as_slice())),
        "udp",
        diags,
    );

    SegmentBase {
        id,
        name: text(&spec.name, prior.map(|p| &p.name), ""),
        description: text(&spec.description, prior.map(|p| &p.description), ""),
        segment_group_id: text(
            &spec.segment_group_id,
            prior.map(|p| &p.segment_group_id),
            "",
        ),
        segment_group_name: text(
            &spec.segment_group_name,
            prior.map(|p| &p.segment_group_name),
            "",
        ),
        bypass_type: text(
            &spec.bypass_type,
            prior.map(|p| &p.bypass_type),
            DEFAULT_BYPASS_TYPE,
        ),
        bypass_on_reauth: flag(&spec.bypass_on_reauth, prior.map(|p| &p.bypass_on_reauth)),
        config_space: text(
            &spec.config_space,
            prior.map(|p| &p.config_space),
            DEFAULT_CONFIG_SPACE,
        ),
        domain_names: trimmed(
            spec.domain_names
                .resolve_collection(prior.map(|p| p.domain_names.as_slice())),
        ),
        double_encrypt: flag(&spec.double_encrypt, prior.map(|p| &p.double_encrypt)),
        enabled: flag(&spec.enabled, prior.map(|p| &p.enabled)),
        passive_health_enabled: flag(
            &spec.passive_health_enabled,
            prior.map(|p| &p.passive_health_enabled),
        ),
        health_check_type: text(
            &spec.health_check_type,
            prior.map(|p| &p.health_check_type),
            "",
        ),
        health_reporting: text(
            &spec.health_reporting,
            prior.map(|p| &p.health_reporting),
            "",
        ),
        icmp_access_type: text(
            &spec.icmp_access_type,
            prior.map(|p| &p.icmp_access_type),
            DEFAULT_ICMP_ACCESS_TYPE,
        ),
        ip_anchored: flag(&spec.ip_anchored, prior.map(|p| &p.ip_anchored)),
        is_cname_enabled: flag(&spec.is_cname_enabled, prior.map(|p| &p.is_cname_enabled)),
        select_connector_close_to_app: flag(
            &spec.select_connector_close_to_app,
            prior.map(|p| &p.select_connector_close_to_app),
        ),
        use_in_dr_mode: flag(&spec.use_in_dr_mode, prior.map(|p| &p.use_in_dr_mode)),
        is_incomplete_dr_config: flag(
            &spec.is_incomplete_dr_config,
            prior.map(|p| &p.is_incomplete_dr_config),
        ),
        tcp_keep_alive: text(&spec.tcp_keep_alive, prior.map(|p| &p.tcp_keep_alive), ""),
        microtenant_id: text(&spec.microtenant_id, prior.map(|p| &p.microtenant_id), ""),
        microtenant_name: text(
            &spec.microtenant_name,
            prior.map(|p| &p.microtenant_name),
            "",
        ),
        tcp_port_ranges,
        udp_port_ranges,
        tcp_port_range,
        udp_port_range,
        server_groups: expand_server_groups(
            &spec.server_groups,
            prior.map(|p| p.server_groups.as_slice()),
        ),
    }
}

fn trimmed(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Resolve one protocol's flat list and block list together.
///
/// The API keeps both shapes in sync, so the prior values are only reused
/// when neither is declared.
fn expand_ports(
    flat: &Field<Vec<String>>,
    blocks: &Field<Vec<PortRange>>,
    prior: Option<(&[String], &[NetworkPort])>,
    protocol: &str,
    diags: &mut Diagnostics,
) -> (Vec<String>, Vec<NetworkPort>) {
    if flat.is_unset() && blocks.is_unset() {
        return prior
            .map(|(flat, blocks)| (flat.to_vec(), blocks.to_vec()))
            .unwrap_or_default();
    }

    let flat = trimmed(flat.resolve_collection(None));
    if flat.len() % 2 != 0 {
        diags.add_transform(format!(
            "{protocol}_port_ranges must list from/to pairs, got {} values",
            flat.len()
        ));
    }
    for (i, port) in flat.iter().enumerate() {
        if port.parse::<u16>().is_err() {
            diags.add_transform(format!(
                "{protocol}_port_ranges[{i}]: '{port}' is not a valid port"
            ));
        }
    }

    let blocks = expand_port_blocks(blocks.items(), &format!("{protocol}_port_range"), diags);
    (flat, blocks)
}

/// Convert declared port blocks. Entries with both ends blank are skipped.
pub(crate) fn expand_port_blocks(
    blocks: &[PortRange],
    attribute: &str,
    diags: &mut Diagnostics,
) -> Vec<NetworkPort> {
    let mut ports = Vec::with_capacity(blocks.len());
    for (i, block) in blocks.iter().enumerate() {
        match (block.from.non_blank(), block.to.non_blank()) {
            (None, None) => {}
            (Some(from), Some(to)) => match (from.parse::<u16>(), to.parse::<u16>()) {
                (Ok(lo), Ok(hi)) if lo <= hi => ports.push(NetworkPort {
                    from: from.to_owned(),
                    to: to.to_owned(),
                }),
                (Ok(_), Ok(_)) => diags.add_transform(format!(
                    "{attribute}[{i}]: from ({from}) must not be greater than to ({to})"
                )),
                _ => diags.add_transform(format!(
                    "{attribute}[{i}]: from and to must be numeric ports, got '{from}' and '{to}'"
                )),
            },
            _ => diags.add_transform(format!(
                "{attribute}[{i}]: both from and to must be set"
            )),
        }
    }
    ports
}

fn expand_server_groups(
    field: &Field<Vec<IdSet>>,
    prior: Option<&[ServerGroupRef]>,
) -> Vec<ServerGroupRef> {
    match field {
        Field::Unset => prior.map(<[ServerGroupRef]>::to_vec).unwrap_or_default(),
        Field::Null => Vec::new(),
        Field::Value(sets) => {
            let mut refs: Vec<ServerGroupRef> = Vec::new();
            for id in sets.iter().flat_map(|set| &set.id) {
                let id = id.trim();
                if !id.is_empty() && !refs.iter().any(|r| r.id == id) {
                    refs.push(ServerGroupRef {
                        id: id.to_owned(),
                        name: String::new(),
                    });
                }
            }
            refs
        }
    }
}

/// The first non-blank id of the declared block, if any.
pub(crate) fn expand_zpn_er_id(
    field: &Field<Vec<IdSet>>,
    prior: Option<&ZpnErId>,
) -> Option<ZpnErId> {
    match field {
        Field::Unset => prior.cloned(),
        Field::Null => None,
        Field::Value(sets) => sets
            .iter()
            .flat_map(|set| &set.id)
            .map(|id| id.trim())
            .find(|id| !id.is_empty())
            .map(|id| ZpnErId {
                id: id.to_owned(),
                name: String::new(),
            }),
    }
}

// ── Flatten ──────────────────────────────────────────────────────────

/// Declared base attributes from a response. Every attribute is set;
/// empty collections come back as explicit empties.
pub(crate) fn flatten_segment(base: &SegmentBase) -> SegmentSpec {
    SegmentSpec {
        id: Field::Value(base.id.clone()),
        name: Field::Value(base.name.clone()),
        description: Field::Value(base.description.clone()),
        segment_group_id: Field::Value(base.segment_group_id.clone()),
        segment_group_name: Field::Value(base.segment_group_name.clone()),
        bypass_type: Field::Value(base.bypass_type.clone()),
        bypass_on_reauth: Field::Value(base.bypass_on_reauth),
        config_space: Field::Value(base.config_space.clone()),
        domain_names: Field::Value(base.domain_names.clone()),
        double_encrypt: Field::Value(base.double_encrypt),
        enabled: Field::Value(base.enabled),
        passive_health_enabled: Field::Value(base.passive_health_enabled),
        health_check_type: Field::Value(base.health_check_type.clone()),
        health_reporting: Field::Value(base.health_reporting.clone()),
        icmp_access_type: Field::Value(base.icmp_access_type.clone()),
        ip_anchored: Field::Value(base.ip_anchored),
        is_cname_enabled: Field::Value(base.is_cname_enabled),
        select_connector_close_to_app: Field::Value(base.select_connector_close_to_app),
        use_in_dr_mode: Field::Value(base.use_in_dr_mode),
        is_incomplete_dr_config: Field::Value(base.is_incomplete_dr_config),
        tcp_keep_alive: Field::Value(base.tcp_keep_alive.clone()),
        microtenant_id: Field::Value(base.microtenant_id.clone()),
        microtenant_name: Field::Value(base.microtenant_name.clone()),
        tcp_port_ranges: Field::Value(base.tcp_port_ranges.clone()),
        udp_port_ranges: Field::Value(base.udp_port_ranges.clone()),
        tcp_port_range: flatten_port_blocks(&base.tcp_port_range),
        udp_port_range: flatten_port_blocks(&base.udp_port_range),
        server_groups: flatten_server_groups(&base.server_groups),
    }
}

pub(crate) fn flatten_port_blocks(ports: &[NetworkPort]) -> Field<Vec<PortRange>> {
    Field::Value(
        ports
            .iter()
            .map(|p| PortRange::new(p.from.clone(), p.to.clone()))
            .collect(),
    )
}

/// All server groups in a single id set.
fn flatten_server_groups(groups: &[ServerGroupRef]) -> Field<Vec<IdSet>> {
    if groups.is_empty() {
        return Field::empty();
    }
    Field::Value(vec![IdSet::of(groups.iter().map(|g| g.id.clone()))])
}

pub(crate) fn flatten_zpn_er_id(zpn_er_id: Option<&ZpnErId>) -> Field<Vec<IdSet>> {
    match zpn_er_id {
        Some(z) if !z.id.is_empty() => Field::Value(vec![IdSet::of([z.id.clone()])]),
        _ => Field::empty(),
    }
}
