// ── Pre-delete detachment ──
//
// The API refuses to delete a segment group or application segment that a
// policy rule still references. Before such a delete every policy category
// is scanned and matching operands are stripped from the rules that carry
// them. Rules are rewritten whole, so concurrent detaches would clobber
// each other: the whole sweep runs under one process-wide lock.

use std::fmt;
use std::sync::LazyLock;

use strum::{Display, EnumIter, IntoEnumIterator};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use zpa_api::models::{AppRef, Operand, PolicyRule};

use crate::diag::Diagnostics;
use crate::remote::Remote;

static DETACH_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Policy categories whose rules may reference segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyType {
    AccessPolicy,
    TimeoutPolicy,
    SiemPolicy,
    ClientForwardingPolicy,
    InspectionPolicy,
}

/// What is about to be deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetachTarget {
    /// Matched by `APP_GROUP` operands.
    SegmentGroup(String),
    /// Matched by `APP` operands.
    Application(String),
}

impl DetachTarget {
    pub fn object_type(&self) -> &'static str {
        match self {
            Self::SegmentGroup(_) => "APP_GROUP",
            Self::Application(_) => "APP",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::SegmentGroup(id) | Self::Application(id) => id,
        }
    }

    /// `objectType` matches exactly, `lhs` is `id` (any case), `rhs` is the id.
    fn matches(&self, object_type: &str, lhs: &str, rhs: &str) -> bool {
        object_type == self.object_type() && lhs.eq_ignore_ascii_case("id") && rhs == self.id()
    }

    /// Strip the id from one operand. `None` means the operand goes.
    fn strip(&self, mut operand: Operand) -> Option<Operand> {
        if operand.values.is_empty() {
            return (!self.matches(&operand.object_type, &operand.lhs, &operand.rhs))
                .then_some(operand);
        }
        // Multi-value operands list their ids in `values`.
        if operand.object_type.eq_ignore_ascii_case(self.object_type()) {
            operand.values.retain(|v| v != self.id());
        }
        (!operand.values.is_empty()).then_some(operand)
    }
}

impl fmt::Display for DetachTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SegmentGroup(id) => write!(f, "segment group {id}"),
            Self::Application(id) => write!(f, "application {id}"),
        }
    }
}

/// Outcome of one detachment sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetachReport {
    pub rules_scanned: usize,
    /// Ids of rules that were rewritten.
    pub rules_updated: Vec<String>,
    /// Categories that could not be read and were left alone.
    pub skipped: Vec<PolicyType>,
}

/// Remove every reference to `target` and drop the conditions this leaves
/// without operands. Returns `true` if the rule changed.
fn strip_operands(rule: &mut PolicyRule, target: &DetachTarget) -> bool {
    let before = rule.conditions.clone();
    rule.conditions = std::mem::take(&mut rule.conditions)
        .into_iter()
        .filter_map(|mut condition| {
            if condition.operands.is_empty() {
                return Some(condition);
            }
            condition.operands = std::mem::take(&mut condition.operands)
                .into_iter()
                .filter_map(|op| target.strip(op))
                .collect();
            (!condition.operands.is_empty()).then_some(condition)
        })
        .collect();
    rule.conditions != before
}

/// Strip `target` from every policy rule that references it.
///
/// A category that cannot be read is skipped with a warning. A rule that
/// cannot be written back is an error and ends the sweep.
pub async fn detach_from_policy_rules<R: Remote>(
    remote: &R,
    target: &DetachTarget,
) -> (DetachReport, Diagnostics) {
    let _guard = DETACH_LOCK.lock().await;

    let mut report = DetachReport::default();
    let mut diags = Diagnostics::new();

    for policy_type in PolicyType::iter() {
        let kind = policy_type.to_string();

        let policy_set = match remote.get_policy_set(&kind).await {
            Ok(set) => set,
            Err(e) => {
                warn!(policy_type = %kind, error = %e, "cannot read policy set, skipping");
                diags.add_warning(
                    "Detach Skipped",
                    format!("could not read the {kind} policy set: {e}"),
                );
                report.skipped.push(policy_type);
                continue;
            }
        };
        let rules = match remote.list_policy_rules(&kind).await {
            Ok(rules) => rules,
            Err(e) => {
                warn!(policy_type = %kind, error = %e, "cannot list policy rules, skipping");
                diags.add_warning(
                    "Detach Skipped",
                    format!("could not list {kind} rules: {e}"),
                );
                report.skipped.push(policy_type);
                continue;
            }
        };

        for mut rule in rules {
            report.rules_scanned += 1;
            if !strip_operands(&mut rule, target) {
                continue;
            }

            rule.policy_set_id.clone_from(&policy_set.id);
            debug!(policy_type = %kind, rule_id = %rule.id, "detaching {target}");
            if let Err(e) = remote
                .update_policy_rule(&policy_set.id, &rule.id, &rule)
                .await
            {
                diags.add_error(
                    "Detach Error",
                    format!(
                        "failed to detach {target} from {kind} rule {} ({}): {e}",
                        rule.id, rule.name
                    ),
                );
                return (report, diags);
            }
            report.rules_updated.push(rule.id);
        }
    }

    if !report.rules_updated.is_empty() {
        info!(
            rules = report.rules_updated.len(),
            "detached {target} from policy rules"
        );
    }
    (report, diags)
}

/// Drop `app_id` from the application list of segment group `group_id`.
///
/// A segment group that no longer exists needs no detaching.
pub async fn detach_from_segment_group<R: Remote>(
    remote: &R,
    group_id: &str,
    app_id: &str,
) -> Diagnostics {
    let _guard = DETACH_LOCK.lock().await;
    let mut diags = Diagnostics::new();

    let mut group = match remote.get_segment_group(group_id).await {
        Ok(group) => group,
        Err(e) if e.is_not_found() => {
            debug!(group_id, "segment group already gone");
            return diags;
        }
        Err(e) => {
            diags.add_error(
                "Detach Error",
                format!("failed to read segment group {group_id}: {e}"),
            );
            return diags;
        }
    };

    let before = group.applications.len();
    group.applications.retain(|app: &AppRef| app.id != app_id);
    if group.applications.len() == before {
        return diags;
    }

    if let Err(e) = remote.update_segment_group(group_id, &group).await {
        diags.add_error(
            "Detach Error",
            format!("failed to remove application {app_id} from segment group {group_id}: {e}"),
        );
    } else {
        info!(group_id, app_id, "removed application from segment group");
    }
    diags
}
