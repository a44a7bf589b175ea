// ── Mapper contract ──
//
// One implementation per resource type. Expand turns a declared record
// into an API request body; flatten turns an API response back into a
// declared record. Both are pure: no I/O, problems go to `Diagnostics`.

use strum::Display;

use crate::diag::Diagnostics;

/// Resource types the mapper knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ResourceKind {
    #[strum(serialize = "segment group")]
    SegmentGroup,
    #[strum(serialize = "application segment")]
    ApplicationSegment,
    #[strum(serialize = "browser access application segment")]
    BrowserAccess,
    #[strum(serialize = "inspection application segment")]
    InspectionSegment,
}

/// Which lifecycle step a declared record is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Create,
    Update,
}

impl Phase {
    /// Expansion against a prior record is an update.
    pub fn of<T>(prior: Option<&T>) -> Self {
        if prior.is_some() {
            Self::Update
        } else {
            Self::Create
        }
    }
}

/// Bidirectional translation between a declared record and its API shape.
pub trait Mapper {
    /// User-facing record, attributes wrapped in [`Field`](crate::Field).
    type Declared: Clone + Send + Sync;
    /// API request/response body.
    type Remote: Clone + Send + Sync;

    const KIND: ResourceKind;

    /// Check declared values before anything is sent.
    fn validate(declared: &Self::Declared, phase: Phase) -> Diagnostics;

    /// Build the request body. `prior` is the current remote record on
    /// update and `None` on create.
    ///
    /// Runs [`validate`](Self::validate) first; when it reports errors the
    /// returned body must not be sent.
    fn expand(declared: &Self::Declared, prior: Option<&Self::Remote>)
    -> (Self::Remote, Diagnostics);

    /// Build the declared record from a response. `prior` is the plan or
    /// state the response answers, when there is one.
    fn flatten(remote: &Self::Remote, prior: Option<&Self::Declared>)
    -> (Self::Declared, Diagnostics);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_read_naturally() {
        assert_eq!(ResourceKind::SegmentGroup.to_string(), "segment group");
        assert_eq!(
            ResourceKind::InspectionSegment.to_string(),
            "inspection application segment"
        );
        assert_eq!(Phase::of(Some(&1)), Phase::Update);
        assert_eq!(Phase::of::<u8>(None), Phase::Create);
    }
}
