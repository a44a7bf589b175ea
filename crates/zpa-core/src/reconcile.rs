// ── Nested identity reconciliation ──
//
// Nested items (clientless apps, inspected apps) get their ids from the
// server. A declared list normally omits them, so on update each declared
// item is paired with the prior item it continues: by name first, then by
// position. Each prior item is handed out at most once.

use std::collections::HashSet;

use crate::field::Field;

/// An item that has a natural key and possibly a server-assigned id.
pub trait Identified {
    /// Natural key, compared case-insensitively after trimming.
    fn natural_key(&self) -> Option<&str>;
    /// Server-assigned id, when already known.
    fn identity(&self) -> Option<&str>;
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// For each declared item, the index of the prior item it continues.
///
/// Items that already carry an id are matched by that id (or left
/// unmatched). The rest match by name, then fall back to the prior item at
/// the same position if nobody else claimed it.
pub fn reconcile_identities<D, P>(declared: &[D], prior: &[P]) -> Vec<Option<usize>>
where
    D: Identified,
    P: Identified,
{
    let mut matched: Vec<Option<usize>> = vec![None; declared.len()];
    let mut claimed: HashSet<usize> = HashSet::new();

    // Explicit ids.
    for (i, item) in declared.iter().enumerate() {
        let Some(id) = present(item.identity()) else {
            continue;
        };
        if let Some(j) = prior
            .iter()
            .position(|p| present(p.identity()) == Some(id))
        {
            matched[i] = Some(j);
            claimed.insert(j);
        }
    }
    // Items with an explicit id never take another one below.
    let explicit: Vec<bool> = declared
        .iter()
        .map(|item| present(item.identity()).is_some())
        .collect();

    // Name match.
    for (i, item) in declared.iter().enumerate() {
        if explicit[i] {
            continue;
        }
        let Some(key) = present(item.natural_key()).map(normalize) else {
            continue;
        };
        let hit = prior.iter().enumerate().find(|(j, p)| {
            !claimed.contains(j)
                && present(p.natural_key()).is_some_and(|k| normalize(k) == key)
        });
        if let Some((j, _)) = hit {
            matched[i] = Some(j);
            claimed.insert(j);
        }
    }

    // Positional fallback.
    for (i, slot) in matched.iter_mut().enumerate() {
        if explicit[i] || slot.is_some() || i >= prior.len() || claimed.contains(&i) {
            continue;
        }
        *slot = Some(i);
        claimed.insert(i);
    }

    matched
}

/// The id to send for a declared item: its own when non-blank, otherwise
/// the matched prior item's. A blank id never overwrites a known one.
pub fn carry_identity(declared: &Field<String>, matched: Option<&String>) -> String {
    declared
        .non_blank()
        .or_else(|| matched.map(|id| id.trim()))
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct Item {
        name: &'static str,
        id: &'static str,
    }

    impl Identified for Item {
        fn natural_key(&self) -> Option<&str> {
            Some(self.name)
        }
        fn identity(&self) -> Option<&str> {
            Some(self.id)
        }
    }

    fn item(name: &'static str, id: &'static str) -> Item {
        Item { name, id }
    }

    #[test]
    fn reordered_items_keep_their_ids() {
        let prior = [item("x", "1"), item("y", "2")];
        let declared = [item("y", ""), item("x", "")];
        assert_eq!(reconcile_identities(&declared, &prior), [Some(1), Some(0)]);
    }

    #[test]
    fn name_match_ignores_case() {
        let prior = [item("Portal", "1")];
        let declared = [item(" portal ", "")];
        assert_eq!(reconcile_identities(&declared, &prior), [Some(0)]);
    }

    #[test]
    fn renamed_item_falls_back_to_position() {
        let prior = [item("old-name", "1"), item("b", "2")];
        let declared = [item("new-name", ""), item("b", "")];
        assert_eq!(reconcile_identities(&declared, &prior), [Some(0), Some(1)]);
    }

    #[test]
    fn positional_fallback_never_reuses_a_claimed_id() {
        // "a" takes prior[1] by name; "z" would fall back to position 1.
        let prior = [item("q", "1"), item("a", "2")];
        let declared = [item("a", ""), item("z", "")];
        assert_eq!(reconcile_identities(&declared, &prior), [Some(1), None]);
    }

    #[test]
    fn explicit_ids_win() {
        let prior = [item("a", "1"), item("b", "2")];
        let declared = [item("b", "1"), item("a", "")];
        // "a" cannot reclaim "1" by name and takes the free slot instead.
        assert_eq!(reconcile_identities(&declared, &prior), [Some(0), Some(1)]);
    }

    #[test]
    fn blank_declared_id_takes_the_matched_one() {
        let known = "11".to_owned();
        assert_eq!(carry_identity(&Field::Value(String::new()), Some(&known)), "11");
        assert_eq!(carry_identity(&Field::Value(" ".into()), Some(&known)), "11");
        assert_eq!(carry_identity(&Field::Null, Some(&known)), "11");
        assert_eq!(carry_identity(&Field::Value("12".into()), Some(&known)), "12");
        assert_eq!(carry_identity(&Field::Value(String::new()), None), "");
    }

    #[test]
    fn new_items_stay_unmatched() {
        let prior = [item("a", "1")];
        let declared = [item("a", ""), item("b", ""), item("c", "")];
        assert_eq!(reconcile_identities(&declared, &prior), [Some(0), None, None]);
    }
}
