use std::collections::HashMap;
use std::hash::Hash;

use super::extractor::FightCandidate;
use super::resolver::EventRef;
use crate::db::store::EventDraft;

/// Last-write-wins dedup that also reports where each input ended up.
///
/// A later item replaces an earlier one with the same key but keeps the
/// earlier item's position. `remap[i]` is the output index holding input `i`'s key.
pub fn dedupe_indexed<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> (Vec<T>, Vec<usize>)
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut out: Vec<T> = Vec::new();
    let mut remap = Vec::new();

    for item in items {
        let k = key(&item);
        match positions.get(&k) {
            Some(&pos) => {
                out[pos] = item;
                remap.push(pos);
            }
            None => {
                positions.insert(k, out.len());
                remap.push(out.len());
                out.push(item);
            }
        }
    }

    (out, remap)
}

pub fn dedupe_by_key<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    dedupe_indexed(items, key).0
}

/// Order-sensitive: A-vs-B and B-vs-A are different fights.
pub fn fight_key(fight: &FightCandidate) -> (EventRef, String, String) {
    (fight.target, fight.fighter_a_name.clone(), fight.fighter_b_name.clone())
}

pub fn dedupe_fights(fights: impl IntoIterator<Item = FightCandidate>) -> Vec<FightCandidate> {
    dedupe_by_key(fights, fight_key)
}

/// Dedup drafts by `(normalized name, day)` before any of them is created.
pub fn dedupe_drafts(drafts: impl IntoIterator<Item = EventDraft>) -> (Vec<EventDraft>, Vec<usize>) {
    dedupe_indexed(drafts, EventDraft::natural_key)
}
