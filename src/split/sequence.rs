//! Numbered fill-level sequences (magazines, ammo boxes, firearms)

use std::sync::OnceLock;

use log::warn;
use regex::Regex;

use crate::assets::AssetProvider;
use crate::dmi::DmiState;
use crate::error::Result;
use crate::rsi::RsiState;

/// Held sprites appended to every firearm bundle.
pub const HAND_ASSETS: [&str; 2] = ["inhand-left", "inhand-right"];

/// Sequence flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    Magazine,
    AmmoBox,
    Firearm,
}

fn separated_index() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-_](\d+)$").expect("valid regex"))
}

fn trailing_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)$").expect("valid regex"))
}

/// Fill index of a state name: the number after the last `-` or `_`, else
/// any trailing digits.
///
/// ```
/// use rsikit::split::ammo_index;
///
/// assert_eq!(ammo_index("rifle-10"), Some(10));
/// assert_eq!(ammo_index("mag_3"), Some(3));
/// assert_eq!(ammo_index("box7"), Some(7));
/// assert_eq!(ammo_index("rifle"), None);
/// ```
pub fn ammo_index(name: &str) -> Option<u64> {
    separated_index()
        .captures(name)
        .or_else(|| trailing_digits().captures(name))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn copy_as(state: &DmiState, name: String) -> RsiState {
    RsiState::new(name, state.image.clone())
        .with_directions(state.dirs)
        .with_delays(state.delay.clone())
}

/// Renumber a sequence group. Members are ordered by name, then by fill index.
pub(super) fn synthesize(
    kind: SequenceKind,
    key: &str,
    members: &[&DmiState],
    assets: &dyn AssetProvider,
) -> Result<Option<Vec<RsiState>>> {
    let mut ordered: Vec<&DmiState> = members.to_vec();
    ordered.sort_by(|a, b| a.name.cmp(&b.name));
    ordered.sort_by_key(|s| ammo_index(&s.name));

    let Some(last) = ordered.last() else {
        return Ok(None);
    };

    let mut states: Vec<RsiState> = match kind {
        SequenceKind::Magazine => {
            let mut states: Vec<RsiState> = ordered
                .iter()
                .enumerate()
                .map(|(i, s)| copy_as(s, format!("{}-{}", key, i)))
                .collect();
            states.push(copy_as(last, key.to_string()));
            states
        }
        SequenceKind::AmmoBox | SequenceKind::Firearm => ordered
            .iter()
            .enumerate()
            .map(|(i, s)| match i {
                0 => copy_as(s, key.to_string()),
                _ => copy_as(s, format!("{}-{}", key, i - 1)),
            })
            .collect(),
    };

    if kind == SequenceKind::Firearm {
        for name in HAND_ASSETS {
            match assets.load(name)? {
                Some(image) => states.push(RsiState::new(name, image).with_directions(4)),
                None => warn!("Firearm '{}': reference asset '{}' not found, skipping", key, name),
            }
        }
    }

    Ok(Some(states))
}
