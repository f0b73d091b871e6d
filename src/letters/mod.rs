//! Spoken letter vocabulary
//!
//! Maps what the recognizer hears ("efe", "dáblio", "confirmar") onto
//! canonical letters and the two control commands of a spelling round.

mod map;

pub use map::{LetterMap, SpokenToken};
