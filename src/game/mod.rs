//! Game module: rounds, target words and spelling checks

mod round;
mod words;

pub use round::{check_spelling, Game, Round};
#[cfg(test)]
pub use round::RoundPhase;
pub use words::WordList;
