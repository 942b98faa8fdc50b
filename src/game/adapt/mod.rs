//! # Dynamic Adaptation Games
//!
//! Protocols whose hidden state evolves in response to play: passwords that
//! drift on wrong guesses, oracles that lie under bounded-window truth
//! constraints, and objects that transform between queries. Correctness is
//! always judged against the state at the moment of the move.

pub mod attendance;
pub mod drift;
pub mod hidden_number;
pub mod mahjong;
pub mod mimic;
pub mod permutation;
pub mod popcount;
pub mod rotary;
pub mod train;
pub mod zero_finding;
