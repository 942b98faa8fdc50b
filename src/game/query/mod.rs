//! # Information Query Games
//!
//! Pure-oracle protocols: the hidden state is fixed at session start, and
//! every query is answered honestly as a function of that state. Sessions
//! end when the solver submits an accepted final answer or runs out of
//! rounds.

pub mod bit_compare;
pub mod bit_query;
pub mod circle;
pub mod guess_max;
pub mod impostors;
pub mod legendary_tree;
pub mod linked_list;
pub mod median;
pub mod min_max;
pub mod wordle;
