//! # Strategic Gaming Duels
//!
//! Adversarial protocols: the solver and a built-in opponent alternate
//! moves over shared world state. The handler validates the solver's move,
//! computes a legal (usually randomized) reply, and declares terminal
//! states; sessions are additionally capped by their question's own
//! `turns` field.

pub mod assiut;
pub mod bee_chase;
pub mod decreasing;
pub mod geo;
pub mod grid_coloring;
pub mod grid_sum;
pub mod knight;
pub mod paper;
pub mod pizza;
pub mod xor_break;
pub mod zigzag;
