//! # Interface Module
//!
//! This module provides the outward-facing surface of the harness: the
//! command-line definitions and the formatted listing of game offerings.

use colored::Colorize;

use crate::game::KINDS;
use crate::model::Category;

/* MODULES */

pub mod cli;

/* STANDARD OUTPUT API */

/// Prints every supported game kind, grouped by category, optionally
/// restricted to one category.
pub fn print_offerings(category: Option<Category>) {
    let categories = [
        Category::InformationQuery,
        Category::DynamicAdaptation,
        Category::StateOperation,
        Category::StrategicGaming,
    ];

    for group in categories {
        if category.map(|c| c != group).unwrap_or(false) {
            continue;
        }
        println!("{}", group.to_string().bold());
        for kind in KINDS.iter().filter(|k| k.category() == group) {
            println!("  {}", kind.name());
        }
    }
}
