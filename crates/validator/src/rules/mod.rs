//! Built-in rules
//!
//! Each submodule exposes the pure test functions for one rule family and a
//! factory turning [`RuleOptions`](crate::RuleOptions) into compiled
//! [`Rule`](crate::Rule)s. Factories validate their options eagerly so a
//! misconfigured schema fails when the validator is built.
//!
//! | name           | module                         |
//! |----------------|--------------------------------|
//! | `presence`     | [`presence`]                   |
//! | `absence`      | [`presence`]                   |
//! | `acceptance`   | [`membership`]                 |
//! | `length`       | [`length`]                     |
//! | `format`       | [`format`]                     |
//! | `inclusion`    | [`membership`]                 |
//! | `exclusion`    | [`membership`]                 |
//! | `confirmation` | [`confirmation`]               |
//! | `date`         | [`date`]                       |
//! | `numericality` | [`numeric`]                    |

pub mod confirmation;
pub mod date;
pub mod format;
pub mod length;
pub mod membership;
pub mod numeric;
pub mod presence;

use crate::registry::RuleRegistry;

/// Names of the built-in rules, in registration order.
pub const BUILTIN_RULES: &[&str] = &[
    "presence",
    "absence",
    "acceptance",
    "length",
    "format",
    "inclusion",
    "exclusion",
    "confirmation",
    "date",
    "numericality",
];

pub(crate) fn register_defaults(registry: &mut RuleRegistry) {
    registry
        .register("presence", presence::presence)
        .register("absence", presence::absence)
        .register("acceptance", membership::acceptance)
        .register("length", length::length)
        .register("format", format::format)
        .register("inclusion", membership::inclusion)
        .register("exclusion", membership::exclusion)
        .register("confirmation", confirmation::confirmation)
        .register("date", date::date)
        .register("numericality", numeric::numericality);
}
