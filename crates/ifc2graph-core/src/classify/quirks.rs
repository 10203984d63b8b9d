//! Schema-quirk policies kept apart from the classification algorithm.
//!
//! These rules reproduce behaviour observed on real models whose intent is
//! unclear. They are isolated so they can be tested and revisited alone.

use crate::schema::SelectAlternative;
use crate::source::AttributeValue;

/// Entity classes whose objectified collections stop after the first
/// recovery attempt.
pub const RECOVERY_ABORT_CLASSES: &[&str] = &["IfcPropertySet"];

/// A SELECT mixing entity alternatives with value-like alternatives is
/// treated as an aggregation.
pub fn mixed_select_is_aggregation(alternatives: &[SelectAlternative]) -> bool {
    let has_entity = alternatives.iter().any(SelectAlternative::is_entity);
    let has_value = alternatives.iter().any(|a| !a.is_entity());
    has_entity && has_value
}

/// Whether walking an objectified collection of `class_name` stops after
/// its first recovered element.
pub fn aborts_after_recovery(class_name: &str) -> bool {
    RECOVERY_ABORT_CLASSES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(class_name))
}

/// Whether an element of an aggregated association list is passed over
/// instead of becoming an edge.
///
/// Lists of value selects (`EnumerationValues`, `ListValues`, `RowCells`)
/// classify as aggregations but hold typed scalars, and optional list
/// slots may hold `$`. Nested lists are not skipped.
pub fn skips_list_element(element: &AttributeValue) -> bool {
    !matches!(element, AttributeValue::Entity(_) | AttributeValue::List(_))
}
