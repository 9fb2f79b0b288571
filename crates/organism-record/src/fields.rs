//! Known organism trait fields

/// Value kind a known field is expected to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Bool,
    Number,
}

/// The organism trait schema, in storage column order.
pub const KNOWN_FIELDS: [(&str, FieldKind); 26] = [
    ("bacteria_id", FieldKind::Text),
    ("name", FieldKind::Text),
    ("superkingdom", FieldKind::Text),
    ("kingdom", FieldKind::Text),
    ("phylum", FieldKind::Text),
    ("class_name", FieldKind::Text),
    ("order", FieldKind::Text),
    ("family", FieldKind::Text),
    ("genus", FieldKind::Text),
    ("species", FieldKind::Text),
    ("strain", FieldKind::Text),
    ("gram_stain", FieldKind::Text),
    ("shape", FieldKind::Text),
    ("mobility", FieldKind::Bool),
    ("flagellar_presence", FieldKind::Bool),
    ("number_of_membranes", FieldKind::Text),
    ("oxygen_preference", FieldKind::Text),
    ("optimal_temperature", FieldKind::Number),
    ("temperature_range", FieldKind::Text),
    ("habitat", FieldKind::Text),
    ("biotic_relationship", FieldKind::Text),
    ("cell_arrangement", FieldKind::Text),
    ("sporulation", FieldKind::Bool),
    ("metabolism", FieldKind::Text),
    ("energy_source", FieldKind::Text),
    ("is_pathogen", FieldKind::Bool),
];

/// Expected kind of a known field, `None` for fields outside the schema
pub fn field_kind(name: &str) -> Option<FieldKind> {
    KNOWN_FIELDS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, kind)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        assert_eq!(field_kind("optimal_temperature"), Some(FieldKind::Number));
        assert_eq!(field_kind("sporulation"), Some(FieldKind::Bool));
        assert_eq!(field_kind("similarity_score"), None);
    }
}
