use crate::config::FormConfig;
use crate::error::{FormError, Result};
use crate::key_codec::{KeyRole, encode};
use crate::marks::{Marks, build_marks_capped};
use crate::schema::{DateRange, Schema};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Form key of the date range control
pub const RANGE_FIELD_KEY: &str = "date_range";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    Category,
    Identifier,
    Text,
    Range,
}

impl From<KeyRole> for FieldRole {
    fn from(role: KeyRole) -> Self {
        match role {
            KeyRole::Category => FieldRole::Category,
            KeyRole::Identifier => FieldRole::Identifier,
            KeyRole::Text => FieldRole::Text,
        }
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldRole::Category => "category",
            FieldRole::Identifier => "identifier",
            FieldRole::Text => "text",
            FieldRole::Range => "range",
        };
        f.pad(name)
    }
}

/// One renderable input control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub key: String,
    pub role: FieldRole,
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Marks>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<DateRange>,
}

impl FieldDescriptor {
    fn keyed(role: KeyRole, name: &str) -> Result<Self> {
        Ok(Self {
            key: encode(role, name)?.into_string(),
            role: role.into(),
            label: name.to_string(),
            options: None,
            marks: None,
            bounds: None,
        })
    }
}

/// Category selectors, one per category field in schema order
pub fn render_category_fields(schema: &Schema) -> Result<Vec<FieldDescriptor>> {
    schema
        .category_fields
        .iter()
        .map(|(name, categories)| {
            let mut field = FieldDescriptor::keyed(KeyRole::Category, name)?;
            field.options = Some(categories.clone());
            Ok(field)
        })
        .collect()
}

/// Identifier inputs followed by text inputs, each in schema order
pub fn render_auxiliary_fields(schema: &Schema) -> Result<Vec<FieldDescriptor>> {
    let identifiers = schema
        .identifier_fields
        .iter()
        .map(|name| FieldDescriptor::keyed(KeyRole::Identifier, name));
    let texts = schema
        .text_fields
        .iter()
        .map(|name| FieldDescriptor::keyed(KeyRole::Text, name));
    identifiers.chain(texts).collect()
}

pub fn render_range_field(schema: &Schema, config: &FormConfig) -> FieldDescriptor {
    FieldDescriptor {
        key: RANGE_FIELD_KEY.to_string(),
        role: FieldRole::Range,
        label: config.range_label.clone(),
        options: None,
        marks: Some(build_marks_capped(schema.date_range, config.max_range_marks)),
        bounds: schema.date_range,
    }
}

/// Ordered descriptors for one schema generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet(Vec<FieldDescriptor>);

impl FieldSet {
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&FieldDescriptor> {
        self.0.iter().find(|field| field.key == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn by_role(&self, role: FieldRole) -> impl Iterator<Item = &FieldDescriptor> {
        self.0.iter().filter(move |field| field.role == role)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Build the full field set for `schema`: range control, category selectors,
/// then identifier and text inputs.
pub fn synthesize(schema: &Schema, config: &FormConfig) -> Result<FieldSet> {
    let mut fields = vec![render_range_field(schema, config)];
    fields.extend(render_category_fields(schema)?);
    fields.extend(render_auxiliary_fields(schema)?);

    let mut seen = HashSet::with_capacity(fields.len());
    for field in &fields {
        if !seen.insert(field.key.as_str()) {
            return Err(FormError::DuplicateFieldKey {
                key: field.key.clone(),
            });
        }
    }

    debug!("Synthesized {} fields", fields.len());
    Ok(FieldSet(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_schema() -> Schema {
        Schema::from_json_str(
            r#"{
                "cate_fields_detail": {"major": ["CS", "EE"], "level": ["national"]},
                "id_fields": ["student_id", "project_no"],
                "text_fields": ["advisor"],
                "date_range": [2019, 2021]
            }"#,
        )
        .unwrap()
    }

    fn keys(fields: &[FieldDescriptor]) -> Vec<&str> {
        fields.iter().map(|f| f.key.as_str()).collect()
    }

    #[test]
    fn test_category_fields_follow_schema_order() {
        let fields = render_category_fields(&sample_schema()).unwrap();
        assert_eq!(keys(&fields), vec!["cateField-major", "cateField-level"]);
        assert_eq!(fields[0].role, FieldRole::Category);
        assert_eq!(fields[0].label, "major");
        assert_eq!(fields[0].options, Some(vec!["CS".to_string(), "EE".to_string()]));
        assert_eq!(fields[0].marks, None);
    }

    #[test]
    fn test_auxiliary_fields_identifiers_first() {
        let fields = render_auxiliary_fields(&sample_schema()).unwrap();
        assert_eq!(
            keys(&fields),
            vec!["idField-student_id", "idField-project_no", "textField-advisor"]
        );
        let roles: Vec<FieldRole> = fields.iter().map(|f| f.role).collect();
        assert_eq!(roles, vec![FieldRole::Identifier, FieldRole::Identifier, FieldRole::Text]);
        assert!(fields.iter().all(|f| f.options.is_none()));
    }

    fn year_config() -> FormConfig {
        FormConfig {
            range_label: "Year".to_string(),
            ..FormConfig::default()
        }
    }

    #[test]
    fn test_range_field() {
        let field = render_range_field(&sample_schema(), &year_config());
        assert_eq!(field.key, RANGE_FIELD_KEY);
        assert_eq!(field.label, "Year");
        assert_eq!(field.bounds, Some(DateRange::new(2019, 2021)));
        assert_eq!(field.marks.as_ref().map(Marks::len), Some(3));

        let empty = render_range_field(&Schema::default(), &year_config());
        assert_eq!(empty.bounds, None);
        assert_eq!(empty.marks, Some(Marks::new()));
    }

    #[test]
    fn test_range_field_wider_than_cap_keeps_bounds_only() {
        let config = FormConfig {
            max_range_marks: 2,
            ..year_config()
        };
        let field = render_range_field(&sample_schema(), &config);
        assert_eq!(field.bounds, Some(DateRange::new(2019, 2021)));
        assert_eq!(field.marks, Some(Marks::new()));
    }

    #[test]
    fn test_synthesize_orders_all_fields() {
        let set = synthesize(&sample_schema(), &FormConfig::default()).unwrap();
        assert_eq!(
            keys(set.fields()),
            vec![
                "date_range",
                "cateField-major",
                "cateField-level",
                "idField-student_id",
                "idField-project_no",
                "textField-advisor",
            ]
        );
        assert_eq!(set.by_role(FieldRole::Identifier).count(), 2);
        assert!(set.contains_key("textField-advisor"));
        assert_eq!(set.get("date_range").map(|f| f.label.as_str()), Some("Date range"));
    }

    #[test]
    fn test_same_name_in_different_roles_is_allowed() {
        let schema = Schema {
            identifier_fields: vec!["code".to_string()],
            text_fields: vec!["code".to_string()],
            ..Schema::default()
        };
        let set = synthesize(&schema, &FormConfig::default()).unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let schema = Schema {
            text_fields: vec!["advisor".to_string(), "advisor".to_string()],
            ..Schema::default()
        };
        let err = synthesize(&schema, &FormConfig::default()).unwrap_err();
        assert!(matches!(err, FormError::DuplicateFieldKey { ref key } if key == "textField-advisor"));
    }

    #[test]
    fn test_delimiter_in_field_name_fails_synthesis() {
        let schema = Schema {
            identifier_fields: vec!["student-id".to_string()],
            ..Schema::default()
        };
        assert!(matches!(
            synthesize(&schema, &FormConfig::default()),
            Err(FormError::InvalidFieldName { .. })
        ));
    }
}
