//! Field descriptors: per-field validation and wire conversion.
//!
//! A model declares its fields as an ordered list of [`FieldDescriptor`]s.
//! Scalar fields hold any JSON value and are stored as-is. Reference fields
//! point at an instance of another model and are stored as that document's
//! `collection/key` id; on the way back in they become a lazily resolving
//! [`ForeignRef`].

use {
    crate::{error::ValidationError, model::CollectionModel, reference::ForeignRef},
    arangodb_client::DocumentId,
    serde_json::Value,
};

/// What a field stores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    Scalar,
    /// Reference to an instance of another model.
    Reference {
        model: &'static str,
        collection: String,
    },
}

/// A field's current value on an instance.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Scalar(Value),
    Reference(ForeignRef),
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            FieldValue::Scalar(value) => Some(value),
            FieldValue::Reference(_) => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ForeignRef> {
        match self {
            FieldValue::Reference(reference) => Some(reference),
            FieldValue::Scalar(_) => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<ForeignRef> for FieldValue {
    fn from(reference: ForeignRef) -> Self {
        FieldValue::Reference(reference)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    field_type: FieldType,
    required: bool,
    default: Option<Value>,
}

impl FieldDescriptor {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Scalar,
            required: false,
            default: None,
        }
    }

    /// A field referencing instances of `M`.
    pub fn reference<M: CollectionModel>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Reference {
                model: M::type_name(),
                collection: M::resolved_collection_name(),
            },
            required: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Value written when the field is left unset. Only applies to scalar fields.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.field_type, FieldType::Reference { .. })
    }

    fn mismatch(&self, model: &str, expected: impl Into<String>) -> ValidationError {
        ValidationError::TypeMismatch {
            model: model.to_string(),
            field: self.name.clone(),
            expected: expected.into(),
        }
    }

    fn expected_reference(&self) -> String {
        match &self.field_type {
            FieldType::Reference { model, .. } => format!("a reference to {}", model),
            FieldType::Scalar => "a scalar value".to_string(),
        }
    }

    /// Check a value against this descriptor. `None` and JSON null both mean unset.
    pub fn validate(&self, model: &str, value: Option<&FieldValue>) -> Result<(), ValidationError> {
        let value = value.filter(|v| !matches!(v, FieldValue::Scalar(Value::Null)));
        match (value, &self.field_type) {
            (None, _) => {
                if self.required && self.default.is_none() {
                    return Err(ValidationError::MissingField {
                        model: model.to_string(),
                        field: self.name.clone(),
                    });
                }
                Ok(())
            }
            (Some(FieldValue::Scalar(_)), FieldType::Scalar) => Ok(()),
            (Some(FieldValue::Reference(reference)), FieldType::Reference { collection, .. }) => {
                match reference.id() {
                    None => Err(ValidationError::UnsavedReference {
                        model: model.to_string(),
                        field: self.name.clone(),
                    }),
                    Some(id) if id.collection() != collection => {
                        Err(self.mismatch(model, self.expected_reference()))
                    }
                    Some(_) => Ok(()),
                }
            }
            (Some(_), _) => Err(self.mismatch(model, self.expected_reference())),
        }
    }

    /// Wire form of a value. Unset scalars become the default or null.
    pub fn serialize(&self, model: &str, value: Option<&FieldValue>) -> Result<Value, ValidationError> {
        match value {
            None => Ok(self.default.clone().unwrap_or(Value::Null)),
            Some(FieldValue::Scalar(value)) => Ok(value.clone()),
            Some(FieldValue::Reference(reference)) => reference
                .id()
                .map(|id| Value::String(id.to_string()))
                .ok_or_else(|| ValidationError::UnsavedReference {
                    model: model.to_string(),
                    field: self.name.clone(),
                }),
        }
    }

    /// Field value from its wire form. Null reads back as unset.
    pub fn deserialize(&self, model: &str, raw: &Value) -> Result<Option<FieldValue>, ValidationError> {
        if raw.is_null() {
            return Ok(None);
        }
        match &self.field_type {
            FieldType::Scalar => Ok(Some(FieldValue::Scalar(raw.clone()))),
            FieldType::Reference { collection, .. } => {
                let id = raw
                    .as_str()
                    .and_then(|s| DocumentId::parse(s).ok())
                    .filter(|id| id.collection() == collection)
                    .ok_or_else(|| self.mismatch(model, self.expected_reference()))?;
                Ok(Some(FieldValue::Reference(ForeignRef::from_id(id))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Author;

    impl CollectionModel for Author {
        fn fields() -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::scalar("name").required()]
        }
    }

    #[test]
    fn required_scalar_must_be_set() {
        let field = FieldDescriptor::scalar("title").required();
        assert_eq!(
            field.validate("Book", None),
            Err(ValidationError::MissingField {
                model: "Book".into(),
                field: "title".into()
            })
        );
        assert!(field
            .validate("Book", Some(&FieldValue::Scalar(Value::Null)))
            .is_err());
        assert!(field.validate("Book", Some(&json!("x").into())).is_ok());
    }

    #[test]
    fn default_satisfies_required() {
        let field = FieldDescriptor::scalar("pages").required().default_value(0);
        assert!(field.validate("Book", None).is_ok());
        assert_eq!(field.serialize("Book", None).unwrap(), json!(0));
    }

    #[test]
    fn optional_scalar_serializes_to_null() {
        let field = FieldDescriptor::scalar("subtitle");
        assert!(field.validate("Book", None).is_ok());
        assert_eq!(field.serialize("Book", None).unwrap(), Value::Null);
    }

    #[test]
    fn reference_carries_target_collection() {
        let field = FieldDescriptor::reference::<Author>("author");
        assert_eq!(
            field.field_type(),
            &FieldType::Reference {
                model: "Author",
                collection: "Author".into()
            }
        );
    }

    #[test]
    fn reference_round_trips_as_id() {
        let field = FieldDescriptor::reference::<Author>("author");
        let value = field
            .deserialize("Book", &json!("Author/100000001"))
            .unwrap()
            .unwrap();
        assert_eq!(
            value.as_reference().and_then(|r| r.id()),
            Some(&DocumentId::new("Author", "100000001"))
        );
        assert_eq!(
            field.serialize("Book", Some(&value)).unwrap(),
            json!("Author/100000001")
        );
    }

    #[test]
    fn reference_into_wrong_collection_is_rejected() {
        let field = FieldDescriptor::reference::<Author>("author");
        assert!(matches!(
            field.deserialize("Book", &json!("Publisher/1")),
            Err(ValidationError::TypeMismatch { .. })
        ));
        assert!(matches!(
            field.deserialize("Book", &json!(12)),
            Err(ValidationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn unsaved_reference_fails_validation() {
        let field = FieldDescriptor::reference::<Author>("author");
        let pending = FieldValue::Reference(ForeignRef::unsaved());
        assert!(matches!(
            field.validate("Book", Some(&pending)),
            Err(ValidationError::UnsavedReference { .. })
        ));
        assert!(field.serialize("Book", Some(&pending)).is_err());
    }

    #[test]
    fn scalar_in_reference_field_is_a_mismatch() {
        let field = FieldDescriptor::reference::<Author>("author");
        assert!(matches!(
            field.validate("Book", Some(&json!(5).into())),
            Err(ValidationError::TypeMismatch { .. })
        ));
    }
}
