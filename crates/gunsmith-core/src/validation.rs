//! Schema-driven validation of configuration objects.
//!
//! Each configuration type describes its fields through [`Schema`]: a
//! declaration-ordered table of field name, [`Presence`], and current
//! [`FieldValue`]. [`validate`] is the single generic walker over those
//! tables.
//!
//! # Walk rules
//!
//! - Fields tagged [`Presence::Optional`] or [`Presence::Ignored`] are
//!   skipped entirely, including any nested fields they hold.
//! - A required field that is [`FieldValue::Absent`] fails immediately with
//!   [`ValidationError::MissingField`]; later siblings are not checked.
//! - A required [`FieldValue::Composite`] is walked recursively and a
//!   failure inside it propagates.
//! - Every required field of an object is visited, composite or not. A
//!   valid composite does not end the walk of its parent.

/// How the validator treats a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must hold a value; composites are walked.
    Required,
    /// May be absent; never inspected.
    Optional,
    /// Excluded from validation.
    Ignored,
}

/// The current value of a field, as seen by the validator.
#[derive(Clone, Copy)]
pub enum FieldValue<'a> {
    /// Unset.
    Absent,
    /// A set primitive, string, identifier, or enum.
    Leaf,
    /// A set nested object.
    Composite(&'a dyn Schema),
}

impl<'a> FieldValue<'a> {
    /// A leaf that may be unset.
    pub fn leaf_opt<T>(value: &Option<T>) -> Self {
        match value {
            Some(_) => FieldValue::Leaf,
            None => FieldValue::Absent,
        }
    }

    /// A nested object that may be unset.
    pub fn composite_opt<T: Schema>(value: Option<&'a T>) -> Self {
        match value {
            Some(v) => FieldValue::Composite(v),
            None => FieldValue::Absent,
        }
    }
}

/// One row of a schema table.
#[derive(Clone, Copy)]
pub struct Field<'a> {
    pub name: &'static str,
    pub presence: Presence,
    pub value: FieldValue<'a>,
}

impl<'a> Field<'a> {
    pub fn required(name: &'static str, value: FieldValue<'a>) -> Self {
        Self {
            name,
            presence: Presence::Required,
            value,
        }
    }

    pub fn optional(name: &'static str, value: FieldValue<'a>) -> Self {
        Self {
            name,
            presence: Presence::Optional,
            value,
        }
    }

    pub fn ignored(name: &'static str, value: FieldValue<'a>) -> Self {
        Self {
            name,
            presence: Presence::Ignored,
            value,
        }
    }
}

/// A configuration type that exposes its fields to the validator.
pub trait Schema {
    /// Fields in declaration order.
    fn fields(&self) -> Vec<Field<'_>>;
}

/// A required field was unset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required property: {field}")]
    MissingField { field: &'static str },
}

/// Walk `object`'s schema and report the first unset required field.
pub fn validate(object: &dyn Schema) -> Result<(), ValidationError> {
    for field in object.fields() {
        if field.presence != Presence::Required {
            continue;
        }
        match field.value {
            FieldValue::Absent => {
                return Err(ValidationError::MissingField { field: field.name });
            }
            FieldValue::Leaf => {}
            FieldValue::Composite(inner) => validate(inner)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inner {
        a: Option<u32>,
        b: Option<u32>,
    }

    impl Schema for Inner {
        fn fields(&self) -> Vec<Field<'_>> {
            vec![
                Field::required("a", FieldValue::leaf_opt(&self.a)),
                Field::required("b", FieldValue::leaf_opt(&self.b)),
            ]
        }
    }

    struct Outer {
        first: Inner,
        skipped: Option<Inner>,
        second: Inner,
        note: Option<String>,
        tail: Option<u32>,
    }

    impl Schema for Outer {
        fn fields(&self) -> Vec<Field<'_>> {
            vec![
                Field::required("first", FieldValue::Composite(&self.first)),
                Field::optional("skipped", FieldValue::composite_opt(self.skipped.as_ref())),
                Field::required("second", FieldValue::Composite(&self.second)),
                Field::ignored("note", FieldValue::leaf_opt(&self.note)),
                Field::required("tail", FieldValue::leaf_opt(&self.tail)),
            ]
        }
    }

    fn full() -> Inner {
        Inner {
            a: Some(1),
            b: Some(2),
        }
    }

    fn outer() -> Outer {
        Outer {
            first: full(),
            skipped: None,
            second: full(),
            note: None,
            tail: Some(0),
        }
    }

    #[test]
    fn complete_object_passes() {
        assert_eq!(validate(&outer()), Ok(()));
    }

    #[test]
    fn missing_leaf_reported_by_name() {
        let mut o = outer();
        o.first.b = None;
        assert_eq!(
            validate(&o),
            Err(ValidationError::MissingField { field: "b" })
        );
    }

    #[test]
    fn first_missing_field_wins() {
        let mut o = outer();
        o.first.a = None;
        o.first.b = None;
        o.tail = None;
        assert_eq!(
            validate(&o),
            Err(ValidationError::MissingField { field: "a" })
        );
    }

    #[test]
    fn valid_first_composite_does_not_end_walk() {
        let mut o = outer();
        o.second.a = None;
        assert_eq!(
            validate(&o),
            Err(ValidationError::MissingField { field: "a" })
        );

        let mut o = outer();
        o.tail = None;
        assert_eq!(
            validate(&o),
            Err(ValidationError::MissingField { field: "tail" })
        );
    }

    #[test]
    fn optional_composites_are_not_walked() {
        let mut o = outer();
        o.skipped = Some(Inner { a: None, b: None });
        assert_eq!(validate(&o), Ok(()));
    }

    #[test]
    fn ignored_fields_may_be_absent() {
        let o = outer();
        assert!(o.note.is_none());
        assert_eq!(validate(&o), Ok(()));
    }
}
