//! Boundary validation of solve requests.
//!
//! Walks the raw JSON body once and produces either a fully typed
//! [`ValidatedInstance`] or every field-level problem found. Entries with a
//! blank name and blank slot labels are dropped rather than rejected; if that
//! leaves a collection empty, `model::build` refuses the instance.

use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::config::Limits;
use crate::data::{Group, Parameters, Room, Slot, ValidatedInstance};

pub type ValidationResult = Result<ValidatedInstance, Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    /// Path-prefixed description, e.g. `rooms[1].capacity: ...`.
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Field absent where it is required.
    Missing,
    /// Field present with the wrong JSON type.
    WrongType,
    /// Numeric value or collection length outside the accepted bounds.
    OutOfRange,
    /// Two rooms or two groups share a name.
    DuplicateName,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a request body against `limits`, falling back to
/// `default_slots` when the request brings no usable slot.
pub fn validate_request(body: &Value, limits: &Limits, default_slots: &[Slot]) -> ValidationResult {
    let mut errors = Vec::new();

    let Some(obj) = body.as_object() else {
        return Err(vec![ValidationError::new(
            ValidationErrorKind::WrongType,
            "body: must be a JSON object",
        )]);
    };

    let rooms = named_entries(obj, "rooms", "capacity", limits.max_rooms, limits.max_capacity, &mut errors)
        .into_iter()
        .map(|(name, capacity)| Room { name, capacity })
        .collect::<Vec<_>>();
    let groups = named_entries(obj, "groups", "size", limits.max_groups, limits.max_group_size, &mut errors)
        .into_iter()
        .map(|(name, size)| Group { name, size })
        .collect::<Vec<_>>();

    let mut slots = slot_labels(obj, limits.max_slots, &mut errors);
    if slots.is_empty() {
        slots = default_slots
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }

    let parameters = parameters(obj, &mut errors);

    if errors.is_empty() {
        Ok(ValidatedInstance {
            rooms,
            groups,
            slots,
            parameters,
        })
    } else {
        Err(errors)
    }
}

// shared shape of rooms and groups: [{"name": str, <number_field>: int}]
fn named_entries(
    obj: &Map<String, Value>,
    field: &str,
    number_field: &str,
    max_len: usize,
    max_value: u32,
    errors: &mut Vec<ValidationError>,
) -> Vec<(String, u32)> {
    let Some(value) = obj.get(field) else {
        errors.push(ValidationError::new(
            ValidationErrorKind::Missing,
            format!("{field}: field is required"),
        ));
        return Vec::new();
    };
    let Some(items) = value.as_array() else {
        errors.push(ValidationError::new(
            ValidationErrorKind::WrongType,
            format!("{field}: must be an array"),
        ));
        return Vec::new();
    };
    if items.len() > max_len {
        errors.push(ValidationError::new(
            ValidationErrorKind::OutOfRange,
            format!("{field}: at most {max_len} entries are allowed, got {}", items.len()),
        ));
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Some(entry) = item.as_object() else {
            errors.push(ValidationError::new(
                ValidationErrorKind::WrongType,
                format!("{field}[{i}]: must be an object"),
            ));
            continue;
        };

        // nameless rows are form leftovers, not errors
        let name = match entry.get("name") {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) if s.trim().is_empty() => continue,
            Some(Value::String(s)) => s.trim().to_string(),
            Some(_) => {
                errors.push(ValidationError::new(
                    ValidationErrorKind::WrongType,
                    format!("{field}[{i}].name: must be a string"),
                ));
                continue;
            }
        };

        let number = entry
            .get(number_field)
            .and_then(Value::as_u64)
            .filter(|n| (1..=u64::from(max_value)).contains(n));
        let Some(number) = number else {
            errors.push(ValidationError::new(
                ValidationErrorKind::OutOfRange,
                format!("{field}[{i}].{number_field}: '{name}' needs an integer between 1 and {max_value}"),
            ));
            continue;
        };

        if !seen.insert(name.clone()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateName,
                format!("{field}[{i}].name: '{name}' is used more than once"),
            ));
            continue;
        }
        // bounded by max_value, which is a u32
        entries.push((name, number as u32));
    }
    entries
}

fn slot_labels(obj: &Map<String, Value>, max_len: usize, errors: &mut Vec<ValidationError>) -> Vec<Slot> {
    let items = match obj.get("slots") {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            errors.push(ValidationError::new(
                ValidationErrorKind::WrongType,
                "slots: must be an array of strings",
            ));
            return Vec::new();
        }
    };
    if items.len() > max_len {
        errors.push(ValidationError::new(
            ValidationErrorKind::OutOfRange,
            format!("slots: at most {max_len} entries are allowed, got {}", items.len()),
        ));
        return Vec::new();
    }
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parameters(obj: &Map<String, Value>, errors: &mut Vec<ValidationError>) -> Parameters {
    let mut params = Parameters::default();
    let entry = match obj.get("parameters") {
        None | Some(Value::Null) => return params,
        Some(Value::Object(entry)) => entry,
        Some(_) => {
            errors.push(ValidationError::new(
                ValidationErrorKind::WrongType,
                "parameters: must be an object",
            ));
            return params;
        }
    };

    match entry.get("delta") {
        None | Some(Value::Null) => {}
        Some(v) => match v.as_f64() {
            Some(delta) if (0.0..=1.0).contains(&delta) => params.delta = delta,
            _ => errors.push(ValidationError::new(
                ValidationErrorKind::OutOfRange,
                "parameters.delta: must be a number between 0 and 1",
            )),
        },
    }
    match entry.get("lambda") {
        None | Some(Value::Null) => {}
        Some(v) => match v.as_f64() {
            Some(lambda) if lambda.is_finite() && lambda >= 0.0 => params.lambda_penalty = lambda,
            _ => errors.push(ValidationError::new(
                ValidationErrorKind::OutOfRange,
                "parameters.lambda: must be a non-negative number",
            )),
        },
    }
    params
}
