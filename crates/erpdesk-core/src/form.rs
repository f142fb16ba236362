// ── Form specs, validation and derived-state rules ──
//
// A form is a flat JSON object keyed by backend field names. Local
// rules run before any backend call; derived rules run on every field
// change and keep coupled fields consistent.

use erpdesk_api::FieldErrors;
use serde_json::{Map, Value};

use crate::model::display_value;
use crate::resource::OptionSource;

/// Input widget for one field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text,
    Number,
    /// `YYYY-MM-DD`.
    Date,
    Choice(OptionSource),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn text(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Text,
        }
    }

    pub const fn number(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Number,
        }
    }

    pub const fn date(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Date,
        }
    }

    pub const fn choice(key: &'static str, label: &'static str, source: OptionSource) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Choice(source),
        }
    }
}

/// Constraint checked locally before submission.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    Required {
        field: &'static str,
        message: &'static str,
    },
    /// At most `max` characters.
    MaxLen {
        field: &'static str,
        max: usize,
        message: &'static str,
    },
    /// Two selector fields that must not hold the same value.
    /// The error is reported against `first`.
    Distinct {
        first: &'static str,
        second: &'static str,
        message: &'static str,
    },
}

/// Rule keeping one field a function of another.
#[derive(Debug, Clone, Copy)]
pub enum DerivedRule {
    /// While `trigger == equals`, `target` is pinned to `value`.
    PinWhen {
        trigger: &'static str,
        equals: &'static str,
        target: &'static str,
        value: &'static str,
    },
    /// When `trigger` is switched to `equals`, `target` is cleared once.
    ClearOnSwitch {
        trigger: &'static str,
        equals: &'static str,
        target: &'static str,
    },
}

/// Where a save goes.
#[derive(Debug, Clone, Copy)]
pub enum Submit {
    /// `POST {endpoint}` to create, `PATCH {endpoint}{id}/` to update.
    Collection(&'static str),
    /// `POST {path}` regardless of mode.
    Action(&'static str),
}

#[derive(Debug)]
pub struct FormSpec {
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
    pub rules: &'static [Rule],
    pub derived: &'static [DerivedRule],
    pub submit: Submit,
}

impl FormSpec {
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Empty draft with every field present, derived rules applied.
    pub fn blank(&self) -> Map<String, Value> {
        let mut draft: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.key.to_owned(), Value::String(String::new())))
            .collect();
        self.apply_derived(&mut draft, None);
        draft
    }

    /// Draft seeded from a record snapshot: form fields only.
    pub fn draft_from(&self, record: &Map<String, Value>) -> Map<String, Value> {
        let mut draft: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| {
                let value = record
                    .get(f.key)
                    .cloned()
                    .unwrap_or_else(|| Value::String(String::new()));
                (f.key.to_owned(), value)
            })
            .collect();
        self.apply_derived(&mut draft, None);
        draft
    }

    /// Re-evaluate derived rules after `changed` was edited.
    ///
    /// `None` means "initial evaluation": pins apply, one-shot clears do not.
    pub fn apply_derived(&self, draft: &mut Map<String, Value>, changed: Option<&str>) {
        for rule in self.derived {
            match *rule {
                DerivedRule::PinWhen {
                    trigger,
                    equals,
                    target,
                    value,
                } => {
                    if text(draft, trigger) == equals {
                        draft.insert(target.to_owned(), Value::String(value.to_owned()));
                    }
                }
                DerivedRule::ClearOnSwitch {
                    trigger,
                    equals,
                    target,
                } => {
                    if changed == Some(trigger) && text(draft, trigger) == equals {
                        draft.insert(target.to_owned(), Value::String(String::new()));
                    }
                }
            }
        }
    }

    /// Check every local rule. All failures are collected, not just the first.
    pub fn validate(&self, draft: &Map<String, Value>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        let mut fail = |field: &str, message: &str| {
            errors
                .0
                .entry(field.to_owned())
                .or_default()
                .push(message.to_owned());
        };

        for rule in self.rules {
            match *rule {
                Rule::Required { field, message } => {
                    if text(draft, field).trim().is_empty() {
                        fail(field, message);
                    }
                }
                Rule::MaxLen {
                    field,
                    max,
                    message,
                } => {
                    if text(draft, field).trim().chars().count() > max {
                        fail(field, message);
                    }
                }
                Rule::Distinct {
                    first,
                    second,
                    message,
                } => {
                    let a = text(draft, first);
                    let b = text(draft, second);
                    if !a.is_empty() && a.trim() == b.trim() {
                        fail(first, message);
                    }
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Body sent to the backend: form fields only, empty strings as null.
    pub fn payload(&self, draft: &Map<String, Value>) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|f| {
                    let value = match draft.get(f.key) {
                        None => Value::Null,
                        Some(Value::String(s)) if s.trim().is_empty() => Value::Null,
                        Some(Value::String(s)) => Value::String(s.trim().to_owned()),
                        Some(other) => other.clone(),
                    };
                    (f.key.to_owned(), value)
                })
                .collect(),
        )
    }
}

fn text(draft: &Map<String, Value>, field: &str) -> String {
    draft.get(field).map(display_value).unwrap_or_default()
}
