//! Schema checks for incoming lead payloads.
//!
//! Validation is pure: it walks the JSON body, collects every field-level
//! problem, and only hands back a [`NewUser`] when nothing failed.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::users::repo_types::{CarDetails, NewUser};

/// Wire name first, then accepted aliases.
type Field = &'static [&'static str];

const NAME: Field = &["name"];
const PREFERRED_LANGUAGE: Field = &["preferredLanguage", "preferredlanguage"];
const INTEREST_SCORE: Field = &["interestScore"];
const SENTIMENT: Field = &["sentiment", "Sentiment"];
const PHONE_NUMBER: Field = &["phoneNumber"];
const CALL_DURATION: Field = &["callDuration", "callduration"];
const CAR_DETAILS: Field = &["carDetails", "car_details"];

const CAR_FIELDS: [&str; 4] = ["manufacturer", "model", "variant", "year"];

const INTEREST_MIN: i64 = 1;
const INTEREST_MAX: i64 = 10;
const CALL_DURATION_MIN: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.0))]
pub struct ValidationErrors(pub Vec<FieldIssue>);

impl ValidationErrors {
    pub fn issues(&self) -> &[FieldIssue] {
        &self.0
    }

    #[cfg(test)]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|i| i.field == field)
    }
}

fn render(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.field, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check a create-user body and normalize it into a [`NewUser`].
pub fn validate_new_user(body: &Value) -> Result<NewUser, ValidationErrors> {
    let Some(obj) = body.as_object() else {
        return Err(ValidationErrors(vec![FieldIssue {
            field: "body".into(),
            message: "expected a JSON object".into(),
        }]));
    };

    let mut check = Checker::new(obj);
    let name = check.text(NAME);
    let preferred_language = check.text(PREFERRED_LANGUAGE);
    let interest_score = check.int(INTEREST_SCORE, INTEREST_MIN, INTEREST_MAX);
    let sentiment = check.text(SENTIMENT);
    let phone_number = check.text(PHONE_NUMBER);
    let call_duration = check.int(CALL_DURATION, CALL_DURATION_MIN, i64::from(i32::MAX));
    let car_details = check.car_details(CAR_DETAILS);

    if !check.issues.is_empty() {
        return Err(ValidationErrors(check.issues));
    }

    match (
        name,
        preferred_language,
        interest_score,
        sentiment,
        phone_number,
        call_duration,
        car_details,
    ) {
        (
            Some(name),
            Some(preferred_language),
            Some(interest_score),
            Some(sentiment),
            Some(phone_number),
            Some(call_duration),
            Some(car_details),
        ) => Ok(NewUser {
            name,
            preferred_language,
            interest_score,
            sentiment,
            phone_number,
            call_duration,
            car_details,
        }),
        // unreachable while every None above pushes an issue
        _ => Err(ValidationErrors(vec![FieldIssue {
            field: "body".into(),
            message: "invalid user payload".into(),
        }])),
    }
}

struct Checker<'a> {
    body: &'a Map<String, Value>,
    issues: Vec<FieldIssue>,
}

impl<'a> Checker<'a> {
    fn new(body: &'a Map<String, Value>) -> Self {
        Self {
            body,
            issues: Vec::new(),
        }
    }

    fn lookup(&self, field: Field) -> Option<&'a Value> {
        let body = self.body;
        field
            .iter()
            .find_map(|k| body.get(*k).filter(|v| !v.is_null()))
    }

    fn fail(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    fn text(&mut self, field: Field) -> Option<String> {
        let key = field[0];
        match self.lookup(field) {
            None => {
                self.fail(key, "is required");
                None
            }
            Some(Value::String(s)) if s.is_empty() => {
                self.fail(key, "must contain at least 1 character");
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.fail(key, "expected a string");
                None
            }
        }
    }

    fn int(&mut self, field: Field, min: i64, max: i64) -> Option<i32> {
        let key = field[0];
        let n = match self.lookup(field) {
            None => {
                self.fail(key, "is required");
                return None;
            }
            Some(Value::Number(n)) => n,
            Some(_) => {
                self.fail(key, "expected a number");
                return None;
            }
        };

        let v = match n.as_i64() {
            Some(v) => v,
            None if n.is_u64() => {
                self.fail(key, format!("must be at most {max}"));
                return None;
            }
            // exponent or trailing-zero forms like 1e1 or 3.0 arrive as f64
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 => {
                    if f < min as f64 {
                        self.fail(key, format!("must be at least {min}"));
                        return None;
                    }
                    if f > max as f64 {
                        self.fail(key, format!("must be at most {max}"));
                        return None;
                    }
                    f as i64
                }
                _ => {
                    self.fail(key, "expected an integer");
                    return None;
                }
            },
        };
        if v < min {
            self.fail(key, format!("must be at least {min}"));
            return None;
        }
        if v > max {
            self.fail(key, format!("must be at most {max}"));
            return None;
        }
        match i32::try_from(v) {
            Ok(v) => Some(v),
            Err(_) => {
                self.fail(key, format!("must be at most {}", i32::MAX));
                None
            }
        }
    }

    /// Outer `None` means the field failed; `Some(None)` means it was absent.
    fn car_details(&mut self, field: Field) -> Option<Option<CarDetails>> {
        let key = field[0];
        match self.lookup(field) {
            None => Some(None),
            Some(Value::Object(obj)) => self.car_object(key, obj).map(Some),
            Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(obj)) => self.car_object(key, &obj).map(Some),
                _ => {
                    self.fail(
                        key,
                        "must be a valid JSON string with manufacturer, model, variant, and year",
                    );
                    None
                }
            },
            Some(_) => {
                self.fail(key, "expected an object or a JSON string");
                None
            }
        }
    }

    fn car_object(&mut self, key: &str, obj: &Map<String, Value>) -> Option<CarDetails> {
        let before = self.issues.len();
        let values = CAR_FIELDS.map(|name| {
            let path = format!("{key}.{name}");
            match obj.get(name) {
                None | Some(Value::Null) => {
                    self.fail(path, "is required");
                    String::new()
                }
                Some(Value::String(s)) if s.is_empty() => {
                    self.fail(path, "must contain at least 1 character");
                    String::new()
                }
                Some(Value::String(s)) => s.clone(),
                Some(_) => {
                    self.fail(path, "expected a string");
                    String::new()
                }
            }
        });
        if self.issues.len() != before {
            return None;
        }
        let [manufacturer, model, variant, year] = values;
        Some(CarDetails {
            manufacturer,
            model,
            variant,
            year,
        })
    }
}
