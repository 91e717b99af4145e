//! Normalization of server transaction records.
//!
//! The API has shipped several shapes for the same record over time
//! (camelCase and PascalCase keys, `category` instead of `categoryName`,
//! textual enum labels in Portuguese or English, amounts as strings). This
//! module is the only place that knows about those variants.
//!
//! Fallbacks are conservative: an unknown type is an expense and an unknown
//! status is pending, so an unrecognized record never inflates the balance
//! or shows up as settled.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::{
    EngineError, MoneyCents, ResultEngine, Transaction, TransactionStatus, TransactionType,
};

const ID_KEYS: &[&str] = &["id", "Id", "ID"];
const DATE_KEYS: &[&str] = &["date", "Date"];
const DESCRIPTION_KEYS: &[&str] = &["description", "Description"];
const CATEGORY_KEYS: &[&str] = &["categoryName", "CategoryName", "category", "Category"];
const TYPE_KEYS: &[&str] = &["type", "Type"];
const AMOUNT_KEYS: &[&str] = &["amount", "Amount"];
const STATUS_KEYS: &[&str] = &["status", "Status"];
const RECURRING_KEYS: &[&str] = &["isRecurring", "IsRecurring"];
const NOTES_KEYS: &[&str] = &["notes", "Notes"];

/// Maps one loosely typed server record into a canonical [`Transaction`].
///
/// Fails only when the record is not an object or carries no usable id.
pub fn canonicalize(record: &Value) -> ResultEngine<Transaction> {
    let Value::Object(fields) = record else {
        return Err(EngineError::MalformedRecord(format!(
            "expected an object, got {}",
            json_kind(record)
        )));
    };

    Ok(Transaction {
        id: id(fields)?,
        date: text(fields, DATE_KEYS),
        description: text(fields, DESCRIPTION_KEYS),
        category_name: text(fields, CATEGORY_KEYS),
        kind: kind(field(fields, TYPE_KEYS)),
        amount: amount(field(fields, AMOUNT_KEYS)),
        status: status(field(fields, STATUS_KEYS)),
        is_recurring: field(fields, RECURRING_KEYS).is_some_and(truthy),
        notes: text(fields, NOTES_KEYS),
    })
}

/// Canonicalizes a whole list response.
///
/// All or nothing: the first record that cannot be canonicalized, or an id
/// seen twice, fails the whole list.
pub fn canonicalize_all(records: &[Value]) -> ResultEngine<Vec<Transaction>> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut out = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let transaction = canonicalize(record).map_err(|err| EngineError::InvalidRecord {
            index,
            source: Box::new(err),
        })?;
        if !seen.insert(transaction.id.clone()) {
            return Err(EngineError::DuplicateId(transaction.id));
        }
        out.push(transaction);
    }

    Ok(out)
}

fn field<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| !value.is_null())
}

fn text(fields: &Map<String, Value>, keys: &[&str]) -> String {
    match field(fields, keys) {
        Some(Value::String(value)) => value.clone(),
        Some(Value::Number(value)) => value.to_string(),
        _ => String::new(),
    }
}

fn id(fields: &Map<String, Value>) -> ResultEngine<String> {
    match field(fields, ID_KEYS) {
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(value.clone()),
        Some(Value::Number(value)) => Ok(value.to_string()),
        _ => Err(EngineError::MissingId),
    }
}

fn amount(value: Option<&Value>) -> MoneyCents {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(raw)) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .and_then(MoneyCents::from_f64)
        .unwrap_or(MoneyCents::ZERO)
}

fn kind(value: Option<&Value>) -> TransactionType {
    match value {
        Some(Value::Number(number)) if number.as_u64() == Some(0) => TransactionType::Income,
        Some(Value::String(label)) => match label.trim().to_lowercase().as_str() {
            "entrada" | "income" => TransactionType::Income,
            _ => TransactionType::Expense,
        },
        _ => TransactionType::Expense,
    }
}

fn status(value: Option<&Value>) -> TransactionStatus {
    match value {
        Some(Value::Number(number)) if number.as_u64() == Some(0) => TransactionStatus::Completed,
        Some(Value::String(label)) => match label.trim().to_lowercase().as_str() {
            "paid" | "completed" | "pago" | "concluída" | "concluida" => {
                TransactionStatus::Completed
            }
            _ => TransactionStatus::Pending,
        },
        _ => TransactionStatus::Pending,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(raw) => {
            let raw = raw.trim();
            !raw.is_empty() && !raw.eq_ignore_ascii_case("false") && raw != "0"
        }
        Value::Array(_) | Value::Object(_) => true,
        Value::Null => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
