/*
 * map.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The `map` and `template` filters, backed by the restricted
//! mini-expression language in [`crate::expr`].

use serde_json::Value;

use crate::expr::{ArrowExpr, TemplateLit};
use crate::value::Carry;

/// `map:item => item.name` — transform every element of an array through
/// an arrow expression. Expressions outside the accepted shapes, and
/// non-array carries, pass the value through unchanged.
pub fn map(carry: Carry, raw: &str) -> Carry {
    let arrow = match ArrowExpr::parse(raw.trim()) {
        Ok(arrow) => arrow,
        Err(error) => {
            tracing::debug!(%error, "map expression rejected, passing value through");
            return carry;
        }
    };
    let Some(items) = carry.as_array() else {
        return carry;
    };
    let mapped: Vec<Value> = items.iter().map(|item| arrow.apply(item)).collect();
    Carry::Json(Value::Array(mapped))
}

/// `template:"- ${title}\n"` — expand a template literal per element of
/// an array (concatenating the results), or once against an object.
pub fn template(carry: Carry, raw: &str) -> Carry {
    let lit = match TemplateLit::parse(raw) {
        Ok(lit) => lit,
        Err(error) => {
            tracing::debug!(%error, "template literal rejected, passing value through");
            return carry;
        }
    };
    match carry.to_value() {
        Value::Array(items) => {
            let out: String = items.iter().map(|item| lit.expand(item, None)).collect();
            Carry::Str(out)
        }
        single => Carry::Str(lit.expand(&single, None)),
    }
}
