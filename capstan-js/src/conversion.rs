//! Host/interpreter value conversion
//!
//! Values cross the boundary as JSON text via the interpreter's own
//! `JSON.parse`/`JSON.stringify`, staged through a temporary global. This
//! sidesteps hand-written escaping and keeps both directions symmetric.

use boa_engine::{property::PropertyKey, Context as BoaContext, JsString, JsValue, Source};
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::{ScriptError, ScriptResult};

const INPUT_GLOBAL: &str = "__capstan_input_json";
const RESULT_GLOBAL: &str = "__capstan_result";

/// Convert a host JSON value into an interpreter-native value.
pub fn json_to_js(context: &mut BoaContext, value: &JsonValue) -> ScriptResult<JsValue> {
    trace!("converting host value to interpreter value");
    let json_text =
        serde_json::to_string(value).map_err(|e| ScriptError::ValueConversion(e.to_string()))?;

    context
        .global_object()
        .set(
            PropertyKey::from(JsString::from(INPUT_GLOBAL)),
            JsValue::from(JsString::from(json_text.as_str())),
            true,
            context,
        )
        .map_err(|e| ScriptError::ValueConversion(format!("failed to stage input: {e}")))?;

    context
        .eval(Source::from_bytes(&format!(
            "JSON.parse({INPUT_GLOBAL})"
        )))
        .map_err(|e| ScriptError::ValueConversion(format!("failed to parse input JSON: {e}")))
}

/// Convert an interpreter value back into a host JSON value.
///
/// `undefined` maps to JSON null; anything `JSON.stringify` cannot encode
/// (bare functions, symbols) also maps to null.
pub fn js_to_json(context: &mut BoaContext, value: JsValue) -> ScriptResult<JsonValue> {
    if value.is_undefined() {
        return Ok(JsonValue::Null);
    }

    context
        .global_object()
        .set(
            PropertyKey::from(JsString::from(RESULT_GLOBAL)),
            value,
            true,
            context,
        )
        .map_err(|e| ScriptError::ValueConversion(format!("failed to stage result: {e}")))?;

    let stringified = context
        .eval(Source::from_bytes(&format!(
            "JSON.stringify({RESULT_GLOBAL})"
        )))
        .map_err(|e| ScriptError::ValueConversion(format!("failed to stringify result: {e}")))?;

    if stringified.is_undefined() {
        return Ok(JsonValue::Null);
    }

    let json_text = stringified
        .to_string(context)
        .map_err(|e| ScriptError::ValueConversion(e.to_string()))?
        .to_std_string_escaped();

    serde_json::from_str(&json_text).map_err(|e| ScriptError::ValueConversion(e.to_string()))
}

/// Coerce a converted result to a primitive: scalars pass through, objects
/// and arrays are stringified.
pub fn coerce_to_primitive(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Array(_) | JsonValue::Object(_) => JsonValue::String(value.to_string()),
        scalar => scalar,
    }
}
