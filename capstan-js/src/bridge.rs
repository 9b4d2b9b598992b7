//! The sandboxed script bridge
//!
//! One bridge per job run. Construction builds the interpreter, installs
//! the native tool-call entry and evaluates one generated stub function per
//! catalog tool. `execute` resolves a source, evaluates it and invokes its
//! `action` entry point. The interpreter stays warm between `execute` calls
//! on the same bridge, and `close` (or drop) releases it.

use std::sync::Arc;

use boa_engine::{
    property::PropertyKey, Context as BoaContext, JsError, JsString, JsValue, NativeFunction,
    Source,
};
use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, warn};

use capstan_core::{ToolCatalog, ToolExecutor};

use crate::conversion::{coerce_to_primitive, js_to_json, json_to_js};
use crate::loader::ScriptLoader;
use crate::{ScriptError, ScriptResult};

/// Name of the single native function bridging into the host.
const TOOL_CALL_FN: &str = "__capstan_tool_call";

/// Entry-point function every script must define.
const ENTRY_POINT: &str = "action";

/// Sandboxed interpreter scoped to one job run.
///
/// Not `Send`: the interpreter must stay on the thread that built it and
/// must never be shared across concurrent job runs.
pub struct ScriptBridge {
    context: Option<BoaContext>,
    loader: ScriptLoader,
}

impl std::fmt::Debug for ScriptBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptBridge")
            .field("context", &self.context.as_ref().map(|_| "BoaContext"))
            .finish_non_exhaustive()
    }
}

impl ScriptBridge {
    /// Build an interpreter exposing exactly the catalog's tools.
    pub fn new(
        catalog: &dyn ToolCatalog,
        executor: Arc<dyn ToolExecutor>,
        loader: ScriptLoader,
    ) -> ScriptResult<Self> {
        let mut context = BoaContext::default();
        register_tool_call(&mut context, executor)?;

        let mut tools = catalog.tools();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        for tool in &tools {
            if !is_valid_identifier(&tool.name) {
                return Err(ScriptError::ToolRegistration(tool.name.clone()));
            }
            let parameter_names: Vec<&str> =
                tool.parameters.iter().map(|p| p.name.as_str()).collect();
            let stub = generate_tool_stub(&tool.name, &parameter_names);
            context
                .eval(Source::from_bytes(&stub))
                .map_err(|e| ScriptError::Evaluation(format!("tool stub '{}': {e}", tool.name)))?;
        }
        debug!(tools = tools.len(), "script bridge ready");

        Ok(Self {
            context: Some(context),
            loader,
        })
    }

    /// Resolve, evaluate and run a script's `action` entry point.
    ///
    /// State set by earlier `execute` calls on this bridge remains visible;
    /// callers needing isolation use a fresh bridge.
    pub async fn execute(
        &mut self,
        source: &str,
        parameters: &JsonValue,
    ) -> ScriptResult<JsonValue> {
        let code = self.loader.resolve(source).await?;
        self.execute_source(&code, parameters)
    }

    /// Evaluate already-resolved source and run its entry point.
    ///
    /// Synchronous so callers can keep the bridge off their await points;
    /// the interpreter is not `Send`.
    pub fn execute_source(&mut self, code: &str, parameters: &JsonValue) -> ScriptResult<JsonValue> {
        let context = self.context.as_mut().ok_or(ScriptError::Closed)?;

        context
            .eval(Source::from_bytes(code.as_bytes()))
            .map_err(|e| ScriptError::Evaluation(e.to_string()))?;

        let entry = context
            .global_object()
            .get(PropertyKey::from(JsString::from(ENTRY_POINT)), context)
            .map_err(|e| ScriptError::Evaluation(e.to_string()))?;
        let callable = entry.as_callable().ok_or_else(|| {
            ScriptError::ScriptContract(format!(
                "script must define a callable named '{ENTRY_POINT}'"
            ))
        })?;
        // Clone before the conversion below takes &mut context.
        let callable = callable.clone();

        let argument = json_to_js(context, parameters)?;
        let result = callable
            .call(&JsValue::undefined(), &[argument], context)
            .map_err(|e| ScriptError::Evaluation(e.to_string()))?;

        let value = js_to_json(context, result)?;
        Ok(coerce_to_primitive(value))
    }

    /// Release the interpreter; further `execute` calls fail with
    /// [`ScriptError::Closed`]. Safe to call more than once.
    pub fn close(&mut self) {
        if self.context.take().is_some() {
            debug!("script bridge closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.context.is_none()
    }
}

impl Drop for ScriptBridge {
    fn drop(&mut self) {
        self.close();
    }
}

/// Install the one native function every tool stub funnels through.
///
/// Tool failures are contained here: the executor's error becomes a
/// structured `{success:false, error, action:"error"}` value handed back to
/// the script instead of a thrown interpreter error.
fn register_tool_call(
    context: &mut BoaContext,
    executor: Arc<dyn ToolExecutor>,
) -> ScriptResult<()> {
    // SAFETY: the closure captures only an Arc to the executor, which holds
    // no garbage-collected interpreter values.
    let native = unsafe {
        NativeFunction::from_closure(move |_this, args, ctx| {
            let tool = string_arg(args, 0, ctx)?;
            let raw_args = string_arg(args, 1, ctx)?;

            let payload = match parse_tool_args(&raw_args) {
                Ok(map) => match executor.execute(&tool, &map) {
                    Ok(result) => json!({ "success": true, "result": result }),
                    Err(e) => {
                        warn!(tool = %tool, error = %e, "tool invocation failed");
                        json!({ "success": false, "error": e.to_string(), "action": "error" })
                    }
                },
                Err(reason) => {
                    warn!(tool = %tool, "malformed tool arguments");
                    json!({ "success": false, "error": reason, "action": "error" })
                }
            };

            let text = payload.to_string();
            Ok(JsValue::from(JsString::from(text.as_str())))
        })
    };

    context
        .register_global_callable(JsString::from(TOOL_CALL_FN), 2, native)
        .map_err(|e| ScriptError::Evaluation(format!("failed to install tool bridge: {e}")))
}

fn string_arg(
    args: &[JsValue],
    index: usize,
    context: &mut BoaContext,
) -> Result<String, JsError> {
    args.get(index)
        .cloned()
        .unwrap_or_default()
        .to_string(context)
        .map(|s| s.to_std_string_escaped())
}

fn parse_tool_args(raw: &str) -> Result<Map<String, JsonValue>, String> {
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(other) => Err(format!("tool arguments must be an object, got {other}")),
        Err(e) => Err(format!("tool arguments are not valid JSON: {e}")),
    }
}

/// Generated per-tool stub. A single object argument is passed through as
/// the argument map; positional arguments map onto declared parameter names
/// in order. The bridge result is a JSON payload: successful calls unwrap
/// to the tool result, failures surface the structured error object.
fn generate_tool_stub(name: &str, parameter_names: &[&str]) -> String {
    let names_literal = serde_json::to_string(parameter_names).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"function {name}() {{
    var names = {names_literal};
    var params = {{}};
    if (arguments.length === 1 && typeof arguments[0] === 'object'
            && arguments[0] !== null && !Array.isArray(arguments[0])) {{
        params = arguments[0];
    }} else {{
        for (var i = 0; i < arguments.length && i < names.length; i++) {{
            params[names[i]] = arguments[i];
        }}
    }}
    var envelope = JSON.parse({TOOL_CALL_FN}("{name}", JSON.stringify(params)));
    if (envelope.success) {{
        return envelope.result;
    }}
    return envelope;
}}"#
    )
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
