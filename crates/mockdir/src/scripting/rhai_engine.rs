use crate::request::RequestInfo;
use rhai::{Array, Dynamic, Engine, EvalAltResult, Map, Scope};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Build a Rhai engine exposing the response-script capability surface.
///
/// Beyond Rhai's standard packages, scripts get XML helpers, file access
/// relative to `directory`, and `print`/`debug` routed to tracing.
pub fn create_engine(directory: &Path, identity: &str, max_operations: u64) -> Engine {
    let mut engine = Engine::new();

    if max_operations > 0 {
        engine.set_max_operations(max_operations);
    }

    let script = identity.to_string();
    engine.on_print(move |text| info!(script = %script, "{text}"));
    let script = identity.to_string();
    engine.on_debug(move |text, _source, pos| debug!(script = %script, %pos, "{text}"));

    register_xml(&mut engine);
    register_files(&mut engine, directory.to_path_buf());

    engine
}

fn register_xml(engine: &mut Engine) {
    engine
        .register_fn("xpath", xpath)
        .register_fn("xpath_all", xpath_all)
        .register_fn("xml_escape", |text: &str| xml_escape(text));
}

fn register_files(engine: &mut Engine, directory: PathBuf) {
    let base = directory.clone();
    engine.register_fn(
        "read_file",
        move |path: &str| -> Result<String, Box<EvalAltResult>> {
            let full = base.join(path);
            std::fs::read_to_string(&full)
                .map_err(|e| format!("read_file({}): {e}", full.display()).into())
        },
    );

    let base = directory;
    engine.register_fn("file_exists", move |path: &str| base.join(path).is_file());
}

fn xpath(xml: &str, expression: &str) -> Result<String, Box<EvalAltResult>> {
    use sxd_xpath::Value as XPathValue;

    let package = sxd_document::parser::parse(xml)
        .map_err(|_| "xpath: input is not well-formed XML".to_string())?;
    let document = package.as_document();

    match sxd_xpath::evaluate_xpath(&document, expression) {
        Ok(XPathValue::String(s)) => Ok(s),
        Ok(XPathValue::Number(n)) => Ok(n.to_string()),
        Ok(XPathValue::Boolean(b)) => Ok(b.to_string()),
        Ok(XPathValue::Nodeset(nodes)) => Ok(nodes
            .document_order()
            .first()
            .map(|n| n.string_value())
            .unwrap_or_default()),
        Err(_) => Err(format!("xpath: invalid expression '{expression}'").into()),
    }
}

fn xpath_all(xml: &str, expression: &str) -> Result<Array, Box<EvalAltResult>> {
    use sxd_xpath::Value as XPathValue;

    let package = sxd_document::parser::parse(xml)
        .map_err(|_| "xpath_all: input is not well-formed XML".to_string())?;
    let document = package.as_document();

    match sxd_xpath::evaluate_xpath(&document, expression) {
        Ok(XPathValue::Nodeset(nodes)) => Ok(nodes
            .document_order()
            .into_iter()
            .map(|n| Dynamic::from(n.string_value()))
            .collect()),
        Ok(XPathValue::String(s)) => Ok(vec![Dynamic::from(s)]),
        Ok(XPathValue::Number(n)) => Ok(vec![Dynamic::from(n.to_string())]),
        Ok(XPathValue::Boolean(b)) => Ok(vec![Dynamic::from(b.to_string())]),
        Err(_) => Err(format!("xpath_all: invalid expression '{expression}'").into()),
    }
}

pub fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Bind the request into the scope as constants.
///
/// Each field is available on its own (`body`, `path`, ...) and grouped in
/// a `request` map.
pub fn request_scope(request: &RequestInfo) -> Scope<'static> {
    let mut scope = Scope::new();

    let mut headers_map = Map::new();
    for (k, v) in &request.headers {
        headers_map.insert(k.clone().into(), Dynamic::from(v.clone()));
    }

    let mut query_map = Map::new();
    for (k, v) in request.query() {
        query_map.insert(k.into(), Dynamic::from(v));
    }

    let mut request_map = Map::new();
    request_map.insert("path".into(), Dynamic::from(request.path.clone()));
    request_map.insert(
        "querystring".into(),
        Dynamic::from(request.query_string.clone()),
    );
    request_map.insert("query".into(), Dynamic::from(query_map.clone()));
    request_map.insert("headers".into(), Dynamic::from(headers_map.clone()));
    request_map.insert("body".into(), Dynamic::from(request.body.clone()));

    scope.push_constant("path", request.path.clone());
    scope.push_constant("querystring", request.query_string.clone());
    scope.push_constant("query", query_map);
    scope.push_constant("headers", headers_map);
    scope.push_constant("body", request.body.clone());
    scope.push_constant("request", request_map);

    scope
}

/// Convert a script's result into response body text.
pub fn dynamic_to_body(value: Dynamic) -> String {
    if value.is_unit() {
        return String::new();
    }
    if value.is_string() {
        return value.try_cast::<String>().unwrap_or_default();
    }
    if value.is_map() || value.is_array() {
        return dynamic_to_json(value).to_string();
    }
    value.to_string()
}

pub(super) fn dynamic_to_json(value: Dynamic) -> Value {
    if value.is_unit() {
        Value::Null
    } else if let Ok(b) = value.as_bool() {
        Value::Bool(b)
    } else if let Ok(i) = value.as_int() {
        Value::Number(i.into())
    } else if let Ok(f) = value.as_float() {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    } else if let Some(s) = value.clone().try_cast::<String>() {
        Value::String(s)
    } else if let Some(arr) = value.clone().try_cast::<Array>() {
        Value::Array(arr.into_iter().map(dynamic_to_json).collect())
    } else if let Some(map) = value.clone().try_cast::<Map>() {
        let mut obj = serde_json::Map::new();
        for (k, v) in map {
            obj.insert(k.to_string(), dynamic_to_json(v));
        }
        Value::Object(obj)
    } else {
        Value::String(format!("{value}"))
    }
}
