use bddrun_ports::SchemaValidator;
use bddrun_schema::execution::SchemaValidation;
use bddrun_schema::http::HttpMethod;
use jsonschema::Draft;
use serde_json::{Map, Value};

/// `$ref` chains longer than this are treated as unresolvable.
const MAX_REF_DEPTH: usize = 8;

/// Validates response bodies against the response schemas of one document.
///
/// Lookup is `path template -> operation -> status (exact, NXX, default) ->
/// JSON media type -> schema`. Swagger 2 `responses.<code>.schema` is also
/// understood. A response without a schema counts as "not found".
#[derive(Clone, Debug)]
pub struct OpenApiSchemaValidator {
    doc: Value,
    base_path: String,
}

impl OpenApiSchemaValidator {
    pub fn new(doc: Value) -> Self {
        let base_path = crate::base_url(&doc)
            .ok()
            .map(|u| url_path(&u))
            .unwrap_or_default();
        Self {
            doc,
            base_path: base_path.trim_end_matches('/').to_string(),
        }
    }

    /// The documented schema for a response, `$ref`s to `components` intact.
    pub fn response_schema(&self, path: &str, method: HttpMethod, status: u16) -> Option<&Value> {
        let template = self.match_path(path)?;
        let operation = self
            .resolve(self.doc.get("paths")?.get(template)?)?
            .get(method.operation_key())?;
        let responses = operation.get("responses")?.as_object()?;
        let response = self.resolve(pick_response(responses, status)?)?;

        if let Some(content) = response.get("content").and_then(Value::as_object) {
            let media = content
                .get("application/json")
                .or_else(|| {
                    content
                        .iter()
                        .find(|(k, _)| k.contains("json"))
                        .map(|(_, v)| v)
                })?;
            return media.get("schema");
        }
        response.get("schema")
    }

    fn match_path(&self, path: &str) -> Option<&str> {
        let relative = path
            .strip_prefix(self.base_path.as_str())
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .unwrap_or(path);
        let wanted = segments(relative);

        let paths = self.doc.get("paths")?.as_object()?;
        paths
            .keys()
            .filter_map(|template| {
                let parts = segments(template);
                if parts.len() != wanted.len() {
                    return None;
                }
                let mut placeholders = 0;
                for (t, w) in parts.iter().zip(&wanted) {
                    if is_placeholder(t) {
                        if w.is_empty() {
                            return None;
                        }
                        placeholders += 1;
                    } else if t != w {
                        return None;
                    }
                }
                Some((placeholders, template.as_str()))
            })
            .min_by_key(|(placeholders, _)| *placeholders)
            .map(|(_, template)| template)
    }

    /// Follow local `#/...` references.
    fn resolve<'a>(&'a self, mut value: &'a Value) -> Option<&'a Value> {
        for _ in 0..MAX_REF_DEPTH {
            match value.get("$ref").and_then(Value::as_str) {
                Some(reference) => {
                    value = self.doc.pointer(reference.strip_prefix('#')?)?;
                }
                None => return Some(value),
            }
        }
        None
    }

    /// Schema with the document's reusable definitions attached, so that
    /// `#/components/...` and `#/definitions/...` resolve against it.
    fn standalone(&self, schema: &Value) -> Value {
        let mut root = Map::new();
        root.insert("allOf".into(), Value::Array(vec![schema.clone()]));
        for key in ["components", "definitions"] {
            if let Some(defs) = self.doc.get(key) {
                root.insert(key.into(), defs.clone());
            }
        }
        Value::Object(root)
    }
}

impl SchemaValidator for OpenApiSchemaValidator {
    fn validate(&self, url: &str, method: HttpMethod, status: u16, body: &Value) -> SchemaValidation {
        let path = url_path(url);
        let Some(schema) = self.response_schema(&path, method, status) else {
            return SchemaValidation::not_found();
        };
        let compiled = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&self.standalone(schema));
        match compiled {
            Ok(validator) => SchemaValidation {
                schema_found: true,
                schema_valid: validator.is_valid(body),
            },
            // Uncompilable schema counts as absent.
            Err(_) => SchemaValidation::not_found(),
        }
    }
}

fn pick_response(responses: &Map<String, Value>, status: u16) -> Option<&Value> {
    let exact = status.to_string();
    let class = format!("{}XX", status / 100);
    responses
        .get(&exact)
        .or_else(|| {
            responses
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(&class))
                .map(|(_, v)| v)
        })
        .or_else(|| responses.get("default"))
}

/// Path component of an absolute or relative URL, without query or fragment.
fn url_path(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => raw
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

fn segments(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn is_placeholder(segment: &str) -> bool {
    segment.len() > 2 && segment.starts_with('{') && segment.ends_with('}')
}
