//! Conversion of `Astarte` resources from `v1alpha2` to `v1alpha3`.
//!
//! The conversion reads an untyped source tree and builds a fresh destination tree;
//! the source is never modified. It is lossy and one-directional: deployment settings
//! for dependencies the operator no longer manages and plain-text credentials are
//! dropped, and there is no way back to the old schema. Everything that cannot be
//! carried over is reported through [`Diagnostics`] so the operator can patch the
//! result before applying it.
//!
//! Only identity problems (wrong `apiVersion`, wrong `kind`, missing `metadata.name`)
//! abort the conversion. Malformed or missing sections below `spec` are skipped with
//! a diagnostic.

mod cassandra;
mod cfssl;
mod components;
pub mod diagnostics;
pub mod env;
pub mod nodes;
pub mod operator;
pub mod quantity;
mod rabbitmq;
pub mod tree;
mod vernemq;

use crate::error::MigrationError;
use crate::types::{ASTARTE_KIND, SOURCE_API_VERSION, TARGET_API_VERSION};
use diagnostics::Diagnostics;
use operator::OperatorInput;
use serde_json::{Map as JsonMap, Value};
use tree::{child, is_present, join, kind_of};

/// Top-level `spec` fields copied as they are.
const VERBATIM_SPEC_FIELDS: [&str; 11] = [
    "version",
    "imageRegistry",
    "imagePullPolicy",
    "imagePullSecrets",
    "distributionChannel",
    "deploymentStrategy",
    "features",
    "storageClassName",
    "astarteInstanceID",
    "manualMaintenanceMode",
    "rbac",
];

const API_FIELDS: [&str; 2] = ["host", "sslListener"];

/// `spec` sections handled by a dedicated converter.
const CONVERTED_SPEC_SECTIONS: [&str; 6] =
    ["api", "cassandra", "rabbitmq", "vernemq", "cfssl", "components"];

/// Result of a successful conversion.
#[derive(Debug)]
pub struct Conversion {
    pub document: Value,
    pub diagnostics: Diagnostics,
}

/// Shared state of one conversion: the read-only source, the transcript and the
/// operator port used when a value cannot be derived.
pub struct MigrationContext<'a> {
    source: &'a Value,
    pub diagnostics: Diagnostics,
    operator: &'a mut dyn OperatorInput,
}

impl<'a> MigrationContext<'a> {
    pub fn new(source: &'a Value, operator: &'a mut dyn OperatorInput) -> Self {
        Self {
            source,
            diagnostics: Diagnostics::new(),
            operator,
        }
    }

    /// Looks up a source value. Access errors are recorded and read as "not found".
    pub fn lookup(&mut self, path: &[&str]) -> Option<&'a Value> {
        match tree::get(self.source, path) {
            Ok(value) => value,
            Err(e) => {
                self.diagnostics.error(join(path), format!("{e}; ignored"));
                None
            }
        }
    }

    /// Like [`lookup`](Self::lookup) but also filters out null and empty strings.
    pub fn present(&mut self, path: &[&str]) -> Option<&'a Value> {
        self.lookup(path).filter(|v| is_present(v))
    }

    /// Looks up a section that must be a map. Other shapes are reported and skipped.
    pub fn section(&mut self, path: &[&str]) -> Option<&'a JsonMap<String, Value>> {
        match self.lookup(path)? {
            Value::Null => None,
            Value::Object(map) => Some(map),
            other => {
                self.diagnostics.error(
                    join(path),
                    format!("expected a map, found {}; section skipped", kind_of(other)),
                );
                None
            }
        }
    }

    pub fn copy(
        &mut self,
        src_path: &[&str],
        dest: &mut JsonMap<String, Value>,
        dest_path: &[&str],
    ) -> bool {
        match tree::copy_if_present(self.source, src_path, dest, dest_path) {
            Ok(copied) => copied,
            Err(e) => {
                self.diagnostics.error(join(src_path), format!("{e}; ignored"));
                false
            }
        }
    }

    /// Copies every `base.<field>` to `<field>` in `dest`.
    pub fn copy_fields(&mut self, base: &[&str], fields: &[&str], dest: &mut JsonMap<String, Value>) {
        for field in fields {
            self.copy(&child(base, &[*field]), dest, &[*field]);
        }
    }

    pub fn set(
        &mut self,
        dest: &mut JsonMap<String, Value>,
        dest_path: &[&str],
        value: Option<Value>,
    ) -> bool {
        match tree::set_if_present(dest, dest_path, value) {
            Ok(written) => written,
            Err(e) => {
                self.diagnostics.error(join(dest_path), format!("cannot write value: {e}"));
                false
            }
        }
    }

    /// True when the section was deployed by the old operator (`deploy: true`).
    pub fn is_deployed(&mut self, base: &[&str]) -> bool {
        let path = child(base, &["deploy"]);
        matches!(self.lookup(&path), Some(Value::Bool(true)))
    }

    /// Reports every present `base.<field>` as dropped, with `reason`.
    pub fn report_dropped(&mut self, base: &[&str], fields: &[&str], level: diagnostics::Level, reason: &str) {
        for field in fields {
            let path = child(base, &[*field]);
            if self.present(&path).is_some() {
                self.diagnostics.push(level, join(&path), format!("dropped: {reason}"));
            }
        }
    }

    /// Asks the operator for a value. Failures are logged and yield `None`, as do
    /// empty answers.
    pub fn ask(&mut self, path: &str, prompt: &str) -> Option<String> {
        match self.operator.request(prompt) {
            Ok(answer) if !answer.trim().is_empty() => Some(answer.trim().to_string()),
            Ok(_) => {
                self.diagnostics.warn(path, "no value provided; left unset");
                None
            }
            Err(e) => {
                self.diagnostics.error(path, format!("{e}; left unset"));
                None
            }
        }
    }

    /// Asks for a port number and stores it at `dest_path`.
    pub fn ask_port(&mut self, path: &str, prompt: &str, dest: &mut JsonMap<String, Value>, dest_path: &[&str]) {
        let Some(answer) = self.ask(path, prompt) else {
            return;
        };
        match answer.parse::<i64>() {
            Ok(port) => {
                self.set(dest, dest_path, Some(Value::from(port)));
            }
            Err(_) => self
                .diagnostics
                .error(path, format!("{answer:?} is not a port number; left unset")),
        }
    }

    /// Asks for a string value and stores it at `dest_path`.
    pub fn ask_into(&mut self, path: &str, prompt: &str, dest: &mut JsonMap<String, Value>, dest_path: &[&str]) {
        let answer = self.ask(path, prompt).map(Value::String);
        self.set(dest, dest_path, answer);
    }

    /// Converts the old `connection.secret` into `connection.credentialsSecret` and
    /// reports plain-text credentials, which the new schema cannot hold.
    pub fn convert_credentials(&mut self, base: &[&str], service: &str, connection: &mut JsonMap<String, Value>) {
        for key in ["name", "usernameKey", "passwordKey"] {
            self.copy(&child(base, &["connection", "secret", key]), connection, &["credentialsSecret", key]);
        }
        let connection_path = child(base, &["connection"]);
        self.report_dropped(
            &connection_path,
            &["username", "password"],
            diagnostics::Level::Warn,
            &format!(
                "plain-text {service} credentials are no longer supported; store them in a \
                 Secret and reference it from connection.credentialsSecret"
            ),
        );
    }

    /// Fills `credentialsSecret` from the operator for the keys still missing.
    pub fn ask_credentials_secret(&mut self, base: &[&str], service: &str, connection: &mut JsonMap<String, Value>) {
        let path = join(&child(base, &["connection", "credentialsSecret"]));
        let prompts = [
            ("name", format!("{service} credentials Secret name")),
            ("usernameKey", format!("{service} Secret key holding the username")),
            ("passwordKey", format!("{service} Secret key holding the password")),
        ];
        for (key, prompt) in prompts {
            let present = connection
                .get("credentialsSecret")
                .and_then(|s| s.get(key))
                .is_some_and(is_present);
            if !present {
                self.ask_into(&format!("{path}.{key}"), &prompt, connection, &["credentialsSecret", key]);
            }
        }
    }
}

/// Inserts `sub` under `key` unless it is empty.
fn attach(dest: &mut JsonMap<String, Value>, key: &str, sub: JsonMap<String, Value>) {
    if !sub.is_empty() {
        dest.insert(key.to_string(), Value::Object(sub));
    }
}

fn expect_string(doc: &JsonMap<String, Value>, key: &str) -> String {
    match doc.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn check_identity(root: &JsonMap<String, Value>) -> Result<(), MigrationError> {
    let api_version = expect_string(root, "apiVersion");
    if api_version != SOURCE_API_VERSION {
        return Err(MigrationError::ApiVersionMismatch {
            expected: SOURCE_API_VERSION.to_string(),
            found: api_version,
        });
    }
    let kind = expect_string(root, "kind");
    if kind != ASTARTE_KIND {
        return Err(MigrationError::KindMismatch {
            expected: ASTARTE_KIND.to_string(),
            found: kind,
        });
    }
    Ok(())
}

fn convert_metadata(ctx: &mut MigrationContext<'_>) -> Result<JsonMap<String, Value>, MigrationError> {
    let mut metadata = JsonMap::new();
    match ctx.present(&["metadata", "name"]) {
        Some(Value::String(name)) => {
            metadata.insert("name".to_string(), Value::String(name.clone()));
        }
        _ => return Err(MigrationError::MissingName),
    }
    ctx.copy(&["metadata", "namespace"], &mut metadata, &["namespace"]);

    if let Some(source) = ctx.section(&["metadata"]) {
        let ignored: Vec<&str> = source
            .keys()
            .map(String::as_str)
            .filter(|k| !matches!(*k, "name" | "namespace"))
            .collect();
        if !ignored.is_empty() {
            ctx.diagnostics.info(
                "metadata",
                format!("not carried over: {}", ignored.join(", ")),
            );
        }
    }
    Ok(metadata)
}

fn convert_spec(ctx: &mut MigrationContext<'_>) -> JsonMap<String, Value> {
    let mut spec = JsonMap::new();
    let Some(source_spec) = ctx.section(&["spec"]) else {
        ctx.diagnostics.warn("spec", "missing; the converted resource has no spec");
        return spec;
    };

    ctx.copy_fields(&["spec"], &VERBATIM_SPEC_FIELDS, &mut spec);

    let mut api = JsonMap::new();
    ctx.copy_fields(&["spec", "api"], &API_FIELDS, &mut api);
    ctx.report_dropped(
        &["spec", "api"],
        &["polling"],
        diagnostics::Level::Warn,
        "no longer supported",
    );
    attach(&mut spec, "api", api);

    attach(&mut spec, "rabbitmq", rabbitmq::convert_rabbitmq(ctx));
    attach(&mut spec, "vernemq", vernemq::convert_vernemq(ctx));
    attach(&mut spec, "cassandra", cassandra::convert_cassandra(ctx));
    attach(&mut spec, "cfssl", cfssl::convert_cfssl(ctx));
    attach(&mut spec, "components", components::convert_components(ctx));

    for key in source_spec.keys() {
        let known = VERBATIM_SPEC_FIELDS.contains(&key.as_str())
            || CONVERTED_SPEC_SECTIONS.contains(&key.as_str());
        if !known {
            ctx.diagnostics
                .warn(format!("spec.{key}"), "unknown field; not carried over");
        }
    }
    spec
}

/// Converts a `v1alpha2` Astarte resource into `v1alpha3`.
///
/// Prompts go through `operator` only for dependencies that were deployed by the old
/// operator. On error no document is returned.
pub fn convert(source: &Value, operator: &mut dyn OperatorInput) -> Result<Conversion, MigrationError> {
    let Value::Object(root) = source else {
        return Err(MigrationError::NotAnObject(kind_of(source)));
    };
    check_identity(root)?;

    let mut ctx = MigrationContext::new(source, operator);
    let metadata = convert_metadata(&mut ctx)?;
    let spec = convert_spec(&mut ctx);

    let mut document = JsonMap::new();
    document.insert("apiVersion".to_string(), Value::String(TARGET_API_VERSION.to_string()));
    document.insert("kind".to_string(), Value::String(ASTARTE_KIND.to_string()));
    document.insert("metadata".to_string(), Value::Object(metadata));
    attach(&mut document, "spec", spec);

    tracing::debug!(
        diagnostics = ctx.diagnostics.len(),
        "converted resource to {TARGET_API_VERSION}"
    );
    Ok(Conversion {
        document: Value::Object(document),
        diagnostics: ctx.diagnostics,
    })
}
