// Migrate an Astarte v1alpha2 resource (YAML text) to a v1alpha3 manifest.

use crate::migration::operator::OperatorInput;
use crate::migration::{convert, Conversion};
use serde_json::Value;

/// Parses a single YAML document into an untyped tree.
pub fn parse_resource(yaml: &str) -> Result<Value, String> {
    serde_yaml::from_str(yaml).map_err(|e| format!("Invalid YAML: {}", e))
}

/// Runs the conversion on YAML text.
pub fn convert_resource(yaml: &str, operator: &mut dyn OperatorInput) -> Result<Conversion, String> {
    let source = parse_resource(yaml)?;
    convert(&source, operator).map_err(|e| format!("Conversion failed: {}", e))
}

pub fn to_yaml(document: &Value) -> Result<String, String> {
    serde_yaml::to_string(document).map_err(|e| e.to_string())
}

/// Renders the converted manifest with the diagnostics as leading comments.
pub fn render_with_notes(conversion: &Conversion) -> Result<String, String> {
    let yaml = to_yaml(&conversion.document)?;
    let mut out = String::from("# Astarte manifest migrated from v1alpha2\n");
    if !conversion.diagnostics.is_empty() {
        out.push_str("# Migration notes:\n");
        for d in conversion.diagnostics.iter() {
            out.push_str(&format!("# - {}\n", d));
        }
    }
    out.push('\n');
    out.push_str(&yaml);
    Ok(out)
}

/// Migrates a v1alpha2 Astarte resource to a v1alpha3 YAML manifest + migration notes.
pub fn migrate_astarte_resource(yaml: &str, operator: &mut dyn OperatorInput) -> Result<String, String> {
    let conversion = convert_resource(yaml, operator)?;
    render_with_notes(&conversion)
}
