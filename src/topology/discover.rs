use std::path::Path;

use tracing::debug;

use super::{ServiceName, ServiceSelection};

/// Service names declared in an existing descriptor, in file order.
///
/// Tolerates a hand-edited file: when the YAML does not parse, the
/// top-level `services:` block is scanned line by line instead. Returns an
/// empty vec if the file cannot be read or has no services section.
pub fn discover_services(compose_file: &Path) -> Vec<String> {
    let content = match std::fs::read_to_string(compose_file) {
        Ok(c) => c,
        Err(e) => {
            debug!(path = %compose_file.display(), error = %e, "could not read topology descriptor");
            return Vec::new();
        }
    };

    match serde_yaml::from_str::<serde_yaml::Value>(&content) {
        Ok(doc) => service_keys(&doc),
        Err(e) => {
            debug!(path = %compose_file.display(), error = %e, "descriptor is not valid YAML, scanning lines");
            scan_service_keys(&content)
        }
    }
}

/// The installed selection: descriptor services from the known vocabulary.
pub fn installed_selection(compose_file: &Path) -> ServiceSelection {
    discover_services(compose_file)
        .iter()
        .filter_map(|name| match name.parse::<ServiceName>() {
            Ok(svc) => Some(svc),
            Err(_) => {
                debug!(service = %name, "ignoring service outside the managed set");
                None
            }
        })
        .collect()
}

fn service_keys(doc: &serde_yaml::Value) -> Vec<String> {
    doc.get("services")
        .and_then(serde_yaml::Value::as_mapping)
        .map(|services| {
            services
                .keys()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn scan_service_keys(content: &str) -> Vec<String> {
    let mut services = Vec::new();
    let mut in_services = false;
    let mut service_indent: Option<usize> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indent = line.len() - line.trim_start().len();

        if !in_services {
            in_services = indent == 0 && trimmed.starts_with("services:");
            continue;
        }
        if indent == 0 {
            break;
        }
        if *service_indent.get_or_insert(indent) != indent {
            continue;
        }
        if let Some((name, _)) = trimmed.split_once(':') {
            if !name.is_empty() {
                services.push(name.to_string());
            }
        }
    }
    services
}
