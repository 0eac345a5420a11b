//! Canned remote catalogs and compiler lists

use serde_json::{Value, json};

/// A two-library catalog as served by `GET /api/libraries/<language>`.
pub fn sample_catalog() -> Value {
    json!([
        {
            "id": "fmt",
            "name": "{fmt}",
            "url": "https://fmt.dev",
            "versions": [
                {"id": "1000", "version": "10.0.0"},
                {"id": "1010", "version": "10.1.0"}
            ]
        },
        {
            "id": "boost",
            "name": "Boost",
            "versions": [{"id": "182", "version": "1.82.0"}]
        }
    ])
}

/// A compiler entry in the shape produced by compiler discovery, including
/// internal-only fields.
pub fn discovered_compiler(id: &str, lang: &str, group: &str, semver: &str) -> Value {
    json!({
        "id": id,
        "name": format!("{group} {semver}"),
        "lang": lang,
        "group": group,
        "semver": semver,
        "isSemVer": true,
        "exe": format!("/opt/compiler-explorer/{id}/bin/{group}"),
        "versionFlag": ["--version"],
        "compilerType": group,
        "demangler": "/opt/compiler-explorer/bin/c++filt",
        "objdumper": "/opt/compiler-explorer/bin/objdump",
        "supportsExecute": true,
        "supportsBinary": true
    })
}
