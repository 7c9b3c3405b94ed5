//! Filter-graph template resolution
//!
//! Replaces symbolic resource references in the template with the resources'
//! local paths. The engine's filter grammar treats `:` as an option separator
//! and `\` as its escape character, so every substituted path is normalized
//! to forward slashes and has its colons escaped first; a bare Windows-style
//! `C:/fonts/x.ttf` inside `fontfile=` would otherwise split the option.
//!
//! Pure function: no filesystem access, trivially testable with synthetic
//! paths. Tokens matching no declared resource are left untouched (undeclared
//! `{{…}}` placeholders never get this far; validation rejects them).

use crate::fetch::ResolvedResource;

/// Escape a local path for use inside a filter-graph option value.
pub fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "/").replace(':', "\\:")
}

/// Substitute every `{{name}}` and bare-name occurrence of each resource with
/// its escaped local path.
///
/// The scan walks the original template once, so a substituted path can never
/// itself be re-matched: a resource named `font.ttf` whose path ends in
/// `/font.ttf` must not cascade.
pub fn resolve(template: &str, resources: &[ResolvedResource]) -> String {
    // Two patterns per resource, braced form first so it wins at equal
    // positions (it is strictly longer).
    let substitutions: Vec<(String, String)> = resources
        .iter()
        .flat_map(|res| {
            let escaped = escape_filter_path(&res.local_path.to_string_lossy());
            [
                (format!("{{{{{}}}}}", res.name), escaped.clone()),
                (res.name.clone(), escaped),
            ]
        })
        .collect();

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while !rest.is_empty() {
        let next = substitutions
            .iter()
            .filter_map(|(pat, rep)| rest.find(pat.as_str()).map(|at| (at, pat, rep)))
            .min_by_key(|(at, pat, _)| (*at, std::cmp::Reverse(pat.len())));

        match next {
            Some((at, pat, rep)) => {
                out.push_str(&rest[..at]);
                out.push_str(rep);
                rest = &rest[at + pat.len()..];
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }

    out
}
