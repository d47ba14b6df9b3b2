//! Variable reference sites in template text.
//!
//! Two markup forms reference a variable by name: `{{ name }}` and
//! `{% if name %}` / `{% elif name %}`. Everything between the delimiters is
//! taken as the name, so names may contain spaces and punctuation.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static VARIABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<pre>\{\{\s*)(?P<name>[^\s{}](?:.*?[^\s])?)(?P<post>\s*\}\})")
        .unwrap_or_else(|e| panic!("invalid variable pattern: {e}"))
});

static CONDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<pre>\{%\s*(?:el)?if\s+)(?P<name>[^\s](?:.*?[^\s])?)(?P<post>\s*%\})")
        .unwrap_or_else(|e| panic!("invalid condition pattern: {e}"))
});

fn patterns() -> [&'static Regex; 2] {
    [&VARIABLE_RE, &CONDITION_RE]
}

/// Replaces every referenced name with `rewrite(name)`, leaving the rest of
/// the text untouched.
pub(crate) fn rewrite_references<'t>(
    text: &'t str,
    rewrite: impl Fn(&str) -> String,
) -> Cow<'t, str> {
    let mut out = Cow::Borrowed(text);
    for re in patterns() {
        let replaced = re.replace_all(&out, |caps: &Captures<'_>| {
            format!("{}{}{}", &caps["pre"], rewrite(&caps["name"]), &caps["post"])
        });
        if let Cow::Owned(s) = replaced {
            out = Cow::Owned(s);
        }
    }
    out
}

/// Names referenced by `text`, in order of first appearance.
pub fn template_variables(text: &str) -> Vec<String> {
    let mut sites: Vec<(usize, &str)> = patterns()
        .into_iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| caps.name("name").map(|m| (m.start(), m.as_str())))
        .collect();
    sites.sort_by_key(|(start, _)| *start);

    let mut names: Vec<String> = Vec::new();
    for (_, name) in sites {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_owned());
        }
    }
    names
}

/// Rewrites references to `old` so they point at `new`.
pub fn rename_template_variable(text: &str, old: &str, new: &str) -> String {
    rewrite_references(text, |name| {
        if name == old {
            new.to_owned()
        } else {
            name.to_owned()
        }
    })
    .into_owned()
}
