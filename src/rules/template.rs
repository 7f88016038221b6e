//! Target URL construction.
//!
//! Replacement templates follow the `$`-pattern rules used by
//! connect/express style rewrite configs, so existing rule files keep
//! working: `$1`..`$99`, `$&`, `` $` ``, `$'`, `$<name>` and `$$`.
//! Note that `$1abc` means group 1 followed by `abc`, which differs from
//! `regex::Captures::expand`.

use regex::{Captures, Regex};

/// Placeholder replaced with the request method.
pub const METHOD_TOKEN: &str = "%{REQUEST_METHOD}";

/// Replace the first method token in `template`.
pub fn substitute_method(template: &str, method: &str) -> String {
    template.replacen(METHOD_TOKEN, method, 1)
}

/// Replace the first match of `pattern` in `input` with the expanded template.
///
/// Returns `input` unchanged when there is no match.
pub fn replace_first(pattern: &Regex, input: &str, template: &str) -> String {
    let Some(caps) = pattern.captures(input) else {
        return input.to_string();
    };
    let Some(whole) = caps.get(0) else {
        return input.to_string();
    };

    let mut out = String::with_capacity(input.len() + template.len());
    out.push_str(&input[..whole.start()]);
    expand(pattern, &caps, input, template, &mut out);
    out.push_str(&input[whole.end()..]);
    out
}

fn expand(pattern: &Regex, caps: &Captures<'_>, input: &str, template: &str, out: &mut String) {
    let Some(whole) = caps.get(0) else {
        return;
    };
    let groups = caps.len() - 1;
    let has_names = pattern.capture_names().flatten().next().is_some();
    let group = |n: usize| caps.get(n).map_or("", |m| m.as_str());

    let bytes = template.as_bytes();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' || i + 1 == bytes.len() {
            i += 1;
            continue;
        }

        let (consumed, replacement) = match bytes[i + 1] {
            b'$' => (2, "$"),
            b'&' => (2, whole.as_str()),
            b'`' => (2, &input[..whole.start()]),
            b'\'' => (2, &input[whole.end()..]),
            d @ b'0'..=b'9' => {
                let first = usize::from(d - b'0');
                let two_digit = bytes
                    .get(i + 2)
                    .filter(|b| b.is_ascii_digit())
                    .map(|b| first * 10 + usize::from(b - b'0'));

                match two_digit {
                    Some(n) if (1..=groups).contains(&n) => (3, group(n)),
                    _ if (1..=groups).contains(&first) => (2, group(first)),
                    _ => (0, ""),
                }
            }
            b'<' if has_names => match template[i + 2..].find('>') {
                Some(end) => {
                    let name = &template[i + 2..i + 2 + end];
                    (end + 3, caps.name(name).map_or("", |m| m.as_str()))
                }
                None => (0, ""),
            },
            _ => (0, ""),
        };

        if consumed == 0 {
            i += 1;
            continue;
        }

        out.push_str(&template[literal_start..i]);
        out.push_str(replacement);
        i += consumed;
        literal_start = i;
    }

    out.push_str(&template[literal_start..]);
}
