/// Characters that carry meaning inside a `WIFI:` record.
const SPECIAL: [char; 4] = ['\\', ';', ',', ':'];

/// Backslash-escape `\`, `;`, `,` and `:` so scanners split fields correctly.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Reverse of [`escape`]. A trailing lone backslash is kept as-is.
#[cfg(test)]
pub fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
