// ABOUTME: Single-quote escaping for values embedded in remote scripts.
// ABOUTME: The one sanctioned way to put a computed value into a script body.

/// Wrap a value in single quotes for a POSIX shell.
///
/// Embedded single quotes become `'\''`. Inside single quotes the shell
/// performs no expansion at all, so the quoted value reaches the remote
/// command as a single literal argument regardless of its content.
pub fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}
