//! Output page rendering
//!
//! Everything coming from the interpreter is escaped before it is placed in
//! the page; the template itself is static.

use std::fmt::Write as _;

use crate::sandbox::{RunOutcome, Termination};

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en-US">
<meta charset="UTF-8">
<title>"#;

const PAGE_BODY: &str = r#"</title>
<body style="margin: 0; background-color: white; color: black">
<pre style="margin: 0; font-family: Inconsolata, Consolas, monospace; font-size: 15.5px">
"#;

const PAGE_TAIL: &str = "</pre>
</body>
</html>
";

/// Escape text for use inside an HTML element body.
///
/// Quotes are left alone; the result is never placed in an attribute.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Plain-text body for a run: the captured output, then a truncation
/// marker and the exit status line when they apply.
pub fn render_output(outcome: &RunOutcome) -> String {
    let mut text = outcome.output.clone();

    if let Termination::SpawnFailed(reason) = &outcome.termination {
        push_line(&mut text, reason);
    }

    if outcome.truncated {
        push_line(&mut text, "[output truncated]");
    }

    if let Some(status) = outcome.termination.exit_status() {
        ensure_line_start(&mut text);
        let _ = write!(text, "Exit status: {}", status);
    }

    text
}

/// Wrap plain text in the output page, escaping it
pub fn render_page(title: &str, text: &str) -> String {
    let mut page = String::with_capacity(PAGE_HEAD.len() + PAGE_BODY.len() + text.len() + 64);
    page.push_str(PAGE_HEAD);
    page.push_str(&escape_html(title));
    page.push_str(PAGE_BODY);
    page.push_str(&escape_html(text));
    page.push_str(PAGE_TAIL);
    page
}

fn ensure_line_start(text: &mut String) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}

fn push_line(text: &mut String, line: &str) {
    ensure_line_start(text);
    text.push_str(line);
    text.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn outcome(output: &str, termination: Termination) -> RunOutcome {
        RunOutcome {
            output: output.to_string(),
            termination,
            truncated: false,
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>alert(\"x\" & 'y')</script>"),
            "&lt;script&gt;alert(\"x\" &amp; 'y')&lt;/script&gt;"
        );
        assert_eq!(escape_html("plain text\n"), "plain text\n");
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_success_has_no_status_line() {
        let text = render_output(&outcome("42\n", Termination::Exited(0)));
        assert_eq!(text, "42\n");
    }

    #[test]
    fn test_failure_appends_status_line() {
        let text = render_output(&outcome("boom\n", Termination::Exited(2)));
        assert_eq!(text, "boom\nExit status: 2");

        let text = render_output(&outcome("no newline", Termination::Exited(1)));
        assert_eq!(text, "no newline\nExit status: 1");

        let text = render_output(&outcome("", Termination::TimedOut));
        assert_eq!(text, "Exit status: 137");
    }

    #[test]
    fn test_truncated_and_spawn_failed() {
        let mut truncated = outcome("xxxx", Termination::Signaled(libc::SIGKILL));
        truncated.truncated = true;
        assert_eq!(
            render_output(&truncated),
            "xxxx\n[output truncated]\nExit status: 137"
        );

        let failed = RunOutcome::spawn_failed("cannot run interp: No such file or directory");
        assert_eq!(
            render_output(&failed),
            "cannot run interp: No such file or directory\nExit status: 127"
        );
    }

    #[test]
    fn test_render_page_escapes_output() {
        let page = render_page("Output", "<b>bold</b>\n");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Output</title>"));
        assert!(page.contains("&lt;b&gt;bold&lt;/b&gt;\n</pre>"));
        assert!(!page.contains("<b>"));
    }
}
