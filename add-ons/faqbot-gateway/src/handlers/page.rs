//! Server-rendered HTML for the single chatbot page.

use faqbot_core::{Answer, SessionState};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

impl FlashKind {
    fn css_class(self) -> &'static str {
        match self {
            Self::Success => "flash success",
            Self::Error => "flash error",
            Self::Info => "flash info",
        }
    }
}

/// One-shot status message shown above the forms.
#[derive(Debug, Clone)]
pub struct Flash {
    pub kind: FlashKind,
    pub text: String,
}

impl Flash {
    pub fn success(text: impl Into<String>) -> Self {
        Self { kind: FlashKind::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: FlashKind::Error, text: text.into() }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self { kind: FlashKind::Info, text: text.into() }
    }
}

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; padding: 0 1rem; }
form { display: flex; flex-direction: column; gap: 0.5rem; margin-bottom: 1.5rem; }
.flash { padding: 0.6rem 0.8rem; border-radius: 4px; margin-bottom: 1rem; }
.success { background: #e6f4ea; color: #1e4620; }
.error { background: #fdecea; color: #611a15; }
.info { background: #e8f0fe; color: #174ea6; }
.answer { padding: 0.8rem; border-left: 4px solid #1a73e8; background: #f8f9fa; margin-bottom: 1rem; }
"#;

/// Minimal escaping for text and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the page for the session's current state: login and registration
/// forms while logged out, question form and logout while logged in.
pub fn render(app_name: &str, session: &SessionState, flash: Option<&Flash>, answer: Option<&Answer>) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<h1>📚 {}</h1>", escape_html(app_name));

    if let Some(flash) = flash {
        let _ = writeln!(
            body,
            "<div class=\"{}\">{}</div>",
            flash.kind.css_class(),
            escape_html(&flash.text)
        );
    }

    match session.username() {
        None => {
            body.push_str(concat!(
                "<h2>🔑 Login</h2>\n",
                "<form method=\"post\" action=\"/login\">\n",
                "<label>Username <input name=\"username\" autocomplete=\"username\"></label>\n",
                "<label>Password <input name=\"password\" type=\"password\" autocomplete=\"current-password\"></label>\n",
                "<button type=\"submit\">Login</button>\n",
                "</form>\n",
                "<hr>\n",
                "<h2>📝 Register</h2>\n",
                "<form method=\"post\" action=\"/register\">\n",
                "<label>New Username <input name=\"username\"></label>\n",
                "<label>New Password <input name=\"password\" type=\"password\" autocomplete=\"new-password\"></label>\n",
                "<label>Email <input name=\"email\" type=\"email\"></label>\n",
                "<button type=\"submit\">Register</button>\n",
                "</form>\n",
            ));
        }
        Some(username) => {
            let _ = writeln!(
                body,
                "<div class=\"flash success\">✅ Logged in as {}</div>",
                escape_html(username)
            );
            let asked = answer.map(|a| a.question.as_str()).unwrap_or("");
            let _ = writeln!(
                body,
                concat!(
                    "<form method=\"post\" action=\"/ask\">\n",
                    "<label>Ask your question: <input name=\"question\" value=\"{}\" autofocus></label>\n",
                    "<button type=\"submit\">Ask</button>\n",
                    "</form>"
                ),
                escape_html(asked)
            );
            if let Some(answer) = answer {
                let _ = writeln!(body, "<div class=\"answer\">{}</div>", escape_html(answer.text()));
            }
            body.push_str(concat!(
                "<form method=\"post\" action=\"/logout\">\n",
                "<button type=\"submit\">Logout</button>\n",
                "</form>\n",
            ));
        }
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(app_name),
        STYLE,
        body
    )
}
