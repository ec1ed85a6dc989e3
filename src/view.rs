//! Server-side rendering of the translate page.

use std::fmt::Write;

use crate::controller::{ControllerSnapshot, Phase};
use crate::language::TargetLanguage;
use crate::upload::{DocumentFormat, UploadContent};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #0f172a; color: #e2e8f0; display: flex; justify-content: center; }
.container { max-width: 640px; width: 100%; padding: 2rem; text-align: center; }
.subtitle { color: #94a3b8; }
.card { background: #1e293b; border-radius: 1rem; padding: 2rem; }
.dropzone { border: 2px dashed #475569; border-radius: 1rem; padding: 2rem; cursor: pointer; }
.dropzone.active { border-color: #a855f7; }
.ready { color: #4ade80; }
.error { color: #ef4444; margin-top: 1rem; }
.notice { color: #facc15; margin-top: 1rem; }
.btn { background: #a855f7; color: white; border: none; border-radius: .5rem; padding: .75rem 1.5rem; font-size: 1rem; cursor: pointer; text-decoration: none; display: inline-block; }
.btn[disabled] { opacity: .6; cursor: wait; }
.btn.secondary { background: transparent; border: 1px solid rgba(255,255,255,.2); margin-left: 1rem; }
.progress-bar-container { background: #334155; border-radius: 999px; height: .5rem; margin-top: 1.5rem; overflow: hidden; }
.progress-bar { background: #a855f7; height: 100%; }
.complete { color: #4ade80; font-size: 1.2rem; font-weight: bold; margin-bottom: 1rem; }
"#;

// Picker change and drops both submit the upload form; the server filters.
const DROPZONE_SCRIPT: &str = r#"
const zone = document.getElementById('dropzone');
const input = document.getElementById('file-input');
zone.addEventListener('click', () => input.click());
input.addEventListener('change', () => { if (input.files.length) input.form.submit(); });
zone.addEventListener('dragover', (e) => { e.preventDefault(); zone.classList.add('active'); });
zone.addEventListener('dragleave', () => zone.classList.remove('active'));
zone.addEventListener('drop', (e) => {
  e.preventDefault();
  zone.classList.remove('active');
  if (e.dataTransfer.files.length) { input.files = e.dataTransfer.files; input.form.submit(); }
});
"#;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

fn page(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         {head_extra}<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n\
         <body>\n<div class=\"container\">\n{body}</div>\n</body>\n</html>\n"
    )
}

fn render_dropzone(session_id: &str, snapshot: &ControllerSnapshot, out: &mut String) {
    let _ = write!(
        out,
        "<form id=\"upload-form\" action=\"/s/{id}/file\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <div id=\"dropzone\" class=\"dropzone\">\n\
         <input id=\"file-input\" type=\"file\" name=\"file\" accept=\"{accept}\" hidden>\n",
        id = escape(session_id),
        accept = escape(&DocumentFormat::accept_attribute()),
    );

    match &snapshot.upload.content {
        UploadContent::Selected {
            name,
            size_label,
            status,
        } => {
            let _ = write!(
                out,
                "<p><strong>{}</strong></p>\n<p class=\"subtitle\">{}</p>\n<p class=\"ready\">{}</p>\n",
                escape(name),
                escape(size_label),
                status
            );
        }
        UploadContent::Prompt { headline, hint } => {
            let _ = write!(
                out,
                "<p><strong>{}</strong></p>\n<p class=\"subtitle\">{}</p>\n",
                escape(headline),
                hint
            );
        }
    }

    if let Some(error) = &snapshot.upload.error {
        let _ = writeln!(out, "<div class=\"error\" role=\"alert\">{}</div>", escape(error));
    }
    if let Some(notice) = &snapshot.upload.notice {
        let _ = writeln!(out, "<div class=\"notice\">{}</div>", escape(notice));
    }
    out.push_str("</div>\n</form>\n");
}

fn render_controls(session_id: &str, snapshot: &ControllerSnapshot, out: &mut String) {
    let id = escape(session_id);
    let disabled = if snapshot.in_translation { " disabled" } else { "" };

    let _ = write!(
        out,
        "<div style=\"margin-top: 2rem\">\n\
         <form action=\"/s/{id}/language\" method=\"post\">\n\
         <select class=\"language-select\" name=\"target_lang\" onchange=\"this.form.submit()\"{disabled}>\n"
    );
    for lang in TargetLanguage::ALL {
        let selected = if lang == snapshot.target_lang { " selected" } else { "" };
        let _ = writeln!(
            out,
            "<option value=\"{}\"{}>{}</option>",
            lang.code(),
            selected,
            lang.label()
        );
    }
    out.push_str("</select>\n</form>\n");

    let label = if snapshot.in_translation {
        "Translating..."
    } else {
        "Translate Now"
    };
    let _ = write!(
        out,
        "<form action=\"/s/{id}/translate\" method=\"post\" style=\"margin-top: 1rem\">\n\
         <button class=\"btn\" type=\"submit\"{disabled}>{label}</button>\n</form>\n</div>\n"
    );
}

fn render_complete(session_id: &str, snapshot: &ControllerSnapshot, out: &mut String) {
    let id = escape(session_id);
    let name = snapshot.download_name.as_deref().unwrap_or("translated file");
    let _ = write!(
        out,
        "<div style=\"margin-top: 2rem\">\n\
         <div class=\"complete\">Translation Complete!</div>\n\
         <a class=\"btn\" href=\"/s/{id}/download\" download=\"{name}\">Download {name}</a>\n\
         <form action=\"/s/{id}/reset\" method=\"post\" style=\"display: inline\">\n\
         <button class=\"btn secondary\" type=\"submit\">Translate Another</button>\n</form>\n</div>\n",
        name = escape(name),
    );
}

/// Render the whole page for one session.
pub fn render_page(session_id: &str, snapshot: &ControllerSnapshot) -> String {
    let mut body = String::new();
    body.push_str("<h1>PPTX Translator</h1>\n");
    body.push_str(
        "<p class=\"subtitle\">Translate your presentations instantly while preserving formatting.</p>\n",
    );
    body.push_str("<div class=\"card\">\n");

    render_dropzone(session_id, snapshot, &mut body);

    match snapshot.phase {
        Phase::Selected | Phase::Translating | Phase::Failed => {
            render_controls(session_id, snapshot, &mut body)
        }
        Phase::Complete => render_complete(session_id, snapshot, &mut body),
        Phase::Idle => {}
    }

    if snapshot.in_translation {
        let _ = write!(
            body,
            "<div class=\"progress-bar-container\" role=\"progressbar\" aria-valuenow=\"{p}\">\
             <div class=\"progress-bar\" style=\"width: {p}%\"></div></div>\n",
            p = snapshot.progress
        );
    }

    body.push_str("</div>\n");
    let _ = write!(body, "<script>{}</script>\n", DROPZONE_SCRIPT);

    // Poll while the request is outstanding.
    let head_extra = if snapshot.in_translation {
        "<meta http-equiv=\"refresh\" content=\"1\">\n"
    } else {
        ""
    };
    page("PPTX Translator", head_extra, &body)
}

pub fn render_missing_session() -> String {
    page(
        "Session not found",
        "",
        "<h1>Session not found</h1>\n<p class=\"subtitle\">This session has expired.</p>\n\
         <a class=\"btn\" href=\"/\">Start over</a>\n",
    )
}
