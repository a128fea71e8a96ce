//! HTML rendering of the chat page

use html_escape::encode_text;
use std::fmt::Write;
use voxplex_core::session::{Notice, Turn};

pub const TITLE: &str = "🤖 OpenPerplex Chatbot";
pub const VOICE_BUTTON: &str = "🎤 Start Voice Input";
pub const VOICE_MISSING: &str = "Speech recognition is not available.";

/// Everything one render needs
pub struct PageView<'a> {
    pub connected: bool,
    pub voice_available: bool,
    pub notices: &'a [Notice],
    pub turns: &'a [Turn],
}

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; display: flex; min-height: 100vh; }
aside { width: 16rem; padding: 1rem; background: #f0f2f6; }
main { flex: 1; padding: 1rem 2rem; max-width: 48rem; }
.notice { padding: 0.5rem 0.75rem; margin: 0.5rem 0; border-radius: 0.25rem; }
.notice.info { background: #e8f0fe; }
.notice.warning { background: #fff4ce; }
.notice.error { background: #fde7e9; }
.turn { padding: 0.5rem 0.75rem; margin: 0.5rem 0; border-radius: 0.5rem; white-space: pre-wrap; }
.turn.user { background: #f7f7f9; }
.turn.assistant { background: #eef6ee; }
.role { font-weight: bold; display: block; margin-bottom: 0.25rem; }
form.chat input { width: 100%; box-sizing: border-box; padding: 0.5rem; }
"#;

/// Render the full page.
///
/// The sidebar, transcript and chat input only appear once a client is
/// connected.
pub fn render_page(view: &PageView<'_>) -> String {
    let mut html = String::with_capacity(4096);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n",
        title = encode_text(TITLE),
    );

    if view.connected {
        render_sidebar(&mut html, view.voice_available);
    }

    html.push_str("<main>\n");
    let _ = writeln!(html, "<h1>{}</h1>", encode_text(TITLE));
    html.push_str(
        "<form class=\"credential\" method=\"post\" action=\"/credential\">\n\
         <label for=\"api_key\">Enter your OpenPerplex API Key</label>\n\
         <input id=\"api_key\" name=\"api_key\" type=\"password\" autocomplete=\"off\">\n\
         <button type=\"submit\">Connect</button>\n</form>\n",
    );

    for notice in view.notices {
        render_notice(&mut html, notice);
    }

    if view.connected {
        html.push_str("<h2>Chat History</h2>\n<div id=\"history\">\n");
        for turn in view.turns {
            render_turn(&mut html, turn);
        }
        html.push_str("</div>\n");
        html.push_str(
            "<form class=\"chat\" method=\"post\" action=\"/chat\">\n\
             <input name=\"message\" type=\"text\" placeholder=\"Type your message here...\" autofocus>\n\
             </form>\n",
        );
    }

    html.push_str("</main>\n");
    html.push_str(
        "<script>window.scrollTo(0, document.body.scrollHeight);</script>\n</body>\n</html>\n",
    );
    html
}

fn render_sidebar(html: &mut String, voice_available: bool) {
    html.push_str("<aside>\n<h2>Interaction Options</h2>\n");
    if voice_available {
        let _ = writeln!(
            html,
            "<form method=\"post\" action=\"/voice\"><button type=\"submit\">{}</button></form>",
            encode_text(VOICE_BUTTON)
        );
    } else {
        let _ = writeln!(
            html,
            "<div class=\"notice warning\">{}</div>",
            encode_text(VOICE_MISSING)
        );
    }
    html.push_str("</aside>\n");
}

fn render_notice(html: &mut String, notice: &Notice) {
    let _ = writeln!(
        html,
        "<div class=\"notice {}\">{}</div>",
        notice.level.as_str(),
        encode_text(&notice.message)
    );
}

fn render_turn(html: &mut String, turn: &Turn) {
    let _ = writeln!(
        html,
        "<div class=\"turn {role}\"><span class=\"role\">{role}</span>{}</div>",
        encode_text(&turn.content),
        role = turn.role.as_str(),
    );
}
