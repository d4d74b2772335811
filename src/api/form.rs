//! The HTML form at `/`.
//!
//! [`FormView`] is the value object handed to the renderer; the renderer
//! itself only formats and escapes.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use axum::body::Body;
use chrono::{Datelike, Utc};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use super::options::{
    RequestOptions, PARAM_UPPERCASE, PARAM_UUID_HASH_NAME, PARAM_UUID_HASH_NS, PARAM_UUID_VERSION,
};
use crate::ident::{self, HashVersion};
use crate::state::AppState;
use crate::util::escape_html;

/// Section of the form a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProblemCategory {
    HashUuid,
    UuidV4,
    UuidV7,
}

impl ProblemCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemCategory::HashUuid => "hash_uuid",
            ProblemCategory::UuidV4 => "uuidv4",
            ProblemCategory::UuidV7 => "uuidv7",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    Error,
}

impl ProblemKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub kind: ProblemKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    /// Form submission target, under the mounted base path.
    pub action: String,
    pub uppercase: bool,
    pub uuid_version: HashVersion,
    pub namespace: String,
    pub name: String,
    pub result_hash: String,
    pub result_random: String,
    pub result_time_ordered: String,
    pub current_year: i32,
    pub problems: BTreeMap<ProblemCategory, Vec<Problem>>,
}

impl FormView {
    fn new(base_path: &str, opts: &RequestOptions) -> Self {
        Self {
            action: format!("{base_path}/"),
            uppercase: opts.uppercase,
            uuid_version: opts.uuid_version,
            namespace: opts.namespace.clone(),
            name: opts.name.clone(),
            result_hash: String::new(),
            result_random: String::new(),
            result_time_ordered: String::new(),
            current_year: Utc::now().year(),
            problems: BTreeMap::new(),
        }
    }

    pub fn add_problem(&mut self, category: ProblemCategory, message: impl Into<String>) {
        self.problems.entry(category).or_default().push(Problem {
            kind: ProblemKind::Error,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn problems_for(&self, category: ProblemCategory) -> &[Problem] {
        self.problems
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Compute every result the page shows. Failures become diagnostics on the
/// matching section instead of failing the page.
pub async fn build_view(state: &AppState, opts: &RequestOptions) -> FormView {
    let mut view = FormView::new(state.base_path(), opts);
    let case = opts.letter_case();

    match ident::v4() {
        Ok(id) => view.result_random = case.render(&id),
        Err(err) => view.add_problem(ProblemCategory::UuidV4, err.to_string()),
    }

    if opts.has_hash_input() {
        match ident::parse_identifier(&opts.namespace) {
            Ok(namespace) => {
                let id = ident::hash(opts.uuid_version, &namespace, opts.name.as_bytes());
                view.result_hash = case.render(&id);
            }
            Err(_) => view.add_problem(
                ProblemCategory::HashUuid,
                format!("invalid uuid: {}", opts.namespace),
            ),
        }
    }

    match opts.seq_override() {
        Ok(seq_override) => match ident::v7(seq_override, state.sequence()).await {
            Ok(id) => view.result_time_ordered = case.render(&id),
            Err(err) => view.add_problem(ProblemCategory::UuidV7, err.to_string()),
        },
        Err(err) => view.add_problem(ProblemCategory::UuidV7, err.to_string()),
    }

    view
}

/// `GET|POST /`
pub async fn page(state: &AppState, opts: &RequestOptions) -> Response {
    let view = build_view(state, opts).await;
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        )],
        Body::from(render_page(&view)),
    )
        .into_response()
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en-US">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width">
    <meta name="description" content="a simple and fast toolbelt for dealing with rfc4122 uuid tokens">
    <title>uuid ninja</title>
    <style>
        .problem {
            margin-bottom: 0.8em;
            padding: 0.25em 0.5em;
        }
        .problem.error {
            background-color: #da304c;
            color: white;
        }
    </style>
</head>
"#;

#[must_use]
pub fn render_page(view: &FormView) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(PAGE_HEAD);
    out.push_str("<body><div id=\"main\">\n<h2>uuid ninja</h2>\n");
    out.push_str(
        "<p>this is a <a href=\"https://tools.ietf.org/html/rfc4122\" target=\"_blank\" \
         rel=\"noopener noreferrer\">rfc4122</a> uuid utility. use it to generate uuids \
         (v3, v4, v5, v7).</p>\n",
    );
    let _ = writeln!(
        out,
        "<form action=\"{}\" method=\"POST\">",
        escape_html(&view.action)
    );

    out.push_str("<fieldset name=\"global_opts\"><legend>global options</legend>\n");
    let _ = writeln!(
        out,
        "<label for=\"uppercase\"><input type=\"checkbox\" id=\"uppercase\" name=\"{PARAM_UPPERCASE}\"{}> uppercase</label>",
        if view.uppercase { " checked" } else { "" }
    );
    out.push_str("</fieldset>\n");

    out.push_str("<fieldset name=\"hash_based_uuid\"><legend>uuid v3 / v5</legend>\n");
    render_problems(&mut out, view.problems_for(ProblemCategory::HashUuid));
    let _ = writeln!(
        out,
        "<label for=\"version\">uuid version</label> <select name=\"{PARAM_UUID_VERSION}\" id=\"version\">\
         <option value=\"v3\"{}>version 3</option><option value=\"v5\"{}>version 5</option></select><br>",
        selected(view.uuid_version == HashVersion::V3),
        selected(view.uuid_version == HashVersion::V5),
    );
    let _ = writeln!(
        out,
        "<label for=\"uuidns\">namespace uuid</label> <input id=\"uuidns\" type=\"text\" name=\"{PARAM_UUID_HASH_NS}\" value=\"{}\"><br>",
        escape_html(&view.namespace)
    );
    let _ = writeln!(
        out,
        "<label for=\"uuidname\">name</label> <input id=\"uuidname\" type=\"text\" name=\"{PARAM_UUID_HASH_NAME}\" value=\"{}\"><br>",
        escape_html(&view.name)
    );
    render_result(&mut out, "result_hash", &view.result_hash);
    out.push_str("</fieldset>\n");

    out.push_str("<fieldset name=\"random_uuid\"><legend>uuid v4</legend>\n");
    render_problems(&mut out, view.problems_for(ProblemCategory::UuidV4));
    render_result(&mut out, "result_random", &view.result_random);
    out.push_str("</fieldset>\n");

    out.push_str("<fieldset name=\"time_ordered_uuid\"><legend>uuid v7</legend>\n");
    render_problems(&mut out, view.problems_for(ProblemCategory::UuidV7));
    render_result(&mut out, "result_time_ordered", &view.result_time_ordered);
    out.push_str("</fieldset>\n");

    out.push_str("<input type=\"submit\" value=\"generate\">\n</form>\n");
    let _ = writeln!(out, "<footer>&copy; {} uuid ninja</footer>", view.current_year);
    out.push_str("</div></body>\n</html>\n");
    out
}

fn selected(is_selected: bool) -> &'static str {
    if is_selected {
        " selected"
    } else {
        ""
    }
}

fn render_problems(out: &mut String, problems: &[Problem]) {
    for problem in problems {
        let _ = writeln!(
            out,
            "<div class=\"problem {}\">{}: {}</div>",
            problem.kind.as_str(),
            problem.kind.as_str(),
            escape_html(&problem.message)
        );
    }
}

fn render_result(out: &mut String, id: &str, value: &str) {
    let _ = writeln!(
        out,
        "<input id=\"{id}\" type=\"text\" readonly size=\"40\" value=\"{}\">",
        escape_html(value)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::sequence::store::MemoryCounterStore;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::with_store(AppConfig::default(), Arc::new(MemoryCounterStore::new()))
    }

    #[tokio::test]
    async fn test_view_without_hash_input() {
        let view = build_view(&state(), &RequestOptions::default()).await;
        assert!(view.result_hash.is_empty());
        assert_eq!(view.result_random.len(), 36);
        assert_eq!(view.result_time_ordered.len(), 36);
        assert!(view.problems.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_namespace_becomes_problem() {
        let opts = RequestOptions::from_urlencoded(b"uuidns=nope&uuidname=example.org");
        let view = build_view(&state(), &opts).await;
        assert!(view.result_hash.is_empty());
        let problems = view.problems_for(ProblemCategory::HashUuid);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, "invalid uuid: nope");
        assert_eq!(ProblemCategory::HashUuid.as_str(), "hash_uuid");
    }

    #[tokio::test]
    async fn test_hash_result_follows_case() {
        let opts = RequestOptions::from_urlencoded(
            b"uppercase=on&uuidvers=v3&uuidns=6ba7b810-9dad-11d1-80b4-00c04fd430c8&uuidname=python.org",
        );
        let view = build_view(&state(), &opts).await;
        assert_eq!(view.result_hash, "6FA459EA-EE8A-3CA4-894E-DB77E160355E");
        assert_eq!(view.result_random, view.result_random.to_uppercase());
    }

    #[test]
    fn test_render_escapes_input() {
        let mut view = FormView::new("", &RequestOptions::from_urlencoded(
            b"uuidns=%3Cscript%3E&uuidname=%22x%22",
        ));
        view.add_problem(ProblemCategory::HashUuid, "invalid uuid: <script>");
        let html = render_page(&view);
        assert!(!html.contains("<script>"));
        assert!(html.contains("value=\"&lt;script&gt;\""));
        assert!(html.contains("value=\"&quot;x&quot;\""));
        assert!(html.contains("<div class=\"problem error\">error: invalid uuid: &lt;script&gt;</div>"));
        assert!(html.contains("<option value=\"v5\" selected>"));
        assert!(html.contains("<form action=\"/\" method=\"POST\">"));
    }

    #[tokio::test]
    async fn test_form_posts_under_base_path() {
        let mut config = AppConfig::default();
        config.server.base_path = "uuid/".to_string();
        let state = AppState::with_store(config, Arc::new(MemoryCounterStore::new()));
        let view = build_view(&state, &RequestOptions::default()).await;
        assert_eq!(view.action, "/uuid/");
        assert!(render_page(&view).contains("<form action=\"/uuid/\" method=\"POST\">"));
    }

    #[tokio::test]
    async fn test_footer_year_is_current() {
        let view = build_view(&state(), &RequestOptions::default()).await;
        assert_eq!(view.current_year, Utc::now().year());
        assert!(render_page(&view).contains(&format!("&copy; {} uuid ninja", view.current_year)));
    }
}
