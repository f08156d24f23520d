//! Landing page.
//!
//! The portfolio front page. Renders the public profile sections plus the
//! community post list, and, for signed-in visitors, the latest-post
//! widget. Queries run in process through a [`Caller`]; their results are
//! dehydrated into the page for the client script, which only fetches
//! what the server did not already resolve.

use actix_web::http::header::ContentType;
use actix_web::{HttpRequest, HttpResponse, web};

use folio_core::domain::Post;
use folio_rpc::{Caller, NoInput, Payload};

use crate::middleware::error::{AppError, AppResult};
use crate::pages::{escape_html, shell};
use crate::state::AppState;

const PROFILE_NAME: &str = "Alex Chen";
const PROFILE_TITLE: &str = "Full-Stack Web Developer";
const PROFILE_META: &str = "Based in Shanghai, five years building for the web";
const PROFILE_BIO: &str = "I build fast, typed web applications end to end, from database \
     schema to polished interface. Lately that means server-driven rendering, edge \
     deployment, and keeping the type system honest across the network boundary.";

const TECH_STACK: [&str; 7] = [
    "TypeScript",
    "React",
    "Next.js",
    "Node.js",
    "tRPC",
    "Tailwind CSS",
    "PostgreSQL",
];

const PROJECTS: [(&str, &str); 3] = [
    (
        "Folio",
        "This site. A server-rendered portfolio with a typed procedure API and a \
         hydrating query cache.",
    ),
    (
        "Shipmate",
        "Deployment dashboard that tails build logs over WebSockets and rolls back \
         a bad release in one click.",
    ),
    (
        "Inkwell",
        "Markdown-first writing app with offline sync and full-text search.",
    ),
];

const ARTICLES: [(&str, &str); 3] = [
    (
        "Batching RPC calls without losing types",
        "Why one round trip per render beats a request waterfall, and how to keep \
         the compiler in the loop.",
    ),
    (
        "A 30-second cache is plenty",
        "Staleness tuning for content that changes a few times a day.",
    ),
    (
        "Forms without a framework",
        "Progressive enhancement for the three forms this site actually has.",
    ),
];

/// GET /
pub async fn landing(state: web::Data<AppState>, req: HttpRequest) -> AppResult<HttpResponse> {
    let ctx = state.request_context(&req).await?;
    let session = ctx.session.clone();
    let caller = Caller::new(state.registry.clone(), ctx);

    let posts: Vec<Post> = match caller.query_as("post.getAll", &NoInput).await {
        Ok(posts) => posts,
        Err(e) => {
            tracing::warn!("Failed to load posts for landing page: {e}");
            Vec::new()
        }
    };

    // Started, not awaited: the widget needs it after load, the page does
    // not need it to render
    if session.is_some() {
        caller.prefetch("post.getLatest", Payload::null());
    }

    let dehydrated = caller.dehydrate().await;
    let state_json = serde_json::to_string(&dehydrated)
        .map_err(|e| AppError::Internal(format!("Failed to serialize query state: {e}")))?
        .replace('<', "\\u003c");

    let nav_session = match &session {
        Some(user) => format!(
            "<span>Signed in as {}</span> <a href=\"/signout\">Sign out</a>",
            escape_html(&user.name)
        ),
        None => "<a href=\"/signin\">Sign in</a>".to_string(),
    };

    let tech_items: String = TECH_STACK
        .iter()
        .map(|tech| format!("<li>{}</li>", escape_html(tech)))
        .collect();

    let project_items: String = PROJECTS
        .iter()
        .map(|(name, blurb)| {
            format!(
                "<article><h3>{}</h3><p>{}</p></article>",
                escape_html(name),
                escape_html(blurb)
            )
        })
        .collect();

    let article_items: String = ARTICLES
        .iter()
        .map(|(title, summary)| {
            format!(
                "<article><h3>{}</h3><p>{}</p></article>",
                escape_html(title),
                escape_html(summary)
            )
        })
        .collect();

    let post_list = if posts.is_empty() {
        "<p>No posts yet.</p>".to_string()
    } else {
        let items: String = posts
            .iter()
            .map(|post| format!("<li>{}</li>", escape_html(&post.name)))
            .collect();
        format!("<ul>{items}</ul>")
    };

    let member_area = if session.is_some() {
        "<section id=\"latest-post\"><h2>Your Posts</h2>\
         <p id=\"latest-post-status\">Loading...</p>\
         <form id=\"create-post-form\">\
         <input type=\"text\" name=\"name\" placeholder=\"Title\" required>\
         <button type=\"submit\">Submit</button>\
         </form></section>"
    } else {
        ""
    };

    let body = format!(
        "<header><nav><a class=\"brand\" href=\"/\">Folio</a>{nav_session}</nav></header>\
         <main>\
         <section class=\"hero\"><h1>{name}</h1><p>{title}</p>\
         <p class=\"meta\">{meta}</p></section>\
         <section class=\"about\"><h2>About</h2><p>{bio}</p></section>\
         <section class=\"stack\"><h2>Tech Stack</h2><ul>{tech_items}</ul></section>\
         <section class=\"projects\"><h2>Projects</h2>{project_items}</section>\
         <section class=\"articles\"><h2>Articles</h2>{article_items}</section>\
         <section class=\"posts\"><h2>Community Posts</h2>{post_list}</section>\
         {member_area}\
         </main>\
         <footer><p>Folio</p></footer>\
         <script id=\"rpc-state\" type=\"application/json\">{state_json}</script>\
         <script>{HYDRATION_SCRIPT}</script>",
        name = escape_html(PROFILE_NAME),
        title = escape_html(PROFILE_TITLE),
        meta = escape_html(PROFILE_META),
        bio = escape_html(PROFILE_BIO),
    );

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(shell(PROFILE_NAME, &body)))
}

/// Client-side hydration. Reads the dehydrated state, resolves the
/// latest-post widget from cache or over `/api/rpc`, and wires the
/// create-post form.
const HYDRATION_SCRIPT: &str = r#"
(function () {
  var stateTag = document.getElementById('rpc-state');
  var state = stateTag ? JSON.parse(stateTag.textContent) : { queries: [] };

  function entry(path) {
    for (var i = 0; i < state.queries.length; i++) {
      if (state.queries[i].key.path === path) return state.queries[i];
    }
    return null;
  }

  function call(path, input) {
    return fetch('/api/rpc', {
      method: 'POST',
      headers: { 'content-type': 'application/json', 'x-trpc-source': 'browser' },
      body: JSON.stringify([{ id: 1, path: path, input: { json: input } }])
    })
      .then(function (res) { return res.json(); })
      .then(function (batch) {
        var response = batch[0];
        if (response.error) throw new Error(response.error.message);
        return response.result.json;
      });
  }

  function showLatest(post) {
    var status = document.getElementById('latest-post-status');
    if (!status) return;
    status.textContent = post
      ? 'Your most recent post: ' + post.name
      : 'You have no posts yet.';
  }

  var latest = entry('post.getLatest');
  if (latest) {
    if (latest.state.status === 'success') {
      showLatest(latest.state.data.json);
    } else {
      call('post.getLatest', null).then(showLatest);
    }
  }

  var form = document.getElementById('create-post-form');
  if (form) {
    form.addEventListener('submit', function (event) {
      event.preventDefault();
      var field = form.querySelector('input[name="name"]');
      var button = form.querySelector('button');
      button.disabled = true;
      button.textContent = 'Submitting...';
      call('post.create', { name: field.value })
        .then(function () {
          field.value = '';
          return call('post.getLatest', null);
        })
        .then(showLatest)
        .catch(function (err) { alert(err.message); })
        .finally(function () {
          button.disabled = false;
          button.textContent = 'Submit';
        });
    });
  }
})();
"#;
