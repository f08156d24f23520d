//! Path-derived breadcrumb trail for the admin pages.

use crate::pages::escape_html;

/// One step in the trail. The current page carries no link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub label: String,
    pub href: Option<String>,
}

fn label_for(segment: &str) -> String {
    match segment {
        "admin" => "Admin Panel".to_string(),
        "article" => "Articles".to_string(),
        "project" => "Projects".to_string(),
        other => other.to_string(),
    }
}

/// Derive the trail from a request path.
///
/// Each segment becomes a crumb linking to the path up to and including
/// itself; the final segment is the current page and gets no link.
/// Unmapped segments keep their raw spelling.
pub fn trail(path: &str) -> Vec<Crumb> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut crumbs = Vec::with_capacity(segments.len());
    let mut href = String::new();

    for (i, segment) in segments.iter().enumerate() {
        href.push('/');
        href.push_str(segment);
        let is_last = i == segments.len() - 1;
        crumbs.push(Crumb {
            label: label_for(segment),
            href: (!is_last).then(|| href.clone()),
        });
    }

    crumbs
}

/// Render the trail as markup, segments separated by " / ".
pub fn render(path: &str) -> String {
    let crumbs = trail(path);
    let mut out = String::from("<nav class=\"breadcrumb\">");

    for (i, crumb) in crumbs.iter().enumerate() {
        if i > 0 {
            out.push_str(" / ");
        }
        match &crumb.href {
            Some(href) => out.push_str(&format!(
                "<a href=\"{}\">{}</a>",
                escape_html(href),
                escape_html(&crumb.label)
            )),
            None => out.push_str(&format!(
                "<span aria-current=\"page\">{}</span>",
                escape_html(&crumb.label)
            )),
        }
    }

    out.push_str("</nav>");
    out
}
