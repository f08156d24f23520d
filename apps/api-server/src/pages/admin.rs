//! Admin pages: dashboard, articles, projects.
//!
//! Static placeholders for the management area. The figures are fixed
//! copy until the admin backend lands; the shared frame carries the
//! sidebar and the breadcrumb trail for the current path.

use actix_web::HttpResponse;
use actix_web::http::header::ContentType;

use crate::pages::{breadcrumb, shell};

fn admin_shell(path: &str, title: &str, content: &str) -> HttpResponse {
    let body = format!(
        "<div class=\"admin\">\
         <aside class=\"sidebar\"><nav>\
         <a href=\"/admin\">Dashboard</a>\
         <a href=\"/admin/article\">Articles</a>\
         <a href=\"/admin/project\">Projects</a>\
         </nav></aside>\
         <main>{}{}</main>\
         </div>",
        breadcrumb::render(path),
        content
    );

    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(shell(title, &body))
}

fn stat_card(label: &str, value: &str, note: &str) -> String {
    format!(
        "<div class=\"stat-card\"><h3>{label}</h3>\
         <p class=\"value\">{value}</p><p class=\"note\">{note}</p></div>"
    )
}

/// GET /admin
pub async fn dashboard() -> HttpResponse {
    let cards = [
        stat_card("Total Articles", "24", "+2 this month"),
        stat_card("Total Projects", "12", "+1 this month"),
        stat_card("Total Users", "156", "+12 this month"),
        stat_card("Monthly Visits", "2,847", "+180 from last month"),
    ]
    .join("");

    let content = format!(
        "<h1>Admin Panel</h1>\
         <section class=\"stats\">{cards}</section>\
         <section class=\"quick-actions\"><h2>Quick Actions</h2>\
         <a href=\"/admin/article\">New Article</a>\
         <a href=\"/admin/project\">New Project</a>\
         </section>\
         <section class=\"status\"><h2>System Status</h2><ul>\
         <li>Database: Operational</li>\
         <li>Cache: Operational</li>\
         <li>Storage: Operational</li>\
         </ul></section>"
    );

    admin_shell("/admin", "Admin Panel", &content)
}

/// GET /admin/article
pub async fn articles() -> HttpResponse {
    let cards = [
        stat_card("Total Articles", "24", "All time"),
        stat_card("Published", "18", "Visible to readers"),
        stat_card("Drafts", "6", "Awaiting review"),
    ]
    .join("");

    let content = format!(
        "<h1>Articles</h1>\
         <section class=\"stats\">{cards}</section>\
         <section><h2>Recent Articles</h2>\
         <p>Article management is on its way. Check back soon.</p>\
         </section>"
    );

    admin_shell("/admin/article", "Articles", &content)
}

/// GET /admin/project
pub async fn projects() -> HttpResponse {
    let cards = [
        stat_card("Total Projects", "12", "All time"),
        stat_card("In Progress", "8", "Active builds"),
        stat_card("Completed", "4", "Shipped"),
    ]
    .join("");

    let content = format!(
        "<h1>Projects</h1>\
         <section class=\"stats\">{cards}</section>\
         <section><h2>Project List</h2>\
         <p>Project management is on its way. Check back soon.</p>\
         </section>"
    );

    admin_shell("/admin/project", "Projects", &content)
}
