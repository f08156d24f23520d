//! Sign-in and sign-out pages.
//!
//! Plain forms posting to the `/auth` routes. Sign-out gets its own
//! confirmation page so a stray link click never ends a session.

use actix_web::HttpResponse;
use actix_web::http::header::ContentType;

use crate::pages::shell;

/// GET /signin
pub async fn signin_page() -> HttpResponse {
    let body = "<main class=\"auth\">\
         <h1>Sign in</h1>\
         <form action=\"/auth/signin\" method=\"post\">\
         <label>Email <input type=\"email\" name=\"email\" required></label>\
         <label>Password <input type=\"password\" name=\"password\" required></label>\
         <button type=\"submit\">Sign in</button>\
         </form>\
         <h2>New here?</h2>\
         <form action=\"/auth/register\" method=\"post\">\
         <label>Name <input type=\"text\" name=\"name\" required></label>\
         <label>Email <input type=\"email\" name=\"email\" required></label>\
         <label>Password <input type=\"password\" name=\"password\" required minlength=\"8\"></label>\
         <button type=\"submit\">Create account</button>\
         </form>\
         </main>";

    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(shell("Sign in", body))
}

/// GET /signout
pub async fn signout_page() -> HttpResponse {
    let body = "<main class=\"auth\">\
         <h1>Sign out</h1>\
         <p>Are you sure you want to sign out?</p>\
         <a href=\"/\">Cancel</a>\
         <form action=\"/auth/signout\" method=\"post\">\
         <button type=\"submit\">Confirm Sign Out</button>\
         </form>\
         </main>";

    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(shell("Sign out", body))
}
