//! The procedure call endpoint.

use actix_web::{HttpRequest, HttpResponse, web};

use folio_rpc::CallRequest;

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/rpc
///
/// Accepts a JSON array of calls and answers with one response per call,
/// paired by id. Call-level failures ride inside the envelope; the HTTP
/// status stays 200.
pub async fn dispatch_batch(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<Vec<CallRequest>>,
) -> AppResult<HttpResponse> {
    let ctx = state.request_context(&req).await?;
    let responses = state.registry.dispatch_batch(&ctx, body.into_inner()).await;

    Ok(HttpResponse::Ok().json(responses))
}

#[cfg(test)]
mod tests {
    use crate::handlers::configure_routes;
    use crate::state::{AppState, SESSION_COOKIE};
    use actix_web::http::header;
    use actix_web::{App, test, web};
    use folio_core::domain::User;
    use folio_rpc::{CallRequest, CallResponse, ErrorCode, Payload};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn input(json: serde_json::Value) -> Payload {
        Payload {
            json,
            meta: BTreeMap::new(),
        }
    }

    async fn signed_in_state() -> (AppState, String) {
        let state = AppState::in_memory(false);
        let user = state
            .users
            .insert(User::new(
                "Ada".to_string(),
                "ada@example.com".to_string(),
                "hash".to_string(),
            ))
            .await
            .unwrap();
        let session = state.sessions.issue(user.id).await.unwrap();
        (state, session.token.to_string())
    }

    #[actix_web::test]
    async fn test_batch_pairs_responses_and_isolates_failures() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::in_memory(false)))
                .configure(configure_routes),
        )
        .await;

        let calls = vec![
            CallRequest::new(4, "post.hello", input(json!({"text": "world"}))),
            CallRequest::new(9, "post.nope", Payload::null()),
        ];

        let req = test::TestRequest::post()
            .uri("/api/rpc")
            .set_json(&calls)
            .to_request();
        let responses: Vec<CallResponse> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, 4);
        assert_eq!(
            responses[0].result.as_ref().unwrap().json,
            json!({"greeting": "Hello world"})
        );
        assert_eq!(responses[1].id, 9);
        assert_eq!(
            responses[1].error.as_ref().unwrap().code,
            ErrorCode::NotFound
        );
    }

    #[actix_web::test]
    async fn test_protected_call_without_cookie_is_unauthorized_in_band() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::in_memory(false)))
                .configure(configure_routes),
        )
        .await;

        let calls = vec![CallRequest::new(1, "post.getSecretMessage", Payload::null())];
        let req = test::TestRequest::post()
            .uri("/api/rpc")
            .set_json(&calls)
            .to_request();

        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());

        let responses: Vec<CallResponse> = test::read_body_json(res).await;
        assert_eq!(
            responses[0].error.as_ref().unwrap().code,
            ErrorCode::Unauthorized
        );
    }

    #[actix_web::test]
    async fn test_session_cookie_authenticates_protected_calls() {
        let (state, token) = signed_in_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let calls = vec![CallRequest::new(1, "post.getSecretMessage", Payload::null())];
        let req = test::TestRequest::post()
            .uri("/api/rpc")
            .insert_header((header::COOKIE, format!("{SESSION_COOKIE}={token}")))
            .set_json(&calls)
            .to_request();

        let responses: Vec<CallResponse> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            responses[0].result.as_ref().unwrap().json,
            json!("you can now see this secret message!")
        );
    }

    #[actix_web::test]
    async fn test_garbage_session_cookie_degrades_to_anonymous() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::in_memory(false)))
                .configure(configure_routes),
        )
        .await;

        let calls = vec![CallRequest::new(1, "post.hello", input(json!({"text": "x"})))];
        let req = test::TestRequest::post()
            .uri("/api/rpc")
            .insert_header((header::COOKIE, format!("{SESSION_COOKIE}=not-a-token")))
            .set_json(&calls)
            .to_request();

        let responses: Vec<CallResponse> = test::call_and_read_body_json(&app, req).await;
        assert!(responses[0].error.is_none());
    }
}
