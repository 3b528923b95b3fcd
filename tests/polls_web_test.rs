//! Public poll pages and the vote form over HTTP

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use common::audit::RecordingSink;
use common::database::{count_votes, setup_test_database};
use common::fixtures::{create_choice, create_open_poll, create_question, create_test_user};
use common::http::{location, update_cookie};
use polls::audit::AuditAction;
use polls::poll::vote::current_vote;

async fn body_of<B: actix_web::body::MessageBody>(resp: actix_web::dev::ServiceResponse<B>) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[actix_rt::test]
async fn test_index_without_polls() {
    let db = setup_test_database().await.unwrap();
    let sink = RecordingSink::new();
    let app = init_app!(db, sink);

    let resp = test::call_service(&app, TestRequest::get().uri("/").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_of(resp).await.contains("No polls are available."));
}

#[actix_rt::test]
async fn test_index_lists_only_published() {
    let db = setup_test_database().await.unwrap();
    let sink = RecordingSink::new();
    create_question(&db, "Past question.", -30, 5).await.unwrap();
    create_question(&db, "Future question.", 30, 40).await.unwrap();
    let app = init_app!(db, sink);

    let resp = test::call_service(&app, TestRequest::get().uri("/polls/").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_of(resp).await;
    assert!(body.contains("Past question."));
    assert!(!body.contains("Future question."));
}

#[actix_rt::test]
async fn test_detail_of_future_question_is_404() {
    let db = setup_test_database().await.unwrap();
    let sink = RecordingSink::new();
    let future = create_question(&db, "Future question.", 5, 10).await.unwrap();
    let app = init_app!(db, sink);

    let req = TestRequest::get()
        .uri(&format!("/polls/{}/", future.id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_detail_of_past_question_shows_text() {
    let db = setup_test_database().await.unwrap();
    let sink = RecordingSink::new();
    let past = create_question(&db, "Past Question.", -5, 5).await.unwrap();
    create_choice(&db, past.id, "Option A").await.unwrap();
    let app = init_app!(db, sink);

    let req = TestRequest::get()
        .uri(&format!("/polls/{}/", past.id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_of(resp).await;
    assert!(body.contains("Past Question."));
    assert!(body.contains("Option A"));
}

#[actix_rt::test]
async fn test_results_follow_publication() {
    let db = setup_test_database().await.unwrap();
    let sink = RecordingSink::new();
    let (past, _, _) = create_open_poll(&db, "Visible results").await.unwrap();
    let future = create_question(&db, "Hidden results", 5, 10).await.unwrap();
    let app = init_app!(db, sink);

    let req = TestRequest::get()
        .uri(&format!("/polls/{}/results/", past.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_of(resp).await.contains("Visible results"));

    let req = TestRequest::get()
        .uri(&format!("/polls/{}/results/", future.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_anonymous_vote_page_redirects_to_login() {
    let db = setup_test_database().await.unwrap();
    let sink = RecordingSink::new();
    let (question, _, _) = create_open_poll(&db, "Login first").await.unwrap();
    let app = init_app!(db, sink);

    let req = TestRequest::get()
        .uri(&format!("/polls/{}/vote/", question.id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let target = location(&resp).unwrap();
    assert!(target.starts_with("/accounts/login/?next="));
}

#[actix_rt::test]
async fn test_authenticated_vote_page_renders() {
    let db = setup_test_database().await.unwrap();
    let sink = RecordingSink::new();
    create_test_user(&db, "viewer").await.unwrap();
    let (question, _, _) = create_open_poll(&db, "Ready to vote").await.unwrap();
    let app = init_app!(db, sink);

    let (cookie, _token) = log_in!(app, "viewer");
    let req = TestRequest::get()
        .uri(&format!("/polls/{}/vote/", question.id))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_of(resp).await.contains("Ready to vote"));
}

#[actix_rt::test]
async fn test_vote_post_redirects_to_results_with_message() {
    let db = setup_test_database().await.unwrap();
    let sink = RecordingSink::new();
    let user = create_test_user(&db, "web_voter").await.unwrap();
    let (question, first, _) = create_open_poll(&db, "Web vote").await.unwrap();
    let app = init_app!(db, sink);

    let (cookie, token) = log_in!(app, "web_voter");
    let choice = first.id.to_string();
    let req = TestRequest::post()
        .uri(&format!("/polls/{}/vote/", question.id))
        .cookie(cookie.clone())
        .set_form(&[("csrf_token", token.as_str()), ("choice", choice.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        location(&resp),
        Some(format!("/polls/{}/results/", question.id))
    );
    let vote = current_vote(&db, user.id, question.id).await.unwrap().unwrap();
    assert_eq!(vote.choice_id, first.id);

    // The success message shows on the next page.
    let mut jar = Some(cookie);
    update_cookie(&mut jar, &resp);
    let req = TestRequest::get()
        .uri(&format!("/polls/{}/results/", question.id))
        .cookie(jar.unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body = body_of(resp).await;
    assert!(body.contains("Already complete your polls."));
    assert!(body.contains("1 vote"));

    let events = sink.events();
    let vote_events: Vec<_> = events
        .iter()
        .filter(|e| e.action == AuditAction::Vote)
        .collect();
    assert_eq!(vote_events.len(), 1);
    assert_eq!(vote_events[0].outcome, "ok");
}

#[actix_rt::test]
async fn test_vote_post_without_choice_rerenders_detail() {
    let db = setup_test_database().await.unwrap();
    let sink = RecordingSink::new();
    create_test_user(&db, "no_pick").await.unwrap();
    let (question, _, _) = create_open_poll(&db, "Pick one").await.unwrap();
    let app = init_app!(db, sink);

    let (cookie, token) = log_in!(app, "no_pick");
    let req = TestRequest::post()
        .uri(&format!("/polls/{}/vote/", question.id))
        .cookie(cookie)
        .set_form(&[("csrf_token", token.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_of(resp).await;
    assert!(body.contains("You didn&#x27;t select a choice.") || body.contains("You didn't select a choice."));
    assert_eq!(count_votes(&db).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_vote_post_on_closed_poll_warns_and_redirects() {
    let db = setup_test_database().await.unwrap();
    let sink = RecordingSink::new();
    create_test_user(&db, "too_late").await.unwrap();
    let question = create_question(&db, "Closed poll", -10, -1).await.unwrap();
    let choice = create_choice(&db, question.id, "Late").await.unwrap();
    let app = init_app!(db, sink);

    let (cookie, token) = log_in!(app, "too_late");
    let choice = choice.id.to_string();
    let req = TestRequest::post()
        .uri(&format!("/polls/{}/vote/", question.id))
        .cookie(cookie.clone())
        .set_form(&[("csrf_token", token.as_str()), ("choice", choice.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp).as_deref(), Some("/"));
    assert_eq!(count_votes(&db).await.unwrap(), 0);

    let mut jar = Some(cookie);
    update_cookie(&mut jar, &resp);
    let req = TestRequest::get().uri("/").cookie(jar.unwrap()).to_request();
    let body = body_of(test::call_service(&app, req).await).await;
    assert!(body.contains("The poll that you selected is not allowed."));
}

#[actix_rt::test]
async fn test_vote_post_on_unpublished_poll_is_404() {
    let db = setup_test_database().await.unwrap();
    let sink = RecordingSink::new();
    create_test_user(&db, "too_early").await.unwrap();
    let question = create_question(&db, "Not yet", 5, 10).await.unwrap();
    let choice = create_choice(&db, question.id, "Soon").await.unwrap();
    let app = init_app!(db, sink);

    let (cookie, token) = log_in!(app, "too_early");
    let choice = choice.id.to_string();
    let req = TestRequest::post()
        .uri(&format!("/polls/{}/vote/", question.id))
        .cookie(cookie)
        .set_form(&[("csrf_token", token.as_str()), ("choice", choice.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_anonymous_vote_post_never_records() {
    let db = setup_test_database().await.unwrap();
    let sink = RecordingSink::new();
    let (question, first, _) = create_open_poll(&db, "Anonymous").await.unwrap();
    let app = init_app!(db, sink);

    let (cookie, token) = new_session!(app);
    let choice = first.id.to_string();
    let req = TestRequest::post()
        .uri(&format!("/polls/{}/vote/", question.id))
        .cookie(cookie)
        .set_form(&[("csrf_token", token.as_str()), ("choice", choice.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).unwrap().starts_with("/accounts/login/"));
    assert_eq!(count_votes(&db).await.unwrap(), 0);
    assert!(sink.events().is_empty());
}

#[actix_rt::test]
async fn test_flash_survives_requests_that_render_no_page() {
    let db = setup_test_database().await.unwrap();
    let sink = RecordingSink::new();
    create_test_user(&db, "kept_message").await.unwrap();
    let question = create_question(&db, "Closed again", -10, -1).await.unwrap();
    let choice = create_choice(&db, question.id, "Late").await.unwrap();
    let app = init_app!(db, sink);

    let (cookie, token) = log_in!(app, "kept_message");
    let choice = choice.id.to_string();
    let req = TestRequest::post()
        .uri(&format!("/polls/{}/vote/", question.id))
        .cookie(cookie.clone())
        .set_form(&[("csrf_token", token.as_str()), ("choice", choice.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let mut jar = Some(cookie);
    update_cookie(&mut jar, &resp);

    // A stray request for something that is not a page.
    let req = TestRequest::get()
        .uri("/favicon.ico")
        .cookie(jar.clone().unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    update_cookie(&mut jar, &resp);

    let req = TestRequest::get().uri("/").cookie(jar.clone().unwrap()).to_request();
    let resp = test::call_service(&app, req).await;
    update_cookie(&mut jar, &resp);
    assert!(body_of(resp)
        .await
        .contains("The poll that you selected is not allowed."));

    // Shown once.
    let req = TestRequest::get().uri("/").cookie(jar.unwrap()).to_request();
    let body = body_of(test::call_service(&app, req).await).await;
    assert!(!body.contains("The poll that you selected is not allowed."));
}

#[actix_rt::test]
async fn test_authenticated_vote_page_of_future_question_is_404() {
    let db = setup_test_database().await.unwrap();
    let sink = RecordingSink::new();
    create_test_user(&db, "eager").await.unwrap();
    let future = create_question(&db, "Future vote", 5, 10).await.unwrap();
    let app = init_app!(db, sink);

    let (cookie, _token) = log_in!(app, "eager");
    let req = TestRequest::get()
        .uri(&format!("/polls/{}/vote/", future.id))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
