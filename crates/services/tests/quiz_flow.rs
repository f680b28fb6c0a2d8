mod common;

use std::sync::Arc;

use quiz_core::model::{QuestionSlot, Subject};
use quiz_core::time::fixed_clock;
use services::{
    Advance, ApiError, AppServices, AuthSession, ExitDecision, LoadFailure, QuizApi, QuizError,
    QuizPhase,
};
use storage::{KeyValueStore, Storage};

use common::{FakeApi, question, stored_user};

async fn signed_in(api: Arc<FakeApi>) -> (AppServices, AuthSession, Storage) {
    let storage = Storage::in_memory();
    storage
        .kv
        .set("user", &stored_user("ana@escola.br", 5))
        .await
        .unwrap();
    storage.kv.set("access_token", "tok-1").await.unwrap();
    let api: Arc<dyn QuizApi> = api;
    let services = AppServices::with_parts(storage.clone(), api, fixed_clock());
    let auth = services.auth_session().await;
    (services, auth, storage)
}

#[tokio::test]
async fn math_quiz_end_to_end() {
    let api = Arc::new(FakeApi::with_questions(vec![
        question("q1", Subject::Math, 5, "B"),
        question("q2", Subject::Math, 5, "D"),
    ]));
    let (services, auth, _storage) = signed_in(Arc::clone(&api)).await;
    let quiz = services.quiz();

    let mut session = quiz.start(Subject::Math, &auth).await.unwrap();
    assert_eq!(session.phase(), &QuizPhase::Answering);
    assert_eq!(api.current_token().as_deref(), Some("tok-1"));

    let query = api.queries.lock().unwrap()[0].clone();
    assert_eq!(query.page, 1);
    assert!(query.shuffle);
    assert_eq!(query.grade.value(), 5);

    session.select_answer("B").unwrap();
    assert_eq!(session.next().unwrap(), Advance::Moved(1));
    session.select_answer("C").unwrap();
    assert_eq!(session.next().unwrap(), Advance::ReadyToConfirm);

    let summary = quiz.finalize(&mut session).await.unwrap().clone();

    let submitted = api.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].correct, 1);
    assert_eq!(submitted[0].total, 2);
    assert_eq!(submitted[0].email, "ana@escola.br");

    assert_eq!(session.phase(), &QuizPhase::Summary);
    assert_eq!(summary.percentage(), 50);
    assert_eq!(summary.rows().len(), 2);
    assert!(summary.rows()[0].is_correct());
    assert!(!summary.rows()[1].is_correct());
    assert_eq!(session.exit_decision(), ExitDecision::Leave);
}

#[tokio::test]
async fn score_counts_wrong_answers() {
    let api = Arc::new(FakeApi::with_questions(vec![
        question("q1", Subject::Math, 5, "A"),
        question("q2", Subject::Math, 5, "B"),
    ]));
    let (services, auth, _storage) = signed_in(Arc::clone(&api)).await;
    let quiz = services.quiz();

    let mut session = quiz.start(Subject::Math, &auth).await.unwrap();
    session.select_answer("A").unwrap();
    session.next().unwrap();
    session.select_answer("C").unwrap();
    session.next().unwrap();
    quiz.finalize(&mut session).await.unwrap();

    let submitted = api.submitted();
    let report = &submitted[0];
    assert_eq!(report.correct, 1);
    assert_eq!(report.total, 2);
    assert!(!report.answers[1].is_correct());

    let body = serde_json::to_value(report).unwrap();
    assert_eq!(body["pontuacao"], 1);
    assert_eq!(body["total_questoes"], 2);
    assert_eq!(body["respostas"][1]["acertou"], false);
}

#[tokio::test]
async fn failed_submission_returns_to_confirming_and_retry_succeeds() {
    let api = Arc::new(FakeApi::with_questions(vec![
        question("q1", Subject::Science, 5, "C"),
    ]));
    api.fail_next_submits(1);
    let (services, auth, _storage) = signed_in(Arc::clone(&api)).await;
    let quiz = services.quiz();

    let mut session = quiz.start(Subject::Science, &auth).await.unwrap();
    session.select_answer("C").unwrap();
    session.next().unwrap();

    let err = quiz.finalize(&mut session).await.unwrap_err();
    assert!(matches!(err, QuizError::Remote(ApiError::Connection(_))));
    assert_eq!(err.to_string(), "connection error: connection reset");
    assert_eq!(session.phase(), &QuizPhase::Confirming);
    assert_eq!(session.selected_answer(), Some("C"));
    assert!(api.submitted().is_empty());

    let summary = quiz.finalize(&mut session).await.unwrap();
    assert_eq!(summary.percentage(), 100);
    assert_eq!(summary.rows().len(), 1);
    assert_eq!(summary.rows()[0].slot, QuestionSlot::from_index(0));
    assert_eq!(api.submitted().len(), 1);
}

#[tokio::test]
async fn empty_question_set_ends_in_error_phase() {
    let api = Arc::new(FakeApi::default());
    let (services, auth, _storage) = signed_in(Arc::clone(&api)).await;
    let quiz = services.quiz();

    let mut session = quiz.begin(Subject::Portuguese, &auth).unwrap();
    let err = quiz.load_questions(&mut session).await.unwrap_err();
    assert!(matches!(err, QuizError::NoQuestions));
    assert_eq!(session.phase(), &QuizPhase::Error(LoadFailure::NoQuestions));
}

#[tokio::test]
async fn fetch_failure_is_distinct_from_empty_set() {
    let api = Arc::new(FakeApi::default());
    *api.fail_fetch.lock().unwrap() = Some(ApiError::Timeout);
    let (services, auth, _storage) = signed_in(Arc::clone(&api)).await;
    let quiz = services.quiz();

    let mut session = quiz.begin(Subject::Math, &auth).unwrap();
    let err = quiz.load_questions(&mut session).await.unwrap_err();
    assert!(matches!(err, QuizError::Remote(ApiError::Timeout)));
    assert!(matches!(
        session.phase(),
        QuizPhase::Error(LoadFailure::Remote(message)) if message.starts_with("connection error")
    ));
}

#[tokio::test]
async fn close_clears_the_answer_bucket() {
    let api = Arc::new(FakeApi::with_questions(vec![question(
        "q1",
        Subject::Math,
        5,
        "A",
    )]));
    let (services, auth, _storage) = signed_in(Arc::clone(&api)).await;
    let quiz = services.quiz();

    let mut session = quiz.start(Subject::Math, &auth).await.unwrap();
    session.select_answer("A").unwrap();
    session.next().unwrap();
    quiz.finalize(&mut session).await.unwrap();

    let key = session.session_key().unwrap().clone();
    assert_eq!(quiz.answer_store().get_all(&key).await.len(), 1);

    quiz.close(&session).await.unwrap();
    assert!(quiz.answer_store().get_all(&key).await.is_empty());
}

#[tokio::test]
async fn rejected_submission_then_abandon_leaves_no_answers_behind() {
    let api = Arc::new(FakeApi::with_questions(vec![
        question("q1", Subject::Math, 5, "A"),
        question("q2", Subject::Math, 5, "B"),
    ]));
    *api.submit_error.lock().unwrap() = Some(ApiError::Unauthorized);
    let (services, auth, _storage) = signed_in(Arc::clone(&api)).await;
    let quiz = services.quiz();

    let mut session = quiz.start(Subject::Math, &auth).await.unwrap();
    session.select_answer("A").unwrap();
    session.next().unwrap();
    session.select_answer("B").unwrap();
    session.next().unwrap();

    let err = quiz.finalize(&mut session).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(session.phase(), &QuizPhase::Confirming);

    let key = session.session_key().unwrap().clone();
    assert_eq!(quiz.answer_store().get_all(&key).await.len(), 2);

    quiz.close(&session).await.unwrap();
    assert!(quiz.answer_store().get_all(&key).await.is_empty());
    assert!(api.submitted().is_empty());
}

#[tokio::test]
async fn quiz_requires_grade_in_profile() {
    let storage = Storage::in_memory();
    storage
        .kv
        .set("user", r#"{"email":"ana@escola.br"}"#)
        .await
        .unwrap();
    let api: Arc<dyn QuizApi> = Arc::new(FakeApi::default());
    let services = AppServices::with_parts(storage, api, fixed_clock());
    let auth = services.auth_session().await;

    let err = services.quiz().begin(Subject::Math, &auth).unwrap_err();
    assert!(matches!(err, QuizError::MissingProfile("grade")));
}
