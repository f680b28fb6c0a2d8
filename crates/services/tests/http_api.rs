use std::sync::{Arc, Mutex};
use std::time::Duration;

use quiz_core::model::{
    AccessToken, Credentials, Grade, QuestionId, QuestionResult, ResultId, ResultReport, Subject,
};
use quiz_core::time::fixed_clock;
use services::{
    ApiConfig, ApiError, AppServices, HttpQuizApi, QuestionQuery, QuizApi, QuizError, QuizPhase,
};
use storage::{KeyValueStore, Storage};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves one canned response per connection and records each raw request.
async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            log.lock().unwrap().push(request);
            let response = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
    });

    (format!("http://{addr}/api"), seen)
}

/// Answers the first connection with `body`, then accepts one more request
/// and never replies to it.
async fn serve_then_stall(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();

        let (mut silent, _) = listener.accept().await.unwrap();
        read_request(&mut silent).await;
        // Hold the socket until the client gives up.
        let mut rest = [0_u8; 64];
        while matches!(silent.read(&mut rest).await, Ok(n) if n > 0) {}
    });

    format!("http://{addr}/api")
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let Ok(n) = socket.read(&mut chunk).await else {
            break;
        };
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let lower = line.to_ascii_lowercase();
                    lower
                        .strip_prefix("content-length:")
                        .map(|v| v.trim().parse::<usize>().unwrap())
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn client(base: &str) -> HttpQuizApi {
    HttpQuizApi::new(&ApiConfig::new(base).unwrap()).unwrap()
}

const QUESTIONS_PAGE: &str = r#"{
    "total": 1, "totalPages": 1, "page": 1, "limit": 10,
    "hasNext": false, "hasPrev": false,
    "data": [{
        "_id": "665f1c",
        "disciplina": "MA",
        "ano": "5",
        "codigo": "EF05MA01",
        "questao": {
            "enunciado": "Quanto é 7 x 8?",
            "alternativas": {"A": "54", "B": "56", "C": "58", "D": "64"},
            "gabarito": "B"
        }
    }]
}"#;

#[tokio::test]
async fn fetch_questions_sends_filters_and_bearer_token() {
    let (base, seen) = serve(vec![(200, QUESTIONS_PAGE)]).await;
    let api = client(&base);
    api.set_access_token(Some(AccessToken::new("tok-123")));

    let query = QuestionQuery::first_page(Subject::Math, Grade::new(5).unwrap());
    let page = api.fetch_questions(&query).await.unwrap();

    assert_eq!(page.data.len(), 1);
    let question = &page.data[0];
    assert_eq!(question.id().as_str(), "665f1c");
    assert_eq!(question.answer_key(), "B");
    assert_eq!(question.grade().value(), 5);

    let request = seen.lock().unwrap()[0].clone();
    let head = request.lines().next().unwrap();
    assert!(head.starts_with("GET /api/questoes?"), "{head}");
    assert!(head.contains("page=1"));
    assert!(head.contains("disciplina=MA"));
    assert!(head.contains("ano=5"));
    assert!(head.contains("shuffle=true"));
    assert!(request.to_ascii_lowercase().contains("authorization: bearer tok-123"));
}

#[tokio::test]
async fn login_posts_senha_and_decodes_token() {
    let (base, seen) = serve(vec![(
        200,
        r#"{"access_token":"abc","user":{"email":"ana@escola.br","metadata":{"ano":5}}}"#,
    )])
    .await;
    let api = client(&base);

    let response = api
        .login(&Credentials::new("ana@escola.br", "segredo"))
        .await
        .unwrap();
    assert_eq!(response.access_token.unwrap().expose(), "abc");

    let request = seen.lock().unwrap()[0].clone();
    assert!(request.starts_with("POST /api/auth/login "));
    assert!(request.contains(r#""senha":"segredo""#));
    assert!(!request.to_ascii_lowercase().contains("authorization:"));
}

#[tokio::test]
async fn unauthorized_maps_to_unauthorized() {
    let (base, _seen) = serve(vec![(401, r#"{"message":"Token inválido"}"#)]).await;
    let api = client(&base);

    let err = api.list_results(1, "ana@escola.br").await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn missing_result_is_not_found_with_server_message() {
    let (base, seen) = serve(vec![(
        404,
        r#"{"success":false,"message":"Resultado não encontrado"}"#,
    )])
    .await;
    let api = client(&base);

    let err = api.fetch_result(&ResultId::new("nope")).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref m) if m == "Resultado não encontrado"));
    assert!(seen.lock().unwrap()[0].starts_with("GET /api/resultados/nope "));
}

#[tokio::test]
async fn submit_result_puts_report_and_accepts_empty_body() {
    let (base, seen) = serve(vec![(200, "")]).await;
    let api = client(&base);

    let report = ResultReport::new(
        Subject::Math,
        Grade::new(5).unwrap(),
        "ana@escola.br",
        vec![
            QuestionResult::new(QuestionId::new("q1"), "EF05MA01", "B", "B"),
            QuestionResult::new(QuestionId::new("q2"), "EF05MA02", "C", "D"),
        ],
    );
    let body = api.submit_result(&report).await.unwrap();
    assert!(body.is_null());

    let request = seen.lock().unwrap()[0].clone();
    assert!(request.starts_with("PUT /api/resultados "));
    assert!(request.contains(r#""pontuacao":1"#));
    assert!(request.contains(r#""total_questoes":2"#));
}

#[tokio::test]
async fn server_error_uses_status_reason_without_message() {
    let (base, _seen) = serve(vec![(500, "oops")]).await;
    let api = client(&base);

    let err = api
        .fetch_question(&QuestionId::new("q1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Status { .. }));
    assert_eq!(err.message(), "Internal Server Error");
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let api = client(&format!("http://{addr}/"));

    let err = api.logout().await.unwrap_err();
    assert!(matches!(err, ApiError::Connection(_)));
    assert!(err.message().starts_with("connection error"));
}

#[tokio::test]
async fn slow_submission_times_out_and_keeps_the_quiz_open() {
    let base = serve_then_stall(QUESTIONS_PAGE).await;
    let config = ApiConfig::new(&base)
        .unwrap()
        .with_timeout(Duration::from_millis(200));
    let api: Arc<dyn QuizApi> = Arc::new(HttpQuizApi::new(&config).unwrap());

    let storage = Storage::in_memory();
    storage
        .kv
        .set("user", r#"{"email":"ana@escola.br","metadata":{"ano":5}}"#)
        .await
        .unwrap();
    let services = AppServices::with_parts(storage, api, fixed_clock());
    let auth = services.auth_session().await;
    let quiz = services.quiz();

    let mut session = quiz.start(Subject::Math, &auth).await.unwrap();
    session.select_answer("B").unwrap();
    session.next().unwrap();

    let err = quiz.finalize(&mut session).await.unwrap_err();
    assert!(matches!(err, QuizError::Remote(ApiError::Timeout)));
    assert_eq!(err.to_string(), "connection error: request timed out");
    assert_eq!(session.phase(), &QuizPhase::Confirming);
    assert_eq!(session.selected_answer(), Some("B"));
}
