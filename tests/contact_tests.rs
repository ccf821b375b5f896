
use mockall::predicate::always;
use portfolio_contact::{entities::email::MailReceipt, errors::MailError};
use reqwest::StatusCode;
use serde_json::{json, Value};
use test_utils::*;

const CLIENT: &str = "203.0.113.10";

#[actix_rt::test]
async fn valid_submission_is_sent_and_returns_id() {
    let mut mailer = MockMailer::new();
    mailer
        .expect_send()
        .times(1)
        .withf(|email| {
            email.subject == "João Silva entrou em contato via Web Portfólio"
                && email.reply_to == "joao@example.com"
                && email.to == vec!["owner@example.com".to_string()]
                && email.from == "onboarding@resend.dev"
        })
        .returning(|_| Ok(MailReceipt { id: MOCK_EMAIL_ID.to_string() }));
    let app = TestApp::spawn(Some(mailer)).await;

    let response = app.post_contact(&valid_submission(), CLIENT).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Email enviado com sucesso!");
    assert_eq!(body["id"], MOCK_EMAIL_ID);
}

#[actix_rt::test]
async fn get_is_rejected_with_405() {
    let app = TestApp::spawn(Some(unused_mailer())).await;

    let response = app
        .client
        .get(app.send_url())
        .header("x-forwarded-for", CLIENT)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Método não permitido" }));
}

#[actix_rt::test]
async fn malformed_json_is_rejected() {
    let app = TestApp::spawn(Some(unused_mailer())).await;

    let response = app.post_raw("invalid json{", CLIENT).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Formato JSON inválido" }));
}

#[actix_rt::test]
async fn json_encoded_as_a_string_is_accepted() {
    let app = TestApp::spawn(Some(accepting_mailer(1))).await;
    let raw = serde_json::to_string(&valid_submission().to_string()).unwrap();

    let response = app.post_raw(&raw, CLIENT).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn missing_fields_are_reported_one_at_a_time() {
    let app = TestApp::spawn(Some(unused_mailer())).await;

    let cases = [
        ("name", "Nome é obrigatório."),
        ("email", "Email é obrigatório."),
        ("message", "Mensagem é obrigatória."),
    ];

    for (field, expected) in cases {
        let response = app.post_contact(&submission_without(field), CLIENT).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "missing {}", field);
        assert_eq!(error_of(response).await, expected);
    }
}

#[actix_rt::test]
async fn non_text_fields_count_as_missing() {
    let app = TestApp::spawn(Some(unused_mailer())).await;

    let response = app.post_contact(&submission_with("name", json!(42)), CLIENT).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(response).await, "Nome é obrigatório.");
}

#[actix_rt::test]
async fn name_length_boundaries() {
    let app = TestApp::spawn(Some(accepting_mailer(2))).await;

    let too_short = app.post_contact(&submission_with("name", json!("A")), "10.0.0.1").await;
    assert_eq!(too_short.status(), StatusCode::BAD_REQUEST);
    assert!(error_of(too_short).await.contains("pelo menos"));

    let too_long = app
        .post_contact(&submission_with("name", json!("A".repeat(101))), "10.0.0.2")
        .await;
    assert_eq!(too_long.status(), StatusCode::BAD_REQUEST);
    assert!(error_of(too_long).await.contains("não pode exceder"));

    let shortest = app.post_contact(&submission_with("name", json!("Jo")), "10.0.0.3").await;
    assert_eq!(shortest.status(), StatusCode::OK);

    let longest = app
        .post_contact(&submission_with("name", json!("A".repeat(100))), "10.0.0.4")
        .await;
    assert_eq!(longest.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn message_length_boundaries() {
    let app = TestApp::spawn(Some(accepting_mailer(2))).await;

    let cases = [
        ("A".repeat(9), StatusCode::BAD_REQUEST, "10.0.1.1"),
        ("A".repeat(10), StatusCode::OK, "10.0.1.2"),
        ("A".repeat(5000), StatusCode::OK, "10.0.1.3"),
        ("A".repeat(5001), StatusCode::BAD_REQUEST, "10.0.1.4"),
    ];

    for (message, status, ip) in cases {
        let response = app.post_contact(&submission_with("message", json!(message)), ip).await;
        assert_eq!(response.status(), status, "message of {} chars", message.len());
    }
}

#[actix_rt::test]
async fn short_name_scenario_mentions_minimum() {
    let app = TestApp::spawn(Some(unused_mailer())).await;
    let body = json!({
        "name": "A",
        "email": "joao@example.com",
        "message": "Mensagem válida."
    });

    let response = app.post_contact(&body, CLIENT).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_of(response).await.contains("pelo menos 2"));
}

#[actix_rt::test]
async fn invalid_email_is_rejected() {
    let app = TestApp::spawn(Some(unused_mailer())).await;

    let response = app
        .post_contact(&submission_with("email", json!("email-invalido")), CLIENT)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Email inválido." }));
}

#[actix_rt::test]
async fn overlong_email_is_rejected_before_syntax_check() {
    let app = TestApp::spawn(Some(unused_mailer())).await;
    let email = format!("{}@example.com", "a".repeat(250));

    let response = app.post_contact(&submission_with("email", json!(email)), CLIENT).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(response).await, "Email muito longo.");
}

#[actix_rt::test]
async fn email_is_trimmed_and_normalized_before_sending() {
    let mut mailer = MockMailer::new();
    mailer
        .expect_send()
        .times(1)
        .withf(|email| email.reply_to == "joao@example.com" && email.html.contains("joao@example.com"))
        .returning(|_| Ok(MailReceipt { id: MOCK_EMAIL_ID.to_string() }));
    let app = TestApp::spawn(Some(mailer)).await;

    let response = app
        .post_contact(&submission_with("email", json!("  JOAO@EXAMPLE.COM  ")), CLIENT)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn all_fields_are_trimmed() {
    let mut mailer = MockMailer::new();
    mailer
        .expect_send()
        .times(1)
        .withf(|email| {
            email.subject.starts_with("João Silva entrou")
                && email.text.ends_with("Mensagem de teste com espaços.")
        })
        .returning(|_| Ok(MailReceipt { id: MOCK_EMAIL_ID.to_string() }));
    let app = TestApp::spawn(Some(mailer)).await;

    let body = json!({
        "name": "  João Silva  ",
        "email": "  joao@example.com  ",
        "message": "  Mensagem de teste com espaços.  "
    });
    let response = app.post_contact(&body, CLIENT).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn header_injection_through_name_is_neutralized() {
    let mut mailer = MockMailer::new();
    mailer
        .expect_send()
        .times(1)
        .withf(|email| {
            email.subject == "AttackerBcc: hacker@evil.com entrou em contato via Web Portfólio"
                && !email.subject.contains('\r')
                && !email.subject.contains('\n')
        })
        .returning(|_| Ok(MailReceipt { id: MOCK_EMAIL_ID.to_string() }));
    let app = TestApp::spawn(Some(mailer)).await;

    let response = app
        .post_contact(
            &submission_with("name", json!("Attacker\r\nBcc: hacker@evil.com")),
            CLIENT,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn dangerous_control_characters_are_stripped() {
    let mut mailer = MockMailer::new();
    mailer
        .expect_send()
        .times(4)
        .withf(|email| email.subject.starts_with("TestUser "))
        .returning(|_| Ok(MailReceipt { id: MOCK_EMAIL_ID.to_string() }));
    let app = TestApp::spawn_with_limits(Some(mailer), 10, std::time::Duration::from_secs(3600)).await;

    for control in ["\r", "\n", "\t", "\u{0}"] {
        let name = format!("Test{}User", control);
        let response = app.post_contact(&submission_with("name", json!(name)), CLIENT).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[actix_rt::test]
async fn name_made_only_of_control_characters_is_rejected() {
    let app = TestApp::spawn(Some(unused_mailer())).await;

    let response = app
        .post_contact(&submission_with("name", json!("\u{1}\u{2}\u{3}")), CLIENT)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(response).await, "Nome inválido.");
}

#[actix_rt::test]
async fn provider_error_is_not_leaked() {
    let mut mailer = MockMailer::new();
    mailer.expect_send().with(always()).times(1).returning(|_| {
        Err(MailError::Provider {
            status: 422,
            name: "validation_error".into(),
            message: "secret provider detail".into(),
        })
    });
    let app = TestApp::spawn(Some(mailer)).await;

    let response = app.post_contact(&valid_submission(), CLIENT).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = error_of(response).await;
    assert_eq!(error, "Erro ao enviar email. Tente novamente mais tarde.");
    assert!(!error.contains("secret"));
}

#[actix_rt::test]
async fn transport_failure_maps_to_internal_error() {
    let mut mailer = MockMailer::new();
    mailer
        .expect_send()
        .times(1)
        .returning(|_| Err(MailError::Transport("connection reset".into())));
    let app = TestApp::spawn(Some(mailer)).await;

    let response = app.post_contact(&valid_submission(), CLIENT).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        error_of(response).await,
        "Erro interno do servidor. Tente novamente mais tarde."
    );
}

#[actix_rt::test]
async fn missing_credentials_fail_with_configuration_error() {
    let app = TestApp::spawn(None).await;

    let response = app.post_contact(&valid_submission(), CLIENT).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error_of(response).await.contains("Configuração do servidor"));
}

#[actix_rt::test]
async fn validation_still_runs_without_credentials() {
    let app = TestApp::spawn(None).await;

    let response = app
        .post_contact(&submission_with("email", json!("email-invalido")), CLIENT)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
