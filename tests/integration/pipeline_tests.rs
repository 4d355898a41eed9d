use super::*;

#[tokio::test]
async fn test_eligible_offer_sends_one_message() {
    let server = mock_telegram(1).await;
    let config = get_test_config(&server.uri());
    let html = results_page(&[train_listing("016А", &[seat_item("Купе", "2 места", "3500")])]);

    let result = create_checker(&config, html).check_date("10.01.2024").await;

    assert!(result.success);
    assert_eq!(result.notifications_sent, 1);

    let messages = sent_messages(&server).await;
    assert_eq!(messages.len(), 1);

    let message = &messages[0];
    let text = message["text"].as_str().unwrap();
    assert_eq!(message["chat_id"], "-1001234567890");
    assert_eq!(message["parse_mode"], "Markdown");
    assert!(text.contains("Купе"));
    assert!(text.contains("3500"));
    assert!(text.contains("016А"));
    assert_eq!(
        message["reply_markup"]["inline_keyboard"][0][0]["url"],
        "https://grandtrain.ru/tickets/2000000-2078750/10.01.2024/?number=016А"
    );
}

#[tokio::test]
async fn test_sold_out_offer_sends_nothing() {
    let server = mock_telegram(0).await;
    let config = get_test_config(&server.uri());
    let html = results_page(&[train_listing(
        "016А",
        &[seat_item("Купе", "Свободных мест нет", "3500")],
    )]);

    let result = create_checker(&config, html).check_date("10.01.2024").await;

    assert!(result.success);
    assert_eq!(result.eligible_trains, 0);
    assert!(sent_messages(&server).await.is_empty());
}

#[tokio::test]
async fn test_message_lists_only_preferred_types() {
    let server = mock_telegram(1).await;
    let config = get_test_config(&server.uri());
    let html = results_page(&[train_listing(
        "016А",
        &[
            seat_item("Купе", "1 место", "3500"),
            seat_item("Плацкарт", "2 места", "2100"),
            seat_item("СВ", "4 места", "7200"),
        ],
    )]);

    create_checker(&config, html).check_date("10.01.2024").await;

    let messages = sent_messages(&server).await;
    let text = messages[0]["text"].as_str().unwrap();
    assert!(text.contains("*Тип:* Купе, *Кол-во:* 1 место, *Цена:* 3500₽"));
    assert!(!text.contains("Плацкарт"));
    assert!(!text.contains("7200"));
}

#[tokio::test]
async fn test_api_failure_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri());
    let html = results_page(&[
        train_listing("016А", &[seat_item("Купе", "2 места", "3500")]),
        train_listing("018А", &[seat_item("Купе", "1 место", "3900")]),
    ]);

    let result = create_checker(&config, html).check_date("10.01.2024").await;

    assert!(result.success);
    assert_eq!(result.trains.len(), 2);
    assert_eq!(result.eligible_trains, 2);
    assert_eq!(result.notifications_sent, 0);
}

#[tokio::test]
async fn test_config_file_drives_pipeline() -> anyhow::Result<()> {
    use std::io::Write;

    let server = mock_telegram(1).await;
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
    write!(
        file,
        r#"
stations:
  from: "2000000"
  to: "2078750"
dates:
  start_date: "2024-01-10"
  days_forward: 1
seat_preferences:
  seat_positions: ["2"]
  seat_types: ["Купе"]
scheduler:
  time_to_sleep_range: [0, 0]
telegram:
  chat_id: "-1001234567890"
  bot_token: "{token}"
  api_base_url: "{uri}"
scraper:
  settle_delay_range: [0, 0]
"#,
        token = BOT_TOKEN,
        uri = server.uri()
    )?;

    let config = AppConfig::from_file(file.path())?;
    let dates = config.target_dates();
    assert_eq!(dates, vec!["10.01.2024"]);

    let html = results_page(&[train_listing("016А", &[seat_item("Купе", "2 места", "3500")])]);
    let result = create_checker(&config, html).check_date(&dates[0]).await;

    assert_eq!(result.notifications_sent, 1);
    Ok(())
}
