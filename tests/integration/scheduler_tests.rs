use super::*;
use grandtrain_watcher::scheduler::PollScheduler;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_cycle_notifies_every_date() {
    let server = mock_telegram(3).await;
    let config = get_test_config(&server.uri());
    let html = results_page(&[train_listing("016А", &[seat_item("Купе", "2 места", "3500")])]);

    let scheduler = PollScheduler::new(
        create_checker(&config, html),
        config.target_dates(),
        config.scheduler.clone(),
        CancellationToken::new(),
    );

    let report = scheduler.run_cycle(1).await;

    assert_eq!(report.dates_checked, 3);
    assert_eq!(report.dates_failed, 0);
    assert_eq!(report.notifications_sent, 3);

    let mut dates: Vec<String> = sent_messages(&server)
        .await
        .iter()
        .map(|message| {
            let url = message["reply_markup"]["inline_keyboard"][0][0]["url"].as_str().unwrap();
            url.split('/').nth(5).unwrap().to_string()
        })
        .collect();
    dates.sort();
    assert_eq!(dates, vec!["10.01.2024", "11.01.2024", "12.01.2024"]);
}

#[tokio::test]
async fn test_run_exits_when_cancelled() -> anyhow::Result<()> {
    let server = mock_telegram(3).await;
    let mut config = get_test_config(&server.uri());
    config.scheduler.time_to_sleep_range = vec![3600, 3600];
    let html = results_page(&[train_listing("016А", &[seat_item("Купе", "2 места", "3500")])]);

    let shutdown = CancellationToken::new();
    let scheduler = PollScheduler::new(
        create_checker(&config, html),
        config.target_dates(),
        config.scheduler.clone(),
        shutdown.clone(),
    );

    let handle = tokio::spawn(async move { scheduler.run().await });

    // The first cycle completes, then the loop sits in its hour-long sleep.
    let delivered = wait_for_messages(&server, 3, Duration::from_secs(10)).await;
    shutdown.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle).await??;
    assert!(delivered);
    outcome?;
    Ok(())
}

async fn wait_for_messages(server: &MockServer, count: usize, timeout: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if sent_messages(server).await.len() >= count {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
