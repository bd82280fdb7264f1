mod common;

use common::*;
use tune_core::{GameRules, RiddleError};
use tune_types::{DailyStats, Guess};

fn guess(performer: &str, title: &str, round: u32) -> Guess {
    Guess {
        performer: performer.to_string(),
        title: title.to_string(),
        round,
    }
}

#[tokio::test]
async fn test_todays_riddle_serves_first_frame() {
    let setup = TestRiddle::new(vec![toto_answer(today())]);

    let response = setup.service.todays_riddle("80s").await.unwrap();

    assert_eq!(response.guesses, 0);
    assert_eq!(response.next_picture, Some(1));
    assert_eq!(response.next_picture_contents, format!("80s-{}-0", today()));
    assert!(response.revealed.is_none());
    assert!(response.all_picture_contents.is_none());
}

#[tokio::test]
async fn test_exact_guess_wins_and_records_round_one() {
    let setup = TestRiddle::new(vec![toto_answer(today())]);

    let response = setup
        .service
        .take_guess("80s", &guess("toto", "africa", 1))
        .await
        .unwrap();

    assert!(response.performer_correct);
    assert!(response.title_correct);
    assert_eq!(response.revealed.as_ref().unwrap().title, "Africa");
    assert_eq!(response.next_picture, None);
    assert_eq!(setup.stats.calls(), vec![("80s".to_string(), today(), 1, true)]);
}

#[tokio::test]
async fn test_wrong_guess_moves_to_next_frame_without_stats() {
    let setup = TestRiddle::new(vec![toto_answer(today())]);

    let response = setup
        .service
        .take_guess("80s", &guess("Genesis", "Invisible Touch", 1))
        .await
        .unwrap();

    assert!(!response.performer_correct);
    assert!(!response.title_correct);
    assert!(response.revealed.is_none());
    assert!(response.performer_hint.is_none());
    assert_eq!(response.next_picture, Some(2));
    assert_eq!(response.next_picture_contents, format!("80s-{}-1", today()));
    assert!(response.all_picture_contents.is_none());
    assert!(setup.stats.calls().is_empty());
    // Only the next frame was fetched, never the gallery
    assert_eq!(setup.images.requested_indices(), vec![1]);
}

#[tokio::test]
async fn test_fuzzy_win_records_submitted_round() {
    let setup = TestRiddle::new(vec![toto_answer(today())]);

    let response = setup
        .service
        .take_guess("80s", &guess("T0T0!", "Africaa", 3))
        .await
        .unwrap();

    assert!(response.revealed.is_some());
    assert_eq!(response.guesses, 3);
    assert_eq!(setup.stats.calls(), vec![("80s".to_string(), today(), 3, true)]);
}

#[tokio::test]
async fn test_last_round_reveals_and_records_failure() {
    let setup = TestRiddle::new(vec![toto_answer(today())]);

    let response = setup
        .service
        .take_guess("80s", &guess("Journey", "Don't Stop Believin'", 8))
        .await
        .unwrap();

    let revealed = response.revealed.unwrap();
    assert_eq!(revealed.performer, "Toto");
    assert_eq!(revealed.title, "Africa");
    assert_eq!(response.performer_hint.as_deref(), Some("Toto"));
    assert_eq!(response.next_picture, None);
    assert_eq!(setup.stats.calls(), vec![("80s".to_string(), today(), 8, false)]);
}

#[tokio::test]
async fn test_gallery_attached_only_on_termination() {
    let setup = TestRiddle::new(vec![toto_answer(today())]);

    let response = setup
        .service
        .take_guess("80s", &guess("Toto", "Africa", 2))
        .await
        .unwrap();

    let gallery = response.all_picture_contents.unwrap();
    assert_eq!(gallery.len(), 8);
    for (index, frame) in gallery.iter().enumerate() {
        assert_eq!(frame, &format!("80s-{}-{}", today(), index));
    }
    assert_eq!(setup.images.requested_indices(), (0..8).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_performer_hint_while_title_unsolved() {
    let setup = TestRiddle::new(vec![toto_answer(today())]);

    let response = setup
        .service
        .take_guess("80s", &guess("toto", "Rosanna", 4))
        .await
        .unwrap();

    assert!(response.performer_correct);
    assert!(!response.title_correct);
    assert_eq!(response.performer_hint.as_deref(), Some("Toto"));
    assert!(response.revealed.is_none());
    assert_eq!(response.next_picture, Some(5));
    assert!(setup.stats.calls().is_empty());
}

#[tokio::test]
async fn test_each_terminal_submission_records_once() {
    let setup = TestRiddle::new(vec![toto_answer(today())]);

    for round in 1..8 {
        setup
            .service
            .take_guess("80s", &guess("Queen", "Radio Ga Ga", round))
            .await
            .unwrap();
    }
    assert!(setup.stats.calls().is_empty());

    setup
        .service
        .take_guess("80s", &guess("Queen", "Radio Ga Ga", 8))
        .await
        .unwrap();
    assert_eq!(setup.stats.calls().len(), 1);
}

#[tokio::test]
async fn test_missing_answer_is_data_unavailable() {
    let setup = TestRiddle::new(vec![]);

    let err = setup
        .service
        .take_guess("80s", &guess("Toto", "Africa", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, RiddleError::DataUnavailable { .. }));
    assert!(setup.stats.calls().is_empty());

    let err = setup.service.todays_riddle("80s").await.unwrap_err();
    assert!(matches!(err, RiddleError::DataUnavailable { .. }));
}

#[tokio::test]
async fn test_unknown_category_is_rejected() {
    let setup = TestRiddle::new(vec![toto_answer(today())]);

    let err = setup
        .service
        .take_guess("70s", &guess("Toto", "Africa", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, RiddleError::UnknownCategory { category } if category == "70s"));

    let err = setup.service.monthly_stats("70s").await.unwrap_err();
    assert!(matches!(err, RiddleError::UnknownCategory { .. }));
}

#[tokio::test]
async fn test_round_zero_is_invalid() {
    let setup = TestRiddle::new(vec![toto_answer(today())]);
    let err = setup
        .service
        .take_guess("80s", &guess("Toto", "Africa", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, RiddleError::InvalidRound { round: 0 }));
}

#[tokio::test]
async fn test_fallback_answer_uses_its_own_frames() {
    let old_date = day(2023, 11, 3);
    let setup = TestRiddle::new(vec![toto_answer(old_date)]);

    let response = setup.service.todays_riddle("80s").await.unwrap();
    assert_eq!(response.next_picture_contents, format!("80s-{old_date}-0"));

    // Stats still belong to today
    setup
        .service
        .take_guess("80s", &guess("Toto", "Africa", 1))
        .await
        .unwrap();
    assert_eq!(setup.stats.calls()[0].1, today());
}

#[tokio::test]
async fn test_image_failure_commits_no_stats() {
    let answers = std::sync::Arc::new(MemoryAnswers::with(vec![toto_answer(today())]));
    let stats = std::sync::Arc::new(MemoryStats::default());
    let service = tune_core::RiddleService::new(
        answers,
        stats.clone(),
        std::sync::Arc::new(FakeImages {
            fail: true,
            ..FakeImages::default()
        }),
        std::sync::Arc::new(tune_core::FixedClock(today())),
        GameRules::default(),
        vec!["80s".to_string()],
    );

    let result = service.take_guess("80s", &guess("Toto", "Africa", 1)).await;
    assert!(matches!(result, Err(RiddleError::Storage(_))));
    assert!(stats.calls().is_empty());
}

#[tokio::test]
async fn test_monthly_stats_only_current_month() {
    let setup = TestRiddle::new(vec![toto_answer(today())]);
    setup.stats.seed("80s", DailyStats::new(day(2024, 5, 31)));
    setup.stats.seed("80s", DailyStats::new(day(2024, 6, 10)));
    setup.stats.seed("80s", DailyStats::new(day(2023, 6, 12)));
    setup.stats.seed("80s", DailyStats::new(day(2024, 6, 1)));
    setup.stats.seed("90s", DailyStats::new(day(2024, 6, 2)));

    let stats = setup.service.monthly_stats("80s").await.unwrap();

    assert_eq!(month_of(&stats), vec![(2024, 6), (2024, 6)]);
    assert_eq!(stats[0].date, day(2024, 6, 1));
    assert_eq!(stats[1].date, day(2024, 6, 10));
}

#[tokio::test]
async fn test_outcomes_accumulate_in_daily_stats() {
    let setup = TestRiddle::with_rules(
        vec![toto_answer(today())],
        GameRules {
            hint_after_round: 6,
            ..GameRules::default()
        },
    );

    for (performer, round) in [("Toto", 2), ("Toto", 2), ("Journey", 8), ("Toto", 5)] {
        setup
            .service
            .take_guess("80s", &guess(performer, "Africa", round))
            .await
            .unwrap();
    }

    let stats = setup.service.monthly_stats("80s").await.unwrap();
    assert_eq!(stats.len(), 1);
    let today_stats = &stats[0];
    assert_eq!(today_stats.successes, 3);
    assert_eq!(today_stats.failures, 1);
    assert_eq!(today_stats.guess_to_success.get(&2), Some(&2));
    assert_eq!(today_stats.guess_to_success.get(&5), Some(&1));
}

#[tokio::test]
async fn test_game_without_rounds_ends_on_first_guess() {
    let setup = TestRiddle::with_rules(
        vec![toto_answer(today())],
        GameRules {
            max_rounds: 0,
            ..GameRules::default()
        },
    );

    let response = setup
        .service
        .take_guess("80s", &guess("Journey", "Separate Ways", 1))
        .await
        .unwrap();

    assert!(response.revealed.is_some());
    assert_eq!(response.all_picture_contents, Some(vec![]));
    assert_eq!(setup.stats.calls(), vec![("80s".to_string(), today(), 1, false)]);
}

#[tokio::test]
async fn test_solved_guess_unlocks_video() {
    let mut answer = toto_answer(today());
    answer.video_file = Some("vid/80s/2024-06-15.mp4".to_string());
    let setup = TestRiddle::new(vec![answer]);

    let video = setup
        .service
        .solved_video("80s", &guess("toto", "afrika", 4))
        .await
        .unwrap();

    assert_eq!(video, "vid/80s/2024-06-15.mp4");
    assert!(setup.stats.calls().is_empty());
}

#[tokio::test]
async fn test_video_stays_locked_without_full_match() {
    let mut answer = toto_answer(today());
    answer.video_file = Some("vid/80s/2024-06-15.mp4".to_string());
    let setup = TestRiddle::new(vec![answer]);

    // Exhausting the rounds reveals the answer but does not count as solving it
    for attempt in [guess("Toto", "Rosanna", 3), guess("Journey", "Africa", 8)] {
        let err = setup.service.solved_video("80s", &attempt).await.unwrap_err();
        assert!(matches!(err, RiddleError::NotSolved));
    }
}

#[tokio::test]
async fn test_solved_guess_without_archived_video() {
    let setup = TestRiddle::new(vec![toto_answer(today())]);

    let err = setup
        .service
        .solved_video("80s", &guess("Toto", "Africa", 2))
        .await
        .unwrap_err();

    assert!(matches!(err, RiddleError::VideoMissing { date } if date == today()));
}
