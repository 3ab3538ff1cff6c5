use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use pocket_zoo::api::create_router;
use pocket_zoo::config::Config;
use pocket_zoo::db::Database;
use pocket_zoo::models::*;
use pocket_zoo::notify::LogNotifier;
use pocket_zoo::store::{App, AppState, SaveQueue, Summary};
use serde_json::{json, Value};

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let config = Config::default();
    let (queue, _writer) = SaveQueue::spawn(Arc::new(db.clone()), config.save_retry);
    let state = AppState::load(&db, queue, &config, Arc::new(LogNotifier));
    let app = create_router(App::new(state));
    TestServer::new(app).expect("Failed to create test server")
}

async fn create_task(server: &TestServer, title: &str) -> Task {
    server
        .post("/api/v1/tasks")
        .json(&CreateTaskInput {
            title: title.to_string(),
            ..Default::default()
        })
        .await
        .json::<Task>()
}

/// Complete `n` fresh tasks, earning 10 coins each.
async fn earn_coins(server: &TestServer, n: usize) {
    for i in 0..n {
        let task = create_task(server, &format!("Chore {}", i)).await;
        server
            .post(&format!("/api/v1/tasks/{}/complete", task.id))
            .await
            .assert_status_ok();
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();
        let response = server.get("/api/v1/health").await;
        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }
}

mod tasks {
    use super::*;

    #[tokio::test]
    async fn creates_and_lists_tasks() {
        let server = setup();
        let task = create_task(&server, "Write report").await;

        assert_eq!(task.title, "Write report");
        assert_eq!(task.priority, Priority::Medium);

        let tasks: Vec<Task> = server.get("/api/v1/tasks").await.json();
        assert_eq!(tasks, vec![task]);
    }

    #[tokio::test]
    async fn rejects_blank_titles() {
        let server = setup();
        let response = server
            .post("/api/v1/tasks")
            .json(&json!({ "title": "   " }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn updates_without_touching_progress() {
        let server = setup();
        let task = create_task(&server, "Draft").await;
        server
            .post(&format!("/api/v1/tasks/{}/sessions", task.id))
            .await
            .assert_status_ok();

        let updated: Task = server
            .put(&format!("/api/v1/tasks/{}", task.id))
            .json(&json!({ "title": "Final", "priority": "high" }))
            .await
            .json();

        assert_eq!(updated.title, "Final");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.pomodoro_sessions, 1);
    }

    #[tokio::test]
    async fn null_clears_optional_fields() {
        let server = setup();
        let task: Task = server
            .post("/api/v1/tasks")
            .json(&json!({ "title": "Trip", "description": "pack bags", "theme": "Home" }))
            .await
            .json();

        let updated: Task = server
            .put(&format!("/api/v1/tasks/{}", task.id))
            .json(&json!({ "description": null }))
            .await
            .json();

        assert_eq!(updated.description, None);
        assert_eq!(updated.theme.as_deref(), Some("Home"));
    }

    #[tokio::test]
    async fn returns_404_for_unknown_tasks() {
        let server = setup();
        let id = uuid::Uuid::now_v7();

        server
            .get(&format!("/api/v1/tasks/{}", id))
            .await
            .assert_status_not_found();
        server
            .delete(&format!("/api/v1/tasks/{}", id))
            .await
            .assert_status_not_found();
        server
            .post(&format!("/api/v1/tasks/{}/complete", id))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn deletes_tasks() {
        let server = setup();
        let task = create_task(&server, "Temp").await;

        server
            .delete(&format!("/api/v1/tasks/{}", task.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let tasks: Vec<Task> = server.get("/api/v1/tasks").await.json();
        assert!(tasks.is_empty());
    }
}

mod filters {
    use super::*;

    #[tokio::test]
    async fn narrows_the_filtered_list() {
        let server = setup();
        server
            .post("/api/v1/tasks")
            .json(&json!({ "title": "Report", "theme": "Work", "tags": ["a"] }))
            .await;
        server
            .post("/api/v1/tasks")
            .json(&json!({ "title": "Laundry", "theme": "Home", "tags": ["a", "b"] }))
            .await;

        server
            .put("/api/v1/filters")
            .json(&json!({ "theme": "Work", "tags": ["a"] }))
            .await
            .assert_status_ok();
        let filtered: Vec<Task> = server.get("/api/v1/tasks/filtered").await.json();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Report");

        server
            .delete("/api/v1/filters")
            .await
            .assert_status(StatusCode::NO_CONTENT);
        let filtered: Vec<Task> = server.get("/api/v1/tasks/filtered").await.json();
        assert_eq!(filtered.len(), 2);
    }

    #[tokio::test]
    async fn null_drops_a_single_filter() {
        let server = setup();
        server
            .put("/api/v1/filters")
            .json(&json!({ "theme": "Work", "tags": ["a"] }))
            .await
            .assert_status_ok();

        let filters: TaskFilters = server
            .put("/api/v1/filters")
            .json(&json!({ "theme": null }))
            .await
            .json();
        assert_eq!(filters.theme, None);
        assert!(filters.tags.contains("a"));
    }
}

mod zoo {
    use super::*;

    #[tokio::test]
    async fn starts_with_six_locked_animals() {
        let server = setup();
        let animals: Vec<Animal> = server.get("/api/v1/zoo/animals").await.json();
        assert_eq!(animals.len(), 6);
        assert!(animals.iter().all(|a| !a.unlocked));
    }

    #[tokio::test]
    async fn completing_tasks_pays_coins() {
        let server = setup();
        earn_coins(&server, 3).await;

        let coins: Value = server.get("/api/v1/zoo/coins").await.json();
        assert_eq!(coins["coins"], 30);
    }

    #[tokio::test]
    async fn unlocks_and_feeds_an_animal() {
        let server = setup();
        earn_coins(&server, 6).await;

        let rabbit: Animal = server.post("/api/v1/zoo/animals/1/unlock").await.json();
        assert!(rabbit.unlocked);
        assert!(rabbit.personality.is_some());

        let fed: Animal = server.post("/api/v1/zoo/animals/1/care/feed").await.json();
        assert_eq!(fed.mood, Mood::Happy);

        let coins: Value = server.get("/api/v1/zoo/coins").await.json();
        assert_eq!(coins["coins"], 5);

        server
            .post("/api/v1/zoo/animals/1/unlock")
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn refuses_unaffordable_unlocks() {
        let server = setup();
        server
            .post("/api/v1/zoo/animals/6/unlock")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .post("/api/v1/zoo/animals/42/unlock")
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn rejects_unknown_care_actions() {
        let server = setup();
        server
            .post("/api/v1/zoo/animals/1/care/dance")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .post("/api/v1/zoo/animals/1/care/feed")
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn locked_animals_use_the_fallback_line() {
        let server = setup();
        let dialog: Value = server.get("/api/v1/zoo/animals/1/dialog").await.json();
        assert_eq!(dialog["line"], "Just hanging out...");
    }
}

mod shop {
    use super::*;

    #[tokio::test]
    async fn lists_packs_with_contents() {
        let server = setup();
        let packs: Value = server.get("/api/v1/shop/packs").await.json();
        let packs = packs.as_array().expect("array");

        assert_eq!(packs.len(), 3);
        assert_eq!(packs[0]["id"], "rodent");
        assert_eq!(packs[0]["animals"].as_array().map(|a| a.len()), Some(2));
    }

    #[tokio::test]
    async fn buys_a_pack() {
        let server = setup();
        earn_coins(&server, 10).await;

        let response = server.post("/api/v1/shop/packs/rodent/buy").await;
        response.assert_status(StatusCode::CREATED);
        let won: CollectedAnimal = response.json();
        assert_eq!(won.pack, "rodent");

        let collection: Vec<CollectedAnimal> = server.get("/api/v1/shop/collection").await.json();
        assert_eq!(collection, vec![won]);
    }
}

mod pomodoro {
    use super::*;

    #[tokio::test]
    async fn finishing_focus_counts_a_session() {
        let server = setup();
        let task = create_task(&server, "Study").await;

        server
            .put("/api/v1/pomodoro/task")
            .json(&json!({ "task_id": task.id }))
            .await
            .assert_status_ok();
        server.post("/api/v1/pomodoro/toggle").await.assert_status_ok();

        let tick: Value = server
            .post("/api/v1/pomodoro/tick")
            .json(&json!({ "seconds": 25 * 60 }))
            .await
            .json();
        assert_eq!(tick["event"]["kind"], "focus_completed");

        let task: Task = server.get(&format!("/api/v1/tasks/{}", task.id)).await.json();
        assert_eq!(task.pomodoro_sessions, 1);
    }

    #[tokio::test]
    async fn rejects_zero_length_settings() {
        let server = setup();
        server
            .put("/api/v1/pomodoro/settings")
            .json(&json!({
                "focus_minutes": 0,
                "short_break_minutes": 5,
                "long_break_minutes": 15,
                "pomodoros_until_long_break": 4
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_oversize_settings_and_keeps_serving() {
        let server = setup();
        server
            .put("/api/v1/pomodoro/settings")
            .json(&json!({
                "focus_minutes": 80_000_000,
                "short_break_minutes": 5,
                "long_break_minutes": 15,
                "pomodoros_until_long_break": 4
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let settings: PomodoroSettings = server.get("/api/v1/pomodoro/settings").await.json();
        assert_eq!(settings, PomodoroSettings::default());
        server.get("/api/v1/pomodoro").await.assert_status_ok();
    }

    #[tokio::test]
    async fn accepts_a_full_day_focus() {
        let server = setup();
        let saved: PomodoroSettings = server
            .put("/api/v1/pomodoro/settings")
            .json(&PomodoroSettings {
                focus_minutes: MAX_INTERVAL_MINUTES,
                ..Default::default()
            })
            .await
            .json();
        assert_eq!(saved.focus_minutes, MAX_INTERVAL_MINUTES);

        let timer: PomodoroTimer = server.get("/api/v1/pomodoro").await.json();
        assert_eq!(timer.remaining_secs, MAX_INTERVAL_MINUTES * 60);
    }
}

mod onboarding {
    use super::*;

    #[tokio::test]
    async fn marks_onboarding_complete() {
        let server = setup();
        let before: Value = server.get("/api/v1/onboarding").await.json();
        assert_eq!(before["complete"], false);

        server.post("/api/v1/onboarding").await.assert_status_ok();

        let after: Value = server.get("/api/v1/onboarding").await.json();
        assert_eq!(after["complete"], true);
    }
}

mod summary {
    use super::*;

    #[tokio::test]
    async fn reflects_progress_and_flushes() {
        let server = setup();
        earn_coins(&server, 2).await;

        let summary: Summary = server.get("/api/v1/summary").await.json();
        assert_eq!(summary.coins, 20);
        assert_eq!(summary.total_tasks, 2);
        assert_eq!(summary.completed_tasks, 2);

        server
            .post("/api/v1/flush")
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
}
