mod handlers;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::store::App;

pub fn create_router(app: App) -> Router {
    let api = Router::new()
        // Tasks
        .route("/tasks", get(handlers::list_tasks))
        .route("/tasks", post(handlers::create_task))
        .route("/tasks/filtered", get(handlers::list_filtered_tasks))
        .route("/tasks/{id}", get(handlers::get_task))
        .route("/tasks/{id}", put(handlers::update_task))
        .route("/tasks/{id}", delete(handlers::delete_task))
        .route("/tasks/{id}/complete", post(handlers::complete_task))
        .route("/tasks/{id}/sessions", post(handlers::increment_session))
        // Filters
        .route("/filters", get(handlers::get_filters))
        .route("/filters", put(handlers::apply_filters))
        .route("/filters", delete(handlers::reset_filters))
        // Zoo
        .route("/zoo/animals", get(handlers::list_animals))
        .route("/zoo/animals/{id}", get(handlers::get_animal))
        .route("/zoo/animals/{id}/unlock", post(handlers::unlock_animal))
        .route("/zoo/animals/{id}/care/{action}", post(handlers::care_for_animal))
        .route("/zoo/animals/{id}/dialog", get(handlers::get_dialog))
        .route("/zoo/coins", get(handlers::get_coins))
        .route("/zoo/decay", post(handlers::run_decay))
        // Shop
        .route("/shop/packs", get(handlers::list_packs))
        .route("/shop/packs/{id}/buy", post(handlers::buy_pack))
        .route("/shop/collection", get(handlers::list_collection))
        // Pomodoro
        .route("/pomodoro", get(handlers::get_timer))
        .route("/pomodoro/toggle", post(handlers::toggle_timer))
        .route("/pomodoro/reset", post(handlers::reset_timer))
        .route("/pomodoro/skip", post(handlers::skip_timer))
        .route("/pomodoro/tick", post(handlers::tick_timer))
        .route("/pomodoro/task", put(handlers::select_task))
        .route("/pomodoro/settings", get(handlers::get_pomodoro_settings))
        .route("/pomodoro/settings", put(handlers::update_pomodoro_settings))
        // Settings
        .route("/onboarding", get(handlers::get_onboarding))
        .route("/onboarding", post(handlers::complete_onboarding))
        // Misc
        .route("/summary", get(handlers::summary))
        .route("/flush", post(handlers::flush))
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app)
}
