use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Reply};

use tune_core::{MaintenanceService, RiddleError, RiddleResult, RiddleService};
use tune_types::{ErrorResponse, Guess, Video};

pub mod config;
pub mod images;
pub mod media;
pub mod stream;

#[derive(Deserialize)]
struct CategoryQuery {
    category: String,
}

/// The winning guess travels in the query so a `<video>` element can request it.
#[derive(Deserialize)]
struct StreamQuery {
    category: String,
    performer: String,
    title: String,
    round: u32,
}

#[derive(Deserialize)]
struct MaintenanceQuery {
    category: String,
    api_key: String,
}

#[derive(Deserialize)]
struct FramesQuery {
    category: String,
    api_key: String,
    date: NaiveDate,
}

pub fn create_routes(
    riddle_service: Arc<RiddleService>,
    maintenance_service: Arc<MaintenanceService>,
    static_dir: PathBuf,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let riddle_filter = warp::any().map({
        let riddle_service = riddle_service.clone();
        move || riddle_service.clone()
    });

    let maintenance_filter = warp::any().map({
        let maintenance_service = maintenance_service.clone();
        move || maintenance_service.clone()
    });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let categories = warp::path!("image" / "categories")
        .and(warp::get())
        .and(riddle_filter.clone())
        .map(|service: Arc<RiddleService>| warp::reply::json(&service.categories()));

    // First frame of today's riddle
    let riddle = warp::path("image")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<CategoryQuery>())
        .and(riddle_filter.clone())
        .and_then(handle_riddle_request);

    let guess = warp::path("image")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<CategoryQuery>())
        .and(warp::body::json::<Guess>())
        .and(riddle_filter.clone())
        .and_then(handle_guess_request);

    // Archived video, only for a guess that solves today's riddle
    let video = warp::path!("image" / "stream")
        .and(warp::get())
        .and(warp::query::<StreamQuery>())
        .and(warp::header::optional::<String>("range"))
        .and(riddle_filter.clone())
        .and_then(handle_stream_request);

    let stats = warp::path("stats")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<CategoryQuery>())
        .and(riddle_filter.clone())
        .and_then(handle_stats_request);

    let next_date = warp::path!("maintenance" / "date")
        .and(warp::get())
        .and(warp::query::<CategoryQuery>())
        .and(maintenance_filter.clone())
        .and_then(handle_next_date_request);

    let download = warp::path!("maintenance" / "download")
        .and(warp::post())
        .and(warp::query::<MaintenanceQuery>())
        .and(warp::body::json::<Video>())
        .and(maintenance_filter.clone())
        .and_then(handle_download_request);

    let frames = warp::path!("maintenance" / "frames")
        .and(warp::get())
        .and(warp::query::<FramesQuery>())
        .and(maintenance_filter.clone())
        .and_then(handle_frames_request);

    let publish = warp::path("maintenance")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<MaintenanceQuery>())
        .and(warp::body::json::<Video>())
        .and(maintenance_filter.clone())
        .and_then(handle_publish_request);

    // Player and maintenance pages
    let static_files = warp::get().and(warp::fs::dir(static_dir));

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST"]);

    health
        .or(categories)
        .or(riddle)
        .or(guess)
        .or(video)
        .or(stats)
        .or(next_date)
        .or(download)
        .or(frames)
        .or(publish)
        .or(static_files)
        .with(cors)
        .with(warp::log("freeze_tune"))
}

pub fn status_for(err: &RiddleError) -> StatusCode {
    match err {
        RiddleError::DataUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        RiddleError::DuplicateContent { .. } => StatusCode::CONFLICT,
        RiddleError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        RiddleError::UnknownCategory { .. } => StatusCode::NOT_FOUND,
        RiddleError::InvalidRound { .. } => StatusCode::BAD_REQUEST,
        RiddleError::FrameCount { .. } => StatusCode::BAD_REQUEST,
        RiddleError::NotSolved => StatusCode::FORBIDDEN,
        RiddleError::VideoMissing { .. } => StatusCode::NOT_FOUND,
        RiddleError::Acquisition(_) => StatusCode::BAD_GATEWAY,
        RiddleError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_reply(err: &RiddleError) -> warp::reply::WithStatus<warp::reply::Json> {
    let status = status_for(err);
    let message = match err {
        RiddleError::Storage(inner) => {
            tracing::error!("Storage failure: {:#}", inner);
            "Internal server error".to_string()
        }
        other => {
            tracing::warn!("Request failed: {}", other);
            other.to_string()
        }
    };
    warp::reply::with_status(warp::reply::json(&ErrorResponse::new(message)), status)
}

fn json_reply<T: Serialize>(result: RiddleResult<T>) -> warp::reply::WithStatus<warp::reply::Json> {
    match result {
        Ok(value) => warp::reply::with_status(warp::reply::json(&value), StatusCode::OK),
        Err(err) => error_reply(&err),
    }
}

async fn handle_riddle_request(
    query: CategoryQuery,
    riddle_service: Arc<RiddleService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(json_reply(riddle_service.todays_riddle(&query.category).await))
}

async fn handle_guess_request(
    query: CategoryQuery,
    guess: Guess,
    riddle_service: Arc<RiddleService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(json_reply(
        riddle_service.take_guess(&query.category, &guess).await,
    ))
}

async fn handle_stream_request(
    query: StreamQuery,
    range: Option<String>,
    riddle_service: Arc<RiddleService>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let guess = Guess {
        performer: query.performer,
        title: query.title,
        round: query.round,
    };
    let video_file = match riddle_service.solved_video(&query.category, &guess).await {
        Ok(video_file) => video_file,
        Err(err) => return Ok(error_reply(&err).into_response()),
    };

    match stream::video_response(Path::new(&video_file), range.as_deref()).await {
        Ok(response) => Ok(response),
        Err(err) => {
            tracing::warn!("Cannot stream {}: {:#}", video_file, err);
            let body = ErrorResponse::new("Video file is not available");
            Ok(
                warp::reply::with_status(warp::reply::json(&body), StatusCode::NOT_FOUND)
                    .into_response(),
            )
        }
    }
}

async fn handle_stats_request(
    query: CategoryQuery,
    riddle_service: Arc<RiddleService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(json_reply(riddle_service.monthly_stats(&query.category).await))
}

async fn handle_next_date_request(
    query: CategoryQuery,
    maintenance_service: Arc<MaintenanceService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(json_reply(maintenance_service.next_date(&query.category).await))
}

async fn handle_download_request(
    query: MaintenanceQuery,
    video: Video,
    maintenance_service: Arc<MaintenanceService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(json_reply(
        maintenance_service
            .download(&query.api_key, &query.category, &video)
            .await,
    ))
}

async fn handle_frames_request(
    query: FramesQuery,
    maintenance_service: Arc<MaintenanceService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(json_reply(
        maintenance_service
            .candidate_frames(&query.api_key, &query.category, query.date)
            .await,
    ))
}

async fn handle_publish_request(
    query: MaintenanceQuery,
    video: Video,
    maintenance_service: Arc<MaintenanceService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let published = maintenance_service
        .publish(&query.api_key, &query.category, &video)
        .await
        .map(|_| true);
    Ok(json_reply(published))
}
