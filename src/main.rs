use axum::extract::Extension;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use rotaflow::config::AppConfig;
use rotaflow::directory::StaffDirectory;
use rotaflow::error::AppError;
use rotaflow::infra::{self, InMemoryRotaServices};
use rotaflow::telemetry;
use rotaflow::workflows::rota::consolidated::ConsolidatedWeekView;
use rotaflow::workflows::rota::draft::DraftKey;
use rotaflow::workflows::rota::router::rota_router;
use rotaflow::workflows::rota::{RequirementScope, RotaWeek, StaffId, StaffRole, ViewType};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: Arc<PrometheusHandle>,
}

#[derive(Parser, Debug)]
#[command(
    name = "rotaflow",
    about = "Coordinate weekly staff rotas, availability, and shift exchanges",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Rota inspection helpers for demos and spot checks
    Rota {
        #[command(subcommand)]
        command: RotaCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum RotaCommand {
    /// Print a consolidated weekly view over a seeded demo rota
    View(ViewArgs),
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// Staff slice to render (front_of_house, back_of_house, managers, all_staff)
    #[arg(long, default_value = "all_staff")]
    view_type: String,
    /// Any date inside the target week (YYYY-MM-DD, defaults to next week)
    #[arg(long, value_parser = parse_date)]
    week_of: Option<NaiveDate>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Rota {
            command: RotaCommand::View(args),
        } => run_rota_view(args),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let services = infra::in_memory_services(infra::demo_roster());
    let app = rota_router(services)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .layer(Extension(state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "rota coordination service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

fn run_rota_view(args: ViewArgs) -> Result<(), AppError> {
    let week = match args.week_of {
        Some(date) => RotaWeek::containing(date),
        None => RotaWeek::containing(Local::now().date_naive()).with_offset(1),
    };
    let view_type = match ViewType::from_name(&args.view_type) {
        Ok(view_type) => view_type,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let services = infra::in_memory_services(infra::demo_roster());
    seed_demo_week(&services, week);

    let view = match services.views.week_view(view_type, week) {
        Ok(view) => view,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    render_week_view(&view);
    Ok(())
}

/// Publish a small rota through the real draft workflow so the demo view
/// has something to show.
fn seed_demo_week(services: &InMemoryRotaServices, week: RotaWeek) {
    let manager = services
        .directory
        .get_user(&StaffId("u-marcus".to_string()))
        .ok()
        .flatten()
        .expect("demo roster contains the manager");
    let dates = week.dates();

    let bartenders = DraftKey {
        role: StaffRole::Bartender,
        week,
    };
    services
        .drafts
        .assign(
            &bartenders,
            StaffId("u-jonas".to_string()),
            dates[4],
            "Night",
            None,
            None,
        )
        .expect("bartender friday night has catalog times");
    services
        .drafts
        .assign(
            &bartenders,
            StaffId("u-thabo".to_string()),
            dates[5],
            "Night",
            None,
            None,
        )
        .expect("bartender saturday night has catalog times");
    services
        .drafts
        .publish(&manager, &bartenders)
        .expect("bartender rota publishes");

    let waiters = DraftKey {
        role: StaffRole::Waiter,
        week,
    };
    services
        .drafts
        .assign(
            &waiters,
            StaffId("u-lena".to_string()),
            dates[4],
            "Night",
            Some("17:00".to_string()),
            Some("Close".to_string()),
        )
        .expect("waiter shifts accept custom times");
    services
        .drafts
        .publish(&manager, &waiters)
        .expect("waiter rota publishes");

    services
        .requirements
        .set_requirement(
            &manager,
            RequirementScope::Role(StaffRole::Bartender),
            dates[4],
            1,
            Some(3),
        )
        .expect("manager may set requirements");
}

fn render_week_view(view: &ConsolidatedWeekView) {
    println!("{} — {}", view.view_type.label(), view.week);

    for group in &view.groups {
        println!("\n{}", group.label);
        for member in &group.members {
            let cells: Vec<String> = member
                .days
                .iter()
                .map(|day| format!("{}: {}", day.date.format("%a"), day.display()))
                .collect();
            println!("- {} | {}", member.full_name, cells.join(" | "));
        }
    }
}
