use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use cut_planner::grouping::{Color, PieceGroups};
use cut_planner::solver::{Solution, Solver};
use cut_planner::types::{Demand, PlanOptions, Rect, deserialize_u32_from_number};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct OptimizeRequest {
    stock: Rect,
    cuts: Vec<CutRequest>,
    #[serde(flatten)]
    options: PlanOptions,
}

#[derive(Deserialize, Serialize)]
struct CutRequest {
    rect: Rect,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    qty: u32,
}

#[derive(Serialize)]
struct OptimizeResponse {
    sheets: Vec<SheetResponse>,
    groups: PieceGroups,
    stock: Rect,
    sheet_count: usize,
    total_cut_area: u128,
    waste: u128,
    waste_percent: f64,
    oversized_pieces: usize,
}

#[derive(Serialize)]
struct SheetResponse {
    placements: Vec<PlacementResponse>,
    waste_area: u64,
}

#[derive(Serialize)]
struct PlacementResponse {
    piece_id: usize,
    length: u32,
    width: u32,
    x: u32,
    y: u32,
    rotated: bool,
    oversized: bool,
    group_id: Option<u32>,
    color: Option<Color>,
}

impl From<Solution> for OptimizeResponse {
    fn from(solution: Solution) -> Self {
        let stock = solution.plan.stock;
        let sheets = solution
            .plan
            .sheets
            .iter()
            .map(|s| SheetResponse {
                placements: s
                    .placements
                    .iter()
                    .map(|p| {
                        let group = solution.groups.group_of(p);
                        PlacementResponse {
                            piece_id: p.piece.id,
                            length: p.rect.length,
                            width: p.rect.width,
                            x: p.x,
                            y: p.y,
                            rotated: p.rotated,
                            oversized: p.oversized,
                            group_id: group.map(|g| g.id),
                            color: group.map(|g| g.color),
                        }
                    })
                    .collect(),
                waste_area: s.waste_area(stock),
            })
            .collect();

        Self {
            sheets,
            stock,
            sheet_count: solution.sheet_count(),
            total_cut_area: solution.metrics.total_cut_area,
            waste: solution.metrics.waste,
            waste_percent: solution.waste_percent(),
            oversized_pieces: solution.metrics.oversized_pieces,
            groups: solution.groups,
        }
    }
}

async fn optimize(
    Json(req): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    let demands: Vec<Demand> = req
        .cuts
        .into_iter()
        .map(|c| Demand::new(c.rect, c.qty))
        .collect();
    let solver = Solver::new(req.stock, demands, req.options);

    // Each request owns its solver and color generator; solving is CPU-bound.
    let solution = tokio::task::spawn_blocking(move || solver.solve())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "solver task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "solver failed".to_string())
        })?
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    if solution.metrics.oversized_pieces > 0 {
        tracing::warn!(
            count = solution.metrics.oversized_pieces,
            "pieces larger than the stock"
        );
    }

    Ok(Json(solution.into()))
}

fn main() {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime")
        .block_on(serve());
}

async fn serve() {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.unwrap();
}
