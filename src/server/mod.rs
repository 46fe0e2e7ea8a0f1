//! HTTP 服务器模块
//!
//! 以 JSON 形式返回步骤序列，供浏览器端渲染

use crate::algorithm::{execute, Algorithm, AlgorithmKind};
use crate::error::{Error, Result};
use crate::graph::Instance;
use crate::import::parse_matrix_text;
use crate::metrics;
use crate::step::Step;
use crate::types::{Matrix, NodeId, MAX_NODES};
use crate::validation::{validate, ValidationReport};
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<metrics::Metrics>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            metrics: metrics::global_metrics(),
        }
    }
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 指标和统计
        .route("/metrics", get(metrics_handler))
        .route("/stats", get(stats_handler))
        // 算法
        .route("/algorithms", get(list_algorithms))
        .route("/matrix/parse", post(parse_matrix))
        .route("/validate", post(validate_handler))
        .route("/run", post(run_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 启动服务器
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let app = router(AppState::default());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::ServerError(format!("绑定地址失败: {}", e)))?;
    info!("algotrace 服务器启动于 http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::ServerError(format!("服务器错误: {}", e)))?;

    Ok(())
}

// ==================== 处理器 ====================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus 格式指标
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let prom = state.metrics.to_prometheus();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        Body::from(prom.content),
    )
        .into_response()
}

/// 详细统计信息
async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(state.metrics.snapshot()))
}

/// 算法描述
#[derive(Debug, Serialize)]
pub struct AlgorithmInfo {
    pub id: &'static str,
    pub title: &'static str,
    /// 是否使用起点
    pub uses_start: bool,
    /// 是否使用汇点
    pub uses_target: bool,
}

async fn list_algorithms() -> impl IntoResponse {
    let list: Vec<AlgorithmInfo> = AlgorithmKind::ALL
        .iter()
        .map(|kind| AlgorithmInfo {
            id: kind.id(),
            title: kind.title(),
            uses_start: matches!(
                kind,
                AlgorithmKind::Bfs | AlgorithmKind::Dijkstra | AlgorithmKind::MaxFlow
            ),
            uses_target: *kind == AlgorithmKind::MaxFlow,
        })
        .collect();
    Json(ApiResponse::success(list))
}

/// 文本矩阵请求
#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub text: String,
}

async fn parse_matrix(Json(req): Json<ParseRequest>) -> Response {
    match parse_matrix_text(&req.text) {
        Ok(matrix) => (StatusCode::OK, Json(ApiResponse::success(matrix))).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

/// 运行 / 校验请求
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub algorithm: String,
    pub matrix: Matrix,
    #[serde(default)]
    pub directed: bool,
    #[serde(default)]
    pub start: Option<NodeId>,
    #[serde(default)]
    pub target: Option<NodeId>,
}

impl RunRequest {
    fn prepare(&self) -> Result<(Algorithm, Instance)> {
        let kind: AlgorithmKind = self.algorithm.parse()?;
        check_shape(&self.matrix)?;
        let instance = Instance::new(self.matrix.clone(), self.directed);
        let algorithm = kind.with_params(instance.n(), self.start, self.target);
        Ok((algorithm, instance))
    }
}

/// 运行结果
#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub algorithm: AlgorithmKind,
    pub warnings: Vec<String>,
    pub total: usize,
    pub steps: Vec<Step>,
}

async fn validate_handler(Json(req): Json<RunRequest>) -> Response {
    match req.prepare() {
        Ok((algorithm, instance)) => {
            let report: ValidationReport = validate(&algorithm, &instance);
            (StatusCode::OK, Json(ApiResponse::success(report))).into_response()
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

async fn run_handler(Json(req): Json<RunRequest>) -> Response {
    let (algorithm, instance) = match req.prepare() {
        Ok(prepared) => prepared,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    match execute(&algorithm, &instance) {
        Ok(execution) => {
            let body = RunResponse {
                algorithm: algorithm.kind(),
                warnings: execution.warnings,
                total: execution.steps.len(),
                steps: execution.steps,
            };
            (StatusCode::OK, Json(ApiResponse::success(body))).into_response()
        }
        Err(Error::Validation(report)) => {
            let msg = report.errors.join(" | ");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse {
                    success: false,
                    data: Some(report),
                    error: Some(msg),
                }),
            )
                .into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// JSON 里的矩阵也要满足文本导入的形状约束
fn check_shape(matrix: &Matrix) -> Result<()> {
    if matrix.is_empty() {
        return Err(Error::EmptyMatrix);
    }
    let n = matrix.len();
    if let Some((row, r)) = matrix.iter().enumerate().find(|(_, r)| r.len() != n) {
        return Err(Error::RaggedRow {
            row,
            expected: n,
            found: r.len(),
        });
    }
    if n > MAX_NODES {
        return Err(Error::MatrixTooLarge {
            size: n,
            max: MAX_NODES,
        });
    }
    Ok(())
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    (status, Json(ApiResponse::<()>::error(msg))).into_response()
}

/// API 响应
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
