// 분석 / 인증 / 포트폴리오 핸들러들

use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::reply::{json, with_status, Json, WithStatus};
use warp::{Rejection, Reply};

use crate::analysis::PatternFinder;
use crate::api::AppState;
use crate::backtest::{RemoteDataProvider, SignalBacktestParams, SignalBacktester};
use crate::engine::{Scanner, StockAnalyzer, Strategy};
use crate::error::TerminalError;
use crate::market_data::Period;
use crate::models::portfolio::Holding;
use crate::models::symbol_book::Market;
use crate::portfolio::{PortfolioValuator, Rebalancer};
use crate::utils::logging;

type JsonReply = WithStatus<Json>;

fn ok<T: Serialize>(body: &T) -> JsonReply {
  with_status(json(body), StatusCode::OK)
}

fn created<T: Serialize>(body: &T) -> JsonReply {
  with_status(json(body), StatusCode::CREATED)
}

/// 에러 종류별 HTTP 상태 코드
pub fn status_for(error: &TerminalError) -> StatusCode {
  match error {
    TerminalError::InvalidParameter(_)
    | TerminalError::ParseError(_)
    | TerminalError::CredentialsMissing(_) => StatusCode::BAD_REQUEST,
    TerminalError::InvalidCredentials(_) | TerminalError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
    TerminalError::RegistrationDisabled => StatusCode::FORBIDDEN,
    TerminalError::InsufficientData(_) => StatusCode::NOT_FOUND,
    TerminalError::UserExists(_) => StatusCode::CONFLICT,
    TerminalError::DataFetch(_) | TerminalError::Http(_) => StatusCode::BAD_GATEWAY,
    _ => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

fn error_reply(context: &str, error: &TerminalError) -> JsonReply {
  let status = status_for(error);
  if status.is_server_error() {
    logging::log_error(context, error);
  } else {
    log::debug!("요청 거부 - {}: {}", context, error);
  }
  with_status(json(&serde_json::json!({ "error": error.to_string() })), status)
}

fn respond<T: Serialize>(context: &str, result: Result<T, TerminalError>) -> JsonReply {
  match result {
    Ok(body) => ok(&body),
    Err(e) => error_reply(context, &e),
  }
}

/// "Bearer <token>" 헤더에서 사용자 확인
async fn authenticate(state: &AppState, header: Option<String>) -> Result<String, TerminalError> {
  let token = bearer_token(header.as_deref())?;
  state
    .sessions
    .user_from_token(token)
    .await?
    .ok_or_else(|| TerminalError::InvalidToken("session expired or revoked".to_string()))
}

fn bearer_token(header: Option<&str>) -> Result<&str, TerminalError> {
  header
    .and_then(|h| h.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or_else(|| TerminalError::InvalidToken("missing bearer token".to_string()))
}

// 입력값(종목명/코드)을 티커로
fn resolve_ticker(state: &AppState, input: &str) -> Result<String, TerminalError> {
  state
    .symbols
    .resolve(input)
    .ok_or_else(|| TerminalError::InvalidParameter(format!("Cannot resolve ticker: {}", input)))
}

pub async fn health(state: AppState) -> Result<impl Reply, Infallible> {
  Ok(ok(&serde_json::json!({
    "status": "ok",
    "version": crate::VERSION,
    "hosted": state.demo.is_hosted(),
  })))
}

/// 회원가입 / 로그인 요청 모델
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
  #[serde(default)]
  pub user_id: String,
  #[serde(default)]
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
  pub user_id: String,
  pub token: String,
}

pub async fn register(req: CredentialsRequest, state: AppState) -> Result<impl Reply, Infallible> {
  let user_id = req.user_id.trim().to_string();
  let result = match state.demo.check_registration() {
    Ok(()) => state.users.register(&user_id, &req.password).await,
    Err(e) => Err(e),
  };

  Ok(match result {
    Ok(()) => created(&serde_json::json!({ "user_id": user_id })),
    Err(e) => error_reply("register", &e),
  })
}

pub async fn login(req: CredentialsRequest, state: AppState) -> Result<impl Reply, Infallible> {
  let user_id = req.user_id.trim().to_string();
  let result = match state.demo.check_login(&user_id) {
    Ok(()) => state.sessions.login(&user_id, &req.password).await,
    Err(e) => Err(e),
  };

  Ok(match result {
    Ok(token) => ok(&TokenResponse { user_id, token }),
    Err(e) => error_reply("login", &e),
  })
}

pub async fn logout(auth: Option<String>, state: AppState) -> Result<impl Reply, Infallible> {
  let result = match bearer_token(auth.as_deref()) {
    Ok(token) => state.sessions.revoke(token).await,
    Err(e) => Err(e),
  };
  Ok(respond("logout", result.map(|revoked| serde_json::json!({ "revoked": revoked }))))
}

pub async fn refresh(auth: Option<String>, state: AppState) -> Result<impl Reply, Infallible> {
  let result = match bearer_token(auth.as_deref()) {
    Ok(token) => state.sessions.refresh(token).await,
    Err(e) => Err(e),
  };

  Ok(match result {
    Ok(Some(token)) => {
      let user_id = token.split(':').next().unwrap_or_default().to_string();
      ok(&TokenResponse { user_id, token })
    }
    Ok(None) => error_reply("refresh", &TerminalError::InvalidToken("session expired or revoked".to_string())),
    Err(e) => error_reply("refresh", &e),
  })
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeQuery {
  pub period: Option<String>,
  pub fundamental: Option<bool>,
  pub strategy: Option<String>,
}

impl AnalyzeQuery {
  /// 재무 검증은 명시적으로 요청할 때만
  pub fn apply_fundamental(&self) -> bool {
    self.fundamental.unwrap_or(false)
  }
}

fn prepare_analysis(
  state: &AppState,
  ticker: &str,
  query: &AnalyzeQuery,
) -> Result<(StockAnalyzer, Period, Strategy), TerminalError> {
  let period = match query.period.as_deref() {
    Some(p) => p.parse::<Period>()?,
    None => Period::default(),
  };
  let strategy = match query.strategy.as_deref() {
    Some(s) => s.parse::<Strategy>()?,
    None => Strategy::default(),
  };
  let ticker = resolve_ticker(state, ticker)?;
  Ok((state.context.analyzer(&ticker)?, period, strategy))
}

/// 종목 분석. 분석 실패도 200 + success=false 본문으로 전달
pub async fn analyze(ticker: String, query: AnalyzeQuery, state: AppState) -> Result<impl Reply, Infallible> {
  let (analyzer, period, strategy) = match prepare_analysis(&state, &ticker, &query) {
    Ok(parts) => parts,
    Err(e) => return Ok(error_reply("analyze", &e)),
  };

  let result = analyzer
    .analyze_with(period, query.apply_fundamental(), strategy)
    .await;
  Ok(ok(&result))
}

pub async fn scan(market: String, state: AppState) -> Result<impl Reply, Infallible> {
  let market = match market.parse::<Market>() {
    Ok(m) => m,
    Err(e) => return Ok(error_reply("scan", &e)),
  };

  let report = Scanner::new(state.context.clone())
    .with_concurrency(state.concurrency)
    .scan(market, &state.symbols.in_market(market))
    .await;
  Ok(ok(&report))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
  #[serde(default)]
  pub q: String,
}

pub async fn search(query: SearchQuery, state: AppState) -> Result<impl Reply, Infallible> {
  let ticker = state.symbols.resolve(&query.q);
  let name = ticker.as_deref().and_then(|t| state.symbols.name_of(t));
  Ok(ok(&serde_json::json!({
    "query": query.q,
    "ticker": ticker,
    "name": name,
  })))
}

pub async fn portfolio_list(auth: Option<String>, state: AppState) -> Result<impl Reply, Infallible> {
  let result = match authenticate(&state, auth).await {
    Ok(user) => state.portfolios.load(&user).await,
    Err(e) => Err(e),
  };
  Ok(respond("portfolio", result))
}

/// 보유 종목 추가 요청 모델 (ticker 는 종목명도 허용)
#[derive(Debug, Deserialize)]
pub struct AddHoldingRequest {
  pub name: Option<String>,
  pub ticker: String,
  pub avg_price: f64,
  #[serde(default)]
  pub quantity: f64,
}

pub async fn portfolio_add(
  auth: Option<String>,
  req: AddHoldingRequest,
  state: AppState,
) -> Result<impl Reply, Infallible> {
  let result = async move {
    let user = authenticate(&state, auth).await?;
    let ticker = resolve_ticker(&state, &req.ticker)?;
    let name = req
      .name
      .filter(|n| !n.trim().is_empty())
      .or_else(|| state.symbols.name_of(&ticker))
      .unwrap_or_else(|| ticker.clone());
    state
      .portfolios
      .add(&user, Holding::new(name, ticker, req.avg_price, req.quantity))
      .await
  }
  .await;

  Ok(match result {
    Ok(holdings) => created(&holdings),
    Err(e) => error_reply("portfolio add", &e),
  })
}

pub async fn portfolio_remove(index: usize, auth: Option<String>, state: AppState) -> Result<impl Reply, Infallible> {
  let result = match authenticate(&state, auth).await {
    Ok(user) => state.portfolios.remove(&user, index).await,
    Err(e) => Err(e),
  };
  Ok(respond("portfolio remove", result))
}

pub async fn portfolio_report(auth: Option<String>, state: AppState) -> Result<impl Reply, Infallible> {
  let holdings = match authenticate(&state, auth).await {
    Ok(user) => state.portfolios.load(&user).await,
    Err(e) => Err(e),
  };

  Ok(match holdings {
    Ok(holdings) => {
      let report = PortfolioValuator::new(state.context.clone())
        .with_concurrency(state.concurrency)
        .report(&holdings)
        .await;
      ok(&report)
    }
    Err(e) => error_reply("portfolio report", &e),
  })
}

pub async fn portfolio_rebalance(auth: Option<String>, state: AppState) -> Result<impl Reply, Infallible> {
  let holdings = match authenticate(&state, auth).await {
    Ok(user) => state.portfolios.load(&user).await,
    Err(e) => Err(e),
  };

  Ok(match holdings {
    Ok(holdings) => {
      let plan = Rebalancer::new(state.context.clone())
        .with_concurrency(state.concurrency)
        .plan(&holdings)
        .await;
      ok(&plan)
    }
    Err(e) => error_reply("portfolio rebalance", &e),
  })
}

pub async fn patterns(ticker: String, state: AppState) -> Result<impl Reply, Infallible> {
  let result = match resolve_ticker(&state, &ticker) {
    Ok(ticker) => PatternFinder::new(state.context.data.clone()).find(&ticker).await,
    Err(e) => Err(e),
  };
  Ok(respond("patterns", result))
}

#[derive(Debug, Default, Deserialize)]
pub struct BacktestQuery {
  pub hold_days: Option<usize>,
  pub threshold: Option<f64>,
}

pub async fn backtest(ticker: String, query: BacktestQuery, state: AppState) -> Result<impl Reply, Infallible> {
  let defaults = SignalBacktestParams::default();
  let params = SignalBacktestParams {
    threshold: query.threshold.unwrap_or(defaults.threshold),
    hold_days: query.hold_days.unwrap_or(defaults.hold_days),
  };

  let result = match resolve_ticker(&state, &ticker) {
    Ok(ticker) => {
      let source = RemoteDataProvider::new(state.context.data.clone());
      SignalBacktester::new(std::sync::Arc::new(source)).run(&ticker, params).await
    }
    Err(e) => Err(e),
  };
  Ok(respond("backtest", result))
}

/// 라우트 불일치 / 본문 파싱 실패를 JSON 에러로 변환
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
  let (status, message) = if err.is_not_found() {
    (StatusCode::NOT_FOUND, "not found".to_string())
  } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
    (StatusCode::BAD_REQUEST, format!("invalid request body: {}", e))
  } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
    (StatusCode::BAD_REQUEST, format!("invalid query: {}", e))
  } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
    (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
  } else {
    log::error!("처리되지 않은 요청 거부: {:?}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
  };

  Ok(with_status(json(&serde_json::json!({ "error": message })), status))
}
