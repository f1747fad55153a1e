use std::convert::Infallible;

use warp::Filter;

use crate::api::handlers;
use crate::api::AppState;

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn bearer() -> impl Filter<Extract = (Option<String>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization")
}

/// 분석 터미널 API 라우트 생성
pub fn create_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    // 헬스체크 라우트
    let health = warp::path!("health")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::health);

    // 인증 라우트
    let register = warp::path!("auth" / "register")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handlers::register);

    let login = warp::path!("auth" / "login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handlers::login);

    let logout = warp::path!("auth" / "logout")
        .and(warp::post())
        .and(bearer())
        .and(with_state(state.clone()))
        .and_then(handlers::logout);

    let refresh = warp::path!("auth" / "refresh")
        .and(warp::post())
        .and(bearer())
        .and(with_state(state.clone()))
        .and_then(handlers::refresh);

    let auth_routes = register.or(login).or(logout).or(refresh);

    // 분석 라우트
    let analyze = warp::path!("analyze" / String)
        .and(warp::get())
        .and(warp::query::<handlers::AnalyzeQuery>())
        .and(with_state(state.clone()))
        .and_then(handlers::analyze);

    let scan = warp::path!("scan" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::scan);

    let search = warp::path!("search")
        .and(warp::get())
        .and(warp::query::<handlers::SearchQuery>())
        .and(with_state(state.clone()))
        .and_then(handlers::search);

    let patterns = warp::path!("patterns" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::patterns);

    let backtest = warp::path!("backtest" / String)
        .and(warp::get())
        .and(warp::query::<handlers::BacktestQuery>())
        .and(with_state(state.clone()))
        .and_then(handlers::backtest);

    let analysis_routes = analyze.or(scan).or(search).or(patterns).or(backtest);

    // 포트폴리오 라우트 (Bearer 토큰 필요)
    let portfolio_report = warp::path!("portfolio" / "report")
        .and(warp::get())
        .and(bearer())
        .and(with_state(state.clone()))
        .and_then(handlers::portfolio_report);

    let portfolio_rebalance = warp::path!("portfolio" / "rebalance")
        .and(warp::get())
        .and(bearer())
        .and(with_state(state.clone()))
        .and_then(handlers::portfolio_rebalance);

    let portfolio_list = warp::path!("portfolio")
        .and(warp::get())
        .and(bearer())
        .and(with_state(state.clone()))
        .and_then(handlers::portfolio_list);

    let portfolio_add = warp::path!("portfolio")
        .and(warp::post())
        .and(bearer())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handlers::portfolio_add);

    let portfolio_remove = warp::path!("portfolio" / usize)
        .and(warp::delete())
        .and(bearer())
        .and(with_state(state))
        .and_then(handlers::portfolio_remove);

    let portfolio_routes = portfolio_report
        .or(portfolio_rebalance)
        .or(portfolio_list)
        .or(portfolio_add)
        .or(portfolio_remove);

    // 모든 라우트 결합
    health
        .or(auth_routes)
        .or(analysis_routes)
        .or(portfolio_routes)
        .recover(handlers::handle_rejection)
        .with(warp::log("wallst_pro::api"))
}
