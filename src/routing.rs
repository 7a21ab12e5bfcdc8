//! Application router configuration.

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState, endpoints,
    expenses_page::get_expenses_page,
    not_found::get_404_not_found,
    spending::{get_spending_page, update_spending_view},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::SPENDING_VIEW, get(get_spending_page))
        .route(endpoints::SPENDING_FILTERS, post(update_spending_view))
        .route(endpoints::EXPENSES_VIEW, get(get_expenses_page))
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the spending page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::SPENDING_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_spending() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::SPENDING_VIEW);
    }
}
