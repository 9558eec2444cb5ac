//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::catalog::ProductShelf;
use crate::filters;
use crate::routes::products::ProductView;
use crate::routes::{NavView, nav_view};
use crate::state::AppState;

/// Shelf selection query parameters.
#[derive(Debug, Deserialize)]
pub struct ShelfQuery {
    /// `popular` (default) or `recent`.
    pub section: Option<String>,
    /// Category name; overrides `section`.
    pub category: Option<String>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub products: Vec<ProductView>,
    pub shelf_label: String,
    pub nav: NavView,
}

/// Display the home page with the selected product shelf.
///
/// A failed catalog read renders an empty shelf; the failure is logged, not
/// surfaced.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ShelfQuery>,
) -> impl IntoResponse {
    let shelf = match (query.category, query.section.as_deref()) {
        (Some(category), _) => ProductShelf::Category(category),
        (None, Some("recent")) => ProductShelf::Recent,
        (None, _) => ProductShelf::Popular,
    };

    let shelf_label = match &shelf {
        ProductShelf::Popular => "Popular".to_owned(),
        ProductShelf::Recent => "New Arrivals".to_owned(),
        ProductShelf::Category(name) => name.clone(),
    };

    let products = match state.catalog().list(&shelf).await {
        Ok(products) => products.iter().map(ProductView::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load products");
            Vec::new()
        }
    };

    HomeTemplate {
        products,
        shelf_label,
        nav: nav_view(&session).await,
    }
}
