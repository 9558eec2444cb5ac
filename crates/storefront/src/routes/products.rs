//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tower_sessions::Session;
use tracing::instrument;

use wildthread_core::ProductId;

use crate::error::{AppError, Result};
use crate::filters;
use crate::models::Product;
use crate::routes::{NavView, nav_view};
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: String,
    pub category: String,
    pub sizes: Vec<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            image_url: product.image_url.clone(),
            category: product.category.clone(),
            sizes: product.sizes.clone(),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
    pub nav: NavView,
}

/// Quick view fragment template (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/quick_view.html")]
pub struct QuickViewTemplate {
    pub product: ProductView,
}

/// Display a product detail page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<ProductShowTemplate> {
    let product = fetch(&state, &id).await?;

    Ok(ProductShowTemplate {
        product: ProductView::from(&product),
        nav: nav_view(&session).await,
    })
}

/// Product detail fragment for the quick-view dialog.
#[instrument(skip(state))]
pub async fn quick_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<QuickViewTemplate> {
    let product = fetch(&state, &id).await?;

    Ok(QuickViewTemplate {
        product: ProductView::from(&product),
    })
}

async fn fetch(state: &AppState, id: &str) -> Result<Product> {
    state
        .catalog()
        .get(&ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
