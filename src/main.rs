use actix_web::middleware::Logger;
use actix_web::{web, App, HttpResponse, HttpServer};
use std::io;
use std::num::IntErrorKind;
use std::sync::Arc;

use config::Config;
use db::{MemStorage, Storage};
use error::ApiError;
use models::{LimitQuery, SearchQuery};

mod config;
mod db;
mod error;
mod models;

async fn get_products(db: web::Data<dyn Storage>) -> Result<HttpResponse, ApiError> {
    let products = db
        .all_products()
        .map_err(ApiError::internal("Error fetching products"))?;
    Ok(HttpResponse::Ok().json(products))
}

async fn get_product(db: web::Data<dyn Storage>, id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    // An integer too large for an id can't match any product.
    let id: i64 = id.trim().parse().map_err(|e: std::num::ParseIntError| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ApiError::NotFound("Product not found"),
        _ => ApiError::BadRequest("Invalid product ID"),
    })?;

    match db.product_by_id(id).map_err(ApiError::internal("Error fetching product"))? {
        Some(product) => Ok(HttpResponse::Ok().json(product)),
        None => Err(ApiError::NotFound("Product not found")),
    }
}

async fn get_products_by_category(
    db: web::Data<dyn Storage>,
    category: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let products = db
        .products_by_category(&category.into_inner())
        .map_err(ApiError::internal("Error fetching products by category"))?;
    Ok(HttpResponse::Ok().json(products))
}

// An empty `limit` falls back to the store default, like an absent one.
fn parse_limit(query: &LimitQuery) -> Result<Option<usize>, ApiError> {
    match query.limit.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ApiError::BadRequest("Invalid limit parameter")),
    }
}

/// First `limit` products (default 6). A `limit` that is not a
/// non-negative integer is rejected with 400 instead of being sliced as-is.
async fn get_featured_products(
    db: web::Data<dyn Storage>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, ApiError> {
    let limit = parse_limit(&query)?;
    let products = db
        .featured_products(limit)
        .map_err(ApiError::internal("Error fetching featured products"))?;
    Ok(HttpResponse::Ok().json(products))
}

/// Trending products, at most `limit` (default 3). Rejects a malformed
/// `limit` with 400, same as the featured list.
async fn get_trending_products(
    db: web::Data<dyn Storage>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, ApiError> {
    let limit = parse_limit(&query)?;
    let products = db
        .trending_products(limit)
        .map_err(ApiError::internal("Error fetching trending products"))?;
    Ok(HttpResponse::Ok().json(products))
}

async fn search_products(
    db: web::Data<dyn Storage>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let q = match query.q.as_deref() {
        Some(q) if !q.is_empty() => q,
        _ => return Err(ApiError::BadRequest("Query parameter 'q' is required")),
    };

    let products = db
        .search_products(q)
        .map_err(ApiError::internal("Error searching products"))?;
    Ok(HttpResponse::Ok().json(products))
}

async fn api_not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound("Not found"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        log::debug!("rejected query string: {}", err);
        ApiError::BadRequest("Invalid query parameters").into()
    });

    cfg.service(
        web::scope("/api")
            .app_data(query_config)
            .route("/products", web::get().to(get_products))
            .route("/products/category/{category}", web::get().to(get_products_by_category))
            .route("/products/{id}", web::get().to(get_product))
            .route("/featured-products", web::get().to(get_featured_products))
            .route("/trending-products", web::get().to(get_trending_products))
            .route("/search", web::get().to(search_products))
            .default_service(web::route().to(api_not_found)),
    );
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let catalog = MemStorage::with_products(db::sample_products())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    log::info!("catalog seeded with {} products", catalog.product_count());

    // One store for every worker; built here rather than held in a global.
    let store: web::Data<dyn Storage> = web::Data::from(Arc::new(catalog) as Arc<dyn Storage>);
    log::info!("listening on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind(config.bind_addr())?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::test;

    use crate::db::sample_products;
    use crate::error::StorageError;
    use crate::models::{ErrorBody, NewUser, Product, User};

    async fn get_from(store: Arc<dyn Storage>, uri: &str) -> ServiceResponse {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(store))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get().uri(uri).to_request();
        test::call_service(&app, req).await
    }

    async fn get(store: MemStorage, uri: &str) -> ServiceResponse {
        get_from(Arc::new(store), uri).await
    }

    /// A backend whose every read fails.
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn all_products(&self) -> Result<Vec<Product>, StorageError> {
            Err(StorageError::LockPoisoned)
        }
        fn product_by_id(&self, _id: i64) -> Result<Option<Product>, StorageError> {
            Err(StorageError::LockPoisoned)
        }
        fn products_by_category(&self, _category: &str) -> Result<Vec<Product>, StorageError> {
            Err(StorageError::LockPoisoned)
        }
        fn featured_products(&self, _limit: Option<usize>) -> Result<Vec<Product>, StorageError> {
            Err(StorageError::LockPoisoned)
        }
        fn trending_products(&self, _limit: Option<usize>) -> Result<Vec<Product>, StorageError> {
            Err(StorageError::LockPoisoned)
        }
        fn search_products(&self, _query: &str) -> Result<Vec<Product>, StorageError> {
            Err(StorageError::LockPoisoned)
        }
        fn user(&self, _id: i64) -> Result<Option<User>, StorageError> {
            Err(StorageError::LockPoisoned)
        }
        fn user_by_username(&self, _username: &str) -> Result<Option<User>, StorageError> {
            Err(StorageError::LockPoisoned)
        }
        fn create_user(&self, _new_user: NewUser) -> Result<User, StorageError> {
            Err(StorageError::LockPoisoned)
        }
    }

    async fn get_products_at(uri: &str) -> Vec<Product> {
        let resp = get(MemStorage::new(), uri).await;
        assert_eq!(resp.status(), StatusCode::OK, "GET {}", uri);
        test::read_body_json(resp).await
    }

    async fn get_error(uri: &str) -> (StatusCode, String) {
        let resp = get(MemStorage::new(), uri).await;
        let status = resp.status();
        let body: ErrorBody = test::read_body_json(resp).await;
        (status, body.message)
    }

    fn ids(products: &[Product]) -> Vec<i64> {
        products.iter().map(|p| p.id).collect()
    }

    #[actix_web::test]
    async fn lists_all_products_in_seed_order() {
        let products = get_products_at("/api/products").await;
        assert_eq!(ids(&products), (1..=8).collect::<Vec<_>>());
    }

    #[actix_web::test]
    async fn product_json_uses_camel_case_fields() {
        let resp = get(MemStorage::new(), "/api/products/4").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["id"], 4);
        assert_eq!(body["name"], "Nike Sportswear Tech Fleece");
        assert_eq!(body["price"], 130);
        assert_eq!(body["isNew"], true);
        assert_eq!(body["isTrending"], false);
        assert_eq!(body["isBestSeller"], false);
        assert!(body["hoverImage"].is_null());
    }

    #[actix_web::test]
    async fn gets_product_by_id() {
        let resp = get(MemStorage::new(), "/api/products/1").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let product: Product = test::read_body_json(resp).await;
        assert_eq!(product.name, "Nike Air Max 90");
    }

    #[actix_web::test]
    async fn unknown_id_is_not_found() {
        assert_eq!(get_error("/api/products/99").await, (StatusCode::NOT_FOUND, "Product not found".to_string()));
    }

    #[actix_web::test]
    async fn non_numeric_id_is_bad_request() {
        assert_eq!(get_error("/api/products/abc").await, (StatusCode::BAD_REQUEST, "Invalid product ID".to_string()));
        assert_eq!(get_error("/api/products/1.5").await.0, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn filters_by_category() {
        let lower = get_products_at("/api/products/category/shoes").await;
        let upper = get_products_at("/api/products/category/SHOES").await;
        assert_eq!(ids(&lower), vec![1, 2, 3, 6, 7, 8]);
        assert_eq!(lower, upper);

        let running = get_products_at("/api/products/category/running%20shoes").await;
        assert_eq!(ids(&running), vec![3, 7]);

        assert!(get_products_at("/api/products/category/socks").await.is_empty());
    }

    #[actix_web::test]
    async fn featured_products_are_the_first_n() {
        assert_eq!(ids(&get_products_at("/api/featured-products?limit=2").await), vec![1, 2]);
        assert_eq!(ids(&get_products_at("/api/featured-products").await), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(ids(&get_products_at("/api/featured-products?limit=").await).len(), 6);
    }

    #[actix_web::test]
    async fn trending_products_default_to_three() {
        let products = get_products_at("/api/trending-products").await;
        let names: Vec<_> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Nike Air Max 90", "Nike Air Zoom Pegasus 38", "Nike Dri-FIT Run Division"]);

        assert_eq!(ids(&get_products_at("/api/trending-products?limit=5").await), vec![1, 3, 5, 7]);
    }

    #[actix_web::test]
    async fn invalid_limit_is_bad_request() {
        for uri in ["/api/featured-products?limit=abc", "/api/trending-products?limit=-1"] {
            assert_eq!(get_error(uri).await, (StatusCode::BAD_REQUEST, "Invalid limit parameter".to_string()));
        }
    }

    #[actix_web::test]
    async fn search_matches_name_or_category() {
        let products = get_products_at("/api/search?q=run").await;
        assert_eq!(ids(&products), vec![3, 5, 7]);

        let products = get_products_at("/api/search?q=Air%20Force").await;
        assert_eq!(ids(&products), vec![2]);

        assert!(get_products_at("/api/search?q=sandals").await.is_empty());
    }

    #[actix_web::test]
    async fn search_requires_q() {
        let expected = (StatusCode::BAD_REQUEST, "Query parameter 'q' is required".to_string());
        assert_eq!(get_error("/api/search").await, expected);
        assert_eq!(get_error("/api/search?q=").await, expected);
    }

    #[actix_web::test]
    async fn overflowing_id_is_not_found() {
        assert_eq!(
            get_error("/api/products/99999999999999999999").await,
            (StatusCode::NOT_FOUND, "Product not found".to_string())
        );
        assert_eq!(get_error("/api/products/-99999999999999999999").await.0, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn duplicate_query_keys_get_a_json_400() {
        for uri in ["/api/search?q=a&q=b", "/api/featured-products?limit=1&limit=2"] {
            assert_eq!(get_error(uri).await, (StatusCode::BAD_REQUEST, "Invalid query parameters".to_string()));
        }
    }

    #[actix_web::test]
    async fn storage_failures_become_generic_500s() {
        let cases = [
            ("/api/products", "Error fetching products"),
            ("/api/products/1", "Error fetching product"),
            ("/api/products/category/shoes", "Error fetching products by category"),
            ("/api/featured-products", "Error fetching featured products"),
            ("/api/trending-products?limit=2", "Error fetching trending products"),
            ("/api/search?q=air", "Error searching products"),
        ];
        for (uri, message) in cases {
            let resp = get_from(Arc::new(BrokenStorage), uri).await;
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "GET {}", uri);
            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body, serde_json::json!({ "message": message }), "GET {}", uri);
        }
    }

    #[actix_web::test]
    async fn client_errors_are_checked_before_storage() {
        let resp = get_from(Arc::new(BrokenStorage), "/api/products/abc").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = get_from(Arc::new(BrokenStorage), "/api/search").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unknown_api_route_is_json_404() {
        assert_eq!(get_error("/api/orders").await, (StatusCode::NOT_FOUND, "Not found".to_string()));
    }

    #[actix_web::test]
    async fn serves_an_injected_catalog() {
        let seed = sample_products().into_iter().skip(4).collect();
        let store = MemStorage::with_products(seed).unwrap();
        let resp = get(store, "/api/products/1").await;
        let product: Product = test::read_body_json(resp).await;
        assert_eq!(product.name, "Nike Dri-FIT Run Division");
    }
}
