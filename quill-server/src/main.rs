use dotenvy::dotenv;
use std::sync::Arc;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;

use application::{AuthService, BlogService, CategoryService};
use data::{
    category_repository::PostgresCategoryRepository, post_repository::PostgresPostRepository,
    user_repository::PostgresUserRepository,
};
use infrastructure::{
    database::{create_pool, run_migrations},
    jwt::JwtService,
    logging::init_logging,
    storage::ImageStorage,
};
use presentation::{http_handlers, middleware::jwt_middleware};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    init_logging();

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let jwt_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let http_port = std::env::var("HTTP_PORT").unwrap_or_else(|_| "8000".to_string());
    let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

    // Разрешенные CORS домены из .env
    let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:8100,http://127.0.0.1:8100".to_string());

    let http_addr = format!("0.0.0.0:{}", http_port);

    tracing::info!("Starting quill server...");
    tracing::info!("HTTP server will listen on {}", http_addr);
    tracing::info!("Uploads stored under {}", upload_dir);

    // Initialize database connection pool
    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    // Run database migrations
    tracing::info!("Running database migrations...");
    run_migrations(&pool).await?;

    // Initialize services
    let jwt_service = Arc::new(JwtService::new(&jwt_secret)?);
    let storage = Arc::new(ImageStorage::new(&upload_dir));

    let user_repo = Arc::new(PostgresUserRepository::new(pool.clone()));
    let category_repo = Arc::new(PostgresCategoryRepository::new(pool.clone()));
    let post_repo = Arc::new(PostgresPostRepository::new(pool.clone()));

    let auth_service = Arc::new(AuthService::new(user_repo.clone(), jwt_service.clone()));
    let category_service = Arc::new(CategoryService::new(category_repo.clone()));
    let blog_service = Arc::new(BlogService::new(
        post_repo,
        category_repo,
        user_repo,
        storage,
    ));

    tracing::info!("Services initialized successfully");

    run_http_server(
        http_addr,
        auth_service,
        category_service,
        blog_service,
        jwt_service,
        cors_allowed_origins,
    )
    .await?;

    tracing::info!("Shutting down...");
    Ok(())
}

/// Configure CORS for the HTTP server with allowed origins from .env
fn configure_cors(allowed_origins: &str) -> actix_cors::Cors {
    use actix_cors::Cors;
    use actix_web::http::header;

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .max_age(3600);

    for origin in allowed_origins.split(',').map(|s| s.trim()) {
        if !origin.is_empty() {
            cors = cors.allowed_origin(origin);
            tracing::debug!("Added allowed CORS origin: {}", origin);
        }
    }

    cors
}

async fn run_http_server(
    addr: String,
    auth_service: Arc<AuthService>,
    category_service: Arc<CategoryService>,
    blog_service: Arc<BlogService>,
    jwt_service: Arc<JwtService>,
    cors_allowed_origins: String,
) -> anyhow::Result<()> {
    use actix_web::{middleware::Logger, web, App, HttpServer};
    use actix_web_httpauth::middleware::HttpAuthentication;

    tracing::info!("Configuring HTTP server...");

    let auth_middleware = HttpAuthentication::bearer(jwt_middleware);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(configure_cors(&cors_allowed_origins))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(category_service.clone()))
            .app_data(web::Data::new(blog_service.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            // Protected route - the bearer token's owner
            .service(
                web::scope("/api/user")
                    .wrap(auth_middleware.clone())
                    .route("", web::get().to(http_handlers::current_user)),
            )
            // Public routes
            .service(
                web::scope("/api")
                    .route("/register", web::post().to(http_handlers::register))
                    .route("/login", web::post().to(http_handlers::login))
                    .route("/categories", web::get().to(http_handlers::list_categories))
                    .route(
                        "/categories",
                        web::post().to(http_handlers::create_category),
                    )
                    .route(
                        "/categories/{id}",
                        web::get().to(http_handlers::get_category),
                    )
                    .route(
                        "/categories/{id}",
                        web::put().to(http_handlers::update_category),
                    )
                    .route(
                        "/categories/{id}",
                        web::delete().to(http_handlers::delete_category),
                    )
                    .route("/create-post", web::post().to(http_handlers::create_post))
                    .route("/posts", web::get().to(http_handlers::list_posts))
                    .route("/posts/{id}", web::put().to(http_handlers::update_post))
                    .route("/posts/{id}", web::delete().to(http_handlers::delete_post)),
            )
    })
    .bind(&addr)?
    .run();

    tracing::info!("HTTP server running on {}", addr);

    server.await?;

    Ok(())
}
