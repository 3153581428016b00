//! HTTP handlers and route configuration.

#[cfg(feature = "auth")]
mod admin;
mod health;
mod live;
mod posts;
mod views;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    let api = web::scope("/api").route("/health", web::get().to(health::health_check));

    // Registered ahead of the locale scope so `admin` never reads as a locale.
    #[cfg(feature = "auth")]
    let api = api.service(
        web::scope("/admin")
            .route("/posts", web::post().to(admin::create_post))
            .route("/posts/{id}", web::patch().to(admin::update_post))
            .route("/posts/{id}", web::delete().to(admin::delete_post)),
    );

    cfg.service(
        api.service(
            web::scope("/{locale}")
                .route("/posts", web::get().to(posts::list_posts))
                .route("/posts/{slug}", web::get().to(posts::get_post))
                .route("/categories", web::get().to(posts::list_categories))
                .route(
                    "/categories/{category}/posts",
                    web::get().to(posts::category_posts),
                )
                .route("/tags", web::get().to(posts::list_tags))
                .route("/tags/{tag}/posts", web::get().to(posts::tag_posts))
                .route("/archives", web::get().to(posts::archives))
                .route("/search", web::get().to(posts::search))
                .service(
                    web::scope("/live")
                        .route("/posts", web::get().to(live::live_posts))
                        .route("/posts/{slug}", web::get().to(live::live_post))
                        .route("/categories/{category}", web::get().to(live::live_category))
                        .route("/tags/{tag}", web::get().to(live::live_tag)),
                ),
        ),
    );
}
